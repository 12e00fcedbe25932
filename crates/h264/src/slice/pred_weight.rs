use bytes_util::BitReader;

use crate::error::ParserResult;
use crate::sps::{read_se_allowed, read_ue_max};

/// Reference indices per list.
pub const MAX_PRED_WEIGHTS: usize = 32;

/// `pred_weight_table()`
///
/// Entries that are not signalled keep the default weight `1 << denom` and a
/// zero offset.
///
/// ISO/IEC-14496-10-2022 - 7.3.3.2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PredWeightTable {
    /// `luma_log2_weight_denom`, 0..=7.
    pub luma_log2_weight_denom: u8,
    /// `chroma_log2_weight_denom`, 0..=7. Absent for monochrome.
    pub chroma_log2_weight_denom: u8,

    /// `luma_weight_l0[i]`
    pub luma_weight_l0: [i16; MAX_PRED_WEIGHTS],
    /// `luma_offset_l0[i]`
    pub luma_offset_l0: [i8; MAX_PRED_WEIGHTS],
    /// `chroma_weight_l0[i][j]`
    pub chroma_weight_l0: [[i16; 2]; MAX_PRED_WEIGHTS],
    /// `chroma_offset_l0[i][j]`
    pub chroma_offset_l0: [[i8; 2]; MAX_PRED_WEIGHTS],

    /// `luma_weight_l1[i]`, B slices only.
    pub luma_weight_l1: [i16; MAX_PRED_WEIGHTS],
    /// `luma_offset_l1[i]`
    pub luma_offset_l1: [i8; MAX_PRED_WEIGHTS],
    /// `chroma_weight_l1[i][j]`
    pub chroma_weight_l1: [[i16; 2]; MAX_PRED_WEIGHTS],
    /// `chroma_offset_l1[i][j]`
    pub chroma_offset_l1: [[i8; 2]; MAX_PRED_WEIGHTS],
}

struct WeightList<'a> {
    luma_weight: &'a mut [i16; MAX_PRED_WEIGHTS],
    luma_offset: &'a mut [i8; MAX_PRED_WEIGHTS],
    chroma_weight: &'a mut [[i16; 2]; MAX_PRED_WEIGHTS],
    chroma_offset: &'a mut [[i8; 2]; MAX_PRED_WEIGHTS],
}

impl WeightList<'_> {
    fn parse(self, reader: &mut BitReader, num_ref_idx_active_minus1: u8, chroma: bool) -> ParserResult<()> {
        for i in 0..=num_ref_idx_active_minus1 as usize {
            if reader.read_bit()? {
                self.luma_weight[i] = read_se_allowed(reader, -128, 127)? as i16;
                self.luma_offset[i] = read_se_allowed(reader, -128, 127)? as i8;
            }

            if chroma && reader.read_bit()? {
                for j in 0..2 {
                    self.chroma_weight[i][j] = read_se_allowed(reader, -128, 127)? as i16;
                    self.chroma_offset[i][j] = read_se_allowed(reader, -128, 127)? as i8;
                }
            }
        }

        Ok(())
    }
}

impl PredWeightTable {
    /// Reads the table. `num_ref_idx_l1_active_minus1` is `None` outside B slices.
    pub(crate) fn parse(
        reader: &mut BitReader,
        chroma_array_type: u8,
        num_ref_idx_l0_active_minus1: u8,
        num_ref_idx_l1_active_minus1: Option<u8>,
    ) -> ParserResult<Self> {
        let chroma = chroma_array_type != 0;
        let mut table = Self {
            luma_log2_weight_denom: read_ue_max(reader, 7)? as u8,
            ..Default::default()
        };

        let default_luma = 1i16 << table.luma_log2_weight_denom;
        table.luma_weight_l0 = [default_luma; MAX_PRED_WEIGHTS];
        if num_ref_idx_l1_active_minus1.is_some() {
            table.luma_weight_l1 = [default_luma; MAX_PRED_WEIGHTS];
        }

        if chroma {
            table.chroma_log2_weight_denom = read_ue_max(reader, 7)? as u8;

            let default_chroma = 1i16 << table.chroma_log2_weight_denom;
            table.chroma_weight_l0 = [[default_chroma; 2]; MAX_PRED_WEIGHTS];
            if num_ref_idx_l1_active_minus1.is_some() {
                table.chroma_weight_l1 = [[default_chroma; 2]; MAX_PRED_WEIGHTS];
            }
        }

        WeightList {
            luma_weight: &mut table.luma_weight_l0,
            luma_offset: &mut table.luma_offset_l0,
            chroma_weight: &mut table.chroma_weight_l0,
            chroma_offset: &mut table.chroma_offset_l0,
        }
        .parse(reader, num_ref_idx_l0_active_minus1, chroma)?;

        if let Some(num_ref_idx_l1_active_minus1) = num_ref_idx_l1_active_minus1 {
            WeightList {
                luma_weight: &mut table.luma_weight_l1,
                luma_offset: &mut table.luma_offset_l1,
                chroma_weight: &mut table.chroma_weight_l1,
                chroma_offset: &mut table.chroma_offset_l1,
            }
            .parse(reader, num_ref_idx_l1_active_minus1, chroma)?;
        }

        Ok(table)
    }
}
