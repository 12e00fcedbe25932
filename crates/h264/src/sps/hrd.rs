use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;
use tracing::warn;

use crate::error::ParserResult;

/// One `SchedSelIdx` entry of the HRD parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpbSpec {
    /// `bit_rate_value_minus1[SchedSelIdx]`
    pub bit_rate_value_minus1: u32,
    /// `cpb_size_value_minus1[SchedSelIdx]`
    pub cpb_size_value_minus1: u32,
    /// `cbr_flag[SchedSelIdx]`
    pub cbr_flag: bool,
}

/// `hrd_parameters()`
///
/// ISO/IEC-14496-10-2022 - E.1.2
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HrdParameters {
    /// `cpb_cnt_minus1`, at most 31.
    pub cpb_cnt_minus1: u8,
    /// `bit_rate_scale` (4 bits)
    pub bit_rate_scale: u8,
    /// `cpb_size_scale` (4 bits)
    pub cpb_size_scale: u8,
    /// `cpb_cnt_minus1 + 1` entries.
    pub cpb: Vec<CpbSpec>,
    /// `initial_cpb_removal_delay_length_minus1` (5 bits)
    pub initial_cpb_removal_delay_length_minus1: u8,
    /// `cpb_removal_delay_length_minus1` (5 bits)
    pub cpb_removal_delay_length_minus1: u8,
    /// `dpb_output_delay_length_minus1` (5 bits)
    pub dpb_output_delay_length_minus1: u8,
    /// `time_offset_length` (5 bits)
    pub time_offset_length: u8,
}

impl HrdParameters {
    /// Reads `hrd_parameters()`.
    pub fn parse(reader: &mut BitReader) -> ParserResult<Self> {
        Self::parse_inner(reader).inspect_err(|_| warn!("error parsing \"HRD Parameters\""))
    }

    fn parse_inner(reader: &mut BitReader) -> ParserResult<Self> {
        let cpb_cnt_minus1 = reader.read_exp_golomb()?;
        bytes_util::range_check!(cpb_cnt_minus1, 0, 31)?;
        let bit_rate_scale = reader.read_bits(4)? as u8;
        let cpb_size_scale = reader.read_bits(4)? as u8;

        let mut cpb = Vec::with_capacity(cpb_cnt_minus1 as usize + 1);
        for _ in 0..=cpb_cnt_minus1 {
            cpb.push(CpbSpec {
                bit_rate_value_minus1: reader.read_exp_golomb()?,
                cpb_size_value_minus1: reader.read_exp_golomb()?,
                cbr_flag: reader.read_bit()?,
            });
        }

        Ok(Self {
            cpb_cnt_minus1: cpb_cnt_minus1 as u8,
            bit_rate_scale,
            cpb_size_scale,
            cpb,
            initial_cpb_removal_delay_length_minus1: reader.read_bits(5)? as u8,
            cpb_removal_delay_length_minus1: reader.read_bits(5)? as u8,
            dpb_output_delay_length_minus1: reader.read_bits(5)? as u8,
            time_offset_length: reader.read_bits(5)? as u8,
        })
    }
}
