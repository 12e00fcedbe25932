use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

use crate::error::{ParserError, ParserResult};
use crate::sps::read_ue_max;

/// Memory management operations kept per slice.
pub const MAX_REF_PIC_MARKINGS: usize = 10;

/// One `memory_management_control_operation` with its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefPicMarking {
    /// `memory_management_control_operation`, 1..=6.
    pub memory_management_control_operation: u8,
    /// `difference_of_pic_nums_minus1` for operations 1 and 3.
    pub difference_of_pic_nums_minus1: u32,
    /// `long_term_pic_num` for operation 2.
    pub long_term_pic_num: u32,
    /// `long_term_frame_idx` for operations 3 and 6.
    pub long_term_frame_idx: u32,
    /// `max_long_term_frame_idx_plus1` for operation 4.
    pub max_long_term_frame_idx_plus1: u32,
}

/// `dec_ref_pic_marking()`
///
/// ISO/IEC-14496-10-2022 - 7.3.3.3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecRefPicMarking {
    /// `no_output_of_prior_pics_flag`, IDR only.
    pub no_output_of_prior_pics_flag: bool,
    /// `long_term_reference_flag`, IDR only.
    pub long_term_reference_flag: bool,
    /// `adaptive_ref_pic_marking_mode_flag`, non-IDR only.
    pub adaptive_ref_pic_marking_mode_flag: bool,
    ref_pic_marking: [RefPicMarking; MAX_REF_PIC_MARKINGS],
    n_ref_pic_marking: usize,
    /// Size of the syntax structure in RBSP bits.
    pub bit_size: u32,
}

impl DecRefPicMarking {
    /// The operations in bitstream order, without the terminating 0.
    pub fn ref_pic_marking(&self) -> &[RefPicMarking] {
        &self.ref_pic_marking[..self.n_ref_pic_marking]
    }

    pub(crate) fn parse(reader: &mut BitReader, idr_pic_flag: bool) -> ParserResult<Self> {
        let start_pos = reader.bit_position();
        let start_epb = reader.emulation_prevention_bytes();
        let mut marking = Self::default();

        if idr_pic_flag {
            marking.no_output_of_prior_pics_flag = reader.read_bit()?;
            marking.long_term_reference_flag = reader.read_bit()?;
        } else {
            marking.adaptive_ref_pic_marking_mode_flag = reader.read_bit()?;
            if marking.adaptive_ref_pic_marking_mode_flag {
                loop {
                    let op = read_ue_max(reader, 6)? as u8;
                    if op == 0 {
                        break;
                    }

                    let Some(slot) = marking.ref_pic_marking.get_mut(marking.n_ref_pic_marking) else {
                        return Err(ParserError::invalid(format!(
                            "more than {MAX_REF_PIC_MARKINGS} memory management operations"
                        )));
                    };

                    slot.memory_management_control_operation = op;
                    if matches!(op, 1 | 3) {
                        slot.difference_of_pic_nums_minus1 = reader.read_exp_golomb()?;
                    }
                    if op == 2 {
                        slot.long_term_pic_num = reader.read_exp_golomb()?;
                    }
                    if matches!(op, 3 | 6) {
                        slot.long_term_frame_idx = reader.read_exp_golomb()?;
                    }
                    if op == 4 {
                        slot.max_long_term_frame_idx_plus1 = reader.read_exp_golomb()?;
                    }

                    marking.n_ref_pic_marking += 1;
                }
            }
        }

        let epb = reader.emulation_prevention_bytes() - start_epb;
        marking.bit_size = (reader.bit_position() - start_pos - 8 * epb) as u32;

        Ok(marking)
    }
}
