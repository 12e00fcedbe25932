use bytes_util::BitReader;
use tracing::{debug, warn};

use crate::error::{ParserError, ParserResult};
use crate::sps::{Sps, read_ue_max};

/// `recovery_point()`
///
/// ISO/IEC-14496-10-2022 - D.1.8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecoveryPoint {
    /// `recovery_frame_cnt`, below `MaxFrameNum` of the last stored SPS.
    pub recovery_frame_cnt: u32,
    /// `exact_match_flag`
    pub exact_match_flag: bool,
    /// `broken_link_flag`
    pub broken_link_flag: bool,
    /// `changing_slice_group_idc` (2 bits)
    pub changing_slice_group_idc: u8,
}

impl RecoveryPoint {
    pub(crate) fn parse(reader: &mut BitReader, sps: Option<&Sps>) -> ParserResult<Self> {
        debug!("parsing \"Recovery point\"");

        let Some(sps) = sps else {
            warn!("didn't get the associated sequence parameter set for the current access unit");
            return Err(ParserError::invalid("recovery point without a sequence parameter set"));
        };

        Ok(Self {
            recovery_frame_cnt: read_ue_max(reader, sps.max_frame_num.saturating_sub(1))?,
            exact_match_flag: reader.read_bit()?,
            broken_link_flag: reader.read_bit()?,
            changing_slice_group_idc: reader.read_bits(2)? as u8,
        })
    }
}
