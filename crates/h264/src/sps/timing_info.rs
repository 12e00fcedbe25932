use bytes_util::BitReader;
use tracing::warn;

use crate::error::ParserResult;

/// The VUI fields present when `timing_info_present_flag == 1`.
///
/// ISO/IEC-14496-10-2022 - E.2.1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingInfo {
    /// `num_units_in_tick`. Zero is not conforming but tolerated.
    pub num_units_in_tick: u32,
    /// `time_scale` in Hz. Zero is not conforming but tolerated.
    pub time_scale: u32,
    /// `fixed_frame_rate_flag`
    pub fixed_frame_rate_flag: bool,
}

impl TimingInfo {
    /// Reads the timing fields.
    pub fn parse(reader: &mut BitReader) -> ParserResult<Self> {
        let num_units_in_tick = reader.read_bits(32)?;
        if num_units_in_tick == 0 {
            warn!("num_units_in_tick = 0 detected in stream (incompliant to H.264 E.2.1).");
        }

        let time_scale = reader.read_bits(32)?;
        if time_scale == 0 {
            warn!("time_scale = 0 detected in stream (incompliant to H.264 E.2.1).");
        }

        Ok(Self {
            num_units_in_tick,
            time_scale,
            fixed_frame_rate_flag: reader.read_bit()?,
        })
    }
}
