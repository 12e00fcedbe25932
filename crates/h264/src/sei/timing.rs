use bytes_util::BitReader;
use tracing::{debug, warn};

use crate::error::{ParserError, ParserResult};
use crate::sps::{HrdParameters, MAX_SPS_COUNT, Sps, read_ue_max};
use crate::store::ParameterSetStore;

/// `NumClockTS` per `pic_struct` (Table D-1).
const NUM_CLOCK_TS: [usize; 9] = [1, 1, 1, 2, 2, 3, 3, 2, 3];

/// `time_offset_length` when the SPS has no HRD parameters.
const DEFAULT_TIME_OFFSET_LENGTH: u8 = 24;

/// Initial CPB removal delay and offset for one `SchedSelIdx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitialCpbRemoval {
    /// `initial_cpb_removal_delay`
    pub delay: u32,
    /// `initial_cpb_removal_delay_offset`
    pub offset: u32,
}

fn read_initial_cpb_removal(reader: &mut BitReader, hrd: Option<&HrdParameters>) -> ParserResult<Vec<InitialCpbRemoval>> {
    let Some(hrd) = hrd else {
        return Ok(Vec::new());
    };

    let bits = hrd.initial_cpb_removal_delay_length_minus1 + 1;
    (0..=hrd.cpb_cnt_minus1)
        .map(|_| -> ParserResult<_> {
            Ok(InitialCpbRemoval {
                delay: reader.read_bits(bits)?,
                offset: reader.read_bits(bits)?,
            })
        })
        .collect()
}

/// `buffering_period()`
///
/// ISO/IEC-14496-10-2022 - D.1.2
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BufferingPeriod {
    /// `seq_parameter_set_id`
    pub sps_id: u8,
    /// One entry per `SchedSelIdx` of the NAL HRD.
    pub nal_initial_cpb_removal: Vec<InitialCpbRemoval>,
    /// One entry per `SchedSelIdx` of the VCL HRD.
    pub vcl_initial_cpb_removal: Vec<InitialCpbRemoval>,
}

impl BufferingPeriod {
    pub(crate) fn parse(reader: &mut BitReader, store: &ParameterSetStore) -> ParserResult<Self> {
        debug!("parsing \"Buffering period\"");

        let sps_id = read_ue_max(reader, MAX_SPS_COUNT as u32 - 1)?;
        let Some(sps) = store.get_sps(sps_id) else {
            warn!("couldn't find associated sequence parameter set with id: {}", sps_id);
            return Err(ParserError::missing_sps(sps_id));
        };

        let mut period = Self {
            sps_id: sps_id as u8,
            ..Default::default()
        };

        if let Some(vui) = &sps.vui_parameters {
            period.nal_initial_cpb_removal = read_initial_cpb_removal(reader, vui.nal_hrd_parameters.as_ref())?;
            period.vcl_initial_cpb_removal = read_initial_cpb_removal(reader, vui.vcl_hrd_parameters.as_ref())?;
        }

        Ok(period)
    }
}

/// `clock_timestamp` fields of a picture timing message.
///
/// With `full_timestamp_flag` set, the three `*_flag` fields are all true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockTimestamp {
    /// `ct_type` (2 bits)
    pub ct_type: u8,
    /// `nuit_field_based_flag`
    pub nuit_field_based_flag: bool,
    /// `counting_type` (5 bits)
    pub counting_type: u8,
    /// `full_timestamp_flag`
    pub full_timestamp_flag: bool,
    /// `discontinuity_flag`
    pub discontinuity_flag: bool,
    /// `cnt_dropped_flag`
    pub cnt_dropped_flag: bool,
    /// `n_frames`
    pub n_frames: u8,
    /// `seconds_flag`
    pub seconds_flag: bool,
    /// `seconds_value` (6 bits)
    pub seconds_value: u8,
    /// `minutes_flag`
    pub minutes_flag: bool,
    /// `minutes_value` (6 bits)
    pub minutes_value: u8,
    /// `hours_flag`
    pub hours_flag: bool,
    /// `hours_value` (5 bits)
    pub hours_value: u8,
    /// `time_offset`, 0 when `time_offset_length` is 0.
    pub time_offset: u32,
}

impl ClockTimestamp {
    fn parse(reader: &mut BitReader, time_offset_length: u8) -> ParserResult<Self> {
        debug!("parsing \"Clock timestamp\"");

        let mut ts = Self {
            ct_type: reader.read_bits(2)? as u8,
            nuit_field_based_flag: reader.read_bit()?,
            counting_type: reader.read_bits(5)? as u8,
            full_timestamp_flag: reader.read_bit()?,
            discontinuity_flag: reader.read_bit()?,
            cnt_dropped_flag: reader.read_bit()?,
            n_frames: reader.read_u8()?,
            ..Default::default()
        };

        if ts.full_timestamp_flag {
            ts.seconds_flag = true;
            ts.seconds_value = reader.read_bits(6)? as u8;
            ts.minutes_flag = true;
            ts.minutes_value = reader.read_bits(6)? as u8;
            ts.hours_flag = true;
            ts.hours_value = reader.read_bits(5)? as u8;
        } else {
            ts.seconds_flag = reader.read_bit()?;
            if ts.seconds_flag {
                ts.seconds_value = reader.read_bits(6)? as u8;
                ts.minutes_flag = reader.read_bit()?;
                if ts.minutes_flag {
                    ts.minutes_value = reader.read_bits(6)? as u8;
                    ts.hours_flag = reader.read_bit()?;
                    if ts.hours_flag {
                        ts.hours_value = reader.read_bits(5)? as u8;
                    }
                }
            }
        }

        if time_offset_length > 0 {
            ts.time_offset = reader.read_bits(time_offset_length)?;
        }

        Ok(ts)
    }
}

/// `pic_timing()`
///
/// The layout depends on the VUI of the last stored SPS.
///
/// ISO/IEC-14496-10-2022 - D.1.3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PicTiming {
    /// `CpbDpbDelaysPresentFlag`
    pub cpb_dpb_delays_present_flag: bool,
    /// `cpb_removal_delay_length_minus1` of the HRD in use.
    pub cpb_removal_delay_length_minus1: u8,
    /// `dpb_output_delay_length_minus1` of the HRD in use.
    pub dpb_output_delay_length_minus1: u8,
    /// `cpb_removal_delay`
    pub cpb_removal_delay: u32,
    /// `dpb_output_delay`
    pub dpb_output_delay: u32,

    /// `pic_struct_present_flag` of the VUI.
    pub pic_struct_present_flag: bool,
    /// `pic_struct`, 0..=8.
    pub pic_struct: u8,
    /// `time_offset_length` used for the timestamps.
    pub time_offset_length: u8,
    /// `clock_timestamp_flag[i]` with the timestamp when set.
    pub clock_timestamps: [Option<ClockTimestamp>; 3],
}

impl PicTiming {
    /// Number of clock timestamps carried for this `pic_struct`.
    pub fn num_clock_ts(&self) -> usize {
        NUM_CLOCK_TS.get(self.pic_struct as usize).copied().unwrap_or(0)
    }

    pub(crate) fn parse(reader: &mut BitReader, sps: Option<&Sps>) -> ParserResult<Self> {
        debug!("parsing \"Picture timing\"");

        let Some(sps) = sps else {
            warn!("didn't get the associated sequence parameter set for the current access unit");
            return Err(ParserError::invalid("picture timing without a sequence parameter set"));
        };

        let mut timing = Self::default();

        if let Some(vui) = &sps.vui_parameters {
            let hrd = vui.hrd_parameters();

            if let Some(hrd) = hrd {
                timing.cpb_dpb_delays_present_flag = true;
                timing.cpb_removal_delay_length_minus1 = hrd.cpb_removal_delay_length_minus1;
                timing.dpb_output_delay_length_minus1 = hrd.dpb_output_delay_length_minus1;
                timing.cpb_removal_delay = reader.read_bits(hrd.cpb_removal_delay_length_minus1 + 1)?;
                timing.dpb_output_delay = reader.read_bits(hrd.dpb_output_delay_length_minus1 + 1)?;
            }

            timing.pic_struct_present_flag = vui.pic_struct_present_flag;
            if timing.pic_struct_present_flag {
                timing.pic_struct = reader.read_bits(4)? as u8;
                bytes_util::range_check!(timing.pic_struct, 0, 8)?;

                timing.time_offset_length = hrd.map_or(DEFAULT_TIME_OFFSET_LENGTH, |hrd| hrd.time_offset_length);

                for i in 0..timing.num_clock_ts() {
                    if reader.read_bit()? {
                        timing.clock_timestamps[i] = Some(ClockTimestamp::parse(reader, timing.time_offset_length)?);
                    }
                }
            }
        }

        if !timing.cpb_dpb_delays_present_flag && !timing.pic_struct_present_flag {
            warn!("Invalid pic_timing SEI NAL with neither CpbDpbDelays nor pic_struct");
            return Err(ParserError::BrokenData);
        }

        Ok(timing)
    }
}
