//! Supplemental enhancement information.

mod hdr;
mod recovery_point;
mod stereo;
mod timing;
mod user_data;

use bytes_util::BitReader;
use tracing::{debug, trace, warn};

pub use self::hdr::{ContentLightLevel, MasteringDisplayColourVolume};
pub use self::recovery_point::RecoveryPoint;
pub use self::stereo::{FramePacking, FramePackingType, StereoVideoInfo};
pub use self::timing::{BufferingPeriod, ClockTimestamp, InitialCpbRemoval, PicTiming};
pub use self::user_data::{RegisteredUserData, UnhandledPayload, UserDataUnregistered};
use crate::error::ParserResult;
use crate::nal::NalUnit;
use crate::store::ParameterSetStore;

/// `payloadType` values with a structured decoder.
pub mod payload_type {
    /// `buffering_period()`
    pub const BUFFERING_PERIOD: u32 = 0;
    /// `pic_timing()`
    pub const PIC_TIMING: u32 = 1;
    /// `user_data_registered_itu_t_t35()`
    pub const REGISTERED_USER_DATA: u32 = 4;
    /// `user_data_unregistered()`
    pub const USER_DATA_UNREGISTERED: u32 = 5;
    /// `recovery_point()`
    pub const RECOVERY_POINT: u32 = 6;
    /// `stereo_video_info()`
    pub const STEREO_VIDEO_INFO: u32 = 21;
    /// `frame_packing_arrangement()`
    pub const FRAME_PACKING: u32 = 45;
    /// `mastering_display_colour_volume()`
    pub const MASTERING_DISPLAY_COLOUR_VOLUME: u32 = 137;
    /// `content_light_level_info()`
    pub const CONTENT_LIGHT_LEVEL: u32 = 144;
}

/// A decoded SEI payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeiPayload {
    /// Buffering period.
    BufferingPeriod(BufferingPeriod),
    /// Picture timing.
    PicTiming(PicTiming),
    /// ITU-T T.35 registered user data.
    RegisteredUserData(RegisteredUserData),
    /// Unregistered user data.
    UserDataUnregistered(UserDataUnregistered),
    /// Recovery point.
    RecoveryPoint(RecoveryPoint),
    /// Stereo video info.
    StereoVideoInfo(StereoVideoInfo),
    /// Frame packing arrangement.
    FramePacking(FramePacking),
    /// Mastering display colour volume.
    MasteringDisplayColourVolume(MasteringDisplayColourVolume),
    /// Content light level.
    ContentLightLevel(ContentLightLevel),
    /// Any other payload, kept as raw bytes.
    Unknown(UnhandledPayload),
}

/// One `sei_message()`.
///
/// ISO/IEC-14496-10-2022 - 7.3.2.3.1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeiMessage {
    /// `payloadType`
    pub payload_type: u32,
    /// `payloadSize` in bytes as coded, before clamping to the NAL unit.
    pub payload_size: u32,
    /// The decoded payload.
    pub payload: SeiPayload,
}

/// Reads a value coded as a run of 0xFF bytes plus a final byte.
fn read_ff_coded(reader: &mut BitReader) -> ParserResult<u32> {
    let mut value = 0u32;
    loop {
        let byte = reader.read_u8()?;
        value = value.saturating_add(byte as u32);
        if byte != 0xff {
            return Ok(value);
        }
    }
}

impl SeiMessage {
    fn parse(reader: &mut BitReader, store: &ParameterSetStore) -> ParserResult<Self> {
        debug!("parsing \"SEI message\"");

        let payload_type = read_ff_coded(reader)?;
        let payload_size = read_ff_coded(reader)?;

        let size_bits = (payload_size as usize * 8).min(reader.remaining_bits());
        let next = reader.bit_position() + size_bits;

        debug!(
            "SEI message received: payloadType {}, payloadSize = {} bits",
            payload_type, size_bits
        );

        let payload = match payload_type {
            payload_type::BUFFERING_PERIOD => SeiPayload::BufferingPeriod(
                BufferingPeriod::parse(reader, store).inspect_err(|_| warn!("error parsing \"Buffering period\""))?,
            ),
            payload_type::PIC_TIMING => SeiPayload::PicTiming(
                PicTiming::parse(reader, store.last_sps()).inspect_err(|_| warn!("error parsing \"Picture timing\""))?,
            ),
            payload_type::REGISTERED_USER_DATA => SeiPayload::RegisteredUserData(
                RegisteredUserData::parse(reader, size_bits / 8)
                    .inspect_err(|_| warn!("error parsing \"Registered user data\""))?,
            ),
            payload_type::USER_DATA_UNREGISTERED => SeiPayload::UserDataUnregistered(
                UserDataUnregistered::parse(reader, size_bits / 8)
                    .inspect_err(|_| warn!("error parsing \"User data unregistered\""))?,
            ),
            payload_type::RECOVERY_POINT => SeiPayload::RecoveryPoint(
                RecoveryPoint::parse(reader, store.last_sps()).inspect_err(|_| warn!("error parsing \"Recovery point\""))?,
            ),
            payload_type::STEREO_VIDEO_INFO => SeiPayload::StereoVideoInfo(
                StereoVideoInfo::parse(reader).inspect_err(|_| warn!("error parsing \"Stereo Video info\""))?,
            ),
            payload_type::FRAME_PACKING => SeiPayload::FramePacking(
                FramePacking::parse(reader, size_bits)
                    .inspect_err(|_| warn!("error parsing \"Frame Packing Arrangement\""))?,
            ),
            payload_type::MASTERING_DISPLAY_COLOUR_VOLUME => SeiPayload::MasteringDisplayColourVolume(
                MasteringDisplayColourVolume::parse(reader)
                    .inspect_err(|_| warn!("error parsing \"Mastering display colour volume\""))?,
            ),
            payload_type::CONTENT_LIGHT_LEVEL => SeiPayload::ContentLightLevel(
                ContentLightLevel::parse(reader).inspect_err(|_| warn!("error parsing \"Content light level\""))?,
            ),
            _ => SeiPayload::Unknown(
                UnhandledPayload::parse(reader, payload_type, size_bits / 8)
                    .inspect_err(|_| warn!("error parsing \"Unhandled payload\""))?,
            ),
        };

        if !reader.is_aligned() {
            if !reader.read_bit()? {
                warn!("Bit non equal to one.");
            }

            while !reader.is_aligned() {
                if reader.read_bit()? {
                    warn!("Bit non equal to zero.");
                }
            }
        }

        let pos = reader.bit_position();
        if next > pos {
            trace!("Skipping {} unused SEI bits", next - pos);
            reader.skip_long(next - pos)?;
        }

        Ok(Self {
            payload_type,
            payload_size,
            payload,
        })
    }
}

/// Parses every message of an SEI NAL unit.
///
/// Picture timing and recovery point messages are read against the last SPS
/// stored in `store`. Parsing stops at the first failing message: the
/// messages before it are returned together with its error.
pub fn parse_sei(nalu: &NalUnit, store: &ParameterSetStore) -> (Vec<SeiMessage>, ParserResult<()>) {
    debug!("parsing SEI nal");

    let mut reader = nalu.rbsp_reader();
    let mut messages = Vec::new();

    loop {
        match SeiMessage::parse(&mut reader, store) {
            Ok(message) => messages.push(message),
            Err(err) => {
                warn!("error parsing \"Sei message\"");
                return (messages, Err(err));
            }
        }

        if !reader.has_more_rbsp_data() {
            return (messages, Ok(()));
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes::Bytes;
    use bytes_util::BitWriter;
    use expgolomb::BitWriterExpGolombExt;

    use super::*;
    use crate::error::{ParserError, ParserResultKind};
    use crate::sps::Sps;
    use crate::test_utils::{TestSps, init_tracing, single_nalu};
    use crate::writer::{NalPrefix, NalWriter};

    fn store_with(sps: &TestSps) -> ParameterSetStore {
        let mut store = ParameterSetStore::new();
        let data = sps.build();
        store.store_sps(Sps::parse(&single_nalu(&data), true).unwrap()).unwrap();
        store
    }

    fn write_ff_coded(w: &mut NalWriter, mut value: u32) {
        while value >= 0xff {
            w.write_bits(0xff, 8).unwrap();
            value -= 0xff;
        }
        w.write_bits(value as u64, 8).unwrap();
    }

    /// Appends a message, closing the payload with `1` and zero bits when it
    /// does not end on a byte boundary.
    fn message(w: &mut NalWriter, payload_type: u32, build: impl FnOnce(&mut BitWriter<Vec<u8>>)) {
        let mut payload = BitWriter::<Vec<u8>>::default();
        build(&mut payload);
        if !payload.is_aligned() {
            payload.write_rbsp_trailing_bits().unwrap();
        }
        let payload = payload.finish().unwrap();

        write_ff_coded(w, payload_type);
        write_ff_coded(w, payload.len() as u32);
        for byte in payload {
            w.write_bits(byte as u64, 8).unwrap();
        }
    }

    fn sei(build: impl FnOnce(&mut NalWriter)) -> Bytes {
        let mut w = NalWriter::new(0, 6, NalPrefix::StartCode3).unwrap();
        build(&mut w);
        w.finish().unwrap()
    }

    #[test]
    fn test_buffering_period() {
        init_tracing();

        let store = store_with(&TestSps {
            nal_hrd: Some((23, 23, 23, 24)),
            ..Default::default()
        });
        let data = sei(|w| {
            message(w, payload_type::BUFFERING_PERIOD, |p| {
                p.write_exp_golomb(0).unwrap();
                p.write_bits(90_000, 24).unwrap();
                p.write_bits(1_000, 24).unwrap();
            });
        });

        let (messages, result) = parse_sei(&single_nalu(&data), &store);
        result.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].payload_size, 7);
        assert_eq!(
            messages[0].payload,
            SeiPayload::BufferingPeriod(BufferingPeriod {
                sps_id: 0,
                nal_initial_cpb_removal: vec![InitialCpbRemoval {
                    delay: 90_000,
                    offset: 1_000,
                }],
                vcl_initial_cpb_removal: Vec::new(),
            })
        );
    }

    #[test]
    fn test_buffering_period_unknown_sps() {
        let store = ParameterSetStore::new();
        let data = sei(|w| message(w, payload_type::BUFFERING_PERIOD, |p| p.write_exp_golomb(3).unwrap()));

        let (messages, result) = parse_sei(&single_nalu(&data), &store);
        assert!(messages.is_empty());
        assert!(matches!(result, Err(ParserError::BrokenLink { id: 3, .. })));
    }

    #[test]
    fn test_pic_timing_with_clock_timestamp() {
        let store = store_with(&TestSps {
            timing: Some((1, 50, true)),
            nal_hrd: Some((23, 4, 5, 24)),
            ..Default::default()
        });
        let data = sei(|w| {
            message(w, payload_type::PIC_TIMING, |p| {
                p.write_bits(17, 5).unwrap();
                p.write_bits(33, 6).unwrap();
                // pic_struct 3: top bottom, two timestamps
                p.write_bits(3, 4).unwrap();
                p.write_bit(true).unwrap();
                p.write_bits(0, 2).unwrap();
                p.write_bit(false).unwrap();
                p.write_bits(4, 5).unwrap();
                // full, discontinuity, dropped
                p.write_bits(0b100, 3).unwrap();
                p.write_bits(12, 8).unwrap();
                p.write_bits(59, 6).unwrap();
                p.write_bits(30, 6).unwrap();
                p.write_bits(23, 5).unwrap();
                p.write_bits(0xabcdef, 24).unwrap();
                p.write_bit(false).unwrap();
            });
        });

        let (messages, result) = parse_sei(&single_nalu(&data), &store);
        result.unwrap();
        let SeiPayload::PicTiming(timing) = &messages[0].payload else {
            panic!("unexpected payload {:?}", messages[0].payload);
        };

        assert!(timing.cpb_dpb_delays_present_flag);
        assert_eq!(timing.cpb_removal_delay, 17);
        assert_eq!(timing.dpb_output_delay, 33);
        assert_eq!(timing.pic_struct, 3);
        assert_eq!(timing.num_clock_ts(), 2);
        assert_eq!(timing.time_offset_length, 24);
        assert_eq!(
            timing.clock_timestamps[0],
            Some(ClockTimestamp {
                counting_type: 4,
                full_timestamp_flag: true,
                n_frames: 12,
                seconds_flag: true,
                seconds_value: 59,
                minutes_flag: true,
                minutes_value: 30,
                hours_flag: true,
                hours_value: 23,
                time_offset: 0xabcdef,
                ..Default::default()
            })
        );
        assert_eq!(timing.clock_timestamps[1], None);
    }

    #[test]
    fn test_pic_timing_nested_timestamp_without_hrd() {
        let store = store_with(&TestSps {
            timing: Some((1, 50, true)),
            ..Default::default()
        });
        let data = sei(|w| {
            message(w, payload_type::PIC_TIMING, |p| {
                p.write_bits(0, 4).unwrap();
                p.write_bit(true).unwrap();
                p.write_bits(0, 8).unwrap();
                // not full: seconds only
                p.write_bits(0, 3).unwrap();
                p.write_bits(1, 8).unwrap();
                p.write_bit(true).unwrap();
                p.write_bits(42, 6).unwrap();
                p.write_bit(false).unwrap();
                // default time_offset_length
                p.write_bits(7, 24).unwrap();
            });
        });

        let (messages, result) = parse_sei(&single_nalu(&data), &store);
        result.unwrap();
        let SeiPayload::PicTiming(timing) = &messages[0].payload else {
            panic!("unexpected payload {:?}", messages[0].payload);
        };

        assert!(!timing.cpb_dpb_delays_present_flag);
        let ts = timing.clock_timestamps[0].unwrap();
        assert_eq!(ts.n_frames, 1);
        assert!(ts.seconds_flag);
        assert_eq!(ts.seconds_value, 42);
        assert!(!ts.minutes_flag);
        assert_eq!(ts.time_offset, 7);
    }

    #[test]
    fn test_pic_timing_needs_context() {
        let data = sei(|w| message(w, payload_type::PIC_TIMING, |p| p.write_bits(0, 8).unwrap()));

        let (_, result) = parse_sei(&single_nalu(&data), &ParameterSetStore::new());
        assert_eq!(result.unwrap_err().kind(), ParserResultKind::Error);

        // no VUI: nothing to read
        let store = store_with(&TestSps::default());
        let (_, result) = parse_sei(&single_nalu(&data), &store);
        assert_eq!(result.unwrap_err().kind(), ParserResultKind::BrokenData);
    }

    #[test]
    fn test_pic_struct_out_of_range() {
        let store = store_with(&TestSps {
            timing: Some((1, 50, true)),
            ..Default::default()
        });
        let data = sei(|w| message(w, payload_type::PIC_TIMING, |p| p.write_bits(9, 4).unwrap()));

        let (messages, result) = parse_sei(&single_nalu(&data), &store);
        assert!(messages.is_empty());
        assert_eq!(result.unwrap_err().kind(), ParserResultKind::Error);
    }

    #[test]
    fn test_recovery_point() {
        let store = store_with(&TestSps::default());
        let data = sei(|w| {
            message(w, payload_type::RECOVERY_POINT, |p| {
                p.write_exp_golomb(15).unwrap();
                p.write_bit(true).unwrap();
                p.write_bit(false).unwrap();
                p.write_bits(2, 2).unwrap();
            });
        });

        let (messages, result) = parse_sei(&single_nalu(&data), &store);
        result.unwrap();
        assert_eq!(
            messages[0].payload,
            SeiPayload::RecoveryPoint(RecoveryPoint {
                recovery_frame_cnt: 15,
                exact_match_flag: true,
                broken_link_flag: false,
                changing_slice_group_idc: 2,
            })
        );

        // MaxFrameNum is 16
        let data = sei(|w| message(w, payload_type::RECOVERY_POINT, |p| p.write_exp_golomb(16).unwrap()));
        let (_, result) = parse_sei(&single_nalu(&data), &store);
        assert!(result.is_err());
    }

    #[test]
    fn test_frame_packing_extension_then_stereo() {
        let store = ParameterSetStore::new();
        let data = sei(|w| {
            message(w, payload_type::FRAME_PACKING, |p| {
                p.write_exp_golomb(2).unwrap();
                // cancelled, extension follows
                p.write_bit(true).unwrap();
                p.write_bit(true).unwrap();
                p.write_bits(0b1_0110, 5).unwrap();
                p.write_bits(0x5a5a, 16).unwrap();
            });
            message(w, payload_type::STEREO_VIDEO_INFO, |p| {
                p.write_bit(false).unwrap();
                p.write_bit(true).unwrap();
                p.write_bit(false).unwrap();
                p.write_bit(true).unwrap();
                p.write_bit(true).unwrap();
            });
        });

        let (messages, result) = parse_sei(&single_nalu(&data), &store);
        result.unwrap();
        assert_eq!(messages.len(), 2);

        let SeiPayload::FramePacking(packing) = &messages[0].payload else {
            panic!("unexpected payload {:?}", messages[0].payload);
        };
        assert_eq!(packing.frame_packing_id, 2);
        assert!(packing.frame_packing_cancel_flag);

        assert_eq!(
            messages[1].payload,
            SeiPayload::StereoVideoInfo(StereoVideoInfo {
                field_views_flag: false,
                current_frame_is_left_view_flag: true,
                next_frame_is_second_view_flag: false,
                left_view_self_contained_flag: true,
                right_view_self_contained_flag: true,
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_frame_packing_side_by_side() {
        let data = sei(|w| {
            message(w, payload_type::FRAME_PACKING, |p| {
                p.write_exp_golomb(0).unwrap();
                p.write_bit(false).unwrap();
                p.write_bits(3, 7).unwrap();
                p.write_bit(false).unwrap();
                p.write_bits(1, 6).unwrap();
                p.write_bits(0b000011, 6).unwrap();
                p.write_bits(0x12, 8).unwrap();
                p.write_bits(0x34, 8).unwrap();
                p.write_bits(0, 8).unwrap();
                p.write_exp_golomb(1).unwrap();
                p.write_bit(false).unwrap();
            });
        });

        let (messages, result) = parse_sei(&single_nalu(&data), &ParameterSetStore::new());
        result.unwrap();
        let SeiPayload::FramePacking(packing) = &messages[0].payload else {
            panic!("unexpected payload {:?}", messages[0].payload);
        };
        assert_eq!(packing.frame_packing_type, FramePackingType::SIDE_BY_SIDE);
        assert_eq!(packing.content_interpretation_type, 1);
        assert!(packing.frame0_self_contained_flag);
        assert!(packing.frame1_self_contained_flag);
        assert_eq!(packing.frame0_grid_position_x, 1);
        assert_eq!(packing.frame0_grid_position_y, 2);
        assert_eq!(packing.frame1_grid_position_x, 3);
        assert_eq!(packing.frame1_grid_position_y, 4);
        assert_eq!(packing.frame_packing_repetition_period, 1);
    }

    #[test]
    fn test_unknown_payload_kept() {
        let data = sei(|w| {
            message(w, 300, |p| p.write_bits(0x123456, 24).unwrap());
            message(w, payload_type::STEREO_VIDEO_INFO, |p| p.write_bits(0b1101, 4).unwrap());
        });

        let (messages, result) = parse_sei(&single_nalu(&data), &ParameterSetStore::new());
        result.unwrap();
        assert_eq!(
            messages[0].payload,
            SeiPayload::Unknown(UnhandledPayload {
                payload_type: 300,
                data: Bytes::from_static(&[0x12, 0x34, 0x56]),
            })
        );
        assert!(matches!(messages[1].payload, SeiPayload::StereoVideoInfo(info) if info.top_field_is_left_view_flag));
    }

    #[test]
    fn test_payload_size_clamped_to_nal() {
        // pan-scan rectangle, no structured decoder
        let data = sei(|w| {
            w.write_bits(2, 8).unwrap();
            w.write_bits(200, 8).unwrap();
            w.write_bits(0x1122_3344, 32).unwrap();
        });

        let (messages, result) = parse_sei(&single_nalu(&data), &ParameterSetStore::new());
        result.unwrap();
        assert_eq!(messages[0].payload_size, 200);
        // four payload bytes plus the trailing bits byte
        assert_eq!(
            messages[0].payload,
            SeiPayload::Unknown(UnhandledPayload {
                payload_type: 2,
                data: Bytes::from_static(&[0x11, 0x22, 0x33, 0x44, 0x80]),
            })
        );
    }

    #[test]
    fn test_registered_user_data() {
        let data = sei(|w| {
            // closed captions, US
            message(w, payload_type::REGISTERED_USER_DATA, |p| {
                p.write_bits(0xb5, 8).unwrap();
                p.write_bits(0x0031_4741, 32).unwrap();
            });
            message(w, payload_type::REGISTERED_USER_DATA, |p| {
                p.write_bits(0xff, 8).unwrap();
                p.write_bits(0x07, 8).unwrap();
                p.write_bits(0xab, 8).unwrap();
            });
        });

        let (messages, result) = parse_sei(&single_nalu(&data), &ParameterSetStore::new());
        result.unwrap();
        assert_eq!(
            messages[0].payload,
            SeiPayload::RegisteredUserData(RegisteredUserData {
                country_code: 0xb5,
                country_code_extension: 0,
                data: Bytes::from_static(&[0x00, 0x31, 0x47, 0x41]),
            })
        );
        assert_eq!(
            messages[1].payload,
            SeiPayload::RegisteredUserData(RegisteredUserData {
                country_code: 0xff,
                country_code_extension: 0x07,
                data: Bytes::from_static(&[0xab]),
            })
        );
    }

    #[test]
    fn test_registered_user_data_too_short() {
        for payload in [&[0xb5][..], &[0xff, 0x07]] {
            let data = sei(|w| {
                message(w, payload_type::REGISTERED_USER_DATA, |p| {
                    for byte in payload {
                        p.write_bits(*byte as u64, 8).unwrap();
                    }
                });
            });

            let (messages, result) = parse_sei(&single_nalu(&data), &ParameterSetStore::new());
            assert!(messages.is_empty());
            assert_eq!(result.unwrap_err().kind(), ParserResultKind::BrokenData);
        }
    }

    #[test]
    fn test_user_data_unregistered() {
        let uuid: [u8; 16] = std::array::from_fn(|i| i as u8 * 0x11);
        let data = sei(|w| {
            message(w, payload_type::USER_DATA_UNREGISTERED, |p| {
                for byte in uuid {
                    p.write_bits(byte as u64, 8).unwrap();
                }
                p.write_bits(u64::from_be_bytes(*b"x264 cor"), 64).unwrap();
            });
        });

        let (messages, result) = parse_sei(&single_nalu(&data), &ParameterSetStore::new());
        result.unwrap();
        assert_eq!(
            messages[0].payload,
            SeiPayload::UserDataUnregistered(UserDataUnregistered {
                uuid,
                data: Bytes::from_static(b"x264 cor"),
            })
        );
    }

    #[test]
    fn test_user_data_unregistered_needs_data() {
        for len in [15, 16] {
            let data = sei(|w| {
                message(w, payload_type::USER_DATA_UNREGISTERED, |p| {
                    for _ in 0..len {
                        p.write_bits(0x42, 8).unwrap();
                    }
                });
            });

            let (_, result) = parse_sei(&single_nalu(&data), &ParameterSetStore::new());
            assert_eq!(result.unwrap_err().kind(), ParserResultKind::BrokenData, "{len} bytes");
        }
    }

    #[test]
    fn test_hdr_metadata() {
        let data = sei(|w| {
            // BT.2020 primaries, D65
            message(w, payload_type::MASTERING_DISPLAY_COLOUR_VOLUME, |p| {
                for (x, y) in [(8500, 39850), (6550, 2300), (35400, 14600)] {
                    p.write_bits(x, 16).unwrap();
                    p.write_bits(y, 16).unwrap();
                }
                p.write_bits(15635, 16).unwrap();
                p.write_bits(16450, 16).unwrap();
                p.write_bits(10_000_000, 32).unwrap();
                p.write_bits(50, 32).unwrap();
            });
            message(w, payload_type::CONTENT_LIGHT_LEVEL, |p| {
                p.write_bits(1000, 16).unwrap();
                p.write_bits(400, 16).unwrap();
            });
        });

        let (messages, result) = parse_sei(&single_nalu(&data), &ParameterSetStore::new());
        result.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].payload_size, 24);
        assert_eq!(
            messages[0].payload,
            SeiPayload::MasteringDisplayColourVolume(MasteringDisplayColourVolume {
                display_primaries_x: [8500, 6550, 35400],
                display_primaries_y: [39850, 2300, 14600],
                white_point_x: 15635,
                white_point_y: 16450,
                max_display_mastering_luminance: 10_000_000,
                min_display_mastering_luminance: 50,
            })
        );
        assert_eq!(
            messages[1].payload,
            SeiPayload::ContentLightLevel(ContentLightLevel {
                max_content_light_level: 1000,
                max_pic_average_light_level: 400,
            })
        );
    }

    #[test]
    fn test_stops_at_first_failure() {
        let data = sei(|w| {
            message(w, payload_type::STEREO_VIDEO_INFO, |p| p.write_bits(0b1101, 4).unwrap());
            message(w, payload_type::RECOVERY_POINT, |p| p.write_exp_golomb(0).unwrap());
            message(w, payload_type::STEREO_VIDEO_INFO, |p| p.write_bits(0b1101, 4).unwrap());
        });

        let (messages, result) = parse_sei(&single_nalu(&data), &ParameterSetStore::new());
        assert_eq!(messages.len(), 1);
        assert_eq!(result.unwrap_err().kind(), ParserResultKind::Error);
    }
}
