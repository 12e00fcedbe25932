use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;
use tracing::{debug, warn};

use crate::error::ParserResult;
use crate::sps::read_ue_max;

/// `stereo_video_info()`
///
/// ISO/IEC-14496-10-2022 - D.1.22
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StereoVideoInfo {
    /// `field_views_flag`
    pub field_views_flag: bool,
    /// `top_field_is_left_view_flag`, field views only.
    pub top_field_is_left_view_flag: bool,
    /// `current_frame_is_left_view_flag`, frame views only.
    pub current_frame_is_left_view_flag: bool,
    /// `next_frame_is_second_view_flag`, frame views only.
    pub next_frame_is_second_view_flag: bool,
    /// `left_view_self_contained_flag`
    pub left_view_self_contained_flag: bool,
    /// `right_view_self_contained_flag`
    pub right_view_self_contained_flag: bool,
}

impl StereoVideoInfo {
    pub(crate) fn parse(reader: &mut BitReader) -> ParserResult<Self> {
        debug!("parsing \"Stereo Video info\"");

        let mut info = Self {
            field_views_flag: reader.read_bit()?,
            ..Default::default()
        };

        if info.field_views_flag {
            info.top_field_is_left_view_flag = reader.read_bit()?;
        } else {
            info.current_frame_is_left_view_flag = reader.read_bit()?;
            info.next_frame_is_second_view_flag = reader.read_bit()?;
        }

        info.left_view_self_contained_flag = reader.read_bit()?;
        info.right_view_self_contained_flag = reader.read_bit()?;

        Ok(info)
    }
}

/// `frame_packing_arrangement_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FramePackingType(pub u8);

impl FramePackingType {
    /// Checkerboard interleaving.
    pub const CHECKERBOARD: Self = Self(0);
    /// Column interleaving.
    pub const COLUMN_INTERLEAVING: Self = Self(1);
    /// Row interleaving.
    pub const ROW_INTERLEAVING: Self = Self(2);
    /// Side by side.
    pub const SIDE_BY_SIDE: Self = Self(3);
    /// Top and bottom.
    pub const TOP_AND_BOTTOM: Self = Self(4);
    /// Alternating frames.
    pub const TEMPORAL_INTERLEAVING: Self = Self(5);
}

/// `frame_packing_arrangement()`
///
/// ISO/IEC-14496-10-2022 - D.1.25
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FramePacking {
    /// `frame_packing_arrangement_id`
    pub frame_packing_id: u32,
    /// `frame_packing_arrangement_cancel_flag`. Nothing else is read when set.
    pub frame_packing_cancel_flag: bool,
    /// `frame_packing_arrangement_type` (7 bits)
    pub frame_packing_type: FramePackingType,
    /// `quincunx_sampling_flag`
    pub quincunx_sampling_flag: bool,
    /// `content_interpretation_type` (6 bits)
    pub content_interpretation_type: u8,
    /// `spatial_flipping_flag`
    pub spatial_flipping_flag: bool,
    /// `frame0_flipped_flag`
    pub frame0_flipped_flag: bool,
    /// `field_views_flag`
    pub field_views_flag: bool,
    /// `current_frame_is_frame0_flag`
    pub current_frame_is_frame0_flag: bool,
    /// `frame0_self_contained_flag`
    pub frame0_self_contained_flag: bool,
    /// `frame1_self_contained_flag`
    pub frame1_self_contained_flag: bool,
    /// `frame0_grid_position_x` (4 bits)
    pub frame0_grid_position_x: u8,
    /// `frame0_grid_position_y` (4 bits)
    pub frame0_grid_position_y: u8,
    /// `frame1_grid_position_x` (4 bits)
    pub frame1_grid_position_x: u8,
    /// `frame1_grid_position_y` (4 bits)
    pub frame1_grid_position_y: u8,
    /// `frame_packing_arrangement_repetition_period`, at most 16384.
    pub frame_packing_repetition_period: u32,
}

impl FramePacking {
    /// Reads the message. `payload_size_bits` bounds the extension data skipped
    /// after `frame_packing_arrangement_extension_flag`.
    pub(crate) fn parse(reader: &mut BitReader, payload_size_bits: usize) -> ParserResult<Self> {
        debug!("parsing \"Frame Packing Arrangement\"");

        let start_pos = reader.bit_position();
        let mut packing = Self {
            frame_packing_id: reader.read_exp_golomb()?,
            frame_packing_cancel_flag: reader.read_bit()?,
            ..Default::default()
        };

        if !packing.frame_packing_cancel_flag {
            packing.frame_packing_type = FramePackingType(reader.read_bits(7)? as u8);
            packing.quincunx_sampling_flag = reader.read_bit()?;
            packing.content_interpretation_type = reader.read_bits(6)? as u8;
            packing.spatial_flipping_flag = reader.read_bit()?;
            packing.frame0_flipped_flag = reader.read_bit()?;
            packing.field_views_flag = reader.read_bit()?;
            packing.current_frame_is_frame0_flag = reader.read_bit()?;
            packing.frame0_self_contained_flag = reader.read_bit()?;
            packing.frame1_self_contained_flag = reader.read_bit()?;

            if !packing.quincunx_sampling_flag && packing.frame_packing_type != FramePackingType::TEMPORAL_INTERLEAVING {
                packing.frame0_grid_position_x = reader.read_bits(4)? as u8;
                packing.frame0_grid_position_y = reader.read_bits(4)? as u8;
                packing.frame1_grid_position_x = reader.read_bits(4)? as u8;
                packing.frame1_grid_position_y = reader.read_bits(4)? as u8;
            }

            // frame_packing_arrangement_reserved_byte
            reader.skip(8)?;
            packing.frame_packing_repetition_period = read_ue_max(reader, 16384)?;
        }

        let extension_flag = reader.read_bit()?;
        if extension_flag {
            let consumed = reader.bit_position() - start_pos;
            if reader.skip_long(payload_size_bits.saturating_sub(consumed)).is_err() {
                warn!("frame packing extension runs past the end of the message");
            }
        }

        Ok(packing)
    }
}
