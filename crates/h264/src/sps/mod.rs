mod frame_crop_info;
mod hrd;
mod mvc;
mod timing_info;
mod vui;

use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;
use tracing::{debug, trace, warn};

pub use self::frame_crop_info::{CropRect, FrameCropInfo};
pub use self::hrd::{CpbSpec, HrdParameters};
pub use self::mvc::{MAX_VIEW_COUNT, MAX_VIEW_ID, SpsMvcExtension, SpsMvcLevelValue, SpsMvcOperationPoint, SpsMvcView};
pub use self::timing_info::TimingInfo;
pub use self::vui::{BitstreamRestriction, VuiParameters};
use crate::error::{ParserError, ParserResult};
use crate::nal::NalUnit;
use crate::scaling_list::{ScalingFallback, ScalingLists, parse_scaling_lists};

/// Number of SPS ids.
pub const MAX_SPS_COUNT: usize = 32;

/// Profiles whose SPS carries chroma format, bit depth and scaling matrix fields.
const HIGH_PROFILES: [u8; 13] = [100, 110, 122, 244, 44, 83, 86, 118, 128, 138, 139, 134, 135];

/// `profile_idc` of the Scalable Baseline profile.
pub const PROFILE_SCALABLE_BASELINE: u8 = 83;
/// `profile_idc` of the Scalable High profile.
pub const PROFILE_SCALABLE_HIGH: u8 = 86;
/// `profile_idc` of the Multiview High profile.
pub const PROFILE_MULTIVIEW_HIGH: u8 = 118;
/// `profile_idc` of the Stereo High profile.
pub const PROFILE_STEREO_HIGH: u8 = 128;

/// Extension data carried by a subset SPS.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpsExtension {
    /// Plain SPS.
    #[default]
    None,
    /// Scalable video coding. The extension fields are not parsed.
    Svc,
    /// Multiview video coding.
    Mvc(SpsMvcExtension),
}

/// The Sequence Parameter Set.
///
/// Fields that are absent from the bitstream hold their inferred values.
///
/// ISO/IEC-14496-10-2022 - 7.3.2.1.1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sps {
    /// `seq_parameter_set_id`, 0..=31.
    pub id: u8,

    /// `profile_idc`
    pub profile_idc: u8,
    /// `constraint_set0_flag`
    pub constraint_set0_flag: bool,
    /// `constraint_set1_flag`
    pub constraint_set1_flag: bool,
    /// `constraint_set2_flag`
    pub constraint_set2_flag: bool,
    /// `constraint_set3_flag`
    pub constraint_set3_flag: bool,
    /// `constraint_set4_flag`
    pub constraint_set4_flag: bool,
    /// `constraint_set5_flag`
    pub constraint_set5_flag: bool,
    /// `level_idc`
    pub level_idc: u8,

    /// `chroma_format_idc`, 1 (4:2:0) when absent.
    pub chroma_format_idc: u8,
    /// `separate_colour_plane_flag`
    pub separate_colour_plane_flag: bool,
    /// `bit_depth_luma_minus8`, at most 6.
    pub bit_depth_luma_minus8: u8,
    /// `bit_depth_chroma_minus8`, at most 6.
    pub bit_depth_chroma_minus8: u8,
    /// `qpprime_y_zero_transform_bypass_flag`
    pub qpprime_y_zero_transform_bypass_flag: bool,

    /// `seq_scaling_matrix_present_flag`
    pub scaling_matrix_present_flag: bool,
    /// Flat unless `scaling_matrix_present_flag` is set.
    pub scaling_lists: ScalingLists,

    /// `log2_max_frame_num_minus4`, at most 12.
    pub log2_max_frame_num_minus4: u8,
    /// `pic_order_cnt_type`, 0..=2.
    pub pic_order_cnt_type: u8,
    /// `log2_max_pic_order_cnt_lsb_minus4`, at most 12.
    pub log2_max_pic_order_cnt_lsb_minus4: u8,
    /// `delta_pic_order_always_zero_flag`
    pub delta_pic_order_always_zero_flag: bool,
    /// `offset_for_non_ref_pic`
    pub offset_for_non_ref_pic: i32,
    /// `offset_for_top_to_bottom_field`
    pub offset_for_top_to_bottom_field: i32,
    /// `offset_for_ref_frame`, `num_ref_frames_in_pic_order_cnt_cycle` entries (at most 255).
    pub offset_for_ref_frame: Vec<i32>,

    /// `max_num_ref_frames`
    pub num_ref_frames: u32,
    /// `gaps_in_frame_num_value_allowed_flag`
    pub gaps_in_frame_num_value_allowed_flag: bool,
    /// `pic_width_in_mbs_minus1`
    pub pic_width_in_mbs_minus1: u32,
    /// `pic_height_in_map_units_minus1`
    pub pic_height_in_map_units_minus1: u32,
    /// `frame_mbs_only_flag`
    pub frame_mbs_only_flag: bool,
    /// `mb_adaptive_frame_field_flag`
    pub mb_adaptive_frame_field_flag: bool,
    /// `direct_8x8_inference_flag`
    pub direct_8x8_inference_flag: bool,

    /// Present when `frame_cropping_flag == 1`.
    pub frame_crop_info: Option<FrameCropInfo>,

    /// `vui_parameters_present_flag`
    pub vui_parameters_present_flag: bool,
    /// The VUI, when present and parsed.
    pub vui_parameters: Option<VuiParameters>,

    /// `ChromaArrayType`
    pub chroma_array_type: u8,
    /// `MaxFrameNum`
    pub max_frame_num: u32,
    /// Coded width in luma samples, a multiple of 16.
    pub width: u32,
    /// Coded height in luma samples.
    pub height: u32,
    /// Visible area, when cropping is signalled.
    pub crop_rect: Option<CropRect>,

    /// Subset SPS extension.
    pub extension: SpsExtension,
}

impl Default for Sps {
    fn default() -> Self {
        Self {
            id: 0,
            profile_idc: 0,
            constraint_set0_flag: false,
            constraint_set1_flag: false,
            constraint_set2_flag: false,
            constraint_set3_flag: false,
            constraint_set4_flag: false,
            constraint_set5_flag: false,
            level_idc: 0,
            chroma_format_idc: 1,
            separate_colour_plane_flag: false,
            bit_depth_luma_minus8: 0,
            bit_depth_chroma_minus8: 0,
            qpprime_y_zero_transform_bypass_flag: false,
            scaling_matrix_present_flag: false,
            scaling_lists: ScalingLists::default(),
            log2_max_frame_num_minus4: 0,
            pic_order_cnt_type: 0,
            log2_max_pic_order_cnt_lsb_minus4: 0,
            delta_pic_order_always_zero_flag: false,
            offset_for_non_ref_pic: 0,
            offset_for_top_to_bottom_field: 0,
            offset_for_ref_frame: Vec::new(),
            num_ref_frames: 0,
            gaps_in_frame_num_value_allowed_flag: false,
            pic_width_in_mbs_minus1: 0,
            pic_height_in_map_units_minus1: 0,
            frame_mbs_only_flag: false,
            mb_adaptive_frame_field_flag: false,
            direct_8x8_inference_flag: false,
            frame_crop_info: None,
            vui_parameters_present_flag: false,
            vui_parameters: None,
            chroma_array_type: 0,
            max_frame_num: 16,
            width: 0,
            height: 0,
            crop_rect: None,
            extension: SpsExtension::None,
        }
    }
}

/// Reads an `ue(v)` and checks it against `[0, max]`.
pub(crate) fn read_ue_max(reader: &mut BitReader, max: u32) -> ParserResult<u32> {
    let value = reader.read_exp_golomb()?;
    bytes_util::range_check!(value, 0, max)?;
    Ok(value)
}

/// Reads an `se(v)` and checks it against `[min, max]`.
pub(crate) fn read_se_allowed(reader: &mut BitReader, min: i32, max: i32) -> ParserResult<i32> {
    let value = reader.read_signed_exp_golomb()?;
    bytes_util::range_check!(value, min, max)?;
    Ok(value)
}

impl Sps {
    /// Parses an SPS NAL unit without storing it.
    ///
    /// The VUI is skipped unless `parse_vui` is set.
    pub fn parse(nalu: &NalUnit, parse_vui: bool) -> ParserResult<Self> {
        debug!("parsing SPS");

        let mut reader = nalu.rbsp_reader();
        Self::parse_data(&mut reader, parse_vui).inspect_err(|_| warn!("error parsing \"Sequence parameter set\""))
    }

    /// Parses a subset SPS NAL unit, including the MVC extension for the
    /// Multiview and Stereo High profiles. The scalable profiles are only
    /// marked as [`SpsExtension::Svc`].
    ///
    /// The VUI is always read since the extension follows it.
    pub fn parse_subset(nalu: &NalUnit) -> ParserResult<Self> {
        debug!("parsing Subset SPS");

        let mut reader = nalu.rbsp_reader();
        Self::parse_subset_data(&mut reader).inspect_err(|_| warn!("error parsing \"Subset sequence parameter set\""))
    }

    fn parse_subset_data(reader: &mut BitReader) -> ParserResult<Self> {
        let mut sps = Self::parse_data(reader, true)?;
        match sps.profile_idc {
            PROFILE_MULTIVIEW_HIGH | PROFILE_STEREO_HIGH => {
                sps.extension = SpsExtension::Mvc(SpsMvcExtension::parse(reader)?);
            }
            PROFILE_SCALABLE_BASELINE | PROFILE_SCALABLE_HIGH => {
                debug!("scalable subset SPS, extension skipped");
                sps.extension = SpsExtension::Svc;
            }
            _ => {}
        }

        Ok(sps)
    }

    /// `seq_parameter_set_data()`
    fn parse_data(reader: &mut BitReader, parse_vui: bool) -> ParserResult<Self> {
        let mut sps = Self {
            profile_idc: reader.read_u8()?,
            constraint_set0_flag: reader.read_bit()?,
            constraint_set1_flag: reader.read_bit()?,
            constraint_set2_flag: reader.read_bit()?,
            constraint_set3_flag: reader.read_bit()?,
            constraint_set4_flag: reader.read_bit()?,
            constraint_set5_flag: reader.read_bit()?,
            ..Default::default()
        };

        // reserved_zero_2bits
        reader.skip(2)?;
        sps.level_idc = reader.read_u8()?;
        sps.id = read_ue_max(reader, MAX_SPS_COUNT as u32 - 1)? as u8;

        if HIGH_PROFILES.contains(&sps.profile_idc) {
            sps.chroma_format_idc = read_ue_max(reader, 3)? as u8;
            if sps.chroma_format_idc == 3 {
                sps.separate_colour_plane_flag = reader.read_bit()?;
            }

            sps.bit_depth_luma_minus8 = read_ue_max(reader, 6)? as u8;
            sps.bit_depth_chroma_minus8 = read_ue_max(reader, 6)? as u8;
            sps.qpprime_y_zero_transform_bypass_flag = reader.read_bit()?;

            sps.scaling_matrix_present_flag = reader.read_bit()?;
            if sps.scaling_matrix_present_flag {
                let n_lists = if sps.chroma_format_idc != 3 { 8 } else { 12 };
                sps.scaling_lists = parse_scaling_lists(reader, n_lists, &ScalingFallback::DEFAULT)?;
            }
        }

        sps.log2_max_frame_num_minus4 = read_ue_max(reader, 12)? as u8;
        sps.max_frame_num = 1 << (sps.log2_max_frame_num_minus4 + 4);

        sps.pic_order_cnt_type = read_ue_max(reader, 2)? as u8;
        match sps.pic_order_cnt_type {
            0 => sps.log2_max_pic_order_cnt_lsb_minus4 = read_ue_max(reader, 12)? as u8,
            1 => {
                sps.delta_pic_order_always_zero_flag = reader.read_bit()?;
                sps.offset_for_non_ref_pic = reader.read_signed_exp_golomb()?;
                sps.offset_for_top_to_bottom_field = reader.read_signed_exp_golomb()?;
                let num_ref_frames_in_pic_order_cnt_cycle = read_ue_max(reader, 255)?;
                sps.offset_for_ref_frame = (0..num_ref_frames_in_pic_order_cnt_cycle)
                    .map(|_| reader.read_signed_exp_golomb())
                    .collect::<Result<_, _>>()?;
            }
            _ => {}
        }

        sps.num_ref_frames = reader.read_exp_golomb()?;
        sps.gaps_in_frame_num_value_allowed_flag = reader.read_bit()?;
        sps.pic_width_in_mbs_minus1 = reader.read_exp_golomb()?;
        sps.pic_height_in_map_units_minus1 = reader.read_exp_golomb()?;
        sps.frame_mbs_only_flag = reader.read_bit()?;
        if !sps.frame_mbs_only_flag {
            sps.mb_adaptive_frame_field_flag = reader.read_bit()?;
        }

        sps.direct_8x8_inference_flag = reader.read_bit()?;
        if reader.read_bit()? {
            sps.frame_crop_info = Some(FrameCropInfo::parse(reader)?);
        }

        sps.vui_parameters_present_flag = reader.read_bit()?;
        if sps.vui_parameters_present_flag && parse_vui {
            sps.vui_parameters = Some(VuiParameters::parse(reader)?);
        }

        sps.chroma_array_type = if sps.separate_colour_plane_flag {
            0
        } else {
            sps.chroma_format_idc
        };

        let width = (sps.pic_width_in_mbs_minus1 as u64 + 1) * 16;
        let height = (sps.pic_height_in_map_units_minus1 as u64 + 1) * 16 * (2 - sps.frame_mbs_only_flag as u64);
        trace!("initial width={}, height={}", width, height);
        if width > i32::MAX as u64 || height > i32::MAX as u64 {
            warn!("invalid width/height in SPS");
            return Err(ParserError::invalid("invalid width/height in SPS"));
        }

        sps.width = width as u32;
        sps.height = height as u32;

        if let Some(crop) = &sps.frame_crop_info {
            let rect = crop
                .crop_rect(sps.chroma_format_idc, sps.frame_mbs_only_flag, sps.width, sps.height)
                .ok_or_else(|| ParserError::invalid("frame cropping exceeds the picture size"))?;
            trace!(
                "crop_rectangle x={} y={} width={}, height={}",
                rect.x, rect.y, rect.width, rect.height
            );
            sps.crop_rect = Some(rect);
        }

        Ok(sps)
    }

    /// Visible width, after cropping.
    pub fn display_width(&self) -> u32 {
        self.crop_rect.map_or(self.width, |rect| rect.width)
    }

    /// Visible height, after cropping.
    pub fn display_height(&self) -> u32 {
        self.crop_rect.map_or(self.height, |rect| rect.height)
    }

    /// The HRD parameters relevant to picture timing, NAL first.
    pub fn hrd_parameters(&self) -> Option<&HrdParameters> {
        self.vui_parameters.as_ref().and_then(VuiParameters::hrd_parameters)
    }

    /// The MVC extension of a subset SPS.
    pub fn mvc(&self) -> Option<&SpsMvcExtension> {
        match &self.extension {
            SpsExtension::Mvc(mvc) => Some(mvc),
            _ => None,
        }
    }
}

/// Computes the frame rate from the VUI timing info.
///
/// `field_pic_flag` comes from the latest slice header, `pic_struct` from the
/// latest picture timing SEI (0 if none). Returns `(0, 1)` when the rate
/// cannot be determined.
///
/// ISO/IEC-14496-10-2022 - E.2.1, Table E-6
pub fn calculate_framerate(sps: &Sps, field_pic_flag: bool, pic_struct: u8) -> (u32, u32) {
    let Some(vui) = &sps.vui_parameters else {
        return (0, 1);
    };
    let Some(timing) = vui.timing_info else {
        return (0, 1);
    };

    let delta_tfi_divisor: u32 = if vui.pic_struct_present_flag {
        match pic_struct {
            1 | 2 => 1,
            0 | 3 | 4 => 2,
            5 | 6 => 3,
            7 => 4,
            8 => 6,
            _ => 1,
        }
    } else if field_pic_flag {
        1
    } else {
        2
    };

    let den = timing
        .num_units_in_tick
        .checked_mul(delta_tfi_divisor)
        .and_then(|den| den.checked_mul(if field_pic_flag { 2 } else { 1 }));

    match den {
        Some(den) => (timing.time_scale, den),
        None => (0, 1),
    }
}
