use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;
use tracing::{debug, warn};

use super::hrd::HrdParameters;
use super::timing_info::TimingInfo;
use crate::AspectRatioIdc;
use crate::error::ParserResult;

/// `bitstream_restriction_flag == 1` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitstreamRestriction {
    /// `motion_vectors_over_pic_boundaries_flag`
    pub motion_vectors_over_pic_boundaries_flag: bool,
    /// `max_bytes_per_pic_denom`
    pub max_bytes_per_pic_denom: u32,
    /// `max_bits_per_mb_denom`, at most 16.
    pub max_bits_per_mb_denom: u8,
    /// `log2_max_mv_length_horizontal`, at most 16.
    pub log2_max_mv_length_horizontal: u8,
    /// `log2_max_mv_length_vertical`, at most 16.
    pub log2_max_mv_length_vertical: u8,
    /// `max_num_reorder_frames`
    pub num_reorder_frames: u32,
    /// `max_dec_frame_buffering`
    pub max_dec_frame_buffering: u32,
}

/// `vui_parameters()`
///
/// ISO/IEC-14496-10-2022 - E.1.1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VuiParameters {
    /// `aspect_ratio_info_present_flag`
    pub aspect_ratio_info_present_flag: bool,
    /// `aspect_ratio_idc`
    pub aspect_ratio_idc: AspectRatioIdc,
    /// `sar_width`, only with [`AspectRatioIdc::EXTENDED_SAR`].
    pub sar_width: u16,
    /// `sar_height`, only with [`AspectRatioIdc::EXTENDED_SAR`].
    pub sar_height: u16,
    /// Pixel aspect ratio numerator, 0 when unknown.
    pub par_n: u16,
    /// Pixel aspect ratio denominator, 0 when unknown.
    pub par_d: u16,

    /// `overscan_info_present_flag`
    pub overscan_info_present_flag: bool,
    /// `overscan_appropriate_flag`
    pub overscan_appropriate_flag: bool,

    /// `video_signal_type_present_flag`
    pub video_signal_type_present_flag: bool,
    /// `video_format`, 5 (unspecified) when absent.
    pub video_format: u8,
    /// `video_full_range_flag`
    pub video_full_range_flag: bool,
    /// `colour_description_present_flag`
    pub colour_description_present_flag: bool,
    /// `colour_primaries`, 2 (unspecified) when absent.
    pub colour_primaries: u8,
    /// `transfer_characteristics`, 2 (unspecified) when absent.
    pub transfer_characteristics: u8,
    /// `matrix_coefficients`, 2 (unspecified) when absent.
    pub matrix_coefficients: u8,

    /// `chroma_loc_info_present_flag`
    pub chroma_loc_info_present_flag: bool,
    /// `chroma_sample_loc_type_top_field`, at most 5.
    pub chroma_sample_loc_type_top_field: u8,
    /// `chroma_sample_loc_type_bottom_field`, at most 5.
    pub chroma_sample_loc_type_bottom_field: u8,

    /// Present when `timing_info_present_flag == 1`.
    pub timing_info: Option<TimingInfo>,
    /// Present when `nal_hrd_parameters_present_flag == 1`.
    pub nal_hrd_parameters: Option<HrdParameters>,
    /// Present when `vcl_hrd_parameters_present_flag == 1`.
    pub vcl_hrd_parameters: Option<HrdParameters>,
    /// `low_delay_hrd_flag`
    pub low_delay_hrd_flag: bool,
    /// `pic_struct_present_flag`
    pub pic_struct_present_flag: bool,
    /// Present when `bitstream_restriction_flag == 1`.
    pub bitstream_restriction: Option<BitstreamRestriction>,
}

impl Default for VuiParameters {
    fn default() -> Self {
        Self {
            aspect_ratio_info_present_flag: false,
            aspect_ratio_idc: AspectRatioIdc::UNSPECIFIED,
            sar_width: 0,
            sar_height: 0,
            par_n: 0,
            par_d: 0,
            overscan_info_present_flag: false,
            overscan_appropriate_flag: false,
            video_signal_type_present_flag: false,
            video_format: 5,
            video_full_range_flag: false,
            colour_description_present_flag: false,
            colour_primaries: 2,
            transfer_characteristics: 2,
            matrix_coefficients: 2,
            chroma_loc_info_present_flag: false,
            chroma_sample_loc_type_top_field: 0,
            chroma_sample_loc_type_bottom_field: 0,
            timing_info: None,
            nal_hrd_parameters: None,
            vcl_hrd_parameters: None,
            low_delay_hrd_flag: false,
            pic_struct_present_flag: false,
            bitstream_restriction: None,
        }
    }
}

impl VuiParameters {
    /// Reads `vui_parameters()`.
    pub fn parse(reader: &mut BitReader) -> ParserResult<Self> {
        debug!("parsing \"VUI Parameters\"");
        Self::parse_inner(reader).inspect_err(|_| warn!("error parsing \"VUI Parameters\""))
    }

    fn parse_inner(reader: &mut BitReader) -> ParserResult<Self> {
        let mut vui = Self::default();

        vui.aspect_ratio_info_present_flag = reader.read_bit()?;
        if vui.aspect_ratio_info_present_flag {
            vui.aspect_ratio_idc = AspectRatioIdc(reader.read_u8()?);
            if vui.aspect_ratio_idc == AspectRatioIdc::EXTENDED_SAR {
                vui.sar_width = reader.read_bits(16)? as u16;
                vui.sar_height = reader.read_bits(16)? as u16;
                vui.par_n = vui.sar_width;
                vui.par_d = vui.sar_height;
            } else if let Some((par_n, par_d)) = vui.aspect_ratio_idc.sample_aspect_ratio() {
                vui.par_n = par_n;
                vui.par_d = par_d;
            }
        }

        vui.overscan_info_present_flag = reader.read_bit()?;
        if vui.overscan_info_present_flag {
            vui.overscan_appropriate_flag = reader.read_bit()?;
        }

        vui.video_signal_type_present_flag = reader.read_bit()?;
        if vui.video_signal_type_present_flag {
            vui.video_format = reader.read_bits(3)? as u8;
            vui.video_full_range_flag = reader.read_bit()?;
            vui.colour_description_present_flag = reader.read_bit()?;
            if vui.colour_description_present_flag {
                vui.colour_primaries = reader.read_u8()?;
                vui.transfer_characteristics = reader.read_u8()?;
                vui.matrix_coefficients = reader.read_u8()?;
            }
        }

        vui.chroma_loc_info_present_flag = reader.read_bit()?;
        if vui.chroma_loc_info_present_flag {
            let top = reader.read_exp_golomb()?;
            bytes_util::range_check!(top, 0, 5)?;
            let bottom = reader.read_exp_golomb()?;
            bytes_util::range_check!(bottom, 0, 5)?;
            vui.chroma_sample_loc_type_top_field = top as u8;
            vui.chroma_sample_loc_type_bottom_field = bottom as u8;
        }

        if reader.read_bit()? {
            vui.timing_info = Some(TimingInfo::parse(reader)?);
        }

        if reader.read_bit()? {
            vui.nal_hrd_parameters = Some(HrdParameters::parse(reader)?);
        }

        if reader.read_bit()? {
            vui.vcl_hrd_parameters = Some(HrdParameters::parse(reader)?);
        }

        if vui.nal_hrd_parameters.is_some() || vui.vcl_hrd_parameters.is_some() {
            vui.low_delay_hrd_flag = reader.read_bit()?;
        }

        vui.pic_struct_present_flag = reader.read_bit()?;

        if reader.read_bit()? {
            let motion_vectors_over_pic_boundaries_flag = reader.read_bit()?;
            let max_bytes_per_pic_denom = reader.read_exp_golomb()?;
            let max_bits_per_mb_denom = reader.read_exp_golomb()?;
            bytes_util::range_check!(max_bits_per_mb_denom, 0, 16)?;
            let log2_max_mv_length_horizontal = reader.read_exp_golomb()?;
            bytes_util::range_check!(log2_max_mv_length_horizontal, 0, 16)?;
            let log2_max_mv_length_vertical = reader.read_exp_golomb()?;
            bytes_util::range_check!(log2_max_mv_length_vertical, 0, 16)?;

            vui.bitstream_restriction = Some(BitstreamRestriction {
                motion_vectors_over_pic_boundaries_flag,
                max_bytes_per_pic_denom,
                max_bits_per_mb_denom: max_bits_per_mb_denom as u8,
                log2_max_mv_length_horizontal: log2_max_mv_length_horizontal as u8,
                log2_max_mv_length_vertical: log2_max_mv_length_vertical as u8,
                num_reorder_frames: reader.read_exp_golomb()?,
                max_dec_frame_buffering: reader.read_exp_golomb()?,
            });
        }

        Ok(vui)
    }

    /// The HRD whose delay lengths apply to picture timing: NAL first, then VCL.
    pub fn hrd_parameters(&self) -> Option<&HrdParameters> {
        self.nal_hrd_parameters.as_ref().or(self.vcl_hrd_parameters.as_ref())
    }
}
