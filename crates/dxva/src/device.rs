use h264::{CropRect, Sps};

use crate::error::DxvaError;
use crate::picture::PictureField;

/// Surfaces allocated on top of the DPB so output frames can be held downstream.
pub const EXTRA_SURFACES: u32 = 2;

/// The stream properties a device is configured for.
///
/// Two equal values never trigger a renegotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceInfo {
    /// `profile_idc`
    pub profile_idc: u8,
    /// Width in luma samples, a multiple of 16.
    pub coded_width: u32,
    /// Height in luma samples, a multiple of 16.
    pub coded_height: u32,
    /// The visible area. Covers the whole coded size without cropping.
    pub crop: CropRect,
    /// Luma bit depth.
    pub bit_depth: u8,
    /// `chroma_format_idc`
    pub chroma_format_idc: u8,
    /// True when `frame_mbs_only_flag` is 0.
    pub interlaced: bool,
    /// Pictures the DPB holds.
    pub max_dpb_size: u32,
}

impl SequenceInfo {
    /// Collects the properties of `sps`.
    pub fn from_sps(sps: &Sps, max_dpb_size: u32) -> Self {
        Self {
            profile_idc: sps.profile_idc,
            coded_width: sps.width,
            coded_height: sps.height,
            crop: sps.crop_rect.unwrap_or(CropRect {
                x: 0,
                y: 0,
                width: sps.width,
                height: sps.height,
            }),
            bit_depth: sps.bit_depth_luma_minus8 + 8,
            chroma_format_idc: sps.chroma_format_idc,
            interlaced: !sps.frame_mbs_only_flag,
            max_dpb_size,
        }
    }

    /// Surfaces the device should allocate.
    pub const fn surface_pool_size(&self) -> u32 {
        self.max_dpb_size + EXTRA_SURFACES
    }
}

/// How a decoded surface should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputInfo {
    /// The visible area of the surface.
    pub crop: CropRect,
    /// True for interlaced sequences.
    pub interlaced: bool,
    /// Which field or fields the picture holds.
    pub field: PictureField,
    /// `PicOrderCnt` of the picture.
    pub pic_order_cnt: i32,
}

/// The buffers of one picture, ready for the driver.
///
/// Everything is borrowed from the accumulator that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeSubmission<'a> {
    /// Index of the surface the picture decodes into.
    pub picture_id: u8,
    /// The picture parameters buffer.
    pub picture_params: &'a [u8],
    /// One slice control entry per slice.
    pub slice_control: &'a [u8],
    /// Slice data, padded to the configured alignment.
    pub bitstream: &'a [u8],
    /// The inverse quantization matrix buffer, if the codec has one.
    pub inverse_quantization_matrix: Option<&'a [u8]>,
}

/// The accelerator behind a decoder.
///
/// Implementations own the surfaces and talk to the driver. The decoder only
/// ever refers to surfaces through [`DxvaDevice::picture_id`].
pub trait DxvaDevice {
    /// A decode target. Cloning shares the same underlying surface.
    type Surface: Clone;
    /// What [`DxvaDevice::output`] produces.
    type Frame;

    /// Opens or reopens the decoder for a new sequence.
    fn configure(&mut self, info: &SequenceInfo) -> Result<(), DxvaError>;

    /// Hands out a free surface.
    fn new_surface(&mut self) -> Result<Self::Surface, DxvaError>;

    /// The driver index of `surface`, if it belongs to this device.
    fn picture_id(&self, surface: &Self::Surface) -> Option<u8>;

    /// Executes one picture worth of buffers.
    fn submit(&mut self, submission: &DecodeSubmission<'_>) -> Result<(), DxvaError>;

    /// Turns a decoded surface into an output frame.
    fn output(&mut self, surface: &Self::Surface, info: &OutputInfo) -> Result<Self::Frame, DxvaError>;
}
