use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

use crate::error::ParserResult;

/// The `frame_crop_*_offset` fields, in crop units.
///
/// ISO/IEC-14496-10-2022 - 7.4.2.1.1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameCropInfo {
    /// `frame_crop_left_offset`
    pub frame_crop_left_offset: u32,
    /// `frame_crop_right_offset`
    pub frame_crop_right_offset: u32,
    /// `frame_crop_top_offset`
    pub frame_crop_top_offset: u32,
    /// `frame_crop_bottom_offset`
    pub frame_crop_bottom_offset: u32,
}

/// The visible rectangle in luma samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Visible width.
    pub width: u32,
    /// Visible height.
    pub height: u32,
}

/// `SubWidthC`, indexed by `chroma_format_idc`.
const SUB_WIDTH_C: [u32; 4] = [1, 2, 2, 1];
/// `SubHeightC`, indexed by `chroma_format_idc`.
const SUB_HEIGHT_C: [u32; 4] = [1, 2, 1, 1];

impl FrameCropInfo {
    /// Reads the four offsets present when `frame_cropping_flag == 1`.
    pub fn parse(reader: &mut BitReader) -> ParserResult<Self> {
        Ok(Self {
            frame_crop_left_offset: reader.read_exp_golomb()?,
            frame_crop_right_offset: reader.read_exp_golomb()?,
            frame_crop_top_offset: reader.read_exp_golomb()?,
            frame_crop_bottom_offset: reader.read_exp_golomb()?,
        })
    }

    /// Converts the offsets to luma samples for a `width` x `height` picture.
    ///
    /// Returns `None` if the offsets do not fit inside the picture.
    pub fn crop_rect(&self, chroma_format_idc: u8, frame_mbs_only_flag: bool, width: u32, height: u32) -> Option<CropRect> {
        let idx = chroma_format_idc.min(3) as usize;
        let unit_x = SUB_WIDTH_C[idx];
        let unit_y = SUB_HEIGHT_C[idx] * (2 - frame_mbs_only_flag as u32);

        let crop_x = (self.frame_crop_left_offset as u64 + self.frame_crop_right_offset as u64) * unit_x as u64;
        let crop_y = (self.frame_crop_top_offset as u64 + self.frame_crop_bottom_offset as u64) * unit_y as u64;

        Some(CropRect {
            x: self.frame_crop_left_offset.checked_mul(unit_x)?,
            y: self.frame_crop_top_offset.checked_mul(unit_y)?,
            width: u32::try_from((width as u64).checked_sub(crop_x)?).ok()?,
            height: u32::try_from((height as u64).checked_sub(crop_y)?).ok()?,
        })
    }
}
