use bytes_util::BitReader;
use tracing::debug;

use crate::error::ParserResult;

/// `mastering_display_colour_volume()`
///
/// ISO/IEC-14496-10-2022 - D.1.29
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MasteringDisplayColourVolume {
    /// `display_primaries_x[c]`, in increments of 0.00002.
    pub display_primaries_x: [u16; 3],
    /// `display_primaries_y[c]`, in increments of 0.00002.
    pub display_primaries_y: [u16; 3],
    /// `white_point_x`
    pub white_point_x: u16,
    /// `white_point_y`
    pub white_point_y: u16,
    /// `max_display_mastering_luminance`, in units of 0.0001 cd/m².
    pub max_display_mastering_luminance: u32,
    /// `min_display_mastering_luminance`, in units of 0.0001 cd/m².
    pub min_display_mastering_luminance: u32,
}

impl MasteringDisplayColourVolume {
    pub(crate) fn parse(reader: &mut BitReader) -> ParserResult<Self> {
        debug!("parsing \"Mastering display colour volume\"");

        let mut mdcv = Self::default();
        for c in 0..3 {
            mdcv.display_primaries_x[c] = reader.read_bits(16)? as u16;
            mdcv.display_primaries_y[c] = reader.read_bits(16)? as u16;
        }

        mdcv.white_point_x = reader.read_bits(16)? as u16;
        mdcv.white_point_y = reader.read_bits(16)? as u16;
        mdcv.max_display_mastering_luminance = reader.read_bits(32)?;
        mdcv.min_display_mastering_luminance = reader.read_bits(32)?;

        Ok(mdcv)
    }
}

/// `content_light_level_info()`
///
/// ISO/IEC-14496-10-2022 - D.1.31
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentLightLevel {
    /// `max_content_light_level`
    pub max_content_light_level: u16,
    /// `max_pic_average_light_level`
    pub max_pic_average_light_level: u16,
}

impl ContentLightLevel {
    pub(crate) fn parse(reader: &mut BitReader) -> ParserResult<Self> {
        debug!("parsing \"Content light level\"");

        Ok(Self {
            max_content_light_level: reader.read_bits(16)? as u16,
            max_pic_average_light_level: reader.read_bits(16)? as u16,
        })
    }
}
