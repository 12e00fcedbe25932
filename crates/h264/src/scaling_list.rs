//! Scaling lists, their default tables and the zigzag helpers.
//!
//! ISO/IEC-14496-10-2022 - 7.3.2.1.1.1, 7.4.2.1.1 Table 7-2, 8.5.6

use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

use crate::error::ParserResult;

/// `Default_4x4_Intra` (Table 7-3), zigzag order.
pub const DEFAULT_4X4_INTRA: [u8; 16] = [6, 13, 13, 20, 20, 20, 28, 28, 28, 28, 32, 32, 32, 37, 37, 42];

/// `Default_4x4_Inter` (Table 7-3), zigzag order.
pub const DEFAULT_4X4_INTER: [u8; 16] = [10, 14, 14, 20, 20, 20, 24, 24, 24, 24, 27, 27, 27, 30, 30, 34];

/// `Default_8x8_Intra` (Table 7-4), zigzag order.
pub const DEFAULT_8X8_INTRA: [u8; 64] = [
    6, 10, 10, 13, 11, 13, 16, 16, 16, 16, 18, 18, 18, 18, 18, 23, 23, 23, 23, 23, 23, 25, 25, 25, 25, 25, 25, 25, 27, 27,
    27, 27, 27, 27, 27, 27, 29, 29, 29, 29, 29, 29, 29, 31, 31, 31, 31, 31, 31, 33, 33, 33, 33, 33, 36, 36, 36, 36, 38, 38,
    38, 40, 40, 42,
];

/// `Default_8x8_Inter` (Table 7-4), zigzag order.
pub const DEFAULT_8X8_INTER: [u8; 64] = [
    9, 13, 13, 15, 13, 15, 17, 17, 17, 17, 19, 19, 19, 19, 19, 21, 21, 21, 21, 21, 21, 22, 22, 22, 22, 22, 22, 22, 24, 24,
    24, 24, 24, 24, 24, 24, 25, 25, 25, 25, 25, 25, 25, 27, 27, 27, 27, 27, 27, 28, 28, 28, 28, 28, 30, 30, 30, 30, 32, 32,
    32, 33, 33, 35,
];

/// `Flat_4x4_16`
pub const FLAT_4X4: [u8; 16] = [16; 16];

/// `Flat_8x8_16`
pub const FLAT_8X8: [u8; 64] = [16; 64];

const ZIGZAG_4X4: [usize; 16] = [0, 1, 4, 8, 5, 2, 3, 6, 9, 12, 13, 10, 7, 11, 14, 15];

const ZIGZAG_8X8: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20, 13, 6, 7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55,
    62, 63,
];

/// The twelve scaling lists of a parameter set.
///
/// Indices 0..=2 of `lists_4x4` are intra Y/Cb/Cr, 3..=5 inter. `lists_8x8`
/// follows the same split with 0, 2, 4 intra and 1, 3, 5 inter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalingLists {
    /// 4x4 lists in zigzag order.
    pub lists_4x4: [[u8; 16]; 6],
    /// 8x8 lists in zigzag order.
    pub lists_8x8: [[u8; 64]; 6],
}

impl Default for ScalingLists {
    fn default() -> Self {
        Self {
            lists_4x4: [FLAT_4X4; 6],
            lists_8x8: [FLAT_8X8; 6],
        }
    }
}

/// The lists used when the first list of each kind is not transmitted
/// (fall-back rule A or B of Table 7-2).
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScalingFallback {
    pub intra_4x4: [u8; 16],
    pub inter_4x4: [u8; 16],
    pub intra_8x8: [u8; 64],
    pub inter_8x8: [u8; 64],
}

impl ScalingFallback {
    /// Fall-back rule A.
    pub const DEFAULT: Self = Self {
        intra_4x4: DEFAULT_4X4_INTRA,
        inter_4x4: DEFAULT_4X4_INTER,
        intra_8x8: DEFAULT_8X8_INTRA,
        inter_8x8: DEFAULT_8X8_INTER,
    };

    /// Fall-back rule B, taking the sequence level lists.
    pub const fn from_sequence(lists: &ScalingLists) -> Self {
        Self {
            intra_4x4: lists.lists_4x4[0],
            inter_4x4: lists.lists_4x4[3],
            intra_8x8: lists.lists_8x8[0],
            inter_8x8: lists.lists_8x8[1],
        }
    }
}

/// Reads one `scaling_list()`.
///
/// Returns false when `useDefaultScalingMatrixFlag` is set, in which case
/// `list` is left untouched.
fn read_scaling_list(reader: &mut BitReader, list: &mut [u8]) -> ParserResult<bool> {
    let mut last_scale: u8 = 8;
    let mut next_scale: u8 = 8;

    for j in 0..list.len() {
        if next_scale != 0 {
            let delta_scale = reader.read_signed_exp_golomb()?;
            bytes_util::range_check!(delta_scale, -128, 127)?;
            next_scale = (last_scale as i32 + delta_scale).rem_euclid(256) as u8;

            if j == 0 && next_scale == 0 {
                return Ok(false);
            }
        }

        if next_scale != 0 {
            last_scale = next_scale;
        }
        list[j] = last_scale;
    }

    Ok(true)
}

/// Reads the scaling lists of an SPS or PPS.
///
/// `n_lists` is the number of `*_scaling_list_present_flag`s in the bitstream.
/// Lists that are missing, or beyond `n_lists`, are inferred as in Table 7-2.
pub(crate) fn parse_scaling_lists(
    reader: &mut BitReader,
    n_lists: usize,
    fallback: &ScalingFallback,
) -> ParserResult<ScalingLists> {
    let mut lists = ScalingLists::default();

    for i in 0..12 {
        let present = i < n_lists && reader.read_bit()?;

        if i < 6 {
            let default = if i < 3 { &DEFAULT_4X4_INTRA } else { &DEFAULT_4X4_INTER };
            if present {
                if !read_scaling_list(reader, &mut lists.lists_4x4[i])? {
                    lists.lists_4x4[i] = *default;
                }
                continue;
            }

            lists.lists_4x4[i] = match i {
                0 => fallback.intra_4x4,
                3 => fallback.inter_4x4,
                _ => lists.lists_4x4[i - 1],
            };
        } else {
            let k = i - 6;
            let default = if k % 2 == 0 { &DEFAULT_8X8_INTRA } else { &DEFAULT_8X8_INTER };
            if present {
                if !read_scaling_list(reader, &mut lists.lists_8x8[k])? {
                    lists.lists_8x8[k] = *default;
                }
                continue;
            }

            lists.lists_8x8[k] = match k {
                0 => fallback.intra_8x8,
                1 => fallback.inter_8x8,
                _ => lists.lists_8x8[k - 2],
            };
        }
    }

    Ok(lists)
}

/// Converts a 4x4 matrix from raster to zigzag order.
pub fn quant_matrix_4x4_zigzag_from_raster(quant: &[u8; 16]) -> [u8; 16] {
    std::array::from_fn(|i| quant[ZIGZAG_4X4[i]])
}

/// Converts a 4x4 matrix from zigzag to raster order.
pub fn quant_matrix_4x4_raster_from_zigzag(quant: &[u8; 16]) -> [u8; 16] {
    let mut out = [0; 16];
    for (i, &pos) in ZIGZAG_4X4.iter().enumerate() {
        out[pos] = quant[i];
    }
    out
}

/// Converts an 8x8 matrix from raster to zigzag order.
pub fn quant_matrix_8x8_zigzag_from_raster(quant: &[u8; 64]) -> [u8; 64] {
    std::array::from_fn(|i| quant[ZIGZAG_8X8[i]])
}

/// Converts an 8x8 matrix from zigzag to raster order.
pub fn quant_matrix_8x8_raster_from_zigzag(quant: &[u8; 64]) -> [u8; 64] {
    let mut out = [0; 64];
    for (i, &pos) in ZIGZAG_8X8.iter().enumerate() {
        out[pos] = quant[i];
    }
    out
}
