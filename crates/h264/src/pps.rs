use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;
use tracing::{debug, warn};

use crate::error::{ParserError, ParserResult};
use crate::nal::NalUnit;
use crate::scaling_list::{ScalingFallback, ScalingLists, parse_scaling_lists};
use crate::sps::{MAX_SPS_COUNT, read_se_allowed, read_ue_max};
use crate::store::ParameterSetStore;

/// Number of PPS ids.
pub const MAX_PPS_COUNT: usize = 256;

/// Slice group layout, present when `num_slice_groups_minus1 > 0`.
///
/// ISO/IEC-14496-10-2022 - 7.4.2.2
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SliceGroupMap {
    /// No slice groups.
    #[default]
    None,
    /// Type 0: `run_length_minus1` per group.
    Interleaved {
        /// `run_length_minus1[iGroup]`
        run_length_minus1: Vec<u32>,
    },
    /// Type 1.
    Dispersed,
    /// Type 2: rectangles, the last group is the background.
    Foreground {
        /// `top_left[iGroup]`
        top_left: Vec<u32>,
        /// `bottom_right[iGroup]`
        bottom_right: Vec<u32>,
    },
    /// Types 3 (box out), 4 (raster scan) and 5 (wipe).
    Changing {
        /// `slice_group_map_type`
        map_type: u8,
        /// `slice_group_change_direction_flag`
        change_direction_flag: bool,
        /// `slice_group_change_rate_minus1`
        change_rate_minus1: u32,
    },
    /// Type 6: one group id per map unit.
    Explicit {
        /// `pic_size_in_map_units_minus1`
        pic_size_in_map_units_minus1: u32,
        /// `slice_group_id[i]`
        slice_group_id: Vec<u8>,
    },
}

impl SliceGroupMap {
    /// `slice_group_map_type`, 0 when there is only one group.
    pub const fn map_type(&self) -> u8 {
        match self {
            Self::None | Self::Interleaved { .. } => 0,
            Self::Dispersed => 1,
            Self::Foreground { .. } => 2,
            Self::Changing { map_type, .. } => *map_type,
            Self::Explicit { .. } => 6,
        }
    }

    /// `slice_group_change_rate_minus1` for map types 3 to 5.
    pub const fn change_rate_minus1(&self) -> Option<u32> {
        match self {
            Self::Changing { change_rate_minus1, .. } => Some(*change_rate_minus1),
            _ => None,
        }
    }
}

/// The Picture Parameter Set.
///
/// ISO/IEC-14496-10-2022 - 7.3.2.2
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pps {
    /// `pic_parameter_set_id`, 0..=255.
    pub id: u8,
    /// `seq_parameter_set_id` of the SPS this PPS was parsed against.
    pub sps_id: u8,

    /// `entropy_coding_mode_flag` (CABAC)
    pub entropy_coding_mode_flag: bool,
    /// `bottom_field_pic_order_in_frame_present_flag`
    pub pic_order_present_flag: bool,
    /// `num_slice_groups_minus1`, at most 7.
    pub num_slice_groups_minus1: u8,
    /// The slice group layout.
    pub slice_group_map: SliceGroupMap,

    /// `num_ref_idx_l0_default_active_minus1`, at most 31.
    pub num_ref_idx_l0_active_minus1: u8,
    /// `num_ref_idx_l1_default_active_minus1`, at most 31.
    pub num_ref_idx_l1_active_minus1: u8,
    /// `weighted_pred_flag`
    pub weighted_pred_flag: bool,
    /// `weighted_bipred_idc` (2 bits)
    pub weighted_bipred_idc: u8,
    /// `pic_init_qp_minus26`
    pub pic_init_qp_minus26: i8,
    /// `pic_init_qs_minus26`
    pub pic_init_qs_minus26: i8,
    /// `chroma_qp_index_offset`
    pub chroma_qp_index_offset: i8,
    /// `deblocking_filter_control_present_flag`
    pub deblocking_filter_control_present_flag: bool,
    /// `constrained_intra_pred_flag`
    pub constrained_intra_pred_flag: bool,
    /// `redundant_pic_cnt_present_flag`
    pub redundant_pic_cnt_present_flag: bool,

    /// `transform_8x8_mode_flag`
    pub transform_8x8_mode_flag: bool,
    /// `pic_scaling_matrix_present_flag`
    pub pic_scaling_matrix_present_flag: bool,
    /// Inherited from the SPS unless `pic_scaling_matrix_present_flag` is set.
    pub scaling_lists: ScalingLists,
    /// `second_chroma_qp_index_offset`, equal to `chroma_qp_index_offset` when absent.
    pub second_chroma_qp_index_offset: i8,
}

impl Pps {
    /// Parses a PPS NAL unit against the SPS found in `store`.
    ///
    /// Fails with [`ParserError::BrokenLink`] if that SPS is missing. The
    /// store is not modified.
    pub fn parse(nalu: &NalUnit, store: &ParameterSetStore) -> ParserResult<Self> {
        debug!("parsing PPS");

        let mut reader = nalu.rbsp_reader();
        Self::parse_inner(&mut reader, store).inspect_err(|err| {
            if !matches!(err, ParserError::BrokenLink { .. }) {
                warn!("error parsing \"Picture parameter set\"");
            }
        })
    }

    fn parse_inner(reader: &mut BitReader, store: &ParameterSetStore) -> ParserResult<Self> {
        let id = read_ue_max(reader, MAX_PPS_COUNT as u32 - 1)? as u8;
        let sps_id = read_ue_max(reader, MAX_SPS_COUNT as u32 - 1)?;

        let Some(sps) = store.get_sps(sps_id) else {
            warn!("couldn't find associated sequence parameter set with id: {}", sps_id);
            return Err(ParserError::missing_sps(sps_id));
        };

        let qp_bd_offset = 6 * (sps.bit_depth_luma_minus8 as i32 + sps.separate_colour_plane_flag as i32);

        let mut pps = Self {
            id,
            sps_id: sps_id as u8,
            scaling_lists: sps.scaling_lists,
            entropy_coding_mode_flag: reader.read_bit()?,
            pic_order_present_flag: reader.read_bit()?,
            num_slice_groups_minus1: read_ue_max(reader, 7)? as u8,
            ..Default::default()
        };

        if pps.num_slice_groups_minus1 > 0 {
            pps.slice_group_map = Self::parse_slice_group_map(reader, pps.num_slice_groups_minus1)?;
        }

        pps.num_ref_idx_l0_active_minus1 = read_ue_max(reader, 31)? as u8;
        pps.num_ref_idx_l1_active_minus1 = read_ue_max(reader, 31)? as u8;
        pps.weighted_pred_flag = reader.read_bit()?;
        pps.weighted_bipred_idc = reader.read_bits(2)? as u8;
        pps.pic_init_qp_minus26 = read_se_allowed(reader, -(26 + qp_bd_offset), 25)? as i8;
        pps.pic_init_qs_minus26 = read_se_allowed(reader, -26, 25)? as i8;
        pps.chroma_qp_index_offset = read_se_allowed(reader, -12, 12)? as i8;
        pps.second_chroma_qp_index_offset = pps.chroma_qp_index_offset;
        pps.deblocking_filter_control_present_flag = reader.read_bit()?;
        pps.constrained_intra_pred_flag = reader.read_bit()?;
        pps.redundant_pic_cnt_present_flag = reader.read_bit()?;

        // older encoders stop here
        if !reader.has_more_rbsp_data() {
            return Ok(pps);
        }

        pps.transform_8x8_mode_flag = reader.read_bit()?;
        pps.pic_scaling_matrix_present_flag = reader.read_bit()?;
        if pps.pic_scaling_matrix_present_flag {
            let lists_8x8 = if sps.chroma_format_idc != 3 { 2 } else { 6 };
            let n_lists = 6 + lists_8x8 * pps.transform_8x8_mode_flag as usize;
            let fallback = if sps.scaling_matrix_present_flag {
                ScalingFallback::from_sequence(&sps.scaling_lists)
            } else {
                ScalingFallback::DEFAULT
            };

            pps.scaling_lists = parse_scaling_lists(reader, n_lists, &fallback)?;
        }

        pps.second_chroma_qp_index_offset = read_se_allowed(reader, -12, 12)? as i8;

        Ok(pps)
    }

    fn parse_slice_group_map(reader: &mut BitReader, num_slice_groups_minus1: u8) -> ParserResult<SliceGroupMap> {
        let map_type = read_ue_max(reader, 6)? as u8;

        let map = match map_type {
            0 => SliceGroupMap::Interleaved {
                run_length_minus1: (0..=num_slice_groups_minus1)
                    .map(|_| reader.read_exp_golomb())
                    .collect::<Result<_, _>>()?,
            },
            1 => SliceGroupMap::Dispersed,
            2 => {
                let mut top_left = Vec::with_capacity(num_slice_groups_minus1 as usize);
                let mut bottom_right = Vec::with_capacity(num_slice_groups_minus1 as usize);
                for _ in 0..num_slice_groups_minus1 {
                    top_left.push(reader.read_exp_golomb()?);
                    bottom_right.push(reader.read_exp_golomb()?);
                }

                SliceGroupMap::Foreground { top_left, bottom_right }
            }
            3..=5 => SliceGroupMap::Changing {
                map_type,
                change_direction_flag: reader.read_bit()?,
                change_rate_minus1: reader.read_exp_golomb()?,
            },
            _ => {
                let pic_size_in_map_units_minus1 = reader.read_exp_golomb()?;
                let bits = (u8::BITS - num_slice_groups_minus1.leading_zeros()) as u8;

                let needed = (pic_size_in_map_units_minus1 as u64 + 1) * bits as u64;
                if needed > reader.remaining_bits() as u64 {
                    return Err(ParserError::invalid(format!(
                        "slice_group_id needs {needed} bits, {} left",
                        reader.remaining_bits()
                    )));
                }

                let slice_group_id = (0..=pic_size_in_map_units_minus1)
                    .map(|_| reader.read_bits(bits).map(|id| id as u8))
                    .collect::<Result<_, _>>()?;

                SliceGroupMap::Explicit {
                    pic_size_in_map_units_minus1,
                    slice_group_id,
                }
            }
        };

        Ok(map)
    }
}
