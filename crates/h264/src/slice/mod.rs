mod dec_ref_pic_marking;
mod pred_weight;
mod rplm;

use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;
use tracing::{debug, warn};

pub use self::dec_ref_pic_marking::{DecRefPicMarking, MAX_REF_PIC_MARKINGS, RefPicMarking};
pub use self::pred_weight::{MAX_PRED_WEIGHTS, PredWeightTable};
pub use self::rplm::{MAX_REF_PIC_LIST_MODIFICATIONS, RefPicListModification, RefPicListModifications};
use crate::SliceType;
use crate::error::{ParserError, ParserResult};
use crate::nal::NalUnit;
use crate::pps::{MAX_PPS_COUNT, Pps};
use crate::sps::{SpsExtension, read_se_allowed, read_ue_max};
use crate::store::ParameterSetStore;

/// `Ceil(Log2(value))`, at least 1.
fn ceil_log2(value: u64) -> u8 {
    if value <= 1 {
        return 1;
    }

    (u64::BITS - (value - 1).leading_zeros()) as u8
}

/// A parsed slice header.
///
/// The header refers to its parameter sets by id. They are resolved through
/// the [`ParameterSetStore`] that was used to parse it.
///
/// ISO/IEC-14496-10-2022 - 7.3.3
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SliceHeader {
    /// `first_mb_in_slice`
    pub first_mb_in_slice: u32,
    /// `slice_type`, folded onto 0..=4.
    pub slice_type: SliceType,
    /// `pic_parameter_set_id`
    pub pps_id: u8,
    /// `seq_parameter_set_id` of the referenced PPS.
    pub sps_id: u8,

    /// `colour_plane_id` (2 bits)
    pub colour_plane_id: u8,
    /// `frame_num`
    pub frame_num: u16,
    /// `field_pic_flag`
    pub field_pic_flag: bool,
    /// `bottom_field_flag`
    pub bottom_field_flag: bool,
    /// `idr_pic_id`
    pub idr_pic_id: u16,

    /// `pic_order_cnt_lsb`
    pub pic_order_cnt_lsb: u16,
    /// `delta_pic_order_cnt_bottom`
    pub delta_pic_order_cnt_bottom: i32,
    /// `delta_pic_order_cnt[0..2]`
    pub delta_pic_order_cnt: [i32; 2],
    /// `redundant_pic_cnt`
    pub redundant_pic_cnt: u8,

    /// `direct_spatial_mv_pred_flag`
    pub direct_spatial_mv_pred_flag: bool,
    /// `num_ref_idx_active_override_flag`
    pub num_ref_idx_active_override_flag: bool,
    /// `num_ref_idx_l0_active_minus1`, from the PPS unless overridden.
    pub num_ref_idx_l0_active_minus1: u8,
    /// `num_ref_idx_l1_active_minus1`, from the PPS unless overridden.
    pub num_ref_idx_l1_active_minus1: u8,

    /// `ref_pic_list_modification()` for list 0.
    pub ref_pic_list_modification_l0: RefPicListModifications,
    /// `ref_pic_list_modification()` for list 1.
    pub ref_pic_list_modification_l1: RefPicListModifications,
    /// `pred_weight_table()`, default when not present.
    pub pred_weight_table: PredWeightTable,
    /// `dec_ref_pic_marking()`, default when `nal_ref_idc` is 0.
    pub dec_ref_pic_marking: DecRefPicMarking,

    /// `cabac_init_idc`
    pub cabac_init_idc: u8,
    /// `slice_qp_delta`
    pub slice_qp_delta: i8,
    /// `sp_for_switch_flag`
    pub sp_for_switch_flag: bool,
    /// `slice_qs_delta`
    pub slice_qs_delta: i8,
    /// `disable_deblocking_filter_idc`
    pub disable_deblocking_filter_idc: u8,
    /// `slice_alpha_c0_offset_div2`
    pub slice_alpha_c0_offset_div2: i8,
    /// `slice_beta_offset_div2`
    pub slice_beta_offset_div2: i8,
    /// `slice_group_change_cycle`
    pub slice_group_change_cycle: u32,

    /// `MaxPicNum`
    pub max_pic_num: u32,
    /// Size of the picture order count fields in RBSP bits.
    pub pic_order_cnt_bit_size: u32,
    /// Bits consumed from the payload after the NAL header, emulation
    /// prevention bytes included.
    pub header_size: u32,
    /// Emulation prevention bytes dropped while reading the header.
    pub n_emulation_prevention_bytes: u32,
}

impl SliceHeader {
    /// Parses the header of a slice NAL unit against the parameter sets in `store`.
    ///
    /// Fails with [`ParserError::BrokenLink`] when the PPS or its SPS is
    /// missing and with [`ParserError::BrokenData`] for SVC slices.
    pub fn parse(nalu: &NalUnit, store: &ParameterSetStore) -> ParserResult<Self> {
        if nalu.size == 0 {
            debug!("Invalid Nal Unit");
            return Err(ParserError::invalid("empty nal unit"));
        }

        let mut reader = nalu.rbsp_reader();
        Self::parse_inner(&mut reader, nalu, store).inspect_err(|err| {
            if matches!(err, ParserError::Error(_)) {
                warn!("error parsing \"Slice header\"");
            }
        })
    }

    fn parse_inner(reader: &mut BitReader, nalu: &NalUnit, store: &ParameterSetStore) -> ParserResult<Self> {
        let first_mb_in_slice = reader.read_exp_golomb()?;
        let slice_type = SliceType::from_raw(reader.read_exp_golomb()?);

        debug!("parsing \"Slice header\", slice type {:?}", slice_type);

        let pps_id = read_ue_max(reader, MAX_PPS_COUNT as u32 - 1)?;
        let Some(pps) = store.get_pps(pps_id) else {
            warn!("couldn't find associated picture parameter set with id: {}", pps_id);
            return Err(ParserError::missing_pps(pps_id));
        };

        let Some(sps) = store.get_sps(pps.sps_id as u32) else {
            warn!("couldn't find associated sequence parameter set with id: {}", pps.sps_id);
            return Err(ParserError::missing_sps(pps.sps_id as u32));
        };

        if matches!(sps.extension, SpsExtension::Svc) {
            warn!("failed to parse unsupported slice header");
            return Err(ParserError::BrokenData);
        }

        let mut header = Self {
            first_mb_in_slice,
            slice_type,
            pps_id: pps.id,
            sps_id: sps.id,
            ..Default::default()
        };

        if !slice_type.is_i() {
            header.num_ref_idx_l0_active_minus1 = pps.num_ref_idx_l0_active_minus1;
            if slice_type.is_b() {
                header.num_ref_idx_l1_active_minus1 = pps.num_ref_idx_l1_active_minus1;
            }
        }

        if sps.separate_colour_plane_flag {
            header.colour_plane_id = reader.read_bits(2)? as u8;
        }

        header.frame_num = reader.read_bits(sps.log2_max_frame_num_minus4 + 4)? as u16;

        if !sps.frame_mbs_only_flag {
            header.field_pic_flag = reader.read_bit()?;
            if header.field_pic_flag {
                header.bottom_field_flag = reader.read_bit()?;
            }
        }

        header.max_pic_num = if header.field_pic_flag {
            2 * sps.max_frame_num
        } else {
            sps.max_frame_num
        };

        if nalu.idr_pic_flag {
            header.idr_pic_id = read_ue_max(reader, u16::MAX as u32)? as u16;
        }

        let start_pos = reader.bit_position();
        let start_epb = reader.emulation_prevention_bytes();

        if sps.pic_order_cnt_type == 0 {
            header.pic_order_cnt_lsb = reader.read_bits(sps.log2_max_pic_order_cnt_lsb_minus4 + 4)? as u16;
            if pps.pic_order_present_flag && !header.field_pic_flag {
                header.delta_pic_order_cnt_bottom = reader.read_signed_exp_golomb()?;
            }
        }

        if sps.pic_order_cnt_type == 1 && !sps.delta_pic_order_always_zero_flag {
            header.delta_pic_order_cnt[0] = reader.read_signed_exp_golomb()?;
            if pps.pic_order_present_flag && !header.field_pic_flag {
                header.delta_pic_order_cnt[1] = reader.read_signed_exp_golomb()?;
            }
        }

        let epb = reader.emulation_prevention_bytes() - start_epb;
        header.pic_order_cnt_bit_size = (reader.bit_position() - start_pos - 8 * epb) as u32;

        if pps.redundant_pic_cnt_present_flag {
            header.redundant_pic_cnt = read_ue_max(reader, i8::MAX as u32)? as u8;
        }

        if slice_type.is_b() {
            header.direct_spatial_mv_pred_flag = reader.read_bit()?;
        }

        if slice_type.is_p() || slice_type.is_sp() || slice_type.is_b() {
            header.num_ref_idx_active_override_flag = reader.read_bit()?;
            if header.num_ref_idx_active_override_flag {
                header.num_ref_idx_l0_active_minus1 = read_ue_max(reader, 31)? as u8;
                if slice_type.is_b() {
                    header.num_ref_idx_l1_active_minus1 = read_ue_max(reader, 31)? as u8;
                }
            }
        }

        if !slice_type.is_intra() {
            header.ref_pic_list_modification_l0 =
                RefPicListModifications::parse(reader, header.max_pic_num, nalu.is_mvc())
                    .inspect_err(|_| warn!("error parsing \"Reference picture list 0 modification\""))?;
        }

        if slice_type.is_b() {
            header.ref_pic_list_modification_l1 =
                RefPicListModifications::parse(reader, header.max_pic_num, nalu.is_mvc())
                    .inspect_err(|_| warn!("error parsing \"Reference picture list 1 modification\""))?;
        }

        if header.has_pred_weight_table(pps) {
            debug!("parsing \"Prediction weight table\"");
            header.pred_weight_table = PredWeightTable::parse(
                reader,
                sps.chroma_array_type,
                header.num_ref_idx_l0_active_minus1,
                slice_type.is_b().then_some(header.num_ref_idx_l1_active_minus1),
            )
            .inspect_err(|_| warn!("error parsing \"Prediction weight table\""))?;
        }

        if nalu.ref_idc != 0 {
            debug!("parsing \"Decoded reference picture marking\"");
            header.dec_ref_pic_marking = DecRefPicMarking::parse(reader, nalu.idr_pic_flag)
                .inspect_err(|_| warn!("error parsing \"Decoded reference picture marking\""))?;
        }

        if pps.entropy_coding_mode_flag && !slice_type.is_intra() {
            header.cabac_init_idc = read_ue_max(reader, 2)? as u8;
        }

        header.slice_qp_delta = read_se_allowed(reader, -87, 77)? as i8;

        if slice_type.is_sp() || slice_type.is_si() {
            if slice_type.is_sp() {
                header.sp_for_switch_flag = reader.read_bit()?;
            }
            header.slice_qs_delta = read_se_allowed(reader, -51, 51)? as i8;
        }

        if pps.deblocking_filter_control_present_flag {
            header.disable_deblocking_filter_idc = read_ue_max(reader, 2)? as u8;
            if header.disable_deblocking_filter_idc != 1 {
                header.slice_alpha_c0_offset_div2 = read_se_allowed(reader, -6, 6)? as i8;
                header.slice_beta_offset_div2 = read_se_allowed(reader, -6, 6)? as i8;
            }
        }

        if let Some(change_rate_minus1) = pps.slice_group_map.change_rate_minus1() {
            let pic_size_in_map_units =
                (sps.pic_width_in_mbs_minus1 as u64 + 1) * (sps.pic_height_in_map_units_minus1 as u64 + 1);
            let bits = ceil_log2(pic_size_in_map_units / (change_rate_minus1 as u64 + 1) + 1);
            if bits > 32 {
                warn!("slice_group_change_cycle needs {} bits", bits);
                return Err(ParserError::invalid(format!("slice_group_change_cycle needs {bits} bits")));
            }
            header.slice_group_change_cycle = reader.read_bits(bits)?;
        }

        header.header_size = reader.bit_position() as u32;
        header.n_emulation_prevention_bytes = reader.emulation_prevention_bytes() as u32;

        Ok(header)
    }

    fn has_pred_weight_table(&self, pps: &Pps) -> bool {
        (pps.weighted_pred_flag && (self.slice_type.is_p() || self.slice_type.is_sp()))
            || (pps.weighted_bipred_idc == 1 && self.slice_type.is_b())
    }

    /// Bit offset of the first slice data bit from the start of the NAL
    /// header, counted in RBSP bits.
    pub fn slice_data_bit_offset(&self, nalu: &NalUnit) -> u32 {
        8 * nalu.header_bytes as u32 + self.header_size - 8 * self.n_emulation_prevention_bytes
    }

    /// [`slice_data_bit_offset`](Self::slice_data_bit_offset) rounded up to whole bytes.
    pub fn slice_data_offset(&self, nalu: &NalUnit) -> u32 {
        self.slice_data_bit_offset(nalu).div_ceil(8)
    }

    /// True for the bottom field of a field picture.
    pub const fn is_bottom_field(&self) -> bool {
        self.field_pic_flag && self.bottom_field_flag
    }
}
