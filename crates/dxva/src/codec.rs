use std::fmt::Debug;

use h264::{Pps, SliceHeader, Sps};
use zerocopy::{FromZeros, Immutable, IntoBytes};

use crate::structs::{
    DxvaPicEntryH264, DxvaPicParamsH264, DxvaQmatrixH264, DxvaSliceH264Short, MAX_REF_FRAMES, bit_fields,
};

/// The codec specific buffer layouts of an accelerator.
pub trait DxvaCodec {
    /// The picture parameters buffer.
    type PicParams: IntoBytes + Immutable + Clone + Debug;
    /// One entry of the slice control buffer.
    type SliceControl: IntoBytes + Immutable + Clone + Debug;
    /// The inverse quantization matrix buffer.
    type Qmatrix: IntoBytes + Immutable + Clone + Debug;

    /// Describes a slice of `len` bytes at `offset` in the bitstream buffer.
    fn slice_control(offset: u32, len: u32) -> Self::SliceControl;

    /// Extends a slice over `padding` bytes of trailing zeros.
    fn grow_slice_control(slice: &mut Self::SliceControl, padding: u32);
}

/// H.264 with short slice control entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct H264Codec;

impl DxvaCodec for H264Codec {
    type PicParams = DxvaPicParamsH264;
    type Qmatrix = DxvaQmatrixH264;
    type SliceControl = DxvaSliceH264Short;

    fn slice_control(offset: u32, len: u32) -> Self::SliceControl {
        DxvaSliceH264Short {
            bs_nal_unit_data_location: offset,
            slice_bytes_in_buffer: len,
            w_bad_slice_chopping: 0,
        }
    }

    fn grow_slice_control(slice: &mut Self::SliceControl, padding: u32) {
        let len = slice.slice_bytes_in_buffer;
        slice.slice_bytes_in_buffer = len + padding;
    }
}

impl H264Codec {
    /// Fills the picture parameters that come from the parameter sets and
    /// the first slice header.
    ///
    /// The reference lists, `CurrPic` and the order counts are left to the
    /// caller.
    pub fn picture_params(sps: &Sps, pps: &Pps, header: &SliceHeader) -> DxvaPicParamsH264 {
        let mut params = DxvaPicParamsH264::new_zeroed();

        params.set_flag(bit_fields::MBS_CONSECUTIVE, true);
        params.reserved_16_bits = 3;
        params.continuation_flag = 1;
        params.status_report_feedback_number = 1;
        params.ref_frame_list = [DxvaPicEntryH264::INVALID; MAX_REF_FRAMES];

        fill_from_sps(&mut params, sps, header.field_pic_flag);
        fill_from_pps(&mut params, pps);

        params.set_flag(bit_fields::SP_FOR_SWITCH, header.sp_for_switch_flag);
        params.set_flag(bit_fields::FIELD_PIC, header.field_pic_flag);
        params.set_flag(bit_fields::INTRA_PIC, header.slice_type.is_intra());

        params
    }

    /// The scaling lists in effect for `pps`.
    ///
    /// The PPS already carries the sequence lists when it doesn't send its own.
    pub fn qmatrix(pps: &Pps) -> DxvaQmatrixH264 {
        let lists = &pps.scaling_lists;
        DxvaQmatrixH264 {
            b_scaling_lists_4x4: lists.lists_4x4,
            b_scaling_lists_8x8: [lists.lists_8x8[0], lists.lists_8x8[1]],
        }
    }
}

fn fill_from_sps(params: &mut DxvaPicParamsH264, sps: &Sps, field_pic: bool) {
    params.w_frame_width_in_mbs_minus1 = sps.pic_width_in_mbs_minus1 as u16;
    params.w_frame_height_in_mbs_minus1 = if sps.frame_mbs_only_flag {
        sps.pic_height_in_map_units_minus1 as u16
    } else {
        (((sps.pic_height_in_map_units_minus1 + 1) << 1) - 1) as u16
    };

    params.set_flag(bit_fields::RESIDUAL_COLOUR_TRANSFORM, sps.separate_colour_plane_flag);
    params.set_flag(bit_fields::MBAFF_FRAME, sps.mb_adaptive_frame_field_flag && !field_pic);
    params.set_flag(bit_fields::MIN_LUMA_BIPRED_SIZE_8X8, sps.level_idc >= 31);
    params.set_bits(bit_fields::CHROMA_FORMAT_IDC, 2, sps.chroma_format_idc as u16);
    params.set_flag(bit_fields::FRAME_MBS_ONLY, sps.frame_mbs_only_flag);

    params.num_ref_frames = sps.num_ref_frames as u8;
    params.bit_depth_luma_minus8 = sps.bit_depth_luma_minus8;
    params.bit_depth_chroma_minus8 = sps.bit_depth_chroma_minus8;
    params.log2_max_frame_num_minus4 = sps.log2_max_frame_num_minus4;
    params.pic_order_cnt_type = sps.pic_order_cnt_type;
    params.log2_max_pic_order_cnt_lsb_minus4 = sps.log2_max_pic_order_cnt_lsb_minus4;
    params.delta_pic_order_always_zero_flag = sps.delta_pic_order_always_zero_flag as u8;
    params.direct_8x8_inference_flag = sps.direct_8x8_inference_flag as u8;
}

fn fill_from_pps(params: &mut DxvaPicParamsH264, pps: &Pps) {
    params.set_flag(bit_fields::CONSTRAINED_INTRA_PRED, pps.constrained_intra_pred_flag);
    params.set_flag(bit_fields::WEIGHTED_PRED, pps.weighted_pred_flag);
    params.set_bits(bit_fields::WEIGHTED_BIPRED_IDC, 2, pps.weighted_bipred_idc as u16);
    params.set_flag(bit_fields::TRANSFORM_8X8_MODE, pps.transform_8x8_mode_flag);

    params.pic_init_qs_minus26 = pps.pic_init_qs_minus26;
    params.chroma_qp_index_offset = pps.chroma_qp_index_offset;
    params.second_chroma_qp_index_offset = pps.second_chroma_qp_index_offset;
    params.pic_init_qp_minus26 = pps.pic_init_qp_minus26;
    params.num_ref_idx_l0_active_minus1 = pps.num_ref_idx_l0_active_minus1;
    params.num_ref_idx_l1_active_minus1 = pps.num_ref_idx_l1_active_minus1;
    params.entropy_coding_mode_flag = pps.entropy_coding_mode_flag as u8;
    params.pic_order_present_flag = pps.pic_order_present_flag as u8;
    params.deblocking_filter_control_present_flag = pps.deblocking_filter_control_present_flag as u8;
    params.redundant_pic_cnt_present_flag = pps.redundant_pic_cnt_present_flag as u8;
    params.num_slice_groups_minus1 = pps.num_slice_groups_minus1;
    params.slice_group_map_type = pps.slice_group_map.map_type();
    params.slice_group_change_rate_minus1 = pps.slice_group_map.change_rate_minus1().unwrap_or(0) as u16;
}
