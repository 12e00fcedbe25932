//! Buffer layouts shared with the driver.
//!
//! These mirror `dxva.h` byte for byte. Every struct is packed, so the fields
//! are copied out rather than borrowed.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// `bPicEntry` value of an unused slot.
pub const INVALID_PIC_ENTRY: u8 = 0xFF;

/// Number of entries in `RefFrameList`.
pub const MAX_REF_FRAMES: usize = 16;

/// `DXVA_PicEntry_H264`
///
/// The low seven bits index a surface, the top bit is `AssociatedFlag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, Immutable, IntoBytes, KnownLayout)]
#[repr(C, packed)]
pub struct DxvaPicEntryH264 {
    /// `bPicEntry`
    pub b_pic_entry: u8,
}

impl DxvaPicEntryH264 {
    /// An entry that points at nothing.
    pub const INVALID: Self = Self {
        b_pic_entry: INVALID_PIC_ENTRY,
    };

    /// Builds an entry from a surface index and the associated flag.
    pub const fn new(index: u8, associated: bool) -> Self {
        Self {
            b_pic_entry: (index & 0x7F) | ((associated as u8) << 7),
        }
    }

    /// `Index7Bits`
    pub const fn index(self) -> u8 {
        self.b_pic_entry & 0x7F
    }

    /// `AssociatedFlag`
    pub const fn associated_flag(self) -> bool {
        self.b_pic_entry & 0x80 != 0
    }

    /// True unless the entry is [`Self::INVALID`].
    pub const fn is_valid(self) -> bool {
        self.b_pic_entry != INVALID_PIC_ENTRY
    }
}

/// Bit positions inside `wBitFields`.
pub mod bit_fields {
    /// `field_pic_flag`
    pub const FIELD_PIC: u16 = 0;
    /// `MbaffFrameFlag`
    pub const MBAFF_FRAME: u16 = 1;
    /// `residual_colour_transform_flag`
    pub const RESIDUAL_COLOUR_TRANSFORM: u16 = 2;
    /// `sp_for_switch_flag`
    pub const SP_FOR_SWITCH: u16 = 3;
    /// `chroma_format_idc`, 2 bits.
    pub const CHROMA_FORMAT_IDC: u16 = 4;
    /// `RefPicFlag`
    pub const REF_PIC: u16 = 6;
    /// `constrained_intra_pred_flag`
    pub const CONSTRAINED_INTRA_PRED: u16 = 7;
    /// `weighted_pred_flag`
    pub const WEIGHTED_PRED: u16 = 8;
    /// `weighted_bipred_idc`, 2 bits.
    pub const WEIGHTED_BIPRED_IDC: u16 = 9;
    /// `MbsConsecutiveFlag`
    pub const MBS_CONSECUTIVE: u16 = 11;
    /// `frame_mbs_only_flag`
    pub const FRAME_MBS_ONLY: u16 = 12;
    /// `transform_8x8_mode_flag`
    pub const TRANSFORM_8X8_MODE: u16 = 13;
    /// `MinLumaBipredSize8x8Flag`
    pub const MIN_LUMA_BIPRED_SIZE_8X8: u16 = 14;
    /// `IntraPicFlag`
    pub const INTRA_PIC: u16 = 15;
}

/// `DXVA_PicParams_H264`
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, Immutable, IntoBytes, KnownLayout)]
#[repr(C, packed)]
pub struct DxvaPicParamsH264 {
    /// `wFrameWidthInMbsMinus1`
    pub w_frame_width_in_mbs_minus1: u16,
    /// `wFrameHeightInMbsMinus1`
    pub w_frame_height_in_mbs_minus1: u16,
    /// `CurrPic`
    pub curr_pic: DxvaPicEntryH264,
    /// `num_ref_frames`
    pub num_ref_frames: u8,
    /// `wBitFields`, see [`bit_fields`].
    pub w_bit_fields: u16,
    /// `bit_depth_luma_minus8`
    pub bit_depth_luma_minus8: u8,
    /// `bit_depth_chroma_minus8`
    pub bit_depth_chroma_minus8: u8,
    /// `Reserved16Bits`
    pub reserved_16_bits: u16,
    /// `StatusReportFeedbackNumber`
    pub status_report_feedback_number: u32,
    /// `RefFrameList`
    pub ref_frame_list: [DxvaPicEntryH264; MAX_REF_FRAMES],
    /// `CurrFieldOrderCnt`
    pub curr_field_order_cnt: [i32; 2],
    /// `FieldOrderCntList`
    pub field_order_cnt_list: [[i32; 2]; MAX_REF_FRAMES],
    /// `pic_init_qs_minus26`
    pub pic_init_qs_minus26: i8,
    /// `chroma_qp_index_offset`
    pub chroma_qp_index_offset: i8,
    /// `second_chroma_qp_index_offset`
    pub second_chroma_qp_index_offset: i8,
    /// `ContinuationFlag`
    pub continuation_flag: u8,
    /// `pic_init_qp_minus26`
    pub pic_init_qp_minus26: i8,
    /// `num_ref_idx_l0_active_minus1`
    pub num_ref_idx_l0_active_minus1: u8,
    /// `num_ref_idx_l1_active_minus1`
    pub num_ref_idx_l1_active_minus1: u8,
    /// `Reserved8BitsA`
    pub reserved_8_bits_a: u8,
    /// `FrameNumList`, `LongTermFrameIdx` for long term references.
    pub frame_num_list: [u16; MAX_REF_FRAMES],
    /// `UsedForReferenceFlags`, two bits per entry (top, bottom).
    pub used_for_reference_flags: u32,
    /// `NonExistingFrameFlags`
    pub non_existing_frame_flags: u16,
    /// `frame_num`
    pub frame_num: u16,
    /// `log2_max_frame_num_minus4`
    pub log2_max_frame_num_minus4: u8,
    /// `pic_order_cnt_type`
    pub pic_order_cnt_type: u8,
    /// `log2_max_pic_order_cnt_lsb_minus4`
    pub log2_max_pic_order_cnt_lsb_minus4: u8,
    /// `delta_pic_order_always_zero_flag`
    pub delta_pic_order_always_zero_flag: u8,
    /// `direct_8x8_inference_flag`
    pub direct_8x8_inference_flag: u8,
    /// `entropy_coding_mode_flag`
    pub entropy_coding_mode_flag: u8,
    /// `pic_order_present_flag`
    pub pic_order_present_flag: u8,
    /// `num_slice_groups_minus1`
    pub num_slice_groups_minus1: u8,
    /// `slice_group_map_type`
    pub slice_group_map_type: u8,
    /// `deblocking_filter_control_present_flag`
    pub deblocking_filter_control_present_flag: u8,
    /// `redundant_pic_cnt_present_flag`
    pub redundant_pic_cnt_present_flag: u8,
    /// `Reserved8BitsB`
    pub reserved_8_bits_b: u8,
    /// `slice_group_change_rate_minus1`
    pub slice_group_change_rate_minus1: u16,
    /// `SliceGroupMap`
    pub slice_group_map: [u8; 810],
}

impl DxvaPicParamsH264 {
    /// Sets a `width` bit wide field of `wBitFields` at `shift`.
    pub fn set_bits(&mut self, shift: u16, width: u16, value: u16) {
        let mask = ((1u16 << width) - 1) << shift;
        let bits = self.w_bit_fields;
        self.w_bit_fields = (bits & !mask) | ((value << shift) & mask);
    }

    /// Sets a single bit of `wBitFields`.
    pub fn set_flag(&mut self, shift: u16, value: bool) {
        self.set_bits(shift, 1, value as u16);
    }

    /// Reads a `width` bit wide field of `wBitFields` at `shift`.
    pub fn bits(&self, shift: u16, width: u16) -> u16 {
        let bits = self.w_bit_fields;
        (bits >> shift) & ((1u16 << width) - 1)
    }

    /// Reads a single bit of `wBitFields`.
    pub fn flag(&self, shift: u16) -> bool {
        self.bits(shift, 1) != 0
    }
}

/// `DXVA_Qmatrix_H264`
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, Immutable, IntoBytes, KnownLayout)]
#[repr(C, packed)]
pub struct DxvaQmatrixH264 {
    /// `bScalingLists4x4`
    pub b_scaling_lists_4x4: [[u8; 16]; 6],
    /// `bScalingLists8x8`, intra Y then inter Y.
    pub b_scaling_lists_8x8: [[u8; 64]; 2],
}

/// `DXVA_Slice_H264_Short`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, Immutable, IntoBytes, KnownLayout)]
#[repr(C, packed)]
pub struct DxvaSliceH264Short {
    /// `BSNALunitDataLocation`
    pub bs_nal_unit_data_location: u32,
    /// `SliceBytesInBuffer`
    pub slice_bytes_in_buffer: u32,
    /// `wBadSliceChopping`
    pub w_bad_slice_chopping: u16,
}
