//! Bitstream builders shared by the unit tests.

use bytes::Bytes;

use crate::nal::{NalUnit, identify_nalu_unchecked};
use crate::writer::{NalPrefix, NalWriter};

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Locates the single unit in an Annex-B buffer built by the helpers below.
pub(crate) fn single_nalu(data: &[u8]) -> NalUnit<'_> {
    identify_nalu_unchecked(data, 0).unwrap()
}

/// A minimal SPS description.
#[derive(Debug, Clone)]
pub(crate) struct TestSps {
    pub id: u32,
    pub profile_idc: u8,
    pub level_idc: u8,
    pub chroma_format_idc: u32,
    pub log2_max_frame_num_minus4: u32,
    pub pic_order_cnt_type: u32,
    pub log2_max_pic_order_cnt_lsb_minus4: u32,
    pub num_ref_frames: u32,
    pub width_mbs: u32,
    pub height_map_units: u32,
    pub frame_mbs_only_flag: bool,
    pub crop_bottom: Option<u32>,
    /// `(num_units_in_tick, time_scale)` plus `pic_struct_present_flag`.
    pub timing: Option<(u32, u32, bool)>,
    /// `nal_hrd_parameters` with these delay lengths minus1 and time offset length.
    pub nal_hrd: Option<(u8, u8, u8, u8)>,
}

impl Default for TestSps {
    fn default() -> Self {
        Self {
            id: 0,
            profile_idc: 66,
            level_idc: 31,
            chroma_format_idc: 1,
            log2_max_frame_num_minus4: 0,
            pic_order_cnt_type: 2,
            log2_max_pic_order_cnt_lsb_minus4: 0,
            num_ref_frames: 1,
            width_mbs: 80,
            height_map_units: 45,
            frame_mbs_only_flag: true,
            crop_bottom: None,
            timing: None,
            nal_hrd: None,
        }
    }
}

impl TestSps {
    pub fn build(&self) -> Bytes {
        self.build_with(7, |_| {})
    }

    /// Builds the unit with `nal_type`, letting `extra` append fields after the SPS data.
    pub fn build_with(&self, nal_type: u8, extra: impl FnOnce(&mut NalWriter)) -> Bytes {
        let mut w = NalWriter::new(3, nal_type, NalPrefix::StartCode4).unwrap();
        w.write_bits(self.profile_idc as u64, 8).unwrap();
        // constraint flags and reserved_zero_2bits
        w.write_bits(0, 8).unwrap();
        w.write_bits(self.level_idc as u64, 8).unwrap();
        w.write_ue(self.id as u64).unwrap();

        if matches!(self.profile_idc, 83 | 86 | 100 | 118 | 128) {
            w.write_ue(self.chroma_format_idc as u64).unwrap();
            w.write_ue(0).unwrap();
            w.write_ue(0).unwrap();
            w.write_bit(false).unwrap();
            // seq_scaling_matrix_present_flag
            w.write_bit(false).unwrap();
        }

        w.write_ue(self.log2_max_frame_num_minus4 as u64).unwrap();
        w.write_ue(self.pic_order_cnt_type as u64).unwrap();
        if self.pic_order_cnt_type == 0 {
            w.write_ue(self.log2_max_pic_order_cnt_lsb_minus4 as u64).unwrap();
        }

        w.write_ue(self.num_ref_frames as u64).unwrap();
        w.write_bit(false).unwrap();
        w.write_ue(self.width_mbs as u64 - 1).unwrap();
        w.write_ue(self.height_map_units as u64 - 1).unwrap();
        w.write_bit(self.frame_mbs_only_flag).unwrap();
        if !self.frame_mbs_only_flag {
            w.write_bit(false).unwrap();
        }
        // direct_8x8_inference_flag
        w.write_bit(true).unwrap();

        w.write_bit(self.crop_bottom.is_some()).unwrap();
        if let Some(bottom) = self.crop_bottom {
            w.write_ue(0).unwrap();
            w.write_ue(0).unwrap();
            w.write_ue(0).unwrap();
            w.write_ue(bottom as u64).unwrap();
        }

        let vui = self.timing.is_some() || self.nal_hrd.is_some();
        w.write_bit(vui).unwrap();
        if vui {
            // aspect ratio, overscan, video signal, chroma loc
            w.write_bits(0, 4).unwrap();
            w.write_bit(self.timing.is_some()).unwrap();
            if let Some((num_units_in_tick, time_scale, _)) = self.timing {
                w.write_bits(num_units_in_tick as u64, 32).unwrap();
                w.write_bits(time_scale as u64, 32).unwrap();
                w.write_bit(true).unwrap();
            }

            w.write_bit(self.nal_hrd.is_some()).unwrap();
            if let Some((initial, cpb, dpb, time_offset)) = self.nal_hrd {
                w.write_ue(0).unwrap();
                w.write_bits(0, 4).unwrap();
                w.write_bits(0, 4).unwrap();
                w.write_ue(1000).unwrap();
                w.write_ue(2000).unwrap();
                w.write_bit(false).unwrap();
                w.write_bits(initial as u64, 5).unwrap();
                w.write_bits(cpb as u64, 5).unwrap();
                w.write_bits(dpb as u64, 5).unwrap();
                w.write_bits(time_offset as u64, 5).unwrap();
            }
            // vcl_hrd_parameters_present_flag
            w.write_bit(false).unwrap();
            if self.nal_hrd.is_some() {
                w.write_bit(false).unwrap();
            }
            w.write_bit(self.timing.is_some_and(|(_, _, pic_struct)| pic_struct)).unwrap();
            // bitstream_restriction_flag
            w.write_bit(false).unwrap();
        }

        extra(&mut w);
        w.finish().unwrap()
    }
}

/// A minimal PPS description.
#[derive(Debug, Clone)]
pub(crate) struct TestPps {
    pub id: u32,
    pub sps_id: u32,
    pub entropy_coding_mode_flag: bool,
    pub bottom_field_pic_order_in_frame_present_flag: bool,
    pub num_ref_idx_l0_default_active_minus1: u32,
    pub num_ref_idx_l1_default_active_minus1: u32,
    pub weighted_pred_flag: bool,
    pub weighted_bipred_idc: u8,
    pub deblocking_filter_control_present_flag: bool,
    pub redundant_pic_cnt_present_flag: bool,
    /// Two slice groups with `(slice_group_map_type, slice_group_change_rate_minus1)`,
    /// map type 3 to 5.
    pub changing_slice_groups: Option<(u8, u32)>,
}

impl Default for TestPps {
    fn default() -> Self {
        Self {
            id: 0,
            sps_id: 0,
            entropy_coding_mode_flag: false,
            bottom_field_pic_order_in_frame_present_flag: false,
            num_ref_idx_l0_default_active_minus1: 0,
            num_ref_idx_l1_default_active_minus1: 0,
            weighted_pred_flag: false,
            weighted_bipred_idc: 0,
            deblocking_filter_control_present_flag: true,
            redundant_pic_cnt_present_flag: false,
            changing_slice_groups: None,
        }
    }
}

impl TestPps {
    pub fn build(&self) -> Bytes {
        let mut w = NalWriter::new(3, 8, NalPrefix::StartCode4).unwrap();
        w.write_ue(self.id as u64).unwrap();
        w.write_ue(self.sps_id as u64).unwrap();
        w.write_bit(self.entropy_coding_mode_flag).unwrap();
        w.write_bit(self.bottom_field_pic_order_in_frame_present_flag).unwrap();
        if let Some((map_type, change_rate_minus1)) = self.changing_slice_groups {
            w.write_ue(1).unwrap();
            w.write_ue(map_type as u64).unwrap();
            // slice_group_change_direction_flag
            w.write_bit(false).unwrap();
            w.write_ue(change_rate_minus1 as u64).unwrap();
        } else {
            // num_slice_groups_minus1
            w.write_ue(0).unwrap();
        }
        w.write_ue(self.num_ref_idx_l0_default_active_minus1 as u64).unwrap();
        w.write_ue(self.num_ref_idx_l1_default_active_minus1 as u64).unwrap();
        w.write_bit(self.weighted_pred_flag).unwrap();
        w.write_bits(self.weighted_bipred_idc as u64, 2).unwrap();
        // pic_init_qp_minus26, pic_init_qs_minus26, chroma_qp_index_offset
        w.write_se(0).unwrap();
        w.write_se(0).unwrap();
        w.write_se(0).unwrap();
        w.write_bit(self.deblocking_filter_control_present_flag).unwrap();
        // constrained_intra_pred_flag
        w.write_bit(false).unwrap();
        w.write_bit(self.redundant_pic_cnt_present_flag).unwrap();
        w.finish().unwrap()
    }
}
