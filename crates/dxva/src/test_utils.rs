//! A scripted device and parameter set builders for the unit tests.

use bytes::Bytes;
use h264::{NalParser, NalParserConfig, NalPrefix, NalWriter, Pps, SliceHeader, SliceType, Sps, identify_nalu_unchecked};
use zerocopy::FromBytes;

use crate::device::{DecodeSubmission, DxvaDevice, OutputInfo, SequenceInfo};
use crate::error::DxvaError;
use crate::structs::{DxvaPicParamsH264, DxvaQmatrixH264, DxvaSliceH264Short};

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// An owned copy of a [`DecodeSubmission`].
#[derive(Debug, Clone)]
pub(crate) struct Submitted {
    pub picture_id: u8,
    pub picture_params: DxvaPicParamsH264,
    pub slices: Vec<(u32, u32)>,
    pub bitstream: Vec<u8>,
    pub qmatrix: Option<DxvaQmatrixH264>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MockSurface(pub u8);

#[derive(Debug, Default)]
pub(crate) struct MockDevice {
    pub configured: Vec<SequenceInfo>,
    pub submitted: Vec<Submitted>,
    pub outputs: Vec<(u8, OutputInfo)>,
    pub allocated: u8,
    pub max_surfaces: Option<u8>,
    pub fail_configure: bool,
    pub fail_submit: bool,
}

impl DxvaDevice for MockDevice {
    type Frame = u8;
    type Surface = MockSurface;

    fn configure(&mut self, info: &SequenceInfo) -> Result<(), DxvaError> {
        if self.fail_configure {
            return Err(DxvaError::Submission("no decoder profile".into()));
        }

        self.configured.push(*info);
        Ok(())
    }

    fn new_surface(&mut self) -> Result<Self::Surface, DxvaError> {
        if self.max_surfaces.is_some_and(|max| self.allocated >= max) {
            return Err(DxvaError::SurfaceAllocation);
        }

        self.allocated += 1;
        Ok(MockSurface(self.allocated - 1))
    }

    fn picture_id(&self, surface: &Self::Surface) -> Option<u8> {
        (surface.0 < self.allocated).then_some(surface.0)
    }

    fn submit(&mut self, submission: &DecodeSubmission<'_>) -> Result<(), DxvaError> {
        if self.fail_submit {
            return Err(DxvaError::Submission("device lost".into()));
        }

        let slices = submission
            .slice_control
            .chunks_exact(std::mem::size_of::<DxvaSliceH264Short>())
            .map(|chunk| {
                let slice = DxvaSliceH264Short::read_from_bytes(chunk).ok().unwrap();
                (slice.bs_nal_unit_data_location, slice.slice_bytes_in_buffer)
            })
            .collect();

        self.submitted.push(Submitted {
            picture_id: submission.picture_id,
            picture_params: DxvaPicParamsH264::read_from_bytes(submission.picture_params).ok().unwrap(),
            slices,
            bitstream: submission.bitstream.to_vec(),
            qmatrix: submission
                .inverse_quantization_matrix
                .map(|bytes| DxvaQmatrixH264::read_from_bytes(bytes).ok().unwrap()),
        });
        Ok(())
    }

    fn output(&mut self, surface: &Self::Surface, info: &OutputInfo) -> Result<Self::Frame, DxvaError> {
        self.outputs.push((surface.0, *info));
        Ok(surface.0)
    }
}

/// The SPS fields the tests vary.
#[derive(Debug, Clone)]
pub(crate) struct TestSequence {
    pub profile_idc: u8,
    pub level_idc: u8,
    pub width_mbs: u32,
    pub height_map_units: u32,
    pub frame_mbs_only_flag: bool,
    pub mb_adaptive_frame_field_flag: bool,
    pub crop_bottom: Option<u32>,
    pub num_ref_frames: u32,
}

impl Default for TestSequence {
    fn default() -> Self {
        // 1920x1080 high profile, level 4.0
        Self {
            profile_idc: 100,
            level_idc: 40,
            width_mbs: 120,
            height_map_units: 68,
            frame_mbs_only_flag: true,
            mb_adaptive_frame_field_flag: false,
            crop_bottom: Some(4),
            num_ref_frames: 4,
        }
    }
}

impl TestSequence {
    pub fn build_sps(&self) -> Bytes {
        let mut w = NalWriter::new(3, 7, NalPrefix::StartCode3).unwrap();
        w.write_bits(self.profile_idc as u64, 8).unwrap();
        w.write_bits(0, 8).unwrap();
        w.write_bits(self.level_idc as u64, 8).unwrap();
        // seq_parameter_set_id
        w.write_ue(0).unwrap();

        if self.profile_idc == 100 {
            // chroma_format_idc, bit depths
            w.write_ue(1).unwrap();
            w.write_ue(0).unwrap();
            w.write_ue(0).unwrap();
            // qpprime_y_zero_transform_bypass_flag, seq_scaling_matrix_present_flag
            w.write_bit(false).unwrap();
            w.write_bit(false).unwrap();
        }

        // log2_max_frame_num_minus4, pic_order_cnt_type
        w.write_ue(0).unwrap();
        w.write_ue(2).unwrap();
        w.write_ue(self.num_ref_frames as u64).unwrap();
        w.write_bit(false).unwrap();
        w.write_ue(self.width_mbs as u64 - 1).unwrap();
        w.write_ue(self.height_map_units as u64 - 1).unwrap();
        w.write_bit(self.frame_mbs_only_flag).unwrap();
        if !self.frame_mbs_only_flag {
            w.write_bit(self.mb_adaptive_frame_field_flag).unwrap();
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

        // vui_parameters_present_flag
        w.write_bit(false).unwrap();
        w.finish().unwrap()
    }

    /// A PPS with CABAC, weighted bi-prediction and a chroma qp offset of -2.
    pub fn build_pps(&self) -> Bytes {
        let mut w = NalWriter::new(3, 8, NalPrefix::StartCode3).unwrap();
        w.write_ue(0).unwrap();
        w.write_ue(0).unwrap();
        // entropy_coding_mode_flag, bottom_field_pic_order_in_frame_present_flag
        w.write_bit(true).unwrap();
        w.write_bit(false).unwrap();
        // num_slice_groups_minus1
        w.write_ue(0).unwrap();
        // num_ref_idx_l0/l1_default_active_minus1
        w.write_ue(2).unwrap();
        w.write_ue(0).unwrap();
        // weighted_pred_flag, weighted_bipred_idc
        w.write_bit(false).unwrap();
        w.write_bits(2, 2).unwrap();
        // pic_init_qp_minus26, pic_init_qs_minus26, chroma_qp_index_offset
        w.write_se(-3).unwrap();
        w.write_se(0).unwrap();
        w.write_se(-2).unwrap();
        // deblocking_filter_control_present_flag, constrained_intra_pred_flag, redundant_pic_cnt_present_flag
        w.write_bit(true).unwrap();
        w.write_bit(false).unwrap();
        w.write_bit(false).unwrap();
        w.finish().unwrap()
    }

    /// Parses both parameter sets.
    pub fn parameter_sets(&self) -> (Sps, Pps) {
        let sps = self.build_sps();
        let pps = self.build_pps();

        let mut parser = NalParser::new(NalParserConfig::default());
        let sps = parser.parse_sps(&identify_nalu_unchecked(&sps, 0).unwrap()).unwrap().clone();
        let pps = parser.parse_pps(&identify_nalu_unchecked(&pps, 0).unwrap()).unwrap().clone();
        (sps, pps)
    }
}

/// A slice NAL unit with `len` bytes of payload after the header.
pub(crate) fn slice_nal(nal_type: u8, len: usize) -> Bytes {
    let mut w = NalWriter::new(if nal_type == 5 { 3 } else { 2 }, nal_type, NalPrefix::StartCode3).unwrap();
    for i in 0..len {
        w.write_bits(0x80 | (i as u64 & 0x7F), 8).unwrap();
    }
    w.finish().unwrap()
}

pub(crate) fn header(slice_type: SliceType, frame_num: u16) -> SliceHeader {
    SliceHeader {
        slice_type,
        frame_num,
        ..Default::default()
    }
}
