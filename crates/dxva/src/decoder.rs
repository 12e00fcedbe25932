use h264::{NalUnit, ParserError, Pps, SliceHeader, Sps};
use tracing::{debug, error, trace, warn};

use crate::accumulator::PictureAccumulator;
use crate::codec::H264Codec;
use crate::config::DxvaConfig;
use crate::device::{DxvaDevice, OutputInfo, SequenceInfo};
use crate::error::DxvaError;
use crate::picture::{DpbPicture, H264Picture, PictureField};
use crate::structs::{DxvaPicEntryH264, DxvaPicParamsH264, INVALID_PIC_ENTRY, MAX_REF_FRAMES, bit_fields};

/// `profile_idc` values the decoder accelerates: baseline, main, extended and high.
pub const SUPPORTED_PROFILES: [u8; 4] = [66, 77, 88, 100];

/// Where a [`DxvaH264Decoder`] is in the decode cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    /// No sequence has been negotiated.
    #[default]
    Idle,
    /// The device is configured and waits for a picture.
    SequenceConfigured,
    /// Picture parameters are filled, no slice yet.
    PictureStarted,
    /// At least one slice was appended.
    SliceAccumulating,
    /// The last picture was submitted.
    PictureEnded,
}

/// Drives a [`DxvaDevice`] through the H.264 submission cycle.
///
/// The caller owns the parsing and the DPB. For every picture it calls
/// [`new_picture`](Self::new_picture), [`start_picture`](Self::start_picture),
/// [`decode_slice`](Self::decode_slice) once per slice and
/// [`end_picture`](Self::end_picture). A failed picture is dropped and the
/// decoder goes back to [`DecoderState::SequenceConfigured`].
#[derive(Debug)]
pub struct DxvaH264Decoder<D: DxvaDevice> {
    device: D,
    config: DxvaConfig,
    state: DecoderState,
    sequence: Option<SequenceInfo>,
    accumulator: PictureAccumulator<H264Codec>,
    status_report_feedback_number: u32,
}

impl<D: DxvaDevice> DxvaH264Decoder<D> {
    /// Wraps `device`. Nothing is negotiated until the first sequence.
    pub fn new(device: D, config: DxvaConfig) -> Self {
        debug!("Creating DXVA H.264 decoder with {}", config);

        let accumulator = PictureAccumulator::new(config.bitstream_alignment, config.start_code_prefix);
        Self {
            device,
            config,
            state: DecoderState::Idle,
            sequence: None,
            accumulator,
            status_report_feedback_number: 0,
        }
    }

    /// The current state.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// The configuration the decoder was created with.
    pub fn config(&self) -> &DxvaConfig {
        &self.config
    }

    /// The negotiated sequence, if any.
    pub fn sequence(&self) -> Option<&SequenceInfo> {
        self.sequence.as_ref()
    }

    /// The wrapped device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The wrapped device, mutably.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// The picture parameters of the picture in progress.
    pub fn picture_params(&self) -> Option<&DxvaPicParamsH264> {
        self.accumulator.picture_params()
    }

    /// Unwraps the device.
    pub fn into_device(self) -> D {
        self.device
    }

    /// Drops the picture in progress, keeping the negotiated sequence.
    pub fn reset(&mut self) {
        self.accumulator.clear();
        self.state = if self.sequence.is_some() {
            DecoderState::SequenceConfigured
        } else {
            DecoderState::Idle
        };
    }

    /// Negotiates a sequence with the device.
    ///
    /// Nothing happens if the stream properties did not change since the
    /// last call.
    pub fn new_sequence(&mut self, sps: &Sps, max_dpb_size: u32) -> Result<(), DxvaError> {
        if !SUPPORTED_PROFILES.contains(&sps.profile_idc) {
            error!("Unsupported profile_idc {}", sps.profile_idc);
            self.drop_sequence();
            return Err(DxvaError::UnsupportedProfile(sps.profile_idc));
        }

        let info = SequenceInfo::from_sps(sps, max_dpb_size);
        if self.sequence == Some(info) {
            trace!("sequence unchanged");
            return Ok(());
        }

        if matches!(self.state, DecoderState::PictureStarted | DecoderState::SliceAccumulating) {
            return Err(self.invalid_state(DecoderState::SequenceConfigured));
        }

        if max_dpb_size == 0 {
            error!("Invalid DPB size 0");
            self.drop_sequence();
            return Err(DxvaError::NotNegotiated);
        }

        if info.bit_depth != 8 || info.chroma_format_idc != 1 {
            error!(
                "Could not support bitdepth {} with chroma format idc {}",
                info.bit_depth, info.chroma_format_idc
            );
            self.drop_sequence();
            return Err(DxvaError::NotNegotiated);
        }

        debug!(
            "Configuring {}x{} (crop {}x{} at {},{}), interlaced: {}, dpb size: {}",
            info.coded_width,
            info.coded_height,
            info.crop.width,
            info.crop.height,
            info.crop.x,
            info.crop.y,
            info.interlaced,
            info.max_dpb_size
        );

        if let Err(err) = self.device.configure(&info) {
            error!("Failed to configure decoder: {}", err);
            self.drop_sequence();
            return Err(DxvaError::NotNegotiated);
        }

        self.sequence = Some(info);
        self.state = DecoderState::SequenceConfigured;
        Ok(())
    }

    /// Assigns a fresh surface to `picture`.
    pub fn new_picture(&mut self, picture: &mut H264Picture<D::Surface>) -> Result<(), DxvaError> {
        if self.sequence.is_none() {
            return Err(self.invalid_state(DecoderState::SequenceConfigured));
        }

        let surface = self.device.new_surface()?;
        trace!("New picture with id {}", self.get_picture_id(Some(&surface)));
        picture.surface = Some(surface);
        Ok(())
    }

    /// Lets the second field of a pair decode into the surface of the first.
    pub fn duplicate_picture(
        &self,
        first_field: &H264Picture<D::Surface>,
        second_field: &mut H264Picture<D::Surface>,
    ) -> Result<(), DxvaError> {
        let Some(surface) = first_field.surface() else {
            error!("Couldn't get output surface of the first field");
            return Err(DxvaError::MissingPicture);
        };

        second_field.surface = Some(surface.clone());
        Ok(())
    }

    /// The driver index of `surface`, [`INVALID_PIC_ENTRY`] when there is none.
    pub fn get_picture_id(&self, surface: Option<&D::Surface>) -> u8 {
        surface
            .and_then(|surface| self.device.picture_id(surface))
            .unwrap_or(INVALID_PIC_ENTRY)
    }

    /// Fills the picture parameters for `picture` and opens its bitstream.
    ///
    /// `header` is the header of the first slice. `dpb` lists the pictures
    /// that may be referenced. Only the first 16 usable entries are kept.
    pub fn start_picture(
        &mut self,
        picture: &H264Picture<D::Surface>,
        header: &SliceHeader,
        sps: &Sps,
        pps: &Pps,
        dpb: &[DpbPicture<'_, D::Surface>],
    ) -> Result<(), DxvaError> {
        if !matches!(self.state, DecoderState::SequenceConfigured | DecoderState::PictureEnded) {
            return Err(self.invalid_state(DecoderState::SequenceConfigured));
        }

        let picture_id = self.get_picture_id(picture.surface());
        if picture_id == INVALID_PIC_ENTRY {
            error!("current picture does not have output view handle");
            return Err(DxvaError::MissingPicture);
        }

        let mut params = H264Codec::picture_params(sps, pps, header);
        params.curr_pic = DxvaPicEntryH264::new(picture_id, header.bottom_field_flag);
        params.set_flag(bit_fields::REF_PIC, picture.is_ref());
        params.frame_num = picture.frame_num;
        params.curr_field_order_cnt = match picture.field {
            PictureField::TopField => [picture.top_field_order_cnt, 0],
            PictureField::BottomField => [0, picture.bottom_field_order_cnt],
            PictureField::Frame => [picture.top_field_order_cnt, picture.bottom_field_order_cnt],
        };

        if self.config.status_report_feedback {
            self.status_report_feedback_number = self.status_report_feedback_number.wrapping_add(1).max(1);
            params.status_report_feedback_number = self.status_report_feedback_number;
        }

        self.fill_reference_frames(&mut params, dpb);

        self.accumulator.begin(params, Some(H264Codec::qmatrix(pps)));
        self.state = DecoderState::PictureStarted;
        trace!("Picture {} started, frame_num {}", picture_id, picture.frame_num);
        Ok(())
    }

    fn fill_reference_frames(&self, params: &mut DxvaPicParamsH264, dpb: &[DpbPicture<'_, D::Surface>]) {
        let mut ref_frame_list = [DxvaPicEntryH264::INVALID; MAX_REF_FRAMES];
        let mut frame_num_list = [0u16; MAX_REF_FRAMES];
        let mut field_order_cnt_list = [[0i32; 2]; MAX_REF_FRAMES];
        let mut used_for_reference_flags = 0u32;

        let mut j = 0;
        for entry in dpb {
            if j == MAX_REF_FRAMES {
                debug!("Reference frame list full, ignoring remaining DPB entries");
                break;
            }

            let other = entry.picture;
            if !other.is_ref() || other.nonexisting || other.second_field {
                continue;
            }

            let other_id = self.get_picture_id(other.surface());
            if other_id == INVALID_PIC_ENTRY {
                continue;
            }

            let long_term = other.is_long_term_ref();
            ref_frame_list[j] = DxvaPicEntryH264::new(other_id, long_term);
            frame_num_list[j] = if long_term {
                other.long_term_frame_idx
            } else {
                other.frame_num
            };

            let mut used = 0u32;
            match other.field {
                PictureField::TopField => {
                    field_order_cnt_list[j][0] = other.top_field_order_cnt;
                    used |= 0b01;
                }
                PictureField::BottomField => {
                    field_order_cnt_list[j][1] = other.bottom_field_order_cnt;
                    used |= 0b10;
                }
                PictureField::Frame => {
                    field_order_cnt_list[j] = [other.top_field_order_cnt, other.bottom_field_order_cnt];
                    used |= 0b11;
                }
            }

            if let Some(other_field) = entry.other_field {
                match other_field.field {
                    PictureField::TopField => {
                        field_order_cnt_list[j][0] = other_field.top_field_order_cnt;
                        used |= 0b01;
                    }
                    PictureField::BottomField => {
                        field_order_cnt_list[j][1] = other_field.bottom_field_order_cnt;
                        used |= 0b10;
                    }
                    PictureField::Frame => {}
                }
            }

            used_for_reference_flags |= used << (2 * j);
            j += 1;
        }

        params.ref_frame_list = ref_frame_list;
        params.frame_num_list = frame_num_list;
        params.field_order_cnt_list = field_order_cnt_list;
        params.used_for_reference_flags = used_for_reference_flags;
        params.non_existing_frame_flags = 0;
    }

    /// Appends a slice of the current picture.
    pub fn decode_slice(&mut self, nalu: &NalUnit<'_>) -> Result<(), DxvaError> {
        if !matches!(self.state, DecoderState::PictureStarted | DecoderState::SliceAccumulating) {
            return Err(self.invalid_state(DecoderState::PictureStarted));
        }

        if !nalu.nal_unit_type().is_slice() {
            warn!("Ignoring non slice nal unit with type {}", nalu.nal_type);
            return Err(ParserError::invalid("not a slice nal unit").into());
        }

        self.accumulator.push_slice(nalu.bytes())?;
        self.state = DecoderState::SliceAccumulating;
        Ok(())
    }

    /// Submits the current picture.
    ///
    /// On failure the picture is lost and the decoder waits for the next one.
    pub fn end_picture(&mut self, picture: &H264Picture<D::Surface>) -> Result<(), DxvaError> {
        if !matches!(self.state, DecoderState::PictureStarted | DecoderState::SliceAccumulating) {
            return Err(self.invalid_state(DecoderState::SliceAccumulating));
        }

        let picture_id = self.get_picture_id(picture.surface());
        let result = if picture_id == INVALID_PIC_ENTRY {
            Err(DxvaError::MissingPicture)
        } else {
            match self.accumulator.finish(picture_id) {
                Ok(submission) => {
                    trace!(
                        "Submitting picture {} with {} bytes of bitstream",
                        picture_id,
                        submission.bitstream.len()
                    );
                    self.device.submit(&submission)
                }
                Err(err) => Err(err),
            }
        };

        match result {
            Ok(()) => {
                self.state = DecoderState::PictureEnded;
                Ok(())
            }
            Err(err) => {
                error!("Failed to end picture {}: {}", picture_id, err);
                self.accumulator.clear();
                self.state = DecoderState::SequenceConfigured;
                Err(err)
            }
        }
    }

    /// Hands a decoded picture to the device for output.
    pub fn output_picture(&mut self, picture: &H264Picture<D::Surface>) -> Result<D::Frame, DxvaError> {
        let Some(sequence) = self.sequence else {
            return Err(self.invalid_state(DecoderState::SequenceConfigured));
        };

        let Some(surface) = picture.surface() else {
            error!("No output surface for picture");
            return Err(DxvaError::MissingPicture);
        };

        let info = OutputInfo {
            crop: sequence.crop,
            interlaced: sequence.interlaced,
            field: picture.field,
            pic_order_cnt: picture.pic_order_cnt(),
        };
        self.device.output(surface, &info)
    }

    fn drop_sequence(&mut self) {
        self.sequence = None;
        self.accumulator.clear();
        self.state = DecoderState::Idle;
    }

    fn invalid_state(&self, expected: DecoderState) -> DxvaError {
        warn!("Invalid decoder state {:?}, expected {:?}", self.state, expected);
        DxvaError::InvalidState {
            expected,
            actual: self.state,
        }
    }
}
