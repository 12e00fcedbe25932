use h264::ParserError;
use thiserror::Error;

use crate::decoder::DecoderState;

/// Errors raised while driving an accelerated decode.
#[derive(Debug, Error)]
pub enum DxvaError {
    /// The device rejected the stream configuration.
    #[error("decoder configuration was not negotiated")]
    NotNegotiated,
    /// The stream uses a profile the decoder does not accelerate.
    #[error("unsupported profile_idc: {0}")]
    UnsupportedProfile(u8),
    /// The device ran out of output surfaces.
    #[error("couldn't allocate an output surface")]
    SurfaceAllocation,
    /// `end_picture` was reached without any slice data.
    #[error("no bitstream buffer to submit")]
    MissingBitstream,
    /// The picture has no surface, or the device doesn't know it.
    #[error("picture has no output surface")]
    MissingPicture,
    /// An operation was called out of order.
    #[error("invalid decoder state, expected {expected:?} but was {actual:?}")]
    InvalidState {
        /// A state the operation accepts.
        expected: DecoderState,
        /// The state the decoder was in.
        actual: DecoderState,
    },
    /// The device failed to execute the submission.
    #[error("submission failed: {0}")]
    Submission(String),
    /// A syntax element could not be parsed.
    #[error(transparent)]
    Parser(#[from] ParserError),
}

impl DxvaError {
    /// True when the decoder can't continue with the current sequence.
    ///
    /// Per-picture failures only lose that picture.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::NotNegotiated | Self::UnsupportedProfile(_) | Self::SurfaceAllocation)
    }
}
