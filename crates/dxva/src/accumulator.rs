use bytes::{BufMut, BytesMut};
use tracing::{debug, trace};
use zerocopy::IntoBytes;

use crate::codec::DxvaCodec;
use crate::device::DecodeSubmission;
use crate::error::DxvaError;

const START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

/// Collects the buffers of one picture.
///
/// Slices are appended to a single bitstream buffer and described by one
/// slice control entry each. [`PictureAccumulator::finish`] pads the
/// bitstream and lends everything out as a [`DecodeSubmission`].
#[derive(Debug)]
pub struct PictureAccumulator<C: DxvaCodec> {
    bitstream: BytesMut,
    slices: Vec<C::SliceControl>,
    picture_params: Option<C::PicParams>,
    qmatrix: Option<C::Qmatrix>,
    alignment: usize,
    start_code_prefix: bool,
}

impl<C: DxvaCodec> PictureAccumulator<C> {
    /// An empty accumulator.
    ///
    /// `alignment` of 0 or 1 disables padding.
    pub fn new(alignment: usize, start_code_prefix: bool) -> Self {
        Self {
            bitstream: BytesMut::new(),
            slices: Vec::new(),
            picture_params: None,
            qmatrix: None,
            alignment: alignment.max(1),
            start_code_prefix,
        }
    }

    /// Drops the previous picture and starts a new one.
    pub fn begin(&mut self, picture_params: C::PicParams, qmatrix: Option<C::Qmatrix>) {
        self.clear();
        self.picture_params = Some(picture_params);
        self.qmatrix = qmatrix;
    }

    /// Forgets everything collected so far.
    pub fn clear(&mut self) {
        self.bitstream.clear();
        self.slices.clear();
        self.picture_params = None;
        self.qmatrix = None;
    }

    /// The picture parameters of the current picture.
    pub fn picture_params(&self) -> Option<&C::PicParams> {
        self.picture_params.as_ref()
    }

    /// Appends the payload of a slice NAL unit, header included.
    pub fn push_slice(&mut self, nal: &[u8]) -> Result<(), DxvaError> {
        let prefix: &[u8] = if self.start_code_prefix { &START_CODE } else { &[] };

        let offset = u32::try_from(self.bitstream.len())
            .map_err(|_| DxvaError::Submission("bitstream buffer too large".into()))?;
        let len = u32::try_from(prefix.len() + nal.len())
            .map_err(|_| DxvaError::Submission("slice too large".into()))?;

        self.bitstream.reserve(prefix.len() + nal.len());
        self.bitstream.put_slice(prefix);
        self.bitstream.put_slice(nal);
        self.slices.push(C::slice_control(offset, len));

        trace!(offset, len, "slice appended");
        Ok(())
    }

    /// Number of slices collected.
    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    /// True before the first slice.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty() || self.bitstream.is_empty()
    }

    /// Pads the bitstream and lends the buffers out for `picture_id`.
    ///
    /// The padding is zero filled and counted as part of the last slice.
    pub fn finish(&mut self, picture_id: u8) -> Result<DecodeSubmission<'_>, DxvaError> {
        let Some(picture_params) = self.picture_params.as_ref() else {
            return Err(DxvaError::MissingPicture);
        };

        if self.slices.is_empty() || self.bitstream.is_empty() {
            return Err(DxvaError::MissingBitstream);
        }

        let len = self.bitstream.len();
        let padded = len.next_multiple_of(self.alignment);
        if padded > len {
            let padding = padded - len;
            self.bitstream.resize(padded, 0);
            if let Some(last) = self.slices.last_mut() {
                C::grow_slice_control(last, padding as u32);
            }
            debug!(len, padding, "padded bitstream buffer");
        }

        Ok(DecodeSubmission {
            picture_id,
            picture_params: picture_params.as_bytes(),
            slice_control: self.slices.as_bytes(),
            bitstream: &self.bitstream,
            inverse_quantization_matrix: self.qmatrix.as_ref().map(IntoBytes::as_bytes),
        })
    }
}
