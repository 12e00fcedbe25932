//! DirectX Video Acceleration submission for H.264.
//!
//! Turns parsed parameter sets and slice headers from the [`h264`] crate into
//! the buffers a DXVA driver consumes, and sequences the calls to the device
//! that executes them.
//!
//! ## Why do we need this?
//!
//! Accelerators decode slice data themselves but need every syntax element
//! above it handed over in a fixed binary layout. Getting the layout, the
//! reference lists and the buffer padding right is independent of the
//! graphics API used to reach the driver, so that part lives behind the
//! [`DxvaDevice`] trait.
//!
//! ## Notable features
//!
//! - `#[repr(C, packed)]` buffer structs that serialize without copies.
//! - A [`DxvaCodec`] seam so the accumulator is shared between codecs.
//! - An explicit [`DecoderState`] machine. Calls made out of order fail with
//!   [`DxvaError::InvalidState`] instead of corrupting the submission.
//!
//! ## Examples
//!
//! ```rust
//! use dxva::{DxvaConfig, DxvaPicEntryH264};
//!
//! let config = DxvaConfig::builder().status_report_feedback(true).build();
//! assert_eq!(config.bitstream_alignment, 128);
//!
//! let entry = DxvaPicEntryH264::new(3, true);
//! assert_eq!(entry.b_pic_entry, 0x83);
//! ```
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

mod accumulator;
mod codec;
mod config;
mod decoder;
mod device;
mod error;
mod picture;
mod structs;

#[cfg(test)]
mod test_utils;

pub use self::accumulator::PictureAccumulator;
pub use self::codec::{DxvaCodec, H264Codec};
pub use self::config::{DEFAULT_BITSTREAM_ALIGNMENT, DxvaConfig, DxvaConfigBuilder};
pub use self::decoder::{DecoderState, DxvaH264Decoder, SUPPORTED_PROFILES};
pub use self::device::{DecodeSubmission, DxvaDevice, EXTRA_SURFACES, OutputInfo, SequenceInfo};
pub use self::error::DxvaError;
pub use self::picture::{DpbPicture, H264Picture, PictureField, Reference};
pub use self::structs::{
    DxvaPicEntryH264, DxvaPicParamsH264, DxvaQmatrixH264, DxvaSliceH264Short, INVALID_PIC_ENTRY, MAX_REF_FRAMES,
    bit_fields,
};
