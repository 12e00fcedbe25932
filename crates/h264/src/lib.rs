//! A pure Rust H.264 bitstream parser.
//!
//! Locates NAL units in Annex-B or length prefixed buffers, decodes sequence
//! and picture parameter sets, slice headers and SEI messages, and keeps the
//! parameter sets they depend on in a [`ParameterSetStore`].
//!
//! ## Why do we need this?
//!
//! Hardware decoders are fed parsed syntax elements rather than raw bytes.
//! This crate produces them without touching slice data.
//!
//! ## Notable features
//!
//! - Emulation prevention bytes are dropped while reading and counted, so
//!   slice data offsets can be reported in both RBSP and raw bytes.
//! - Subset SPS with the MVC extension.
//! - Scaling list inheritance from the default and sequence level lists.
//! - A [`NalWriter`] to build test streams, and `avcC` record handling.
//!
//! ## Examples
//!
//! ### Parsing
//!
//! ```rust
//! use h264::{NalParser, NalParserConfig, NalUnit};
//!
//! // A 1280x720 baseline SPS without start code
//! let sps = [0x67, 0x42, 0x00, 0x1f, 0xda, 0x01, 0x40, 0x16, 0xe4];
//!
//! let mut parser = NalParser::new(NalParserConfig::default());
//! let sps = parser.parse_sps(&NalUnit::from_bytes(&sps).unwrap()).unwrap();
//!
//! assert_eq!(sps.width, 1280);
//! assert_eq!(sps.height, 720);
//! ```
//!
//! ### Building
//!
//! ```rust
//! use h264::{NalPrefix, NalWriter, NalUnitType, identify_nalu_unchecked};
//!
//! let mut writer = NalWriter::new(0, 9, NalPrefix::StartCode3).unwrap();
//! writer.write_bits(0, 3).unwrap();
//! let data = writer.finish().unwrap();
//!
//! let nalu = identify_nalu_unchecked(&data, 0).unwrap();
//! assert_eq!(nalu.nal_unit_type(), NalUnitType::AuDelimiter);
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
#![deny(unsafe_code)]

mod config;
mod enums;
mod error;
mod io;
mod nal;
mod parser;
mod pps;
mod scaling_list;
mod sei;
mod slice;
mod sps;
mod store;
mod writer;

#[cfg(test)]
mod test_utils;

pub use enums::*;
pub use io::EmulationPreventionIo;
pub use sps::*;

pub use self::config::{AVCDecoderConfigurationRecord, AvccExtendedConfig};
pub use self::error::{ParameterSetKind, ParserError, ParserResult, ParserResultKind, result_kind};
pub use self::nal::{
    NalUnit, NalUnitExtension, NalUnitExtensionMvc, START_CODE, identify_nalu, identify_nalu_avc, identify_nalu_unchecked,
    scan_for_start_codes,
};
pub use self::parser::{NalFraming, NalParser, NalParserConfig, NalParserConfigBuilder, NalUnits};
pub use self::pps::{MAX_PPS_COUNT, Pps, SliceGroupMap};
pub use self::scaling_list::*;
pub use self::sei::{
    BufferingPeriod, ClockTimestamp, ContentLightLevel, FramePacking, FramePackingType, InitialCpbRemoval,
    MasteringDisplayColourVolume, PicTiming, RecoveryPoint, RegisteredUserData, SeiMessage, SeiPayload, StereoVideoInfo,
    UnhandledPayload, UserDataUnregistered, parse_sei, payload_type,
};
pub use self::slice::*;
pub use self::store::ParameterSetStore;
pub use self::writer::{NalPrefix, NalWriter};
