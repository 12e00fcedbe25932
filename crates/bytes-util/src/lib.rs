//! Bit level readers and writers for codec bitstreams.
//!
//! [`BitReader`] reads fixed width fields out of a byte slice through a 64-bit
//! cache and can drop H.264/H.265 emulation prevention bytes on the fly.
//! [`BitWriter`] is its counterpart and packs fields into any [`std::io::Write`].
//!
//! ```rust
//! # fn test() -> std::io::Result<()> {
//! use bytes_util::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::<Vec<u8>>::default();
//! writer.write_bits(0b101, 3)?;
//! writer.write_rbsp_trailing_bits()?;
//! let data = writer.finish()?;
//!
//! let mut reader = BitReader::new_rbsp(&data);
//! assert_eq!(reader.read_bits(3)?, 0b101);
//! assert!(!reader.has_more_rbsp_data());
//! # Ok(())
//! # }
//! # test().expect("failed to run test");
//! ```
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod bit_read;
mod bit_write;
mod range_check;

pub use bit_read::BitReader;
pub use bit_write::BitWriter;
