//! Exp-Golomb coding on top of the [`bytes-util`](bytes_util) bit reader and writer.
//!
//! H.264 syntax elements coded as `ue(v)` and `se(v)` are limited to 32 bits,
//! so the reader side yields `u32`/`i32` and rejects codes with more than 31
//! leading zeros. The writer side accepts wider values so that `2^32 - 1`
//! style edge cases can still be produced for tests.
//!
//! ```rust
//! # fn test() -> std::io::Result<()> {
//! use expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};
//! use bytes_util::{BitReader, BitWriter};
//!
//! let mut bit_writer = BitWriter::<Vec<u8>>::default();
//! bit_writer.write_exp_golomb(7)?;
//! bit_writer.write_signed_exp_golomb(-3)?;
//! let data = bit_writer.finish()?;
//!
//! let mut bit_reader = BitReader::new(&data);
//! assert_eq!(bit_reader.read_exp_golomb()?, 7);
//! assert_eq!(bit_reader.read_signed_exp_golomb()?, -3);
//! # Ok(())
//! # }
//! # test().expect("failed to run test");
//! ```
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or
//! [Apache-2.0](./LICENSE.Apache-2.0) license. You can choose between one of
//! them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

use std::io;

use bytes_util::{BitReader, BitWriter};

/// Longest prefix of zero bits accepted in front of a `ue(v)` code.
pub const MAX_LEADING_ZEROS: u32 = 31;

/// Extension trait for reading Exp-Golomb encoded numbers from a bit reader
///
/// See: <https://en.wikipedia.org/wiki/Exponential-Golomb_coding>
pub trait BitReaderExpGolombExt {
    /// Reads a `ue(v)` value.
    fn read_exp_golomb(&mut self) -> io::Result<u32>;

    /// Reads a `se(v)` value.
    ///
    /// Odd code numbers map to positive values, even ones to zero or negative.
    fn read_signed_exp_golomb(&mut self) -> io::Result<i32> {
        let code = self.read_exp_golomb()?;

        if code % 2 == 1 {
            Ok((code / 2) as i32 + 1)
        } else {
            Ok(-((code / 2) as i32))
        }
    }
}

impl BitReaderExpGolombExt for BitReader<'_> {
    fn read_exp_golomb(&mut self) -> io::Result<u32> {
        let mut leading_zeros = 0u32;
        while !self.read_bit()? {
            leading_zeros += 1;
            if leading_zeros > MAX_LEADING_ZEROS {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "exp-golomb code has too many leading zeros",
                ));
            }
        }

        if leading_zeros == 0 {
            return Ok(0);
        }

        let suffix = self.read_bits(leading_zeros as u8)?;
        // (1 << 31) - 1 + (2^31 - 1) still fits in a u32
        Ok(((1u32 << leading_zeros) - 1) + suffix)
    }
}

/// Extension trait for writing Exp-Golomb encoded numbers to a bit writer
///
/// See: <https://en.wikipedia.org/wiki/Exponential-Golomb_coding>
pub trait BitWriterExpGolombExt {
    /// Writes a `ue(v)` value.
    fn write_exp_golomb(&mut self, input: u64) -> io::Result<()>;

    /// Writes a `se(v)` value.
    fn write_signed_exp_golomb(&mut self, number: i64) -> io::Result<()> {
        let code = signed_to_code(number).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "signed exp-golomb value too large")
        })?;
        self.write_exp_golomb(code)
    }
}

impl<W: io::Write> BitWriterExpGolombExt for BitWriter<W> {
    fn write_exp_golomb(&mut self, input: u64) -> io::Result<()> {
        let code = input.checked_add(1).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "exp-golomb value too large")
        })?;
        let leading_zeros = (63 - code.leading_zeros()) as u8;

        // The prefix can exceed the 64 bits a single write accepts.
        let mut zeros = leading_zeros;
        while zeros > 0 {
            let chunk = zeros.min(32);
            self.write_bits(0, chunk)?;
            zeros -= chunk;
        }

        self.write_bits(code, leading_zeros + 1)
    }
}

/// The `ue(v)` code of a `se(v)` value. `i64::MIN` has none that fits.
fn signed_to_code(number: i64) -> Option<u64> {
    if number <= 0 {
        number.unsigned_abs().checked_mul(2)
    } else {
        Some(number as u64 * 2 - 1)
    }
}

/// Returns the number of bits that a signed Exp-Golomb encoded number would take up.
pub fn size_of_signed_exp_golomb(number: i64) -> u64 {
    let code = if number <= 0 {
        number.unsigned_abs() as u128 * 2
    } else {
        number as u128 * 2 - 1
    };

    code_size(code)
}

/// Returns the number of bits that an Exp-Golomb encoded number would take up.
pub fn size_of_exp_golomb(number: u64) -> u64 {
    code_size(number as u128)
}

fn code_size(number: u128) -> u64 {
    let code = number + 1;
    let leading_zeros = 127 - code.leading_zeros() as u64;

    leading_zeros * 2 + 1
}
