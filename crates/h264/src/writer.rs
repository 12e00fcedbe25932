use std::io::{self, Write};

use byteorder::{BigEndian, WriteBytesExt};
use bytes::{BufMut, Bytes, BytesMut};
use bytes_util::BitWriter;
use expgolomb::BitWriterExpGolombExt;

use crate::EmulationPreventionIo;
use crate::nal::START_CODE;

/// How a written NAL unit is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NalPrefix {
    /// `00 00 01`
    #[default]
    StartCode3,
    /// `00 00 00 01`
    StartCode4,
    /// Big-endian length of 1 to 4 bytes, as used in `avcC` streams.
    Length(u8),
}

/// Builds a single NAL unit.
///
/// The header byte is written on construction. Syntax elements go into the
/// RBSP, and [`NalWriter::finish`] adds the trailing bits, inserts emulation
/// prevention bytes and prepends the prefix.
///
/// ```rust
/// # fn test() -> std::io::Result<()> {
/// use h264::{NalPrefix, NalWriter};
///
/// let mut writer = NalWriter::new(0, 9, NalPrefix::StartCode3)?;
/// writer.write_bits(0b010, 3)?;
/// assert_eq!(&writer.finish()?[..], &[0x00, 0x00, 0x01, 0x09, 0x50]);
/// # Ok(())
/// # }
/// # test().expect("failed to run test");
/// ```
#[derive(Debug)]
pub struct NalWriter {
    header: u8,
    prefix: NalPrefix,
    rbsp: BitWriter<Vec<u8>>,
}

impl NalWriter {
    /// Starts a unit with `nal_ref_idc` (2 bits) and `nal_unit_type` (5 bits).
    pub fn new(ref_idc: u8, nal_type: u8, prefix: NalPrefix) -> io::Result<Self> {
        bytes_util::range_check!(ref_idc, 0, 3)?;
        bytes_util::range_check!(nal_type, 0, 31)?;
        if let NalPrefix::Length(size) = prefix {
            bytes_util::range_check!(size, 1, 4)?;
        }

        Ok(Self {
            header: (ref_idc << 5) | nal_type,
            prefix,
            rbsp: BitWriter::default(),
        })
    }

    /// Writes an `u(n)` field.
    pub fn write_bits(&mut self, value: u64, count: u8) -> io::Result<()> {
        self.rbsp.write_bits(value, count)
    }

    /// Writes an `u(1)` field.
    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.rbsp.write_bit(bit)
    }

    /// Writes an `ue(v)` field.
    pub fn write_ue(&mut self, value: u64) -> io::Result<()> {
        self.rbsp.write_exp_golomb(value)
    }

    /// Writes an `se(v)` field.
    pub fn write_se(&mut self, value: i64) -> io::Result<()> {
        self.rbsp.write_signed_exp_golomb(value)
    }

    /// Returns the framed NAL unit.
    pub fn finish(mut self) -> io::Result<Bytes> {
        self.rbsp.write_rbsp_trailing_bits()?;
        let rbsp = self.rbsp.finish()?;

        let mut payload = EmulationPreventionIo::new(Vec::with_capacity(rbsp.len() + 8));
        payload.write_all(&[self.header])?;
        payload.write_all(&rbsp)?;
        let payload = payload.finish()?;

        let mut out = BytesMut::with_capacity(payload.len() + 4).writer();
        match self.prefix {
            NalPrefix::StartCode3 => out.write_all(&START_CODE)?,
            NalPrefix::StartCode4 => {
                out.write_u8(0x00)?;
                out.write_all(&START_CODE)?;
            }
            NalPrefix::Length(size) => {
                let len = payload.len() as u64;
                if len >> (size as u32 * 8) != 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("nal of {len} bytes does not fit a {size} byte length"),
                    ));
                }

                out.write_uint::<BigEndian>(len, size as usize)?;
            }
        }
        out.write_all(&payload)?;

        Ok(out.into_inner().freeze())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes_util::BitReader;
    use expgolomb::BitReaderExpGolombExt;

    use super::*;
    use crate::nal::{identify_nalu_avc, identify_nalu_unchecked};

    #[test]
    fn test_prefixes() {
        let build = |prefix| {
            let mut writer = NalWriter::new(3, 7, prefix).unwrap();
            writer.write_bits(0xaa, 8).unwrap();
            writer.finish().unwrap()
        };

        assert_eq!(&build(NalPrefix::StartCode3)[..], &[0x00, 0x00, 0x01, 0x67, 0xaa, 0x80]);
        assert_eq!(&build(NalPrefix::StartCode4)[..], &[0x00, 0x00, 0x00, 0x01, 0x67, 0xaa, 0x80]);
        assert_eq!(&build(NalPrefix::Length(2))[..], &[0x00, 0x03, 0x67, 0xaa, 0x80]);
        assert!(NalWriter::new(0, 1, NalPrefix::Length(5)).is_err());
        assert!(NalWriter::new(4, 1, NalPrefix::StartCode3).is_err());
    }

    #[test]
    fn test_length_overflow() {
        let mut writer = NalWriter::new(0, 12, NalPrefix::Length(1)).unwrap();
        for _ in 0..300 {
            writer.write_bits(0xff, 8).unwrap();
        }
        assert_eq!(writer.finish().unwrap_err().kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_emulation_prevention_round_trip() {
        let mut writer = NalWriter::new(1, 1, NalPrefix::Length(4)).unwrap();
        writer.write_bits(0, 32).unwrap();
        writer.write_bits(0x03, 8).unwrap();
        writer.write_ue(300).unwrap();
        writer.write_se(-17).unwrap();
        writer.write_bit(true).unwrap();
        let data = writer.finish().unwrap();

        // 00 00 00 00 03 becomes 00 00 03 00 00 03 03
        assert_eq!(&data[5..12], &[0x00, 0x00, 0x03, 0x00, 0x00, 0x03, 0x03]);

        let nalu = identify_nalu_avc(&data, 0, 4).unwrap();
        let mut reader = nalu.rbsp_reader();
        assert_eq!(reader.read_bits(32).unwrap(), 0);
        assert_eq!(reader.read_bits(8).unwrap(), 0x03);
        assert_eq!(reader.read_exp_golomb().unwrap(), 300);
        assert_eq!(reader.read_signed_exp_golomb().unwrap(), -17);
        assert!(reader.read_bit().unwrap());
        assert!(!reader.has_more_rbsp_data());
        assert_eq!(reader.emulation_prevention_bytes(), 2);
    }

    #[test]
    fn test_annex_b_output_is_locatable() {
        let mut writer = NalWriter::new(0, 6, NalPrefix::StartCode4).unwrap();
        writer.write_bits(0x0001, 16).unwrap();
        let data = writer.finish().unwrap();

        let nalu = identify_nalu_unchecked(&data, 0).unwrap();
        assert_eq!(nalu.sc_offset, 1);
        assert_eq!(nalu.nal_type, 6);

        let mut reader = BitReader::new_rbsp(&nalu.bytes()[1..]);
        assert_eq!(reader.read_bits(16).unwrap(), 1);
    }
}
