use std::io::{self, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use bytes_util::BitWriter;

/// Profiles that never carry the high profile trailer.
const PROFILES_WITHOUT_EXTENSION: [u8; 3] = [66, 77, 88];

/// The AVC (H.264) Decoder Configuration Record, the `avcC` box payload.
///
/// Parameter sets are kept as the raw NAL units (header byte included, no
/// length prefix), ready to be handed to [`NalUnit::from_bytes`](crate::NalUnit::from_bytes).
///
/// ISO/IEC 14496-15:2022(E) - 5.3.2.1.2
#[derive(Debug, Clone, PartialEq)]
pub struct AVCDecoderConfigurationRecord {
    /// `configurationVersion`, always 1.
    pub configuration_version: u8,
    /// `AVCProfileIndication`, the `profile_idc` of the SPS.
    pub profile_indication: u8,
    /// `profile_compatibility`, the constraint flags byte of the SPS.
    pub profile_compatibility: u8,
    /// `AVCLevelIndication`, the `level_idc` of the SPS.
    pub level_indication: u8,
    /// `lengthSizeMinusOne` (2 bits)
    pub length_size_minus_one: u8,
    /// SPS NAL units, ordered by ascending id.
    pub sps: Vec<Bytes>,
    /// PPS NAL units, ordered by ascending id.
    pub pps: Vec<Bytes>,
    /// The high profile trailer.
    ///
    /// Some muxers leave it out even for high profiles, so it is optional on
    /// parse regardless of the profile.
    pub extended_config: Option<AvccExtendedConfig>,
}

/// The part of the record that follows the PPS list for high profiles.
///
/// ISO/IEC 14496-15:2022(E) - 5.3.2.1.2
#[derive(Debug, Clone, PartialEq)]
pub struct AvccExtendedConfig {
    /// `chroma_format` (2 bits)
    pub chroma_format_idc: u8,
    /// `bit_depth_luma_minus8` (3 bits)
    pub bit_depth_luma_minus8: u8,
    /// `bit_depth_chroma_minus8` (3 bits)
    pub bit_depth_chroma_minus8: u8,
    /// SPS extension NAL units (type 13), kept unparsed.
    pub sequence_parameter_set_ext: Vec<Bytes>,
}

fn remaining(reader: &io::Cursor<Bytes>) -> usize {
    reader.get_ref().len().saturating_sub(reader.position() as usize)
}

/// Reads `count` units, each behind a 16 bit length. The units share the
/// record's buffer.
fn read_nal_units(reader: &mut io::Cursor<Bytes>, count: usize) -> io::Result<Vec<Bytes>> {
    (0..count)
        .map(|_| {
            let len = reader.read_u16::<BigEndian>()? as usize;
            let available = remaining(reader);
            if available < len {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("parameter set of {len} bytes, {available} available"),
                ));
            }

            let start = reader.position() as usize;
            reader.set_position((start + len) as u64);
            Ok(reader.get_ref().slice(start..start + len))
        })
        .collect()
}

fn write_nal_units<W: io::Write>(writer: &mut W, units: &[Bytes]) -> io::Result<()> {
    for unit in units {
        let len = u16::try_from(unit.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "parameter set larger than 65535 bytes"))?;
        writer.write_u16::<BigEndian>(len)?;
        writer.write_all(unit)?;
    }

    Ok(())
}

fn nal_units_size(units: &[Bytes]) -> u64 {
    units.iter().map(|unit| 2 + unit.len() as u64).sum()
}

impl AVCDecoderConfigurationRecord {
    /// Parses a record.
    pub fn parse(reader: &mut io::Cursor<Bytes>) -> io::Result<Self> {
        let configuration_version = reader.read_u8()?;
        let profile_indication = reader.read_u8()?;
        let profile_compatibility = reader.read_u8()?;
        let level_indication = reader.read_u8()?;
        let length_size_minus_one = reader.read_u8()? & 0b0000_0011;

        let num_of_sequence_parameter_sets = reader.read_u8()? & 0b0001_1111;
        let sps = read_nal_units(reader, num_of_sequence_parameter_sets as usize)?;

        let num_of_picture_parameter_sets = reader.read_u8()?;
        let pps = read_nal_units(reader, num_of_picture_parameter_sets as usize)?;

        let extended_config = if PROFILES_WITHOUT_EXTENSION.contains(&profile_indication) || remaining(reader) == 0 {
            None
        } else {
            let chroma_format_idc = reader.read_u8()? & 0b0000_0011;
            let bit_depth_luma_minus8 = reader.read_u8()? & 0b0000_0111;
            let bit_depth_chroma_minus8 = reader.read_u8()? & 0b0000_0111;
            let count = reader.read_u8()?;

            Some(AvccExtendedConfig {
                chroma_format_idc,
                bit_depth_luma_minus8,
                bit_depth_chroma_minus8,
                sequence_parameter_set_ext: read_nal_units(reader, count as usize)?,
            })
        };

        Ok(Self {
            configuration_version,
            profile_indication,
            profile_compatibility,
            level_indication,
            length_size_minus_one,
            sps,
            pps,
            extended_config,
        })
    }

    /// Size in bytes of the NAL length prefix used by samples described by this record.
    pub const fn length_size(&self) -> u8 {
        self.length_size_minus_one + 1
    }

    /// Returns the total byte size of the record.
    pub fn size(&self) -> u64 {
        // version, profile, compatibility, level, length size, sps count
        6 + nal_units_size(&self.sps)
        // pps count
        + 1 + nal_units_size(&self.pps)
        + self.extended_config.as_ref().map_or(0, |config| {
            // chroma format, two bit depths, sps ext count
            4 + nal_units_size(&config.sequence_parameter_set_ext)
        })
    }

    /// Writes the record, reserved bits set to one.
    pub fn build<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        if self.sps.len() > 31 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "more than 31 sequence parameter sets"));
        }
        if self.pps.len() > 255 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "more than 255 picture parameter sets"));
        }

        let mut bit_writer = BitWriter::new(writer);

        bit_writer.write_u8(self.configuration_version)?;
        bit_writer.write_u8(self.profile_indication)?;
        bit_writer.write_u8(self.profile_compatibility)?;
        bit_writer.write_u8(self.level_indication)?;
        bit_writer.write_bits(0b111111, 6)?;
        bit_writer.write_bits(self.length_size_minus_one as u64, 2)?;

        bit_writer.write_bits(0b111, 3)?;
        bit_writer.write_bits(self.sps.len() as u64, 5)?;
        write_nal_units(&mut bit_writer, &self.sps)?;

        bit_writer.write_u8(self.pps.len() as u8)?;
        write_nal_units(&mut bit_writer, &self.pps)?;

        if let Some(config) = &self.extended_config {
            bit_writer.write_bits(0b111111, 6)?;
            bit_writer.write_bits(config.chroma_format_idc as u64, 2)?;
            bit_writer.write_bits(0b11111, 5)?;
            bit_writer.write_bits(config.bit_depth_luma_minus8 as u64, 3)?;
            bit_writer.write_bits(0b11111, 5)?;
            bit_writer.write_bits(config.bit_depth_chroma_minus8 as u64, 3)?;

            let count = u8::try_from(config.sequence_parameter_set_ext.len())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "more than 255 sps extensions"))?;
            bit_writer.write_u8(count)?;
            write_nal_units(&mut bit_writer, &config.sequence_parameter_set_ext)?;
        }

        bit_writer.finish()?;

        Ok(())
    }
}
