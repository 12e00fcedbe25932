//! NAL unit location and header decoding for Annex-B and length prefixed
//! (AVC) framing.

use byteorder::{BigEndian, ByteOrder};
use bytes_util::BitReader;
use tracing::debug;

use crate::NalUnitType;
use crate::error::{ParserError, ParserResult};

/// The Annex-B start code.
pub const START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

/// MVC NAL unit header extension.
///
/// ISO/IEC-14496-10-2022 - H.7.3.1.1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NalUnitExtensionMvc {
    /// `non_idr_flag`
    pub non_idr_flag: bool,
    /// `priority_id` (6 bits)
    pub priority_id: u8,
    /// `view_id` (10 bits)
    pub view_id: u16,
    /// `temporal_id` (3 bits)
    pub temporal_id: u8,
    /// `anchor_pic_flag`
    pub anchor_pic_flag: bool,
    /// `inter_view_flag`
    pub inter_view_flag: bool,
}

/// The 3 byte header extension carried by prefix and slice extension NAL units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NalUnitExtension {
    /// Plain one byte header.
    #[default]
    None,
    /// SVC extension. The fields are skipped.
    Svc,
    /// MVC extension.
    Mvc(NalUnitExtensionMvc),
}

/// A NAL unit located inside a borrowed buffer.
///
/// Offsets are relative to the start of [`NalUnit::data`]. Nothing is copied,
/// so the buffer has to outlive the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnit<'a> {
    /// The whole buffer the unit was found in.
    pub data: &'a [u8],
    /// Offset of the start code or length prefix.
    pub sc_offset: usize,
    /// Offset of the first header byte.
    pub offset: usize,
    /// Size of the unit in bytes, header included.
    pub size: usize,
    /// `nal_unit_type` (5 bits)
    pub nal_type: u8,
    /// `nal_ref_idc` (2 bits)
    pub ref_idc: u8,
    /// True for IDR pictures, also set from the MVC `non_idr_flag`.
    pub idr_pic_flag: bool,
    /// 1, or 4 with a header extension.
    pub header_bytes: usize,
    /// The header extension, if any.
    pub extension: NalUnitExtension,
}

impl<'a> NalUnit<'a> {
    /// Treats the whole of `data` as a single NAL unit without any prefix.
    ///
    /// Used for parameter sets stored out of band, for example in an `avcC` box.
    pub fn from_bytes(data: &'a [u8]) -> ParserResult<Self> {
        let mut nalu = Self::empty(data, 0, 0);
        nalu.size = data.len();
        nalu.parse_header()?;
        Ok(nalu)
    }

    const fn empty(data: &'a [u8], sc_offset: usize, offset: usize) -> Self {
        Self {
            data,
            sc_offset,
            offset,
            size: 0,
            nal_type: 0,
            ref_idc: 0,
            idr_pic_flag: false,
            header_bytes: 0,
            extension: NalUnitExtension::None,
        }
    }

    /// The typed `nal_unit_type`.
    pub fn nal_unit_type(&self) -> NalUnitType {
        NalUnitType::from(self.nal_type)
    }

    /// The bytes of the unit, header included, without the prefix.
    pub fn bytes(&self) -> &'a [u8] {
        &self.data[self.offset..self.offset + self.size]
    }

    /// The bytes from the start code or length prefix to the end of the unit.
    pub fn bytes_with_prefix(&self) -> &'a [u8] {
        &self.data[self.sc_offset..self.offset + self.size]
    }

    /// A reader over the payload after the header, dropping emulation prevention bytes.
    pub fn rbsp_reader(&self) -> BitReader<'a> {
        let start = (self.offset + self.header_bytes).min(self.offset + self.size);
        BitReader::new_rbsp(&self.data[start..self.offset + self.size])
    }

    /// True if the unit carries an MVC header extension.
    pub const fn is_mvc(&self) -> bool {
        matches!(self.extension, NalUnitExtension::Mvc(_))
    }

    /// Decodes the header byte and, for types 14 and 20, the 3 extension bytes.
    ///
    /// ISO/IEC-14496-10-2022 - 7.3.1
    fn parse_header(&mut self) -> ParserResult<()> {
        if self.size < 1 {
            return Err(ParserError::BrokenData);
        }

        let first = self.data[self.offset];
        self.nal_type = first & 0x1f;
        self.ref_idc = (first & 0x60) >> 5;
        self.idr_pic_flag = self.nal_type == 5;
        self.header_bytes = 1;
        self.extension = NalUnitExtension::None;

        if matches!(self.nal_type, 14 | 20) {
            if self.size < 4 {
                return Err(ParserError::BrokenData);
            }

            let mut reader = BitReader::new(&self.data[self.offset + 1..self.offset + 4]);
            let svc_extension_flag = reader.read_bit()?;
            if svc_extension_flag {
                self.extension = NalUnitExtension::Svc;
            } else {
                let non_idr_flag = reader.read_bit()?;
                let mvc = NalUnitExtensionMvc {
                    non_idr_flag,
                    priority_id: reader.read_bits(6)? as u8,
                    view_id: reader.read_bits(10)? as u16,
                    temporal_id: reader.read_bits(3)? as u8,
                    anchor_pic_flag: reader.read_bit()?,
                    inter_view_flag: reader.read_bit()?,
                };
                self.idr_pic_flag = !non_idr_flag;
                self.extension = NalUnitExtension::Mvc(mvc);
            }

            self.header_bytes += 3;
        }

        debug!(
            "nal type: {} ref_idc: {} header bytes: {}",
            self.nal_type, self.ref_idc, self.header_bytes
        );

        Ok(())
    }
}

/// Returns the offset of the first `00 00 01` in `data` that is followed by at
/// least one more byte.
pub fn scan_for_start_codes(data: &[u8]) -> Option<usize> {
    memchr::memmem::find_iter(data, &START_CODE).find(|&i| i + 3 < data.len())
}

/// Locates the start code at or after `offset` and decodes the NAL header,
/// without looking for the end of the unit.
///
/// The returned unit extends to the end of `data`, except for end of sequence
/// and end of stream units which are always one byte.
pub fn identify_nalu_unchecked(data: &[u8], offset: usize) -> ParserResult<NalUnit<'_>> {
    if data.len() < offset + 4 {
        debug!("can't parse, buffer has too small size {}, offset {}", data.len(), offset);
        return Err(ParserError::Error(std::io::ErrorKind::UnexpectedEof.into()));
    }

    let Some(off1) = scan_for_start_codes(&data[offset..]) else {
        debug!("no start code prefix in this buffer");
        return Err(ParserError::NoNal);
    };

    let sc_offset = offset + off1;
    let mut nalu = NalUnit::empty(data, sc_offset, sc_offset + 3);
    nalu.size = data.len() - nalu.offset;

    if nalu.parse_header().is_err() {
        debug!("not enough data to parse the nal header");
        return Err(ParserError::BrokenData);
    }

    // a fourth zero byte before sps, pps and aud belongs to the start code
    if nalu.sc_offset > 0 && data[nalu.sc_offset - 1] == 0x00 && matches!(nalu.nal_type, 7..=9) {
        nalu.sc_offset -= 1;
    }

    if matches!(nalu.nal_type, 10 | 11) {
        debug!("end of sequence or stream found");
        nalu.size = 1;
    }

    Ok(nalu)
}

/// Locates the next complete Annex-B NAL unit at or after `offset`.
///
/// Fails with [`ParserError::NoNal`] when there is no start code and with
/// [`ParserError::NoNalEnd`] when the unit is not terminated by another start
/// code yet.
pub fn identify_nalu(data: &[u8], offset: usize) -> ParserResult<NalUnit<'_>> {
    let mut nalu = identify_nalu_unchecked(data, offset)?;
    if matches!(nalu.nal_type, 10 | 11) {
        return Ok(nalu);
    }

    let Some(off2) = scan_for_start_codes(&data[nalu.offset..]) else {
        debug!("nal start found, but no end");
        return Err(ParserError::NoNalEnd);
    };

    let mut size = off2;
    while size > 0 && data[nalu.offset + size - 1] == 0x00 {
        size -= 1;
    }

    if size < 2 {
        return Err(ParserError::BrokenData);
    }

    nalu.size = size;
    debug!("complete nal found, offset {} size {}", nalu.offset, nalu.size);

    Ok(nalu)
}

/// Reads a NAL unit prefixed by a big-endian length of `length_size` bytes.
pub fn identify_nalu_avc(data: &[u8], offset: usize, length_size: u8) -> ParserResult<NalUnit<'_>> {
    let length_size = length_size as usize;
    if !(1..=4).contains(&length_size) {
        return Err(ParserError::invalid(format!("invalid nal length size {length_size}")));
    }

    if data.len() < offset + length_size {
        debug!("can't parse, buffer has too small size {}, offset {}", data.len(), offset);
        return Err(ParserError::Error(std::io::ErrorKind::UnexpectedEof.into()));
    }

    let nal_size = BigEndian::read_uint(&data[offset..], length_size) as usize;
    let mut nalu = NalUnit::empty(data, offset, offset + length_size);

    if data.len() - offset < nal_size + length_size {
        return Err(ParserError::NoNalEnd);
    }

    nalu.size = nal_size;
    nalu.parse_header().map_err(|_| ParserError::BrokenData)?;

    Ok(nalu)
}
