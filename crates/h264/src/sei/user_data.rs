use bytes::Bytes;
use bytes_util::BitReader;
use tracing::{debug, warn};

use crate::error::{ParserError, ParserResult};

fn read_bytes(reader: &mut BitReader, len: usize) -> ParserResult<Bytes> {
    let mut data = Vec::with_capacity(len);
    for _ in 0..len {
        data.push(reader.read_u8()?);
    }
    Ok(Bytes::from(data))
}

/// `user_data_registered_itu_t_t35()`
///
/// ISO/IEC-14496-10-2022 - D.1.6
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegisteredUserData {
    /// `itu_t_t35_country_code`
    pub country_code: u8,
    /// `itu_t_t35_country_code_extension_byte`, zero unless `country_code` is 0xFF.
    pub country_code_extension: u8,
    /// The remaining `itu_t_t35_payload_byte`s.
    pub data: Bytes,
}

impl RegisteredUserData {
    pub(crate) fn parse(reader: &mut BitReader, payload_size: usize) -> ParserResult<Self> {
        debug!("parsing \"Registered user data\"");

        if payload_size < 2 {
            warn!("Too small payload size {}", payload_size);
            return Err(ParserError::BrokenData);
        }

        let country_code = reader.read_u8()?;
        let mut remaining = payload_size - 1;

        let country_code_extension = if country_code == 0xff {
            remaining -= 1;
            reader.read_u8()?
        } else {
            0
        };

        if remaining < 1 {
            warn!("No more remaining payload data to store");
            return Err(ParserError::BrokenData);
        }

        Ok(Self {
            country_code,
            country_code_extension,
            data: read_bytes(reader, remaining)?,
        })
    }
}

/// `user_data_unregistered()`
///
/// ISO/IEC-14496-10-2022 - D.1.7
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserDataUnregistered {
    /// `uuid_iso_iec_11578`
    pub uuid: [u8; 16],
    /// `user_data_payload_byte`s, never empty.
    pub data: Bytes,
}

impl UserDataUnregistered {
    pub(crate) fn parse(reader: &mut BitReader, payload_size: usize) -> ParserResult<Self> {
        debug!("parsing \"User data unregistered\"");

        if payload_size < 16 {
            warn!("Too small payload size {}", payload_size);
            return Err(ParserError::BrokenData);
        }

        let mut uuid = [0; 16];
        for byte in &mut uuid {
            *byte = reader.read_u8()?;
        }

        let data = read_bytes(reader, payload_size - 16)?;
        if data.is_empty() {
            warn!("No more remaining payload data to store");
            return Err(ParserError::BrokenData);
        }

        Ok(Self { uuid, data })
    }
}

/// A payload without a structured decoder, kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnhandledPayload {
    /// `payloadType`
    pub payload_type: u32,
    /// Whole payload bytes, clamped to the NAL unit.
    pub data: Bytes,
}

impl UnhandledPayload {
    pub(crate) fn parse(reader: &mut BitReader, payload_type: u32, payload_size: usize) -> ParserResult<Self> {
        debug!("keeping unhandled SEI payload type {}", payload_type);

        Ok(Self {
            payload_type,
            data: read_bytes(reader, payload_size)?,
        })
    }
}
