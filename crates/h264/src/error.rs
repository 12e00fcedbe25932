use std::fmt;
use std::io;

use thiserror::Error;

/// The parameter set a [`ParserError::BrokenLink`] failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterSetKind {
    /// Sequence parameter set.
    Sps,
    /// Picture parameter set.
    Pps,
}

impl fmt::Display for ParameterSetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sps => f.write_str("sequence parameter set"),
            Self::Pps => f.write_str("picture parameter set"),
        }
    }
}

/// Everything that can go wrong while locating or parsing a NAL unit.
///
/// The variants line up with the recovery a caller is expected to perform:
/// buffer more input for [`NoNal`](Self::NoNal) and [`NoNalEnd`](Self::NoNalEnd),
/// drop the unit and carry on for everything else.
#[derive(Debug, Error)]
pub enum ParserError {
    /// No start code was found in the buffer.
    #[error("no start code prefix found")]
    NoNal,
    /// A start code was found but the end of the unit is not in the buffer yet.
    #[error("nal unit end not found")]
    NoNalEnd,
    /// The NAL header or payload is internally inconsistent.
    #[error("broken nal unit data")]
    BrokenData,
    /// A referenced parameter set is not in the store.
    #[error("couldn't find associated {kind} with id: {id}")]
    BrokenLink {
        /// Which kind of parameter set was missing.
        kind: ParameterSetKind,
        /// The id that was looked up.
        id: u32,
    },
    /// Generic parse failure: the bitstream ran out or a value was out of range.
    #[error(transparent)]
    Error(#[from] io::Error),
}

/// A flat view of a parse outcome, for callers that switch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserResultKind {
    /// Parsed successfully.
    Ok,
    /// See [`ParserError::NoNal`].
    NoNal,
    /// See [`ParserError::NoNalEnd`].
    NoNalEnd,
    /// See [`ParserError::BrokenData`].
    BrokenData,
    /// See [`ParserError::BrokenLink`].
    BrokenLink,
    /// See [`ParserError::Error`].
    Error,
}

impl ParserError {
    /// Creates an [`ParserError::Error`] carrying `msg`.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Error(io::Error::new(io::ErrorKind::InvalidData, msg.into()))
    }

    pub(crate) const fn missing_sps(id: u32) -> Self {
        Self::BrokenLink {
            kind: ParameterSetKind::Sps,
            id,
        }
    }

    pub(crate) const fn missing_pps(id: u32) -> Self {
        Self::BrokenLink {
            kind: ParameterSetKind::Pps,
            id,
        }
    }

    /// Returns the flat kind of this error.
    pub const fn kind(&self) -> ParserResultKind {
        match self {
            Self::NoNal => ParserResultKind::NoNal,
            Self::NoNalEnd => ParserResultKind::NoNalEnd,
            Self::BrokenData => ParserResultKind::BrokenData,
            Self::BrokenLink { .. } => ParserResultKind::BrokenLink,
            Self::Error(_) => ParserResultKind::Error,
        }
    }

    /// True when the caller should wait for more input before retrying.
    pub const fn needs_more_data(&self) -> bool {
        matches!(self, Self::NoNal | Self::NoNalEnd)
    }
}

/// Result alias used by every parsing entry point.
pub type ParserResult<T> = Result<T, ParserError>;

/// Returns the flat kind of any parse result.
pub fn result_kind<T>(result: &ParserResult<T>) -> ParserResultKind {
    match result {
        Ok(_) => ParserResultKind::Ok,
        Err(err) => err.kind(),
    }
}
