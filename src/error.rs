//! Error types

use crate::binary::read::ReadEof;
use crate::tag::DisplayTag;
use std::fmt;

/// Errors that originate when parsing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ParseError {
    BadEof,
    BadValue,
    BadVersion,
    BadOffset,
    BadIndex,
    LimitExceeded,
    MissingValue,
    MissingTable(u32),
    NotImplemented,
}

impl From<ReadEof> for ParseError {
    fn from(_error: ReadEof) -> Self {
        ParseError::BadEof
    }
}

impl From<std::num::TryFromIntError> for ParseError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        ParseError::BadValue
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadEof => write!(f, "end of data reached unexpectedly"),
            ParseError::BadValue => write!(f, "invalid value"),
            ParseError::BadVersion => write!(f, "unexpected data version"),
            ParseError::BadOffset => write!(f, "invalid data offset"),
            ParseError::BadIndex => write!(f, "invalid data index"),
            ParseError::LimitExceeded => write!(f, "limit exceeded"),
            ParseError::MissingValue => write!(f, "an expected data value was missing"),
            ParseError::MissingTable(tag) => {
                write!(f, "font is missing '{}' table", DisplayTag(*tag))
            }
            ParseError::NotImplemented => write!(f, "feature not implemented"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors that can occur when interpreting CFF charstrings.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum CharstringError {
    ParseError(ParseError),
    InvalidOperator,
    UnsupportedOperator,
    MissingEndChar,
    DataAfterEndChar,
    NestingLimitReached,
    ArgumentsStackLimitReached,
    InvalidArgumentsStackLength,
    MissingMoveTo,
    InvalidSubroutineIndex,
    NoLocalSubroutines,
    InvalidSeacCode,
}

impl From<ParseError> for CharstringError {
    fn from(error: ParseError) -> CharstringError {
        CharstringError::ParseError(error)
    }
}

impl From<ReadEof> for CharstringError {
    fn from(_error: ReadEof) -> CharstringError {
        CharstringError::ParseError(ParseError::BadEof)
    }
}

impl fmt::Display for CharstringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharstringError::ParseError(parse_error) => {
                write!(f, "parse error: ")?;
                parse_error.fmt(f)
            }
            CharstringError::InvalidOperator => write!(f, "an invalid operator occurred"),
            CharstringError::UnsupportedOperator => write!(f, "an unsupported operator occurred"),
            CharstringError::MissingEndChar => write!(f, "the 'endchar' operator is missing"),
            CharstringError::DataAfterEndChar => {
                write!(f, "unused data left after 'endchar' operator")
            }
            CharstringError::NestingLimitReached => {
                write!(f, "subroutines nesting limit reached")
            }
            CharstringError::ArgumentsStackLimitReached => {
                write!(f, "arguments stack limit reached")
            }
            CharstringError::InvalidArgumentsStackLength => {
                write!(f, "an invalid amount of items are in an arguments stack")
            }
            CharstringError::MissingMoveTo => write!(f, "missing moveto operator"),
            CharstringError::InvalidSubroutineIndex => write!(f, "an invalid subroutine index"),
            CharstringError::NoLocalSubroutines => write!(f, "no local subroutines"),
            CharstringError::InvalidSeacCode => write!(f, "invalid seac code"),
        }
    }
}

impl std::error::Error for CharstringError {}

/// Errors returned by the deobfuscation resolver.
#[derive(Debug)]
pub enum ResolveError {
    Parse(ParseError),
    Charstring(CharstringError),
    SignatureTable(serde_json::Error),
}

impl From<ParseError> for ResolveError {
    fn from(error: ParseError) -> Self {
        ResolveError::Parse(error)
    }
}

impl From<CharstringError> for ResolveError {
    fn from(error: CharstringError) -> Self {
        ResolveError::Charstring(error)
    }
}

impl From<serde_json::Error> for ResolveError {
    fn from(error: serde_json::Error) -> Self {
        ResolveError::SignatureTable(error)
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Parse(err) => write!(f, "font parse: {}", err),
            ResolveError::Charstring(err) => write!(f, "charstring: {}", err),
            ResolveError::SignatureTable(err) => write!(f, "signature table: {}", err),
        }
    }
}

impl std::error::Error for ResolveError {}
