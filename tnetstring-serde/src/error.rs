use std::fmt::{self, Display};
use std::str::Utf8Error;
use serde::{de, ser};
use tnetstring::{DecoderError, EncodeError};

pub type Result<T> = std::result::Result<T, Error>;

/// Error of [crate::from_bytes], pairing the underlying failure with the byte
/// offset the decoder had reached.
#[derive(Debug)]
pub struct DeserializationError {
    inner: Error,
    at: usize,
}

impl DeserializationError {

    /// Byte offset into the input at which deserialization failed.
    pub fn position(&self) -> usize {
        self.at
    }

    pub fn into_inner(self) -> Error {
        self.inner
    }

}

impl std::error::Error for DeserializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner)
    }
}

impl Display for DeserializationError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{} at input position {}", self.inner, self.at)
    }
}

#[derive(Debug)]
pub enum Error {
    // Decode
    Decode(DecoderError),
    Trailing,
    UnexpectedValue(&'static [&'static str], &'static str),
    Int,
    Utf8(Utf8Error),
    Char,
    // Encode
    Encode(EncodeError),
    KeyType,
    // Both
    Message(String),
}

impl Error {
    pub fn at(self, at: usize) -> DeserializationError {
        DeserializationError { inner: self, at }
    }
}

impl From<DecoderError> for Error {
    fn from(e: DecoderError) -> Error {
        Error::Decode(e)
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Error {
        Error::Encode(e)
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(_: std::num::TryFromIntError) -> Error {
        Error::Int
    }
}

impl From<Utf8Error> for Error {
    fn from(e: Utf8Error) -> Error {
        Error::Utf8(e)
    }
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Message(msg) => fmt.write_str(msg),
            Error::Encode(e) => write!(fmt, "Encoding error: {}", e),
            Error::Decode(e) => write!(fmt, "Decoding error: {}", e),
            Error::KeyType => write!(fmt, "Map key must serialize to a string"),
            Error::Trailing => fmt.write_str("Trailing characters in input"),
            Error::UnexpectedValue(expected, actual) => write!(fmt, "Unexpected value: expected one of ({}), found {}", expected.join(", "), actual),
            Error::Utf8(e) => write!(fmt, "Bytes aren't valid Utf-8: {}", e),
            Error::Char => fmt.write_str("Expected a string of exactly one character"),
            Error::Int => fmt.write_str("Integer didn't fit into target type"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            Error::Encode(e) => Some(e),
            Error::Utf8(e) => Some(e),
            _ => None,
        }
    }
}
