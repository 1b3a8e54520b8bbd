use crate::tag::DATA_MAXLEN;
use std::fmt::{Display, Formatter, self};

/// The kinds of failure the parser can report. Every kind specializes the same
/// [ParseError] carrier; the kind alone identifies what went wrong, the
/// carrier's optional fields say where and on what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A tenth digit appeared in the size field before the colon.
    SizeFieldTooLarge,
    /// A character in the size field was neither a digit nor the colon.
    SizeFieldNotNumeric,
    /// The input ended before the tnetstring was complete.
    PrematureEnd,
    /// The byte after the payload is not one of the seven known tags.
    UnsupportedTag,
    /// An integer payload could not be parsed as a 32 bit signed decimal.
    IntCastFailure,
    /// A float payload could not be parsed as a 64 bit float.
    FloatCastFailure,
    /// A dict key decoded to something other than a string.
    NonStringKey,
    /// The input nests composites deeper than the decoder allows.
    DepthLimitExceeded,
}

/// A parse failure together with whatever diagnostic context was available at
/// the site of the failure. Enclosing composite decoders stamp their remaining
/// byte budget onto the error as it propagates, each level overwriting the
/// last, so the surfaced budget belongs to the outermost composite.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    kind: ErrorKind,
    found: Option<char>,
    text: Option<String>,
    digit: Option<usize>,
    budget: Option<i64>,
}

impl ParseError {

    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self { kind, found: None, text: None, digit: None, budget: None }
    }

    pub(crate) fn with_char(mut self, c: char) -> Self {
        self.found = Some(c);
        self
    }

    pub(crate) fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub(crate) fn with_digit(mut self, digit: usize) -> Self {
        self.digit = Some(digit);
        self
    }

    pub(crate) fn with_budget(mut self, budget: i64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The character that triggered the failure, if one did.
    pub fn offending_char(&self) -> Option<char> {
        self.found
    }

    /// The payload text that failed to convert, or the typename of an illegal
    /// dict key.
    pub fn offending_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Position within the size field at which parsing stopped.
    pub fn size_digit(&self) -> Option<usize> {
        self.digit
    }

    /// Remaining byte budget of the outermost enclosing composite, if the
    /// failure happened inside one.
    pub fn remaining_budget(&self) -> Option<i64> {
        self.budget
    }

    /// Attach the final cursor position, turning this into the error surfaced
    /// by [crate::Decoder::decode].
    pub fn at(self, at: usize) -> DecoderError {
        DecoderError { inner: self, at }
    }

}

impl std::error::Error for ParseError {}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self.kind {
            ErrorKind::SizeFieldTooLarge => f.write_str("tnetstring size field is too large")?,
            ErrorKind::SizeFieldNotNumeric => f.write_str("tnetstring size field is not a digit")?,
            ErrorKind::PrematureEnd => f.write_str("premature end of tnetstring")?,
            ErrorKind::UnsupportedTag => f.write_str("illegal or unsupported tnetstring payload type")?,
            ErrorKind::IntCastFailure => f.write_str("tnetstring payload cannot be cast to integer")?,
            ErrorKind::FloatCastFailure => f.write_str("tnetstring payload cannot be cast to float")?,
            ErrorKind::NonStringKey => f.write_str("dict key must be of type string")?,
            ErrorKind::DepthLimitExceeded => f.write_str("tnetstring nesting is too deep")?,
        }
        if let Some(c) = self.found {
            write!(f, ", found {:?}", c)?;
        }
        if let Some(text) = &self.text {
            write!(f, ", got `{}`", text)?;
        }
        if let Some(digit) = self.digit {
            write!(f, ", at size digit {}", digit)?;
        }
        if let Some(budget) = self.budget {
            write!(f, ", with {} bytes left in the enclosing composite", budget)?;
        }
        Ok(())
    }
}

/// Error returned by [crate::Decoder::decode]: the parse failure plus the byte
/// offset the cursor had reached when it surfaced. The cursor is not rewound
/// on failure; the offset is diagnostic only.
#[derive(Debug, PartialEq)]
pub struct DecoderError {
    inner: ParseError,
    at: usize,
}

impl DecoderError {

    pub fn kind(&self) -> ErrorKind {
        self.inner.kind()
    }

    pub fn position(&self) -> usize {
        self.at
    }

    pub fn into_inner(self) -> ParseError {
        self.inner
    }

}

impl std::error::Error for DecoderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner)
    }
}

impl Display for DecoderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{} at input position {}", self.inner, self.at)
    }
}

#[derive(Debug)]
pub enum EncodeError {
    Io(std::io::Error),
    Length(usize),
}

impl From<std::io::Error> for EncodeError {
    fn from(e: std::io::Error) -> EncodeError {
        EncodeError::Io(e)
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            EncodeError::Io(e) => write!(f, "IO error {}", e),
            EncodeError::Length(value) => write!(f, "payload length {} exceeds maximum {}", value, DATA_MAXLEN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, ParseError};

    #[test]
    fn display_carries_context() {
        let e = ParseError::new(ErrorKind::SizeFieldNotNumeric).with_char('a').with_digit(0);
        assert_eq!("tnetstring size field is not a digit, found 'a', at size digit 0", e.to_string());
        let e = ParseError::new(ErrorKind::PrematureEnd).with_budget(17).at(4);
        assert_eq!("premature end of tnetstring, with 17 bytes left in the enclosing composite at input position 4", e.to_string());
    }

    #[test]
    fn budget_overwrites() {
        let e = ParseError::new(ErrorKind::PrematureEnd).with_budget(3).with_budget(42);
        assert_eq!(Some(42), e.remaining_budget());
    }

}
