//! A codec for the tagged netstring wire format: a self-describing,
//! length-prefixed serialization of scalar and recursive composite values.
//! One tnetstring is `<size>:<payload><tag>`, where the decimal size field
//! counts the payload bytes and the single tag byte after the payload names
//! its type. List and dict payloads are concatenations of nested tnetstrings.
//!
//! Encoding takes a [Value] and a writer and returns the amount of written
//! bytes. Decoding takes a buffer positioned at the start of a tnetstring and
//! returns the value plus the number of consumed bytes, so a caller can keep
//! decoding messages back to back from the same buffer.
//!
//! # A note on strings
//!
//! The wire format imposes no character encoding: a string payload is raw
//! bytes. [Value::Str] and dict keys therefore carry `Cow<[u8]>`, borrowed
//! from the input buffer where possible, and a decoded value may only live as
//! long as the buffer it was decoded from.
//!
//! # A note on failure
//!
//! Decoding is strict: every malformed input surfaces a [DecoderError] naming
//! the failure [ErrorKind] and the diagnostics available at the failure site
//! (offending character, size field digit, remaining composite budget, final
//! cursor position). The cursor is not rewound on failure, so a source must
//! not be reused after an error without re-synchronizing it externally.
//!
//! # Examples
//!
//! ```
//! use tnetstring::{Decoder, Encoder, Value};
//! use std::borrow::Cow;
//!
//! let mut buf = Vec::new();
//! let value = Value::List(vec![
//!     Value::Str(Cow::Borrowed(b"Hello")),
//!     Value::Int(123),
//! ]);
//! Encoder::encode(&value, &mut buf).unwrap();
//! assert_eq!(buf, b"14:5:Hello,3:123#]");
//! let (decoded, consumed) = Decoder::decode(&buf).unwrap();
//! assert_eq!(value, decoded);
//! assert_eq!(18, consumed);
//! ```

mod error;
mod tag;
mod value;

pub use error::*;
pub use tag::*;
pub use value::*;
