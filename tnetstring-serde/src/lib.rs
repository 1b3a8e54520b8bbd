//! Conveniently serialize and deserialize your Rust data structures into the `tnetstring` wire format.
//!
//! # Mapping
//!
//! Structs and maps become dicts, sequences and tuples become lists, `()` and `None` become null.
//! Enums follow the usual external tagging: a unit variant is just its name as a string, every
//! other variant becomes a dict with a single entry mapping the variant name to its content.
//! Integers are confined to `i32` on the wire, so wider Rust types fail to serialize when their
//! value does not fit. Since tnetstring strings are plain byte sequences, `&str` and `String`
//! deserialize only from valid UTF-8 payloads; use `serde_bytes` for arbitrary binary data.
//!
//! # Examples
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use std::collections::BTreeMap;
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! pub enum Species {
//!     PrionailurusViverrinus,
//!     LynxLynx,
//!     FelisCatus,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! pub struct Cat<'a> {
//!     name: &'a str,
//!     species: Species,
//! }
//!
//! let cat = Cat { name: "Jessica", species: Species::FelisCatus };
//! let bytes = tnetstring_serde::to_bytes(&cat).unwrap();
//!
//! // The payload is the concatenation of the key and value frames:
//! //   4:name,7:Jessica,       name: "Jessica"
//! //   7:species,10:FelisCatus,   species, unit variant as plain string
//! assert_eq!(bytes, b"41:4:name,7:Jessica,7:species,10:FelisCatus,}".to_vec());
//!
//! let back: Cat = tnetstring_serde::from_bytes(&bytes).unwrap();
//! assert_eq!(cat, back);
//! ```

mod de;
mod error;
mod ser;

pub use crate::de::{from_bytes, from_value, ValueDeserializer};
pub use crate::error::{DeserializationError, Error, Result};
pub use crate::ser::{to_bytes, to_writer, Serializer};
