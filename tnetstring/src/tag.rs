//! Wire-level constants of the tagged netstring format. Every tnetstring is a
//! `<size>:<payload><tag>` unit: a decimal size field of at most nine digits, a
//! colon, exactly `size` payload bytes and a single trailing tag byte naming
//! the payload's type. For `]` and `}` the payload is itself a concatenation of
//! nested tnetstrings.

/// Delimiter between the size field and the payload.
pub const SIZE_DELIM: u8 = b':';

/// Maximum payload length in bytes.
pub const DATA_MAXLEN: usize = 999_999_999;

/// Maximum number of digits in the size field.
pub const SIZE_MAXLEN: usize = 9;

/// Maximum nesting depth the decoder follows before refusing the input.
pub const MAX_DEPTH: usize = 500;

/// The type tag trailing a tnetstring payload.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Str = b',',
    Int = b'#',
    Float = b'^',
    Bool = b'!',
    Null = b'~',
    Dict = b'}',
    List = b']',
}

impl Tag {

    /// Returns the mnemonic of the tag. This is useful for error messages.
    pub fn name(&self) -> &'static str {
        match *self {
            Tag::Str => "string",
            Tag::Int => "integer",
            Tag::Float => "float",
            Tag::Bool => "boolean",
            Tag::Null => "null",
            Tag::Dict => "dict",
            Tag::List => "list",
        }
    }

    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// True for `]` and `}`, whose payloads are nested tnetstrings.
    pub fn is_composite(self) -> bool {
        matches!(self, Tag::List | Tag::Dict)
    }

}

impl TryFrom<u8> for Tag {
    type Error = ();

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            x if x == Tag::Str as u8 => Ok(Tag::Str),
            x if x == Tag::Int as u8 => Ok(Tag::Int),
            x if x == Tag::Float as u8 => Ok(Tag::Float),
            x if x == Tag::Bool as u8 => Ok(Tag::Bool),
            x if x == Tag::Null as u8 => Ok(Tag::Null),
            x if x == Tag::Dict as u8 => Ok(Tag::Dict),
            x if x == Tag::List as u8 => Ok(Tag::List),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Tag;

    #[test]
    fn tag_bytes() {
        for tag in [Tag::Str, Tag::Int, Tag::Float, Tag::Bool, Tag::Null, Tag::Dict, Tag::List] {
            assert_eq!(Ok(tag), Tag::try_from(tag.byte()));
        }
    }

    #[test]
    fn unknown_bytes() {
        for b in [b'?', b':', b'0', b'9', b' ', b'{', b'['] {
            assert_eq!(Err(()), Tag::try_from(b));
        }
    }

    #[test]
    fn composites() {
        assert!(Tag::List.is_composite());
        assert!(Tag::Dict.is_composite());
        assert!(!Tag::Str.is_composite());
        assert!(!Tag::Null.is_composite());
    }

}
