//! The atom of a tnetstring is the [Value]. Values are encoded on wire as
//! `<size>:<payload><tag>` frames; list and dict payloads are themselves
//! concatenations of such frames, so the model is recursive. Strings carry
//! arbitrary bytes, the wire format imposes no character encoding on them.

use crate::error::{DecoderError, EncodeError, ErrorKind, ParseError};
use crate::tag::{Tag, DATA_MAXLEN, MAX_DEPTH, SIZE_DELIM, SIZE_MAXLEN};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::Write;
use std::iter::repeat;
use std::str::from_utf8;

/// The possible values according to the tagged netstring data model.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int(i32),
    Float(f64),
    Str(Cow<'a, [u8]>),
    List(Vec<Value<'a>>),
    Dict(BTreeMap<Cow<'a, [u8]>, Value<'a>>),
}

impl<'a> Value<'a> {

    pub fn typename(&self) -> &'static str {
        match *self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Dict(_) => "dict",
        }
    }

    /// Copies all borrowed bytes so the value can outlive its input buffer.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Self::Null => Value::Null,
            Self::Bool(v) => Value::Bool(v),
            Self::Int(v) => Value::Int(v),
            Self::Float(v) => Value::Float(v),
            Self::Str(v) => Value::Str(Cow::Owned(v.into_owned())),
            Self::List(v) => Value::List(v.into_iter().map(Value::into_owned).collect()),
            Self::Dict(v) => Value::Dict(v.into_iter()
                .map(|(k, v)| (Cow::Owned(k.into_owned()), v.into_owned()))
                .collect()),
        }
    }

    fn b64(input: &[u8]) -> String {
        const CHAR_SET: &'static [char] = &['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N',
            'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
            'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
            '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '+', '/'
        ];
        let mut array = [0; 4];
        input.chunks(3).flat_map(|chunk| {
            let len = chunk.len();
            array[1..1 + len].copy_from_slice(chunk);
            for i in 0..(3 - len) {
                array[3 - i] = 0;
            }
            let x = u32::from_be_bytes(array);
            (0..=len).map(move |o| CHAR_SET[(x >> (18 - 6 * o) & 0x3f) as usize]).chain(repeat('=').take(3 - len))
        }).collect()
    }

    /// Textual rendition of a string payload: quoted and escaped when the
    /// bytes are valid UTF-8, base64 in single quotes otherwise.
    fn render_bytes(v: &[u8]) -> String {
        match from_utf8(v) {
            Ok(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")),
            Err(_) => format!("'{}'", Self::b64(v)),
        }
    }

}

/// Renders a float the way the wire carries it: fixed-point, at most six
/// fractional digits, trailing zeros dropped.
fn render_float(v: f64) -> String {
    let mut text = format!("{:.6}", v);
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    text
}

impl<'a> std::fmt::Display for Value<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(true) => f.write_str("true"),
            Value::Bool(false) => f.write_str("false"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => f.write_str(&render_float(*v)),
            Value::Str(v) => f.write_str(&Self::render_bytes(v)),
            Value::List(v) => write!(f, "[\n{}\n]", v.iter()
                .flat_map(|e| format!("{},", e).lines().map(|line| format!("  {}", line)).collect::<Vec<String>>())
                .collect::<Vec<String>>().join("\n")),
            Value::Dict(v) => write!(f, "{{\n{}\n}}", v.iter()
                .flat_map(|(k, e)| format!("{}: {},", Self::render_bytes(k), e).lines().map(|line| format!("  {}", line)).collect::<Vec<String>>())
                .collect::<Vec<String>>().join("\n")),
        }
    }
}

/// Used to encode tnetstring values. Composite payloads are buffered first so
/// their total byte length is known when the frame is written.
pub struct Encoder;

impl Encoder {

    /// Encode a value to the given writer. The resulting `usize` is the amount
    /// of bytes that got written. Encoding is total over the model; the only
    /// failure paths are writer errors and payloads beyond [DATA_MAXLEN].
    pub fn encode<W: Write>(value: &Value, writer: &mut W) -> Result<usize, EncodeError> {
        match value {
            Value::Null => Self::frame(writer, b"", Tag::Null),
            Value::Bool(true) => Self::frame(writer, b"true", Tag::Bool),
            Value::Bool(false) => Self::frame(writer, b"false", Tag::Bool),
            Value::Int(v) => Self::frame(writer, v.to_string().as_bytes(), Tag::Int),
            Value::Float(v) => Self::frame(writer, render_float(*v).as_bytes(), Tag::Float),
            Value::Str(v) => Self::frame(writer, v, Tag::Str),
            Value::List(inner) => {
                let mut payload = Vec::new();
                for element in inner.iter() {
                    Self::encode(element, &mut payload)?;
                }
                Self::frame(writer, &payload, Tag::List)
            },
            Value::Dict(inner) => {
                let mut payload = Vec::new();
                for (key, val) in inner.iter() {
                    Self::frame(&mut payload, key, Tag::Str)?;
                    Self::encode(val, &mut payload)?;
                }
                Self::frame(writer, &payload, Tag::Dict)
            },
        }
    }

    /// Writes one `<size>:<payload><tag>` frame.
    fn frame<W: Write>(writer: &mut W, payload: &[u8], tag: Tag) -> Result<usize, EncodeError> {
        if payload.len() > DATA_MAXLEN {
            return Err(EncodeError::Length(payload.len()));
        }
        let size = payload.len().to_string();
        writer.write_all(size.as_bytes())?;
        writer.write_all(&[SIZE_DELIM])?;
        writer.write_all(payload)?;
        writer.write_all(&[tag.byte()])?;
        Ok(size.len() + 1 + payload.len() + 1)
    }

}

/// Used to decode tnetstrings. String payloads and dict keys are borrowed from
/// the buffer instead of copied, so the decoded value may only live as long as
/// the buffer does. Containers still need their own heap space.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Size parsed from the last successfully decoded size field
    current_size: usize,
    /// Digit count of the last successfully decoded size field
    current_size_digits: usize,
    /// Tag found behind the payload of the current frame
    current_tag: Tag,
}

impl<'a> Decoder<'a> {

    /// Decode a single value from the given buffer. On success the `usize` is
    /// the number of consumed bytes; the next tnetstring, if any, starts right
    /// there. On failure the cursor position carried by the error is
    /// diagnostic only, callers must re-synchronize the source themselves.
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &'a B) -> Result<(Value<'a>, usize), DecoderError> {
        let mut decoder = Self {
            buf: buf.as_ref(),
            pos: 0,
            current_size: 0,
            current_size_digits: 0,
            current_tag: Tag::Null,
        };
        let value = decoder.decode_one(0).map_err(|e| e.at(decoder.pos))?;
        Ok((value, decoder.pos))
    }

    fn decode_one(&mut self, depth: usize) -> Result<Value<'a>, ParseError> {
        self.decode_size()?;
        self.decode_type()?;
        self.decode_value(depth)
    }

    /// Reads the size field up to and including the delimiter: between one and
    /// [SIZE_MAXLEN] digits followed by a colon.
    fn decode_size(&mut self) -> Result<(), ParseError> {
        let mut digits = 0;
        loop {
            let next = self.buf.get(self.pos + digits).copied();
            if next == Some(SIZE_DELIM) {
                break;
            }
            if digits == SIZE_MAXLEN {
                let mut e = ParseError::new(ErrorKind::SizeFieldTooLarge).with_digit(digits);
                if let Some(c) = next {
                    e = e.with_char(c as char);
                }
                return Err(e);
            }
            match next {
                None => return Err(ParseError::new(ErrorKind::PrematureEnd).with_digit(digits)),
                Some(c) if !c.is_ascii_digit() => {
                    return Err(ParseError::new(ErrorKind::SizeFieldNotNumeric).with_digit(digits).with_char(c as char));
                },
                Some(_) => digits += 1,
            }
        }
        if digits == 0 {
            return Err(ParseError::new(ErrorKind::SizeFieldNotNumeric).with_digit(0).with_char(SIZE_DELIM as char));
        }
        // at most nine digits, so this cannot overflow
        let mut size = 0usize;
        for &b in &self.buf[self.pos..self.pos + digits] {
            size = size * 10 + (b - b'0') as usize;
        }
        self.current_size = size;
        self.current_size_digits = digits;
        self.pos += digits + 1;
        Ok(())
    }

    /// Peeks at the tag byte `current_size` bytes ahead without consuming
    /// anything. The payload in between is untouched.
    fn decode_type(&mut self) -> Result<(), ParseError> {
        match self.buf.get(self.pos + self.current_size) {
            None => Err(ParseError::new(ErrorKind::PrematureEnd)),
            Some(&b) => match Tag::try_from(b) {
                Ok(tag) => {
                    self.current_tag = tag;
                    Ok(())
                },
                Err(()) => Err(ParseError::new(ErrorKind::UnsupportedTag).with_char(b as char)),
            },
        }
    }

    /// Converts the current frame into a [Value], consuming its payload and
    /// tag byte. Composite frames recurse through [Self::decode_list] and
    /// [Self::decode_dict], which consume their closing tag themselves.
    fn decode_value(&mut self, depth: usize) -> Result<Value<'a>, ParseError> {
        if depth >= MAX_DEPTH {
            return Err(ParseError::new(ErrorKind::DepthLimitExceeded));
        }
        let size = self.current_size;
        match self.current_tag {
            Tag::Str => {
                let payload = self.take(size)?;
                self.pos += 1;
                Ok(Value::Str(Cow::Borrowed(payload)))
            },
            Tag::Int => {
                let payload = self.take(size)?;
                self.pos += 1;
                from_utf8(payload).ok()
                    .and_then(|text| text.parse::<i32>().ok())
                    .map(Value::Int)
                    .ok_or_else(|| ParseError::new(ErrorKind::IntCastFailure).with_text(String::from_utf8_lossy(payload)))
            },
            Tag::Float => {
                let payload = self.take(size)?;
                self.pos += 1;
                from_utf8(payload).ok()
                    .and_then(|text| text.parse::<f64>().ok())
                    .map(Value::Float)
                    .ok_or_else(|| ParseError::new(ErrorKind::FloatCastFailure).with_text(String::from_utf8_lossy(payload)))
            },
            Tag::Bool => {
                let payload = self.take(size)?;
                self.pos += 1;
                Ok(Value::Bool(payload == b"true"))
            },
            Tag::Null => {
                // payload bytes under `~` are discarded, whatever they are
                self.take(size)?;
                self.pos += 1;
                Ok(Value::Null)
            },
            Tag::List => self.decode_list(size, depth).map(Value::List),
            Tag::Dict => self.decode_dict(size, depth).map(Value::Dict),
        }
    }

    /// Decodes nested elements against a running byte budget initialized to
    /// the declared composite size. The final budget unit is the closing tag,
    /// consumed after the loop.
    fn decode_list(&mut self, size: usize, depth: usize) -> Result<Vec<Value<'a>>, ParseError> {
        let mut elements = Vec::new();
        let mut remaining = size as i64;
        while remaining > 1 {
            self.decode_size().map_err(|e| e.with_budget(remaining))?;
            let element_size = self.current_size as i64;
            let element_digits = self.current_size_digits as i64;
            self.decode_type().map_err(|e| e.with_budget(remaining))?;
            let element = self.decode_value(depth + 1).map_err(|e| e.with_budget(remaining))?;
            elements.push(element);
            // size digits, colon, tag byte and the payload itself
            remaining -= element_digits + 2 + element_size;
        }
        self.consume_tag()?;
        Ok(elements)
    }

    /// Like [Self::decode_list] but over key value pairs. Keys must decode to
    /// strings; a later duplicate key overwrites the earlier entry.
    fn decode_dict(&mut self, size: usize, depth: usize) -> Result<BTreeMap<Cow<'a, [u8]>, Value<'a>>, ParseError> {
        let mut entries = BTreeMap::new();
        let mut remaining = size as i64;
        while remaining > 1 {
            self.decode_size().map_err(|e| e.with_budget(remaining))?;
            let key_size = self.current_size as i64;
            let key_digits = self.current_size_digits as i64;
            self.decode_type().map_err(|e| e.with_budget(remaining))?;
            let key = match self.decode_value(depth + 1).map_err(|e| e.with_budget(remaining))? {
                Value::Str(bytes) => bytes,
                other => {
                    return Err(ParseError::new(ErrorKind::NonStringKey)
                        .with_text(other.typename())
                        .with_budget(remaining));
                },
            };

            self.decode_size().map_err(|e| e.with_budget(remaining))?;
            let value_size = self.current_size as i64;
            let value_digits = self.current_size_digits as i64;
            self.decode_type().map_err(|e| e.with_budget(remaining))?;
            let value = self.decode_value(depth + 1).map_err(|e| e.with_budget(remaining))?;

            entries.insert(key, value);
            remaining -= key_size + key_digits + value_size + value_digits + 4;
        }
        self.consume_tag()?;
        Ok(entries)
    }

    /// Consumes the composite's own closing tag byte.
    fn consume_tag(&mut self) -> Result<(), ParseError> {
        if self.pos >= self.buf.len() {
            Err(ParseError::new(ErrorKind::PrematureEnd))
        } else {
            self.pos += 1;
            Ok(())
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ParseError> {
        if self.buf[self.pos..].len() < len {
            Err(ParseError::new(ErrorKind::PrematureEnd))
        } else {
            self.pos += len;
            Ok(&self.buf[self.pos - len..self.pos])
        }
    }

}
