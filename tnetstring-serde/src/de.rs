use serde::Deserialize;
use serde::de::{self, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::de::value::BorrowedStrDeserializer;
use tnetstring::{Decoder, Value};
use std::borrow::Cow;
use std::collections::btree_map;
use std::str::from_utf8;
use std::vec;

use crate::error::{DeserializationError, Error, Result};

/// Deserialize a value from a buffer holding exactly one tnetstring. Strings
/// borrow from the buffer where the target type allows it.
pub fn from_bytes<'a, T: Deserialize<'a>>(input: &'a [u8]) -> std::result::Result<T, DeserializationError> {
    let (value, consumed) = match Decoder::decode(input) {
        Ok(decoded) => decoded,
        Err(e) => {
            let at = e.position();
            return Err(Error::Decode(e).at(at));
        },
    };
    if consumed != input.len() {
        return Err(Error::Trailing.at(consumed));
    }
    from_value(value).map_err(|e| e.at(consumed))
}

/// Deserialize from an already decoded value tree.
pub fn from_value<'de, T: Deserialize<'de>>(value: Value<'de>) -> Result<T> {
    T::deserialize(ValueDeserializer::new(value))
}

pub struct ValueDeserializer<'de> {
    value: Value<'de>,
}

impl<'de> ValueDeserializer<'de> {

    pub fn new(value: Value<'de>) -> Self {
        Self { value }
    }

    fn into_int(self) -> Result<i32> {
        match self.value {
            Value::Int(v) => Ok(v),
            other => Err(Error::UnexpectedValue(&["integer"], other.typename())),
        }
    }

    fn into_float(self) -> Result<f64> {
        match self.value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            other => Err(Error::UnexpectedValue(&["float", "integer"], other.typename())),
        }
    }

    fn into_str(self) -> Result<Cow<'de, str>> {
        match self.value {
            Value::Str(Cow::Borrowed(b)) => Ok(Cow::Borrowed(from_utf8(b)?)),
            Value::Str(Cow::Owned(b)) => {
                String::from_utf8(b).map(Cow::Owned).map_err(|e| Error::Utf8(e.utf8_error()))
            },
            other => Err(Error::UnexpectedValue(&["string"], other.typename())),
        }
    }

    fn visit_str_value<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.into_str()? {
            Cow::Borrowed(s) => visitor.visit_borrowed_str(s),
            Cow::Owned(s) => visitor.visit_string(s),
        }
    }

}

impl<'de> de::Deserializer<'de> for ValueDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(v) => visitor.visit_bool(v),
            Value::Int(v) => visitor.visit_i32(v),
            Value::Float(v) => visitor.visit_f64(v),
            Value::Str(Cow::Borrowed(b)) => match from_utf8(b) {
                Ok(s) => visitor.visit_borrowed_str(s),
                Err(_) => visitor.visit_borrowed_bytes(b),
            },
            Value::Str(Cow::Owned(b)) => match String::from_utf8(b) {
                Ok(s) => visitor.visit_string(s),
                Err(e) => visitor.visit_byte_buf(e.into_bytes()),
            },
            Value::List(v) => visitor.visit_seq(SeqDeserializer::new(v)),
            Value::Dict(v) => visitor.visit_map(MapDeserializer::new(v)),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Bool(v) => visitor.visit_bool(v),
            other => Err(Error::UnexpectedValue(&["boolean"], other.typename())),
        }
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i8(self.into_int()?.try_into()?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i16(self.into_int()?.try_into()?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i32(self.into_int()?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(self.into_int()?.into())
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u8(self.into_int()?.try_into()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u16(self.into_int()?.try_into()?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u32(self.into_int()?.try_into()?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u64(self.into_int()?.try_into()?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f32(self.into_float()? as f32)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f64(self.into_float()?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let v = self.into_str()?;
        let mut chars = v.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::Char),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.visit_str_value(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.visit_str_value(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Str(Cow::Borrowed(b)) => visitor.visit_borrowed_bytes(b),
            Value::Str(Cow::Owned(b)) => visitor.visit_byte_buf(b),
            other => Err(Error::UnexpectedValue(&["string"], other.typename())),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            other => Err(Error::UnexpectedValue(&["null"], other.typename())),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::List(v) => visitor.visit_seq(SeqDeserializer::new(v)),
            other => Err(Error::UnexpectedValue(&["list"], other.typename())),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(self, _name: &'static str, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Dict(v) => visitor.visit_map(MapDeserializer::new(v)),
            other => Err(Error::UnexpectedValue(&["dict"], other.typename())),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(self, _name: &'static str, _fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(self, _name: &'static str, _variants: &'static [&'static str], visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Str(_) => {
                let variant = ValueDeserializer { value: self.value }.into_str()?;
                match variant {
                    Cow::Borrowed(s) => visitor.visit_enum(BorrowedStrDeserializer::new(s)),
                    Cow::Owned(s) => visitor.visit_enum(s.into_deserializer()),
                }
            },
            Value::Dict(v) if v.len() == 1 => {
                let (key, value) = v.into_iter().next()
                    .ok_or(Error::UnexpectedValue(&["dict with one entry"], "dict"))?;
                let variant = ValueDeserializer { value: Value::Str(key) }.into_str()?;
                visitor.visit_enum(EnumDeserializer { variant, value })
            },
            other => Err(Error::UnexpectedValue(&["string", "dict with one entry"], other.typename())),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.visit_str_value(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_any(visitor)
    }

}

struct SeqDeserializer<'de> {
    iter: vec::IntoIter<Value<'de>>,
}

impl<'de> SeqDeserializer<'de> {
    fn new(elements: Vec<Value<'de>>) -> Self {
        Self { iter: elements.into_iter() }
    }
}

impl<'de> SeqAccess<'de> for SeqDeserializer<'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    #[inline]
    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer<'de> {
    iter: btree_map::IntoIter<Cow<'de, [u8]>, Value<'de>>,
    pending: Option<Value<'de>>,
}

impl<'de> MapDeserializer<'de> {
    fn new(entries: std::collections::BTreeMap<Cow<'de, [u8]>, Value<'de>>) -> Self {
        Self { iter: entries.into_iter(), pending: None }
    }
}

impl<'de> MapAccess<'de> for MapDeserializer<'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.iter.next() {
            Some((key, value)) => {
                self.pending = Some(value);
                seed.deserialize(ValueDeserializer::new(Value::Str(key))).map(Some)
            },
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        match self.pending.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(de::Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    #[inline]
    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer<'de> {
    variant: Cow<'de, str>,
    value: Value<'de>,
}

impl<'de> EnumAccess<'de> for EnumDeserializer<'de> {
    type Error = Error;
    type Variant = VariantDeserializer<'de>;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let variant = match self.variant {
            Cow::Borrowed(s) => seed.deserialize(BorrowedStrDeserializer::<Error>::new(s))?,
            Cow::Owned(s) => {
                let deserializer: de::value::StringDeserializer<Error> = s.into_deserializer();
                seed.deserialize(deserializer)?
            },
        };
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer<'de> {
    value: Value<'de>,
}

impl<'de> VariantAccess<'de> for VariantDeserializer<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            other => Err(Error::UnexpectedValue(&["null"], other.typename())),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(ValueDeserializer::new(self.value))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_seq(ValueDeserializer::new(self.value), visitor)
    }

    fn struct_variant<V: Visitor<'de>>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_map(ValueDeserializer::new(self.value), visitor)
    }

}

#[cfg(test)]
mod tests {
    use super::from_bytes;
    use crate::error::Error;
    use crate::ser::to_bytes;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[test]
    fn scalars() {
        assert_eq!(12345, from_bytes::<i32>(b"5:12345#").unwrap());
        assert_eq!(-1i8, from_bytes::<i8>(b"2:-1#").unwrap());
        assert_eq!(1.23, from_bytes::<f64>(b"4:1.23^").unwrap());
        assert_eq!(true, from_bytes::<bool>(b"4:true!").unwrap());
        assert_eq!("Hello", from_bytes::<&str>(b"5:Hello,").unwrap());
        assert_eq!('x', from_bytes::<char>(b"1:x,").unwrap());
        assert_eq!((), from_bytes::<()>(b"0:~").unwrap());
        assert_eq!(None, from_bytes::<Option<i32>>(b"0:~").unwrap());
        assert_eq!(Some(7), from_bytes::<Option<i32>>(b"1:7#").unwrap());
    }

    #[test]
    fn int_range() {
        assert!(matches!(from_bytes::<u8>(b"3:300#").unwrap_err().into_inner(), Error::Int));
        assert!(matches!(from_bytes::<u32>(b"2:-1#").unwrap_err().into_inner(), Error::Int));
    }

    #[test]
    fn trailing_input() {
        assert!(matches!(from_bytes::<i32>(b"5:12345#asdf").unwrap_err().into_inner(), Error::Trailing));
    }

    #[test]
    fn sequences() {
        assert_eq!(vec![1, 2, 3], from_bytes::<Vec<i32>>(b"12:1:1#1:2#1:3#]").unwrap());
        let (greeting, count, ratio, flag) =
            from_bytes::<(String, i32, f64, bool)>(b"28:5:Hello,3:123#4:1.23^4:true!]").unwrap();
        assert_eq!(("Hello".to_string(), 123, 1.23, true), (greeting, count, ratio, flag));
    }

    #[test]
    fn maps() {
        let map = from_bytes::<BTreeMap<String, i32>>(b"16:1:a,1:1#1:b,1:2#}").unwrap();
        assert_eq!(BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]), map);
    }

    #[test]
    fn structs() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Cat<'a> {
            name: &'a str,
            age: u8,
        }
        let cat = from_bytes::<Cat>(b"27:4:name,7:Jessica,3:age,1:5#}").unwrap();
        assert_eq!(Cat { name: "Jessica", age: 5 }, cat);
    }

    #[test]
    fn enums() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        enum Species {
            FelisCatus,
            Named(String),
            Hybrid(String, String),
            Described { legs: u8 },
        }
        for value in [
            Species::FelisCatus,
            Species::Named("Jessica".into()),
            Species::Hybrid("lynx".into(), "domest".into()),
            Species::Described { legs: 4 },
        ] {
            let bytes = to_bytes(&value).unwrap();
            assert_eq!(value, from_bytes::<Species>(&bytes).unwrap());
        }
    }

    #[test]
    fn bytes() {
        let buf = serde_bytes::ByteBuf::from(vec![0xff, 0x00, 0xc3, 0x28]);
        let bytes = to_bytes(&buf).unwrap();
        assert_eq!(b"4:\xff\x00\xc3\x28,".as_ref(), bytes);
        assert_eq!(buf, from_bytes::<serde_bytes::ByteBuf>(&bytes).unwrap());
    }

    #[test]
    fn nested_roundtrip() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Message {
            version: u32,
            tags: Vec<String>,
            meta: BTreeMap<String, Option<i32>>,
        }
        let message = Message {
            version: 1,
            tags: vec!["a".into(), "b".into()],
            meta: BTreeMap::from([("x".to_string(), Some(-3)), ("y".to_string(), None)]),
        };
        let bytes = to_bytes(&message).unwrap();
        assert_eq!(message, from_bytes::<Message>(&bytes).unwrap());
    }

}
