use serde::{ser, Serialize};
use tnetstring::{EncodeError, Tag, DATA_MAXLEN};
use std::io::Write;

use crate::error::{Error, Result};

/// Serializes the serde data model onto the tnetstring wire. Composite
/// payloads are buffered so their byte length is known before the enclosing
/// frame is written; scalars go straight to the writer.
pub struct Serializer<W> {
    output: W,
}

pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut serializer = Serializer { output: Vec::new() };
    value.serialize(&mut serializer)?;
    Ok(serializer.output)
}

pub fn to_writer<T: Serialize, W: Write>(writer: W, value: &T) -> Result<()> {
    let mut serializer = Serializer { output: writer };
    value.serialize(&mut serializer)?;
    Ok(())
}

/// Writes one `<size>:<payload><tag>` frame.
fn frame<W: Write>(writer: &mut W, payload: &[u8], tag: Tag) -> Result<()> {
    if payload.len() > DATA_MAXLEN {
        return Err(Error::Encode(EncodeError::Length(payload.len())));
    }
    write!(writer, "{}:", payload.len()).map_err(EncodeError::from)?;
    writer.write_all(payload).map_err(EncodeError::from)?;
    writer.write_all(&[tag.byte()]).map_err(EncodeError::from)?;
    Ok(())
}

impl<W: Write> Serializer<W> {

    fn serialize_int(&mut self, v: i64) -> Result<()> {
        let v = i32::try_from(v).map_err(|_| Error::Int)?;
        frame(&mut self.output, v.to_string().as_bytes(), Tag::Int)
    }

    fn serialize_float(&mut self, v: f64) -> Result<()> {
        // fixed-point with at most six fractional digits, trailing zeros dropped
        let mut text = format!("{:.6}", v);
        if text.contains('.') {
            while text.ends_with('0') {
                text.pop();
            }
            if text.ends_with('.') {
                text.pop();
            }
        }
        frame(&mut self.output, text.as_bytes(), Tag::Float)
    }

}

impl<'a, W: Write> ser::Serializer for &'a mut Serializer<W> {

    type Ok = ();
    type Error = Error;
    type SerializeSeq = SeqSerializer<'a, W>;
    type SerializeTuple = SeqSerializer<'a, W>;
    type SerializeTupleStruct = SeqSerializer<'a, W>;
    type SerializeTupleVariant = VariantSerializer<'a, W>;
    type SerializeMap = MapSerializer<'a, W>;
    type SerializeStruct = MapSerializer<'a, W>;
    type SerializeStructVariant = VariantSerializer<'a, W>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        frame(&mut self.output, if v { b"true" } else { b"false" }, Tag::Bool)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_int(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_int(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_int(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.serialize_int(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_int(i64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_int(i64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_int(i64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.serialize_int(i64::try_from(v).map_err(|_| Error::Int)?)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.serialize_float(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.serialize_float(v)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        frame(&mut self.output, v.encode_utf8(&mut buf).as_bytes(), Tag::Str)
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        frame(&mut self.output, v.as_bytes(), Tag::Str)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        frame(&mut self.output, v, Tag::Str)
    }

    fn serialize_none(self) -> Result<()> {
        frame(&mut self.output, b"", Tag::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        frame(&mut self.output, b"", Tag::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, variant: &'static str) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _name: &'static str, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(self, _name: &'static str, _index: u32, variant: &'static str, value: &T) -> Result<()> {
        let mut pair = Vec::new();
        frame(&mut pair, variant.as_bytes(), Tag::Str)?;
        value.serialize(&mut Serializer { output: &mut pair })?;
        frame(&mut self.output, &pair, Tag::Dict)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SeqSerializer { ser: self, buf: Vec::new() })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(self, _name: &'static str, _index: u32, variant: &'static str, _len: usize) -> Result<Self::SerializeTupleVariant> {
        Ok(VariantSerializer { ser: self, variant, buf: Vec::new(), tag: Tag::List })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(MapSerializer { ser: self, buf: Vec::new() })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        self.serialize_map(None)
    }

    fn serialize_struct_variant(self, _name: &'static str, _index: u32, variant: &'static str, _len: usize) -> Result<Self::SerializeStructVariant> {
        Ok(VariantSerializer { ser: self, variant, buf: Vec::new(), tag: Tag::Dict })
    }

}

/// Buffers the concatenated element frames of a list payload.
pub struct SeqSerializer<'a, W> {
    ser: &'a mut Serializer<W>,
    buf: Vec<u8>,
}

impl<'a, W: Write> ser::SerializeSeq for SeqSerializer<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut Serializer { output: &mut self.buf })
    }

    fn end(self) -> Result<()> {
        frame(&mut self.ser.output, &self.buf, Tag::List)
    }
}

impl<'a, W: Write> ser::SerializeTuple for SeqSerializer<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        ser::SerializeSeq::end(self)
    }
}

impl<'a, W: Write> ser::SerializeTupleStruct for SeqSerializer<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        ser::SerializeSeq::end(self)
    }
}

/// Buffers the key value frames of a dict payload. Keys must serialize to a
/// single string frame.
pub struct MapSerializer<'a, W> {
    ser: &'a mut Serializer<W>,
    buf: Vec<u8>,
}

impl<'a, W: Write> ser::SerializeMap for MapSerializer<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        key.serialize(&mut Serializer { output: &mut self.buf })?;
        // every frame ends in its tag byte, so this rejects non-string keys
        if self.buf.last() != Some(&Tag::Str.byte()) {
            return Err(Error::KeyType);
        }
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut Serializer { output: &mut self.buf })
    }

    fn end(self) -> Result<()> {
        frame(&mut self.ser.output, &self.buf, Tag::Dict)
    }
}

impl<'a, W: Write> ser::SerializeStruct for MapSerializer<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        frame(&mut self.buf, key.as_bytes(), Tag::Str)?;
        value.serialize(&mut Serializer { output: &mut self.buf })
    }

    fn end(self) -> Result<()> {
        frame(&mut self.ser.output, &self.buf, Tag::Dict)
    }
}

/// Buffers a tuple or struct variant's payload; `end` wraps it in a
/// single-entry dict keyed by the variant name.
pub struct VariantSerializer<'a, W> {
    ser: &'a mut Serializer<W>,
    variant: &'static str,
    buf: Vec<u8>,
    tag: Tag,
}

impl<'a, W: Write> VariantSerializer<'a, W> {
    fn finish(self) -> Result<()> {
        let mut pair = Vec::new();
        frame(&mut pair, self.variant.as_bytes(), Tag::Str)?;
        frame(&mut pair, &self.buf, self.tag)?;
        frame(&mut self.ser.output, &pair, Tag::Dict)
    }
}

impl<'a, W: Write> ser::SerializeTupleVariant for VariantSerializer<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut Serializer { output: &mut self.buf })
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, W: Write> ser::SerializeStructVariant for VariantSerializer<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        frame(&mut self.buf, key.as_bytes(), Tag::Str)?;
        value.serialize(&mut Serializer { output: &mut self.buf })
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::to_bytes;
    use crate::error::Error;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[test]
    fn scalars() {
        assert_eq!(b"5:12345#".as_ref(), to_bytes(&12345).unwrap());
        assert_eq!(b"2:-1#".as_ref(), to_bytes(&-1i8).unwrap());
        assert_eq!(b"4:true!".as_ref(), to_bytes(&true).unwrap());
        assert_eq!(b"4:1.23^".as_ref(), to_bytes(&1.23).unwrap());
        assert_eq!(b"5:Hello,".as_ref(), to_bytes(&"Hello").unwrap());
        assert_eq!(b"1:x,".as_ref(), to_bytes(&'x').unwrap());
        assert_eq!(b"0:~".as_ref(), to_bytes(&()).unwrap());
        assert_eq!(b"0:~".as_ref(), to_bytes(&Option::<i32>::None).unwrap());
        assert_eq!(b"5:12345#".as_ref(), to_bytes(&Some(12345)).unwrap());
    }

    #[test]
    fn int_overflow() {
        assert!(matches!(to_bytes(&(i32::MAX as i64 + 1)), Err(Error::Int)));
        assert!(matches!(to_bytes(&u64::MAX), Err(Error::Int)));
    }

    #[test]
    fn sequences() {
        assert_eq!(b"14:5:Hello,3:123#]".as_ref(), to_bytes(&("Hello", 123)).unwrap());
        assert_eq!(b"0:]".as_ref(), to_bytes(&Vec::<i32>::new()).unwrap());
        assert_eq!(b"12:1:1#1:2#1:3#]".as_ref(), to_bytes(&vec![1, 2, 3]).unwrap());
    }

    #[test]
    fn maps() {
        let map = BTreeMap::from([("a", 1), ("b", 2)]);
        assert_eq!(b"16:1:a,1:1#1:b,1:2#}".as_ref(), to_bytes(&map).unwrap());
        let bad = BTreeMap::from([(7, "x")]);
        assert!(matches!(to_bytes(&bad), Err(Error::KeyType)));
    }

    #[test]
    fn structs() {
        #[derive(Serialize)]
        struct Cat<'a> {
            name: &'a str,
            age: u8,
        }
        let jessica = Cat { name: "Jessica", age: 5 };
        assert_eq!(b"27:4:name,7:Jessica,3:age,1:5#}".as_ref(), to_bytes(&jessica).unwrap());
    }

    #[test]
    fn enums() {
        #[derive(Serialize)]
        enum Species {
            FelisCatus,
            Hybrid(String, String),
            Described { legs: u8 },
        }
        assert_eq!(b"10:FelisCatus,".as_ref(), to_bytes(&Species::FelisCatus).unwrap());
        assert_eq!(
            b"29:6:Hybrid,16:4:lynx,6:domest,]}".as_ref(),
            to_bytes(&Species::Hybrid("lynx".into(), "domest".into())).unwrap()
        );
        assert_eq!(
            b"27:9:Described,11:4:legs,1:4#}}".as_ref(),
            to_bytes(&Species::Described { legs: 4 }).unwrap()
        );
    }

}
