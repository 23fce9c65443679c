//! Value encoding
//!
//! Two modes, chosen by the caller on every call and never recorded server-side:
//!
//! - [`Encoding::Raw`]: the value's own text/byte representation. Strings and
//!   byte buffers go out untouched, numbers and booleans as decimal text.
//!   Compound values are rejected. Counters are always raw.
//! - [`Encoding::Structured`]: DAG-CBOR, a self-describing tagged format that
//!   round-trips any serde record, enum or collection.
//!
//! Reading a key back with a different mode than it was written with is the
//! caller's mistake; nothing on the wire can detect it.

use crate::CodecError;
use bytes::Bytes;
use itoa::Buffer;
use serde::de::{self, DeserializeOwned, Visitor};
use serde::ser::{self, Impossible, Serialize};
use std::str::FromStr;

/// How a value is turned into bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    Raw,
    #[default]
    Structured,
}

/// Encodes and decodes cache values under an [`Encoding`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueCodec;

impl ValueCodec {
    pub fn encode<T: Serialize + ?Sized>(value: &T, encoding: Encoding) -> Result<Bytes, CodecError> {
        match encoding {
            Encoding::Raw => value.serialize(RawSerializer).map(Bytes::from),
            Encoding::Structured => serde_ipld_dagcbor::to_vec(&value)
                .map(Bytes::from)
                .map_err(|e| CodecError::Encode(e.to_string())),
        }
    }

    pub fn decode<T: DeserializeOwned>(bytes: &[u8], encoding: Encoding) -> Result<T, CodecError> {
        match encoding {
            Encoding::Raw => T::deserialize(RawDeserializer::new(bytes)),
            Encoding::Structured => {
                serde_ipld_dagcbor::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
            }
        }
    }
}

/// Serializer for raw mode: scalars only
pub struct RawSerializer;

macro_rules! serialize_integer {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<Vec<u8>, CodecError> {
                Ok(Buffer::new().format(v).as_bytes().to_vec())
            }
        )*
    };
}

impl ser::Serializer for RawSerializer {
    type Ok = Vec<u8>;
    type Error = CodecError;
    type SerializeSeq = Impossible<Vec<u8>, CodecError>;
    type SerializeTuple = Impossible<Vec<u8>, CodecError>;
    type SerializeTupleStruct = Impossible<Vec<u8>, CodecError>;
    type SerializeTupleVariant = Impossible<Vec<u8>, CodecError>;
    type SerializeMap = Impossible<Vec<u8>, CodecError>;
    type SerializeStruct = Impossible<Vec<u8>, CodecError>;
    type SerializeStructVariant = Impossible<Vec<u8>, CodecError>;

    serialize_integer! {
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
    }

    fn serialize_bool(self, v: bool) -> Result<Vec<u8>, CodecError> {
        Ok(if v { b"true".to_vec() } else { b"false".to_vec() })
    }

    fn serialize_f32(self, v: f32) -> Result<Vec<u8>, CodecError> {
        Ok(v.to_string().into_bytes())
    }

    fn serialize_f64(self, v: f64) -> Result<Vec<u8>, CodecError> {
        Ok(v.to_string().into_bytes())
    }

    fn serialize_char(self, v: char) -> Result<Vec<u8>, CodecError> {
        Ok(v.to_string().into_bytes())
    }

    fn serialize_str(self, v: &str) -> Result<Vec<u8>, CodecError> {
        Ok(v.as_bytes().to_vec())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(v.to_vec())
    }

    // None and unit are the empty payload
    fn serialize_none(self) -> Result<Vec<u8>, CodecError> {
        Ok(Vec::new())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Vec<u8>, CodecError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Vec<u8>, CodecError> {
        Ok(Vec::new())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Vec<u8>, CodecError> {
        Ok(Vec::new())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Vec<u8>, CodecError> {
        Ok(variant.as_bytes().to_vec())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Vec<u8>, CodecError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::NotScalar("enum variant with data"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, CodecError> {
        Err(CodecError::NotScalar("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, CodecError> {
        Err(CodecError::NotScalar("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, CodecError> {
        Err(CodecError::NotScalar("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, CodecError> {
        Err(CodecError::NotScalar("tuple variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, CodecError> {
        Err(CodecError::NotScalar("map"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, CodecError> {
        Err(CodecError::NotScalar("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, CodecError> {
        Err(CodecError::NotScalar("struct variant"))
    }
}

/// Deserializer for raw mode
///
/// Numbers and booleans are parsed from (trimmed) text; strings and byte
/// buffers borrow the payload as-is.
pub struct RawDeserializer<'de> {
    input: &'de [u8],
}

impl<'de> RawDeserializer<'de> {
    pub fn new(input: &'de [u8]) -> Self {
        Self { input }
    }

    fn text(&self) -> Result<&'de str, CodecError> {
        std::str::from_utf8(self.input).map_err(|_| CodecError::NotUtf8)
    }

    fn parse<T: FromStr>(&self, what: &'static str) -> Result<T, CodecError> {
        let text = self.text()?.trim();
        text.parse()
            .map_err(|_| CodecError::InvalidScalar(what, text.to_string()))
    }
}

macro_rules! deserialize_scalar {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
                visitor.$visit(self.parse::<$ty>(stringify!($ty))?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for RawDeserializer<'de> {
    type Error = CodecError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        match std::str::from_utf8(self.input) {
            Ok(text) => visitor.visit_borrowed_str(text),
            Err(_) => visitor.visit_borrowed_bytes(self.input),
        }
    }

    deserialize_scalar! {
        deserialize_bool => visit_bool: bool,
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
        deserialize_char => visit_char: char,
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_borrowed_str(self.text()?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_borrowed_str(self.text()?)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_borrowed_bytes(self.input)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_byte_buf(self.input.to_vec())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        if self.input.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_newtype_struct(self)
    }

    // Only unit variants survive raw mode, spelled by name
    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_enum(de::value::StrDeserializer::<CodecError>::new(self.text()?.trim()))
    }

    serde::forward_to_deserialize_any! {
        seq tuple tuple_struct map struct identifier ignored_any
    }
}
