//! Top-level `Serializer<T>` (§6 "Entry points"): a bundle of function
//! pointers rather than a trait object, so generated record types with no
//! inherent serialization trait of their own can still hold a `'static`
//! serializer and hand it to callers that only know `T`.

use crate::error::{CodecError, Result};
use crate::json::{JsonFlavor, JsonValue};
use crate::varint::Reader;

/// Magic bytes this implementation emits at the front of every wire
/// message (§6.1).
pub const WIRE_MAGIC: &[u8; 4] = b"skir";
/// Magic bytes still accepted on decode, for interop with writers using
/// the format's original identifier.
pub const LEGACY_WIRE_MAGIC: &[u8; 4] = b"soia";

pub struct Serializer<T> {
    pub descriptor: fn() -> crate::descriptor::Descriptor,
    pub encode: fn(&T, &mut Vec<u8>),
    pub decode: fn(&mut Reader, bool) -> Result<T>,
    pub to_json: fn(&T, JsonFlavor) -> JsonValue,
    pub from_json: fn(&JsonValue, bool) -> Result<T>,
    pub is_default: fn(&T) -> bool,
    pub default: fn() -> T,
}

impl<T> Serializer<T> {
    pub fn to_bytes(&self, value: &T) -> Vec<u8> {
        self.to_bytes_with_magic(value, WIRE_MAGIC)
    }

    /// Like [`Serializer::to_bytes`] but emits a caller-chosen magic prefix,
    /// for writers configured to identify themselves as `soia` instead of
    /// this implementation's own `skir` default (both are accepted on
    /// decode regardless of which one was emitted).
    pub fn to_bytes_with_magic(&self, value: &T, magic: &[u8; 4]) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(magic);
        (self.encode)(value, &mut out);
        out
    }

    pub fn from_bytes(&self, bytes: &[u8]) -> Result<T> {
        if bytes.len() < 4 {
            return Err(CodecError::UnexpectedEof);
        }
        let (magic, rest) = bytes.split_at(4);
        if magic != WIRE_MAGIC && magic != LEGACY_WIRE_MAGIC {
            let mut arr = [0u8; 4];
            arr.copy_from_slice(magic);
            return Err(CodecError::BadMagic(arr));
        }
        let mut r = Reader::new(rest);
        let value = (self.decode)(&mut r, true)?;
        if !r.is_empty() {
            return Err(CodecError::TrailingBytes(r.remaining()));
        }
        Ok(value)
    }

    pub fn to_json_code(&self, value: &T, flavor: JsonFlavor) -> String {
        (self.to_json)(value, flavor).to_string()
    }

    pub fn from_json_code(&self, code: &str) -> Result<T> {
        let v: JsonValue = serde_json::from_str(code)?;
        (self.from_json)(&v, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Descriptor, PrimitiveKind};
    use crate::primitive;

    fn int32_serializer() -> Serializer<i32> {
        Serializer {
            descriptor: || Descriptor::Primitive(PrimitiveKind::Int32),
            encode: |v, out| primitive::encode_int32(out, *v),
            decode: |r, _keep| primitive::decode_int32(r),
            to_json: |v, _flavor| primitive::int32_to_json(*v),
            from_json: |v, _keep| primitive::int32_from_json(v),
            is_default: |v| *v == 0,
            default: || 0,
        }
    }

    #[test]
    fn wire_roundtrip_uses_skir_magic() {
        let s = int32_serializer();
        let bytes = s.to_bytes(&42);
        assert_eq!(&bytes[..4], WIRE_MAGIC);
        assert_eq!(s.from_bytes(&bytes).unwrap(), 42);
    }

    #[test]
    fn decode_accepts_legacy_soia_magic() {
        let s = int32_serializer();
        let mut bytes = s.to_bytes(&42);
        bytes[..4].copy_from_slice(LEGACY_WIRE_MAGIC);
        assert_eq!(s.from_bytes(&bytes).unwrap(), 42);
    }

    #[test]
    fn json_roundtrip() {
        let s = int32_serializer();
        let code = s.to_json_code(&7, JsonFlavor::Dense);
        assert_eq!(s.from_json_code(&code).unwrap(), 7);
    }
}
