//! Nullable wrapper (§4.4). Absent encodes as the bare default byte `0`;
//! present defers entirely to the inner codec.

use crate::error::Result;
use crate::json::JsonValue;
use crate::varint::Reader;

pub fn encode_optional<T>(out: &mut Vec<u8>, v: &Option<T>, mut encode_inner: impl FnMut(&mut Vec<u8>, &T)) {
    match v {
        None => out.push(0),
        Some(inner) => encode_inner(out, inner),
    }
}

/// Decodes an optional value. `decode_inner` is given the reader positioned
/// right after the peeked tag byte has been confirmed non-zero, so it must
/// decode starting from that same byte (it re-reads the tag itself).
pub fn decode_optional<T>(r: &mut Reader, mut decode_inner: impl FnMut(&mut Reader) -> Result<T>) -> Result<Option<T>> {
    if r.peek_u8()? == 0 {
        r.read_u8()?;
        Ok(None)
    } else {
        Ok(Some(decode_inner(r)?))
    }
}

pub fn optional_to_json<T>(v: &Option<T>, mut inner_to_json: impl FnMut(&T) -> JsonValue) -> JsonValue {
    match v {
        None => JsonValue::Null,
        Some(inner) => inner_to_json(inner),
    }
}

pub fn optional_from_json<T>(v: &JsonValue, mut inner_from_json: impl FnMut(&JsonValue) -> Result<T>) -> Result<Option<T>> {
    if v.is_null() {
        Ok(None)
    } else {
        Ok(Some(inner_from_json(v)?))
    }
}
