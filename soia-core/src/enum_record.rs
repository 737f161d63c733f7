//! Variant-tag enum codec (§4.6). Constant variants share the plain number
//! space (§4.1); value variants get a dedicated tag so a reader can always
//! tell a bare number from a number-with-payload.

use crate::error::{CodecError, Result};
use crate::json::{JsonFlavor, JsonValue};
use crate::unrecognized::Unrecognized;
use crate::varint::{self, skip_value, Reader, TAG_ENUM_VALUE_EXT};

/// Bridges a concrete generated enum type to the generic variant-tag
/// driver. Variant number `0` is reserved for "unknown variant" and must
/// always resolve via [`EnumValue::constant`].
pub trait EnumValue: Sized {
    fn variant_number(&self) -> i32;
    fn is_constant(&self) -> bool;
    fn encode_payload(&self, out: &mut Vec<u8>);
    fn payload_to_json(&self, flavor: JsonFlavor) -> Option<JsonValue>;

    /// Variant numbers this schema once declared and has since retired.
    /// A removed number always decodes to the default (unknown) variant
    /// and is never captured into `Unrecognized`, regardless of
    /// `keep_unrecognized` — unlike a number this schema has never heard
    /// of, which is a genuine forward-compat value worth round-tripping.
    fn removed_numbers() -> &'static [i32] {
        &[]
    }

    fn variant_name(number: i32) -> Option<&'static str>;
    fn name_to_number(name: &str) -> Option<i32>;
    fn constant(number: i32) -> Option<Self>;
    fn has_value_variant(number: i32) -> bool;
    fn decode_value(number: i32, r: &mut Reader) -> Result<Self>;
    fn decode_value_json(number: i32, v: &JsonValue) -> Result<Self>;

    fn unknown(u: Unrecognized) -> Self;
    fn unrecognized(&self) -> Option<&Unrecognized>;
}

pub fn encode_enum<E: EnumValue>(value: &E, out: &mut Vec<u8>) {
    if let Some(u) = value.unrecognized() {
        if let Some(bytes) = &u.bytes {
            out.extend_from_slice(bytes);
            return;
        }
    }
    let n = value.variant_number();
    if value.is_constant() {
        varint::encode_length(out, n as u64);
        return;
    }
    match n {
        1..=4 => out.push(250 + n as u8),
        _ => {
            out.push(TAG_ENUM_VALUE_EXT);
            varint::encode_length(out, n as u64);
        }
    }
    value.encode_payload(out);
}

pub fn decode_enum<E: EnumValue>(r: &mut Reader, keep_unrecognized: bool) -> Result<E> {
    let start = r.position();
    let w = r.peek_u8()?;
    if w <= 234 {
        let n = varint::decode_length(r)? as i32;
        return Ok(E::constant(n).unwrap_or_else(|| {
            if E::removed_numbers().contains(&n) {
                E::unknown(Unrecognized::default())
            } else {
                capture_unknown::<E>(r, start, keep_unrecognized)
            }
        }));
    }
    match w {
        251..=254 => {
            r.read_u8()?;
            decode_value_variant::<E>((w - 250) as i32, r, start, keep_unrecognized)
        }
        TAG_ENUM_VALUE_EXT => {
            r.read_u8()?;
            let n = varint::decode_length(r)? as i32;
            decode_value_variant::<E>(n, r, start, keep_unrecognized)
        }
        other => Err(CodecError::UnknownTag(other)),
    }
}

fn decode_value_variant<E: EnumValue>(n: i32, r: &mut Reader, start: usize, keep_unrecognized: bool) -> Result<E> {
    if E::has_value_variant(n) {
        E::decode_value(n, r)
    } else {
        skip_value(r)?;
        if E::removed_numbers().contains(&n) {
            Ok(E::unknown(Unrecognized::default()))
        } else {
            Ok(capture_unknown::<E>(r, start, keep_unrecognized))
        }
    }
}

fn capture_unknown<E: EnumValue>(r: &Reader, start: usize, keep_unrecognized: bool) -> E {
    if keep_unrecognized {
        E::unknown(Unrecognized::from_bytes(r.slice(start, r.position()).to_vec()))
    } else {
        E::unknown(Unrecognized::default())
    }
}

pub fn enum_to_json<E: EnumValue>(value: &E, flavor: JsonFlavor) -> JsonValue {
    if let Some(u) = value.unrecognized() {
        if let Some(j) = &u.json {
            return j.clone();
        }
    }
    let n = value.variant_number();
    match flavor {
        JsonFlavor::Dense => {
            if value.is_constant() {
                JsonValue::from(n)
            } else {
                let payload = value.payload_to_json(flavor).unwrap_or(JsonValue::Null);
                JsonValue::Array(vec![JsonValue::from(n), payload])
            }
        }
        JsonFlavor::Readable => {
            let name = E::variant_name(n).unwrap_or("?");
            if value.is_constant() {
                serde_json::json!({ "kind": name })
            } else {
                let payload = value.payload_to_json(flavor).unwrap_or(JsonValue::Null);
                serde_json::json!({ "kind": name, "value": payload })
            }
        }
    }
}

pub fn enum_from_json<E: EnumValue>(v: &JsonValue, keep_unrecognized: bool) -> Result<E> {
    match v {
        JsonValue::Number(num) => {
            let n = num
                .as_i64()
                .ok_or_else(|| CodecError::SchemaMismatch { expected: "enum variant number", found: v.to_string() })?
                as i32;
            Ok(E::constant(n).unwrap_or_else(|| {
                if E::removed_numbers().contains(&n) {
                    E::unknown(Unrecognized::default())
                } else {
                    unknown_json::<E>(v, keep_unrecognized)
                }
            }))
        }
        JsonValue::Array(elems) if !elems.is_empty() => {
            let n = elems[0]
                .as_i64()
                .ok_or_else(|| CodecError::SchemaMismatch { expected: "enum variant number", found: v.to_string() })?
                as i32;
            if E::has_value_variant(n) {
                E::decode_value_json(n, elems.get(1).unwrap_or(&JsonValue::Null))
            } else if E::removed_numbers().contains(&n) {
                Ok(E::unknown(Unrecognized::default()))
            } else {
                Ok(unknown_json::<E>(v, keep_unrecognized))
            }
        }
        JsonValue::Object(map) => {
            let kind = map.get("kind").and_then(JsonValue::as_str).ok_or_else(|| CodecError::SchemaMismatch {
                expected: "enum object with 'kind'",
                found: v.to_string(),
            })?;
            if let Some(payload) = map.get("value") {
                match E::name_to_number(kind) {
                    Some(n) if E::has_value_variant(n) => E::decode_value_json(n, payload),
                    _ => Ok(unknown_json::<E>(v, keep_unrecognized)),
                }
            } else {
                match E::name_to_number(kind).and_then(E::constant) {
                    Some(value) => Ok(value),
                    None => Ok(unknown_json::<E>(v, keep_unrecognized)),
                }
            }
        }
        other => Err(CodecError::SchemaMismatch { expected: "enum", found: other.to_string() }),
    }
}

fn unknown_json<E: EnumValue>(v: &JsonValue, keep_unrecognized: bool) -> E {
    if keep_unrecognized {
        E::unknown(Unrecognized::from_json(v.clone()))
    } else {
        E::unknown(Unrecognized::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive;
    use hex_literal::hex;

    #[derive(Debug, PartialEq)]
    enum Color {
        Red,
        Green,
        Tiny(i32),
        Custom(String),
        Unknown(Unrecognized),
    }

    impl EnumValue for Color {
        fn variant_number(&self) -> i32 {
            match self {
                Color::Red => 1,
                Color::Green => 2,
                Color::Tiny(_) => 3,
                Color::Custom(_) => 10,
                Color::Unknown(_) => 0,
            }
        }

        fn is_constant(&self) -> bool {
            matches!(self, Color::Red | Color::Green | Color::Unknown(_))
        }

        fn encode_payload(&self, out: &mut Vec<u8>) {
            match self {
                Color::Tiny(n) => primitive::encode_int32(out, *n),
                Color::Custom(s) => primitive::encode_string(out, s),
                _ => {}
            }
        }

        fn payload_to_json(&self, _flavor: JsonFlavor) -> Option<JsonValue> {
            match self {
                Color::Tiny(n) => Some(primitive::int32_to_json(*n)),
                Color::Custom(s) => Some(primitive::string_to_json(s)),
                _ => None,
            }
        }

        fn variant_name(number: i32) -> Option<&'static str> {
            match number {
                1 => Some("red"),
                2 => Some("green"),
                3 => Some("tiny"),
                10 => Some("custom"),
                _ => None,
            }
        }

        fn name_to_number(name: &str) -> Option<i32> {
            match name {
                "red" => Some(1),
                "green" => Some(2),
                "tiny" => Some(3),
                "custom" => Some(10),
                _ => None,
            }
        }

        fn constant(number: i32) -> Option<Self> {
            match number {
                0 => Some(Color::Unknown(Unrecognized::default())),
                1 => Some(Color::Red),
                2 => Some(Color::Green),
                _ => None,
            }
        }

        fn has_value_variant(number: i32) -> bool {
            number == 3 || number == 10
        }

        fn removed_numbers() -> &'static [i32] {
            &[6]
        }

        fn decode_value(number: i32, r: &mut Reader) -> Result<Self> {
            match number {
                3 => Ok(Color::Tiny(primitive::decode_int32(r)?)),
                10 => Ok(Color::Custom(primitive::decode_string(r)?)),
                _ => unreachable!(),
            }
        }

        fn decode_value_json(number: i32, v: &JsonValue) -> Result<Self> {
            match number {
                3 => Ok(Color::Tiny(primitive::int32_from_json(v)?)),
                10 => Ok(Color::Custom(primitive::string_from_json(v)?)),
                _ => unreachable!(),
            }
        }

        fn unknown(u: Unrecognized) -> Self {
            Color::Unknown(u)
        }

        fn unrecognized(&self) -> Option<&Unrecognized> {
            match self {
                Color::Unknown(u) => Some(u),
                _ => None,
            }
        }
    }

    #[test]
    fn constant_variant_is_bare_number() {
        let mut out = Vec::new();
        encode_enum(&Color::Red, &mut out);
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn small_value_variant_uses_251_254_range() {
        let mut out = Vec::new();
        encode_enum(&Color::Tiny(9), &mut out);
        assert_eq!(out[0], 253); // 250 + 3
        let mut r = Reader::new(&out);
        let decoded: Color = decode_enum(&mut r, true).unwrap();
        assert_eq!(decoded, Color::Tiny(9));
    }

    #[test]
    fn extended_value_variant_uses_tag_248() {
        let mut out = Vec::new();
        encode_enum(&Color::Custom("hi".to_string()), &mut out);
        assert_eq!(out[0], TAG_ENUM_VALUE_EXT);
        let mut r = Reader::new(&out);
        let decoded: Color = decode_enum(&mut r, true).unwrap();
        assert_eq!(decoded, Color::Custom("hi".to_string()));
    }

    #[test]
    fn unrecognized_constant_roundtrips_verbatim() {
        let bytes = hex!("e8 05 00").to_vec(); // TAG_U16-framed constant number 5, unknown to this schema
        let mut r = Reader::new(&bytes);
        let decoded: Color = decode_enum(&mut r, true).unwrap();
        assert_eq!(decoded, Color::Unknown(Unrecognized::from_bytes(bytes.clone())));
        let mut re_encoded = Vec::new();
        encode_enum(&decoded, &mut re_encoded);
        assert_eq!(re_encoded, bytes);
    }

    #[test]
    fn removed_constant_collapses_to_default_even_with_keep_unrecognized() {
        let bytes = vec![6u8]; // constant variant 6, retired in this schema
        let mut r = Reader::new(&bytes);
        let decoded: Color = decode_enum(&mut r, true).unwrap();
        assert_eq!(decoded, Color::Unknown(Unrecognized::default()));

        let json = JsonValue::from(6);
        let decoded_json: Color = enum_from_json(&json, true).unwrap();
        assert_eq!(decoded_json, Color::Unknown(Unrecognized::default()));
    }

    #[test]
    fn readable_json_roundtrips_value_variant() {
        let value = Color::Custom("hi".to_string());
        let json = enum_to_json(&value, JsonFlavor::Readable);
        assert_eq!(json, serde_json::json!({"kind": "custom", "value": "hi"}));
        let decoded: Color = enum_from_json(&json, true).unwrap();
        assert_eq!(decoded, value);
    }
}
