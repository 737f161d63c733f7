//! Framing for the nine primitive kinds (§4.2): `bool`, `int32`, `int64`,
//! `uint64`, `float32`, `float64`, `string`, `bytes`, `timestamp`.
//!
//! Each kind gets a pair of free functions, `encode_x`/`decode_x`, plus
//! `x_to_json`/`x_from_json`. Struct and enum codecs call these directly
//! for their scalar fields instead of going through a dynamic `Value`.

use base64::Engine;

use crate::error::{CodecError, Result};
use crate::json::{JsonFlavor, JsonValue};
use crate::varint::{self, Reader, TAG_BYTES, TAG_EMPTY_BYTES, TAG_EMPTY_STRING, TAG_F32, TAG_F64, TAG_STRING, TAG_TIMESTAMP};

/// Milliseconds from the epoch, clamped to ±8,640,000,000,000,000 on both
/// encode and decode (the range `Date` can represent in JavaScript, which
/// this format's JSON form inherited).
pub const TIMESTAMP_MIN_MILLIS: i64 = -8_640_000_000_000_000;
pub const TIMESTAMP_MAX_MILLIS: i64 = 8_640_000_000_000_000;

pub fn clamp_millis(millis: i64) -> i64 {
    millis.clamp(TIMESTAMP_MIN_MILLIS, TIMESTAMP_MAX_MILLIS)
}

// --- bool ---

pub fn encode_bool(out: &mut Vec<u8>, v: bool) {
    out.push(if v { 1 } else { 0 });
}

pub fn decode_bool(r: &mut Reader) -> Result<bool> {
    match r.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(CodecError::UnknownTag(other)),
    }
}

pub fn bool_to_json(v: bool, flavor: JsonFlavor) -> JsonValue {
    match flavor {
        JsonFlavor::Dense => JsonValue::from(if v { 1 } else { 0 }),
        JsonFlavor::Readable => JsonValue::from(v),
    }
}

pub fn bool_from_json(v: &JsonValue) -> Result<bool> {
    match v {
        JsonValue::Bool(b) => Ok(*b),
        JsonValue::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
        other => Err(schema_mismatch("bool", other)),
    }
}

// --- int32 / int64 ---

pub fn encode_int32(out: &mut Vec<u8>, v: i32) {
    varint::encode_signed(out, v as i64);
}

pub fn decode_int32(r: &mut Reader) -> Result<i32> {
    let v = varint::decode_signed(r)?;
    i32::try_from(v).map_err(|_| CodecError::NumberOutOfRange(format!("{} does not fit in int32", v)))
}

pub fn int32_to_json(v: i32) -> JsonValue {
    JsonValue::from(v)
}

pub fn int32_from_json(v: &JsonValue) -> Result<i32> {
    match v {
        JsonValue::Number(n) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| CodecError::NumberOutOfRange(format!("{} does not fit in int32", n))),
        other => Err(schema_mismatch("int32", other)),
    }
}

pub fn encode_int64(out: &mut Vec<u8>, v: i64) {
    varint::encode_signed(out, v);
}

pub fn decode_int64(r: &mut Reader) -> Result<i64> {
    varint::decode_signed(r)
}

/// ±2^53: the largest magnitude a JSON number round-trips exactly through
/// an IEEE-754 double without precision loss.
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_992;

pub fn int64_to_json(v: i64) -> JsonValue {
    if v.abs() <= MAX_SAFE_INTEGER {
        JsonValue::from(v)
    } else {
        JsonValue::from(v.to_string())
    }
}

pub fn int64_from_json(v: &JsonValue) -> Result<i64> {
    match v {
        JsonValue::Number(n) => n
            .as_i64()
            .ok_or_else(|| CodecError::NumberOutOfRange(format!("{} does not fit in int64", n))),
        JsonValue::String(s) => s
            .parse::<i64>()
            .map_err(|_| CodecError::NumberOutOfRange(format!("{:?} is not a valid int64", s))),
        other => Err(schema_mismatch("int64", other)),
    }
}

// --- uint64 ---

pub fn encode_uint64(out: &mut Vec<u8>, v: u64) {
    varint::encode_length(out, v);
}

pub fn decode_uint64(r: &mut Reader) -> Result<u64> {
    // Non-negative contexts must also tolerate the signed-extension tags
    // when the value happens to exceed i64 headroom on a round trip, so we
    // go through the permissive signed decoder and reinterpret the bits.
    let w = r.peek_u8()?;
    if w <= 234 {
        varint::decode_length(r)
    } else {
        Ok(varint::decode_signed(r)? as u64)
    }
}

pub fn uint64_to_json(v: u64) -> JsonValue {
    if v <= MAX_SAFE_INTEGER as u64 {
        JsonValue::from(v)
    } else {
        JsonValue::from(v.to_string())
    }
}

pub fn uint64_from_json(v: &JsonValue) -> Result<u64> {
    match v {
        JsonValue::Number(n) => n
            .as_u64()
            .ok_or_else(|| CodecError::NumberOutOfRange(format!("{} does not fit in uint64", n))),
        JsonValue::String(s) => s
            .parse::<u64>()
            .map_err(|_| CodecError::NumberOutOfRange(format!("{:?} is not a valid uint64", s))),
        other => Err(schema_mismatch("uint64", other)),
    }
}

// --- float32 / float64 ---

pub fn encode_float32(out: &mut Vec<u8>, v: f32) {
    if v == 0.0 && v.is_sign_positive() {
        out.push(0);
    } else {
        out.push(TAG_F32);
        out.extend_from_slice(&v.to_bits().to_le_bytes());
    }
}

pub fn decode_float32(r: &mut Reader) -> Result<f32> {
    match r.read_u8()? {
        0 => Ok(0.0),
        TAG_F32 => Ok(f32::from_bits(u32::from_le_bytes(r.read_bytes(4)?.try_into().unwrap()))),
        other => Err(CodecError::UnknownTag(other)),
    }
}

pub fn encode_float64(out: &mut Vec<u8>, v: f64) {
    if v == 0.0 && v.is_sign_positive() {
        out.push(0);
    } else {
        out.push(TAG_F64);
        out.extend_from_slice(&v.to_bits().to_le_bytes());
    }
}

pub fn decode_float64(r: &mut Reader) -> Result<f64> {
    match r.read_u8()? {
        0 => Ok(0.0),
        TAG_F64 => Ok(f64::from_bits(u64::from_le_bytes(r.read_bytes(8)?.try_into().unwrap()))),
        other => Err(CodecError::UnknownTag(other)),
    }
}

pub fn float_to_json(v: f64) -> JsonValue {
    if v.is_finite() {
        serde_json::Number::from_f64(v).map(JsonValue::Number).unwrap_or(JsonValue::Null)
    } else if v.is_nan() {
        JsonValue::from("NaN")
    } else if v > 0.0 {
        JsonValue::from("Infinity")
    } else {
        JsonValue::from("-Infinity")
    }
}

pub fn float_from_json(v: &JsonValue) -> Result<f64> {
    match v {
        JsonValue::Number(n) => Ok(n.as_f64().unwrap_or(0.0)),
        JsonValue::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => other
                .parse()
                .map_err(|_| CodecError::NumberOutOfRange(format!("{:?} is not a valid float", other))),
        },
        other => Err(schema_mismatch("float", other)),
    }
}

// --- string ---

pub fn encode_string(out: &mut Vec<u8>, v: &str) {
    if v.is_empty() {
        out.push(TAG_EMPTY_STRING);
    } else {
        out.push(TAG_STRING);
        varint::encode_length(out, v.len() as u64);
        out.extend_from_slice(v.as_bytes());
    }
}

pub fn decode_string(r: &mut Reader) -> Result<String> {
    match r.read_u8()? {
        TAG_EMPTY_STRING => Ok(String::new()),
        TAG_STRING => {
            let len = varint::decode_length(r)? as usize;
            let bytes = r.read_bytes(len)?;
            Ok(std::str::from_utf8(bytes)?.to_owned())
        }
        other => Err(CodecError::UnknownTag(other)),
    }
}

pub fn string_to_json(v: &str) -> JsonValue {
    JsonValue::from(v)
}

pub fn string_from_json(v: &JsonValue) -> Result<String> {
    match v {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) if n.as_i64() == Some(0) => Ok(String::new()),
        other => Err(schema_mismatch("string", other)),
    }
}

// --- bytes ---

pub fn encode_bytes(out: &mut Vec<u8>, v: &[u8]) {
    if v.is_empty() {
        out.push(TAG_EMPTY_BYTES);
    } else {
        out.push(TAG_BYTES);
        varint::encode_length(out, v.len() as u64);
        out.extend_from_slice(v);
    }
}

pub fn decode_bytes(r: &mut Reader) -> Result<Vec<u8>> {
    match r.read_u8()? {
        TAG_EMPTY_BYTES => Ok(Vec::new()),
        TAG_BYTES => {
            let len = varint::decode_length(r)? as usize;
            Ok(r.read_bytes(len)?.to_vec())
        }
        other => Err(CodecError::UnknownTag(other)),
    }
}

pub fn bytes_to_json(v: &[u8], flavor: JsonFlavor) -> JsonValue {
    let b64 = base64::engine::general_purpose::STANDARD.encode(v);
    match flavor {
        JsonFlavor::Dense => JsonValue::from(b64),
        JsonFlavor::Readable => serde_json::json!({ "base64": b64, "size": v.len() }),
    }
}

pub fn bytes_from_json(v: &JsonValue) -> Result<Vec<u8>> {
    match v {
        JsonValue::Number(n) if n.as_i64() == Some(0) => Ok(Vec::new()),
        JsonValue::String(s) => base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(|e| CodecError::SchemaMismatch { expected: "base64 bytes", found: e.to_string() }),
        JsonValue::Object(map) => {
            let b64 = map
                .get("base64")
                .and_then(|v| v.as_str())
                .ok_or_else(|| schema_mismatch("bytes", v))?;
            base64::engine::general_purpose::STANDARD
                .decode(b64)
                .map_err(|e| CodecError::SchemaMismatch { expected: "base64 bytes", found: e.to_string() })
        }
        other => Err(schema_mismatch("bytes", other)),
    }
}

// --- timestamp ---

pub fn encode_timestamp_millis(out: &mut Vec<u8>, millis: i64) {
    let millis = clamp_millis(millis);
    if millis == 0 {
        out.push(0);
    } else {
        out.push(TAG_TIMESTAMP);
        out.extend_from_slice(&millis.to_le_bytes());
    }
}

pub fn decode_timestamp_millis(r: &mut Reader) -> Result<i64> {
    match r.read_u8()? {
        0 => Ok(0),
        TAG_TIMESTAMP => Ok(clamp_millis(i64::from_le_bytes(r.read_bytes(8)?.try_into().unwrap()))),
        other => Err(CodecError::UnknownTag(other)),
    }
}

pub fn timestamp_to_json(millis: i64, flavor: JsonFlavor) -> JsonValue {
    let millis = clamp_millis(millis);
    match flavor {
        JsonFlavor::Dense => JsonValue::from(millis),
        JsonFlavor::Readable => serde_json::json!({
            "unix_millis": millis,
            "formatted": format_iso8601(millis),
        }),
    }
}

pub fn timestamp_from_json(v: &JsonValue) -> Result<i64> {
    match v {
        JsonValue::Number(n) => Ok(clamp_millis(n.as_i64().unwrap_or(0))),
        JsonValue::Object(map) => {
            let millis = map
                .get("unix_millis")
                .and_then(|v| v.as_i64())
                .ok_or_else(|| schema_mismatch("timestamp", v))?;
            Ok(clamp_millis(millis))
        }
        other => Err(schema_mismatch("timestamp", other)),
    }
}

/// Formats Unix milliseconds as an ISO-8601 UTC timestamp without pulling in
/// a date/time crate: this format only needs millisecond-precision calendar
/// math, not time zones or parsing.
fn format_iso8601(millis: i64) -> String {
    let days = millis.div_euclid(86_400_000);
    let ms_of_day = millis.rem_euclid(86_400_000);
    let (year, month, day) = civil_from_days(days);
    let hour = ms_of_day / 3_600_000;
    let minute = (ms_of_day / 60_000) % 60;
    let second = (ms_of_day / 1000) % 60;
    let ms = ms_of_day % 1000;
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year, month, day, hour, minute, second, ms
    )
}

/// Howard Hinnant's `civil_from_days` algorithm (public domain), converting
/// a day count since the Unix epoch into a proleptic-Gregorian (year, month,
/// day) triple. Works for the entire clamped timestamp range.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

fn schema_mismatch(expected: &'static str, found: &JsonValue) -> CodecError {
    CodecError::SchemaMismatch { expected, found: found.to_string() }
}
