//! Single-byte-tagged number framing shared by every primitive and composite
//! codec. See §4.1 of the format description: byte `w` selects how many
//! more bytes follow and how to interpret them.

use crate::error::{CodecError, Result};

pub const TAG_U16: u8 = 232;
pub const TAG_U32: u8 = 233;
pub const TAG_U64: u8 = 234;
pub const TAG_I8: u8 = 235;
pub const TAG_I16: u8 = 236;
pub const TAG_I32: u8 = 237;
pub const TAG_I64: u8 = 238;
pub const TAG_TIMESTAMP: u8 = 239;
pub const TAG_F32: u8 = 240;
pub const TAG_F64: u8 = 241;
pub const TAG_EMPTY_STRING: u8 = 242;
pub const TAG_STRING: u8 = 243;
pub const TAG_EMPTY_BYTES: u8 = 244;
pub const TAG_BYTES: u8 = 245;
pub const TAG_LIST_0: u8 = 246;
pub const TAG_LIST_LONG: u8 = 250;
pub const TAG_ENUM_VALUE_EXT: u8 = 248;
pub const TAG_ENUM_VALUE_SMALL_BASE: u8 = 250;

/// Reads bytes off the front of a decode buffer, tracking position.
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn peek_u8(&self) -> Result<u8> {
        self.bytes.get(self.pos).copied().ok_or(CodecError::UnexpectedEof)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let b = self.peek_u8()?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::UnexpectedEof);
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.bytes[start..end]
    }
}

/// Structurally parses one encoded value without knowing its declared type,
/// advancing the reader past it, and returns the byte span it occupied.
/// Used to capture (or discard) struct slots and list items the reader's
/// schema doesn't declare.
///
/// Byte 248 is ambiguous in the wire tag table — it means "list of size 2"
/// under §4.3 and "enum value variant, extended number" under §4.6. With no
/// declared type to disambiguate, this function reads it as a two-item
/// list, matching §4.3's literal `246..249` range; see DESIGN.md for the
/// tradeoff this implies for doubly-nested unrecognized enum payloads.
pub fn skip_value<'a>(r: &mut Reader<'a>) -> Result<&'a [u8]> {
    let start = r.position();
    skip_value_inner(r)?;
    let end = r.position();
    Ok(r.slice(start, end))
}

fn skip_value_inner(r: &mut Reader) -> Result<()> {
    let w = r.read_u8()?;
    match w {
        0..=231 | TAG_EMPTY_STRING | TAG_EMPTY_BYTES | TAG_LIST_0 => {}
        TAG_U16 | TAG_I16 => {
            r.read_bytes(2)?;
        }
        TAG_U32 | TAG_I32 | TAG_F32 => {
            r.read_bytes(4)?;
        }
        TAG_U64 | TAG_I64 | TAG_TIMESTAMP | TAG_F64 => {
            r.read_bytes(8)?;
        }
        TAG_I8 => {
            r.read_bytes(1)?;
        }
        TAG_STRING | TAG_BYTES => {
            let len = decode_length(r)? as usize;
            r.read_bytes(len)?;
        }
        247 => skip_value_inner(r)?,
        TAG_ENUM_VALUE_EXT => {
            skip_value_inner(r)?;
            skip_value_inner(r)?;
        }
        249 => {
            for _ in 0..3 {
                skip_value_inner(r)?;
            }
        }
        TAG_LIST_LONG => {
            let n = decode_length(r)? as usize;
            for _ in 0..n {
                skip_value_inner(r)?;
            }
        }
        251..=254 => skip_value_inner(r)?,
        other => return Err(CodecError::UnknownTag(other)),
    }
    Ok(())
}

/// Encodes a non-negative integer using the narrowest tag in `0..=234`.
/// Used for length prefixes, struct slot counts, and enum variant numbers.
pub fn encode_length(out: &mut Vec<u8>, value: u64) {
    if value <= 231 {
        out.push(value as u8);
    } else if value <= u16::MAX as u64 {
        out.push(TAG_U16);
        out.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= u32::MAX as u64 {
        out.push(TAG_U32);
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.push(TAG_U64);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Decodes a value previously written by [`encode_length`], or any
/// non-negative-integer tag (`0..=234`). Rejects signed-extension and
/// composite-framing tags.
pub fn decode_length(r: &mut Reader) -> Result<u64> {
    let w = r.read_u8()?;
    match w {
        0..=231 => Ok(w as u64),
        TAG_U16 => Ok(u16::from_le_bytes(r.read_bytes(2)?.try_into().unwrap()) as u64),
        TAG_U32 => Ok(u32::from_le_bytes(r.read_bytes(4)?.try_into().unwrap()) as u64),
        TAG_U64 => Ok(u64::from_le_bytes(r.read_bytes(8)?.try_into().unwrap())),
        other => Err(CodecError::UnknownTag(other)),
    }
}

/// Encodes a signed 64-bit integer choosing the narrowest tag that
/// losslessly represents it (§4.1). Shared by `int32` and `int64`.
pub fn encode_signed(out: &mut Vec<u8>, value: i64) {
    if value >= 0 {
        encode_length(out, value as u64);
        return;
    }
    if value >= -256 {
        out.push(TAG_I8);
        out.push((value + 256) as u8);
    } else if value >= -65536 {
        out.push(TAG_I16);
        out.extend_from_slice(&((value + 65536) as u16).to_le_bytes());
    } else if value >= i32::MIN as i64 {
        out.push(TAG_I32);
        out.extend_from_slice(&(value as i32).to_le_bytes());
    } else {
        out.push(TAG_I64);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Decodes a signed integer written by [`encode_signed`]. Also accepts tag
/// 239 (reserved for timestamps) interpreting it as a plain `i64`, per the
/// compatibility wart documented in the format notes: decoders of a numeric
/// context must tolerate the timestamp tag appearing there.
pub fn decode_signed(r: &mut Reader) -> Result<i64> {
    let w = r.read_u8()?;
    match w {
        0..=231 => Ok(w as i64),
        TAG_U16 => Ok(u16::from_le_bytes(r.read_bytes(2)?.try_into().unwrap()) as i64),
        TAG_U32 => Ok(u32::from_le_bytes(r.read_bytes(4)?.try_into().unwrap()) as i64),
        TAG_U64 => Ok(u64::from_le_bytes(r.read_bytes(8)?.try_into().unwrap()) as i64),
        TAG_I8 => Ok(r.read_u8()? as i64 - 256),
        TAG_I16 => {
            let s = u16::from_le_bytes(r.read_bytes(2)?.try_into().unwrap());
            Ok(s as i64 - 65536)
        }
        TAG_I32 => Ok(i32::from_le_bytes(r.read_bytes(4)?.try_into().unwrap()) as i64),
        TAG_I64 | TAG_TIMESTAMP => Ok(i64::from_le_bytes(r.read_bytes(8)?.try_into().unwrap())),
        other => Err(CodecError::UnknownTag(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_signed(v: i64) -> i64 {
        let mut buf = Vec::new();
        encode_signed(&mut buf, v);
        let mut r = Reader::new(&buf);
        decode_signed(&mut r).unwrap()
    }

    #[test]
    fn small_nonneg_is_single_byte() {
        let mut buf = Vec::new();
        encode_signed(&mut buf, 5);
        assert_eq!(buf, vec![5]);
    }

    #[test]
    fn negative_257_uses_tag_236() {
        let mut buf = Vec::new();
        encode_signed(&mut buf, -257);
        assert_eq!(buf[0], TAG_I16);
        assert_eq!(&buf[1..], &65279u16.to_le_bytes());
        assert_eq!(roundtrip_signed(-257), -257);
    }

    #[test]
    fn signed_roundtrips_across_ranges() {
        for v in [0, 1, 231, 232, 65535, 65536, -1, -256, -257, -65536, -65537, i32::MIN as i64, i64::MIN, i64::MAX] {
            assert_eq!(roundtrip_signed(v), v);
        }
    }

    #[test]
    fn length_chooses_narrowest_tag() {
        let mut buf = Vec::new();
        encode_length(&mut buf, 231);
        assert_eq!(buf, vec![231]);
        let mut buf = Vec::new();
        encode_length(&mut buf, 232);
        assert_eq!(buf[0], TAG_U16);
    }

    #[test]
    fn decoder_accepts_timestamp_tag_in_signed_context() {
        let mut buf = vec![TAG_TIMESTAMP];
        buf.extend_from_slice(&42i64.to_le_bytes());
        let mut r = Reader::new(&buf);
        assert_eq!(decode_signed(&mut r).unwrap(), 42);
    }
}
