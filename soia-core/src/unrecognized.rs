//! Opaque carrier for wire/JSON data a reader didn't understand but must
//! reproduce verbatim on a same-format re-encode (§3 "Unrecognized carrier",
//! §8 properties 6/7).

use crate::json::JsonValue;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unrecognized {
    /// Raw wire bytes captured from a binary decode, re-emitted only when
    /// the value is re-encoded to binary.
    pub bytes: Option<Vec<u8>>,
    /// The raw JSON element captured from a JSON decode, re-emitted only
    /// when the value is re-encoded to the same JSON flavor it came from.
    pub json: Option<JsonValue>,
    /// For a struct's unrecognized tail only: how many trailing slots
    /// `bytes` represents, so the slot-vector framing can size itself
    /// correctly when re-encoding. Always 0 for enums and leaf values.
    pub tail_count: usize,
}

impl Unrecognized {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_none() && self.json.is_none()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Unrecognized { bytes: Some(bytes), json: None, tail_count: 0 }
    }

    pub fn from_json(json: JsonValue) -> Self {
        Unrecognized { bytes: None, json: Some(json), tail_count: 0 }
    }

    pub fn from_struct_tail(bytes: Vec<u8>, tail_count: usize) -> Self {
        Unrecognized { bytes: Some(bytes), json: None, tail_count }
    }
}
