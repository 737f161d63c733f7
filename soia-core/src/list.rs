//! Length-prefixed homogeneous sequences, with an optional keyed index
//! overlay (§4.3, "Keyed list" in the glossary).

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{CodecError, Result};
use crate::json::JsonValue;
use crate::varint::{self, Reader, TAG_LIST_0, TAG_LIST_LONG};

pub fn encode_list<T>(out: &mut Vec<u8>, items: &[T], mut encode_item: impl FnMut(&mut Vec<u8>, &T)) {
    let n = items.len();
    match n {
        0 => out.push(TAG_LIST_0),
        1..=3 => {
            out.push(TAG_LIST_0 + n as u8);
            for item in items {
                encode_item(out, item);
            }
        }
        _ => {
            out.push(TAG_LIST_LONG);
            varint::encode_length(out, n as u64);
            for item in items {
                encode_item(out, item);
            }
        }
    }
    debug_assert_eq!(items.len(), n, "encoder produced a different item count than declared");
}

pub fn decode_list<T>(r: &mut Reader, mut decode_item: impl FnMut(&mut Reader) -> Result<T>) -> Result<Vec<T>> {
    let w = r.read_u8()?;
    let count = match w {
        0 => 0,
        TAG_LIST_0 => 0,
        247..=249 => (w - TAG_LIST_0) as usize,
        TAG_LIST_LONG => varint::decode_length(r)? as usize,
        other => return Err(CodecError::UnknownTag(other)),
    };
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(decode_item(r)?);
    }
    Ok(items)
}

pub fn list_to_json<T>(items: &[T], mut item_to_json: impl FnMut(&T) -> JsonValue) -> JsonValue {
    JsonValue::Array(items.iter().map(&mut item_to_json).collect())
}

pub fn list_from_json<T>(v: &JsonValue, mut item_from_json: impl FnMut(&JsonValue) -> Result<T>) -> Result<Vec<T>> {
    match v {
        JsonValue::Array(elements) => elements.iter().map(&mut item_from_json).collect(),
        JsonValue::Number(n) if n.as_i64() == Some(0) => Ok(Vec::new()),
        other => Err(CodecError::SchemaMismatch { expected: "list", found: other.to_string() }),
    }
}

/// A decoded list plus a key→item lookup built from a key-extraction
/// closure. Duplicate keys keep the last occurrence (§4.3). Equality
/// ignores the index overlay and only compares the underlying items.
#[derive(Debug, Clone)]
pub struct KeyedList<T, K: Eq + Hash> {
    items: Vec<T>,
    index: HashMap<K, usize>,
}

impl<T, K: Eq + Hash + Clone> KeyedList<T, K> {
    pub fn new(items: Vec<T>, mut key_of: impl FnMut(&T) -> K) -> Self {
        let mut index = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            index.insert(key_of(item), i);
        }
        KeyedList { items, index }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, key: &K) -> Option<&T> {
        self.index.get(key).map(|&i| &self.items[i])
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T: PartialEq, K: Eq + Hash> PartialEq for KeyedList<T, K> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive;

    #[test]
    fn list_size_framing_matches_table() {
        let mut out = Vec::new();
        encode_list(&mut out, &["a".to_string(), "b".to_string()], |buf, s| primitive::encode_string(buf, s));
        assert_eq!(out[0], TAG_LIST_0 + 2);
        let mut r = Reader::new(&out);
        let items = decode_list(&mut r, primitive::decode_string).unwrap();
        assert_eq!(items, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn long_list_uses_length_prefix() {
        let items: Vec<i32> = (0..10).collect();
        let mut out = Vec::new();
        encode_list(&mut out, &items, |buf, v| primitive::encode_int32(buf, *v));
        assert_eq!(out[0], TAG_LIST_LONG);
        let mut r = Reader::new(&out);
        let decoded = decode_list(&mut r, primitive::decode_int32).unwrap();
        assert_eq!(decoded, items);
    }

    #[test]
    fn dense_json_zero_decodes_to_empty() {
        let v: Vec<i32> = list_from_json(&JsonValue::from(0), primitive::int32_from_json).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn keyed_list_keeps_last_duplicate() {
        let items = vec![("a", 1), ("a", 2)];
        let keyed = KeyedList::new(items, |(k, _)| k.to_string());
        assert_eq!(keyed.get(&"a".to_string()), Some(&("a", 2)));
    }
}
