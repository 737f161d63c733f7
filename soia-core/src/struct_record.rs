//! Slot-vector struct codec (§4.5). Generated record types implement
//! [`StructValue`]; the free functions here drive the shared slot-vector
//! algorithm (default elision, gap-filling, unrecognized-tail preservation)
//! that every such type shares.

use crate::descriptor::Descriptor;
use crate::error::{CodecError, Result};
use crate::json::{JsonFlavor, JsonValue};
use crate::unrecognized::Unrecognized;
use crate::varint::{self, skip_value, Reader, TAG_LIST_0, TAG_LIST_LONG};

/// Bridges a concrete generated struct type to the generic slot-vector
/// driver. Slot numbers are the field numbers assigned in the schema;
/// `Builder` accumulates decoded fields before [`StructValue::finish`]
/// converts it into the finished value.
pub trait StructValue: Sized {
    type Builder: Default;

    /// Declared field slot numbers, ascending.
    fn declared_slots() -> &'static [i32];
    /// Slot numbers this schema once declared and has since retired.
    /// A retired slot always decodes as its type default and is never
    /// captured into the unrecognized tail — unlike a slot number this
    /// schema has never heard of, which is a genuine forward-compat gap.
    fn removed_slots() -> &'static [i32] {
        &[]
    }
    fn field_name(slot: i32) -> &'static str;
    fn field_descriptor(slot: i32) -> Descriptor;

    fn slot_is_default(&self, slot: i32) -> bool;
    fn encode_slot(&self, slot: i32, out: &mut Vec<u8>);
    fn slot_to_json(&self, slot: i32, flavor: JsonFlavor) -> JsonValue;

    fn decode_slot(builder: &mut Self::Builder, slot: i32, r: &mut Reader) -> Result<()>;
    fn decode_slot_json(builder: &mut Self::Builder, slot: i32, v: &JsonValue) -> Result<()>;

    fn unrecognized(&self) -> &Unrecognized;
    fn set_unrecognized(builder: &mut Self::Builder, u: Unrecognized);
    fn finish(builder: Self::Builder) -> Self;
}

/// Highest declared slot whose value is not the field-type default, or
/// `None` if every declared field currently holds its default.
fn highest_non_default<S: StructValue>(value: &S) -> Option<i32> {
    S::declared_slots().iter().rev().copied().find(|&slot| !value.slot_is_default(slot))
}

pub fn encode_struct<S: StructValue>(value: &S, out: &mut Vec<u8>) {
    let tail = value.unrecognized();
    let hi = highest_non_default(value);
    let declared_count = hi.map(|h| h + 1).unwrap_or(0) as usize;
    let total = declared_count + tail.tail_count;

    if total == 0 {
        out.push(0);
        return;
    }
    match total {
        1..=3 => out.push(TAG_LIST_0 + total as u8),
        _ => {
            out.push(TAG_LIST_LONG);
            varint::encode_length(out, total as u64);
        }
    }
    for slot in 0..declared_count as i32 {
        value.encode_slot(slot, out);
    }
    if let Some(bytes) = &tail.bytes {
        out.extend_from_slice(bytes);
    }
}

pub fn decode_struct<S: StructValue>(r: &mut Reader, keep_unrecognized: bool) -> Result<S> {
    let w = r.read_u8()?;
    let total = match w {
        0 => 0,
        TAG_LIST_0 => 0,
        247..=249 => (w - TAG_LIST_0) as usize,
        TAG_LIST_LONG => varint::decode_length(r)? as usize,
        other => return Err(CodecError::UnknownTag(other)),
    };

    let mut builder = S::Builder::default();
    let declared = S::declared_slots();
    let own_max = declared.iter().chain(S::removed_slots()).copied().max();
    let mut tail_bytes = Vec::new();
    let mut tail_count = 0usize;

    for slot in 0..total as i32 {
        if declared.contains(&slot) {
            S::decode_slot(&mut builder, slot, r)?;
        } else if own_max.is_some_and(|m| slot <= m) {
            skip_value(r)?;
        } else {
            let span = skip_value(r)?;
            if keep_unrecognized {
                tail_bytes.extend_from_slice(span);
                tail_count += 1;
            }
        }
    }
    if keep_unrecognized && !tail_bytes.is_empty() {
        S::set_unrecognized(&mut builder, Unrecognized::from_struct_tail(tail_bytes, tail_count));
    }
    Ok(S::finish(builder))
}

pub fn struct_to_json<S: StructValue>(value: &S, flavor: JsonFlavor) -> JsonValue {
    let declared = S::declared_slots();
    match flavor {
        JsonFlavor::Dense => {
            let hi = highest_non_default(value);
            let declared_count = hi.map(|h| h + 1).unwrap_or(0);
            let mut array: Vec<JsonValue> = (0..declared_count)
                .map(|slot| value.slot_to_json(slot, flavor))
                .collect();
            if let Some(JsonValue::Array(extra)) = &value.unrecognized().json {
                array.extend(extra.iter().cloned());
            }
            if array.is_empty() {
                JsonValue::Array(Vec::new())
            } else {
                JsonValue::Array(array)
            }
        }
        JsonFlavor::Readable => {
            let mut map = serde_json::Map::new();
            for &slot in declared {
                if !value.slot_is_default(slot) {
                    map.insert(S::field_name(slot).to_string(), value.slot_to_json(slot, flavor));
                }
            }
            JsonValue::Object(map)
        }
    }
}

pub fn struct_from_json<S: StructValue>(v: &JsonValue, keep_unrecognized: bool) -> Result<S> {
    let mut builder = S::Builder::default();
    let declared = S::declared_slots();
    let own_max = declared.iter().chain(S::removed_slots()).copied().max();
    match v {
        JsonValue::Array(elements) => {
            let mut unknown_tail = Vec::new();
            for (slot, elem) in elements.iter().enumerate() {
                let slot = slot as i32;
                if declared.contains(&slot) {
                    S::decode_slot_json(&mut builder, slot, elem)?;
                } else if own_max.is_some_and(|m| slot <= m) {
                    // retired slot, always default, not forward-compat data
                } else if keep_unrecognized {
                    unknown_tail.push(elem.clone());
                }
            }
            if keep_unrecognized && !unknown_tail.is_empty() {
                S::set_unrecognized(&mut builder, Unrecognized::from_json(JsonValue::Array(unknown_tail)));
            }
        }
        JsonValue::Object(map) => {
            for &slot in declared {
                if let Some(elem) = map.get(S::field_name(slot)) {
                    S::decode_slot_json(&mut builder, slot, elem)?;
                }
            }
        }
        other => {
            return Err(CodecError::SchemaMismatch { expected: "struct (array or object)", found: other.to_string() })
        }
    }
    Ok(S::finish(builder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Descriptor, PrimitiveKind};
    use crate::primitive;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
        label: String,
        removed: Unrecognized,
    }

    #[derive(Default)]
    struct PointBuilder {
        x: i32,
        y: i32,
        label: String,
        removed: Unrecognized,
    }

    impl StructValue for Point {
        type Builder = PointBuilder;

        fn declared_slots() -> &'static [i32] {
            &[0, 2]
        }

        fn removed_slots() -> &'static [i32] {
            &[1]
        }

        fn field_name(slot: i32) -> &'static str {
            match slot {
                0 => "x",
                2 => "label",
                _ => unreachable!(),
            }
        }

        fn field_descriptor(slot: i32) -> Descriptor {
            match slot {
                0 => Descriptor::Primitive(PrimitiveKind::Int32),
                2 => Descriptor::Primitive(PrimitiveKind::String),
                _ => unreachable!(),
            }
        }

        fn slot_is_default(&self, slot: i32) -> bool {
            match slot {
                0 => self.x == 0,
                2 => self.label.is_empty(),
                _ => true,
            }
        }

        fn encode_slot(&self, slot: i32, out: &mut Vec<u8>) {
            match slot {
                0 => primitive::encode_int32(out, self.x),
                1 => out.push(0),
                2 => primitive::encode_string(out, &self.label),
                _ => unreachable!(),
            }
        }

        fn slot_to_json(&self, slot: i32, _flavor: JsonFlavor) -> JsonValue {
            match slot {
                0 => primitive::int32_to_json(self.x),
                1 => JsonValue::from(0),
                2 => primitive::string_to_json(&self.label),
                _ => unreachable!(),
            }
        }

        fn decode_slot(builder: &mut PointBuilder, slot: i32, r: &mut Reader) -> Result<()> {
            match slot {
                0 => {
                    builder.x = primitive::decode_int32(r)?;
                }
                2 => {
                    builder.label = primitive::decode_string(r)?;
                }
                _ => unreachable!(),
            }
            Ok(())
        }

        fn decode_slot_json(builder: &mut PointBuilder, slot: i32, v: &JsonValue) -> Result<()> {
            match slot {
                0 => {
                    builder.x = primitive::int32_from_json(v)?;
                }
                2 => {
                    builder.label = primitive::string_from_json(v)?;
                }
                _ => unreachable!(),
            }
            Ok(())
        }

        fn unrecognized(&self) -> &Unrecognized {
            &self.removed
        }

        fn set_unrecognized(builder: &mut PointBuilder, u: Unrecognized) {
            builder.removed = u;
        }

        fn finish(builder: PointBuilder) -> Self {
            Point { x: builder.x, y: builder.y, label: builder.label, removed: builder.removed }
        }
    }

    #[test]
    fn all_default_elides_to_single_byte() {
        let p = Point::default();
        let mut out = Vec::new();
        encode_struct(&p, &mut out);
        assert_eq!(out, vec![0]);
    }

    #[test]
    fn hole_between_declared_fields_fills_with_zero() {
        let p = Point { x: 0, y: 0, label: "hi".to_string(), removed: Unrecognized::default() };
        let mut out = Vec::new();
        encode_struct(&p, &mut out);
        assert_eq!(out[0], TAG_LIST_0 + 3);
        assert_eq!(&out[1..], &[0u8, 0, 243, 2, b'h', b'i']);
    }

    #[test]
    fn roundtrips_through_binary() {
        let p = Point { x: 7, y: 0, label: "z".to_string(), removed: Unrecognized::default() };
        let mut out = Vec::new();
        encode_struct(&p, &mut out);
        let mut r = Reader::new(&out);
        let decoded: Point = decode_struct(&mut r, true).unwrap();
        assert_eq!(decoded.x, 7);
        assert_eq!(decoded.label, "z");
    }

    #[test]
    fn unrecognized_tail_preserved_across_reencode() {
        // A writer on a newer schema encodes a 4th field at slot 3; this
        // reader's schema (Point) only goes up to slot 2 (0 declared, 1
        // retired), so slot 3 round-trips as an opaque unrecognized tail.
        let mut out = Vec::new();
        out.push(TAG_LIST_LONG);
        varint::encode_length(&mut out, 4);
        primitive::encode_int32(&mut out, 7); // slot 0, declared
        out.push(0); // slot 1, retired in this schema
        primitive::encode_string(&mut out, "z"); // slot 2, declared, non-default
        primitive::encode_int32(&mut out, 99); // slot 3, unknown to this schema

        let mut r = Reader::new(&out);
        let decoded: Point = decode_struct(&mut r, true).unwrap();
        assert_eq!(decoded.x, 7);
        assert_eq!(decoded.removed.tail_count, 1);

        let mut re_encoded = Vec::new();
        encode_struct(&decoded, &mut re_encoded);
        assert_eq!(re_encoded, out);
    }
}
