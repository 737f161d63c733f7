//! Reflective value transformer (§4.8). Walks a value's dense JSON form
//! guided by its [`Descriptor`], applying a caller-supplied [`Visitor`] at
//! every primitive leaf. Operating on JSON rather than native Rust values
//! sidesteps needing `unsafe` downcasts to recover a generic native type at
//! each descriptor node, while still satisfying the identity-transformer
//! property: running a no-op visitor must reproduce the input JSON exactly.

use crate::descriptor::{Descriptor, PrimitiveKind, RecordKind};
use crate::json::JsonValue;

/// One callback per descriptor leaf kind. Implementations transform (or
/// pass through) the JSON representation of a value; [`transform`] handles
/// recursing through optionals, arrays, and record fields.
pub trait Visitor {
    fn visit_primitive(&mut self, kind: PrimitiveKind, value: JsonValue) -> JsonValue {
        let _ = kind;
        value
    }
}

/// A visitor that changes nothing; `transform` with this must be the
/// identity function on well-formed JSON.
pub struct IdentityVisitor;

impl Visitor for IdentityVisitor {}

pub fn transform(descriptor: &Descriptor, value: JsonValue, visitor: &mut impl Visitor) -> JsonValue {
    match descriptor {
        Descriptor::Primitive(kind) => visitor.visit_primitive(*kind, value),
        Descriptor::Optional(inner) => {
            if value.is_null() {
                value
            } else {
                transform(inner, value, visitor)
            }
        }
        Descriptor::Array(arr) => match value {
            JsonValue::Array(items) => {
                JsonValue::Array(items.into_iter().map(|item| transform(&arr.item, item, visitor)).collect())
            }
            other => other,
        },
        Descriptor::Record(rec) => match rec.kind() {
            RecordKind::Struct(s) => match value {
                JsonValue::Array(mut slots) => {
                    for field in &s.fields {
                        let idx = field.number as usize;
                        if idx < slots.len() {
                            let taken = std::mem::replace(&mut slots[idx], JsonValue::Null);
                            slots[idx] = transform(&field.descriptor, taken, visitor);
                        }
                    }
                    JsonValue::Array(slots)
                }
                JsonValue::Object(mut map) => {
                    for field in &s.fields {
                        if let Some(existing) = map.remove(&field.name) {
                            map.insert(field.name.clone(), transform(&field.descriptor, existing, visitor));
                        }
                    }
                    JsonValue::Object(map)
                }
                other => other,
            },
            RecordKind::Enum(e) => match &value {
                JsonValue::Array(elems) if elems.len() == 2 => {
                    let number = elems[0].as_i64().unwrap_or(0) as i32;
                    if let Some(variant_descriptor) = e.variants.iter().find_map(|v| match v {
                        crate::descriptor::VariantDescriptor::Value { number: n, descriptor, .. } if *n == number => {
                            Some(descriptor)
                        }
                        _ => None,
                    }) {
                        let transformed_payload = transform(variant_descriptor, elems[1].clone(), visitor);
                        JsonValue::Array(vec![elems[0].clone(), transformed_payload])
                    } else {
                        value
                    }
                }
                JsonValue::Object(map) if map.contains_key("value") => {
                    let kind = map.get("kind").and_then(JsonValue::as_str).unwrap_or("");
                    if let Some(variant_descriptor) = e.variants.iter().find_map(|v| match v {
                        crate::descriptor::VariantDescriptor::Value { name, descriptor, .. } if name == kind => {
                            Some(descriptor)
                        }
                        _ => None,
                    }) {
                        let mut map = map.clone();
                        let payload = map.remove("value").unwrap();
                        map.insert("value".to_string(), transform(variant_descriptor, payload, visitor));
                        JsonValue::Object(map)
                    } else {
                        value
                    }
                }
                _ => value,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{get_or_init_record, FieldDescriptor, StructDescriptor};

    struct UppercaseStrings;
    impl Visitor for UppercaseStrings {
        fn visit_primitive(&mut self, kind: PrimitiveKind, value: JsonValue) -> JsonValue {
            if kind == PrimitiveKind::String {
                if let JsonValue::String(s) = &value {
                    return JsonValue::String(s.to_uppercase());
                }
            }
            value
        }
    }

    fn person_descriptor() -> Descriptor {
        let rec = get_or_init_record("demo", "Person", || {
            RecordKind::Struct(StructDescriptor {
                fields: vec![
                    FieldDescriptor { name: "name".to_string(), number: 0, descriptor: Descriptor::Primitive(PrimitiveKind::String) },
                    FieldDescriptor { name: "age".to_string(), number: 1, descriptor: Descriptor::Primitive(PrimitiveKind::Int32) },
                ],
                removed_numbers: vec![],
            })
        });
        Descriptor::Record(rec)
    }

    #[test]
    fn identity_visitor_preserves_json_exactly() {
        let d = person_descriptor();
        let value = serde_json::json!(["ada", 36]);
        let out = transform(&d, value.clone(), &mut IdentityVisitor);
        assert_eq!(out, value);
    }

    #[test]
    fn visitor_rewrites_only_string_leaves() {
        let d = person_descriptor();
        let value = serde_json::json!(["ada", 36]);
        let out = transform(&d, value, &mut UppercaseStrings);
        assert_eq!(out, serde_json::json!(["ADA", 36]));
    }
}
