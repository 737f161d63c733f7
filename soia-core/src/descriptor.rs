//! Reflective type descriptors (§4.7): a runtime value mirroring a record's
//! schema, self-describing as JSON with a flat record table so recursive
//! and mutually-recursive record graphs don't need to serialize cycles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use lazy_static::lazy_static;

use crate::error::{CodecError, Result};
use crate::json::JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Bool,
    Int32,
    Int64,
    Uint64,
    Float32,
    Float64,
    Timestamp,
    String,
    Bytes,
}

impl PrimitiveKind {
    fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::Uint64 => "uint64",
            PrimitiveKind::Float32 => "float32",
            PrimitiveKind::Float64 => "float64",
            PrimitiveKind::Timestamp => "timestamp",
            PrimitiveKind::String => "string",
            PrimitiveKind::Bytes => "bytes",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => PrimitiveKind::Bool,
            "int32" => PrimitiveKind::Int32,
            "int64" => PrimitiveKind::Int64,
            "uint64" => PrimitiveKind::Uint64,
            "float32" => PrimitiveKind::Float32,
            "float64" => PrimitiveKind::Float64,
            "timestamp" => PrimitiveKind::Timestamp,
            "string" => PrimitiveKind::String,
            "bytes" => PrimitiveKind::Bytes,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone)]
pub enum Descriptor {
    Primitive(PrimitiveKind),
    Optional(Box<Descriptor>),
    Array(Box<ArrayDescriptor>),
    Record(Arc<RecordDescriptor>),
}

#[derive(Debug, Clone)]
pub struct ArrayDescriptor {
    pub item: Descriptor,
    /// Dotted key-extractor path, present only for keyed lists.
    pub key_chain: Option<String>,
}

/// A struct or enum record, identified by `{module_path}:{qualified_name}`.
/// Kind is filled in lazily via [`OnceLock`] so two records referring to
/// each other can both be constructed before either body is known.
#[derive(Debug)]
pub struct RecordDescriptor {
    pub module_path: String,
    pub qualified_name: String,
    kind: OnceLock<RecordKind>,
}

impl RecordDescriptor {
    pub fn id(&self) -> String {
        format!("{}:{}", self.module_path, self.qualified_name)
    }

    pub fn kind(&self) -> &RecordKind {
        self.kind.get().expect("record descriptor used before its kind was finalized")
    }
}

#[derive(Debug, Clone)]
pub enum RecordKind {
    Struct(StructDescriptor),
    Enum(EnumDescriptor),
}

#[derive(Debug, Clone)]
pub struct StructDescriptor {
    pub fields: Vec<FieldDescriptor>,
    pub removed_numbers: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub number: i32,
    pub descriptor: Descriptor,
}

#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    pub variants: Vec<VariantDescriptor>,
    pub removed_numbers: Vec<i32>,
}

#[derive(Debug, Clone)]
pub enum VariantDescriptor {
    Constant { name: String, number: i32 },
    Value { name: String, number: i32, descriptor: Descriptor },
}

lazy_static! {
    static ref RECORD_REGISTRY: Mutex<HashMap<String, Arc<RecordDescriptor>>> = Mutex::new(HashMap::new());
}

/// Looks up or creates the shared descriptor for a record id, running
/// `build` at most once per id. Safe to call reentrantly from within
/// `build` for a mutually-recursive record: the id is registered (with an
/// empty `kind`) before `build` runs, so a cyclic reference resolves to the
/// same `Arc` instead of recursing forever.
pub fn get_or_init_record(module_path: &str, qualified_name: &str, build: impl FnOnce() -> RecordKind) -> Arc<RecordDescriptor> {
    let id = format!("{module_path}:{qualified_name}");
    {
        let registry = RECORD_REGISTRY.lock().unwrap();
        if let Some(existing) = registry.get(&id) {
            return existing.clone();
        }
    }
    let record = Arc::new(RecordDescriptor {
        module_path: module_path.to_string(),
        qualified_name: qualified_name.to_string(),
        kind: OnceLock::new(),
    });
    {
        let mut registry = RECORD_REGISTRY.lock().unwrap();
        if let Some(existing) = registry.get(&id) {
            return existing.clone();
        }
        registry.insert(id.clone(), record.clone());
    }
    let kind = build();
    let _ = record.kind.set(kind);
    record
}

pub fn descriptor_to_json(d: &Descriptor) -> JsonValue {
    let mut seen = std::collections::HashSet::new();
    let mut records = Vec::new();
    collect_records(d, &mut seen, &mut records);
    serde_json::json!({ "records": records, "type": type_signature_json(d) })
}

fn collect_records(d: &Descriptor, seen: &mut std::collections::HashSet<String>, out: &mut Vec<JsonValue>) {
    match d {
        Descriptor::Primitive(_) => {}
        Descriptor::Optional(inner) => collect_records(inner, seen, out),
        Descriptor::Array(arr) => collect_records(&arr.item, seen, out),
        Descriptor::Record(rec) => {
            let id = rec.id();
            if !seen.insert(id.clone()) {
                return;
            }
            let record_json = match rec.kind() {
                RecordKind::Struct(s) => {
                    for f in &s.fields {
                        collect_records(&f.descriptor, seen, out);
                    }
                    serde_json::json!({
                        "kind": "struct",
                        "id": id,
                        "fields": s.fields.iter().map(|f| serde_json::json!({
                            "name": f.name,
                            "number": f.number,
                            "type": type_signature_json(&f.descriptor),
                        })).collect::<Vec<_>>(),
                        "removed_fields": s.removed_numbers,
                    })
                }
                RecordKind::Enum(e) => {
                    for v in &e.variants {
                        if let VariantDescriptor::Value { descriptor, .. } = v {
                            collect_records(descriptor, seen, out);
                        }
                    }
                    serde_json::json!({
                        "kind": "enum",
                        "id": id,
                        "variants": e.variants.iter().map(variant_json).collect::<Vec<_>>(),
                        "removed_numbers": e.removed_numbers,
                    })
                }
            };
            out.push(record_json);
        }
    }
}

fn variant_json(v: &VariantDescriptor) -> JsonValue {
    match v {
        VariantDescriptor::Constant { name, number } => serde_json::json!({"name": name, "number": number}),
        VariantDescriptor::Value { name, number, descriptor } => {
            serde_json::json!({"name": name, "number": number, "type": type_signature_json(descriptor)})
        }
    }
}

fn type_signature_json(d: &Descriptor) -> JsonValue {
    match d {
        Descriptor::Primitive(p) => serde_json::json!({"kind": "primitive", "value": p.name()}),
        Descriptor::Optional(inner) => serde_json::json!({"kind": "optional", "value": type_signature_json(inner)}),
        Descriptor::Array(arr) => {
            let mut value = serde_json::json!({"item": type_signature_json(&arr.item)});
            if let Some(kc) = &arr.key_chain {
                value["key_chain"] = JsonValue::from(kc.clone());
            }
            serde_json::json!({"kind": "array", "value": value})
        }
        Descriptor::Record(rec) => serde_json::json!({"kind": "record", "value": rec.id()}),
    }
}

pub fn descriptor_from_json(v: &JsonValue) -> Result<Descriptor> {
    let records_json = v
        .get("records")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| CodecError::SchemaMismatch { expected: "descriptor with 'records'", found: v.to_string() })?;

    let mut registry: HashMap<String, Arc<RecordDescriptor>> = HashMap::new();
    for rec_json in records_json {
        let id = record_id(rec_json)?;
        let (module_path, qualified_name) = split_id(&id)?;
        registry.entry(id).or_insert_with(|| {
            Arc::new(RecordDescriptor { module_path, qualified_name, kind: OnceLock::new() })
        });
    }
    for rec_json in records_json {
        let id = record_id(rec_json)?;
        let kind = parse_record_kind(rec_json, &registry)?;
        let _ = registry[&id].kind.set(kind);
    }

    let entry_type = v
        .get("type")
        .ok_or_else(|| CodecError::SchemaMismatch { expected: "descriptor with 'type'", found: v.to_string() })?;
    type_signature_from_json(entry_type, &registry)
}

fn record_id(v: &JsonValue) -> Result<String> {
    v.get("id")
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| CodecError::SchemaMismatch { expected: "record with 'id'", found: v.to_string() })
}

fn split_id(id: &str) -> Result<(String, String)> {
    id.split_once(':')
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .ok_or_else(|| CodecError::SchemaMismatch { expected: "record id 'module:name'", found: id.to_string() })
}

fn parse_record_kind(v: &JsonValue, registry: &HashMap<String, Arc<RecordDescriptor>>) -> Result<RecordKind> {
    let kind = v
        .get("kind")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| CodecError::SchemaMismatch { expected: "record with 'kind'", found: v.to_string() })?;
    match kind {
        "struct" => {
            let fields = v
                .get("fields")
                .and_then(JsonValue::as_array)
                .ok_or_else(|| CodecError::SchemaMismatch { expected: "struct with 'fields'", found: v.to_string() })?
                .iter()
                .map(|f| parse_field(f, registry))
                .collect::<Result<Vec<_>>>()?;
            let removed_numbers = parse_i32_array(v.get("removed_fields"));
            Ok(RecordKind::Struct(StructDescriptor { fields, removed_numbers }))
        }
        "enum" => {
            let variants = v
                .get("variants")
                .and_then(JsonValue::as_array)
                .ok_or_else(|| CodecError::SchemaMismatch { expected: "enum with 'variants'", found: v.to_string() })?
                .iter()
                .map(|variant| parse_variant(variant, registry))
                .collect::<Result<Vec<_>>>()?;
            let removed_numbers = parse_i32_array(v.get("removed_numbers"));
            Ok(RecordKind::Enum(EnumDescriptor { variants, removed_numbers }))
        }
        other => Err(CodecError::SchemaMismatch { expected: "struct or enum", found: other.to_string() }),
    }
}

fn parse_i32_array(v: Option<&JsonValue>) -> Vec<i32> {
    v.and_then(JsonValue::as_array)
        .map(|a| a.iter().filter_map(JsonValue::as_i64).map(|n| n as i32).collect())
        .unwrap_or_default()
}

fn parse_field(v: &JsonValue, registry: &HashMap<String, Arc<RecordDescriptor>>) -> Result<FieldDescriptor> {
    let name = field_str(v, "name")?;
    let number = field_i32(v, "number")?;
    let descriptor = type_signature_from_json(field_obj(v, "type")?, registry)?;
    Ok(FieldDescriptor { name, number, descriptor })
}

fn parse_variant(v: &JsonValue, registry: &HashMap<String, Arc<RecordDescriptor>>) -> Result<VariantDescriptor> {
    let name = field_str(v, "name")?;
    let number = field_i32(v, "number")?;
    Ok(match v.get("type") {
        Some(t) => VariantDescriptor::Value { name, number, descriptor: type_signature_from_json(t, registry)? },
        None => VariantDescriptor::Constant { name, number },
    })
}

fn field_str(v: &JsonValue, key: &'static str) -> Result<String> {
    v.get(key)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| CodecError::SchemaMismatch { expected: key, found: v.to_string() })
}

fn field_i32(v: &JsonValue, key: &'static str) -> Result<i32> {
    v.get(key)
        .and_then(JsonValue::as_i64)
        .map(|n| n as i32)
        .ok_or_else(|| CodecError::SchemaMismatch { expected: key, found: v.to_string() })
}

fn field_obj<'a>(v: &'a JsonValue, key: &'static str) -> Result<&'a JsonValue> {
    v.get(key).ok_or_else(|| CodecError::SchemaMismatch { expected: key, found: v.to_string() })
}

fn type_signature_from_json(v: &JsonValue, registry: &HashMap<String, Arc<RecordDescriptor>>) -> Result<Descriptor> {
    let kind = v
        .get("kind")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| CodecError::SchemaMismatch { expected: "type signature with 'kind'", found: v.to_string() })?;
    let value = field_obj(v, "value")?;
    match kind {
        "primitive" => {
            let name = value
                .as_str()
                .ok_or_else(|| CodecError::SchemaMismatch { expected: "primitive name", found: value.to_string() })?;
            PrimitiveKind::from_name(name)
                .map(Descriptor::Primitive)
                .ok_or_else(|| CodecError::SchemaMismatch { expected: "known primitive name", found: name.to_string() })
        }
        "optional" => Ok(Descriptor::Optional(Box::new(type_signature_from_json(value, registry)?))),
        "array" => {
            let item = type_signature_from_json(field_obj(value, "item")?, registry)?;
            let key_chain = value.get("key_chain").and_then(JsonValue::as_str).map(str::to_string);
            Ok(Descriptor::Array(Box::new(ArrayDescriptor { item, key_chain })))
        }
        "record" => {
            let id = value
                .as_str()
                .ok_or_else(|| CodecError::SchemaMismatch { expected: "record id", found: value.to_string() })?;
            registry
                .get(id)
                .cloned()
                .map(Descriptor::Record)
                .ok_or_else(|| CodecError::UnknownRecordId(id.to_string()))
        }
        other => Err(CodecError::SchemaMismatch { expected: "primitive, optional, array or record", found: other.to_string() }),
    }
}
