//! Schema-driven binary and JSON serialization for struct and enum record
//! types: a wire codec, a dense/readable JSON codec, and a reflective type
//! descriptor, all built to preserve fields and variants a given reader
//! doesn't recognize so old and new schema versions interoperate.

pub mod descriptor;
pub mod enum_record;
pub mod error;
pub mod json;
pub mod list;
pub mod optional;
pub mod primitive;
pub mod serializer;
pub mod struct_record;
pub mod unrecognized;
pub mod varint;
pub mod visitor;

pub use descriptor::{ArrayDescriptor, Descriptor, EnumDescriptor, FieldDescriptor, PrimitiveKind, RecordDescriptor, RecordKind, StructDescriptor, VariantDescriptor};
pub use enum_record::EnumValue;
pub use error::{CodecError, Result};
pub use json::{JsonFlavor, JsonValue};
pub use serializer::{Serializer, LEGACY_WIRE_MAGIC, WIRE_MAGIC};
pub use struct_record::StructValue;
pub use unrecognized::Unrecognized;
pub use varint::Reader;
pub use visitor::{transform, IdentityVisitor, Visitor};
