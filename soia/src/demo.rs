//! Example record types and serializers exercising `soia_core` end to end,
//! used by the crate doctest and the `demos/` binaries. Modeled the way the
//! account/ledger request-response pairs were modeled: a handful of plain
//! structs and enums with hand-written `StructValue`/`EnumValue` impls (no
//! derive macro exists yet in this corpus) registered on a [`crate::Service`].

use lazy_static::lazy_static;
use soia_core::descriptor::{get_or_init_record, FieldDescriptor, RecordKind, StructDescriptor};
use soia_core::{
    primitive, struct_record, Descriptor, JsonFlavor, JsonValue, PrimitiveKind, Reader, Result, Serializer,
    StructValue, Unrecognized,
};

lazy_static! {
    static ref STRING_SERIALIZER: Serializer<String> = Serializer {
        descriptor: || Descriptor::Primitive(PrimitiveKind::String),
        encode: |v, out| primitive::encode_string(out, v),
        decode: |r, _keep| primitive::decode_string(r),
        to_json: |v, _flavor| primitive::string_to_json(v),
        from_json: |v, _keep| primitive::string_from_json(v),
        is_default: |v| v.is_empty(),
        default: String::new,
    };
}

pub fn string_serializer() -> &'static Serializer<String> {
    &STRING_SERIALIZER
}

/// A minimal account record: display name and age, with one retired slot
/// (a removed "nickname" field) standing in for a field a past schema
/// version carried and has since dropped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: i32,
    unrecognized: Unrecognized,
}

impl Person {
    pub fn new(name: impl Into<String>, age: i32) -> Self {
        Person { name: name.into(), age, unrecognized: Unrecognized::default() }
    }
}

#[derive(Default)]
pub struct PersonBuilder {
    name: String,
    age: i32,
    unrecognized: Unrecognized,
}

impl StructValue for Person {
    type Builder = PersonBuilder;

    fn declared_slots() -> &'static [i32] {
        &[0, 2]
    }

    fn removed_slots() -> &'static [i32] {
        &[1]
    }

    fn field_name(slot: i32) -> &'static str {
        match slot {
            0 => "name",
            2 => "age",
            _ => unreachable!(),
        }
    }

    fn field_descriptor(slot: i32) -> Descriptor {
        match slot {
            0 => Descriptor::Primitive(PrimitiveKind::String),
            2 => Descriptor::Primitive(PrimitiveKind::Int32),
            _ => unreachable!(),
        }
    }

    fn slot_is_default(&self, slot: i32) -> bool {
        match slot {
            0 => self.name.is_empty(),
            2 => self.age == 0,
            _ => true,
        }
    }

    fn encode_slot(&self, slot: i32, out: &mut Vec<u8>) {
        match slot {
            0 => primitive::encode_string(out, &self.name),
            1 => out.push(0),
            2 => primitive::encode_int32(out, self.age),
            _ => unreachable!(),
        }
    }

    fn slot_to_json(&self, slot: i32, _flavor: JsonFlavor) -> JsonValue {
        match slot {
            0 => primitive::string_to_json(&self.name),
            1 => JsonValue::from(0),
            2 => primitive::int32_to_json(self.age),
            _ => unreachable!(),
        }
    }

    fn decode_slot(builder: &mut PersonBuilder, slot: i32, r: &mut Reader) -> Result<()> {
        match slot {
            0 => builder.name = primitive::decode_string(r)?,
            2 => builder.age = primitive::decode_int32(r)?,
            _ => unreachable!(),
        }
        Ok(())
    }

    fn decode_slot_json(builder: &mut PersonBuilder, slot: i32, v: &JsonValue) -> Result<()> {
        match slot {
            0 => builder.name = primitive::string_from_json(v)?,
            2 => builder.age = primitive::int32_from_json(v)?,
            _ => unreachable!(),
        }
        Ok(())
    }

    fn unrecognized(&self) -> &Unrecognized {
        &self.unrecognized
    }

    fn set_unrecognized(builder: &mut PersonBuilder, u: Unrecognized) {
        builder.unrecognized = u;
    }

    fn finish(builder: PersonBuilder) -> Self {
        Person { name: builder.name, age: builder.age, unrecognized: builder.unrecognized }
    }
}

fn person_descriptor() -> Descriptor {
    Descriptor::Record(get_or_init_record("soia.demo", "Person", || {
        RecordKind::Struct(StructDescriptor {
            fields: vec![
                FieldDescriptor { name: "name".to_string(), number: 0, descriptor: Person::field_descriptor(0) },
                FieldDescriptor { name: "age".to_string(), number: 2, descriptor: Person::field_descriptor(2) },
            ],
            removed_numbers: Person::removed_slots().to_vec(),
        })
    }))
}

lazy_static! {
    static ref PERSON_SERIALIZER: Serializer<Person> = Serializer {
        descriptor: person_descriptor,
        encode: |v, out| struct_record::encode_struct(v, out),
        decode: |r, keep| struct_record::decode_struct(r, keep),
        to_json: |v, flavor| struct_record::struct_to_json(v, flavor),
        from_json: |v, keep| struct_record::struct_from_json(v, keep),
        is_default: |v| *v == Person::default(),
        default: Person::default,
    };
}

pub fn person_serializer() -> &'static Serializer<Person> {
    &PERSON_SERIALIZER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_round_trips_through_bytes() {
        let p = Person { name: "ada".to_string(), age: 36, unrecognized: Unrecognized::default() };
        let bytes = person_serializer().to_bytes(&p);
        assert_eq!(person_serializer().from_bytes(&bytes).unwrap(), p);
    }

    #[test]
    fn person_round_trips_through_readable_json() {
        let p = Person { name: "grace".to_string(), age: 85, unrecognized: Unrecognized::default() };
        let code = person_serializer().to_json_code(&p, JsonFlavor::Readable);
        assert_eq!(person_serializer().from_json_code(&code).unwrap(), p);
    }
}
