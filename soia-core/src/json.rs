//! The two JSON flavors this codec emits. Both are backed by
//! [`serde_json::Value`]; the flavor only changes how composite values are
//! shaped, not the JSON text format itself.

pub type JsonValue = serde_json::Value;

/// Which JSON shape to produce: dense (arrays + numeric tags, used for
/// persistence/transport) or readable (objects + string tags, for
/// debugging). See §4 and §6.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFlavor {
    Dense,
    Readable,
}
