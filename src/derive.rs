//! Per-route sub-schema derivation.
//!
//! Groups a link's URI template matches by origin and builds the candidate
//! validation schemas: params, query, payload, and headers. Each derived
//! schema is built fresh per link and never mutated after construction.

use serde_json::{Map, Value};

use crate::coerce::lowercase_schema_properties;
use crate::types::{LinkDescriptor, MatchKind, UriMatch};

/// The candidate sub-schemas for one route. `None` means that group had no
/// matches (or no declared schema): callers must skip attaching a hook, so
/// absent groups mean no validation attempted, not always-valid.
#[derive(Debug, Clone, Default)]
pub struct DerivedSchemas {
    pub params: Option<Value>,
    pub query: Option<Value>,
    pub payload: Option<Value>,
    pub headers: Option<Value>,
}

/// Build the validation sub-schemas for one link.
///
/// Params and query schemas are object schemas whose properties are exactly
/// the corresponding match group's key-definition pairs, in match order.
/// The payload schema is the link's declared body schema verbatim, except a
/// self-reference (`$ref: "#"`) resolves to the whole dereferenced
/// document. A declared header schema has its property names lower-cased.
pub fn derive_validation_schemas(
    matches: &[UriMatch],
    link: &LinkDescriptor,
    root: &Value,
) -> DerivedSchemas {
    DerivedSchemas {
        params: group_schema(matches, MatchKind::Param),
        query: group_schema(matches, MatchKind::Query),
        payload: link.schema.as_ref().map(|schema| {
            if is_self_reference(schema) {
                root.clone()
            } else {
                schema.clone()
            }
        }),
        headers: link
            .header_schema
            .as_ref()
            .map(lowercase_schema_properties),
    }
}

fn group_schema(matches: &[UriMatch], kind: MatchKind) -> Option<Value> {
    let mut properties = Map::new();
    for m in matches.iter().filter(|m| m.kind == kind) {
        properties.insert(m.key.clone(), m.definition.clone());
    }
    if properties.is_empty() {
        return None;
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));
    schema.insert("properties".to_string(), Value::Object(properties));
    Some(Value::Object(schema))
}

/// A body schema of `{"$ref": "#"}` points at the document root.
fn is_self_reference(schema: &Value) -> bool {
    schema.get("$ref").and_then(Value::as_str) == Some("#")
}
