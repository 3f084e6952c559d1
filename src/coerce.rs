//! Schema-driven type coercion of HTTP string input.
//!
//! Path and query values arrive as strings regardless of what the schema
//! declares; coercion rewrites them in place to the declared primitive
//! types before validation. Coercion is lossless-or-unchanged: a value
//! that cannot be converted is left untouched so the validator reports
//! the mismatch instead of the coercion inventing one.

use serde_json::{Map, Number, Value};

/// Coerce a value in place to match the schema's declared types.
///
/// Recursive and depth-first: recurses into properties the schema declares
/// and the value carries, and elementwise into arrays via the schema's
/// `items`. Properties the schema doesn't declare pass through untouched.
///
/// When `wrap_scalars` is set and the schema wants an array of scalars but
/// the value is a single string, the string is wrapped into a one-element
/// array first. This handles query parameters a client sent without
/// explicit array syntax.
pub fn coerce(value: &mut Value, schema: &Value, wrap_scalars: bool) {
    if wrap_scalars && should_wrap(value, schema) {
        let scalar = std::mem::take(value);
        *value = Value::Array(vec![scalar]);
    }

    if let (Value::Object(obj), Some(Value::Object(props))) = (&mut *value, schema.get("properties"))
    {
        for (name, prop_schema) in props {
            if let Some(child) = obj.get_mut(name) {
                coerce(child, prop_schema, wrap_scalars);
            }
        }
        return;
    }

    if schema_type(schema) == Some("array") {
        if let (Value::Array(items), Some(item_schema)) = (&mut *value, schema.get("items")) {
            for item in items {
                coerce(item, item_schema, wrap_scalars);
            }
            return;
        }
    }

    coerce_scalar(value, schema_type(schema));
}

fn should_wrap(value: &Value, schema: &Value) -> bool {
    if schema_type(schema) != Some("array") || !value.is_string() {
        return false;
    }
    matches!(
        schema.get("items").and_then(|i| i.get("type")).and_then(Value::as_str),
        Some("string" | "number" | "integer" | "boolean")
    )
}

fn schema_type(schema: &Value) -> Option<&str> {
    schema.get("type").and_then(Value::as_str)
}

/// Convert a string leaf to the declared primitive type.
///
/// Numbers must parse finite; `integer` additionally rejects any source
/// string containing a decimal point. Booleans map only the exact literals
/// `"true"` and `"false"`. Anything else is left unchanged for the
/// validator to reject.
fn coerce_scalar(value: &mut Value, declared: Option<&str>) {
    let Value::String(s) = &*value else {
        return;
    };

    let replacement = match declared {
        Some("number") | Some("integer") => {
            // i64 first so large integers keep full precision
            if let Ok(parsed) = s.parse::<i64>() {
                Some(Value::Number(Number::from(parsed)))
            } else {
                let Ok(parsed) = s.parse::<f64>() else {
                    return;
                };
                if !parsed.is_finite() {
                    return;
                }
                if declared == Some("integer") && s.contains('.') {
                    return;
                }
                Number::from_f64(parsed).map(Value::Number)
            }
        }
        Some("boolean") => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };

    if let Some(replacement) = replacement {
        *value = replacement;
    }
}

/// Collapse `name[INDEX]` query keys into a single `name` array property.
///
/// Each value lands at its numeric index; missing indices are preserved as
/// null holes, never renumbered. Runs before schema coercion so the array
/// then coerces elementwise.
pub fn collapse_query_arrays(query: &mut Value) {
    let Value::Object(obj) = query else {
        return;
    };

    let indexed: Vec<(String, String, usize)> = obj
        .keys()
        .filter_map(|key| {
            let (base, idx) = parse_array_key(key)?;
            Some((key.clone(), base.to_string(), idx))
        })
        .collect();

    for (key, base, idx) in indexed {
        let item = obj.remove(&key).unwrap_or(Value::Null);
        let slot = obj.entry(base).or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        let arr = slot.as_array_mut().unwrap();
        if arr.len() <= idx {
            arr.resize(idx + 1, Value::Null);
        }
        arr[idx] = item;
    }
}

/// Split a key of the form `name[3]` into ("name", 3).
fn parse_array_key(key: &str) -> Option<(&str, usize)> {
    let rest = key.strip_suffix(']')?;
    let open = rest.rfind('[')?;
    let idx: usize = rest[open + 1..].parse().ok()?;
    if open == 0 {
        return None;
    }
    Some((&rest[..open], idx))
}

/// Lower-case all property names in a header schema, recursively.
///
/// Header names are case-insensitive at the transport level while
/// JSON-Schema property matching is case-sensitive, so the schema is
/// normalized once at derivation time.
pub fn lowercase_schema_properties(schema: &Value) -> Value {
    let Value::Object(map) = schema else {
        return schema.clone();
    };

    let mut result = Map::new();
    for (key, value) in map {
        if key == "properties" {
            if let Value::Object(props) = value {
                let mut lowered = Map::new();
                for (name, sub) in props {
                    lowered.insert(name.to_lowercase(), lowercase_schema_properties(sub));
                }
                result.insert(key.clone(), Value::Object(lowered));
                continue;
            }
        }
        result.insert(key.clone(), value.clone());
    }
    Value::Object(result)
}
