//! `$ref` dereferencing for hyper-schema documents.
//!
//! Inlines external file references recursively so each document becomes a
//! self-contained tree before route derivation. Internal refs (`#/...`) in
//! the root document are left for the validator engine, which resolves them
//! natively. Self-root refs (`$ref: "#"`) are left as-is; the payload
//! derivation step gives them their meaning (the whole document).

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use crate::error::ResolveError;
use crate::loader::load_schema;
use crate::types::CircularMode;

/// Navigate a JSON Pointer fragment (e.g., "#/definitions/foo").
///
/// Returns the value at the given JSON Pointer path within the schema.
/// The fragment should start with '#'.
pub fn navigate_fragment(schema: &Value, fragment: &str) -> Result<Value, ResolveError> {
    let path = fragment.trim_start_matches('#').trim_start_matches('/');
    if path.is_empty() {
        return Ok(schema.clone());
    }

    let mut current = schema;
    for part in path.split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        current = current
            .get(&key)
            .ok_or_else(|| ResolveError::FragmentNotFound {
                fragment: fragment.to_string(),
            })?;
    }
    Ok(current.clone())
}

/// Recursively resolve and inline external `$ref` pointers.
///
/// Walks the schema tree, finds `$ref` values pointing to external files,
/// loads them, and replaces the `$ref` with the loaded content. Internal
/// refs in loaded external files are resolved against that file.
///
/// Circular reference chains either fail (`CircularMode::Error`) or leave
/// the offending `$ref` in place (`CircularMode::Ignore`).
///
/// # Arguments
/// * `schema` - The document to process (modified in place)
/// * `base_dir` - Base directory for resolving relative file paths
pub fn dereference(
    schema: &mut Value,
    base_dir: &Path,
    circular: CircularMode,
) -> Result<(), ResolveError> {
    dereference_inner(schema, base_dir, None, circular, &mut HashSet::new())
}

fn dereference_inner(
    schema: &mut Value,
    base_dir: &Path,
    file_root: Option<&Value>, // Root of external file for resolving internal refs
    circular: CircularMode,
    visited: &mut HashSet<String>,
) -> Result<(), ResolveError> {
    match schema {
        Value::Object(obj) => {
            if let Some(ref_val) = obj.get("$ref").and_then(|v| v.as_str()) {
                if ref_val.starts_with('#') {
                    // Internal ref - only resolve if we have a file_root context.
                    // Skip self-root refs ($ref: "#") - recursive type defs.
                    if ref_val == "#" {
                        // Leave as-is - cannot inline a recursive self-reference
                    } else if let Some(root) = file_root {
                        let mut target = navigate_fragment(root, ref_val)?;
                        dereference_inner(&mut target, base_dir, file_root, circular, visited)?;
                        obj.remove("$ref");
                        if let Value::Object(ref_obj) = target {
                            for (k, v) in ref_obj {
                                obj.entry(k).or_insert(v);
                            }
                        }
                        return Ok(());
                    }
                    // No file_root = root document, leave for the validator
                } else {
                    let ref_val = ref_val.to_string();
                    let (file_part, fragment) = match ref_val.find('#') {
                        Some(idx) => (&ref_val[..idx], Some(&ref_val[idx..])),
                        None => (ref_val.as_str(), None),
                    };

                    let ref_path = base_dir.join(file_part);
                    let canonical = ref_path.canonicalize().unwrap_or_else(|_| ref_path.clone());
                    let visit_key = format!("{}|{}", canonical.display(), fragment.unwrap_or(""));

                    if visited.contains(&visit_key) {
                        return match circular {
                            CircularMode::Error => Err(ResolveError::CircularReference {
                                reference: ref_val.clone(),
                            }),
                            // Leave the $ref in place; the route derivation
                            // and validator must tolerate it.
                            CircularMode::Ignore => Ok(()),
                        };
                    }

                    // Load file - this becomes the new file_root for internal refs
                    let loaded = load_schema(&ref_path)?;
                    let mut target = if let Some(frag) = fragment {
                        navigate_fragment(&loaded, frag)?
                    } else {
                        loaded.clone()
                    };

                    visited.insert(visit_key.clone());
                    let ref_dir = ref_path.parent().unwrap_or(base_dir);
                    dereference_inner(&mut target, ref_dir, Some(&loaded), circular, visited)?;
                    visited.remove(&visit_key);

                    obj.remove("$ref");
                    if let Value::Object(ref_obj) = target {
                        for (k, v) in ref_obj {
                            obj.entry(k).or_insert(v);
                        }
                    }
                    return Ok(());
                }
            }

            for value in obj.values_mut() {
                dereference_inner(value, base_dir, file_root, circular, visited)?;
            }
        }
        Value::Array(arr) => {
            for item in arr {
                dereference_inner(item, base_dir, file_root, circular, visited)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, value: &Value) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    #[test]
    fn navigate_fragment_root() {
        let schema = json!({"type": "object"});
        assert_eq!(navigate_fragment(&schema, "#").unwrap(), schema);
    }

    #[test]
    fn navigate_fragment_nested() {
        let schema = json!({"definitions": {"id": {"type": "integer"}}});
        let target = navigate_fragment(&schema, "#/definitions/id").unwrap();
        assert_eq!(target, json!({"type": "integer"}));
    }

    #[test]
    fn navigate_fragment_missing() {
        let schema = json!({});
        let result = navigate_fragment(&schema, "#/definitions/nope");
        assert!(matches!(result, Err(ResolveError::FragmentNotFound { .. })));
    }

    #[test]
    fn dereference_inlines_external_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "id.json", &json!({"type": "integer", "minimum": 1}));

        let mut schema = json!({
            "properties": {
                "id": { "$ref": "id.json" }
            }
        });
        dereference(&mut schema, dir.path(), CircularMode::Error).unwrap();

        assert_eq!(schema["properties"]["id"]["type"], "integer");
        assert!(schema["properties"]["id"].get("$ref").is_none());
    }

    #[test]
    fn dereference_external_fragment() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "common.json",
            &json!({"definitions": {"name": {"type": "string", "minLength": 1}}}),
        );

        let mut schema = json!({
            "properties": {
                "name": { "$ref": "common.json#/definitions/name" }
            }
        });
        dereference(&mut schema, dir.path(), CircularMode::Error).unwrap();

        assert_eq!(schema["properties"]["name"]["minLength"], 1);
    }

    #[test]
    fn dereference_resolves_internal_refs_of_loaded_file() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "types.json",
            &json!({
                "definitions": { "tag": { "type": "string" } },
                "type": "array",
                "items": { "$ref": "#/definitions/tag" }
            }),
        );

        let mut schema = json!({ "properties": { "tags": { "$ref": "types.json" } } });
        dereference(&mut schema, dir.path(), CircularMode::Error).unwrap();

        assert_eq!(schema["properties"]["tags"]["items"]["type"], "string");
    }

    #[test]
    fn dereference_leaves_root_internal_refs() {
        let dir = TempDir::new().unwrap();
        let mut schema = json!({
            "definitions": { "id": { "type": "integer" } },
            "properties": { "id": { "$ref": "#/definitions/id" } }
        });
        let original = schema.clone();
        dereference(&mut schema, dir.path(), CircularMode::Error).unwrap();

        // Root-internal refs stay for the validator engine
        assert_eq!(schema, original);
    }

    #[test]
    fn dereference_leaves_self_root_refs() {
        let dir = TempDir::new().unwrap();
        let mut schema = json!({ "links": [], "schema": { "$ref": "#" } });
        dereference(&mut schema, dir.path(), CircularMode::Error).unwrap();
        assert_eq!(schema["schema"]["$ref"], "#");
    }

    #[test]
    fn dereference_circular_errors_by_default() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.json", &json!({"properties": {"b": {"$ref": "b.json"}}}));
        write(&dir, "b.json", &json!({"properties": {"a": {"$ref": "a.json"}}}));

        let mut schema = json!({ "$ref": "a.json" });
        let result = dereference(&mut schema, dir.path(), CircularMode::Error);
        assert!(matches!(
            result,
            Err(ResolveError::CircularReference { .. })
        ));
    }

    #[test]
    fn dereference_circular_ignored_when_configured() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.json", &json!({"properties": {"b": {"$ref": "b.json"}}}));
        write(&dir, "b.json", &json!({"properties": {"a": {"$ref": "a.json"}}}));

        let mut schema = json!({ "$ref": "a.json" });
        dereference(&mut schema, dir.path(), CircularMode::Ignore).unwrap();

        // The cycle point keeps its $ref; everything reachable is inlined
        assert_eq!(
            schema["properties"]["b"]["properties"]["a"]["$ref"],
            "a.json"
        );
    }

    #[test]
    fn dereference_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let mut schema = json!({ "$ref": "nope.json" });
        let result = dereference(&mut schema, dir.path(), CircularMode::Error);
        assert!(matches!(
            result,
            Err(ResolveError::Load(crate::error::LoadError::FileNotFound { .. }))
        ));
    }
}
