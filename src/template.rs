//! URI template resolution.
//!
//! Parses a link's `href` template (e.g. `/blog/{id}` or `/blog{?tags}`)
//! against the enclosing schema's property definitions, producing the
//! router-native path plus the ordered list of placeholder matches tagged
//! by origin (path param or query key).

use serde_json::{json, Value};

use crate::error::TemplateError;
use crate::types::{MatchKind, TemplateMode, UriMatch};

/// Result of resolving a URI template.
#[derive(Debug, Clone)]
pub struct ResolvedHref {
    /// Router-native path pattern; query expressions contribute nothing here.
    pub path: String,
    /// Placeholder matches in template appearance order.
    pub matches: Vec<UriMatch>,
}

/// Resolve a URI template against the document's property definitions.
///
/// Three placeholder forms are recognized:
/// - `{name}` before any `?` - a path parameter
/// - `{?a,b}` - a query expression declaring query keys `a` and `b`
/// - `key={name}` after a literal `?` - a query key
///
/// Each placeholder name is looked up in the document's `properties`; an
/// undeclared name falls back to a permissive string definition, or fails
/// in `TemplateMode::Strict`.
///
/// # Errors
///
/// Returns `TemplateError::Syntax` for unbalanced or empty placeholders,
/// and `TemplateError::UnknownPlaceholder` in strict mode.
pub fn resolve_href(
    template: &str,
    root_schema: &Value,
    mode: TemplateMode,
) -> Result<ResolvedHref, TemplateError> {
    let (path_part, query_part) = split_query(template);

    let mut path = String::new();
    let mut matches = Vec::new();

    let mut rest = path_part;
    while let Some(open) = rest.find('{') {
        path.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| TemplateError::Syntax {
            template: template.to_string(),
            message: "unbalanced '{'".to_string(),
        })?;
        let expr = &after[..close];

        if let Some(query_list) = expr.strip_prefix('?') {
            // Query expression: declares query keys, no path contribution
            for name in query_list.split(',') {
                let name = validate_name(name, template)?;
                let definition = lookup_definition(name, root_schema, template, mode)?;
                matches.push(UriMatch {
                    key: name.to_string(),
                    kind: MatchKind::Query,
                    definition,
                });
            }
        } else {
            let name = validate_name(expr, template)?;
            let definition = lookup_definition(name, root_schema, template, mode)?;
            matches.push(UriMatch {
                key: name.to_string(),
                kind: MatchKind::Param,
                definition,
            });
            path.push_str(&render_param(name));
        }

        rest = &after[close + 1..];
    }
    if rest.contains('}') {
        return Err(TemplateError::Syntax {
            template: template.to_string(),
            message: "unbalanced '}'".to_string(),
        });
    }
    path.push_str(rest);

    // Literal query string: placeholders of the form key={name}
    if let Some(query) = query_part {
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let Some((_, value)) = pair.split_once('=') else {
                continue;
            };
            let Some(name) = value.strip_prefix('{').and_then(|v| v.strip_suffix('}')) else {
                continue;
            };
            let name = validate_name(name, template)?;
            let definition = lookup_definition(name, root_schema, template, mode)?;
            matches.push(UriMatch {
                key: name.to_string(),
                kind: MatchKind::Query,
                definition,
            });
        }
    }

    Ok(ResolvedHref { path, matches })
}

/// Split a template at the first literal `?`, ignoring any `?` inside a
/// placeholder (the `{?a,b}` query-expression form).
fn split_query(template: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    for (i, c) in template.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '?' if depth == 0 => return (&template[..i], Some(&template[i + 1..])),
            _ => {}
        }
    }
    (template, None)
}

/// Render a path placeholder in the target router's parameter syntax.
///
/// The single point where template syntax and router syntax meet.
fn render_param(name: &str) -> String {
    format!("{{{}}}", name)
}

fn validate_name<'a>(name: &'a str, template: &str) -> Result<&'a str, TemplateError> {
    let name = name.trim();
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(TemplateError::Syntax {
            template: template.to_string(),
            message: format!("invalid placeholder name \"{}\"", name),
        });
    }
    Ok(name)
}

fn lookup_definition(
    name: &str,
    root_schema: &Value,
    template: &str,
    mode: TemplateMode,
) -> Result<Value, TemplateError> {
    if let Some(definition) = root_schema.get("properties").and_then(|p| p.get(name)) {
        return Ok(definition.clone());
    }

    match mode {
        TemplateMode::Permissive => {
            tracing::debug!(
                placeholder = name,
                template,
                "no schema definition for placeholder, falling back to string"
            );
            Ok(json!({ "type": "string" }))
        }
        TemplateMode::Strict => Err(TemplateError::UnknownPlaceholder {
            name: name.to_string(),
            template: template.to_string(),
        }),
    }
}
