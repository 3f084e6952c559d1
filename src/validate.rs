//! Validator invocation and report building.
//!
//! Each derived sub-schema is compiled once at registration time into a
//! [`ValidationHook`]; at request time the hook applies the coercion step
//! for its kind, runs the compiled validator, and produces a uniform
//! `{valid, errors}` report. The validator engine's error list is attached
//! verbatim - it is the system's sole error vocabulary.

use serde::Serialize;
use serde_json::Value;

use crate::coerce::{coerce, collapse_query_arrays};
use crate::error::{RegisterError, ValidationFailure};

/// Content types whose payloads arrive stringly-typed and need coercion.
const FORM_CONTENT_TYPES: &[&str] = &["application/x-www-form-urlencoded", "multipart/form-data"];

/// Which part of the request a hook validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationKind {
    Params,
    Query,
    Payload,
    Headers,
}

impl ValidationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationKind::Params => "params",
            ValidationKind::Query => "query",
            ValidationKind::Payload => "payload",
            ValidationKind::Headers => "headers",
        }
    }
}

/// Uniform validation report. `errors` is present iff `valid` is false,
/// ordered as the underlying validator evaluated the fields.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationFailure>>,
}

impl Report {
    pub fn ok() -> Self {
        Report {
            valid: true,
            errors: None,
        }
    }

    pub fn invalid(errors: Vec<ValidationFailure>) -> Self {
        Report {
            valid: false,
            errors: Some(errors),
        }
    }
}

/// Request-scoped context a hook needs beyond the value itself.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// The request's Content-Type header, if any. Gates payload coercion.
    pub content_type: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Number of segments in a JSON Pointer ("" is the root, depth 0).
fn pointer_depth(pointer: &str) -> usize {
    pointer.matches('/').count()
}

/// Returns true for content types carrying form-encoded (stringly-typed)
/// payloads.
pub fn is_form_content_type(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| FORM_CONTENT_TYPES.iter().any(|form| ct.starts_with(form)))
        .unwrap_or(false)
}

/// A compiled request-time validation hook for one route and one kind.
///
/// Built once at registration; immutable and shared read-only by all
/// requests afterward. `apply` owns and mutates the value it is given for
/// the duration of one request - an exclusive, single-request ownership
/// window.
pub struct ValidationHook {
    kind: ValidationKind,
    schema: Value,
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for ValidationHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationHook")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl ValidationHook {
    /// Compile the derived sub-schema into a hook.
    ///
    /// # Errors
    ///
    /// Returns `RegisterError::SchemaCompile` if the schema is not a valid
    /// JSON Schema. `method` and `path` only give the error its context.
    pub fn new(
        kind: ValidationKind,
        schema: Value,
        method: &str,
        path: &str,
    ) -> Result<Self, RegisterError> {
        let validator =
            jsonschema::validator_for(&schema).map_err(|e| RegisterError::SchemaCompile {
                source_kind: kind.as_str(),
                method: method.to_string(),
                path: path.to_string(),
                message: e.to_string(),
            })?;
        Ok(ValidationHook {
            kind,
            schema,
            validator,
        })
    }

    pub fn kind(&self) -> ValidationKind {
        self.kind
    }

    /// The derived sub-schema this hook validates against.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Coerce the value for this hook's kind, then validate it.
    ///
    /// Coercion never fails; type mismatches it cannot fix are left for the
    /// validator, whose errors land in the report.
    pub fn apply(&self, value: &mut Value, ctx: &RequestContext) -> Report {
        match self.kind {
            ValidationKind::Params => coerce(value, &self.schema, false),
            ValidationKind::Query => {
                collapse_query_arrays(value);
                coerce(value, &self.schema, true);
            }
            ValidationKind::Payload => {
                // JSON payloads already carry native types; only
                // form-encoded bodies arrive as strings.
                if is_form_content_type(ctx.content_type.as_deref()) {
                    coerce(value, &self.schema, false);
                }
            }
            ValidationKind::Headers => coerce(value, &self.schema, true),
        }
        self.run(value)
    }

    fn run(&self, value: &Value) -> Report {
        let mut errors: Vec<ValidationFailure> = self
            .validator
            .iter_errors(value)
            .map(|e| ValidationFailure {
                path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        // Root-first: an error on the object itself (e.g. a missing
        // property) precedes errors inside it. Equal paths keep the
        // validator's evaluation order.
        errors.sort_by(|a, b| {
            pointer_depth(&a.path)
                .cmp(&pointer_depth(&b.path))
                .then_with(|| a.path.cmp(&b.path))
        });

        if errors.is_empty() {
            Report::ok()
        } else {
            Report::invalid(errors)
        }
    }
}
