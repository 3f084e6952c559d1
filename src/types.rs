//! Core types for link descriptors and route derivation.

use serde::Deserialize;
use serde_json::Value;

/// One declared API operation within a hyper-schema document.
///
/// Immutable once loaded. `schema` constrains the request payload;
/// `target_schema` describes the response (carried through but not
/// validated); `header_schema` constrains request headers.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkDescriptor {
    pub href: String,
    pub method: HttpMethod,
    pub rel: String,
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default, rename = "targetSchema")]
    pub target_schema: Option<Value>,
    #[serde(default, rename = "headerSchema")]
    pub header_schema: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

/// HTTP method of a link. Parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(format!("unknown HTTP method \"{}\"", other)),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin of a URI template placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// A path segment placeholder, e.g. `/blog/{id}`.
    Param,
    /// A query-string key, e.g. `{?tags}` or `?tag={tag}`.
    Query,
}

/// A template placeholder cross-referenced against the schema's declared
/// properties. Ordering of matches follows template appearance order.
#[derive(Debug, Clone)]
pub struct UriMatch {
    pub key: String,
    pub kind: MatchKind,
    pub definition: Value,
}

/// Policy for placeholders that have no schema-declared definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateMode {
    /// Fall back to an unconstrained string definition.
    #[default]
    Permissive,
    /// Fail registration with `TemplateError::UnknownPlaceholder`.
    Strict,
}

/// Policy for circular `$ref` chains during dereferencing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircularMode {
    /// Fail with `ResolveError::CircularReference`.
    #[default]
    Error,
    /// Leave the circular `$ref` in place for the validator engine.
    Ignore,
}
