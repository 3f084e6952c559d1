//! Route assembly and registration.
//!
//! Discovers schema documents, dereferences them, derives per-link
//! validation hooks, binds handlers, and hands each finished route
//! configuration to the external router exactly once. Registration order
//! is schema-file discovery order, then link declaration order within each
//! document. Any failure aborts registration; no partial registration is
//! attempted.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::derive::derive_validation_schemas;
use crate::error::RegisterError;
use crate::loader::{discover_schemas, load_schema};
use crate::resolver::dereference;
use crate::template::resolve_href;
use crate::types::{CircularMode, HttpMethod, LinkDescriptor, TemplateMode};
use crate::validate::{RequestContext, ValidationHook, ValidationKind};

/// Request handler bound to a route. Receives the request context and the
/// (coerced) request value; what "the request value" means is the embedding
/// application's contract with its handlers.
pub type Handler = Arc<dyn Fn(&RequestContext, &Value) -> Value + Send + Sync>;

/// The optional validation hooks of one route. A hook exists only when the
/// corresponding match group or declared schema was non-empty.
#[derive(Debug, Default)]
pub struct RouteValidation {
    pub params: Option<ValidationHook>,
    pub query: Option<ValidationHook>,
    pub payload: Option<ValidationHook>,
    pub headers: Option<ValidationHook>,
}

impl RouteValidation {
    pub fn is_empty(&self) -> bool {
        self.params.is_none()
            && self.query.is_none()
            && self.payload.is_none()
            && self.headers.is_none()
    }
}

/// One per link: everything the external router needs to serve the
/// operation. Consumed exactly once at registration time.
pub struct RouteConfig {
    pub path: String,
    pub method: HttpMethod,
    pub description: Option<String>,
    pub validate: RouteValidation,
    pub handler: Option<Handler>,
}

impl std::fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteConfig")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("description", &self.description)
            .field("validate", &self.validate)
            .field("handler", &self.handler.as_ref().map(|_| "<handler>"))
            .finish()
    }
}

/// The external router seam: owns routing tables, connection handling, and
/// response transmission.
pub trait Router {
    fn register(&mut self, route: RouteConfig);
}

/// How handlers are attached to the nearly-built route configurations.
pub enum HandlerBinding<'a> {
    /// Invoked with `(source_file, schema, link)`; returns the handler.
    Factory(&'a dyn Fn(&Path, &Value, &LinkDescriptor) -> Handler),
    /// Invoked with the nearly-built route configuration plus
    /// `(source_file, schema, link)`; may mutate the configuration, and
    /// must install the handler.
    Prepare(&'a dyn Fn(&mut RouteConfig, &Path, &Value, &LinkDescriptor)),
}

/// Options for [`register`].
pub struct RegisterOptions<'a> {
    /// Glob pattern (or explicit path) selecting the schema documents.
    pub pattern: &'a str,
    pub binding: HandlerBinding<'a>,
    pub template_mode: TemplateMode,
    pub circular_mode: CircularMode,
}

impl<'a> RegisterOptions<'a> {
    pub fn new(pattern: &'a str, binding: HandlerBinding<'a>) -> Self {
        RegisterOptions {
            pattern,
            binding,
            template_mode: TemplateMode::default(),
            circular_mode: CircularMode::default(),
        }
    }

    pub fn template_mode(mut self, mode: TemplateMode) -> Self {
        self.template_mode = mode;
        self
    }

    pub fn circular_mode(mut self, mode: CircularMode) -> Self {
        self.circular_mode = mode;
        self
    }
}

/// Derive and register one route per link in every discovered document.
///
/// Returns the number of routes registered.
///
/// # Errors
///
/// Any load, dereference, template, compile, or binding failure is fatal
/// and surfaced before a single further route is registered.
pub fn register(router: &mut dyn Router, options: RegisterOptions<'_>) -> Result<usize, RegisterError> {
    let files = discover_schemas(options.pattern)?;
    let mut count = 0;

    for file in &files {
        let mut schema = load_schema(file)?;
        let base_dir = file.parent().unwrap_or_else(|| Path::new("."));
        dereference(&mut schema, base_dir, options.circular_mode)?;

        let links = document_links(&schema, file)?;
        if links.is_empty() {
            tracing::warn!(file = %file.display(), "schema document declares no links");
            continue;
        }

        for link in &links {
            let route = assemble_route(file, &schema, link, &options)?;
            tracing::debug!(
                method = route.method.as_str(),
                path = %route.path,
                file = %file.display(),
                "registering route"
            );
            router.register(route);
            count += 1;
        }
    }

    Ok(count)
}

/// Build the route configuration for a single link.
pub fn assemble_route(
    file: &Path,
    schema: &Value,
    link: &LinkDescriptor,
    options: &RegisterOptions<'_>,
) -> Result<RouteConfig, RegisterError> {
    let resolved = resolve_href(&link.href, schema, options.template_mode)?;
    let derived = derive_validation_schemas(&resolved.matches, link, schema);

    let method = link.method.as_str();
    let compile = |kind: ValidationKind, sub: Option<Value>| {
        sub.map(|s| ValidationHook::new(kind, s, method, &resolved.path))
            .transpose()
    };

    let validate = RouteValidation {
        params: compile(ValidationKind::Params, derived.params)?,
        query: compile(ValidationKind::Query, derived.query)?,
        payload: compile(ValidationKind::Payload, derived.payload)?,
        headers: compile(ValidationKind::Headers, derived.headers)?,
    };

    let mut route = RouteConfig {
        path: resolved.path,
        method: link.method,
        description: link.description.clone(),
        validate,
        handler: None,
    };

    match &options.binding {
        HandlerBinding::Factory(make_handler) => {
            route.handler = Some(make_handler(file, schema, link));
        }
        HandlerBinding::Prepare(prepare) => {
            prepare(&mut route, file, schema, link);
        }
    }

    if route.handler.is_none() {
        return Err(RegisterError::MissingHandler {
            method: route.method.to_string(),
            path: route.path,
        });
    }

    Ok(route)
}

/// Extract and parse the document's link descriptors, in declaration order.
pub fn document_links(schema: &Value, file: &Path) -> Result<Vec<LinkDescriptor>, RegisterError> {
    let Some(links) = schema.get("links").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    links
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry.clone()).map_err(|e| RegisterError::InvalidLink {
                file: file.to_path_buf(),
                index,
                message: e.to_string(),
            })
        })
        .collect()
}
