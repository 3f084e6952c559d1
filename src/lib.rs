//! hyperroute
//!
//! Derives HTTP route definitions and request-validation rules from JSON
//! Hyper-Schema link descriptors, and performs runtime coercion and
//! validation of path parameters, query parameters, request bodies, and
//! headers against the derived schemas.
//!
//! The pipeline: schema document -> `$ref` dereferencing -> URI template
//! resolution -> sub-schema derivation -> compiled validation hooks ->
//! route configuration handed to an external [`Router`].
//!
//! # Example
//!
//! ```
//! use hyperroute::{
//!     resolve_href, derive_validation_schemas, LinkDescriptor, RequestContext,
//!     TemplateMode, ValidationHook, ValidationKind,
//! };
//! use serde_json::json;
//!
//! let document = json!({
//!     "properties": {
//!         "id": { "type": "integer", "minimum": 1 }
//!     },
//!     "links": [
//!         { "rel": "self", "href": "/blog/{id}", "method": "GET" }
//!     ]
//! });
//! let link: LinkDescriptor =
//!     serde_json::from_value(document["links"][0].clone()).unwrap();
//!
//! let resolved = resolve_href(&link.href, &document, TemplateMode::Permissive).unwrap();
//! assert_eq!(resolved.path, "/blog/{id}");
//!
//! let derived = derive_validation_schemas(&resolved.matches, &link, &document);
//! let hook = ValidationHook::new(
//!     ValidationKind::Params,
//!     derived.params.unwrap(),
//!     "GET",
//!     &resolved.path,
//! )
//! .unwrap();
//!
//! // Path parameters arrive as strings; coercion rewrites, then validates.
//! let mut params = json!({ "id": "25" });
//! let report = hook.apply(&mut params, &RequestContext::new());
//! assert!(report.valid);
//! assert_eq!(params, json!({ "id": 25 }));
//! ```
//!
//! # Ownership during validation
//!
//! A hook mutates the value it is handed in place, for the duration of one
//! request. The caller owns that value tree exclusively for the call;
//! compiled validators and derived schemas are immutable shared state.

mod assemble;
mod coerce;
mod derive;
mod error;
mod loader;
mod resolver;
mod template;
mod types;
mod validate;

pub use assemble::{
    assemble_route, document_links, register, Handler, HandlerBinding, RegisterOptions,
    RouteConfig, RouteValidation, Router,
};
pub use coerce::{coerce, collapse_query_arrays, lowercase_schema_properties};
pub use derive::{derive_validation_schemas, DerivedSchemas};
pub use error::{
    LoadError, RegisterError, ResolveError, TemplateError, ValidationFailure,
};
pub use loader::{discover_schemas, load_schema, load_schema_str};
pub use resolver::{dereference, navigate_fragment};
pub use template::{resolve_href, ResolvedHref};
pub use types::{
    CircularMode, HttpMethod, LinkDescriptor, MatchKind, TemplateMode, UriMatch,
};
pub use validate::{
    is_form_content_type, Report, RequestContext, ValidationHook, ValidationKind,
};
