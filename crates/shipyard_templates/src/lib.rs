//! # shipyard_templates
//!
//! Template resolution, rendering and manifest writing for Shipyard.
//!
//! Templates use a small grammar:
//!
//! - `{{KEY}}` placeholders, replaced with scalar values
//! - `{{#NAME}} ... {{/NAME}}` blocks, repeated once per item of a list value
//!
//! ## Example
//!
//! ```rust,no_run
//! use shipyard_templates::{
//!     ManifestWriter, TemplateResolver, TemplateSearchPath, TemplateVariables,
//! };
//! use std::path::Path;
//!
//! let resolver = TemplateResolver::new(TemplateSearchPath::new(
//!     "deploy/base/templates",
//!     "/usr/share/shipyard/base/templates",
//! ));
//! let template = resolver.resolve("ingress-tpl.yaml").unwrap();
//!
//! let route = TemplateVariables::new()
//!     .with("PATH", "/users")
//!     .with("METHOD", "GET");
//! let vars = TemplateVariables::new()
//!     .with("APP_NAME", "shop")
//!     .with("ROUTES", vec![route]);
//!
//! ManifestWriter::default()
//!     .write(&template, &vars, Path::new("deploy/base/ingress.yaml"))
//!     .unwrap();
//! ```

pub mod error;
pub mod renderer;
pub mod resolver;
pub mod variables;
pub mod writer;

pub use error::{TemplateError, TemplateResult};
pub use renderer::TemplateRenderer;
pub use resolver::{TemplateLocation, TemplateResolver, TemplateSearchPath};
pub use variables::{TemplateValue, TemplateVariables};
pub use writer::ManifestWriter;
