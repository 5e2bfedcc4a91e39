//! Filtrate Core - a registry of named validation/sanitization filters
//!
//! Filters are registered under a name, each pairing a validate operation, an
//! optional sanitize operation and a declared option schema. Callers then
//! validate or sanitize values by filter name, passing option overrides that
//! are checked against the schema and completed with its defaults.
//!
//! ```
//! use filtrate_core::{Dispatcher, FilterSpec, OptionSpec, Registry};
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//! registry
//!     .add(
//!         "add",
//!         FilterSpec::new()
//!             .validate(|value, _| {
//!                 value.is_number().then_some(()).ok_or("Number expected".into())
//!             })
//!             .sanitize(|value, options| {
//!                 let base = value.as_i64().ok_or("Number expected")?;
//!                 Ok(json!(base + options.get_i64("value").unwrap_or_default()))
//!             })
//!             .option("value", OptionSpec::with_default(0))
//!             .into(),
//!         None,
//!     )
//!     .unwrap();
//!
//! let dispatcher = Dispatcher::new(&registry);
//! let overrides = json!({"value": 3}).as_object().cloned();
//! assert_eq!(dispatcher.sanitize(&json!(2), "add", overrides.as_ref()).unwrap(), json!(5));
//! assert!(dispatcher.validate(&json!("x"), "add", None).is_err());
//! ```

pub mod builtin;
pub mod descriptor;
pub mod dispatch;
pub mod errors;
pub mod manifest;
pub mod modules;
pub mod options;
pub mod registry;

pub use descriptor::{FilterDescriptor, FilterSpec, Registration, SanitizeFn, ValidateFn};
pub use dispatch::{Dispatcher, FilterTarget};
pub use errors::{Error, FilterFailure, Result};
pub use manifest::{FilterManifest, ManifestDocument};
pub use modules::{ModuleCatalog, ModuleResolver};
pub use options::{OptionSchema, OptionSpec, Overrides, ResolvedOptions};
pub use registry::{ManifestOutcome, Registry};
