//! Filter manifests
//!
//! A manifest describes filters in terms of module references. A document is
//! either a single filter, named after the file it came from:
//!
//! ```yaml
//! module: string
//! description: User names
//! options:
//!   min:
//!     default: 3
//! ```
//!
//! or a mapping from filter name to filter:
//!
//! ```yaml
//! username:
//!   module: string
//! slug:
//!   module: string
//!   options:
//!     pattern:
//!       default: "^[a-z0-9-]+$"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{options::OptionSchema, Result};

/// Manifests embedded at build time from the `filters` folder, as
/// `(file stem, contents)` pairs.
const BUNDLED: &[(&str, &str)] = include!(concat!(env!("OUT_DIR"), "/bundled_filters.rs"));

/// One filter declared by a manifest.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterManifest {
    /// Module reference the filter's operations come from
    pub module: String,
    /// Used when the module does not describe itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Used when the module declares no options of its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionSchema>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ManifestDocument {
    Single(FilterManifest),
    Bulk(BTreeMap<String, FilterManifest>),
}

impl ManifestDocument {
    /// Parse a YAML (or JSON) manifest document.
    ///
    /// # Errors
    /// When the text is not a valid manifest.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Flatten into `(name, manifest)` pairs. A single-filter document takes
    /// `default_name`.
    #[must_use]
    pub fn into_entries(self, default_name: &str) -> Vec<(String, FilterManifest)> {
        match self {
            Self::Single(manifest) => vec![(default_name.to_string(), manifest)],
            Self::Bulk(manifests) => manifests.into_iter().collect(),
        }
    }
}

/// Bundled manifests as `(file stem, contents)` pairs.
#[must_use]
pub const fn bundled() -> &'static [(&'static str, &'static str)] {
    BUNDLED
}
