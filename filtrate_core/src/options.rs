//! Option schemas and the closed-world option resolver
//!
//! A filter declares the options it accepts in an [`OptionSchema`]. Callers
//! pass partial [`Overrides`] at the call site and [`resolve`] turns them into
//! [`ResolvedOptions`] holding exactly the declared keys.

use std::collections::{btree_map, BTreeMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Flat mapping from option name to value, supplied per call.
pub type Overrides = serde_json::Map<String, Value>;

static NULL: Value = Value::Null;

/// Describes a single option a filter accepts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OptionSpec {
    /// Human-readable description, used by help
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Value used when the caller does not override the option.
    /// A missing default is `null`.
    #[serde(default)]
    pub default: Value,
}

impl OptionSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default<V: Into<Value>>(default: V) -> Self {
        Self {
            description: None,
            default: default.into(),
        }
    }

    #[must_use]
    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The set of options a filter accepts, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct OptionSchema(BTreeMap<String, OptionSpec>);

impl OptionSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style insert.
    #[must_use]
    pub fn with<S: Into<String>>(mut self, name: S, spec: OptionSpec) -> Self {
        self.insert(name, spec);
        self
    }

    /// Declare an option, replacing any previous declaration of the same name.
    pub fn insert<S: Into<String>>(&mut self, name: S, spec: OptionSpec) -> Option<OptionSpec> {
        self.0.insert(name.into(), spec)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.0.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, OptionSpec> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, OptionSpec)> for OptionSchema {
    fn from_iter<I: IntoIterator<Item = (S, OptionSpec)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a OptionSchema {
    type Item = (&'a String, &'a OptionSpec);
    type IntoIter = btree_map::Iter<'a, String, OptionSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Fully defaulted option values handed to a filter's operations.
///
/// Always holds exactly the keys declared by the filter's schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedOptions(BTreeMap<String, Value>);

impl ResolvedOptions {
    /// Value of the given option. Undeclared names read as `null`.
    #[must_use]
    pub fn get(&self, name: &str) -> &Value {
        self.0.get(name).unwrap_or(&NULL)
    }

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).as_str()
    }

    #[must_use]
    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name).as_u64()
    }

    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).as_i64()
    }

    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).as_f64()
    }

    #[must_use]
    pub fn is_null(&self, name: &str) -> bool {
        self.get(name).is_null()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

/// Merge caller overrides over a filter's schema defaults.
///
/// Every declared option is present in the result, taking the override when
/// given and the schema default otherwise. Override keys the schema does not
/// declare are rejected; a filter without a schema accepts no overrides.
///
/// # Errors
/// [`Error::UnknownOption`] naming the first undeclared override key.
pub fn resolve(
    filter: &str,
    schema: Option<&OptionSchema>,
    overrides: Option<&Overrides>,
) -> Result<ResolvedOptions> {
    if let Some(overrides) = overrides {
        if let Some(option) = overrides
            .keys()
            .find(|key| !schema.is_some_and(|s| s.contains(key)))
        {
            return Err(Error::UnknownOption {
                option: option.clone(),
                filter: filter.to_string(),
            });
        }
    }

    let resolved = schema
        .map(|schema| {
            schema
                .iter()
                .map(|(name, spec)| {
                    let value = overrides
                        .and_then(|o| o.get(name))
                        .unwrap_or(&spec.default);
                    (name.clone(), value.clone())
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ResolvedOptions(resolved))
}
