//! Filter descriptors and registration inputs
//!
//! A filter can be supplied in three shapes, captured by [`Registration`].
//! The registry normalizes every shape into a [`FilterDescriptor`] once, at
//! registration time, so dispatch never has to inspect shapes again.

use std::{fmt, sync::Arc};

use serde_json::Value;

use crate::{
    errors::FilterFailure,
    options::{OptionSchema, OptionSpec, ResolvedOptions},
    Error, Result,
};

/// Name used in errors for descriptors that were never registered.
pub const INLINE_FILTER_NAME: &str = "<inline>";

/// Validate operation: succeeds or raises a [`FilterFailure`].
pub type ValidateFn =
    Arc<dyn Fn(&Value, &ResolvedOptions) -> Result<(), FilterFailure> + Send + Sync>;

/// Sanitize operation: returns the sanitized value or raises a [`FilterFailure`].
pub type SanitizeFn =
    Arc<dyn Fn(&Value, &ResolvedOptions) -> Result<Value, FilterFailure> + Send + Sync>;

/// Descriptor draft supplied by filter authors.
///
/// `validate` is optional here only so that registering a draft without it
/// can be reported as [`Error::InvalidFilter`].
#[derive(Clone, Default)]
pub struct FilterSpec {
    pub description: Option<String>,
    pub validate: Option<ValidateFn>,
    pub sanitize: Option<SanitizeFn>,
    pub options: Option<OptionSchema>,
}

impl FilterSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn validate<F>(mut self, validate: F) -> Self
    where
        F: Fn(&Value, &ResolvedOptions) -> Result<(), FilterFailure> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(validate));
        self
    }

    #[must_use]
    pub fn sanitize<F>(mut self, sanitize: F) -> Self
    where
        F: Fn(&Value, &ResolvedOptions) -> Result<Value, FilterFailure> + Send + Sync + 'static,
    {
        self.sanitize = Some(Arc::new(sanitize));
        self
    }

    #[must_use]
    pub fn options(mut self, options: OptionSchema) -> Self {
        self.options = Some(options);
        self
    }

    /// Declare a single option, creating the schema if needed.
    #[must_use]
    pub fn option<S: Into<String>>(mut self, name: S, spec: OptionSpec) -> Self {
        self.options
            .get_or_insert_with(OptionSchema::new)
            .insert(name, spec);
        self
    }
}

impl fmt::Debug for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSpec")
            .field("description", &self.description)
            .field("validate", &self.validate.is_some())
            .field("sanitize", &self.sanitize.is_some())
            .field("options", &self.options)
            .finish()
    }
}

/// Values a registration inherits when its own shape does not declare them.
///
/// The schema is adopted as a whole, only when the descriptor has none of
/// its own. Individual option keys are never merged.
#[derive(Debug, Clone, Default)]
pub struct Inherited {
    pub options: Option<OptionSchema>,
}

impl Inherited {
    #[must_use]
    pub const fn options(options: Option<OptionSchema>) -> Self {
        Self { options }
    }
}

/// Canonical, normalized filter.
#[derive(Clone)]
pub struct FilterDescriptor {
    description: Option<String>,
    validate: ValidateFn,
    sanitize: Option<SanitizeFn>,
    options: Option<OptionSchema>,
}

impl FilterDescriptor {
    /// Build a descriptor from a bare validate callback.
    pub fn from_callback<F>(validate: F, options: Option<OptionSchema>) -> Self
    where
        F: Fn(&Value, &ResolvedOptions) -> Result<(), FilterFailure> + Send + Sync + 'static,
    {
        Self {
            description: None,
            validate: Arc::new(validate),
            sanitize: None,
            options,
        }
    }

    pub(crate) fn from_validate_fn(validate: ValidateFn, inherited: Inherited) -> Self {
        Self {
            description: None,
            validate,
            sanitize: None,
            options: inherited.options,
        }
    }

    /// Normalize a descriptor draft registered under `name`.
    ///
    /// # Errors
    /// [`Error::InvalidFilter`] when the draft has no validate operation.
    pub fn from_spec(name: &str, spec: FilterSpec, inherited: Inherited) -> Result<Self> {
        let Some(validate) = spec.validate else {
            return Err(Error::InvalidFilter {
                name: name.to_string(),
            });
        };
        Ok(Self {
            description: spec.description,
            validate,
            sanitize: spec.sanitize,
            options: spec.options.or(inherited.options),
        })
    }

    /// Apply a manifest's overrides: its description replaces the filter's
    /// own, and each option it declares replaces (or adds) that option in the
    /// filter's schema. Options the manifest does not mention are kept.
    #[must_use]
    pub(crate) fn layered(
        mut self,
        description: Option<String>,
        options: Option<OptionSchema>,
    ) -> Self {
        if description.is_some() {
            self.description = description;
        }
        if let Some(layer) = options {
            let schema = self.options.get_or_insert_with(OptionSchema::new);
            for (name, spec) in &layer {
                schema.insert(name.clone(), spec.clone());
            }
        }
        self
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub const fn options(&self) -> Option<&OptionSchema> {
        self.options.as_ref()
    }

    #[must_use]
    pub const fn has_sanitizer(&self) -> bool {
        self.sanitize.is_some()
    }

    /// Run the validate operation.
    ///
    /// # Errors
    /// Whatever failure the filter body raises.
    pub fn validate(&self, value: &Value, options: &ResolvedOptions) -> Result<(), FilterFailure> {
        (self.validate)(value, options)
    }

    /// Run the sanitize operation. Validate-only filters return the original
    /// value once it validates.
    ///
    /// # Errors
    /// Whatever failure the filter body raises.
    pub fn sanitize(&self, value: &Value, options: &ResolvedOptions) -> Result<Value, FilterFailure> {
        match &self.sanitize {
            Some(sanitize) => sanitize(value, options),
            None => {
                (self.validate)(value, options)?;
                Ok(value.clone())
            }
        }
    }
}

impl TryFrom<FilterSpec> for FilterDescriptor {
    type Error = Error;

    fn try_from(spec: FilterSpec) -> Result<Self> {
        Self::from_spec(INLINE_FILTER_NAME, spec, Inherited::default())
    }
}

impl fmt::Debug for FilterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDescriptor")
            .field("description", &self.description)
            .field("sanitize", &self.sanitize.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// The shapes a filter can be registered from.
#[derive(Clone)]
pub enum Registration {
    /// A bare validate operation.
    FromCallback(ValidateFn),
    /// A reference resolved through the registry's module resolver.
    FromModuleReference(String),
    /// A descriptor draft.
    FromDescriptor(FilterSpec),
}

impl Registration {
    pub fn callback<F>(validate: F) -> Self
    where
        F: Fn(&Value, &ResolvedOptions) -> Result<(), FilterFailure> + Send + Sync + 'static,
    {
        Self::FromCallback(Arc::new(validate))
    }

    pub fn module<S: Into<String>>(reference: S) -> Self {
        Self::FromModuleReference(reference.into())
    }
}

impl From<FilterSpec> for Registration {
    fn from(spec: FilterSpec) -> Self {
        Self::FromDescriptor(spec)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromCallback(_) => f.write_str("FromCallback"),
            Self::FromModuleReference(reference) => {
                f.debug_tuple("FromModuleReference").field(reference).finish()
            }
            Self::FromDescriptor(spec) => f.debug_tuple("FromDescriptor").field(spec).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn number_expected(value: &Value, _: &ResolvedOptions) -> Result<(), FilterFailure> {
        if value.is_number() {
            Ok(())
        } else {
            Err("Number expected".into())
        }
    }

    #[test]
    fn spec_without_validate_is_invalid() {
        let spec = FilterSpec::new().sanitize(|v, _| Ok(v.clone()));
        let err = FilterDescriptor::from_spec("broken", spec, Inherited::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { ref name } if name == "broken"));
    }

    #[test]
    fn own_schema_wins_over_inherited_one() {
        let own = OptionSchema::new().with("value", OptionSpec::with_default(0));
        let external = OptionSchema::new().with("other", OptionSpec::new());

        let spec = FilterSpec::new().validate(number_expected).options(own.clone());
        let descriptor =
            FilterDescriptor::from_spec("add", spec, Inherited::options(Some(external.clone())))
                .unwrap();
        assert_eq!(descriptor.options(), Some(&own));

        let spec = FilterSpec::new().validate(number_expected);
        let descriptor =
            FilterDescriptor::from_spec("add", spec, Inherited::options(Some(external.clone())))
                .unwrap();
        assert_eq!(descriptor.options(), Some(&external));
    }

    #[test]
    fn manifest_layer_replaces_declared_options_only() {
        let own = OptionSchema::new()
            .with("min", OptionSpec::with_default(0))
            .with("max", OptionSpec::new());
        let spec = FilterSpec::new()
            .description("Standard")
            .validate(number_expected)
            .options(own);
        let descriptor = FilterDescriptor::from_spec("s", spec, Inherited::default())
            .unwrap()
            .layered(
                Some("Usernames".to_string()),
                Some(
                    OptionSchema::new()
                        .with("min", OptionSpec::with_default(3))
                        .with("extra", OptionSpec::new()),
                ),
            );

        assert_eq!(descriptor.description(), Some("Usernames"));
        let options = descriptor.options().unwrap();
        assert_eq!(options.names().collect::<Vec<_>>(), vec!["extra", "max", "min"]);
        assert_eq!(options.get("min").unwrap().default, json!(3));

        let untouched = FilterDescriptor::from_callback(number_expected, None).layered(None, None);
        assert_eq!(untouched.description(), None);
        assert_eq!(untouched.options(), None);
    }

    #[test]
    fn sanitize_falls_back_to_validate() {
        let descriptor = FilterDescriptor::from_callback(number_expected, None);
        let options = ResolvedOptions::default();

        assert!(!descriptor.has_sanitizer());
        assert_eq!(descriptor.sanitize(&json!(7), &options), Ok(json!(7)));
        assert_eq!(
            descriptor.sanitize(&json!("x"), &options),
            Err(FilterFailure::new("Number expected"))
        );
    }

    #[test]
    fn option_builder_creates_schema() {
        let spec = FilterSpec::new()
            .validate(number_expected)
            .option("value", OptionSpec::with_default(0));
        let descriptor = FilterDescriptor::try_from(spec).unwrap();
        assert!(descriptor.options().is_some_and(|o| o.contains("value")));
    }
}
