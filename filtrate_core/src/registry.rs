//! The filter registry
//!
//! Maps filter names to normalized [`FilterDescriptor`]s. Registration inputs
//! of every shape are normalized here, once, so dispatch only ever sees the
//! canonical descriptor.

use std::{collections::HashMap, fmt, fmt::Write as _, sync::Arc};

use tracing::{debug, warn};

use crate::{
    descriptor::{FilterDescriptor, Inherited, Registration},
    manifest::{self, FilterManifest, ManifestDocument},
    modules::{ModuleCatalog, ModuleResolver},
    options::OptionSchema,
    Error, Result,
};

/// How many module references may be chained before registration gives up.
pub const MAX_MODULE_DEPTH: usize = 8;

/// Outcome of registering one filter declared by a manifest.
#[derive(Debug)]
pub struct ManifestOutcome {
    pub name: String,
    /// `Ok(true)` when newly added, `Ok(false)` when an existing filter was
    /// overwritten.
    pub result: Result<bool>,
}

pub struct Registry {
    filters: HashMap<String, Arc<FilterDescriptor>>,
    order: Vec<String>,
    modules: Box<dyn ModuleResolver>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// An empty registry resolving module references against the builtin
    /// catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_modules(ModuleCatalog::builtin())
    }

    /// An empty registry using the given module resolver.
    pub fn with_modules<M: ModuleResolver + 'static>(modules: M) -> Self {
        Self {
            filters: HashMap::new(),
            order: Vec::new(),
            modules: Box::new(modules),
        }
    }

    /// A registry holding every bundled filter.
    ///
    /// # Errors
    /// When a bundled manifest is malformed or references an unknown module.
    pub fn with_bundled() -> Result<Self> {
        let mut registry = Self::new();
        registry.load_bundled()?;
        Ok(registry)
    }

    /// Register every bundled filter.
    ///
    /// # Errors
    /// When a bundled manifest is malformed or references an unknown module.
    pub fn load_bundled(&mut self) -> Result<()> {
        for (origin, content) in manifest::bundled() {
            for outcome in self.load_manifest_source(origin, content)? {
                outcome.result?;
            }
        }
        Ok(())
    }

    /// Register a filter.
    ///
    /// `options` is adopted by descriptor drafts that declare no schema of
    /// their own and by bare callbacks; it is never merged key by key.
    ///
    /// Returns `true` when `name` was not registered before and `false` when
    /// an existing filter was overwritten.
    ///
    /// # Errors
    /// * [`Error::MissingArgument`] for an empty name
    /// * [`Error::InvalidFilter`] for a draft without a validate operation
    /// * [`Error::UnknownModule`] / [`Error::ModuleDepth`] for module references
    ///   that cannot be resolved
    pub fn add(
        &mut self,
        name: &str,
        registration: Registration,
        options: Option<OptionSchema>,
    ) -> Result<bool> {
        self.insert(name, registration, Inherited::options(options))
    }

    /// Register a filter declared by a manifest.
    ///
    /// The manifest is layered over what the module exports: its description
    /// replaces the module's, and each option it lists replaces or extends the
    /// module's schema.
    ///
    /// # Errors
    /// Same as [`Registry::add`].
    pub fn register_manifest(&mut self, name: &str, manifest: FilterManifest) -> Result<bool> {
        Self::check_name(name)?;
        let descriptor = self
            .normalize(
                name,
                Registration::FromModuleReference(manifest.module),
                Inherited::default(),
                0,
            )?
            .layered(manifest.description, manifest.options);
        Ok(self.store(name, descriptor))
    }

    /// Parse a manifest document and register every filter it declares.
    /// A single-filter document is registered as `origin`.
    ///
    /// Registration failures are reported per filter so the caller can skip
    /// them; only an unparsable document fails as a whole.
    ///
    /// # Errors
    /// [`Error::Manifest`] when the document cannot be parsed.
    pub fn load_manifest_source(
        &mut self,
        origin: &str,
        content: &str,
    ) -> Result<Vec<ManifestOutcome>> {
        let document = ManifestDocument::parse(content)?;
        Ok(document
            .into_entries(origin)
            .into_iter()
            .map(|(name, manifest)| {
                let result = self.register_manifest(&name, manifest);
                ManifestOutcome { name, result }
            })
            .collect())
    }

    fn check_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::MissingArgument {
                argument: "name",
                message: "filter name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, name: &str, registration: Registration, inherited: Inherited) -> Result<bool> {
        Self::check_name(name)?;
        let descriptor = self.normalize(name, registration, inherited, 0)?;
        Ok(self.store(name, descriptor))
    }

    fn store(&mut self, name: &str, descriptor: FilterDescriptor) -> bool {
        let newly_added = self
            .filters
            .insert(name.to_string(), Arc::new(descriptor))
            .is_none();

        if newly_added {
            self.order.push(name.to_string());
            debug!(filter = name, "filter registered");
        } else {
            warn!(filter = name, "filter overwritten by a new registration");
        }
        newly_added
    }

    fn normalize(
        &self,
        name: &str,
        registration: Registration,
        inherited: Inherited,
        depth: usize,
    ) -> Result<FilterDescriptor> {
        match registration {
            Registration::FromCallback(validate) => {
                Ok(FilterDescriptor::from_validate_fn(validate, inherited))
            }
            Registration::FromModuleReference(reference) => {
                if depth >= MAX_MODULE_DEPTH {
                    return Err(Error::ModuleDepth {
                        reference,
                        limit: MAX_MODULE_DEPTH,
                    });
                }
                debug!(filter = name, module = %reference, "resolving module reference");
                let resolved = self.modules.resolve(&reference)?;
                self.normalize(name, resolved, inherited, depth + 1)
            }
            Registration::FromDescriptor(spec) => FilterDescriptor::from_spec(name, spec, inherited),
        }
    }

    /// Registered filter names, in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.order.clone()
    }

    /// # Errors
    /// [`Error::UnknownFilter`] listing every registered name.
    pub fn lookup(&self, name: &str) -> Result<Arc<FilterDescriptor>> {
        self.filters
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownFilter {
                name: name.to_string(),
                known: self.list(),
            })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Human-readable description of a filter and its options.
    ///
    /// # Errors
    /// * [`Error::MissingArgument`] when no name is given
    /// * [`Error::UnknownFilter`] when the name is not registered
    pub fn help(&self, name: Option<&str>) -> Result<String> {
        let Some(name) = name else {
            return Err(Error::MissingArgument {
                argument: "name",
                message: format!(
                    "specify the filter you need help about, one of: {}",
                    self.list().join(", ")
                ),
            });
        };
        let descriptor = self.lookup(name)?;

        let mut out = String::new();
        let _ = writeln!(out, "Help for filter {name}:");
        let _ = writeln!(
            out,
            "| {}",
            descriptor.description().unwrap_or("No description available.")
        );
        match descriptor.options() {
            Some(options) if !options.is_empty() => {
                let _ = writeln!(out, "| Options:");
                for (option, spec) in options {
                    let _ = writeln!(
                        out,
                        "|  * {option}: {} (default value = {})",
                        spec.description.as_deref().unwrap_or("No description"),
                        spec.default
                    );
                }
            }
            _ => {
                let _ = writeln!(out, "| This filter takes no option.");
            }
        }
        Ok(out)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("filters", &self.order)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::{
        descriptor::FilterSpec,
        errors::FilterFailure,
        options::{OptionSpec, ResolvedOptions},
    };

    fn noop(_: &Value, _: &ResolvedOptions) -> Result<(), FilterFailure> {
        Ok(())
    }

    #[test]
    fn add_reports_first_registration_only() {
        let mut registry = Registry::new();
        assert!(registry.add("fake", Registration::callback(noop), None).unwrap());
        assert!(!registry.add("fake", Registration::callback(noop), None).unwrap());
        assert!(!registry.add("fake", FilterSpec::new().validate(noop).into(), None).unwrap());
        assert_eq!(registry.list(), vec!["fake".to_string()]);
    }

    #[test]
    fn list_keeps_registration_order() {
        let mut registry = Registry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.add(name, Registration::callback(noop), None).unwrap();
        }
        registry.add("alpha", Registration::callback(noop), None).unwrap();
        assert_eq!(registry.list(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn rejects_empty_name() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.add("", Registration::callback(noop), None),
            Err(Error::MissingArgument { argument: "name", .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn rejects_descriptor_without_validate() {
        let mut registry = Registry::new();
        let err = registry
            .add("broken", FilterSpec::new().description("no validate").into(), None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { ref name } if name == "broken"));
        assert!(!registry.contains("broken"));
    }

    #[test]
    fn callback_adopts_external_options() {
        let mut registry = Registry::new();
        let schema = OptionSchema::new().with("value", OptionSpec::with_default(0));
        registry
            .add("cb", Registration::callback(noop), Some(schema.clone()))
            .unwrap();
        assert_eq!(registry.lookup("cb").unwrap().options(), Some(&schema));
    }

    #[test]
    fn bare_module_reference_exports_its_own_descriptor() {
        let mut registry = Registry::new();
        assert!(registry
            .add("str", Registration::module("string"), None)
            .unwrap());

        let descriptor = registry.lookup("str").unwrap();
        assert!(descriptor.has_sanitizer());
        assert_eq!(descriptor.description(), Some("Standard string validations"));
        assert_eq!(
            descriptor.options().unwrap().names().collect::<Vec<_>>(),
            vec!["max", "min", "pattern", "replace"]
        );

        let help = registry.help(Some("str")).unwrap();
        assert!(help.contains("|  * min: Minimum length (default value = 0)"));
    }

    #[test]
    fn module_schema_wins_over_external_one() {
        let mut registry = Registry::new();
        let schema = OptionSchema::new().with("size", OptionSpec::with_default(2));
        registry
            .add("name", Registration::module("string"), Some(schema))
            .unwrap();

        let options = registry.lookup("name").unwrap().options().cloned().unwrap();
        assert!(options.contains("min"));
        assert!(!options.contains("size"));
    }

    #[test]
    fn manifest_layers_over_module_schema() {
        let mut registry = Registry::new();
        let manifest: FilterManifest = serde_yaml::from_str(
            r"
module: string
description: Account names
options:
  min:
    default: 3
",
        )
        .unwrap();
        assert!(registry.register_manifest("username", manifest).unwrap());

        let descriptor = registry.lookup("username").unwrap();
        assert_eq!(descriptor.description(), Some("Account names"));
        let options = descriptor.options().unwrap();
        assert_eq!(options.get("min").unwrap().default, json!(3));
        assert!(options.contains("pattern"));
    }

    #[test]
    fn manifest_with_empty_name_is_rejected() {
        let mut registry = Registry::new();
        let manifest: FilterManifest = serde_yaml::from_str("module: string").unwrap();
        assert!(matches!(
            registry.register_manifest("", manifest),
            Err(Error::MissingArgument { .. })
        ));
    }

    #[test]
    fn unknown_module_fails() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.add("x", Registration::module("missing"), None),
            Err(Error::UnknownModule { .. })
        ));
    }

    #[test]
    fn cyclic_module_references_are_bounded() {
        let mut catalog = ModuleCatalog::new();
        catalog.register("ping", || Registration::module("pong"));
        catalog.register("pong", || Registration::module("ping"));
        let mut registry = Registry::with_modules(catalog);

        assert!(matches!(
            registry.add("loop", Registration::module("ping"), None),
            Err(Error::ModuleDepth { limit: MAX_MODULE_DEPTH, .. })
        ));
    }

    #[test]
    fn lookup_unknown_lists_known_names() {
        let mut registry = Registry::new();
        registry.add("a", Registration::callback(noop), None).unwrap();
        registry.add("b", Registration::callback(noop), None).unwrap();
        let err = registry.lookup("c").unwrap_err();
        assert!(matches!(err, Error::UnknownFilter { ref known, .. } if known == &["a", "b"]));
    }

    #[test]
    fn bundled_registry_contains_string() {
        let registry = Registry::with_bundled().unwrap();
        assert!(registry.contains("string"));
        let descriptor = registry.lookup("string").unwrap();
        assert_eq!(descriptor.description(), Some("Standard string validations"));
        let options = descriptor.options().unwrap();
        assert_eq!(
            options.names().collect::<Vec<_>>(),
            vec!["max", "min", "pattern", "replace"]
        );
        assert_eq!(options.get("min").unwrap().default, json!(0));
    }

    #[test]
    fn manifest_outcomes_are_per_filter() {
        let mut registry = Registry::new();
        let outcomes = registry
            .load_manifest_source(
                "bulk",
                r"
good:
  module: string
bad:
  module: missing
",
            )
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        let bad = outcomes.iter().find(|o| o.name == "bad").unwrap();
        assert!(matches!(bad.result, Err(Error::UnknownModule { .. })));
        let good = outcomes.iter().find(|o| o.name == "good").unwrap();
        assert!(matches!(good.result, Ok(true)));
        assert_eq!(registry.list(), vec!["good"]);
    }

    #[test]
    fn help_without_name_lists_filters() {
        let mut registry = Registry::new();
        registry.add("add", Registration::callback(noop), None).unwrap();
        let err = registry.help(None).unwrap_err();
        assert!(matches!(err, Error::MissingArgument { .. }));
        assert!(err.to_string().contains("add"));
    }

    #[test]
    fn help_for_filter_without_options() {
        let mut registry = Registry::new();
        registry.add("fake", Registration::callback(noop), None).unwrap();
        insta::assert_snapshot!(registry.help(Some("fake")).unwrap(), @r"
        Help for filter fake:
        | No description available.
        | This filter takes no option.
        ");
    }

    #[test]
    fn help_renders_json_defaults() {
        let mut registry = Registry::new();
        let spec = FilterSpec::new()
            .description("Adds a number")
            .validate(noop)
            .option("value", OptionSpec::with_default(0).description("Added amount"))
            .option("label", OptionSpec::new());
        registry.add("add", spec.into(), None).unwrap();

        insta::assert_snapshot!(registry.help(Some("add")).unwrap(), @r"
        Help for filter add:
        | Adds a number
        | Options:
        |  * label: No description (default value = null)
        |  * value: Added amount (default value = 0)
        ");
    }

    #[test]
    fn help_for_unknown_filter_fails() {
        let registry = Registry::new();
        assert!(matches!(
            registry.help(Some("nope")),
            Err(Error::UnknownFilter { .. })
        ));
    }
}
