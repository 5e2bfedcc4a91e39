//! Module references
//!
//! A filter can be registered by reference instead of by value. The registry
//! hands the reference to a [`ModuleResolver`], which returns another
//! [`Registration`] to normalize.

use std::{collections::HashMap, fmt, sync::Arc};

use strum::IntoEnumIterator;

use crate::{builtin::BuiltinModule, descriptor::Registration, Error, Result};

/// Resolves a module reference into the registration it exports.
pub trait ModuleResolver: Send + Sync {
    /// # Errors
    /// [`Error::UnknownModule`] when the reference cannot be resolved.
    fn resolve(&self, reference: &str) -> Result<Registration>;
}

type ModuleFactory = Arc<dyn Fn() -> Registration + Send + Sync>;

/// Named module factories.
#[derive(Clone, Default)]
pub struct ModuleCatalog {
    modules: HashMap<String, ModuleFactory>,
}

impl ModuleCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog with every [`BuiltinModule`].
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for module in BuiltinModule::iter() {
            catalog.register(module.to_string(), move || module.registration());
        }
        catalog
    }

    /// Add a module. Returns false when an existing module was replaced.
    pub fn register<S, F>(&mut self, reference: S, factory: F) -> bool
    where
        S: Into<String>,
        F: Fn() -> Registration + Send + Sync + 'static,
    {
        self.modules
            .insert(reference.into(), Arc::new(factory))
            .is_none()
    }

    #[must_use]
    pub fn contains(&self, reference: &str) -> bool {
        self.modules.contains_key(reference)
    }

    /// Known references, sorted.
    #[must_use]
    pub fn references(&self) -> Vec<String> {
        let mut references: Vec<String> = self.modules.keys().cloned().collect();
        references.sort();
        references
    }
}

impl ModuleResolver for ModuleCatalog {
    fn resolve(&self, reference: &str) -> Result<Registration> {
        self.modules
            .get(reference)
            .map(|factory| factory())
            .ok_or_else(|| Error::UnknownModule {
                reference: reference.to_string(),
            })
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCatalog")
            .field("modules", &self.references())
            .finish()
    }
}
