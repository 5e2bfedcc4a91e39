//! Discover filter manifests on disk and register them.
//!
//! A directory is scanned for `.yaml`, `.yml` and `.json` files. Each file is
//! one manifest document; single-filter documents are named after the file
//! stem. A file that cannot be read or parsed, or a filter that cannot be
//! registered, is logged and skipped so one broken manifest never keeps the
//! rest from loading.

use std::path::{Path, PathBuf};

use filtrate_core::Registry;
use tracing::{debug, warn};

use crate::{config::Settings, env::Environment, error::Error, error::Result};

const MANIFEST_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// A manifest file, or one filter inside it, that could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    /// Set when the document parsed but this filter failed to register
    pub filter: Option<String>,
    pub error: Error,
}

/// What a load pass did to the registry.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Filters registered under a new name
    pub registered: Vec<String>,
    /// Filters that replaced an earlier registration
    pub overwritten: Vec<String>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    fn merge(&mut self, other: Self) {
        self.registered.extend(other.registered);
        self.overwritten.extend(other.overwritten);
        self.failures.extend(other.failures);
    }

    /// True when every discovered manifest loaded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

fn is_manifest(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'));
    !hidden
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| MANIFEST_EXTENSIONS.contains(&ext))
}

/// Register every manifest found directly inside `dir`.
///
/// A missing directory loads nothing. Files are visited in path order, so
/// a later file wins when two declare the same filter name.
pub fn load_dir(registry: &mut Registry, env: &dyn Environment, dir: &Path) -> LoadReport {
    let mut report = LoadReport::default();
    if !env.is_dir(dir) {
        debug!(dir = %dir.display(), "filter directory not found, skipping");
        return report;
    }

    let files = match env.list_files(dir) {
        Ok(files) => files,
        Err(error) => {
            warn!(dir = %dir.display(), error = %error, "could not list filter directory");
            report.failures.push(LoadFailure {
                path: dir.to_path_buf(),
                filter: None,
                error,
            });
            return report;
        }
    };

    for path in files.into_iter().filter(|path| is_manifest(path)) {
        report.merge(load_file(registry, env, &path));
    }
    debug!(
        dir = %dir.display(),
        registered = report.registered.len(),
        overwritten = report.overwritten.len(),
        failures = report.failures.len(),
        "filter directory loaded"
    );
    report
}

/// Register the filters declared by one manifest file.
pub fn load_file(registry: &mut Registry, env: &dyn Environment, path: &Path) -> LoadReport {
    let mut report = LoadReport::default();
    let origin = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();

    let outcomes = env
        .read_file(path)
        .and_then(|content| {
            registry
                .load_manifest_source(origin, &content)
                .map_err(Error::from)
        });
    let outcomes = match outcomes {
        Ok(outcomes) => outcomes,
        Err(error) => {
            warn!(path = %path.display(), error = %error, "could not load filter manifest");
            report.failures.push(LoadFailure {
                path: path.to_path_buf(),
                filter: None,
                error,
            });
            return report;
        }
    };

    for outcome in outcomes {
        match outcome.result {
            Ok(true) => report.registered.push(outcome.name),
            Ok(false) => report.overwritten.push(outcome.name),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    filter = %outcome.name,
                    error = %error,
                    "could not register filter"
                );
                report.failures.push(LoadFailure {
                    path: path.to_path_buf(),
                    filter: Some(outcome.name),
                    error: error.into(),
                });
            }
        }
    }
    report
}

/// Build a registry from the settings: bundled filters first (when enabled),
/// then every search directory followed by `extra_dirs`.
///
/// # Errors
///
/// Will return `Err` when a bundled manifest is broken or the working
/// directory cannot be determined. Problems with user manifests only show
/// up in the returned [`LoadReport`].
pub fn bootstrap(
    env: &dyn Environment,
    settings: &Settings,
    extra_dirs: &[PathBuf],
) -> Result<(Registry, LoadReport)> {
    let mut registry = Registry::new();
    if settings.load_bundled {
        registry.load_bundled()?;
        debug!(filters = registry.len(), "bundled filters loaded");
    }

    let mut dirs = settings.search_dirs(env)?;
    for dir in extra_dirs {
        if !dirs.contains(dir) {
            dirs.push(dir.clone());
        }
    }

    let mut report = LoadReport::default();
    for dir in &dirs {
        report.merge(load_dir(&mut registry, env, dir));
    }
    Ok((registry, report))
}
