//! Environment abstraction for testability.
//!
//! Provides the [`Environment`] trait to abstract the external I/O the
//! filter loader needs (env vars, working directory, filesystem), enabling
//! fully sandboxed testing.

use std::{
    collections::{HashMap, HashSet},
    io,
    path::{Path, PathBuf},
};

use crate::error::{Error, Result};

/// Abstracts all interaction with the operating system.
///
/// The real application uses [`RealEnvironment`]; tests inject
/// [`MockEnvironment`] so that nothing touches the real system.
pub trait Environment: Send + Sync {
    /// Read an environment variable.
    fn var(&self, key: &str) -> Option<String>;

    /// Get the current working directory.
    ///
    /// # Errors
    /// Returns an error if the working directory cannot be determined.
    fn current_dir(&self) -> Result<PathBuf>;

    /// Get the user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// Check if a path is an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// List the files directly inside a directory, sorted by path.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Read a file's contents.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    fn read_file(&self, path: &Path) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Real implementation (used in production)
// ---------------------------------------------------------------------------

/// Production [`Environment`] backed by the real OS.
pub struct RealEnvironment;

impl Environment for RealEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn current_dir(&self) -> Result<PathBuf> {
        std::env::current_dir().map_err(Into::into)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_file(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }
}

// ---------------------------------------------------------------------------
// Mock implementation (used in tests, no real I/O)
// ---------------------------------------------------------------------------

/// A fully in-memory [`Environment`] for sandboxed testing.
///
/// Every field is public so tests can construct scenarios declaratively.
#[derive(Debug, Clone, Default)]
pub struct MockEnvironment {
    pub env_vars: HashMap<String, String>,
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
    /// Directories that exist even when they hold no files.
    pub existing_dirs: HashSet<PathBuf>,
    /// Virtual filesystem: path → file contents.
    pub files: HashMap<PathBuf, String>,
}

impl MockEnvironment {
    /// Add a virtual file.
    #[must_use]
    pub fn with_file<P: Into<PathBuf>, S: Into<String>>(mut self, path: P, content: S) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl Environment for MockEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.env_vars.get(key).cloned()
    }

    fn current_dir(&self) -> Result<PathBuf> {
        Ok(self.cwd.clone())
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.existing_dirs.contains(path)
            || self
                .files
                .keys()
                .any(|file| file.ancestors().skip(1).any(|dir| dir == path))
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !self.is_dir(dir) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("mock directory not found: {}", dir.display()),
            )));
        }
        let mut files: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|file| file.parent() == Some(dir))
            .cloned()
            .collect();
        files.sort();
        Ok(files)
    }

    fn read_file(&self, path: &Path) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("mock file not found: {}", path.display()),
            ))
        })
    }
}
