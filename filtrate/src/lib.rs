//! Filter discovery and the host side of `filtrate`.
//!
//! [`filtrate_core`] holds the registry and dispatcher; this crate wires them
//! to the outside world: the settings file, manifest directories on disk and
//! the `filtrate` command line.
//!
//! ```no_run
//! use filtrate::{env::RealEnvironment, loader, Config};
//!
//! let config = Config::new(None)?;
//! let settings = config.get_settings_from_file()?;
//! let (registry, report) = loader::bootstrap(&RealEnvironment, &settings, &[config.filters_dir()])?;
//! println!("{} filters, {} failures", registry.len(), report.failures.len());
//! # Ok::<(), filtrate::error::Error>(())
//! ```

mod config;
mod data;
pub mod env;
pub mod error;
pub mod loader;

pub use config::{Config, Settings, DEFAULT_FILTER_DIR, FILTER_DIRS_ENV};
pub use data::CmdExit;
pub use filtrate_core::{
    Dispatcher, FilterDescriptor, FilterSpec, FilterTarget, OptionSchema, OptionSpec, Overrides,
    Registration, Registry,
};
