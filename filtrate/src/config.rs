//! Manage the app configuration by creating, resetting and reading the
//! settings file

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use serde_derive::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    env::Environment,
    error::{Error, Result},
};

const DEFAULT_SETTING_FILE_NAME: &str = "settings.yaml";

/// Folder, inside the configuration folder, scanned for user filters.
const CONFIG_FILTERS_FOLDER: &str = "filters";

/// Environment variable listing extra filter directories, separated like
/// `PATH`.
pub const FILTER_DIRS_ENV: &str = "FILTRATE_FILTER_DIRS";

/// Default directory, relative to the working directory, scanned for
/// filter manifests.
pub const DEFAULT_FILTER_DIR: &str = "enabled_filters";

/// describe configuration folder
#[derive(Debug)]
pub struct Config {
    /// Configuration folder path.
    pub root_folder: PathBuf,
    /// config file.
    pub setting_file_path: PathBuf,
}

/// Describe the configuration yaml
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Register the filters bundled with filtrate.
    #[serde(default = "default_load_bundled")]
    pub load_bundled: bool,
    /// Directories scanned for filter manifests. Relative paths resolve
    /// against the working directory.
    #[serde(default = "default_filter_dirs")]
    pub filter_dirs: Vec<PathBuf>,
}

const fn default_load_bundled() -> bool {
    true
}

fn default_filter_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from(DEFAULT_FILTER_DIR)]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            load_bundled: default_load_bundled(),
            filter_dirs: default_filter_dirs(),
        }
    }
}

impl Config {
    /// Get application setting config.
    ///
    /// # Errors
    ///
    /// Will return `Err` error return on load/save config
    pub fn new(path: Option<&str>) -> Result<Self> {
        let package_name = env!("CARGO_PKG_NAME");

        let config_folder = match path {
            Some(p) => PathBuf::from(p),
            None => match dirs::home_dir() {
                Some(home) => default_config_folder(
                    &home,
                    dirs::config_dir().as_deref(),
                    package_name,
                ),
                None => return Err(Error::Config("could not get directory path".to_string())),
            },
        };

        let setting_config = Self {
            setting_file_path: config_folder.join(DEFAULT_SETTING_FILE_NAME),
            root_folder: config_folder,
        };

        setting_config.create_config_folder()?;
        setting_config.manage_setting_file()?;
        debug!(configuration = ?setting_config, "configuration settings loaded");
        Ok(setting_config)
    }

    /// Folder holding the user's own filter manifests.
    #[must_use]
    pub fn filters_dir(&self) -> PathBuf {
        self.root_folder.join(CONFIG_FILTERS_FOLDER)
    }

    /// Convert user settings yaml to struct.
    ///
    /// # Errors
    ///
    /// Will return `Err` has an error when loading the config file
    pub fn get_settings_from_file(&self) -> Result<Settings> {
        Ok(serde_yaml::from_str(&fs::read_to_string(
            &self.setting_file_path,
        )?)?)
    }

    /// Create the default settings file when it does not exist.
    ///
    /// # Errors
    ///
    /// Will return `Err` file could not created or loaded
    pub fn manage_setting_file(&self) -> Result<()> {
        if fs::metadata(&self.setting_file_path).is_err() {
            debug!(path = %self.setting_file_path.display(), "setting file not found");
            self.save_settings_file_from_struct(&Settings::default())?;
        }
        debug!(settings = ?self.get_settings_from_file()?, "setting file loaded");
        Ok(())
    }

    /// Reset user configuration to the defaults, optionally keeping a backup
    /// of the current file. Returns the backup path when one was made.
    ///
    /// # Errors
    ///
    /// Will return `Err` when the settings file could not be moved or written
    pub fn reset_config(&self, backup: bool) -> Result<Option<PathBuf>> {
        let backup_path = if backup { Some(self.backup()?) } else { None };
        self.save_settings_file_from_struct(&Settings::default())?;
        Ok(backup_path)
    }

    /// Convert the given settings to YAML and write the settings file.
    ///
    /// # Errors
    ///
    /// Will return `Err` when the file could not be written
    pub fn save_settings_file_from_struct(&self, settings: &Settings) -> Result<()> {
        let content = serde_yaml::to_string(settings)?;
        let mut file = fs::File::create(&self.setting_file_path)?;
        file.write_all(content.as_bytes())?;
        debug!(path = %self.setting_file_path.display(), settings = ?settings, "settings file created");
        Ok(())
    }

    /// Create config folder if not exists.
    fn create_config_folder(&self) -> Result<()> {
        fs::create_dir_all(&self.root_folder)?;
        debug!(path = %self.root_folder.display(), "configuration folder ready");
        Ok(())
    }

    fn backup(&self) -> Result<PathBuf> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::Other(e.to_string()))?
            .as_secs();
        let backup_to = PathBuf::from(format!("{}.{secs}.bak", self.setting_file_path.display()));
        fs::rename(&self.setting_file_path, &backup_to)?;
        Ok(backup_to)
    }
}

/// An existing `$HOME/.<name>` folder wins, then the platform config dir,
/// then `$HOME/.<name>` when the platform has no config dir.
fn default_config_folder(home: &Path, config_dir: Option<&Path>, package_name: &str) -> PathBuf {
    let homedir = home.join(format!(".{package_name}"));
    match config_dir {
        Some(conf_dir) if !homedir.is_dir() => conf_dir.join(package_name),
        _ => homedir,
    }
}

impl Settings {
    /// Directories to scan for filter manifests: the configured ones followed
    /// by those listed in [`FILTER_DIRS_ENV`], made absolute against the
    /// working directory, without duplicates.
    ///
    /// # Errors
    ///
    /// Will return `Err` when the working directory cannot be determined
    pub fn search_dirs(&self, env: &dyn Environment) -> Result<Vec<PathBuf>> {
        let cwd = env.current_dir()?;
        let from_env: Vec<PathBuf> = env
            .var(FILTER_DIRS_ENV)
            .map(|dirs| std::env::split_paths(&dirs).collect())
            .unwrap_or_default();

        let mut dirs: Vec<PathBuf> = Vec::new();
        for dir in self.filter_dirs.iter().chain(from_env.iter()) {
            if dir.as_os_str().is_empty() {
                continue;
            }
            let dir = absolute(&cwd, dir);
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        Ok(dirs)
    }
}

fn absolute(cwd: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        cwd.join(dir)
    }
}

#[cfg(test)]
mod test_config {
    use std::fs::read_dir;

    use insta::assert_debug_snapshot;

    use super::*;

    fn initialize_config_folder(temp_dir: &Path) -> Config {
        let temp_dir = temp_dir.join("app");
        Config::new(Some(&temp_dir.display().to_string())).expect("Failed to create new config")
    }

    #[test]
    fn can_create_new_config() {
        let temp_dir = tree_fs::TreeBuilder::default()
            .create()
            .expect("Failed to create temp directory");
        let config = initialize_config_folder(temp_dir.root.as_path());
        assert!(config.root_folder.is_dir());
        assert!(config.setting_file_path.is_file());
        assert_eq!(config.filters_dir(), config.root_folder.join("filters"));
    }

    #[test]
    fn config_folder_falls_back_to_home() {
        let temp_dir = tree_fs::TreeBuilder::default()
            .create()
            .expect("Failed to create temp directory");
        let home = temp_dir.root.join("home");
        let conf = temp_dir.root.join("conf");

        assert_eq!(
            default_config_folder(&home, None, "filtrate"),
            home.join(".filtrate")
        );
        assert_eq!(
            default_config_folder(&home, Some(&conf), "filtrate"),
            conf.join("filtrate")
        );

        fs::create_dir_all(home.join(".filtrate")).expect("Failed to create home folder");
        assert_eq!(
            default_config_folder(&home, Some(&conf), "filtrate"),
            home.join(".filtrate")
        );
    }

    #[test]
    fn can_get_settings_from_file() {
        let temp_dir = tree_fs::TreeBuilder::default()
            .create()
            .expect("Failed to create temp directory");
        let config = initialize_config_folder(temp_dir.root.as_path());

        assert_debug_snapshot!(config.get_settings_from_file().unwrap(), @r#"
        Settings {
            load_bundled: true,
            filter_dirs: [
                "enabled_filters",
            ],
        }
        "#);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings: Settings = serde_yaml::from_str("load_bundled: false\n").unwrap();
        assert!(!settings.load_bundled);
        assert_eq!(settings.filter_dirs, vec![PathBuf::from("enabled_filters")]);
    }

    #[test]
    fn can_reset_config_with_backup() {
        let temp_dir = tree_fs::TreeBuilder::default()
            .create()
            .expect("Failed to create temp directory");
        let config = initialize_config_folder(temp_dir.root.as_path());
        config
            .save_settings_file_from_struct(&Settings {
                load_bundled: false,
                filter_dirs: vec![],
            })
            .expect("Failed to save settings");

        let backup = config.reset_config(true).expect("Failed to reset config");
        assert!(backup.is_some_and(|p| p.is_file()));
        assert_eq!(config.get_settings_from_file().unwrap(), Settings::default());
        assert_eq!(
            read_dir(&config.root_folder)
                .expect("Failed to read root folder")
                .count(),
            2
        );
    }

    #[test]
    fn can_reset_config_without_backup() {
        let temp_dir = tree_fs::TreeBuilder::default()
            .create()
            .expect("Failed to create temp directory");
        let config = initialize_config_folder(temp_dir.root.as_path());

        assert_eq!(config.reset_config(false).unwrap(), None);
        assert_eq!(
            read_dir(&config.root_folder)
                .expect("Failed to read root folder")
                .count(),
            1
        );
    }
}

#[cfg(test)]
mod test_settings {
    use std::collections::HashMap;

    use super::*;
    use crate::env::MockEnvironment;

    #[test]
    fn search_dirs_resolve_against_cwd() {
        let env = MockEnvironment {
            cwd: PathBuf::from("/work"),
            ..Default::default()
        };
        let settings = Settings {
            load_bundled: true,
            filter_dirs: vec![
                PathBuf::from("enabled_filters"),
                PathBuf::from("/etc/filtrate"),
                PathBuf::from("/work/enabled_filters"),
            ],
        };
        assert_eq!(
            settings.search_dirs(&env).unwrap(),
            vec![
                PathBuf::from("/work/enabled_filters"),
                PathBuf::from("/etc/filtrate")
            ]
        );
    }

    #[test]
    fn search_dirs_include_env_var() {
        let joined = std::env::join_paths(["/extra/one", "relative"]).unwrap();
        let env = MockEnvironment {
            cwd: PathBuf::from("/work"),
            env_vars: HashMap::from([(
                FILTER_DIRS_ENV.to_string(),
                joined.to_string_lossy().to_string(),
            )]),
            ..Default::default()
        };
        assert_eq!(
            Settings::default().search_dirs(&env).unwrap(),
            vec![
                PathBuf::from("/work/enabled_filters"),
                PathBuf::from("/extra/one"),
                PathBuf::from("/work/relative"),
            ]
        );
    }
}
