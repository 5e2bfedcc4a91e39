use clap::{Arg, ArgAction, ArgMatches, Command};
use filtrate::{error::Result, CmdExit, Config};

pub fn command() -> Command {
    Command::new("config")
        .about("Manage filtrate configuration")
        .subcommand_required(true)
        .subcommand(Command::new("show").about("Show current configuration"))
        .subcommand(
            Command::new("reset")
                .about("Reset configuration to defaults")
                .arg(
                    Arg::new("no-backup")
                        .long("no-backup")
                        .help("Do not keep a copy of the current settings file")
                        .action(ArgAction::SetTrue),
                ),
        )
}

pub fn run(matches: &ArgMatches, config: &Config) -> Result<CmdExit> {
    match matches.subcommand() {
        Some(("show", _)) => run_show(config),
        Some(("reset", reset)) => run_reset(config, !reset.get_flag("no-backup")),
        _ => Ok(CmdExit {
            code: exitcode::USAGE,
            message: Some("unknown config command".to_string()),
        }),
    }
}

pub fn run_show(config: &Config) -> Result<CmdExit> {
    let settings = config.get_settings_from_file()?;
    Ok(CmdExit {
        code: exitcode::OK,
        message: Some(format!(
            "# {}\n{}",
            config.setting_file_path.display(),
            serde_yaml::to_string(&settings)?
        )),
    })
}

pub fn run_reset(config: &Config, backup: bool) -> Result<CmdExit> {
    let message = match config.reset_config(backup)? {
        Some(path) => format!("settings reset, backup saved to {}", path.display()),
        None => "settings reset".to_string(),
    };
    Ok(CmdExit {
        code: exitcode::OK,
        message: Some(message),
    })
}

#[cfg(test)]
mod tests {
    use filtrate::Settings;

    use super::*;

    fn config(temp: &tree_fs::Tree) -> Config {
        Config::new(Some(&temp.root.join("app").display().to_string())).unwrap()
    }

    #[test]
    fn can_show_settings() {
        let temp = tree_fs::TreeBuilder::default().create().expect("create tree");
        let out = run_show(&config(&temp)).unwrap();
        let message = out.message.unwrap();
        assert!(message.contains("load_bundled: true"));
        assert!(message.contains("- enabled_filters"));
    }

    #[test]
    fn can_reset_settings() {
        let temp = tree_fs::TreeBuilder::default().create().expect("create tree");
        let config = config(&temp);
        config
            .save_settings_file_from_struct(&Settings {
                load_bundled: false,
                filter_dirs: vec![],
            })
            .unwrap();

        let out = run_reset(&config, false).unwrap();
        assert_eq!(out.message.as_deref(), Some("settings reset"));
        assert_eq!(config.get_settings_from_file().unwrap(), Settings::default());
    }
}
