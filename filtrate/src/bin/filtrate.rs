mod cmd;

use std::{path::PathBuf, process::exit};

use clap::ArgMatches;
use console::{style, Style};
use filtrate::{
    env::RealEnvironment,
    error::{Error, Result},
    loader, CmdExit, Config,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ERR_EXIT_CODE: i32 = 1;
const DEFAULT_LOG_LEVEL: &str = "warn";

fn init_logging(matches: &ArgMatches) {
    let filter = match matches.get_one::<String>("log") {
        Some(level) => EnvFilter::new(level.to_lowercase()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let app = cmd::default::command()
        .subcommand(cmd::list_cmd::command())
        .subcommand(cmd::help_cmd::command())
        .subcommand(cmd::run_cmd::validate_command())
        .subcommand(cmd::run_cmd::sanitize_command())
        .subcommand(cmd::config_cmd::command());

    let matches = app.get_matches();
    init_logging(&matches);

    let config = match Config::new(matches.get_one::<String>("config").map(String::as_str)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Loading config error: {err}");
            exit(DEFAULT_ERR_EXIT_CODE)
        }
    };

    let exit_with = match run(&matches, &config) {
        Ok(cmd) => {
            if let Some(message) = cmd.message {
                if exitcode::is_success(cmd.code) {
                    println!("{message}");
                } else {
                    eprintln!("{}", Style::new().red().apply_to(message));
                }
            }
            cmd.code
        }
        Err(e) => {
            debug!(error = ?e, "command failed");
            eprintln!("{}", style(e).red());
            DEFAULT_ERR_EXIT_CODE
        }
    };
    exit(exit_with)
}

fn run(matches: &ArgMatches, config: &Config) -> Result<CmdExit> {
    let Some((name, subcommand_matches)) = matches.subcommand() else {
        return Err(Error::Other("command not found".to_string()));
    };
    if name == "config" {
        return cmd::config_cmd::run(subcommand_matches, config);
    }

    let settings = config.get_settings_from_file().map_err(|e| {
        Error::Config(format!(
            "could not load settings from file. Try resolving by running `{}`\nError: {e}",
            style("filtrate config reset").bold().italic().underlined(),
        ))
    })?;

    let mut extra_dirs = vec![config.filters_dir()];
    extra_dirs.extend(
        matches
            .get_many::<String>("filters-dir")
            .into_iter()
            .flatten()
            .map(PathBuf::from),
    );
    let (registry, report) = loader::bootstrap(&RealEnvironment, &settings, &extra_dirs)?;
    if !report.is_clean() {
        warn!(
            failures = report.failures.len(),
            "some filter manifests were skipped"
        );
    }

    match name {
        "list" => Ok(cmd::list_cmd::run(subcommand_matches, &registry)),
        "help" => cmd::help_cmd::run(subcommand_matches, &registry),
        "validate" => cmd::run_cmd::run_validate(subcommand_matches, &registry),
        "sanitize" => cmd::run_cmd::run_sanitize(subcommand_matches, &registry),
        _ => unreachable!(),
    }
}
