use clap::{crate_version, Arg, ArgAction, Command};

pub const LOG_LEVELS: [&str; 6] = ["off", "trace", "debug", "info", "warn", "error"];

pub fn command() -> Command {
    Command::new("filtrate")
        .version(crate_version!())
        .about("Validate and sanitize values with named, pluggable filters")
        .subcommand_required(true)
        .disable_help_subcommand(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log")
                .long("log")
                .help("Set logging level (overrides RUST_LOG)")
                .value_name("LEVEL")
                .value_parser(LOG_LEVELS)
                .ignore_case(true)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Use this configuration folder instead of the default one")
                .value_name("DIR")
                .global(true),
        )
        .arg(
            Arg::new("filters-dir")
                .long("filters-dir")
                .help("Also load filter manifests from this directory")
                .value_name("DIR")
                .action(ArgAction::Append)
                .global(true),
        )
}
