use clap::{Arg, ArgMatches, Command};
use filtrate::{error::Result, CmdExit, Registry};

pub fn command() -> Command {
    Command::new("help")
        .about("Show a filter's description and options")
        .arg(Arg::new("name").help("Filter name").required(true))
}

pub fn run(matches: &ArgMatches, registry: &Registry) -> Result<CmdExit> {
    run_help(registry, matches.get_one::<String>("name").map(String::as_str))
}

pub fn run_help(registry: &Registry, name: Option<&str>) -> Result<CmdExit> {
    Ok(CmdExit {
        code: exitcode::OK,
        message: Some(registry.help(name)?),
    })
}
