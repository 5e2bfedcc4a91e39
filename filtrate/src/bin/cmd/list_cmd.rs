use clap::{Arg, ArgAction, ArgMatches, Command};
use filtrate::{CmdExit, Registry};

pub fn command() -> Command {
    Command::new("list")
        .about("List registered filters")
        .arg(
            Arg::new("describe")
                .short('d')
                .long("describe")
                .help("Show each filter's description")
                .action(ArgAction::SetTrue),
        )
}

pub fn run(matches: &ArgMatches, registry: &Registry) -> CmdExit {
    run_list(registry, matches.get_flag("describe"))
}

pub fn run_list(registry: &Registry, describe: bool) -> CmdExit {
    let names = registry.list();
    if names.is_empty() {
        return CmdExit {
            code: exitcode::OK,
            message: Some("No filters registered.".to_string()),
        };
    }

    let lines: Vec<String> = names
        .into_iter()
        .map(|name| {
            let description = registry
                .lookup(&name)
                .ok()
                .and_then(|filter| filter.description().map(ToString::to_string));
            match description {
                Some(description) if describe => format!("{name}\t{description}"),
                _ => name,
            }
        })
        .collect();

    CmdExit {
        code: exitcode::OK,
        message: Some(lines.join("\n")),
    }
}
