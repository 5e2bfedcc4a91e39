/// Result of a CLI subcommand: the process exit code and an optional message
/// for the user.
#[derive(Debug, PartialEq, Eq)]
pub struct CmdExit {
    pub code: exitcode::ExitCode,
    pub message: Option<String>,
}
