pub mod config_cmd;
pub mod default;
pub mod help_cmd;
pub mod list_cmd;
pub mod run_cmd;
