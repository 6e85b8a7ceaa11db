//! Windows file browser launch using explorer

use std::os::windows::process::CommandExt;
use std::path::Path;
use std::process::Command;

use crate::utils::hidden_command;

/// Explorer can open a folder with a file pre-selected.
pub const SUPPORTS_SELECT: bool = true;

pub fn open_directory_command(dir: &Path) -> Command {
    let mut cmd = hidden_command("explorer");
    cmd.arg(dir);
    cmd
}

pub fn select_file_command(file: &Path) -> Command {
    let mut cmd = hidden_command("explorer");
    // explorer parses its own command line; the path must follow the comma unescaped
    cmd.raw_arg(format!("/select,\"{}\"", file.display()));
    cmd
}
