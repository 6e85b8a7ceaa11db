//! Linux file browser launch using xdg-open

use std::path::Path;
use std::process::Command;

/// xdg-open has no way to pre-select a file.
pub const SUPPORTS_SELECT: bool = false;

pub fn open_directory_command(dir: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(dir);
    cmd
}

pub fn select_file_command(file: &Path) -> Command {
    open_directory_command(file.parent().unwrap_or(file))
}
