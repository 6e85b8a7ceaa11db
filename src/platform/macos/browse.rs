//! macOS file browser launch using open

use std::path::Path;
use std::process::Command;

/// Finder can reveal a file with `open -R`.
pub const SUPPORTS_SELECT: bool = true;

pub fn open_directory_command(dir: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(dir);
    cmd
}

pub fn select_file_command(file: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg("-R").arg(file);
    cmd
}
