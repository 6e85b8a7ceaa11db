//! macOS open file enumeration using lsof

use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, anyhow};

/// Paths of the regular files `pid` currently holds open, in descriptor order.
pub fn open_files(pid: u32) -> Result<Vec<PathBuf>> {
    let output = Command::new("lsof")
        .args(["-nP", "-a", "-p", &pid.to_string(), "-d", "0-65535", "-Fn"])
        .output()
        .context("failed to execute lsof")?;

    if !output.status.success() {
        return Err(anyhow!(
            "lsof failed for PID {}: {}",
            pid,
            String::from_utf8_lossy(&output.stderr)
        ));
    }

    Ok(parse_lsof_names(&String::from_utf8_lossy(&output.stdout)))
}

// lsof -Fn emits "p<pid>", "f<fd>" and "n<name>" lines; keep absolute names.
fn parse_lsof_names(stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix('n'))
        .filter(|name| name.starts_with('/'))
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_absolute_names() {
        let out = "p123\nf3\nn/Users/me/runs/jobA.res\nf4\nn127.0.0.1:5000\nf5\nn/Users/me/runs/jobA.msg\n";
        assert_eq!(
            parse_lsof_names(out),
            vec![
                PathBuf::from("/Users/me/runs/jobA.res"),
                PathBuf::from("/Users/me/runs/jobA.msg"),
            ]
        );
    }

    #[test]
    fn empty_output_yields_nothing() {
        assert!(parse_lsof_names("").is_empty());
    }
}
