//! Linux open file enumeration using /proc/<pid>/fd

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Paths of the files `pid` currently holds open, ordered by descriptor number.
///
/// Sockets, pipes and anonymous inodes are skipped. Reading another user's
/// descriptors fails with a permission error.
pub fn open_files(pid: u32) -> Result<Vec<PathBuf>> {
    let fd_dir = format!("/proc/{}/fd", pid);
    let entries = fs::read_dir(&fd_dir).with_context(|| format!("failed to read {}", fd_dir))?;

    let mut files: Vec<(u32, PathBuf)> = Vec::new();
    for entry in entries.flatten() {
        let Some(fd) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) else {
            continue;
        };
        // The descriptor may close while we iterate
        if let Ok(target) = fs::read_link(entry.path())
            && target.is_absolute()
        {
            files.push((fd, target));
        }
    }

    files.sort_by_key(|(fd, _)| *fd);
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_own_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobA.res");
        let _file = fs::File::create(&path).unwrap();

        let files = open_files(std::process::id()).unwrap();
        let expected = path.canonicalize().unwrap();
        assert!(files.contains(&expected), "{:?} not in {:?}", expected, files);
    }

    #[test]
    fn missing_process_is_an_error() {
        assert!(open_files(u32::MAX).is_err());
    }
}
