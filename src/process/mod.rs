//! Process discovery and lifecycle.
//!
//! [`ProcessTable`] is the seam to the operating system. Everything above it
//! (artifact resolution, snapshots, termination) is written against the trait
//! so it can run on an in-memory table in tests.

pub mod artifact;
pub mod lifecycle;
pub mod registry;

use std::path::PathBuf;

use anyhow::Result;
use sysinfo::{Pid, ProcessRefreshKind, System, UpdateKind};

use crate::model::{KillOutcome, ProcessHandle};
use crate::platform::current::{files, kill};
use crate::utils::spawn_detached;

/// Operations the engine needs from the OS process table.
pub trait ProcessTable {
    /// Running processes whose executable image is `image`.
    fn list(&self, image: &str) -> Vec<ProcessHandle>;

    /// Files the process holds open, in the order the OS reports them.
    fn open_files(&self, handle: &ProcessHandle) -> Result<Vec<PathBuf>>;

    fn cwd(&self, handle: &ProcessHandle) -> Option<PathBuf>;

    /// Terminate exactly the process behind `handle`.
    fn terminate(&self, handle: &ProcessHandle) -> KillOutcome;

    /// Fire-and-forget termination of every process named `image`.
    fn terminate_image(&self, image: &str);
}

/// Enumerate live processes for `image`. Never fails; an empty result means
/// nothing of that image is running.
pub fn list_processes(table: &dyn ProcessTable, image: &str) -> Vec<ProcessHandle> {
    let handles = table.list(image);
    log::debug!("found {} running {} process(es)", handles.len(), image);
    handles
}

/// Image name comparison, case-insensitive where the filesystem is.
pub fn image_matches(name: &str, image: &str) -> bool {
    if cfg!(target_os = "windows") {
        name.eq_ignore_ascii_case(image)
    } else {
        name == image
    }
}

/// [`ProcessTable`] backed by the live OS process table.
///
/// Holds no state: each call takes a fresh reading.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemProcessTable;

impl SystemProcessTable {
    pub fn new() -> Self {
        Self
    }

    /// Whether the process now owning `handle.pid` is the one we captured.
    fn is_same_process(&self, handle: &ProcessHandle) -> bool {
        let pid = Pid::from_u32(handle.pid);
        let mut system = System::new();
        if !system.refresh_process_specifics(pid, ProcessRefreshKind::new()) {
            return false;
        }
        system
            .process(pid)
            .is_some_and(|p| p.start_time() == handle.start_time)
    }
}

impl ProcessTable for SystemProcessTable {
    fn list(&self, image: &str) -> Vec<ProcessHandle> {
        let mut system = System::new();
        system.refresh_processes_specifics(ProcessRefreshKind::new());

        if system.processes().is_empty() {
            log::warn!("process table is empty or unreadable; treating as no processes");
            return Vec::new();
        }

        let mut handles: Vec<ProcessHandle> = system
            .processes()
            .values()
            .filter(|p| image_matches(p.name(), image))
            .map(|p| ProcessHandle {
                pid: p.pid().as_u32(),
                start_time: p.start_time(),
                image: image.to_string(),
            })
            .collect();
        handles.sort_by_key(|h| h.pid);
        handles
    }

    fn open_files(&self, handle: &ProcessHandle) -> Result<Vec<PathBuf>> {
        files::open_files(handle.pid)
    }

    fn cwd(&self, handle: &ProcessHandle) -> Option<PathBuf> {
        let pid = Pid::from_u32(handle.pid);
        let mut system = System::new();
        let refresh = ProcessRefreshKind::new().with_cwd(UpdateKind::Always);
        if !system.refresh_process_specifics(pid, refresh) {
            return None;
        }
        let process = system.process(pid)?;
        if process.start_time() != handle.start_time {
            return None;
        }
        let cwd = process.cwd()?;
        if cwd.as_os_str().is_empty() {
            None
        } else {
            Some(cwd.to_path_buf())
        }
    }

    fn terminate(&self, handle: &ProcessHandle) -> KillOutcome {
        // The pid may have been recycled since the snapshot was taken
        if !self.is_same_process(handle) {
            return KillOutcome::AlreadyExited;
        }
        kill::terminate_pid(handle.pid)
    }

    fn terminate_image(&self, image: &str) {
        let label = format!("kill all {}", image);
        spawn_detached(kill::terminate_image_command(image), &label);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_match_follows_platform_case_rules() {
        assert!(image_matches("solver.exe", "solver.exe"));
        assert!(!image_matches("solver.exe", "aview.exe"));
        assert_eq!(
            image_matches("SOLVER.EXE", "solver.exe"),
            cfg!(target_os = "windows")
        );
    }

    #[test]
    fn unknown_image_lists_nothing() {
        let table = SystemProcessTable::new();
        assert!(list_processes(&table, "no-such-solver-image-9c2e").is_empty());
    }

    #[test]
    fn recycled_pid_is_not_terminated() {
        let table = SystemProcessTable::new();
        // Our own pid with a start time that cannot match
        let handle = ProcessHandle {
            pid: std::process::id(),
            start_time: 1,
            image: "test".into(),
        };
        assert_eq!(table.terminate(&handle), KillOutcome::AlreadyExited);
    }

    #[test]
    fn exited_process_has_no_cwd() {
        let table = SystemProcessTable::new();
        let handle = ProcessHandle {
            pid: std::process::id(),
            start_time: 1,
            image: "test".into(),
        };
        assert_eq!(table.cwd(&handle), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn live_process_reports_its_cwd() {
        let pid = Pid::from_u32(std::process::id());
        let mut system = System::new();
        assert!(system.refresh_process_specifics(pid, ProcessRefreshKind::new()));
        let start_time = system.process(pid).unwrap().start_time();

        let table = SystemProcessTable::new();
        let handle = ProcessHandle {
            pid: pid.as_u32(),
            start_time,
            image: "test".into(),
        };
        assert_eq!(table.cwd(&handle), std::env::current_dir().ok());
    }
}
