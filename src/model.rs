use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// The two families of solver processes the tray knows about.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessKind {
    Solver,
    Viewer,
}

impl ProcessKind {
    pub const ALL: [ProcessKind; 2] = [ProcessKind::Solver, ProcessKind::Viewer];

    /// Stable lowercase tag used in menu ids.
    pub fn tag(self) -> &'static str {
        match self {
            ProcessKind::Solver => "solver",
            ProcessKind::Viewer => "viewer",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "solver" => Some(ProcessKind::Solver),
            "viewer" => Some(ProcessKind::Viewer),
            _ => None,
        }
    }
}

impl fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Weak reference to a live OS process.
///
/// Holds no OS resource. The pid alone is not trusted: every action checks
/// that the process currently owning `pid` still has the same `start_time`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct ProcessHandle {
    pub pid: u32,
    pub start_time: u64,
    pub image: String,
}

/// Point-in-time view of one process of a kind. Never mutated.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ProcessRecord {
    #[serde(skip)]
    pub handle: ProcessHandle,
    pub pid: u32,
    pub display_name: String,
    pub target_path: PathBuf,
}

impl ProcessRecord {
    pub fn new(handle: ProcessHandle, display_name: String, target_path: PathBuf) -> Self {
        Self {
            pid: handle.pid,
            handle,
            display_name,
            target_path,
        }
    }

    /// Submenu label, e.g. `jobA [1234]`.
    pub fn label(&self) -> String {
        format!("{} [{}]", self.display_name, self.pid)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KillOutcome {
    /// Termination was requested and accepted by the OS.
    Requested,
    /// The process was gone (or its pid now belongs to someone else).
    AlreadyExited,
    PermissionDenied,
    Failed(i32),
}

impl KillOutcome {
    /// Whether the process can be considered terminated.
    pub fn is_success(self) -> bool {
        matches!(self, KillOutcome::Requested | KillOutcome::AlreadyExited)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RevealOutcome {
    Missing,
    OpenedDirectory(PathBuf),
    SelectedFile(PathBuf),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MenuAction {
    GoTo {
        kind: ProcessKind,
        pid: u32,
        start_time: u64,
    },
    Kill {
        kind: ProcessKind,
        pid: u32,
        start_time: u64,
    },
    KillAll(ProcessKind),
    EditConfig,
    Quit,
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
#[derive(Clone, Debug)]
pub enum UserEvent {
    MenuAction(MenuAction),
    MenuAboutToShow,
    MenuClosed,
    ConfigReloaded(crate::config::Config),
    ConfigReloadFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_round_trip() {
        for kind in ProcessKind::ALL {
            assert_eq!(ProcessKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ProcessKind::from_tag("compiler"), None);
    }

    #[test]
    fn record_label_includes_pid() {
        let handle = ProcessHandle {
            pid: 4242,
            start_time: 7,
            image: "solver.exe".into(),
        };
        let record = ProcessRecord::new(handle, "jobA".into(), PathBuf::from("/runs/jobA.msg"));
        assert_eq!(record.pid, 4242);
        assert_eq!(record.label(), "jobA [4242]");
    }

    #[test]
    fn already_exited_counts_as_success() {
        assert!(KillOutcome::AlreadyExited.is_success());
        assert!(KillOutcome::Requested.is_success());
        assert!(!KillOutcome::PermissionDenied.is_success());
        assert!(!KillOutcome::Failed(5).is_success());
    }
}
