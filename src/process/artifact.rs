//! Per-kind rules turning a process into a display name and a navigable path.

use std::path::PathBuf;

use crate::model::{ProcessHandle, ProcessKind};
use crate::process::ProcessTable;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Artifact {
    pub display_name: String,
    pub target_path: PathBuf,
}

/// Derives the identity of a process from what it is working on.
///
/// Returning `None` means the process has nothing to show yet and is left out
/// of snapshots.
pub trait ArtifactResolver: Send + Sync {
    fn resolve(&self, table: &dyn ProcessTable, handle: &ProcessHandle) -> Option<Artifact>;
}

/// Identity from the first open file with `results_ext`; navigation goes to
/// the sibling with `companion_ext`.
#[derive(Clone, Copy, Debug)]
pub struct ResultsArtifact {
    pub results_ext: &'static str,
    pub companion_ext: &'static str,
}

impl ArtifactResolver for ResultsArtifact {
    fn resolve(&self, table: &dyn ProcessTable, handle: &ProcessHandle) -> Option<Artifact> {
        let files = match table.open_files(handle) {
            Ok(files) => files,
            Err(err) => {
                log::debug!("skipping PID {}: {:#}", handle.pid, err);
                return None;
            }
        };

        let Some(results) = files
            .into_iter()
            .find(|p| p.extension().is_some_and(|ext| ext == self.results_ext))
        else {
            log::debug!(
                "skipping PID {}: no open .{} file yet",
                handle.pid,
                self.results_ext
            );
            return None;
        };

        let display_name = results.file_stem()?.to_string_lossy().into_owned();
        Some(Artifact {
            display_name,
            target_path: results.with_extension(self.companion_ext),
        })
    }
}

/// Identity and navigation target are both the working directory.
#[derive(Clone, Copy, Debug)]
pub struct WorkingDirectory;

impl ArtifactResolver for WorkingDirectory {
    fn resolve(&self, table: &dyn ProcessTable, handle: &ProcessHandle) -> Option<Artifact> {
        let Some(cwd) = table.cwd(handle) else {
            log::debug!("skipping PID {}: working directory unavailable", handle.pid);
            return None;
        };
        Some(Artifact {
            display_name: forward_slashes(&cwd),
            target_path: cwd,
        })
    }
}

pub static SOLVER_ARTIFACT: ResultsArtifact = ResultsArtifact {
    results_ext: "res",
    companion_ext: "msg",
};

pub static VIEWER_ARTIFACT: WorkingDirectory = WorkingDirectory;

pub fn resolver_for(kind: ProcessKind) -> &'static dyn ArtifactResolver {
    match kind {
        ProcessKind::Solver => &SOLVER_ARTIFACT,
        ProcessKind::Viewer => &VIEWER_ARTIFACT,
    }
}

fn forward_slashes(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::FakeProcessTable;

    #[test]
    fn solver_uses_first_results_file() {
        let table = FakeProcessTable::new();
        let handle = table.spawn(
            "solver",
            10,
            Some(vec![
                PathBuf::from("/runs/model.adm"),
                PathBuf::from("/runs/first.res"),
                PathBuf::from("/runs/second.res"),
            ]),
            None,
        );

        let artifact = SOLVER_ARTIFACT.resolve(&table, &handle).unwrap();
        assert_eq!(artifact.display_name, "first");
        assert_eq!(artifact.target_path, PathBuf::from("/runs/first.msg"));
    }

    #[test]
    fn solver_without_results_file_is_skipped() {
        let table = FakeProcessTable::new();
        let handle = table.spawn(
            "solver",
            11,
            Some(vec![PathBuf::from("/runs/jobA.msg"), PathBuf::from("/runs/res")]),
            None,
        );
        assert_eq!(SOLVER_ARTIFACT.resolve(&table, &handle), None);
    }

    #[test]
    fn solver_with_unreadable_handles_is_skipped() {
        let table = FakeProcessTable::new();
        let handle = table.spawn("solver", 12, None, None);
        assert_eq!(SOLVER_ARTIFACT.resolve(&table, &handle), None);
    }

    #[test]
    fn viewer_uses_working_directory() {
        let table = FakeProcessTable::new();
        let handle = table.spawn("aview", 20, None, Some(PathBuf::from("/work/car_model")));

        let artifact = VIEWER_ARTIFACT.resolve(&table, &handle).unwrap();
        assert_eq!(artifact.display_name, "/work/car_model");
        assert_eq!(artifact.target_path, PathBuf::from("/work/car_model"));
    }

    #[test]
    fn viewer_name_uses_forward_slashes() {
        assert_eq!(
            forward_slashes(std::path::Path::new(r"C:\work\car_model")),
            "C:/work/car_model"
        );
    }

    #[test]
    fn viewer_without_cwd_is_skipped() {
        let table = FakeProcessTable::new();
        let handle = table.spawn("aview", 21, None, None);
        assert_eq!(VIEWER_ARTIFACT.resolve(&table, &handle), None);
    }

    #[test]
    fn kinds_pick_their_own_rule() {
        let table = FakeProcessTable::new();
        let handle = table.spawn(
            "x",
            30,
            Some(vec![PathBuf::from("/runs/jobA.res")]),
            Some(PathBuf::from("/runs")),
        );
        let solver = resolver_for(ProcessKind::Solver).resolve(&table, &handle).unwrap();
        let viewer = resolver_for(ProcessKind::Viewer).resolve(&table, &handle).unwrap();
        assert_eq!(solver.display_name, "jobA");
        assert_eq!(viewer.display_name, "/runs");
    }
}
