use crate::config::ImagesConfig;
use crate::model::{KillOutcome, ProcessKind, ProcessRecord};
use crate::process::ProcessTable;

/// Termination of a single captured process, or of a whole kind.
pub struct LifecycleController<'a> {
    table: &'a dyn ProcessTable,
    images: &'a ImagesConfig,
}

impl<'a> LifecycleController<'a> {
    pub fn new(table: &'a dyn ProcessTable, images: &'a ImagesConfig) -> Self {
        Self { table, images }
    }

    /// Terminate the exact process captured in `record`.
    ///
    /// Goes through the record's handle, never a fresh lookup by name. A
    /// process that already exited reports [`KillOutcome::AlreadyExited`].
    pub fn terminate_one(&self, record: &ProcessRecord) -> KillOutcome {
        let outcome = self.table.terminate(&record.handle);
        match outcome {
            KillOutcome::Requested => {
                log::info!("terminated {} (PID {})", record.display_name, record.pid)
            }
            KillOutcome::AlreadyExited => log::info!(
                "{} (PID {}) was already stopped",
                record.display_name,
                record.pid
            ),
            KillOutcome::PermissionDenied => log::warn!(
                "permission denied terminating {} (PID {})",
                record.display_name,
                record.pid
            ),
            KillOutcome::Failed(code) => log::warn!(
                "failed to terminate {} (PID {}): {}",
                record.display_name,
                record.pid,
                code
            ),
        }
        outcome
    }

    /// Terminate every process currently running under the kind's image
    /// name, including ones started after the last snapshot. Does not wait.
    pub fn terminate_all_of_kind(&self, kind: ProcessKind) {
        let image = self.images.image_for(kind);
        log::info!("terminating all {} processes", image);
        self.table.terminate_image(image);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::process::registry::ProcessRegistry;
    use crate::process::testing::FakeProcessTable;

    fn images() -> ImagesConfig {
        ImagesConfig {
            solver: "solver.exe".into(),
            viewer: "aview.exe".into(),
        }
    }

    fn solver(table: &FakeProcessTable, pid: u32, name: &str) {
        table.spawn(
            "solver.exe",
            pid,
            Some(vec![PathBuf::from(format!("/runs/{}.res", name))]),
            None,
        );
    }

    #[test]
    fn terminate_one_targets_the_selected_process() {
        let table = FakeProcessTable::new();
        solver(&table, 1, "jobA");
        solver(&table, 2, "jobB");
        let images = images();
        let snapshot = ProcessRegistry::new(&table, &images).snapshot(ProcessKind::Solver);

        let controller = LifecycleController::new(&table, &images);
        let outcome = controller.terminate_one(&snapshot[1]);
        assert_eq!(outcome, KillOutcome::Requested);
        assert_eq!(*table.terminated.borrow(), vec![1]);
    }

    #[test]
    fn terminate_one_on_exited_process_is_a_quiet_success() {
        let table = FakeProcessTable::new();
        solver(&table, 1, "jobA");
        let images = images();
        let snapshot = ProcessRegistry::new(&table, &images).snapshot(ProcessKind::Solver);
        table.exit(1);

        let outcome = LifecycleController::new(&table, &images).terminate_one(&snapshot[0]);
        assert_eq!(outcome, KillOutcome::AlreadyExited);
        assert!(outcome.is_success());
        assert!(table.terminated.borrow().is_empty());
    }

    #[test]
    fn terminate_one_ignores_a_recycled_pid() {
        let table = FakeProcessTable::new();
        solver(&table, 1, "jobA");
        let images = images();
        let snapshot = ProcessRegistry::new(&table, &images).snapshot(ProcessKind::Solver);

        // Same pid, different process
        table.exit(1);
        table.processes.borrow_mut().retain(|p| p.handle.pid != 1);
        table.spawn("solver.exe", 1, None, None);
        table.processes.borrow_mut()[0].handle.start_time += 1;

        let outcome = LifecycleController::new(&table, &images).terminate_one(&snapshot[0]);
        assert_eq!(outcome, KillOutcome::AlreadyExited);
        assert!(table.terminated.borrow().is_empty());
    }

    #[test]
    fn terminate_all_reaches_processes_outside_the_snapshot() {
        let table = FakeProcessTable::new();
        solver(&table, 1, "jobA");
        let images = images();
        let snapshot = ProcessRegistry::new(&table, &images).snapshot(ProcessKind::Solver);
        assert_eq!(snapshot.len(), 1);

        // Started after the snapshot; one has no results file yet
        solver(&table, 2, "jobB");
        table.spawn("solver.exe", 3, None, None);
        table.spawn("aview.exe", 4, None, Some(PathBuf::from("/work")));

        LifecycleController::new(&table, &images).terminate_all_of_kind(ProcessKind::Solver);

        let mut killed = table.terminated.borrow().clone();
        killed.sort();
        assert_eq!(killed, vec![1, 2, 3]);
        assert_eq!(*table.image_kills.borrow(), vec!["solver.exe".to_string()]);
    }

    #[test]
    fn terminate_all_with_nothing_running_still_issues_one_request() {
        let table = FakeProcessTable::new();
        let images = images();
        LifecycleController::new(&table, &images).terminate_all_of_kind(ProcessKind::Viewer);
        assert_eq!(*table.image_kills.borrow(), vec!["aview.exe".to_string()]);
        assert!(table.terminated.borrow().is_empty());
    }
}
