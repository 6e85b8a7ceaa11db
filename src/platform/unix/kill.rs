//! Unix process termination using SIGTERM and pkill

use std::process::Command;

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

use crate::model::KillOutcome;
use crate::utils::hidden_command;

/// Ask `pid_raw` to shut down. Does not wait for it to exit.
pub fn terminate_pid(pid_raw: u32) -> KillOutcome {
    let Ok(raw) = i32::try_from(pid_raw) else {
        return KillOutcome::Failed(Errno::EINVAL as i32);
    };
    let pid = Pid::from_raw(raw);

    // Send SIGTERM to the specific PID only (not process group)
    match kill(pid, Signal::SIGTERM) {
        Ok(()) => KillOutcome::Requested,
        Err(Errno::ESRCH) => KillOutcome::AlreadyExited,
        Err(Errno::EPERM) => KillOutcome::PermissionDenied,
        Err(err) => KillOutcome::Failed(err as i32),
    }
}

/// Command that signals every process whose name is exactly `image`.
pub fn terminate_image_command(image: &str) -> Command {
    let mut cmd = hidden_command("pkill");
    cmd.args(["-x", image]);
    cmd
}
