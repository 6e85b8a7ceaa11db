//! Windows process termination using TerminateProcess API and taskkill

use std::process::Command;

use windows::Win32::Foundation::{
    CloseHandle, ERROR_ACCESS_DENIED, ERROR_INVALID_PARAMETER, ERROR_NOT_FOUND,
};
use windows::Win32::System::Threading::{OpenProcess, PROCESS_TERMINATE, TerminateProcess};

use crate::model::KillOutcome;
use crate::utils::hidden_command;

/// Terminate `pid`. Does not wait for it to exit.
pub fn terminate_pid(pid: u32) -> KillOutcome {
    unsafe {
        let handle = match OpenProcess(PROCESS_TERMINATE, false, pid) {
            Ok(h) => h,
            Err(e) => return classify(&e),
        };

        let result = TerminateProcess(handle, 1);
        let _ = CloseHandle(handle);
        match result {
            Ok(()) => KillOutcome::Requested,
            // Process may have exited between open and terminate
            Err(e) => classify(&e),
        }
    }
}

fn classify(err: &windows::core::Error) -> KillOutcome {
    let code = err.code();
    // ERROR_INVALID_PARAMETER (87) or ERROR_NOT_FOUND (1168) = process doesn't exist
    if code == ERROR_INVALID_PARAMETER.to_hresult() || code == ERROR_NOT_FOUND.to_hresult() {
        KillOutcome::AlreadyExited
    } else if code == ERROR_ACCESS_DENIED.to_hresult() {
        KillOutcome::PermissionDenied
    } else {
        log::error!("process termination failed: {:?}", err);
        KillOutcome::Failed(code.0)
    }
}

/// Command that force-kills every process with image name `image`.
pub fn terminate_image_command(image: &str) -> Command {
    let mut cmd = hidden_command("taskkill");
    cmd.args(["/F", "/FI", &format!("imagename eq {}", image)]);
    cmd
}
