use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::thread;

use crossbeam_channel::Sender;

/// Build a `Command` that does not flash a console window on Windows.
pub fn hidden_command(program: &str) -> Command {
    #[allow(unused_mut)]
    let mut cmd = Command::new(program);
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}

struct Spawned {
    label: String,
    child: Child,
}

fn reaper() -> &'static Sender<Spawned> {
    static REAPER: OnceLock<Sender<Spawned>> = OnceLock::new();
    REAPER.get_or_init(|| {
        let (tx, rx) = crossbeam_channel::unbounded::<Spawned>();
        thread::spawn(move || {
            for spawned in rx.iter() {
                reap(spawned);
            }
        });
        tx
    })
}

fn reap(spawned: Spawned) {
    let Spawned { label, child } = spawned;
    match child.wait_with_output() {
        Ok(output) => {
            log::debug!("{} exited with {}", label, output.status);
            let stdout = String::from_utf8_lossy(&output.stdout);
            if !stdout.trim().is_empty() {
                log::debug!("{} stdout: {}", label, stdout.trim());
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                log::warn!("{} stderr: {}", label, stderr.trim());
            }
        }
        Err(err) => log::warn!("failed to wait for {}: {}", label, err),
    }
}

/// Spawn `cmd` without waiting for it.
///
/// The child is handed to a reaper thread that collects its exit status and
/// logs its output. Returns `false` if the process could not be started.
pub fn spawn_detached(mut cmd: Command, label: &str) -> bool {
    let child = match cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            log::warn!("failed to launch {}: {}", label, err);
            return false;
        }
    };

    log::debug!("launched {} (pid {})", label, child.id());
    if let Err(err) = reaper().send(Spawned {
        label: label.to_string(),
        child,
    }) {
        log::warn!("reaper unavailable for {}: {}", label, err);
    }
    true
}
