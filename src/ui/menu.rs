use std::path::Path;

#[cfg(any(target_os = "windows", target_os = "macos"))]
use anyhow::Result;
#[cfg(any(target_os = "windows", target_os = "macos"))]
use tray_icon::menu::{Menu, MenuItem, PredefinedMenuItem, Submenu};

use crate::config::ImagesConfig;
use crate::locate::{FileBrowser, Locator};
use crate::model::{MenuAction, ProcessHandle, ProcessKind, ProcessRecord, RevealOutcome};
use crate::process::lifecycle::LifecycleController;
use crate::process::registry::ProcessRegistry;

const MENU_ID_QUIT: &str = "quit";
const MENU_ID_EDIT_CONFIG: &str = "edit_config";
const MENU_ID_KILL_ALL_PREFIX: &str = "kill_all_";
const MENU_ID_GOTO_PREFIX: &str = "goto_";
const MENU_ID_KILL_PREFIX: &str = "kill_";
const MENU_ID_EMPTY_PREFIX: &str = "empty_";
const PLACEHOLDER_LABEL: &str = "None";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MenuState {
    Collapsed,
    Expanded,
}

/// One leaf or nested submenu under a kind's submenu.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MenuEntry {
    Process {
        label: String,
        goto_id: String,
        kill_id: String,
    },
    /// Disabled leaf shown when nothing of the kind is running.
    Placeholder { id: String, label: &'static str },
}

/// Keeps one kind's submenu in step with the running processes.
///
/// Entries are rebuilt from a fresh snapshot each time the menu is about to
/// show. Closing the menu leaves them in place so a click delivered after the
/// menu closed still resolves against the snapshot the operator saw.
pub struct MenuSynchronizer {
    kind: ProcessKind,
    state: MenuState,
    records: Vec<ProcessRecord>,
    entries: Vec<MenuEntry>,
}

impl MenuSynchronizer {
    pub fn new(kind: ProcessKind) -> Self {
        Self {
            kind,
            state: MenuState::Collapsed,
            records: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn kind(&self) -> ProcessKind {
        self.kind
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Record captured for exactly this process, if it is in the current snapshot.
    pub fn record(&self, pid: u32, start_time: u64) -> Option<&ProcessRecord> {
        self.records
            .iter()
            .find(|r| r.handle.pid == pid && r.handle.start_time == start_time)
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    /// Submenu title, e.g. `solver processes`.
    pub fn title(&self, images: &ImagesConfig) -> String {
        let image = images.image_for(self.kind);
        let stem = Path::new(image)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| image.to_string());
        format!("{} processes", stem)
    }

    /// Collapsed -> Expanded: replace all entries from one new snapshot.
    /// Returns `false` (and does nothing) if already expanded.
    pub fn about_to_show(&mut self, registry: &ProcessRegistry<'_>) -> bool {
        if self.state == MenuState::Expanded {
            return false;
        }

        self.entries.clear();
        self.records = registry.snapshot(self.kind);
        self.entries = self
            .records
            .iter()
            .map(|record| MenuEntry::Process {
                label: record.label(),
                goto_id: goto_menu_id(self.kind, &record.handle),
                kill_id: kill_menu_id(self.kind, &record.handle),
            })
            .collect();

        if self.entries.is_empty() {
            self.entries.push(MenuEntry::Placeholder {
                id: format!("{}{}", MENU_ID_EMPTY_PREFIX, self.kind.tag()),
                label: PLACEHOLDER_LABEL,
            });
        }

        log::debug!(
            "{} menu refreshed with {} process(es)",
            self.kind,
            self.records.len()
        );
        self.state = MenuState::Expanded;
        true
    }

    /// Expanded -> Collapsed. Entries are left for the next rebuild.
    pub fn closed(&mut self) {
        self.state = MenuState::Collapsed;
    }
}

// Ids carry the process identity so a click can never land on another row's process
pub fn goto_menu_id(kind: ProcessKind, handle: &ProcessHandle) -> String {
    format!(
        "{}{}_{}_{}",
        MENU_ID_GOTO_PREFIX,
        kind.tag(),
        handle.pid,
        handle.start_time
    )
}

pub fn kill_menu_id(kind: ProcessKind, handle: &ProcessHandle) -> String {
    format!(
        "{}{}_{}_{}",
        MENU_ID_KILL_PREFIX,
        kind.tag(),
        handle.pid,
        handle.start_time
    )
}

pub fn kill_all_menu_id(kind: ProcessKind) -> String {
    format!("{}{}", MENU_ID_KILL_ALL_PREFIX, kind.tag())
}

pub fn parse_menu_action(raw: &str) -> Option<MenuAction> {
    if raw == MENU_ID_QUIT {
        Some(MenuAction::Quit)
    } else if raw == MENU_ID_EDIT_CONFIG {
        Some(MenuAction::EditConfig)
    } else if let Some(rest) = raw.strip_prefix(MENU_ID_KILL_ALL_PREFIX) {
        ProcessKind::from_tag(rest).map(MenuAction::KillAll)
    } else if let Some(rest) = raw.strip_prefix(MENU_ID_GOTO_PREFIX) {
        let (kind, pid, start_time) = parse_identity(rest)?;
        Some(MenuAction::GoTo {
            kind,
            pid,
            start_time,
        })
    } else if let Some(rest) = raw.strip_prefix(MENU_ID_KILL_PREFIX) {
        let (kind, pid, start_time) = parse_identity(rest)?;
        Some(MenuAction::Kill {
            kind,
            pid,
            start_time,
        })
    } else {
        None
    }
}

fn parse_identity(rest: &str) -> Option<(ProcessKind, u32, u64)> {
    let (tag, rest) = rest.split_once('_')?;
    let (pid, start_time) = rest.split_once('_')?;
    Some((
        ProcessKind::from_tag(tag)?,
        pid.parse().ok()?,
        start_time.parse().ok()?,
    ))
}

/// What the host still has to do after an action was dispatched.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Followup {
    None,
    EditConfig,
    Quit,
}

/// Run a menu action against the records captured at the last refresh.
pub fn dispatch<B: FileBrowser>(
    action: &MenuAction,
    menus: &[MenuSynchronizer],
    lifecycle: &LifecycleController<'_>,
    locator: &Locator<B>,
) -> Followup {
    let lookup = |kind: ProcessKind, pid: u32, start_time: u64| {
        let record = menus
            .iter()
            .find(|m| m.kind() == kind)
            .and_then(|m| m.record(pid, start_time));
        if record.is_none() {
            log::debug!("{} entry for pid {} is no longer listed", kind, pid);
        }
        record
    };

    match action {
        MenuAction::GoTo {
            kind,
            pid,
            start_time,
        } => {
            if let Some(record) = lookup(*kind, *pid, *start_time)
                && locator.reveal(&record.target_path) == RevealOutcome::Missing
            {
                log::info!(
                    "{} no longer exists, nothing to show",
                    record.target_path.display()
                );
            }
            Followup::None
        }
        MenuAction::Kill {
            kind,
            pid,
            start_time,
        } => {
            if let Some(record) = lookup(*kind, *pid, *start_time) {
                lifecycle.terminate_one(record);
            }
            Followup::None
        }
        MenuAction::KillAll(kind) => {
            lifecycle.terminate_all_of_kind(*kind);
            Followup::None
        }
        MenuAction::EditConfig => Followup::EditConfig,
        MenuAction::Quit => Followup::Quit,
    }
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
pub fn build_tray_menu(menus: &[MenuSynchronizer], images: &ImagesConfig) -> Result<Menu> {
    let menu = Menu::new();

    menu.append(&MenuItem::with_id(MENU_ID_QUIT, "Exit", true, None))?;
    menu.append(&PredefinedMenuItem::separator())?;

    for kind in ProcessKind::ALL {
        let kill_all = MenuItem::with_id(
            kill_all_menu_id(kind),
            format!("Kill all {}", images.image_for(kind)),
            true,
            None,
        );
        menu.append(&kill_all)?;
    }
    menu.append(&PredefinedMenuItem::separator())?;

    for sync in menus {
        let submenu = Submenu::new(sync.title(images), true);
        if sync.entries().is_empty() {
            // Not refreshed yet
            let id = format!("{}{}", MENU_ID_EMPTY_PREFIX, sync.kind().tag());
            submenu.append(&MenuItem::with_id(id, PLACEHOLDER_LABEL, false, None))?;
        }
        for entry in sync.entries() {
            match entry {
                MenuEntry::Process {
                    label,
                    goto_id,
                    kill_id,
                } => {
                    let process_menu = Submenu::new(label, true);
                    process_menu.append(&MenuItem::with_id(goto_id.as_str(), "Go to", true, None))?;
                    process_menu.append(&MenuItem::with_id(kill_id.as_str(), "Kill", true, None))?;
                    submenu.append(&process_menu)?;
                }
                MenuEntry::Placeholder { id, label } => {
                    submenu.append(&MenuItem::with_id(id.as_str(), *label, false, None))?;
                }
            }
        }
        menu.append(&submenu)?;
    }

    menu.append(&PredefinedMenuItem::separator())?;
    menu.append(&MenuItem::with_id(
        MENU_ID_EDIT_CONFIG,
        "Edit Configuration...",
        true,
        None,
    ))?;
    Ok(menu)
}
