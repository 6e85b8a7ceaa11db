use anyhow::{Context, Result};
use serde_json::json;

use crate::config::load_or_create_config;
use crate::model::ProcessKind;
use crate::process::SystemProcessTable;
use crate::process::registry::ProcessRegistry;

#[cfg(any(target_os = "windows", target_os = "macos"))]
pub use tray::run_tray;

const LIST_FLAG: &str = "--list";

pub fn run() -> Result<()> {
    if std::env::args().skip(1).any(|arg| arg == LIST_FLAG) {
        return print_snapshots();
    }
    run_host()
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
fn run_host() -> Result<()> {
    run_tray()
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn run_host() -> Result<()> {
    log::info!("no tray host on this platform; printing a one-off listing");
    print_snapshots()
}

/// Print one snapshot per kind as JSON.
pub fn print_snapshots() -> Result<()> {
    let config = load_or_create_config().context("failed to load configuration")?;
    let table = SystemProcessTable::new();
    let registry = ProcessRegistry::new(&table, &config.images);

    let listing = json!({
        "solver": registry.snapshot(ProcessKind::Solver),
        "viewer": registry.snapshot(ProcessKind::Viewer),
    });
    let text = serde_json::to_string_pretty(&listing).context("failed to serialize listing")?;
    println!("{}", text);
    Ok(())
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
mod tray {
    use std::thread;
    use std::time::{Duration, Instant};

    use anyhow::{Context, Result};
    use log::{error, warn};
    use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
    use tray_icon::menu::MenuEvent;
    use tray_icon::{MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent};
    use winit::event::{Event, StartCause};
    use winit::event_loop::{ControlFlow, EventLoop, EventLoopProxy};

    use crate::config::{Config, get_config_path, load_and_validate_config, load_or_create_config};
    use crate::locate::Locator;
    use crate::model::{ProcessKind, UserEvent};
    use crate::process::SystemProcessTable;
    use crate::process::lifecycle::LifecycleController;
    use crate::process::registry::ProcessRegistry;
    use crate::ui::icon::{IconVariant, create_icon};
    use crate::ui::menu::{Followup, MenuSynchronizer, build_tray_menu, dispatch, parse_menu_action};
    use crate::utils::{hidden_command, spawn_detached};

    const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);
    const CONFIG_DEBOUNCE_DURATION: Duration = Duration::from_millis(500);
    const TOOLTIP: &str = "Solver processes";

    struct TrayState {
        config: Config,
        menus: [MenuSynchronizer; 2],
    }

    pub fn run_tray() -> Result<()> {
        let config = load_or_create_config().context("failed to load configuration")?;
        let mut state = TrayState {
            config,
            menus: ProcessKind::ALL.map(MenuSynchronizer::new),
        };
        let table = SystemProcessTable::new();
        let locator = Locator::system();

        let event_loop = EventLoop::<UserEvent>::with_user_event()
            .build()
            .context("failed to create event loop")?;
        let proxy = event_loop.create_proxy();

        let _config_watcher = spawn_config_watcher(proxy.clone());
        let menu_receiver = MenuEvent::receiver().clone();
        let tray_receiver = TrayIconEvent::receiver().clone();

        let icon = create_icon(IconVariant::Idle).context("failed to create tray icon image")?;
        let initial_menu = build_tray_menu(&state.menus, &state.config.images)
            .context("failed to build initial menu")?;
        let tray_icon = TrayIconBuilder::new()
            .with_icon(icon)
            .with_menu(Box::new(initial_menu))
            .with_tooltip(TOOLTIP)
            .build()
            .context("failed to create tray icon")?;
        tray_icon
            .set_visible(true)
            .context("failed to show tray icon")?;

        #[allow(deprecated)]
        let run_result = event_loop.run(move |event, event_loop| match event {
            Event::NewEvents(StartCause::Init) => {
                event_loop
                    .set_control_flow(ControlFlow::WaitUntil(Instant::now() + EVENT_POLL_INTERVAL));
            }
            Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
                // Hovering or pressing on the icon precedes the menu popping up
                while let Ok(event) = tray_receiver.try_recv() {
                    let signal = match event {
                        TrayIconEvent::Enter { .. }
                        | TrayIconEvent::Click {
                            button_state: MouseButtonState::Down,
                            ..
                        } => Some(UserEvent::MenuAboutToShow),
                        TrayIconEvent::Leave { .. } => Some(UserEvent::MenuClosed),
                        _ => None,
                    };
                    if let Some(signal) = signal {
                        let _ = proxy.send_event(signal);
                    }
                }
                while let Ok(event) = menu_receiver.try_recv() {
                    if let Some(action) = parse_menu_action(event.id().as_ref()) {
                        let _ = proxy.send_event(UserEvent::MenuAction(action));
                    }
                }
                event_loop
                    .set_control_flow(ControlFlow::WaitUntil(Instant::now() + EVENT_POLL_INTERVAL));
            }
            Event::UserEvent(user_event) => match user_event {
                UserEvent::MenuAboutToShow => {
                    let registry = ProcessRegistry::new(&table, &state.config.images);
                    let mut refreshed = false;
                    for menu in state.menus.iter_mut() {
                        refreshed |= menu.about_to_show(&registry);
                    }
                    if refreshed {
                        sync_tray_menu(&tray_icon, &state);
                    }
                }
                UserEvent::MenuClosed => {
                    for menu in state.menus.iter_mut() {
                        menu.closed();
                    }
                }
                UserEvent::MenuAction(action) => {
                    // Picking an item closes the menu
                    for menu in state.menus.iter_mut() {
                        menu.closed();
                    }
                    let lifecycle = LifecycleController::new(&table, &state.config.images);
                    match dispatch(&action, &state.menus, &lifecycle, &locator) {
                        Followup::None => {}
                        Followup::EditConfig => open_config_in_editor(),
                        Followup::Quit => event_loop.exit(),
                    }
                }
                UserEvent::ConfigReloaded(new_config) => {
                    log::info!("configuration reloaded");
                    state.config = new_config;
                    for menu in state.menus.iter_mut() {
                        menu.closed();
                    }
                    sync_tray_menu(&tray_icon, &state);
                }
                UserEvent::ConfigReloadFailed(message) => {
                    warn!("{}", message);
                }
            },
            _ => {}
        });

        run_result.context("event loop terminated with error")?;
        Ok(())
    }

    fn sync_tray_menu(tray_icon: &TrayIcon, state: &TrayState) {
        match build_tray_menu(&state.menus, &state.config.images) {
            Ok(menu) => tray_icon.set_menu(Some(Box::new(menu))),
            Err(err) => error!("Failed to rebuild menu: {}", err),
        }

        let running = state.menus.iter().any(|m| !m.records().is_empty());
        let variant = if running {
            IconVariant::Busy
        } else {
            IconVariant::Idle
        };
        match create_icon(variant) {
            Ok(icon) => {
                if let Err(err) = tray_icon.set_icon(Some(icon)) {
                    error!("Failed to update icon: {}", err);
                }
            }
            Err(err) => error!("Failed to draw icon: {}", err),
        }
    }

    fn open_config_in_editor() {
        let config_path = get_config_path();

        #[cfg(target_os = "macos")]
        let cmd = {
            let mut cmd = hidden_command("open");
            cmd.arg("-t").arg(&config_path);
            cmd
        };

        #[cfg(target_os = "windows")]
        let cmd = {
            let mut cmd = hidden_command("notepad");
            cmd.arg(&config_path);
            cmd
        };

        spawn_detached(cmd, "config editor");
    }

    fn spawn_config_watcher(proxy: EventLoopProxy<UserEvent>) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            let config_path = get_config_path();
            let (tx, rx) = std::sync::mpsc::channel();

            let mut watcher: RecommendedWatcher = match Watcher::new(
                move |res: Result<NotifyEvent, notify::Error>| {
                    let _ = tx.send(res);
                },
                notify::Config::default(),
            ) {
                Ok(w) => w,
                Err(e) => {
                    log::error!("Failed to create config watcher: {}", e);
                    return;
                }
            };

            if let Err(e) = watcher.watch(&config_path, RecursiveMode::NonRecursive) {
                log::error!("Failed to watch config file: {}", e);
                return;
            }

            log::debug!("Config watcher started for {:?}", config_path);

            // Debounce: track last reload time
            let mut last_reload = Instant::now() - CONFIG_DEBOUNCE_DURATION;

            for result in rx {
                match result {
                    Ok(event) => {
                        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                            continue;
                        }
                        // Editors may write in multiple ops
                        if last_reload.elapsed() < CONFIG_DEBOUNCE_DURATION {
                            continue;
                        }
                        last_reload = Instant::now();

                        log::debug!("Config file changed, attempting reload");
                        let event = match load_and_validate_config() {
                            Ok(new_config) => UserEvent::ConfigReloaded(new_config),
                            Err(e) => UserEvent::ConfigReloadFailed(format!(
                                "Config reload failed: {:#}",
                                e
                            )),
                        };
                        if proxy.send_event(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::error!("Config watch error: {}", e);
                    }
                }
            }
        })
    }
}
