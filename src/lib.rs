pub mod app;
pub use app::run;

pub mod config;
pub mod locate;
pub mod model;
pub mod utils;

// Platform abstraction layer
pub mod platform;

// Discovery, snapshots and termination
pub mod process;

pub mod ui {
    #[cfg(any(target_os = "windows", target_os = "macos"))]
    pub mod icon;
    pub mod menu;
}
