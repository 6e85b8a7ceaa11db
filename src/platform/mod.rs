//! Platform abstraction layer
//!
//! This module provides platform-specific implementations for:
//! - Open file enumeration for a process
//! - Process termination (single pid and bulk by image name)
//! - Launching the file browser

#[cfg(unix)]
pub mod unix;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

// Re-export the current platform's modules
#[cfg(target_os = "linux")]
pub use linux as current;

#[cfg(target_os = "macos")]
pub use macos as current;

#[cfg(target_os = "windows")]
pub use windows as current;
