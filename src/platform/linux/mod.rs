pub mod browse;
pub mod files;

pub use super::unix::kill;
