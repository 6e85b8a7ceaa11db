pub mod browse;
pub mod files;
pub mod kill;
