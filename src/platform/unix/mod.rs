//! Signal-based termination shared by macOS and Linux

pub mod kill;
