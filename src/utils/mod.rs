//! Shared filesystem and platform helpers.

pub mod fs;
pub mod platform;
