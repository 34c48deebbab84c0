//! CLI command implementations.

pub mod bbox;
pub mod common;
pub mod config;
pub mod groups;
pub mod poi;
pub mod start;
