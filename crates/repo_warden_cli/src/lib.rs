//! Repo Warden CLI library exports.
//!
//! The binary in `main.rs` only parses the command line; configuration loading and the
//! command implementations live here so they can be tested.

pub mod commands;
pub mod config;
pub mod errors;
