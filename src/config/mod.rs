//! Configuration loading for the audiobook client.
//!
//! Settings are read from `conf/config.toml` if present. The file is organised
//! in tables (`[server]`, `[playback]`, `[conversion]`, `[logging]`, `[keys]`)
//! that flatten into `AppConfig`. Missing or invalid entries fall back to
//! defaults so the client can always start.

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{load_config, serialize_config};
pub use models::{AppConfig, LogLevel};
