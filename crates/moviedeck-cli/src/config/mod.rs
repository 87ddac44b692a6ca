//! Application configuration module.
//!
//! Manages the TOML config file holding TMDB locale preferences and an
//! optional API key, and resolves where config and data live.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::AppConfig;
pub use paths::AppPaths;
