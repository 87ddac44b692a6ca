//! Where moviedeck keeps its files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Application directory name under the XDG base directories.
const APP_DIR: &str = "moviedeck";

/// Config file name.
const CONFIG_FILE: &str = "config.toml";

/// Resolved config file and data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// TOML config file.
    pub config_file: PathBuf,
    /// Base directory for persisted credentials.
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Resolves paths from `--dir` or the environment.
    ///
    /// `--dir` holds both the config file and the data. Otherwise
    /// `XDG_CONFIG_HOME` / `XDG_DATA_HOME` are used when set, falling back
    /// to `~/.config` and `~/.local/share`.
    ///
    /// # Errors
    ///
    /// Returns an error if `HOME` is needed but not set.
    pub fn resolve(dir: Option<&PathBuf>) -> Result<Self> {
        if let Some(d) = dir {
            return Ok(Self::in_dir(d));
        }
        let var = |name: &str| std::env::var_os(name).map(PathBuf::from);
        let home = var("HOME").context("HOME environment variable is not set")?;
        Ok(Self::from_env(
            &home,
            var("XDG_CONFIG_HOME").as_deref(),
            var("XDG_DATA_HOME").as_deref(),
        ))
    }

    fn in_dir(dir: &Path) -> Self {
        Self {
            config_file: dir.join(CONFIG_FILE),
            data_dir: dir.to_path_buf(),
        }
    }

    /// Blank or relative XDG values are ignored.
    fn from_env(home: &Path, config_home: Option<&Path>, data_home: Option<&Path>) -> Self {
        let base = |xdg: Option<&Path>, fallback: PathBuf| {
            xdg.filter(|p| p.is_absolute())
                .map_or(fallback, Path::to_path_buf)
        };
        let config = base(config_home, home.join(".config"));
        let data = base(data_home, home.join(".local").join("share"));
        Self {
            config_file: config.join(APP_DIR).join(CONFIG_FILE),
            data_dir: data.join(APP_DIR),
        }
    }
}
