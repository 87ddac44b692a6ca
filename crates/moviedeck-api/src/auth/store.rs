//! Credential persistence.
//!
//! Non-secret flags (phase, token expiry) and secrets (request token,
//! session ID) are kept apart so the secrets file can be locked down on
//! its own.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::state::{AuthPhase, CredentialState};

/// Default namespace directory for stored credentials.
pub const DEFAULT_NAMESPACE: &str = "org.moviedeck.credentials";

/// Flags file name.
const FLAGS_FILE: &str = "flags.toml";

/// Secrets file name.
const SECRETS_FILE: &str = "secrets.toml";

/// Storage for [`CredentialState`].
pub trait CredentialStore {
    /// Loads the stored state; a store with nothing saved yields the default.
    ///
    /// # Errors
    ///
    /// Returns an error if stored data cannot be read or parsed.
    fn load(&self) -> Result<CredentialState>;

    /// Replaces the stored state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    fn save(&self, state: &CredentialState) -> Result<()>;

    /// Clears all stored credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored data cannot be removed.
    fn reset(&self) -> Result<()> {
        self.save(&CredentialState::default())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Flags {
    #[serde(default)]
    auth_state: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_token_expires_at: Option<DateTime<Local>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Secrets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
}

/// TOML files under `<base>/<namespace>/`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    /// Store in the default namespace under `base`.
    #[must_use]
    pub fn new(base: &Path) -> Self {
        Self::with_namespace(base, DEFAULT_NAMESPACE)
    }

    /// Store in a custom namespace under `base`.
    #[must_use]
    pub fn with_namespace(base: &Path, namespace: &str) -> Self {
        Self {
            dir: base.join(namespace),
        }
    }

    /// Directory holding the credential files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: for<'de> Deserialize<'de> + Default>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(T::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    fn write<T: Serialize>(&self, name: &str, value: &T, private: bool) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create directory {}", self.dir.display()))?;
        let path = self.dir.join(name);
        let content = toml::to_string_pretty(value).context("failed to serialize credentials")?;
        if !private {
            return std::fs::write(&path, content)
                .with_context(|| format!("failed to write {}", path.display()));
        }

        // The temp file is created owner-only and renamed over `path`, so the
        // secrets never sit in a file with wider permissions.
        let mut file = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("failed to create temp file in {}", self.dir.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        file.persist(&path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<CredentialState> {
        let flags: Flags = self.read(FLAGS_FILE)?;
        let secrets: Secrets = self.read(SECRETS_FILE)?;
        let phase = AuthPhase::from_code(flags.auth_state)
            .with_context(|| format!("unknown auth_state {}", flags.auth_state))?;
        Ok(CredentialState {
            phase,
            request_token: secrets.auth_token,
            request_token_expires_at: flags.request_token_expires_at,
            session_id: secrets.session_id,
        })
    }

    fn save(&self, state: &CredentialState) -> Result<()> {
        let secrets = Secrets {
            auth_token: state.request_token.clone(),
            session_id: state.session_id.clone(),
        };
        self.write(SECRETS_FILE, &secrets, true)?;
        let flags = Flags {
            auth_state: state.phase.code(),
            request_token_expires_at: state.request_token_expires_at,
        };
        self.write(FLAGS_FILE, &flags, false)
    }

    fn reset(&self) -> Result<()> {
        for name in [FLAGS_FILE, SECRETS_FILE] {
            let path = self.dir.join(name);
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    }
}

/// In-process store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    state: Mutex<CredentialState>,
}

impl MemoryCredentialStore {
    /// Store pre-seeded with `state`.
    #[must_use]
    pub const fn with_state(state: CredentialState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Snapshot of the stored state.
    #[must_use]
    pub fn snapshot(&self) -> CredentialState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<CredentialState> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &CredentialState) -> Result<()> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state.clone();
        Ok(())
    }
}
