//! Logged-in session and its on-disk store.
//!
//! The session lives in `~/.taskboard/session.json` by default and is written
//! with owner-only permissions on unix. The token is never logged.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

const SESSION_FILE: &str = "session.json";

/// Everything a protected call needs: where the server is and who we are.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub base_url: String,
    pub token: String,
    pub username: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            username: username.into(),
        }
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

#[derive(Deserialize)]
struct DisplayClaims {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

fn token_claims(token: &str) -> Option<DisplayClaims> {
    let payload = token.split('.').nth(1)?;
    let raw = BASE64_URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&raw).ok()
}

/// Username carried by a token, read without verifying the signature.
/// Display only.
pub fn token_username(token: &str) -> Option<String> {
    token_claims(token)?.username.filter(|u| !u.is_empty())
}

/// Expiry carried by a token, read without verifying the signature.
pub fn token_expiry(token: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::from_timestamp(token_claims(token)?.exp?, 0)
}

/// File-backed session persistence.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `~/.taskboard/session.json`.
    pub fn default_path() -> Result<PathBuf, ClientError> {
        let home = dirs::home_dir()
            .ok_or_else(|| ClientError::Session("home directory not available".into()))?;
        Ok(home.join(".taskboard").join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `None` when nobody is logged in.
    pub fn load(&self) -> Result<Option<Session>, ClientError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            ClientError::Session(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let session = serde_json::from_str(&contents).map_err(|e| {
            ClientError::Session(format!("failed to parse {}: {e}", self.path.display()))
        })?;
        Ok(Some(session))
    }

    /// Like [`load`](Self::load) but a missing session is an error.
    pub fn require(&self) -> Result<Session, ClientError> {
        self.load()?.ok_or(ClientError::NotLoggedIn)
    }

    pub fn save(&self, session: &Session) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::Session(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let contents = serde_json::to_string_pretty(session)
            .map_err(|e| ClientError::Session(e.to_string()))?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(|e| {
            ClientError::Session(format!("failed to open {}: {e}", self.path.display()))
        })?;
        file.write_all(contents.as_bytes()).map_err(|e| {
            ClientError::Session(format!("failed to write {}: {e}", self.path.display()))
        })?;
        tracing::debug!(path = %self.path.display(), user = %session.username, "session saved");
        Ok(())
    }

    /// Remove the session file. Returns whether one existed.
    pub fn clear(&self) -> Result<bool, ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ClientError::Session(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}
