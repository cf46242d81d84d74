use std::{fs, path::PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// The session the CLI keeps between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    /// The server that issued the token. The token is only sent back there.
    pub server: String,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < Utc::now())
    }
}

/// The directory holding CLI state, created on first use.
///
/// `USERGATE_CLI_CONFIG_DIR` overrides the platform config directory.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let dir = match std::env::var("USERGATE_CLI_CONFIG_DIR") {
        Ok(custom_dir) => PathBuf::from(custom_dir),
        Err(_) => ProjectDirs::from("", "", "usergate")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| anyhow::anyhow!("Could not find a config directory"))?,
    };

    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    Ok(dir)
}

fn session_file() -> anyhow::Result<PathBuf> {
    Ok(config_dir()?.join("session.json"))
}

/// Loads the stored session, if any.
pub fn load() -> anyhow::Result<Option<StoredSession>> {
    let path = session_file()?;
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let session = sonic_rs::from_str(&content).context("Stored session is corrupt")?;
    Ok(Some(session))
}

/// Loads the stored session for `server`, skipping expired tokens.
pub fn load_for(server: &str) -> anyhow::Result<Option<StoredSession>> {
    Ok(load()?.filter(|session| session.server == server && !session.is_expired()))
}

pub fn save(session: &StoredSession) -> anyhow::Result<()> {
    let path = session_file()?;
    let content = sonic_rs::to_string_pretty(session)?;
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Removes the stored session. Missing files are not an error.
pub fn clear() -> anyhow::Result<()> {
    let path = session_file()?;
    if path.exists() {
        fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_judged_against_now() {
        let mut session = StoredSession {
            server: "http://127.0.0.1:8080".to_string(),
            token: "token".to_string(),
            expires_at: None,
        };
        assert!(!session.is_expired());

        session.expires_at = Some(Utc::now() - chrono::Duration::seconds(1));
        assert!(session.is_expired());

        session.expires_at = Some(Utc::now() + chrono::Duration::days(30));
        assert!(!session.is_expired());
    }
}
