use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who the stored tokens belong to, for display only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Tokens persisted between CLI invocations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub server: String,
    pub access_token: String,
    pub refresh_token: String,
    pub user: Option<SessionUser>,
    pub saved_at: DateTime<Utc>,
}

impl Session {
    pub fn new(server: &str, access_token: String, refresh_token: String, user: Option<SessionUser>) -> Self {
        Self {
            server: server.to_string(),
            access_token,
            refresh_token,
            user,
            saved_at: Utc::now(),
        }
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(custom_dir) = std::env::var("MINI_NOTES_CONFIG_DIR") {
        return Ok(PathBuf::from(custom_dir));
    }
    let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
    Ok(PathBuf::from(home).join(".config").join("mini-notes"))
}

/// JSON file holding at most one session
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn default_location() -> anyhow::Result<Self> {
        Ok(Self::in_dir(get_config_dir()?))
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join("session.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let session: Session = serde_json::from_str(&content)?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, content)?;
        restrict_permissions(&self.path)?;
        Ok(())
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
