//! Client-side context management.
//!
//! Reads/writes `~/.openerp/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A single context: one database on one server, plus the login used there.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    /// Context name (e.g. "local-17").
    pub name: String,

    /// Server URL (e.g. "http://localhost:8069").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,

    /// Database name on that server.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub db: String,

    /// Login name (set by `openerp login`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub login: String,

    /// Password or API key (set by `openerp login`). Sent with every call.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,

    /// User id returned by the last successful login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,
}

impl Context {
    /// Drop the stored credential and identity.
    pub fn clear_login(&mut self) {
        self.password = String::new();
        self.uid = None;
    }
}

/// Client configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Name of the currently active context.
    #[serde(rename = "current-context", default)]
    pub current_context: String,

    /// List of configured contexts.
    #[serde(default)]
    pub contexts: Vec<Context>,
}

impl ClientConfig {
    /// Default config file path: ~/.openerp/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to disk. The file holds credentials, so it is written
    /// owner-only on unix.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Get the currently active context, if any.
    pub fn current(&self) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == self.current_context)
    }

    /// Get a mutable reference to a context by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Context> {
        self.contexts.iter_mut().find(|c| c.name == name)
    }

    /// Add or update a context.
    pub fn upsert_context(&mut self, ctx: Context) {
        if let Some(existing) = self.get_mut(&ctx.name) {
            *existing = ctx;
        } else {
            self.contexts.push(ctx);
        }
    }

    /// Remove a context by name. Returns true if it was found.
    pub fn remove_context(&mut self, name: &str) -> bool {
        let len = self.contexts.len();
        self.contexts.retain(|c| c.name != name);
        if self.current_context == name {
            self.current_context = String::new();
        }
        self.contexts.len() < len
    }
}

/// Return the OpenERP config directory (~/.openerp).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".openerp")
}
