use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ── Paths ─────────────────────────────────────────────────────────────────────

pub const CONFIG_FILE: &str = "homehub.json";
pub const STORAGE_FILE: &str = "storage.json";
pub const LOG_FILE: &str = "homehub.log";

fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Per-user data directory, falling back to the directory of the executable.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("homehub"))
        .unwrap_or_else(exe_dir)
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))
}

// ── JSON helpers ──────────────────────────────────────────────────────────────

pub fn load_json<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> T {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

// ── Configuration ─────────────────────────────────────────────────────────────

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentityProviderKind {
    #[default]
    Mock,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HubConfig {
    #[serde(default = "default_storage_quota")]
    pub storage_quota_bytes: usize,
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: u64,
    #[serde(default = "default_max_persisted_background")]
    pub max_persisted_background_bytes: usize,
    #[serde(default = "default_login_delay_ms")]
    pub login_delay_ms: u64,
    #[serde(default)]
    pub identity_provider: IdentityProviderKind,
    #[serde(default = "default_sidebar_min_width")]
    pub sidebar_min_width: u16,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_storage_quota() -> usize {
    5 * MIB as usize
}

const fn default_max_upload() -> u64 {
    2 * MIB
}

fn default_max_persisted_background() -> usize {
    2 * MIB as usize
}

const fn default_login_delay_ms() -> u64 {
    1500
}

const fn default_sidebar_min_width() -> u16 {
    100
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            storage_quota_bytes: default_storage_quota(),
            max_upload_bytes: default_max_upload(),
            max_persisted_background_bytes: default_max_persisted_background(),
            login_delay_ms: default_login_delay_ms(),
            identity_provider: IdentityProviderKind::Mock,
            sidebar_min_width: default_sidebar_min_width(),
            log_filter: default_log_filter(),
        }
    }
}

impl HubConfig {
    /// Reads `homehub.json` from `data_dir`. Missing or malformed files yield defaults.
    pub fn load(data_dir: &Path) -> Self {
        load_json(&data_dir.join(CONFIG_FILE))
    }

    pub fn login_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.login_delay_ms)
    }
}
