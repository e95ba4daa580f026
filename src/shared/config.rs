use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[repr(u8)]
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackend {
    #[default]
    Sqlite,
    JsonFile,
}

impl QueueBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "db" | "table" => Some(QueueBackend::Sqlite),
            "json" | "file" | "json_file" => Some(QueueBackend::JsonFile),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub local: DatabaseConfig,
    pub remote: RemoteConfig,
    pub queue: QueueConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    pub max_connections: u32,
    /// Upper bound for one remote attempt (acquire + write + commit).
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub backend: QueueBackend,
    pub url: String,
    pub dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub interval_secs: u64,
    pub run_on_startup: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        let data_dir_str = data_dir.display().to_string();

        Self {
            local: DatabaseConfig {
                url: format!("sqlite://{data_dir_str}/melony.db?mode=rwc"),
                max_connections: 5,
            },
            remote: RemoteConfig {
                url: format!("sqlite://{data_dir_str}/melony_remote.db?mode=rwc"),
                max_connections: 5,
                timeout_ms: 5_000,
            },
            queue: QueueConfig {
                backend: QueueBackend::Sqlite,
                url: format!("sqlite://{data_dir_str}/sync_queue.db?mode=rwc"),
                dir: data_dir.join("pending").display().to_string(),
            },
            sync: SyncConfig {
                auto_sync: true,
                interval_secs: 600, // 10 minutes
                run_on_startup: true,
            },
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("MELONY_LOCAL_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.local.url = v.trim().to_string();
            }
        }
        if let Some(value) = env_u32("MELONY_LOCAL_MAX_CONNECTIONS") {
            cfg.local.max_connections = value;
        }

        if let Ok(v) = std::env::var("MELONY_REMOTE_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.remote.url = v.trim().to_string();
            }
        }
        if let Some(value) = env_u32("MELONY_REMOTE_MAX_CONNECTIONS") {
            cfg.remote.max_connections = value;
        }
        if let Some(value) = env_u64("MELONY_REMOTE_TIMEOUT_MS") {
            cfg.remote.timeout_ms = value;
        }

        if let Ok(v) = std::env::var("MELONY_QUEUE_BACKEND") {
            if let Some(backend) = QueueBackend::parse(&v) {
                cfg.queue.backend = backend;
            }
        }
        if let Ok(v) = std::env::var("MELONY_QUEUE_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.queue.url = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("MELONY_QUEUE_DIR") {
            if !v.trim().is_empty() {
                cfg.queue.dir = v.trim().to_string();
            }
        }

        if let Ok(v) = std::env::var("MELONY_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Some(value) = env_u64("MELONY_SYNC_INTERVAL_SECS") {
            cfg.sync.interval_secs = value;
        }
        if let Ok(v) = std::env::var("MELONY_SYNC_ON_STARTUP") {
            cfg.sync.run_on_startup = parse_bool(&v, cfg.sync.run_on_startup);
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.local.max_connections == 0 {
            return Err("Local max_connections must be greater than 0".to_string());
        }
        if self.remote.max_connections == 0 {
            return Err("Remote max_connections must be greater than 0".to_string());
        }
        if self.remote.timeout_ms == 0 {
            return Err("Remote timeout_ms must be greater than 0".to_string());
        }
        if self.sync.auto_sync && self.sync.interval_secs == 0 {
            return Err("Sync interval_secs must be greater than 0".to_string());
        }
        match self.queue.backend {
            QueueBackend::Sqlite if self.queue.url.trim().is_empty() => {
                return Err("Queue url is required for the sqlite backend".to_string());
            }
            QueueBackend::JsonFile if self.queue.dir.trim().is_empty() => {
                return Err("Queue dir is required for the json file backend".to_string());
            }
            _ => {}
        }
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("melony"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| parse_u64(&v))
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<u32>().ok())
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
