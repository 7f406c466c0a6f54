/// Server configuration
use crate::error::{Result, ServerError};
use chorus_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default = "default_resolver")]
    pub resolver: ResolverSettings,

    #[serde(default = "default_catalog")]
    pub catalog: CatalogSettings,

    #[serde(default = "default_driver")]
    pub driver: DriverSettings,

    #[serde(default = "default_notifications")]
    pub notifications: NotificationSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// yt-dlp invocation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverSettings {
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    /// yt-dlp format selector for the playable stream
    #[serde(default = "default_format")]
    pub format: String,
}

/// Music catalog (Spotify Web API) access
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSettings {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default = "default_catalog_api_url")]
    pub api_url: String,

    #[serde(default = "default_catalog_auth_url")]
    pub auth_url: String,

    #[serde(default = "default_catalog_timeout_secs")]
    pub timeout_secs: u64,
}

/// Playback transport stand-in
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DriverSettings {
    /// How long to "play" tracks of unknown length, in seconds
    #[serde(default = "default_unknown_length_secs")]
    pub unknown_length_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationSettings {
    /// Status messages kept per reply channel
    #[serde(default = "default_keep_per_channel")]
    pub keep_per_channel: usize,
}

impl CatalogSettings {
    /// Client credentials, if both halves are configured
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.clone(), secret.clone()))
            }
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DriverSettings {
    pub fn unknown_length(&self) -> Duration {
        Duration::from_secs(self.unknown_length_secs)
    }
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `config.toml` in the working
    /// directory is used when present. Environment variables prefixed with
    /// `CHORUS_` override both, with `__` separating sections
    /// (`CHORUS_PLAYBACK__HISTORY_SIZE=100`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from("config.toml");
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CHORUS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playback.workers == 0 {
            return Err(ServerError::Config(
                "playback.workers must be at least 1".to_string(),
            ));
        }

        if self.playback.resolve_timeout_secs == 0 {
            return Err(ServerError::Config(
                "playback.resolve_timeout_secs must be positive".to_string(),
            ));
        }

        if self.playback.playlist_timeout_secs < self.playback.resolve_timeout_secs {
            return Err(ServerError::Config(
                "playback.playlist_timeout_secs must be at least playback.resolve_timeout_secs"
                    .to_string(),
            ));
        }

        if self.notifications.keep_per_channel == 0 {
            return Err(ServerError::Config(
                "notifications.keep_per_channel must be at least 1".to_string(),
            ));
        }

        if self.catalog.client_id.is_some() != self.catalog.client_secret.is_some() {
            return Err(ServerError::Config(
                "catalog.client_id and catalog.client_secret must be set together".to_string(),
            ));
        }

        for (name, url) in [
            ("catalog.api_url", &self.catalog.api_url),
            ("catalog.auth_url", &self.catalog.auth_url),
        ] {
            if url::Url::parse(url).is_err() {
                return Err(ServerError::Config(format!("{name} is not a URL: {url}")));
            }
        }

        Ok(())
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_resolver() -> ResolverSettings {
    ResolverSettings {
        ytdlp_path: default_ytdlp_path(),
        format: default_format(),
    }
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_format() -> String {
    "bestaudio[ext=m4a]/bestaudio/best".to_string()
}

fn default_catalog() -> CatalogSettings {
    CatalogSettings {
        client_id: None,
        client_secret: None,
        api_url: default_catalog_api_url(),
        auth_url: default_catalog_auth_url(),
        timeout_secs: default_catalog_timeout_secs(),
    }
}

fn default_catalog_api_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_catalog_auth_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

fn default_catalog_timeout_secs() -> u64 {
    15
}

fn default_driver() -> DriverSettings {
    DriverSettings {
        unknown_length_secs: default_unknown_length_secs(),
    }
}

fn default_unknown_length_secs() -> u64 {
    180
}

fn default_notifications() -> NotificationSettings {
    NotificationSettings {
        keep_per_channel: default_keep_per_channel(),
    }
}

fn default_keep_per_channel() -> usize {
    50
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            playback: PlaybackConfig::default(),
            resolver: default_resolver(),
            catalog: default_catalog(),
            driver: default_driver(),
            notifications: default_notifications(),
        }
    }
}
