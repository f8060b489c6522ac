//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.chatline/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::presence::RosterMode;
use crate::core::types::PeerId;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatlineConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
    pub ws_url: Option<String>,
    pub session_token: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TimingConfig {
    pub reconnect_delay_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub history_timeout_ms: Option<u64>,
    pub scroll_debounce_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ViewConfig {
    pub bottom_proximity: Option<u32>,
    pub roster_mode: Option<RosterMode>,
    pub unread_badges: Option<bool>,
}

/// CLI flags that can override the file and environment.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub server: Option<String>,
    pub ws_url: Option<String>,
    pub token: Option<String>,
    pub user_id: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_WS_PATH: &str = "/ws";
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 2000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_HISTORY_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_SCROLL_DEBOUNCE_MS: u64 = 300;
/// Rows from the bottom within which new messages still auto-scroll.
pub const DEFAULT_BOTTOM_PROXIMITY: u32 = 3;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub ws_url: String,
    pub session_token: Option<String>,
    pub user_id: Option<PeerId>,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
    pub history_timeout: Duration,
    pub scroll_debounce: Duration,
    pub bottom_proximity: u32,
    pub roster_mode: RosterMode,
    pub unread_badges: bool,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.chatline/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".chatline").join("config.toml"))
}

/// Load config from `~/.chatline/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ChatlineConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ChatlineConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(ChatlineConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(ChatlineConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: ChatlineConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# Chatline Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [server]
# base_url = "http://localhost:8080"      # Or CHATLINE_SERVER_URL
# ws_url = "ws://localhost:8080/ws"       # Or CHATLINE_WS_URL (derived from base_url if unset)
# session_token = "..."                   # Or CHATLINE_SESSION_TOKEN
# user_id = "..."                         # Or CHATLINE_USER_ID (hides yourself from the roster)

# [timing]
# reconnect_delay_ms = 2000
# connect_timeout_ms = 10000              # WebSocket handshake limit before retrying
# history_timeout_ms = 15000              # History request limit; older pages unlock after it
# scroll_debounce_ms = 300

# [view]
# bottom_proximity = 3                    # Rows from the bottom that still auto-scroll
# roster_mode = "replace"                 # "replace" or "merge"
# unread_badges = false                   # Mark peers with messages outside the open chat
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &ChatlineConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

/// Same as [`resolve`], with the environment supplied by the caller.
pub fn resolve_with_env(
    config: &ChatlineConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli
        .server
        .clone()
        .or_else(|| env("CHATLINE_SERVER_URL"))
        .or_else(|| config.server.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string();

    // WebSocket URL: CLI → env → config → derived from base URL
    let ws_url = cli
        .ws_url
        .clone()
        .or_else(|| env("CHATLINE_WS_URL"))
        .or_else(|| config.server.ws_url.clone())
        .unwrap_or_else(|| derive_ws_url(&base_url));

    // Blank values at any layer fall through to the next one
    let session_token = non_empty(cli.token.clone())
        .or_else(|| non_empty(env("CHATLINE_SESSION_TOKEN")))
        .or_else(|| non_empty(config.server.session_token.clone()));

    let user_id = non_empty(cli.user_id.clone())
        .or_else(|| non_empty(env("CHATLINE_USER_ID")))
        .or_else(|| non_empty(config.server.user_id.clone()))
        .map(PeerId);

    ResolvedConfig {
        base_url,
        ws_url,
        session_token,
        user_id,
        reconnect_delay: Duration::from_millis(
            config
                .timing
                .reconnect_delay_ms
                .unwrap_or(DEFAULT_RECONNECT_DELAY_MS),
        ),
        connect_timeout: Duration::from_millis(
            config
                .timing
                .connect_timeout_ms
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
        ),
        history_timeout: Duration::from_millis(
            config
                .timing
                .history_timeout_ms
                .unwrap_or(DEFAULT_HISTORY_TIMEOUT_MS),
        ),
        scroll_debounce: Duration::from_millis(
            config
                .timing
                .scroll_debounce_ms
                .unwrap_or(DEFAULT_SCROLL_DEBOUNCE_MS),
        ),
        bottom_proximity: config
            .view
            .bottom_proximity
            .unwrap_or(DEFAULT_BOTTOM_PROXIMITY),
        roster_mode: config.view.roster_mode.unwrap_or_default(),
        unread_badges: config.view.unread_badges.unwrap_or(false),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// `http://host:port` → `ws://host:port/ws`, `https` → `wss`.
pub fn derive_ws_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let swapped = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{swapped}{DEFAULT_WS_PATH}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config_parses() {
        let config = ChatlineConfig::default();
        assert!(config.server.base_url.is_none());
        assert!(config.view.roster_mode.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&ChatlineConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.ws_url, "ws://localhost:8080/ws");
        assert_eq!(resolved.reconnect_delay, Duration::from_millis(2000));
        assert_eq!(resolved.scroll_debounce, Duration::from_millis(300));
        assert_eq!(resolved.bottom_proximity, DEFAULT_BOTTOM_PROXIMITY);
        assert_eq!(resolved.roster_mode, RosterMode::Replace);
        assert!(!resolved.unread_badges);
        assert!(resolved.session_token.is_none());
        assert!(resolved.user_id.is_none());
    }

    #[test]
    fn test_precedence_cli_env_file() {
        let config = ChatlineConfig {
            server: ServerConfig {
                base_url: Some("http://file:1".into()),
                session_token: Some("file-token".into()),
                user_id: Some("file-user".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = |key: &str| match key {
            "CHATLINE_SERVER_URL" => Some("http://env:2".to_string()),
            "CHATLINE_SESSION_TOKEN" => Some("env-token".to_string()),
            _ => None,
        };
        let cli = CliOverrides {
            server: Some("https://cli:3/".into()),
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &cli, env);
        assert_eq!(resolved.base_url, "https://cli:3");
        assert_eq!(resolved.ws_url, "wss://cli:3/ws");
        assert_eq!(resolved.session_token.as_deref(), Some("env-token"));
        assert_eq!(resolved.user_id, Some(PeerId::new("file-user")));
    }

    #[test]
    fn test_explicit_ws_url_wins_over_derived() {
        let config = ChatlineConfig {
            server: ServerConfig {
                ws_url: Some("ws://elsewhere/socket".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.ws_url, "ws://elsewhere/socket");
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[server]
base_url = "http://chat.example:8080"
session_token = "tok"
user_id = "me"

[timing]
reconnect_delay_ms = 500
scroll_debounce_ms = 150

[view]
bottom_proximity = 10
roster_mode = "merge"
unread_badges = true
"#;
        let config: ChatlineConfig = toml::from_str(toml_str).unwrap();
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.ws_url, "ws://chat.example:8080/ws");
        assert_eq!(resolved.reconnect_delay, Duration::from_millis(500));
        assert_eq!(resolved.scroll_debounce, Duration::from_millis(150));
        assert_eq!(resolved.bottom_proximity, 10);
        assert_eq!(resolved.roster_mode, RosterMode::Merge);
        assert!(resolved.unread_badges);
    }

    #[test]
    fn test_sparse_toml_parses() {
        // Only override one thing; everything else stays default
        let toml_str = r#"
[view]
roster_mode = "replace"
"#;
        let config: ChatlineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.view.roster_mode, Some(RosterMode::Replace));
        assert!(config.server.base_url.is_none());
        assert!(config.timing.reconnect_delay_ms.is_none());
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let cli = CliOverrides {
            token: Some(String::new()),
            ..Default::default()
        };
        let resolved = resolve_with_env(&ChatlineConfig::default(), &cli, no_env);
        assert!(resolved.session_token.is_none());
    }

    #[test]
    fn test_blank_cli_token_falls_through_to_env_and_file() {
        let cli = CliOverrides {
            token: Some(String::new()),
            user_id: Some(String::new()),
            ..Default::default()
        };
        let config = ChatlineConfig {
            server: ServerConfig {
                session_token: Some("file-token".into()),
                user_id: Some("file-user".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let env = |key: &str| (key == "CHATLINE_SESSION_TOKEN").then(|| "env-token".to_string());
        let resolved = resolve_with_env(&config, &cli, env);
        assert_eq!(resolved.session_token.as_deref(), Some("env-token"));
        assert_eq!(resolved.user_id, Some(PeerId::new("file-user")));

        // Blank env too: the file value is next in line
        let blank_env = |key: &str| (key == "CHATLINE_SESSION_TOKEN").then(String::new);
        let resolved = resolve_with_env(&config, &cli, blank_env);
        assert_eq!(resolved.session_token.as_deref(), Some("file-token"));
    }

    #[test]
    fn test_timeouts_resolve() {
        let resolved = resolve_with_env(&ChatlineConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.connect_timeout, Duration::from_secs(10));
        assert_eq!(resolved.history_timeout, Duration::from_secs(15));

        let config: ChatlineConfig = toml::from_str(
            "[timing]\nconnect_timeout_ms = 250\nhistory_timeout_ms = 750\n",
        )
        .unwrap();
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.connect_timeout, Duration::from_millis(250));
        assert_eq!(resolved.history_timeout, Duration::from_millis(750));
    }
}
