//! Configuration file loading with environment variable overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Environment variable holding the bot token.
pub const TOKEN_ENV_VAR: &str = "BOT_TOKEN";

/// Environment variable overriding the liveness port.
pub const PORT_ENV_VAR: &str = "PORT";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Gateway credentials and command surface.
    #[serde(default)]
    pub bot: BotConfig,

    /// Frame asset location.
    #[serde(default)]
    pub frame: FrameConfig,

    /// Liveness endpoint binding.
    #[serde(default)]
    pub liveness: LivenessConfig,

    /// Outbound HTTP and response timing.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Gateway credentials and command surface.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot token. `BOT_TOKEN` takes precedence.
    pub token: Option<String>,
    /// Channels the setup command is accepted in.
    pub channels: Vec<u64>,
    /// Setup command text, matched case-insensitively.
    pub command: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            channels: vec![1_278_232_974_042_595_380, 1_212_324_069_458_845_758],
            command: "!setup".to_string(),
        }
    }
}

/// Frame asset location.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Path to the frame image.
    pub path: PathBuf,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("frame.png") }
    }
}

/// Liveness endpoint binding.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind. `PORT` takes precedence.
    pub port: u16,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 5000 }
    }
}

/// Outbound HTTP and response timing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Timeout for a single avatar download.
    pub fetch_timeout_secs: u64,
    /// Time allowed for fetching and compositing before the reply is abandoned.
    pub response_deadline_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { fetch_timeout_secs: 30, response_deadline_secs: 30 }
    }
}

impl HttpConfig {
    /// Avatar download timeout.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Deadline for producing a reply.
    #[must_use]
    pub fn response_deadline(&self) -> Duration {
        Duration::from_secs(self.response_deadline_secs)
    }
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Get the bot token, preferring the environment variable.
    #[must_use]
    pub fn bot_token(&self) -> Option<String> {
        resolve_token(std::env::var(TOKEN_ENV_VAR).ok(), self.bot.token.as_deref())
    }

    /// Get the liveness port, preferring the environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but is not a valid port number.
    pub fn liveness_port(&self) -> Result<u16, String> {
        match std::env::var(PORT_ENV_VAR) {
            Ok(raw) => raw.trim().parse().map_err(|e| format!("Invalid {PORT_ENV_VAR} '{raw}': {e}")),
            Err(_) => Ok(self.liveness.port),
        }
    }
}

/// Pick the first non-blank token, environment before file.
fn resolve_token(from_env: Option<String>, from_file: Option<&str>) -> Option<String> {
    let non_blank = |token: &String| !token.trim().is_empty();
    from_env.filter(non_blank).or_else(|| from_file.map(str::to_string).filter(non_blank))
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `PFP_FRAMER_CONFIG` environment variable
/// 3. `~/.config/pfp-framer/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("PFP_FRAMER_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

/// Default config path: `~/.config/pfp-framer/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/pfp-framer/config.toml")
    } else {
        PathBuf::from("pfp-framer.toml")
    }
}
