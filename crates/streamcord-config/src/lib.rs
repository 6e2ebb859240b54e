//! Configuration for streamcord.
//!
//! One config file (TOML, or YAML by extension) layered over built-in
//! defaults and `STREAMCORD_` environment variables, credential
//! resolution (env + keyring + plaintext), validation, and translation
//! to `streamcord_core::RuntimeConfig`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use streamcord_core::config::MAX_RECENTLY_ADDED;
use streamcord_core::{
    CoreError, DiscordConfig, DisplayOptions, PollConfig, RuntimeConfig, ServerKind,
    UpstreamConfig,
};

/// Prefix of environment overrides; nesting uses `__`
/// (`STREAMCORD_SERVER__URL`).
pub const ENV_PREFIX: &str = "STREAMCORD_";

const KEYRING_SERVICE: &str = "streamcord";
const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {secret} configured")]
    NoCredentials { secret: Secret },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigurationInvalid {
            message: err.to_string(),
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Secrets ─────────────────────────────────────────────────────────

/// A credential that can live in the config file, an environment
/// variable, or the system keyring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Secret {
    ApiKey,
    BotToken,
}

impl Secret {
    /// Dotted config key.
    pub fn field(self) -> &'static str {
        match self {
            Self::ApiKey => "server.api_key",
            Self::BotToken => "discord.bot_token",
        }
    }

    fn keyring_user(self) -> &'static str {
        match self {
            Self::ApiKey => "server/api-key",
            Self::BotToken => "discord/bot-token",
        }
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

// ── Config file structs ─────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub discord: DiscordSection,

    #[serde(default)]
    pub display: DisplayOptions,

    #[serde(default)]
    pub general: GeneralSection,
}

/// The media server to poll.
#[derive(Debug, Deserialize, Serialize)]
pub struct ServerSection {
    /// `emby` or `jellyfin`.
    #[serde(default)]
    pub kind: ServerKind,

    /// Base URL, e.g. "http://192.168.1.10:8096".
    #[serde(default = "default_server_url")]
    pub url: String,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// User whose library view drives "recently added". Resolved from
    /// the server when absent.
    pub user_id: Option<String>,

    /// Accept self-signed certificates.
    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            kind: ServerKind::default(),
            url: default_server_url(),
            api_key: None,
            api_key_env: None,
            user_id: None,
            insecure: false,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:8096".into()
}
fn default_timeout() -> u64 {
    30
}

/// The Discord bot and the guild objects it manages.
#[derive(Debug, Deserialize, Serialize)]
pub struct DiscordSection {
    /// Bot token (plaintext; prefer keyring or env var).
    pub bot_token: Option<String>,

    /// Environment variable name containing the bot token.
    pub bot_token_env: Option<String>,

    #[serde(default)]
    pub guild_id: u64,

    #[serde(default)]
    pub status_channel_id: u64,

    #[serde(default)]
    pub recently_added_channel_id: u64,

    /// Only required when `display.show_library_counts` is on.
    #[serde(default)]
    pub library_category_id: u64,

    /// Hex RGB, with or without a leading `#`.
    #[serde(default = "default_embed_color")]
    pub embed_color: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for DiscordSection {
    fn default() -> Self {
        Self {
            bot_token: None,
            bot_token_env: None,
            guild_id: 0,
            status_channel_id: 0,
            recently_added_channel_id: 0,
            library_category_id: 0,
            embed_color: default_embed_color(),
            api_base: default_api_base(),
        }
    }
}

fn default_embed_color() -> String {
    "7289DA".into()
}
fn default_api_base() -> String {
    "https://discord.com/api/v10".into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GeneralSection {
    #[serde(default = "default_refresh")]
    pub refresh_seconds: u64,

    #[serde(default = "default_recent_limit")]
    pub recently_added_limit: usize,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            refresh_seconds: default_refresh(),
            recently_added_limit: default_recent_limit(),
        }
    }
}

fn default_refresh() -> u64 {
    15
}
fn default_recent_limit() -> usize {
    MAX_RECENTLY_ADDED
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "streamcord", "streamcord").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("streamcord");
    p
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the file at `path` (if present), then the environment.
pub fn figment_for(path: &Path) -> Figment {
    let figment = Figment::new().merge(Serialized::defaults(Config::default()));
    let figment = if is_yaml(path) {
        figment.merge(Yaml::file(path))
    } else {
        figment.merge(Toml::file(path))
    };
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load the full Config.
///
/// An explicit path must exist; the default path may be absent, in which
/// case only defaults and the environment apply.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match explicit {
        Some(path) => {
            std::fs::metadata(path)?;
            path.to_path_buf()
        }
        None => config_path(),
    };

    let config: Config = figment_for(&path).extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a secret: named env var, then system keyring, then plaintext.
pub fn resolve_secret(
    secret: Secret,
    plaintext: Option<&str>,
    env_name: Option<&str>,
) -> Result<SecretString, ConfigError> {
    // 1. Named env var
    if let Some(val) = env_name.and_then(|name| std::env::var(name).ok()) {
        return Ok(SecretString::from(val));
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, secret.keyring_user()) {
        if let Ok(val) = entry.get_password() {
            return Ok(SecretString::from(val));
        }
    }

    // 3. Plaintext in config
    if let Some(val) = plaintext.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(val.to_owned()));
    }

    Err(ConfigError::NoCredentials { secret })
}

/// Store a secret in the system keyring.
pub fn store_secret(secret: Secret, value: &SecretString) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, secret.keyring_user())?;
    entry.set_password(value.expose_secret())?;
    Ok(())
}

// ── Validation & translation ────────────────────────────────────────

/// Parse `"7289DA"`, `"#7289da"` or `"0x7289DA"` into an RGB value.
pub fn parse_embed_color(raw: &str) -> Result<u32, ConfigError> {
    let hex = raw
        .trim()
        .trim_start_matches('#')
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    if hex.len() != 6 {
        return Err(invalid(
            "discord.embed_color",
            format!("expected 6 hex digits, got '{raw}'"),
        ));
    }
    u32::from_str_radix(hex, 16).map_err(|_| {
        invalid(
            "discord.embed_color",
            format!("expected 6 hex digits, got '{raw}'"),
        )
    })
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| invalid(field, format!("{e}: {raw}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(field, format!("unsupported scheme '{other}'"))),
    }
}

fn require_id(field: &str, id: u64) -> Result<(), ConfigError> {
    if id == 0 {
        return Err(invalid(field, "must be set to a Discord id"));
    }
    Ok(())
}

impl Config {
    /// Check everything that does not need credentials.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_discord()?;
        self.validate_general()
    }

    /// Checks needed to talk to the media server alone.
    pub fn validate_server(&self) -> Result<(), ConfigError> {
        parse_url("server.url", &self.server.url)?;
        if self.server.timeout_secs == 0 {
            return Err(invalid("server.timeout_secs", "must be at least 1"));
        }
        Ok(())
    }

    fn validate_discord(&self) -> Result<(), ConfigError> {
        parse_url("discord.api_base", &self.discord.api_base)?;
        parse_embed_color(&self.discord.embed_color)?;

        require_id("discord.guild_id", self.discord.guild_id)?;
        require_id("discord.status_channel_id", self.discord.status_channel_id)?;
        require_id(
            "discord.recently_added_channel_id",
            self.discord.recently_added_channel_id,
        )?;
        if self.display.show_library_counts {
            require_id(
                "discord.library_category_id",
                self.discord.library_category_id,
            )?;
        }
        if self.discord.status_channel_id == self.discord.recently_added_channel_id {
            return Err(invalid(
                "discord.recently_added_channel_id",
                "must differ from discord.status_channel_id",
            ));
        }
        Ok(())
    }

    /// Checks on the scheduler settings.
    pub fn validate_general(&self) -> Result<(), ConfigError> {
        if self.general.refresh_seconds == 0 {
            return Err(invalid("general.refresh_seconds", "must be at least 1"));
        }
        if !(1..=MAX_RECENTLY_ADDED).contains(&self.general.recently_added_limit) {
            return Err(invalid(
                "general.recently_added_limit",
                format!("must be between 1 and {MAX_RECENTLY_ADDED}"),
            ));
        }
        Ok(())
    }

    /// Media server connection with its API key resolved.
    pub fn upstream(&self) -> Result<UpstreamConfig, ConfigError> {
        self.validate_server()?;
        let api_key = resolve_secret(
            Secret::ApiKey,
            self.server.api_key.as_deref(),
            self.server.api_key_env.as_deref(),
        )?;

        Ok(UpstreamConfig {
            kind: self.server.kind,
            url: parse_url("server.url", &self.server.url)?,
            api_key,
            user_id: self.server.user_id.clone().filter(|id| !id.is_empty()),
            accept_invalid_certs: self.server.insecure,
            timeout: Duration::from_secs(self.server.timeout_secs),
        })
    }

    /// Scheduler settings.
    pub fn poll(&self) -> Result<PollConfig, ConfigError> {
        self.validate_general()?;
        Ok(PollConfig {
            interval: Duration::from_secs(self.general.refresh_seconds),
            recently_added_limit: self.general.recently_added_limit,
        })
    }

    /// Validate, resolve credentials, and build the runtime config.
    pub fn to_runtime(&self) -> Result<RuntimeConfig, ConfigError> {
        self.validate()?;

        let upstream = self.upstream()?;
        let bot_token = resolve_secret(
            Secret::BotToken,
            self.discord.bot_token.as_deref(),
            self.discord.bot_token_env.as_deref(),
        )?;

        Ok(RuntimeConfig {
            upstream,
            discord: DiscordConfig {
                bot_token,
                api_base: parse_url("discord.api_base", &self.discord.api_base)?,
                guild_id: self.discord.guild_id,
                status_channel_id: self.discord.status_channel_id,
                recently_added_channel_id: self.discord.recently_added_channel_id,
                library_category_id: self.discord.library_category_id,
                embed_color: parse_embed_color(&self.discord.embed_color)?,
            },
            display: self.display,
            poll: self.poll()?,
        })
    }

    /// TOML rendering with plaintext secrets masked.
    pub fn render_redacted(&self) -> Result<String, ConfigError> {
        let mut value = toml::Value::try_from(self)?;
        for (section, key, present) in [
            ("server", "api_key", self.server.api_key.is_some()),
            ("discord", "bot_token", self.discord.bot_token.is_some()),
        ] {
            if !present {
                continue;
            }
            if let Some(table) = value.get_mut(section).and_then(toml::Value::as_table_mut) {
                table.insert(key.into(), toml::Value::String(REDACTED.into()));
            }
        }
        Ok(toml::to_string_pretty(&value)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    fn valid() -> Config {
        let mut config = Config::default();
        config.server.api_key = Some("emby-key".into());
        config.discord.bot_token = Some("bot-token".into());
        config.discord.guild_id = 1;
        config.discord.status_channel_id = 2;
        config.discord.recently_added_channel_id = 3;
        config
    }

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server.kind, ServerKind::Emby);
        assert_eq!(config.general.refresh_seconds, 15);
        assert_eq!(config.general.recently_added_limit, 10);
        assert_eq!(config.discord.embed_color, "7289DA");
        assert_eq!(config.discord.api_base, "https://discord.com/api/v10");
        assert!(!config.display.show_library_counts);
    }

    #[test]
    fn embed_color_forms() {
        assert_eq!(parse_embed_color("7289DA").unwrap(), 0x72_89DA);
        assert_eq!(parse_embed_color("#00a8ff").unwrap(), 0x00_A8FF);
        assert_eq!(parse_embed_color("0xFFFFFF").unwrap(), 0xFF_FFFF);
        assert!(parse_embed_color("blue").is_err());
        assert!(parse_embed_color("#12345").is_err());
        assert!(parse_embed_color("GGGGGG").is_err());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = valid();
        config.general.refresh_seconds = 0;
        assert_eq!(field_of(config.validate().unwrap_err()), "general.refresh_seconds");

        let mut config = valid();
        config.general.recently_added_limit = 11;
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "general.recently_added_limit"
        );

        let mut config = valid();
        config.discord.recently_added_channel_id = config.discord.status_channel_id;
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "discord.recently_added_channel_id"
        );

        let mut config = valid();
        config.server.url = "ftp://media.local".into();
        assert_eq!(field_of(config.validate().unwrap_err()), "server.url");

        let mut config = valid();
        config.discord.guild_id = 0;
        assert_eq!(field_of(config.validate().unwrap_err()), "discord.guild_id");
    }

    #[test]
    fn library_category_required_only_with_library_counts() {
        let mut config = valid();
        config.validate().unwrap();

        config.display.show_library_counts = true;
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "discord.library_category_id"
        );

        config.discord.library_category_id = 4;
        config.validate().unwrap();
    }

    #[test]
    fn runtime_translation() {
        let mut config = valid();
        config.server.kind = ServerKind::Jellyfin;
        config.server.insecure = true;
        config.server.user_id = Some(String::new());
        config.general.refresh_seconds = 30;

        let runtime = config.to_runtime().unwrap();

        assert_eq!(runtime.upstream.kind, ServerKind::Jellyfin);
        assert_eq!(runtime.upstream.api_key.expose_secret(), "emby-key");
        assert_eq!(runtime.upstream.user_id, None);
        assert!(runtime.upstream.accept_invalid_certs);
        assert_eq!(runtime.discord.bot_token.expose_secret(), "bot-token");
        assert_eq!(runtime.discord.embed_color, 0x72_89DA);
        assert_eq!(runtime.poll.interval, Duration::from_secs(30));
        assert_eq!(runtime.poll.backoff(), Duration::from_secs(5));
    }

    #[test]
    fn redacted_rendering_hides_plaintext_secrets() {
        let rendered = valid().render_redacted().unwrap();
        assert!(!rendered.contains("emby-key"));
        assert!(!rendered.contains("bot-token"));
        assert!(rendered.contains(REDACTED));
        assert!(rendered.contains("guild_id = 1"));
    }

    #[test]
    fn toml_file_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "streamcord.toml",
                r#"
                    [server]
                    kind = "jellyfin"
                    url = "http://jf.local:8096"
                    api_key = "from-file"

                    [discord]
                    guild_id = 10
                    status_channel_id = 11
                    recently_added_channel_id = 12

                    [display]
                    show_bandwidth = true
                "#,
            )?;
            jail.set_env("STREAMCORD_GENERAL__REFRESH_SECONDS", "45");
            jail.set_env("STREAMCORD_DISCORD__EMBED_COLOR", "#FF0000");

            let config = load_config(Some(Path::new("streamcord.toml"))).map_err(|e| e.to_string())?;

            assert_eq!(config.server.kind, ServerKind::Jellyfin);
            assert_eq!(config.server.url, "http://jf.local:8096");
            assert_eq!(config.server.api_key.as_deref(), Some("from-file"));
            assert_eq!(config.discord.guild_id, 10);
            assert!(config.display.show_bandwidth);
            assert!(config.display.show_user);
            assert_eq!(config.general.refresh_seconds, 45);
            assert_eq!(config.discord.embed_color, "#FF0000");
            Ok(())
        });
    }

    #[test]
    fn yaml_file_by_extension() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "streamcord.yml",
                "server:\n  url: http://emby.local:8096\ngeneral:\n  recently_added_limit: 5\n",
            )?;

            let config = load_config(Some(Path::new("streamcord.yml"))).map_err(|e| e.to_string())?;

            assert_eq!(config.server.url, "http://emby.local:8096");
            assert_eq!(config.general.recently_added_limit, 5);
            assert_eq!(config.general.refresh_seconds, 15);
            Ok(())
        });
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/streamcord.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn named_env_var_wins_over_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env("MY_EMBY_KEY", "from-env");

            let secret = resolve_secret(Secret::ApiKey, Some("from-file"), Some("MY_EMBY_KEY"))
                .map_err(|e| e.to_string())?;

            assert_eq!(secret.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn config_error_becomes_configuration_invalid() {
        let core: CoreError = invalid("general.refresh_seconds", "must be at least 1").into();
        assert!(matches!(core, CoreError::ConfigurationInvalid { ref message }
            if message == "invalid general.refresh_seconds: must be at least 1"));
    }
}
