use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const PLACEHOLDER_JWT_SECRET: &str = "demo-secret-key-change-in-production";
pub const PLACEHOLDER_BOT_TOKEN: &str = "DEMO_TOKEN_REPLACE_WITH_REAL_TELEGRAM_BOT_TOKEN";
pub const PLACEHOLDER_OPENAI_KEY: &str = "DEMO_KEY_REPLACE_WITH_REAL_OPENAI_KEY";

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_bot_token")]
    pub telegram_bot_token: String,

    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    #[serde(default)]
    pub telegram_polling: bool,

    #[serde(default = "default_poll_interval")]
    pub telegram_poll_interval_secs: u64,

    #[serde(default = "default_openai_key")]
    pub openai_api_key: String,

    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    port: Option<u16>,
    jwt_secret: Option<String>,
    telegram_bot_token: Option<String>,
    telegram_api_url: Option<String>,
    telegram_polling: Option<bool>,
    telegram_poll_interval_secs: Option<u64>,
    openai_api_key: Option<String>,
    openai_api_url: Option<String>,
    openai_model: Option<String>,
    static_dir: Option<String>,
    log_dir: Option<String>,
    locale: Option<String>,
    http_timeout_secs: Option<u64>,
}

fn default_port() -> u16 {
    3001
}

fn default_jwt_secret() -> String {
    PLACEHOLDER_JWT_SECRET.to_string()
}

fn default_bot_token() -> String {
    PLACEHOLDER_BOT_TOKEN.to_string()
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_interval() -> u64 {
    2
}

fn default_openai_key() -> String {
    PLACEHOLDER_OPENAI_KEY.to_string()
}

fn default_openai_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_static_dir() -> String {
    "dist".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_locale() -> String {
    "ru".to_string()
}

fn default_http_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        PartialServerConfig::default().into_config()
    }
}

impl PartialServerConfig {
    fn from_file(config_path: Option<&str>) -> Result<Self, String> {
        let Some(path_str) = config_path else {
            return Ok(PartialServerConfig::default());
        };
        let path = Path::new(path_str);
        if !path.exists() {
            return Ok(PartialServerConfig::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))
    }

    /// Fields set here win over `fallback`.
    fn or(self, fallback: PartialServerConfig) -> PartialServerConfig {
        PartialServerConfig {
            port: self.port.or(fallback.port),
            jwt_secret: self.jwt_secret.or(fallback.jwt_secret),
            telegram_bot_token: self.telegram_bot_token.or(fallback.telegram_bot_token),
            telegram_api_url: self.telegram_api_url.or(fallback.telegram_api_url),
            telegram_polling: self.telegram_polling.or(fallback.telegram_polling),
            telegram_poll_interval_secs: self
                .telegram_poll_interval_secs
                .or(fallback.telegram_poll_interval_secs),
            openai_api_key: self.openai_api_key.or(fallback.openai_api_key),
            openai_api_url: self.openai_api_url.or(fallback.openai_api_url),
            openai_model: self.openai_model.or(fallback.openai_model),
            static_dir: self.static_dir.or(fallback.static_dir),
            log_dir: self.log_dir.or(fallback.log_dir),
            locale: self.locale.or(fallback.locale),
            http_timeout_secs: self.http_timeout_secs.or(fallback.http_timeout_secs),
        }
    }

    fn into_config(self) -> ServerConfig {
        ServerConfig {
            port: self.port.unwrap_or_else(default_port),
            jwt_secret: self.jwt_secret.unwrap_or_else(default_jwt_secret),
            telegram_bot_token: self.telegram_bot_token.unwrap_or_else(default_bot_token),
            telegram_api_url: self
                .telegram_api_url
                .unwrap_or_else(default_telegram_api_url),
            telegram_polling: self.telegram_polling.unwrap_or(false),
            telegram_poll_interval_secs: self
                .telegram_poll_interval_secs
                .unwrap_or_else(default_poll_interval),
            openai_api_key: self.openai_api_key.unwrap_or_else(default_openai_key),
            openai_api_url: self.openai_api_url.unwrap_or_else(default_openai_api_url),
            openai_model: self.openai_model.unwrap_or_else(default_openai_model),
            static_dir: self.static_dir.unwrap_or_else(default_static_dir),
            log_dir: self.log_dir.unwrap_or_else(default_log_dir),
            locale: self.locale.unwrap_or_else(default_locale),
            http_timeout_secs: self.http_timeout_secs.unwrap_or_else(default_http_timeout),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config = PartialServerConfig::from_file(config_path)?;

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        Ok(env_config.or(file_config).into_config())
    }

    /// Names of the secrets that still carry their insecure placeholder value.
    pub fn placeholder_secrets(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.jwt_secret == PLACEHOLDER_JWT_SECRET {
            names.push("JWT_SECRET");
        }
        if self.telegram_bot_token == PLACEHOLDER_BOT_TOKEN {
            names.push("TELEGRAM_BOT_TOKEN");
        }
        if self.openai_api_key == PLACEHOLDER_OPENAI_KEY {
            names.push("OPENAI_API_KEY");
        }
        names
    }

    pub fn openai_key_configured(&self) -> bool {
        !self.openai_api_key.is_empty() && self.openai_api_key != PLACEHOLDER_OPENAI_KEY
    }

    /// First ten characters of the bot token, safe to log.
    pub fn bot_token_prefix(&self) -> String {
        self.telegram_bot_token.chars().take(10).collect()
    }
}
