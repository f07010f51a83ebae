use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 18790;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const HEARTBEAT_INTERVAL_SECS: u64 = 30; // keep-alive sweep cadence
pub const SUBSCRIBER_BUFFER: usize = 64; // frames queued per SSE client before it counts as dead
pub const DEFAULT_BATCH_LIMIT: usize = 10;
pub const MAX_BATCH_LIMIT: usize = 50;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Top-level config (herald.toml + HERALD_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeraldConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub distribution: DistributionConfig,
    #[serde(default)]
    pub platforms: PlatformsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Origins allowed to open the event stream from a browser. Empty = any.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Shared-secret authentication for the trigger endpoints (cron, automations).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Accepted as `Authorization: Bearer <secret>` or `x-cron-secret: <secret>`.
    /// When unset every trigger request is rejected.
    pub trigger_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    #[serde(default = "default_heartbeat")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: HEARTBEAT_INTERVAL_SECS,
            subscriber_buffer: SUBSCRIBER_BUFFER,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionConfig {
    /// Run the background poll loop. Disable when an external cron drives
    /// `POST /distribution/process` instead.
    #[serde(default = "bool_true")]
    pub worker_enabled: bool,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,
    #[serde(default = "default_max_batch_limit")]
    pub max_batch_limit: usize,
    #[serde(default = "default_max_retries")]
    pub default_max_retries: u32,
    /// First retry delay; doubles per attempt. 0 retries on the next pass.
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_secs: u64,
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay_secs: u64,
    /// Per-adapter bound on a single post call.
    #[serde(default = "default_adapter_timeout")]
    pub adapter_timeout_secs: u64,
    /// Items left in `processing` longer than this are returned to `pending`
    /// when the worker starts.
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            worker_enabled: true,
            poll_interval_secs: default_poll_interval(),
            batch_limit: DEFAULT_BATCH_LIMIT,
            max_batch_limit: MAX_BATCH_LIMIT,
            default_max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_secs: default_retry_base_delay(),
            retry_max_delay_secs: default_retry_max_delay(),
            adapter_timeout_secs: default_adapter_timeout(),
            stale_after_secs: default_stale_after(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlatformsConfig {
    pub twitter: Option<TwitterConfig>,
    pub facebook: Option<FacebookConfig>,
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    /// OAuth 2.0 user-context access token with `tweet.write` scope.
    pub bearer_token: String,
    #[serde(default = "default_twitter_api")]
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacebookConfig {
    pub page_id: String,
    /// Long-lived page access token.
    pub access_token: String,
    #[serde(default = "default_graph_api")]
    pub graph_base: String,
    #[serde(default = "default_graph_version")]
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Channel that receives distribution posts (numeric id or `@username`).
    pub channel_id: Option<String>,
    /// Chats that receive booking alerts.
    #[serde(default)]
    pub admin_chat_ids: Vec<String>,
    /// Base URL of the admin dashboard; alerts link to
    /// `{dashboard_url}/admin/bookings/{id}` when set.
    #[serde(default)]
    pub dashboard_url: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.herald/herald.db", home)
}
fn default_heartbeat() -> u64 {
    HEARTBEAT_INTERVAL_SECS
}
fn default_subscriber_buffer() -> usize {
    SUBSCRIBER_BUFFER
}
fn default_poll_interval() -> u64 {
    60
}
fn default_batch_limit() -> usize {
    DEFAULT_BATCH_LIMIT
}
fn default_max_batch_limit() -> usize {
    MAX_BATCH_LIMIT
}
fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_retry_base_delay() -> u64 {
    300
}
fn default_retry_max_delay() -> u64 {
    6 * 60 * 60
}
fn default_adapter_timeout() -> u64 {
    30
}
fn default_stale_after() -> u64 {
    15 * 60
}
fn default_twitter_api() -> String {
    "https://api.twitter.com".to_string()
}
fn default_graph_api() -> String {
    "https://graph.facebook.com".to_string()
}
fn default_graph_version() -> String {
    "v19.0".to_string()
}
fn bool_true() -> bool {
    true
}

impl HeraldConfig {
    /// Load config from a TOML file with HERALD_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `HERALD_DISTRIBUTION__BATCH_LIMIT=20` or `HERALD_AUTH__TRIGGER_SECRET=…`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: HeraldConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("HERALD_").split("__"))
            .extract()
            .map_err(|e| crate::error::HeraldError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.herald/herald.toml", home)
}
