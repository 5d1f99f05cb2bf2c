use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    /// Absent means sessions are unavailable
    #[serde(default)]
    pub cache: Option<CacheSettings>,
    pub llm: LlmSettings,
    /// Absent means the email channel is disabled for every provider
    #[serde(default)]
    pub email: Option<EmailSettings>,
    /// Absent means the SMS channel is disabled for every provider
    #[serde(default)]
    pub sms: Option<SmsSettings>,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub dispatch: DispatchSettings,
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub redis_url: String,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Use the LLM for notification copy; the template is used otherwise
    #[serde(default = "default_true")]
    pub personalize: bool,
}

fn default_llm_timeout() -> u64 { 30 }
fn default_temperature() -> f32 { 0.2 }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    pub from_address: String,
    #[serde(default = "default_transport_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_twilio_url")]
    pub api_url: String,
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    pub from_number: String,
    #[serde(default = "default_transport_timeout")]
    pub timeout_secs: u64,
}

fn default_transport_timeout() -> u64 { 10 }
fn default_twilio_url() -> String { "https://api.twilio.com".to_string() }

/// Candidate retrieval and ranking tunables
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: u8,
    #[serde(default = "default_radius_miles")]
    pub radius_miles: f64,
    #[serde(default = "default_min_rating")]
    pub min_rating: f64,
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
    /// Adjacency map file; the bundled map is used when unset
    #[serde(default)]
    pub related_categories_path: Option<String>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            max_matches: default_max_matches(),
            min_confidence: default_min_confidence(),
            radius_miles: default_radius_miles(),
            min_rating: default_min_rating(),
            candidate_limit: default_candidate_limit(),
            related_categories_path: None,
        }
    }
}

fn default_max_matches() -> usize { 10 }
fn default_min_confidence() -> u8 { 50 }
fn default_radius_miles() -> f64 { 25.0 }
fn default_min_rating() -> f64 { 3.5 }
fn default_candidate_limit() -> usize { 50 }

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self { batch_size: default_batch_size() }
    }
}

fn default_batch_size() -> usize { 5 }

#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorSettings {
    #[serde(default = "default_min_quality_score")]
    pub min_quality_score: f64,
    #[serde(default = "default_true")]
    pub auto_send_notifications: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            min_quality_score: default_min_quality_score(),
            auto_send_notifications: true,
        }
    }
}

fn default_min_quality_score() -> f64 { 5.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Later sources override earlier ones:
    /// 1. `config/default.toml`
    /// 2. `config/local.toml` (development overrides)
    /// 3. Environment variables prefixed with `LEADFLOW`
    ///    (e.g. `LEADFLOW__SERVER__PORT` -> `server.port`)
    /// 4. Well-known secrets (`DATABASE_URL`, `LLM_API_KEY`, ...)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("LEADFLOW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("LEADFLOW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }
}

/// Apply secrets from their conventional environment variables.
///
/// Email and SMS secrets are only applied when that section is configured,
/// so an unset section stays disabled.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let has_email = settings.get_table("email").is_ok();
    let has_sms = settings.get_table("sms").is_ok();

    let mut builder = Config::builder().add_source(settings);

    if let Ok(url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", url)?;
    }
    if let Ok(key) = env::var("LLM_API_KEY") {
        builder = builder.set_override("llm.api_key", key)?;
    }
    if has_email {
        if let Ok(key) = env::var("EMAIL_API_KEY") {
            builder = builder.set_override("email.api_key", key)?;
        }
    }
    if has_sms {
        if let Ok(token) = env::var("TWILIO_AUTH_TOKEN") {
            builder = builder.set_override("sms.auth_token", token)?;
        }
    }

    builder.build()
}
