use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::matcher::{DEFAULT_MAX_RESULTS, DEFAULT_MIN_SCORE};
use crate::models::{CompatibilityWeights, Event};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Events loaded into the in-memory store at startup
    #[serde(default)]
    pub seed_events: Vec<SeedEvent>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            seed_events: Vec::new(),
        }
    }
}

/// Event record as written in a config file (keys are snake_case there)
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEvent {
    pub event_id: String,
    pub name: String,
    pub capacity: i64,
    #[serde(default)]
    pub registered: i64,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
}

impl From<&SeedEvent> for Event {
    fn from(seed: &SeedEvent) -> Self {
        Event {
            event_id: seed.event_id.clone(),
            name: seed.name.clone(),
            date: seed.date.clone(),
            time: seed.time.clone(),
            location: seed.location.clone(),
            category: seed.category.clone(),
            capacity: seed.capacity,
            registered: seed.registered,
        }
    }
}

fn default_backend() -> StorageBackend { StorageBackend::Postgres }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    /// Unset disables match caching
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    /// Mail relay endpoint; unset logs notifications instead of sending them
    pub endpoint: Option<String>,
    #[serde(default = "default_sender")]
    pub sender: String,
    pub api_key: Option<String>,
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_qr_base_url")]
    pub qr_base_url: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            sender: default_sender(),
            api_key: None,
            timeout_secs: default_notify_timeout(),
            qr_base_url: default_qr_base_url(),
        }
    }
}

fn default_sender() -> String { "events@localhost".to_string() }
fn default_notify_timeout() -> u64 { 10 }
fn default_qr_base_url() -> String { "https://api.qrserver.com/v1/create-qr-code/".to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_interest_points")]
    pub interest_points: i64,
    #[serde(default = "default_interest_cap")]
    pub interest_cap: i64,
    #[serde(default = "default_mentor_bonus")]
    pub mentor_bonus: i64,
    #[serde(default = "default_mentee_bonus")]
    pub mentee_bonus: i64,
    #[serde(default = "default_skills_bonus")]
    pub complementary_skills_bonus: i64,
    #[serde(default = "default_skills_limit")]
    pub complementary_skills_limit: usize,
    #[serde(default = "default_goal_points")]
    pub goal_points: i64,
    #[serde(default = "default_goal_cap")]
    pub goal_cap: i64,
    #[serde(default = "default_cofounder_bonus")]
    pub cofounder_bonus: i64,
    #[serde(default = "default_team_member_bonus")]
    pub team_member_bonus: i64,
    #[serde(default = "default_same_org_penalty")]
    pub same_org_penalty: i64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            interest_points: default_interest_points(),
            interest_cap: default_interest_cap(),
            mentor_bonus: default_mentor_bonus(),
            mentee_bonus: default_mentee_bonus(),
            complementary_skills_bonus: default_skills_bonus(),
            complementary_skills_limit: default_skills_limit(),
            goal_points: default_goal_points(),
            goal_cap: default_goal_cap(),
            cofounder_bonus: default_cofounder_bonus(),
            team_member_bonus: default_team_member_bonus(),
            same_org_penalty: default_same_org_penalty(),
        }
    }
}

impl From<&WeightsConfig> for CompatibilityWeights {
    fn from(w: &WeightsConfig) -> Self {
        CompatibilityWeights {
            interest_points: w.interest_points,
            interest_cap: w.interest_cap,
            mentor_bonus: w.mentor_bonus,
            mentee_bonus: w.mentee_bonus,
            complementary_skills_bonus: w.complementary_skills_bonus,
            complementary_skills_limit: w.complementary_skills_limit,
            goal_points: w.goal_points,
            goal_cap: w.goal_cap,
            cofounder_bonus: w.cofounder_bonus,
            team_member_bonus: w.team_member_bonus,
            same_org_penalty: w.same_org_penalty,
        }
    }
}

fn default_interest_points() -> i64 { 10 }
fn default_interest_cap() -> i64 { 30 }
fn default_mentor_bonus() -> i64 { 25 }
fn default_mentee_bonus() -> i64 { 20 }
fn default_skills_bonus() -> i64 { 15 }
fn default_skills_limit() -> usize { 3 }
fn default_goal_points() -> i64 { 8 }
fn default_goal_cap() -> i64 { 25 }
fn default_cofounder_bonus() -> i64 { 15 }
fn default_team_member_bonus() -> i64 { 12 }
fn default_same_org_penalty() -> i64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    /// Candidates scoring at or below this are dropped
    #[serde(default = "default_min_score")]
    pub min_score: i64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            max_results: default_max_results(),
        }
    }
}

fn default_min_score() -> i64 { DEFAULT_MIN_SCORE }
fn default_max_results() -> usize { DEFAULT_MAX_RESULTS }

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
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with EVENTHUB__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., EVENTHUB__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("EVENTHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_env_overrides(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("EVENTHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn weights(&self) -> CompatibilityWeights {
        CompatibilityWeights::from(&self.scoring.weights)
    }
}

/// Apply DATABASE_URL, REDIS_URL and EVENTHUB_NOTIFICATIONS__API_KEY on top
/// of the layered config
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", url)?;
    }
    if let Ok(url) = env::var("REDIS_URL") {
        builder = builder.set_override("cache.redis_url", url)?;
    }
    if let Ok(key) = env::var("EVENTHUB_NOTIFICATIONS__API_KEY") {
        builder = builder.set_override("notifications.api_key", key)?;
    }

    builder.build()
}
