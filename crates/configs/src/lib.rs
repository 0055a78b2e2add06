//! # configs
//!
//! Layered settings: `config/default.toml`, then optional
//! `config/local.toml`, then `FEEDBACK_BOARD__<SECTION>__<KEY>` environment
//! variables. A `.env` file is loaded first when present.
//!
//! `content` and `index` are optional. When absent the binary wires the
//! disabled adapters instead of failing to start.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "FEEDBACK_BOARD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub content: Option<ContentSettings>,
    #[serde(default)]
    pub index: Option<IndexSettings>,
    pub ledger: LedgerSettings,
    #[serde(default)]
    pub balance: BalanceSettings,
    #[serde(default)]
    pub sequence: SequenceSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize)]
pub struct ContentSettings {
    pub gateway: String,
    pub api_url: String,
    pub upload_url: String,
    pub token: SecretString,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Deadline for uploads and deletes
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ContentSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    #[default]
    Rest,
    Postgres,
}

#[derive(Debug, Deserialize)]
pub struct IndexSettings {
    #[serde(default)]
    pub backend: IndexBackend,
    pub url: String,
    /// Service key for the REST backend; unused by postgres
    #[serde(default)]
    pub key: Option<SecretString>,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl IndexSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct LedgerSettings {
    pub rpc_url: String,
    pub program_id: String,
    pub fee_recipient: String,
    #[serde(default = "default_ledger_timeout_secs")]
    pub timeout_secs: u64,
}

impl LedgerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct BalanceSettings {
    #[serde(default = "default_min_sol")]
    pub min_sol: f64,
}

impl Default for BalanceSettings {
    fn default() -> Self {
        Self {
            min_sol: default_min_sol(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SequenceSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: default_filter(),
        }
    }
}

fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_table() -> String {
    "feedback_boards".into()
}
fn default_ledger_timeout_secs() -> u64 {
    30
}
fn default_min_sol() -> f64 {
    0.01
}
fn default_max_attempts() -> u32 {
    3
}
fn default_filter() -> String {
    "info".into()
}

impl Settings {
    /// Loads `.env`, then the layered sources rooted at `./config`.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::load_from(Path::new("config"), ENV_PREFIX)
    }

    pub fn load_from(dir: &Path, env_prefix: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(dir.join("default.toml")).required(false))
            .add_source(File::from(dir.join("local.toml")).required(false));
        Self::finish(builder, env_prefix)
    }

    /// Same layering with an in-memory base document in place of the files.
    pub fn from_toml(base: &str, env_prefix: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder().add_source(File::from_str(base, FileFormat::Toml));
        Self::finish(builder, env_prefix)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        env_prefix: &str,
    ) -> Result<Self, ConfigError> {
        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sequence.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "sequence.max_attempts must be at least 1".into(),
            ));
        }
        if !self.balance.min_sol.is_finite() || self.balance.min_sol < 0.0 {
            return Err(ConfigError::Invalid(
                "balance.min_sol must be a non-negative number".into(),
            ));
        }
        let timeouts = [
            ("ledger.timeout_secs", Some(self.ledger.timeout_secs)),
            ("content.fetch_timeout_secs", self.content.as_ref().map(|c| c.fetch_timeout_secs)),
            ("content.request_timeout_secs", self.content.as_ref().map(|c| c.request_timeout_secs)),
            ("index.timeout_secs", self.index.as_ref().map(|i| i.timeout_secs)),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == Some(0)) {
            return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
        }
        if let Some(index) = &self.index {
            if index.backend == IndexBackend::Rest && index.key.is_none() {
                return Err(ConfigError::Invalid(
                    "index.key is required for the rest backend".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const MINIMAL: &str = r#"
        [ledger]
        rpc_url = "http://127.0.0.1:8899"
        program_id = "BoardProg111"
        fee_recipient = "FeeWallet111"
    "#;

    #[test]
    fn minimal_config_fills_defaults() {
        let s = Settings::from_toml(MINIMAL, "FB_TEST_MINIMAL").unwrap();
        assert!(s.content.is_none());
        assert!(s.index.is_none());
        assert_eq!(s.ledger.timeout(), Duration::from_secs(30));
        assert_eq!(s.balance.min_sol, 0.01);
        assert_eq!(s.sequence.max_attempts, 3);
        assert_eq!(s.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn missing_ledger_is_an_error() {
        let err = Settings::from_toml("[balance]\nmin_sol = 0.5\n", "FB_TEST_NOLEDGER").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn full_sections_parse() {
        let toml = format!(
            r#"{MINIMAL}
            [content]
            gateway = "gateway.example.cloud"
            api_url = "https://api.example.cloud/v3"
            upload_url = "https://uploads.example.cloud/v3/files"
            token = "jwt"

            [index]
            backend = "postgres"
            url = "postgres://localhost/boards"

            [logging]
            format = "json"
            filter = "services=debug,info"
            "#
        );
        let s = Settings::from_toml(&toml, "FB_TEST_FULL").unwrap();
        let content = s.content.unwrap();
        assert_eq!(content.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(content.request_timeout(), Duration::from_secs(30));
        assert_eq!(content.token.expose_secret(), "jwt");
        let index = s.index.unwrap();
        assert_eq!(index.backend, IndexBackend::Postgres);
        assert_eq!(index.table, "feedback_boards");
        assert_eq!(index.timeout(), Duration::from_secs(30));
        assert_eq!(s.logging.format, LogFormat::Json);
    }

    #[test]
    fn rest_index_needs_a_key() {
        let toml = format!("{MINIMAL}\n[index]\nurl = \"https://db.example.co\"\n");
        let err = Settings::from_toml(&toml, "FB_TEST_RESTKEY").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("index.key")));
    }

    #[test]
    fn zero_storage_timeout_rejected() {
        let toml = format!(
            "{MINIMAL}\n[index]\nurl = \"https://db.example.co\"\nkey = \"k\"\ntimeout_secs = 0\n"
        );
        let err = Settings::from_toml(&toml, "FB_TEST_ZEROTIMEOUT").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("index.timeout_secs")));
    }

    #[test]
    fn zero_attempts_rejected() {
        let toml = format!("{MINIMAL}\n[sequence]\nmax_attempts = 0\n");
        assert!(Settings::from_toml(&toml, "FB_TEST_ZERO").is_err());
    }

    #[test]
    fn environment_overrides_file() {
        std::env::set_var("FB_TEST_ENV__LEDGER__PROGRAM_ID", "FromEnv111");
        let s = Settings::from_toml(MINIMAL, "FB_TEST_ENV").unwrap();
        std::env::remove_var("FB_TEST_ENV__LEDGER__PROGRAM_ID");
        assert_eq!(s.ledger.program_id, "FromEnv111");
    }
}
