//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Complaint lifecycle policy configuration.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Outbound email configuration. Absent means email is disabled.
    #[serde(default)]
    pub email: Option<EmailConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Complaint lifecycle policy configuration.
///
/// These values parameterize the reward policy. They are injected into the
/// lifecycle engine at construction rather than read as globals.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Spam-count at which a filer's account is frozen.
    #[serde(default = "default_spam_threshold")]
    pub spam_threshold: i32,
    /// Days a frozen account stays frozen.
    #[serde(default = "default_spam_tolerance_days")]
    pub spam_tolerance_days: i64,
    /// Points credited when a complaint is approved.
    #[serde(default = "default_points")]
    pub approval_points: i32,
    /// Points deducted on a repeated-spamming crossing.
    #[serde(default = "default_points")]
    pub spam_penalty_points: i32,
    /// Points credited when a complaint is resolved.
    #[serde(default = "default_points")]
    pub resolution_points: i32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            spam_threshold: default_spam_threshold(),
            spam_tolerance_days: default_spam_tolerance_days(),
            approval_points: default_points(),
            spam_penalty_points: default_points(),
            resolution_points: default_points(),
        }
    }
}

/// Outbound email (SMTP) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP host.
    pub host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub password: Option<String>,
    /// From address for all outbound mail.
    pub from_address: String,
    /// Display name on the From header.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_spam_threshold() -> i32 {
    4
}

const fn default_spam_tolerance_days() -> i64 {
    10
}

const fn default_points() -> i32 {
    10
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Civica".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `CIVICA_ENV`)
    /// 3. Environment variables with `CIVICA_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("CIVICA_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CIVICA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("CIVICA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults() {
        let policy = PolicyConfig::default();
        assert_eq!(policy.spam_threshold, 4);
        assert_eq!(policy.spam_tolerance_days, 10);
        assert_eq!(policy.approval_points, 10);
        assert_eq!(policy.spam_penalty_points, 10);
        assert_eq!(policy.resolution_points, 10);
    }
}
