//! Ledger configuration.
//!
//! Sources, lowest precedence first:
//! - built-in defaults
//! - optional `config/stockledger.{toml,...}` file
//! - `STOCKLEDGER__*` environment variables (`STOCKLEDGER__HTTP__BIND=127.0.0.1:9000`)

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use stockledger_catalog::ApplyMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Whether a submitted adjustment waits for a second person.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPolicy {
    /// `Draft → Pending`, then an explicit approve/reject.
    #[default]
    Manual,
    /// Submitting applies the adjustment immediately.
    AutoApprove,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub approval_policy: ApprovalPolicy,
    /// Mode for approvals of adjustments built without `allowNegative`.
    pub apply_mode: ApplyMode,
    /// Leading segment of generated adjustment numbers (`ADJ-20240517-0001`).
    pub number_prefix: String,
    pub log_level: String,
    pub http: HttpConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            approval_policy: ApprovalPolicy::Manual,
            apply_mode: ApplyMode::Strict,
            number_prefix: "ADJ".to_string(),
            log_level: "info".to_string(),
            http: HttpConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Load from `config/stockledger` (optional) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/stockledger").required(false))
            .add_source(Environment::with_prefix("STOCKLEDGER").separator("__"))
            .build()?;

        let parsed: Self = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Parse a TOML document (no environment overlay).
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?;

        let parsed: Self = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn auto_approve(&self) -> bool {
        self.approval_policy == ApprovalPolicy::AutoApprove
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let prefix = self.number_prefix.trim();
        if prefix.is_empty() {
            return Err(ConfigError::Invalid("number_prefix must not be empty".into()));
        }
        if prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid("number_prefix must not contain whitespace".into()));
        }
        if self.http.bind.trim().is_empty() {
            return Err(ConfigError::Invalid("http.bind must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = LedgerConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, LedgerConfig::default());
        assert!(!cfg.auto_approve());
        assert_eq!(cfg.apply_mode, ApplyMode::Strict);
        assert_eq!(cfg.http.bind, "0.0.0.0:8080");
    }

    #[test]
    fn toml_overrides_selected_keys() {
        let cfg = LedgerConfig::from_toml_str(
            r#"
            approval_policy = "auto_approve"
            apply_mode = "clamp"
            number_prefix = "SA"

            [http]
            bind = "127.0.0.1:9100"
            "#,
        )
        .unwrap();

        assert!(cfg.auto_approve());
        assert_eq!(cfg.apply_mode, ApplyMode::Clamp);
        assert_eq!(cfg.number_prefix, "SA");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.http.bind, "127.0.0.1:9100");
    }

    #[test]
    fn unknown_policy_is_a_load_error() {
        let err = LedgerConfig::from_toml_str(r#"approval_policy = "sometimes""#).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn blank_prefix_is_invalid() {
        let err = LedgerConfig::from_toml_str(r#"number_prefix = "  ""#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
