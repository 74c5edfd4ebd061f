//! Governance configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::GovernanceError;
use crate::params::{DepositParams, GovernanceParams, TallyParams, VotingParams};

/// Configuration for the governance module.
///
/// Can be loaded from a TOML file via [`GovernanceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default)]
    pub deposit: DepositParams,

    #[serde(default)]
    pub voting: VotingParams,

    #[serde(default)]
    pub tally: TallyParams,

    /// Log settings.
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GovernanceConfig {
    /// Deposit, voting and tally parameters for the resolver and keeper.
    pub fn params(&self) -> GovernanceParams {
        GovernanceParams {
            deposit: self.deposit.clone(),
            voting: self.voting.clone(),
            tally: self.tally.clone(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, GovernanceError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| GovernanceError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, GovernanceError> {
        let config: Self = toml::from_str(s).map_err(|e| GovernanceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, GovernanceError> {
        toml::to_string_pretty(self).map_err(|e| GovernanceError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), GovernanceError> {
        self.params().validate().map_err(GovernanceError::Config)?;
        match self.log.format.as_str() {
            "human" | "json" => Ok(()),
            other => Err(GovernanceError::Config(format!(
                "unknown log format {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = GovernanceConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = GovernanceConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = GovernanceConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.deposit.min_deposit, 10);
        assert_eq!(config.tally.quorum_bps, 3340);
        assert_eq!(config.log.format, "human");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            [tally]
            threshold_bps = 6667

            [voting]
            voting_period_secs = 600
        "#;
        let config = GovernanceConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.tally.threshold_bps, 6667);
        assert_eq!(config.tally.veto_threshold_bps, 3340);
        assert_eq!(config.voting.voting_period_secs, 600);
    }

    #[test]
    fn out_of_range_threshold_is_config_error() {
        let err = GovernanceConfig::from_toml_str("[tally]\nquorum_bps = 20000\n").unwrap_err();
        assert!(matches!(err, GovernanceError::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[deposit]\nmin_deposit = 500").unwrap();
        let config = GovernanceConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.deposit.min_deposit, 500);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = GovernanceConfig::from_toml_file("/nonexistent/agora.toml");
        assert!(matches!(result, Err(GovernanceError::Config(_))));
    }
}
