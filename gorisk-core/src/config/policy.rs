//! Policy file schema (spec §6) and validation.
//!
//! Capability and taint-rule strings are kept as plain `String`s here
//! rather than referencing `gorisk_analysis::capability::Capability` — this
//! crate sits below `gorisk-analysis` in the dependency graph, so the
//! string forms are parsed back into the closed capability enum at the
//! gate (spec §9: "string forms live only at the I/O boundary").

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AllowException {
    pub package: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub taint: Vec<String>,
    /// ISO-8601 `YYYY-MM-DD`. Compared lexicographically against "today" —
    /// ISO dates sort the same lexicographically as chronologically, so no
    /// date-parsing dependency is needed.
    pub expires: String,
}

impl AllowException {
    /// `true` if this exception's `expires` date is strictly before `today`
    /// (both `YYYY-MM-DD`).
    pub fn is_expired(&self, today: &str) -> bool {
        self.expires.as_str() < today
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PolicyFile {
    pub version: i64,
    pub fail_on: String,
    #[serde(default)]
    pub max_health_score: Option<i64>,
    #[serde(default)]
    pub min_health_score: Option<i64>,
    #[serde(default)]
    pub block_archived: bool,
    #[serde(default)]
    pub deny_capabilities: Vec<String>,
    #[serde(default)]
    pub allow_exceptions: Vec<AllowException>,
    #[serde(default)]
    pub max_dep_depth: Option<u32>,
    #[serde(default)]
    pub exclude_packages: Vec<String>,
}

impl PolicyFile {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let policy: PolicyFile =
            serde_json::from_str(text).map_err(|e| ConfigError::PolicyMalformed {
                message: e.to_string(),
            })?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 0 && self.version != 1 {
            return Err(ConfigError::UnsupportedPolicyVersion {
                version: self.version,
            });
        }
        match self.fail_on.as_str() {
            "low" | "medium" | "high" => {}
            other => {
                return Err(ConfigError::InvalidFailOn {
                    value: other.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Thresholds as an ordered integer for comparison against a computed
    /// `RiskLevel` (none=0, low=1, medium=2, high=3).
    pub fn fail_on_value(&self) -> u8 {
        match self.fail_on.as_str() {
            "low" => 1,
            "medium" => 2,
            "high" => 3,
            _ => 3,
        }
    }
}
