//! The closed source -> sink -> risk table (spec §4.6).

use gorisk_core::types::capability::{Capability, RiskLevel};

#[derive(Debug, Clone, Copy)]
pub struct TaintRule {
    /// Stable SARIF rule id (spec §8 scenario 4: `env->exec` is `GORISK001`).
    pub id: &'static str,
    pub source: Capability,
    pub sink: Capability,
    pub risk: RiskLevel,
}

pub const RULES: &[TaintRule] = &[
    TaintRule {
        id: "GORISK001",
        source: Capability::Env,
        sink: Capability::Exec,
        risk: RiskLevel::High,
    },
    TaintRule {
        id: "GORISK002",
        source: Capability::Network,
        sink: Capability::Exec,
        risk: RiskLevel::High,
    },
    TaintRule {
        id: "GORISK003",
        source: Capability::FsRead,
        sink: Capability::Exec,
        risk: RiskLevel::High,
    },
    TaintRule {
        id: "GORISK004",
        source: Capability::Network,
        sink: Capability::Unsafe,
        risk: RiskLevel::High,
    },
    TaintRule {
        id: "GORISK005",
        source: Capability::Network,
        sink: Capability::FsWrite,
        risk: RiskLevel::Medium,
    },
    TaintRule {
        id: "GORISK006",
        source: Capability::FsRead,
        sink: Capability::Network,
        risk: RiskLevel::Medium,
    },
    TaintRule {
        id: "GORISK007",
        source: Capability::Env,
        sink: Capability::FsWrite,
        risk: RiskLevel::Low,
    },
];
