//! The vulnerability database is a second external collaborator (spec §1):
//! a remote CVE lookup the policy gate folds into the composite score
//! (spec §4.7: `weight_cve * cveCount`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VulnReport {
    pub package: String,
    pub cve_ids: Vec<String>,
}

impl VulnReport {
    pub fn empty(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            cve_ids: Vec::new(),
        }
    }
}

pub trait VulnProvider: Send + Sync {
    fn fetch(&self, package: &str) -> VulnReport;
}

pub struct NullVulnProvider;

impl VulnProvider for NullVulnProvider {
    fn fetch(&self, package: &str) -> VulnReport {
        VulnReport::empty(package)
    }
}
