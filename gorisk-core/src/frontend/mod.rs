//! The per-language front end is an external collaborator (spec §1): source
//! parsing, import-map resolution, and lockfile reading all live outside
//! this workspace. This module defines the interface it must satisfy and
//! the raw two-collection shape spec §6 describes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::FrontEndError;
use crate::types::collections::FxHashMap;
use crate::types::ir::{CallEdge, FunctionCaps};

/// The two per-package collections a front end delivers (spec §6): a
/// `{symbolKey -> FunctionCaps}` map and a `{callerKey -> [CallEdge]}` map,
/// both keyed by package name. `gorisk_analysis::ir::consolidate` flattens
/// this into a single [`crate::types::ir::IRGraph`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawIr {
    #[serde(default)]
    pub per_package_functions: FxHashMap<String, FxHashMap<String, FunctionCaps>>,
    #[serde(default)]
    pub per_package_edges: FxHashMap<String, Vec<CallEdge>>,
}

/// Ecosystem a front end targets. `Auto` means the CLI should detect it
/// from the project root (spec §6 `--lang auto|go|node`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Auto,
    Go,
    Node,
}

pub trait FrontEnd: Send + Sync {
    fn build(&self, project_root: &Path) -> Result<RawIr, FrontEndError>;
}
