//! A minimal stand-in for a real per-language front end (spec §1: front
//! ends are external collaborators, out of scope). Reads a `RawIr` that has
//! already been serialized to JSON at `<project_root>/gorisk.ir.json`,
//! rather than parsing Go or Node source itself.

use std::path::Path;

use gorisk_core::errors::FrontEndError;
use gorisk_core::frontend::{FrontEnd, RawIr};

pub const FIXTURE_FILE_NAME: &str = "gorisk.ir.json";

pub struct JsonFixtureFrontEnd;

impl FrontEnd for JsonFixtureFrontEnd {
    fn build(&self, project_root: &Path) -> Result<RawIr, FrontEndError> {
        let fixture_path = project_root.join(FIXTURE_FILE_NAME);
        let text = std::fs::read_to_string(&fixture_path).map_err(|_| FrontEndError::ProjectUnreadable {
            path: fixture_path.display().to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| FrontEndError::BuildFailed { message: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fixture_is_project_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonFixtureFrontEnd.build(dir.path()).unwrap_err();
        assert!(matches!(err, FrontEndError::ProjectUnreadable { .. }));
    }

    #[test]
    fn malformed_fixture_is_build_failed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FIXTURE_FILE_NAME), "not json").unwrap();
        let err = JsonFixtureFrontEnd.build(dir.path()).unwrap_err();
        assert!(matches!(err, FrontEndError::BuildFailed { .. }));
    }

    #[test]
    fn empty_raw_ir_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FIXTURE_FILE_NAME), "{}").unwrap();
        let raw = JsonFixtureFrontEnd.build(dir.path()).unwrap();
        assert!(raw.per_package_functions.is_empty());
    }
}
