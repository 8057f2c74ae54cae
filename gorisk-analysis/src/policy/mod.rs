//! Policy gate & composite scorer (spec §4.7).

pub mod gate;
pub mod scorer;

pub use gate::{run_gate, GateVerdict, PackageInput, PackageScore};
pub use scorer::{composite_score, level_for_composite, WEIGHT_CVE};
