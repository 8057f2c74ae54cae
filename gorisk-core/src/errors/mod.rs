//! The four kinds of errors gorisk distinguishes (spec §7):
//!
//! 1. [`ConfigError`] — bad flags, malformed/unsupported policy. Exit 2, no
//!    partial report.
//! 2. [`FrontEndError`] — the project's IR could not be built. Exit 2.
//! 3. [`ExternalIoWarning`] — transient health/cache I/O failure. Logged at
//!    warn, treated as "unknown" signal, never fatal — so it is *not* part
//!    of a `Result` error chain, just a value pushed onto a
//!    [`crate::diagnostics::DiagnosticSink`].
//! 4. Analysis over-limit (fixpoint non-convergence) — same treatment as 3,
//!    see [`crate::diagnostics::Diagnostic::FixpointBudgetExhausted`].

pub mod error_code;

use error_code::ErrorCode;

/// Input/configuration errors: bad CLI flags, unreadable or malformed
/// policy file, unsupported policy version.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("policy file not found: {path}")]
    PolicyNotFound { path: String },

    #[error("policy file is not valid JSON: {message}")]
    PolicyMalformed { message: String },

    #[error("unsupported policy version: {version} (expected 0 or 1)")]
    UnsupportedPolicyVersion { version: i64 },

    #[error("invalid fail_on value: {value} (expected low, medium, or high)")]
    InvalidFailOn { value: String },

    #[error("unknown field in policy file: {field}")]
    UnknownField { field: String },

    #[error("invalid CLI flag: {flag}: {message}")]
    InvalidFlag { flag: String, message: String },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::PolicyNotFound { .. } => "GORISK_CONFIG_POLICY_NOT_FOUND",
            Self::PolicyMalformed { .. } => "GORISK_CONFIG_POLICY_MALFORMED",
            Self::UnsupportedPolicyVersion { .. } => "GORISK_CONFIG_UNSUPPORTED_VERSION",
            Self::InvalidFailOn { .. } => "GORISK_CONFIG_INVALID_FAIL_ON",
            Self::UnknownField { .. } => "GORISK_CONFIG_UNKNOWN_FIELD",
            Self::InvalidFlag { .. } => "GORISK_CONFIG_INVALID_FLAG",
        }
    }
}

/// The project's intermediate representation could not be built by the
/// front end (source parsing, import map, or lockfile failure — all
/// external collaborators per spec §1).
#[derive(Debug, thiserror::Error)]
pub enum FrontEndError {
    #[error("unsupported language: {lang}")]
    UnsupportedLanguage { lang: String },

    #[error("project root does not exist or is not readable: {path}")]
    ProjectUnreadable { path: String },

    #[error("front end failed to build IR: {message}")]
    BuildFailed { message: String },
}

impl ErrorCode for FrontEndError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedLanguage { .. } => "GORISK_FRONTEND_UNSUPPORTED_LANGUAGE",
            Self::ProjectUnreadable { .. } => "GORISK_FRONTEND_PROJECT_UNREADABLE",
            Self::BuildFailed { .. } => "GORISK_FRONTEND_BUILD_FAILED",
        }
    }
}

/// Transient failures in external, non-fatal collaborators: the health
/// scorer's HTTP calls, the vulnerability database lookup, or summary-cache
/// reads/writes. These never abort a scan; the caller records one of these
/// and proceeds treating the signal as unknown.
#[derive(Debug, thiserror::Error, Clone)]
pub enum ExternalIoWarning {
    #[error("health provider request failed for {module}: {message}")]
    HealthProviderFailed { module: String, message: String },

    #[error("vulnerability database lookup failed for {module}: {message}")]
    VulnProviderFailed { module: String, message: String },

    #[error("cache read failed for {key}: {message}")]
    CacheReadFailed { key: String, message: String },

    #[error("cache write failed for {key}: {message}")]
    CacheWriteFailed { key: String, message: String },
}

impl ErrorCode for ExternalIoWarning {
    fn error_code(&self) -> &'static str {
        match self {
            Self::HealthProviderFailed { .. } => "GORISK_IO_HEALTH_PROVIDER_FAILED",
            Self::VulnProviderFailed { .. } => "GORISK_IO_VULN_PROVIDER_FAILED",
            Self::CacheReadFailed { .. } => "GORISK_IO_CACHE_READ_FAILED",
            Self::CacheWriteFailed { .. } => "GORISK_IO_CACHE_WRITE_FAILED",
        }
    }
}
