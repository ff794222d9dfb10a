//! Error taxonomy for everything that can go wrong before the retry loop
//! starts.
//!
//! Provisioning failures during the loop are deliberately *not* here: the
//! compute client folds those into [`crate::oci::AttemptOutcome`] so the
//! controller can classify and report them without an error ever escaping.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GrabError>;

/// Configuration and authentication failures, all detected before any launch
/// attempt is made. Each variant carries enough context for the operator to
/// fix the problem without reading source.
#[derive(Debug, Error)]
pub enum GrabError {
    #[error("failed to read launch plan {path}: {source}")]
    PlanRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse launch plan {path}: {source}")]
    PlanParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// One or more plan fields are placeholders or malformed. The message
    /// lists every offending field so the operator can fix them in one pass.
    #[error("invalid launch plan: {0}")]
    PlanInvalid(String),

    #[error("OCI config not found at {path}; run `oci setup config` first")]
    ProfileMissing { path: PathBuf },

    #[error("failed to read OCI config {path}: {source}")]
    ProfileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("profile [{profile}] not found in {path}")]
    ProfileSectionMissing { profile: String, path: PathBuf },

    #[error("profile [{profile}] in {path} is missing `{key}`")]
    ProfileKeyMissing {
        profile: String,
        path: PathBuf,
        key: String,
    },

    #[error("failed to read API signing key {path}: {source}")]
    KeyRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode API signing key {path}: {message}")]
    KeyDecode { path: PathBuf, message: String },

    #[error("could not determine a home directory for ~/.oci/config")]
    HomeDirUnknown,

    #[error("invalid compute endpoint {endpoint}: {message}")]
    EndpointInvalid { endpoint: String, message: String },

    #[error("failed to construct HTTP client: {0}")]
    HttpClient(String),
}

impl GrabError {
    /// True when the fix is credential-side (`oci setup config`, key files)
    /// rather than plan-side. Both classes abort before the first attempt.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            GrabError::ProfileMissing { .. }
                | GrabError::ProfileRead { .. }
                | GrabError::ProfileSectionMissing { .. }
                | GrabError::ProfileKeyMissing { .. }
                | GrabError::KeyRead { .. }
                | GrabError::KeyDecode { .. }
        )
    }
}
