//! HTTP adapter for the OCI instances endpoint.
//!
//! One `launch` call is exactly one POST. The adapter never retries and never
//! lets a raw error escape: every failure is classified into
//! [`AttemptOutcome::Retryable`] or [`AttemptOutcome::Fatal`] here, so the
//! controller only ever deals in outcomes.

use std::sync::Arc;

use armgrab_protocol::LaunchedInstance;
use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use thiserror::Error;

use super::signer::{CONTENT_TYPE_JSON, RequestAuthorizer, SignError};
use super::{AttemptOutcome, LaunchApi, LaunchRequest};
use crate::error::GrabError;

const INSTANCES_PATH: &str = "/20160918/instances";

/// Error codes the service uses for transient capacity exhaustion.
const CAPACITY_CODES: [&str; 2] = ["OutOfCapacity", "OutOfHostCapacity"];

/// Error codes for tier/quota limits; capacity will never recover within the
/// tier, so retrying the identical request is pointless.
const LIMIT_CODES: [&str; 2] = ["LimitExceeded", "QuotaExceeded"];

/// Message fragments used when the error body carries no structured code.
const CAPACITY_PHRASES: [&str; 2] = ["out of capacity", "out of host capacity"];

/// Compute client for a single region endpoint.
pub struct ComputeClient {
    http: reqwest::Client,
    base: reqwest::Url,
    /// `host[:port]`, as covered by the request signature.
    host: String,
    authorizer: Arc<dyn RequestAuthorizer>,
}

impl ComputeClient {
    /// Client for `https://iaas.{region}.oraclecloud.com`.
    pub fn for_region(
        region: &str,
        authorizer: Arc<dyn RequestAuthorizer>,
    ) -> Result<Self, GrabError> {
        Self::with_endpoint(&format!("https://iaas.{region}.oraclecloud.com"), authorizer)
    }

    /// Client for an explicit endpoint. Used by tests and by operators
    /// pointing at non-commercial realms.
    pub fn with_endpoint(
        endpoint: &str,
        authorizer: Arc<dyn RequestAuthorizer>,
    ) -> Result<Self, GrabError> {
        let base = reqwest::Url::parse(endpoint).map_err(|err| GrabError::EndpointInvalid {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        })?;
        let host = match (base.host_str(), base.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(GrabError::EndpointInvalid {
                    endpoint: endpoint.to_string(),
                    message: "endpoint has no host".to_string(),
                });
            }
        };
        // No per-attempt timeout: the contract assumes each call eventually
        // returns. Bounding attempt latency is a known hardening gap.
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| GrabError::HttpClient(err.to_string()))?;

        Ok(Self {
            http,
            base,
            host,
            authorizer,
        })
    }

    async fn try_launch(&self, request: &LaunchRequest) -> Result<LaunchedInstance, LaunchError> {
        let body =
            serde_json::to_vec(request).map_err(|err| LaunchError::Encode(err.to_string()))?;
        let auth = self
            .authorizer
            .authorize("post", &self.host, INSTANCES_PATH, &body)?;
        let url = self
            .base
            .join(INSTANCES_PATH)
            .map_err(|err| LaunchError::Encode(err.to_string()))?;

        tracing::debug!(url = %url, bytes = body.len(), "issuing launch request");
        let response = self
            .http
            .post(url)
            .header(header::CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(header::DATE, auth.date.as_str())
            .header("x-content-sha256", auth.content_sha256.as_str())
            .header(header::AUTHORIZATION, auth.authorization.as_str())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let envelope: InstanceEnvelope = response
                .json()
                .await
                .map_err(|err| LaunchError::Decode(err.to_string()))?;
            return Ok(envelope.into());
        }

        let text = response.text().await.unwrap_or_default();
        let envelope: ServiceErrorBody = serde_json::from_str(&text).unwrap_or_default();
        tracing::debug!(status = %status, code = ?envelope.code, "launch request rejected");
        Err(LaunchError::Service {
            status: status.as_u16(),
            code: envelope.code,
            message: envelope.message.unwrap_or(text),
        })
    }
}

#[async_trait]
impl LaunchApi for ComputeClient {
    async fn launch(&self, request: &LaunchRequest) -> AttemptOutcome {
        match self.try_launch(request).await {
            Ok(instance) => AttemptOutcome::Success(instance),
            Err(err) => classify_error(&err),
        }
    }
}

/// Everything one POST to the instances endpoint can fail with.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request signing failed: {0}")]
    Sign(#[from] SignError),

    #[error("failed to encode launch request: {0}")]
    Encode(String),

    #[error("failed to decode launch response: {0}")]
    Decode(String),

    #[error("HTTP {status}: {message}")]
    Service {
        status: u16,
        code: Option<String>,
        message: String,
    },
}

/// Fold a launch failure into a retry decision.
///
/// A recognized structured code decides immediately. An unrecognized or
/// absent code falls back to the capacity phrases the service embeds in
/// message text (the service reports host exhaustion as `InternalError` with
/// an "Out of host capacity." message, so code alone is not enough).
/// Everything else is fatal, with the raw code and message preserved.
pub fn classify_error(error: &LaunchError) -> AttemptOutcome {
    let LaunchError::Service {
        status,
        code,
        message,
    } = error
    else {
        return AttemptOutcome::Fatal {
            reason: error.to_string(),
        };
    };

    if let Some(code) = code {
        if CAPACITY_CODES.iter().any(|c| code.eq_ignore_ascii_case(c)) {
            return AttemptOutcome::Retryable {
                reason: service_reason(code, message),
            };
        }
        if LIMIT_CODES.iter().any(|c| code.eq_ignore_ascii_case(c)) {
            return AttemptOutcome::Fatal {
                reason: format!(
                    "{}: tier limit reached, retrying cannot succeed",
                    service_reason(code, message)
                ),
            };
        }
    }

    let lowered = message.to_lowercase();
    if CAPACITY_PHRASES.iter().any(|p| lowered.contains(p)) {
        return AttemptOutcome::Retryable {
            reason: message.clone(),
        };
    }

    let code = code.as_deref().unwrap_or("unknown");
    let message = if message.is_empty() {
        "no error body"
    } else {
        message.as_str()
    };
    AttemptOutcome::Fatal {
        reason: format!("HTTP {status} {code}: {message}"),
    }
}

fn service_reason(code: &str, message: &str) -> String {
    if message.is_empty() {
        code.to_string()
    } else {
        message.to_string()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceEnvelope {
    id: String,
    display_name: String,
    lifecycle_state: String,
    shape: String,
    region: String,
}

impl From<InstanceEnvelope> for LaunchedInstance {
    fn from(envelope: InstanceEnvelope) -> Self {
        LaunchedInstance {
            id: envelope.id,
            display_name: envelope.display_name,
            lifecycle_state: envelope.lifecycle_state,
            shape: envelope.shape,
            region: envelope.region,
        }
    }
}

/// OCI error body: `{"code": "...", "message": "..."}`.
#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    code: Option<String>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn service(status: u16, code: Option<&str>, message: &str) -> LaunchError {
        LaunchError::Service {
            status,
            code: code.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[test]
    fn capacity_code_is_retryable_regardless_of_message() {
        let outcome = classify_error(&service(500, Some("OutOfHostCapacity"), ""));
        assert_eq!(
            outcome,
            AttemptOutcome::Retryable {
                reason: "OutOfHostCapacity".to_string()
            }
        );
    }

    #[test]
    fn capacity_code_match_is_case_insensitive() {
        let outcome = classify_error(&service(
            500,
            Some("OUTOFCAPACITY"),
            "Out of capacity for shape VM.Standard.A1.Flex",
        ));
        assert!(matches!(outcome, AttemptOutcome::Retryable { .. }));
    }

    #[test]
    fn limit_exceeded_is_fatal() {
        let outcome = classify_error(&service(
            400,
            Some("LimitExceeded"),
            "You have reached your service limit",
        ));
        let AttemptOutcome::Fatal { reason } = outcome else {
            panic!("expected fatal outcome");
        };
        assert!(reason.contains("retrying cannot succeed"), "{reason}");
    }

    #[test]
    fn capacity_phrase_without_code_is_retryable() {
        let outcome = classify_error(&service(500, None, "Out of host capacity."));
        assert_eq!(
            outcome,
            AttemptOutcome::Retryable {
                reason: "Out of host capacity.".to_string()
            }
        );
    }

    #[test]
    fn capacity_phrase_under_unrecognized_code_is_retryable() {
        // The service reports host exhaustion as InternalError + message.
        let outcome = classify_error(&service(500, Some("InternalError"), "Out of host capacity."));
        assert!(matches!(outcome, AttemptOutcome::Retryable { .. }));
    }

    #[test]
    fn unknown_service_error_is_fatal_and_preserves_diagnostics() {
        let outcome = classify_error(&service(
            400,
            Some("InvalidParameter"),
            "availabilityDomain is invalid",
        ));
        let AttemptOutcome::Fatal { reason } = outcome else {
            panic!("expected fatal outcome");
        };
        assert!(reason.contains("InvalidParameter"), "{reason}");
        assert!(reason.contains("availabilityDomain is invalid"), "{reason}");
    }

    #[test]
    fn auth_failure_is_fatal() {
        let outcome = classify_error(&service(401, Some("NotAuthenticated"), "not authenticated"));
        assert!(matches!(outcome, AttemptOutcome::Fatal { .. }));
    }

    #[test]
    fn error_without_body_is_fatal_with_status() {
        let outcome = classify_error(&service(502, None, ""));
        let AttemptOutcome::Fatal { reason } = outcome else {
            panic!("expected fatal outcome");
        };
        assert!(reason.contains("HTTP 502"), "{reason}");
    }
}
