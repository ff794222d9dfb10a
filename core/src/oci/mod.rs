//! OCI compute integration: the launch request wire shape, the one-shot
//! client contract, and its HTTP implementation.

mod compute;
pub mod profile;
pub mod signer;

pub use compute::{ComputeClient, LaunchError, classify_error};
pub use profile::Profile;
pub use signer::{ApiKeySigner, AuthHeaders, RequestAuthorizer, SignError};

use armgrab_protocol::LaunchedInstance;
use async_trait::async_trait;
use serde::Serialize;

/// The `LaunchInstanceDetails` body submitted to the instances endpoint.
///
/// Built once from the validated plan and never mutated between attempts, so
/// resubmission after a capacity failure is observably identical to the first
/// attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    pub display_name: String,
    pub compartment_id: String,
    pub availability_domain: String,
    pub shape: String,
    pub shape_config: ShapeConfig,
    pub source_details: SourceDetails,
    pub create_vnic_details: CreateVnicDetails,
    pub metadata: InstanceMetadata,
}

/// Flexible-shape sizing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeConfig {
    pub ocpus: f32,
    #[serde(rename = "memoryInGBs")]
    pub memory_in_gbs: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDetails {
    /// Always `"image"`; kept explicit because the API requires the tag.
    pub source_type: String,
    pub image_id: String,
    #[serde(rename = "bootVolumeSizeInGBs")]
    pub boot_volume_size_in_gbs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVnicDetails {
    pub assign_public_ip: bool,
    pub subnet_id: String,
    pub assign_private_dns_record: bool,
}

/// Instance metadata map. OCI expects the literal snake_case key
/// `ssh_authorized_keys` here, unlike the camelCase top-level fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceMetadata {
    pub ssh_authorized_keys: String,
}

/// Result of exactly one provisioning call, already classified.
///
/// The client never lets a raw transport or service error escape: everything
/// that is not a success is folded into `Retryable` (capacity exhaustion) or
/// `Fatal` (anything retrying the identical request cannot fix).
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(LaunchedInstance),
    Retryable { reason: String },
    Fatal { reason: String },
}

/// One provisioning call against the platform.
///
/// Implementations must not retry internally and must not keep state between
/// calls; retry policy belongs exclusively to the controller.
#[async_trait]
pub trait LaunchApi: Send + Sync {
    async fn launch(&self, request: &LaunchRequest) -> AttemptOutcome;
}

#[async_trait]
impl<T: LaunchApi + ?Sized> LaunchApi for std::sync::Arc<T> {
    async fn launch(&self, request: &LaunchRequest) -> AttemptOutcome {
        (**self).launch(request).await
    }
}
