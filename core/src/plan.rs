//! The launch plan: everything the operator pins down before the loop starts.
//!
//! Read from `armgrab.toml`, validated up front, then frozen into a
//! [`LaunchRequest`]. Validation failures abort before any attempt is made
//! and list every offending field at once.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{GrabError, Result};
use crate::oci::{
    CreateVnicDetails, InstanceMetadata, LaunchRequest, ShapeConfig, SourceDetails,
};

/// Marker left in place by the sample plan; any field still carrying it has
/// not been filled in.
const PLACEHOLDER: &str = "REPLACE_WITH";

#[derive(Debug, Clone, Deserialize)]
pub struct LaunchPlan {
    pub instance: InstancePlan,
    #[serde(default)]
    pub retry: RetryPlan,
}

/// The `[instance]` table: identifiers and sizing for the instance to create.
#[derive(Debug, Clone, Deserialize)]
pub struct InstancePlan {
    pub display_name: String,
    pub compartment_id: String,
    pub availability_domain: String,
    pub shape: String,
    pub ocpus: f32,
    pub memory_in_gbs: f32,
    pub image_id: String,
    #[serde(default = "default_boot_volume_size_in_gbs")]
    pub boot_volume_size_in_gbs: u32,
    pub subnet_id: String,
    #[serde(default = "default_true")]
    pub assign_public_ip: bool,
    #[serde(default = "default_true")]
    pub assign_private_dns_record: bool,
    pub ssh_authorized_keys: String,
}

/// The `[retry]` table. A single knob by design: the loop uses a fixed
/// interval, not an escalating backoff.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryPlan {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for RetryPlan {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl RetryPlan {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl LaunchPlan {
    /// Read and validate a plan. Returns the plan only if every field is
    /// ready to submit.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| GrabError::PlanRead {
            path: path.to_path_buf(),
            source,
        })?;
        let plan: LaunchPlan = toml::from_str(&text).map_err(|source| GrabError::PlanParse {
            path: path.to_path_buf(),
            source,
        })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Check every field, collecting all problems before reporting.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        let instance = &self.instance;

        if instance.display_name.trim().is_empty() {
            problems.push("display_name is empty".to_string());
        }
        for (field, value) in [
            ("compartment_id", &instance.compartment_id),
            ("image_id", &instance.image_id),
            ("subnet_id", &instance.subnet_id),
        ] {
            if let Some(problem) = check_ocid(field, value) {
                problems.push(problem);
            }
        }
        if instance.availability_domain.trim().is_empty() {
            problems.push("availability_domain is empty".to_string());
        }
        if instance.shape.trim().is_empty() {
            problems.push("shape is empty".to_string());
        }
        if instance.ocpus <= 0.0 {
            problems.push(format!("ocpus must be positive, got {}", instance.ocpus));
        }
        if instance.memory_in_gbs <= 0.0 {
            problems.push(format!(
                "memory_in_gbs must be positive, got {}",
                instance.memory_in_gbs
            ));
        }
        if instance.boot_volume_size_in_gbs == 0 {
            problems.push("boot_volume_size_in_gbs must be positive".to_string());
        }
        if instance.ssh_authorized_keys.trim().is_empty()
            || instance.ssh_authorized_keys.contains(PLACEHOLDER)
        {
            problems.push("ssh_authorized_keys is not configured".to_string());
        }
        if self.retry.interval_secs == 0 {
            problems.push("retry.interval_secs must be a positive number of seconds".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(GrabError::PlanInvalid(problems.join("; ")))
        }
    }

    /// Freeze the plan into the request body submitted on every attempt.
    pub fn to_launch_request(&self) -> LaunchRequest {
        let instance = &self.instance;
        LaunchRequest {
            display_name: instance.display_name.clone(),
            compartment_id: instance.compartment_id.clone(),
            availability_domain: instance.availability_domain.clone(),
            shape: instance.shape.clone(),
            shape_config: ShapeConfig {
                ocpus: instance.ocpus,
                memory_in_gbs: instance.memory_in_gbs,
            },
            source_details: SourceDetails {
                source_type: "image".to_string(),
                image_id: instance.image_id.clone(),
                boot_volume_size_in_gbs: instance.boot_volume_size_in_gbs,
            },
            create_vnic_details: CreateVnicDetails {
                assign_public_ip: instance.assign_public_ip,
                subnet_id: instance.subnet_id.clone(),
                assign_private_dns_record: instance.assign_private_dns_record,
            },
            metadata: InstanceMetadata {
                ssh_authorized_keys: instance.ssh_authorized_keys.clone(),
            },
        }
    }
}

fn check_ocid(field: &str, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return Some(format!("{field} is empty"));
    }
    if value.contains(PLACEHOLDER) {
        return Some(format!("{field} still contains the {PLACEHOLDER} placeholder"));
    }
    if !value.starts_with("ocid1.") {
        return Some(format!("{field} does not look like an OCID: {value}"));
    }
    None
}

fn default_boot_volume_size_in_gbs() -> u32 {
    50
}

fn default_interval_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}
