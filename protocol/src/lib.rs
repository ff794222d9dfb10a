//! Types shared between the retry controller and its front-ends.
//!
//! The controller in `armgrab-core` emits exactly one [`LaunchEvent`] per
//! state transition; reporters (human rendering, `--json` lines) consume them
//! without ever reaching back into the controller. Everything here is plain
//! data and serde-serializable.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Identity of an instance the platform agreed to create.
///
/// Mirrors the subset of the OCI `Instance` resource the operator cares about
/// once the launch call has been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchedInstance {
    /// OCID of the new instance.
    pub id: String,
    pub display_name: String,
    /// Lifecycle state reported at creation time (typically `PROVISIONING`).
    pub lifecycle_state: String,
    pub shape: String,
    pub region: String,
}

/// One event per controller transition.
///
/// `attempt` numbers start at 1 and never decrease across a run; `elapsed` is
/// measured from the single start instant captured when the loop was entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LaunchEvent {
    /// A provisioning attempt is about to be issued.
    AttemptStarted { attempt: u64 },

    /// The attempt failed with a capacity condition; the controller will wait
    /// and retry.
    AttemptRetryable {
        attempt: u64,
        #[serde(with = "duration_secs")]
        elapsed: Duration,
        reason: String,
    },

    /// Terminal: the platform accepted the launch.
    Succeeded {
        attempt: u64,
        #[serde(with = "duration_secs")]
        elapsed: Duration,
        instance: LaunchedInstance,
    },

    /// Terminal: a non-retryable error; no further attempts are made.
    Failed { attempt: u64, reason: String },

    /// Terminal: the operator cancelled the run. Not an error condition.
    Interrupted {
        attempts: u64,
        #[serde(with = "duration_secs")]
        elapsed: Duration,
    },
}

/// Serialize a [`Duration`] as whole seconds so `--json` lines stay flat.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn events_serialize_with_snake_case_tags() {
        let event = LaunchEvent::AttemptRetryable {
            attempt: 3,
            elapsed: Duration::from_secs(181),
            reason: "Out of host capacity.".to_string(),
        };

        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "attempt_retryable");
        assert_eq!(json["attempt"], 3);
        assert_eq!(json["elapsed"], 181);
        assert_eq!(json["reason"], "Out of host capacity.");
    }

    #[test]
    fn succeeded_event_round_trips() {
        let event = LaunchEvent::Succeeded {
            attempt: 4,
            elapsed: Duration::from_secs(240),
            instance: LaunchedInstance {
                id: "ocid1.instance.oc1.ap-hyderabad-1.example".to_string(),
                display_name: "app-server".to_string(),
                lifecycle_state: "PROVISIONING".to_string(),
                shape: "VM.Standard.A1.Flex".to_string(),
                region: "ap-hyderabad-1".to_string(),
            },
        };

        let json = serde_json::to_string(&event).expect("serialize");
        let back: LaunchEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(event, back);
    }
}
