//! JSON response envelope for transports sitting in front of the simulator
//!
//! ```json
//! {"status":"success","data":{"owner_id":"P1","range":{"start":0,"end":19},...}}
//! {"status":"failed","reason":"no_suitable_block","detail":"No suitable block found for 9 units"}
//! ```

use crate::error::{FailureReason, Result, SimError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success {
        data: T,
    },
    Failed {
        /// Absent only for configuration or I/O failures
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<FailureReason>,
        detail: String,
    },
}

impl<T> Response<T> {
    pub fn success(data: T) -> Self {
        Response::Success { data }
    }

    pub fn failed(err: &SimError) -> Self {
        Response::Failed {
            reason: err.reason(),
            detail: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Response::Success { .. } => None,
            Response::Failed { reason, .. } => *reason,
        }
    }
}

impl<T: Serialize> Response<T> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<T> From<Result<T>> for Response<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Response::success(data),
            Err(err) => Response::failed(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Simulator;
    use serde_json::Value;

    #[test]
    fn test_success_envelope() {
        let sim = Simulator::new(100);
        let response = Response::from(sim.allocate("P1", 20, "first-fit"));
        assert!(response.is_success());

        let json: Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["owner_id"], "P1");
        assert_eq!(json["data"]["range"]["start"], 0);
        assert_eq!(json["data"]["range"]["end"], 19);
        assert_eq!(json["data"]["strategy"], "first-fit");
    }

    #[test]
    fn test_release_envelope_names_memory_snapshot() {
        let sim = Simulator::new(100);
        sim.allocate("P1", 20, "first-fit").unwrap();
        let response = Response::from(sim.deallocate("P1"));

        let json: Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();
        assert_eq!(json["data"]["owner_id"], "P1");
        assert_eq!(json["data"]["memory_snapshot"][0], "[0-99] Free");
        assert!(json["data"].get("memory").is_none());
    }

    #[test]
    fn test_failed_envelope_carries_reason() {
        let sim = Simulator::new(100);
        let response = Response::from(sim.allocate("P1", 1000, "first-fit"));
        assert_eq!(response.reason(), Some(FailureReason::NoSuitableBlock));

        let json: Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "no_suitable_block");
        assert_eq!(json["detail"], "No suitable block found for 1000 units");
    }

    #[test]
    fn test_config_failure_omits_reason() {
        let response: Response<()> = Response::failed(&SimError::Config("bad".into()));
        let json = response.to_json().unwrap();
        assert!(!json.contains("reason"));
        assert!(json.contains("\"status\":\"failed\""));
    }

    #[test]
    fn test_envelope_roundtrip() {
        let response = Response::success(vec!["[0-99] Free".to_string()]);
        let json = response.to_json().unwrap();
        let back: Response<Vec<String>> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }
}
