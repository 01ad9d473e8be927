use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Predict,
    Explain,
}

impl Operation {
    /// Message used when the service does not provide one.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Operation::Predict => "Prediction failed",
            Operation::Explain => "Explanation failed",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Operation::Predict => "/api/predict",
            Operation::Explain => "/api/explain",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Predict => write!(f, "predict"),
            Operation::Explain => write!(f, "explain"),
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingFlags {
    pub predict: bool,
    pub explain: bool,
}

impl LoadingFlags {
    pub fn get(&self, op: Operation) -> bool {
        match op {
            Operation::Predict => self.predict,
            Operation::Explain => self.explain,
        }
    }

    pub fn set(&mut self, op: Operation, value: bool) {
        match op {
            Operation::Predict => self.predict = value,
            Operation::Explain => self.explain = value,
        }
    }
}

/// The most recent failure, tagged with the operation that produced it.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    pub operation: Operation,
    pub message: String,
}

/// Body of `GET /heartbeat`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}
