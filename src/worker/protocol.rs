//! Messages exchanged with an isolated worker
//!
//! Both directions are single-line JSON documents:
//!
//! ```json
//! {"task":"scripts","options":{"items":{"app.js":"src/app.js"}}}
//! {"status":"done","result":123}
//! {"status":"failed","message":"processing `app.js` failed: syntax error"}
//! ```

use crate::error::{Result, WorkerError};
use crate::options::Options;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parent → worker: which task to run and with what options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRequest {
    /// Task name the worker is bound to
    pub task: String,
    /// Resolved options, `multithread` already off
    pub options: Options,
}

/// Worker → parent: the single completion message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerResponse {
    /// The pass completed
    Done {
        /// Aggregated task result
        result: Value,
    },
    /// The pass failed
    Failed {
        /// Rendered error
        message: String,
    },
}

impl WorkerResponse {
    /// Wrap a task outcome for sending back to the parent
    pub fn from_result(result: Result<Value>) -> Self {
        match result {
            Ok(result) => WorkerResponse::Done { result },
            Err(e) => WorkerResponse::Failed {
                message: e.to_string(),
            },
        }
    }

    /// Turn a received reply into the task outcome
    pub fn into_result(self, task: &str) -> Result<Value> {
        match self {
            WorkerResponse::Done { result } => Ok(result),
            WorkerResponse::Failed { message } => Err(WorkerError::Failed {
                task: task.to_string(),
                message,
            }
            .into()),
        }
    }

    /// Encode as one line of JSON, without the trailing newline
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({
                "status": "failed",
                "message": format!("unencodable worker result: {}", e),
            })
            .to_string()
        })
    }
}

/// Encode a request as one line of JSON, without the trailing newline
pub fn encode_request(request: &WorkerRequest) -> Result<String> {
    Ok(serde_json::to_string(request)?)
}

/// Parse a request line
pub fn decode_request(line: &str) -> Result<WorkerRequest> {
    serde_json::from_str(line.trim())
        .map_err(|e| WorkerError::Protocol(format!("bad request: {}", e)).into())
}

/// Parse a response line
pub fn decode_response(line: &str) -> Result<WorkerResponse> {
    serde_json::from_str(line.trim())
        .map_err(|e| WorkerError::Protocol(format!("bad response: {}", e)).into())
}
