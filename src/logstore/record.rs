//! Log record model.
//!
//! One [`LogRecord`] is written per line. An incoming record and its
//! outgoing (or error) counterpart share the same `requestId`.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which side of the exchange a record describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The request as received from the caller.
    Incoming,
    /// The upstream response relayed to the caller.
    Outgoing,
    /// A transport failure while talking to the upstream.
    Error,
}

impl Direction {
    fn level(self) -> &'static str {
        match self {
            Direction::Incoming | Direction::Outgoing => "info",
            Direction::Error => "error",
        }
    }

    fn message(self) -> &'static str {
        match self {
            Direction::Incoming => "Incoming Request",
            Direction::Outgoing => "Outgoing Response",
            Direction::Error => "Proxy Error",
        }
    }
}

/// A single line of the proxy log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// RFC3339 timestamp with millisecond precision.
    pub timestamp: String,

    pub level: String,

    pub message: String,

    /// Correlates the incoming record with its outcome.
    pub request_id: String,

    pub direction: Direction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Size in bytes of the upstream response body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_size: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Failure class: timeout, connect, redirect, body or request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl LogRecord {
    /// Create a record stamped with the current time.
    pub fn new(direction: Direction, request_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: direction.level().to_string(),
            message: direction.message().to_string(),
            request_id: request_id.into(),
            direction,
            method: None,
            path: None,
            query: None,
            headers: None,
            body: None,
            target_url: None,
            status_code: None,
            duration_ms: None,
            data_size: None,
            error: None,
            error_kind: None,
        }
    }

    /// Set the request line.
    pub fn with_request_line(mut self, method: impl Into<String>, path: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self.path = Some(path.into());
        self
    }

    /// Set the parsed query string.
    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = Some(query);
        self
    }

    /// Set the header snapshot.
    pub fn with_headers(mut self, headers: Map<String, Value>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Set the rendered body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the upstream URL the request was (or would have been) sent to.
    pub fn with_target(mut self, target_url: impl Into<String>) -> Self {
        self.target_url = Some(target_url.into());
        self
    }

    /// Set response details.
    pub fn with_response(mut self, status: u16, data_size: usize, duration_ms: u64) -> Self {
        self.status_code = Some(status);
        self.data_size = Some(data_size);
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Set failure details.
    pub fn with_error(
        mut self,
        message: impl Into<String>,
        kind: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        self.error = Some(message.into());
        self.error_kind = Some(kind.into());
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Record the upstream status seen before a failure, if any.
    pub fn with_status(mut self, status: Option<u16>) -> Self {
        self.status_code = status;
        self
    }
}
