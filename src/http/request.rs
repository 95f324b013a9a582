//! Request identification and outbound header preparation.
//!
//! # Responsibilities
//! - Generate a correlation id per inbound request
//! - Decide which inbound headers are copied to the upstream request
//!
//! # Design Decisions
//! - Ids combine a millisecond timestamp with a random base36 suffix;
//!   collisions only make log correlation ambiguous, nothing is keyed on them
//! - The inbound Host is dropped; the client derives it from each URL it
//!   sends to, redirect targets included
//! - Message framing is recomputed by the outbound client

use std::net::IpAddr;

use axum::http::header::{
    ACCEPT_ENCODING, CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use chrono::Utc;
use rand::Rng;

const ID_SUFFIX_LEN: usize = 9;

/// Correlation id shared by the log records of one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new id of the form `req-<unix millis>-<9 base36 chars>`.
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let mut rng = rand::thread_rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .filter_map(|_| char::from_digit(rng.gen_range(0..36), 36))
            .collect();
        Self(format!("req-{}-{}", millis, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inbound headers that are not copied verbatim to the upstream.
fn is_replaced_on_forward(name: &HeaderName) -> bool {
    name == HOST
        || name == CONTENT_LENGTH
        || name == TRANSFER_ENCODING
        || name == CONNECTION
        || name == ACCEPT_ENCODING
}

/// Names of the headers the proxy adds to every upstream request.
#[derive(Debug, Clone)]
pub struct ForwardingHeaders {
    pub forwarded_for: HeaderName,
    pub request_id: HeaderName,
}

impl ForwardingHeaders {
    /// Build the upstream header map for one request.
    ///
    /// The client address is appended to any existing forwarded-for chain.
    pub fn apply(&self, inbound: &HeaderMap, client_ip: IpAddr, request_id: &RequestId) -> HeaderMap {
        let mut out = HeaderMap::with_capacity(inbound.len() + 2);
        for (name, value) in inbound {
            if is_replaced_on_forward(name) || name == self.forwarded_for || name == self.request_id {
                continue;
            }
            out.append(name.clone(), value.clone());
        }

        let prior: Vec<&str> = inbound
            .get_all(&self.forwarded_for)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();
        let client_ip = client_ip.to_string();
        let chain = if prior.is_empty() {
            client_ip
        } else {
            format!("{}, {}", prior.join(", "), client_ip)
        };
        if let Ok(value) = HeaderValue::from_str(&chain) {
            out.insert(self.forwarded_for.clone(), value);
        }

        if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
            out.insert(self.request_id.clone(), value);
        }

        out
    }
}
