//! Relay of one inbound request to the upstream origin.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → Incoming record (logged before any network I/O)
//!     → outbound request: target + path, raw query, rewritten headers, raw body
//!     → upstream response (any status) → Outgoing record → relay
//!     → transport failure → Error record → 500 with diagnostics
//! ```
//!
//! # Design Decisions
//! - A single attempt per request; no retries
//! - Every upstream status code is data, only transport failures are errors
//! - The query string is attached verbatim so it is never re-encoded

use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use bytes::BytesMut;
use axum::http::{header::CONTENT_TYPE, HeaderMap, HeaderName, Method, StatusCode};
use axum::response::Response;
use thiserror::Error;
use url::Url;

use crate::config::ProxyConfig;
use crate::http::request::{ForwardingHeaders, RequestId};
use crate::http::response;
use crate::logstore::payload::{capture_body, headers_to_map, query_to_map};
use crate::logstore::{Direction, LogRecord, LogSink};
use crate::observability::metrics;

/// Errors raised while building the forwarder or relaying a request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid upstream URL '{url}': {source}")]
    InvalidTarget {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid header configuration: {0}")]
    InvalidHeader(String),

    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to read upstream response body: {source}")]
    BodyRead {
        status: StatusCode,
        headers: HeaderMap,
        /// Bytes received before the failure.
        partial: Bytes,
        #[source]
        source: reqwest::Error,
    },
}

impl ProxyError {
    /// Short failure class recorded in the error log record.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidTarget { .. } => "invalid_target",
            ProxyError::InvalidHeader(_) | ProxyError::Client(_) => "setup",
            ProxyError::Transport(e) => classify(e),
            ProxyError::BodyRead { source, .. } if source.is_timeout() => "timeout",
            ProxyError::BodyRead { .. } => "body",
        }
    }

    /// Upstream status received before the failure, if any.
    pub fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            ProxyError::BodyRead { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Upstream headers and body bytes received before the failure, if any.
    pub fn partial_response(&self) -> Option<(&HeaderMap, &Bytes)> {
        match self {
            ProxyError::BodyRead { headers, partial, .. } => Some((headers, partial)),
            _ => None,
        }
    }

    /// The error and all of its sources, joined with `": "`.
    pub fn message(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }
}

fn classify(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_redirect() {
        "redirect"
    } else if e.is_body() || e.is_decode() {
        "body"
    } else {
        "request"
    }
}

/// An inbound request, fully buffered.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Path as received, still percent-encoded.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub client_addr: SocketAddr,
}

struct UpstreamResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

/// Relays requests to the single configured upstream and logs each exchange.
pub struct Forwarder {
    client: reqwest::Client,
    base: String,
    forwarding: ForwardingHeaders,
    sink: Arc<LogSink>,
    max_logged_body: usize,
}

impl Forwarder {
    /// Build a forwarder for the configured upstream.
    pub fn new(config: &ProxyConfig, sink: Arc<LogSink>) -> Result<Self, ProxyError> {
        let target = config.upstream.target.trim_end_matches('/');
        let url = Url::parse(target).map_err(|source| ProxyError::InvalidTarget {
            url: target.to_string(),
            source,
        })?;
        if url.host_str().is_none() {
            return Err(ProxyError::InvalidTarget {
                url: target.to_string(),
                source: url::ParseError::EmptyHost,
            });
        }

        let forwarding = ForwardingHeaders {
            forwarded_for: header_name(&config.upstream.forwarded_header)?,
            request_id: header_name(&config.upstream.request_id_header)?,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.upstream_secs))
            .redirect(reqwest::redirect::Policy::limited(config.upstream.max_redirects))
            .build()
            .map_err(ProxyError::Client)?;

        Ok(Self {
            client,
            base: target.to_string(),
            forwarding,
            sink,
            max_logged_body: config.log_store.max_logged_body_bytes,
        })
    }

    /// Upstream URL for a request path (without the query string).
    pub fn target_url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Relay one request and produce the caller's response.
    ///
    /// Always writes exactly one incoming record and then exactly one
    /// outgoing or error record, both carrying the same request id.
    pub async fn forward(&self, inbound: InboundRequest) -> Response {
        let start = Instant::now();
        let request_id = RequestId::generate();
        let target_url = self.target_url(&inbound.path);
        let method = inbound.method.to_string();

        tracing::info!(
            request_id = %request_id,
            method = %method,
            path = %inbound.path,
            target = %target_url,
            "Incoming request"
        );

        self.sink.append(
            &LogRecord::new(Direction::Incoming, request_id.as_str())
                .with_request_line(method.as_str(), inbound.path.as_str())
                .with_query(query_to_map(inbound.query.as_deref()))
                .with_headers(headers_to_map(&inbound.headers))
                .with_body(capture_body(
                    content_type(&inbound.headers),
                    &inbound.body,
                    self.max_logged_body,
                ))
                .with_target(target_url.as_str()),
        );

        match self.send(&request_id, &target_url, &inbound).await {
            Ok(upstream) => {
                let duration_ms = elapsed_ms(start);
                tracing::info!(
                    request_id = %request_id,
                    status = upstream.status.as_u16(),
                    duration_ms,
                    bytes = upstream.body.len(),
                    "Outgoing response"
                );

                self.sink.append(
                    &LogRecord::new(Direction::Outgoing, request_id.as_str())
                        .with_request_line(method.as_str(), inbound.path.as_str())
                        .with_target(target_url.as_str())
                        .with_response(upstream.status.as_u16(), upstream.body.len(), duration_ms)
                        .with_headers(headers_to_map(&upstream.headers))
                        .with_body(capture_body(
                            content_type(&upstream.headers),
                            &upstream.body,
                            self.max_logged_body,
                        )),
                );

                metrics::record_request(&method, upstream.status.as_u16(), metrics::OUTCOME_RELAYED, start);
                response::relay(upstream.status, &upstream.headers, upstream.body)
            }
            Err(err) => {
                let duration_ms = elapsed_ms(start);
                let message = err.message();
                tracing::error!(
                    request_id = %request_id,
                    kind = err.kind(),
                    duration_ms,
                    error = %message,
                    "Proxy error"
                );

                let mut record = LogRecord::new(Direction::Error, request_id.as_str())
                    .with_request_line(method.as_str(), inbound.path.as_str())
                    .with_target(target_url.as_str())
                    .with_error(message.as_str(), err.kind(), duration_ms)
                    .with_status(err.upstream_status().map(|s| s.as_u16()));
                if let Some((headers, partial)) = err.partial_response() {
                    record = record.with_headers(headers_to_map(headers));
                    if !partial.is_empty() {
                        record = record.with_body(capture_body(
                            content_type(headers),
                            partial,
                            self.max_logged_body,
                        ));
                    }
                }
                self.sink.append(&record);

                metrics::record_request(
                    &method,
                    StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    metrics::OUTCOME_ERROR,
                    start,
                );
                response::proxy_error(&message, &request_id, &target_url)
            }
        }
    }

    async fn send(
        &self,
        request_id: &RequestId,
        target_url: &str,
        inbound: &InboundRequest,
    ) -> Result<UpstreamResponse, ProxyError> {
        let mut url = Url::parse(target_url).map_err(|source| ProxyError::InvalidTarget {
            url: target_url.to_string(),
            source,
        })?;
        url.set_query(inbound.query.as_deref());

        let headers = self
            .forwarding
            .apply(&inbound.headers, inbound.client_addr.ip(), request_id);

        let mut request = self
            .client
            .request(inbound.method.clone(), url)
            .headers(headers);
        if !inbound.body.is_empty() {
            request = request.body(inbound.body.clone());
        }

        let mut response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        let mut body = BytesMut::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(source) => {
                    return Err(ProxyError::BodyRead {
                        status,
                        headers,
                        partial: body.freeze(),
                        source,
                    })
                }
            }
        }

        Ok(UpstreamResponse {
            status,
            headers,
            body: body.freeze(),
        })
    }
}

fn header_name(name: &str) -> Result<HeaderName, ProxyError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| ProxyError::InvalidHeader(format!("'{}': {}", name, e)))
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
