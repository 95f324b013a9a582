//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay the upstream status, headers and body to the caller
//! - Strip headers that describe the upstream hop's encoding and framing
//! - Build the JSON error bodies the proxy answers with itself
//!
//! # Design Decisions
//! - Upstream status codes are relayed verbatim, 4xx/5xx included
//! - The body is relayed as the raw bytes received
//! - Content-Length is recomputed from the relayed body

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::request::RequestId;

/// Headers never copied from the upstream response.
pub const HOP_BY_HOP: [HeaderName; 4] = [
    header::CONTENT_ENCODING,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
    header::CONTENT_LENGTH,
];

/// Build the caller's response from an upstream response.
pub fn relay(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let out = response.headers_mut();
    for (name, value) in headers {
        if !HOP_BY_HOP.contains(name) {
            out.append(name.clone(), value.clone());
        }
    }

    response
}

/// Body of the 500 answered on a transport failure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyErrorBody<'a> {
    pub error: &'static str,
    pub message: &'a str,
    pub request_id: &'a str,
    pub target_url: &'a str,
}

/// Answer a request whose upstream exchange failed.
pub fn proxy_error(message: &str, request_id: &RequestId, target_url: &str) -> Response {
    let body = ProxyErrorBody {
        error: "Proxy Error",
        message,
        request_id: request_id.as_str(),
        target_url,
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// Plain `{"error": ...}` body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

/// JSON error response with the given status.
pub fn error(status: StatusCode, message: &'static str) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn relay_keeps_status_and_end_to_end_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("999"));
        headers.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));

        let response = relay(StatusCode::IM_A_TEAPOT, &headers, Bytes::from_static(b"short"));

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        let out = response.headers();
        assert_eq!(out[header::CONTENT_TYPE], "text/plain");
        assert_eq!(out.get_all(header::SET_COOKIE).iter().count(), 2);
        for name in HOP_BY_HOP {
            assert!(out.get(&name).is_none(), "{name} relayed");
        }

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"short");
    }

    #[tokio::test]
    async fn proxy_error_body_shape() {
        let id = RequestId::generate();
        let response = proxy_error("connection refused", &id, "http://127.0.0.1:1/foo");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Proxy Error");
        assert_eq!(json["message"], "connection refused");
        assert_eq!(json["requestId"], id.as_str());
        assert_eq!(json["targetUrl"], "http://127.0.0.1:1/foo");
    }

    #[tokio::test]
    async fn error_body_shape() {
        let response = error(StatusCode::NOT_FOUND, "Log file not found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, serde_json::json!({"error": "Log file not found"}));
    }
}
