//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy and log browsing handlers
//! - Wire up middleware (tracing, body limit, optional CORS)
//! - Bind server to listener and stop on the shutdown signal
//! - Buffer inbound requests and hand them to the forwarder

use std::error::Error as StdError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use http_body_util::LengthLimitError;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::admin;
use crate::config::ProxyConfig;
use crate::http::forward::{Forwarder, InboundRequest, ProxyError};
use crate::http::response;
use crate::logstore::LogSink;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub log_sink: Arc<LogSink>,
    pub tail_limit: usize,
    pub max_body_bytes: usize,
}

/// HTTP server for the logging proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server writing to the given log sink.
    pub fn new(config: ProxyConfig, log_sink: Arc<LogSink>) -> Result<Self, ProxyError> {
        let forwarder = Arc::new(Forwarder::new(&config, log_sink.clone())?);

        let state = AppState {
            forwarder,
            log_sink,
            tail_limit: config.log_store.tail_limit,
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let router = Router::new()
            .merge(admin::log_routes())
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            );

        if config.cors.enabled {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    ///
    /// Once signalled, the listener stops accepting and open connections get
    /// `shutdown_grace_secs` to finish; whatever is still open after that is
    /// abandoned.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        let mut deadline = shutdown.resubscribe();
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .into_future();

        tokio::select! {
            result = serve => result?,
            _ = async {
                let _ = deadline.recv().await;
                tokio::time::sleep(grace).await;
            } => {
                tracing::warn!(
                    grace_secs = grace.as_secs(),
                    "Connections still open after shutdown grace period, abandoning them"
                );
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Catch-all handler: buffer the request and relay it upstream.
pub(crate) async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let too_large = exceeds_limit(&e);
            tracing::warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                error = %e,
                too_large,
                "Rejected request body"
            );
            return if too_large {
                response::error(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
            } else {
                response::error(StatusCode::BAD_REQUEST, "Failed to read request body")
            };
        }
    };

    let inbound = InboundRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
        client_addr,
    };

    state.forwarder.forward(inbound).await
}

fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogStoreConfig;
    use axum::extract::connect_info::MockConnectInfo;
    use tower::ServiceExt;

    fn server_with_logs(dir: &std::path::Path) -> HttpServer {
        let mut config = ProxyConfig::default();
        config.upstream.target = "http://127.0.0.1:9".into();
        config.limits.max_body_bytes = 16;
        config.log_store = LogStoreConfig {
            directory: dir.to_string_lossy().to_string(),
            ..LogStoreConfig::default()
        };
        let sink = Arc::new(LogSink::new(&config.log_store));
        HttpServer::new(config, sink).unwrap()
    }

    fn app(server: &HttpServer) -> Router {
        server
            .router()
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))))
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_before_forwarding() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with_logs(dir.path());

        let response = app(&server)
            .oneshot(
                Request::post("/upload")
                    .header("content-type", "application/octet-stream")
                    .body(Body::from(vec![0u8; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let sink = LogSink::new(&server.config().log_store);
        assert!(sink.list_files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn log_listing_is_served_locally() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_with_logs(dir.path());

        let response = app(&server)
            .oneshot(Request::get("/proxy-logs").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["logs"], serde_json::json!([]));
        assert!(json["currentLog"].as_str().unwrap().starts_with("proxy-"));
    }

    #[tokio::test]
    async fn shutdown_does_not_wait_for_stalled_upload() {
        use tokio::io::AsyncWriteExt;

        let dir = tempfile::tempdir().unwrap();
        let server = server_with_logs(dir.path());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(server.run(listener, rx));

        let mut stalled = tokio::net::TcpStream::connect(addr).await.unwrap();
        stalled
            .write_all(b"POST /x HTTP/1.1\r\nHost: proxy\r\nContent-Length: 10\r\n\r\nabc")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        tx.send(()).unwrap();

        let stopped = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(stopped.is_ok(), "server still running after shutdown");
        assert!(stopped.unwrap().unwrap().is_ok());
        drop(stalled);
    }
}
