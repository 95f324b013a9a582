//! Log browsing request handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::response;
use crate::http::server::AppState;
use crate::logstore::LogStoreError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogListing {
    pub logs: Vec<String>,
    pub current_log: String,
}

pub async fn list_logs(State(state): State<AppState>) -> Response {
    match state.log_sink.list_files().await {
        Ok(logs) => Json(LogListing {
            logs,
            current_log: state.log_sink.current_file_name(),
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list log files");
            response::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list log files")
        }
    }
}

pub async fn get_log(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    match state.log_sink.read_tail(&filename, state.tail_limit).await {
        Ok(tail) => Json(tail).into_response(),
        Err(LogStoreError::NotFound(_)) => {
            response::error(StatusCode::NOT_FOUND, "Log file not found")
        }
        Err(e) => {
            tracing::error!(filename = %filename, error = %e, "Failed to read log file");
            response::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read log file")
        }
    }
}
