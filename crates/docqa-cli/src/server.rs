//! HTTP API over one shared document session

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use docqa_core::{Error, Result};
use docqa_extract::extension_of;
use docqa_rag::{RetrievalPipeline, Session};
use docqa_review::write_report;

use crate::review::review_bytes;

const DEFAULT_UPLOAD_NAME: &str = "upload.txt";
const FILENAME_HEADER: &str = "x-filename";

/// Shared state behind every route
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<RetrievalPipeline>,
    session: Arc<RwLock<Session>>,
}

impl AppState {
    pub fn new(pipeline: Arc<RetrievalPipeline>, session: Session) -> Self {
        Self {
            pipeline,
            session: Arc::new(RwLock::new(session)),
        }
    }
}

#[derive(Deserialize)]
struct UploadParams {
    filename: Option<String>,
}

#[derive(Deserialize)]
struct QueryRequest {
    question: String,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio: Option<String>,
}

/// Build the router with permissive CORS
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_check))
        .route("/upload", post(upload_handler))
        .route("/query", post(query_handler))
        .route("/review", post(review_handler))
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP server listening");
    axum::serve(listener, router(state))
        .await
        .map_err(|e| Error::Network(format!("server stopped: {}", e)))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn upload_handler(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let name = upload_name(params.filename, &headers);
    let Some(extension) = extension_of(Path::new(&name)) else {
        return status_error(
            StatusCode::BAD_REQUEST,
            format!("Could not determine file extension for '{}'.", name),
        );
    };

    let mut session = state.session.write().await;
    match state
        .pipeline
        .ingest_bytes(&mut *session, &name, body.to_vec(), &extension)
        .await
    {
        Ok(report) => {
            info!(file = %name, chunks = report.chunks_indexed, "upload indexed");
            Json(json!({ "status": "success", "chunks": report.chunks_indexed })).into_response()
        }
        Err(e) => {
            warn!(file = %name, error = %e, "upload failed");
            let status = if e.is_user_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            status_error(status, e.to_string())
        }
    }
}

async fn query_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "malformed query body");
            return (
                StatusCode::BAD_REQUEST,
                Json(QueryResponse {
                    answer: format!("Invalid query body: {}", rejection.body_text()),
                    audio: None,
                }),
            )
                .into_response();
        }
    };

    let session = state.session.read().await;
    match state.pipeline.answer(&*session, &request.question).await {
        Ok(answer) => Json(QueryResponse {
            answer: answer.text,
            audio: answer.audio.map(|p| p.display().to_string()),
        })
        .into_response(),
        Err(e) => {
            let status = match e {
                Error::EmptyQuestion => StatusCode::BAD_REQUEST,
                Error::NotReady => StatusCode::CONFLICT,
                Error::NoContext => StatusCode::NOT_FOUND,
                _ => {
                    error!(error = %e, "query failed");
                    StatusCode::BAD_GATEWAY
                }
            };
            (
                status,
                Json(QueryResponse {
                    answer: e.to_string(),
                    audio: None,
                }),
            )
                .into_response()
        }
    }
}

async fn review_handler(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let name = upload_name(params.filename, &headers);
    let Some(extension) = extension_of(Path::new(&name)) else {
        return status_error(
            StatusCode::BAD_REQUEST,
            format!("Could not determine file extension for '{}'.", name),
        );
    };

    let extractor = state.pipeline.extractor().clone();
    let reviewed =
        tokio::task::spawn_blocking(move || review_bytes(extractor.as_ref(), &body, &extension))
            .await
            .map_err(|e| Error::Extraction(format!("review task failed: {}", e)))
            .and_then(|result| result);

    let records = match reviewed {
        Ok(records) => records,
        Err(e) => {
            warn!(file = %name, error = %e, "review failed");
            return status_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
        }
    };

    let mut csv = Vec::new();
    if let Err(e) = write_report(&records, &mut csv) {
        return status_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
    }

    info!(file = %name, flagged = records.len(), "review report generated");
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"review_report.csv\"",
            ),
        ],
        csv,
    )
        .into_response()
}

/// File name from the `filename` query parameter, then the header
fn upload_name(query: Option<String>, headers: &HeaderMap) -> String {
    query
        .or_else(|| {
            headers
                .get(FILENAME_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string())
}

fn status_error(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_upload_name_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(upload_name(None, &headers), "upload.txt");

        headers.insert(FILENAME_HEADER, HeaderValue::from_static("handbook.pdf"));
        assert_eq!(upload_name(None, &headers), "handbook.pdf");
        assert_eq!(
            upload_name(Some("policy.docx".to_string()), &headers),
            "policy.docx"
        );
        assert_eq!(upload_name(Some("  ".to_string()), &HeaderMap::new()), "upload.txt");
    }
}
