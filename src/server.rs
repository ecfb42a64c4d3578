//!
//! datashelf HTTP server
//! ---------------------
//! This module defines the Axum-based HTTP surface over the browsing core.
//! It is a thin boundary: handlers translate the query surface into core
//! calls and map `AppError` onto stable status codes and a JSON envelope.
//!
//! Responsibilities:
//! - Path addressing (`/files/{*path}`) and identifier addressing (`/id/{id}`).
//! - Query surface: `view=meta` (default), `view=headers`, `cols=i,j,k`,
//!   `include_children`, `action=download`.
//! - Identifier decode failures answered as not-found, never as 5xx.
//! - Startup inventory logs and storage-root bootstrap.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use anyhow::Context;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::codec::PathCodec;
use crate::error::{AppError, AppResult};
use crate::shelf::Shelf;
use crate::tabular;

/// Shared server state injected into all handlers: just the read-only
/// `Shelf` handle. The codec key lives inside it and never changes after
/// startup.
#[derive(Clone)]
pub struct AppState {
    pub shelf: Arc<Shelf>,
}

#[derive(Debug, Default, Deserialize)]
struct BrowseParams {
    view: Option<String>,
    include_children: Option<String>,
    action: Option<String>,
    cols: Option<String>,
}

fn parse_bool_param(v: Option<&str>) -> bool {
    match v.map(|s| s.to_lowercase()) {
        Some(s) => matches!(s.as_str(), "1" | "true" | "yes" | "on"),
        None => false,
    }
}

fn parse_cols(spec: &str) -> AppResult<Vec<usize>> {
    let mut out = Vec::new();
    for tok in spec.split(',') {
        let tok = tok.trim();
        if tok.is_empty() {
            continue;
        }
        match tok.parse::<usize>() {
            Ok(i) => out.push(i),
            Err(_) => {
                return Err(AppError::user(
                    "bad_cols",
                    "cols must be a comma-separated list of integers",
                ))
            }
        }
    }
    Ok(out)
}

fn error_response(e: &AppError) -> Response {
    let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({ "status": "error", "code": e.code_str(), "message": e.message() })),
    )
        .into_response()
}

fn respond(result: AppResult<Response>) -> Response {
    match result {
        Ok(r) => r,
        Err(e) => error_response(&e),
    }
}

async fn handle_request(state: &AppState, logical: &str, params: &BrowseParams) -> AppResult<Response> {
    // action=download bypasses classification entirely and streams raw bytes.
    if params.action.as_deref() == Some("download") {
        return download(state, logical).await;
    }
    // cols routes straight to the column extractor.
    if let Some(spec) = params.cols.as_deref() {
        let indices = parse_cols(spec)?;
        let (_, full) = state.shelf.locate(logical)?;
        let rows = tabular::extract(&full, indices).await?;
        return Ok(Json(json!({ "status": "ok", "rows": rows })).into_response());
    }
    match params.view.as_deref() {
        Some("headers") => {
            let (_, full) = state.shelf.locate(logical)?;
            let profile = tabular::profile(&full).await?;
            Ok(Json(profile).into_response())
        }
        Some("meta") | None => {
            let include_children = parse_bool_param(params.include_children.as_deref());
            let entry = state.shelf.resolve(logical, include_children).await?;
            Ok(Json(entry).into_response())
        }
        Some(other) => Err(AppError::UserInput {
            code: "unknown_view".into(),
            message: format!("unknown view '{}'", other),
        }),
    }
}

async fn download(state: &AppState, logical: &str) -> AppResult<Response> {
    let (normalized, full) = state.shelf.locate(logical)?;
    let md = tokio::fs::metadata(&full)
        .await
        .map_err(|e| AppError::from_fs(&e, &normalized))?;
    if md.is_dir() {
        return Err(AppError::user("not_a_file", "cannot download a directory"));
    }
    let bytes = tokio::fs::read(&full)
        .await
        .map_err(|e| AppError::from_fs(&e, &normalized))?;
    let file_name = normalized.rsplit('/').next().unwrap_or("download");
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    if let Ok(v) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name)) {
        headers.insert(header::CONTENT_DISPOSITION, v);
    }
    Ok((StatusCode::OK, headers, bytes).into_response())
}

async fn browse_root(State(state): State<AppState>, Query(params): Query<BrowseParams>) -> Response {
    respond(handle_request(&state, "", &params).await)
}

async fn browse_path(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<BrowseParams>,
) -> Response {
    respond(handle_request(&state, &path, &params).await)
}

async fn browse_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<BrowseParams>,
) -> Response {
    // A malformed identifier is indistinguishable from an unknown one.
    let logical = match state.shelf.codec().decode(&id) {
        Ok(p) => p,
        Err(e) => {
            debug!("id decode failed: {}", e);
            return error_response(&AppError::not_found("not_found", "no such entry"));
        }
    };
    respond(handle_request(&state, &logical, &params).await)
}

/// Build the full route table over a shelf.
pub fn app(shelf: Arc<Shelf>) -> Router {
    Router::new()
        .route("/files", get(browse_root))
        .route("/files/{*path}", get(browse_path))
        .route("/id/{id}", get(browse_id))
        .with_state(AppState { shelf })
}

fn log_startup_inventory(root: &str) {
    let cwd = std::env::current_dir().ok();
    let root_path = std::path::Path::new(root);
    info!(
        target: "startup",
        "datashelf starting. cwd={:?}, root='{}', root_exists={}",
        cwd, root, root_path.exists()
    );
    let mut files = 0usize;
    let mut dirs = 0usize;
    if let Ok(entries) = std::fs::read_dir(root_path) {
        for ent in entries.flatten() {
            match ent.file_type() {
                Ok(ft) if ft.is_dir() => dirs += 1,
                Ok(_) => files += 1,
                Err(_) => {}
            }
        }
    }
    info!(target: "startup", "root inventory: {} director{}, {} file{} at top level",
        dirs, if dirs == 1 { "y" } else { "ies" }, files, if files == 1 { "" } else { "s" });
}

/// Start the datashelf HTTP server on the given port.
///
/// Ensures the storage root exists, builds the codec from the configured
/// secret (or a random per-process key when none is set), and mounts all
/// routes. The secret is startup configuration, not application state.
pub async fn run_with_port(http_port: u16, root: &str, secret: Option<&str>) -> anyhow::Result<()> {
    log_startup_inventory(root);

    std::fs::create_dir_all(root)
        .with_context(|| format!("Failed to create or access storage root: {}", root))?;

    let codec = match secret {
        Some(s) => PathCodec::new(s.as_bytes()),
        None => {
            let mut key = [0u8; 32];
            getrandom::getrandom(&mut key)
                .map_err(|e| anyhow::anyhow!("drawing random codec key: {}", e))?;
            warn!("no secret configured; identifiers will not survive a restart");
            PathCodec::new(&key)
        }
    };
    let shelf = Arc::new(Shelf::new(root, codec));

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    info!("datashelf listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app(shelf))
        .await
        .context("serving HTTP")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cols_parsing() {
        assert_eq!(parse_cols("2,0").unwrap(), vec![2, 0]);
        assert_eq!(parse_cols(" 1 , 2 ,").unwrap(), vec![1, 2]);
        assert!(parse_cols("1,x").is_err());
        assert!(parse_cols("-1").is_err());
    }

    #[test]
    fn bool_params() {
        assert!(parse_bool_param(Some("true")));
        assert!(parse_bool_param(Some("1")));
        assert!(parse_bool_param(Some("YES")));
        assert!(!parse_bool_param(Some("false")));
        assert!(!parse_bool_param(Some("0")));
        assert!(!parse_bool_param(None));
    }
}
