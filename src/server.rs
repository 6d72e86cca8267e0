use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cycle::{authorize, Pipeline};

pub struct AppState {
    pipeline: Pipeline,
    // Held for the duration of a cycle; at most one runs per process.
    running: Mutex<()>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        AppState {
            pipeline,
            running: Mutex::new(()),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/cron/company-digest", get(company_digest))
        .with_state(state)
}

pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<()> {
    info!("Digest trigger listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn company_digest(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if !authorize(auth, state.pipeline.cfg.cron_secret.as_deref()) {
        warn!("Unauthorized digest trigger");
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response();
    }

    let Ok(_guard) = state.running.try_lock() else {
        warn!("Digest trigger ignored: a cycle is already running");
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "A digest cycle is already running" })),
        )
            .into_response();
    };

    let report = state.pipeline.run_cycle(false).await;
    let status = if report.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(report)).into_response()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::SqliteStore;
    use crate::http::testing::FakeFetcher;
    use crate::notify::LogNotifier;

    fn state(secret: Option<&str>, dir: &tempfile::TempDir) -> Arc<AppState> {
        let mut cfg = Config::for_tests();
        cfg.cron_secret = secret.map(str::to_string);
        let store = SqliteStore::open(&dir.path().join("r.sqlite")).unwrap();
        Arc::new(AppState::new(Pipeline {
            cfg,
            fetcher: Arc::new(FakeFetcher::new()),
            store: Arc::new(store),
            notifier: Arc::new(LogNotifier),
        }))
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        h
    }

    #[tokio::test]
    async fn rejects_wrong_secret() {
        let dir = tempfile::tempdir().unwrap();
        let resp = company_digest(State(state(Some("s3cret"), &dir)), bearer("nope")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let resp = company_digest(State(state(Some("s3cret"), &dir)), HeaderMap::new()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn runs_with_right_secret() {
        let dir = tempfile::tempdir().unwrap();
        let resp = company_digest(State(state(Some("s3cret"), &dir)), bearer("s3cret")).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn second_trigger_while_running_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(None, &dir);
        let _held = st.running.try_lock().unwrap();
        let resp = company_digest(State(st.clone()), HeaderMap::new()).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
