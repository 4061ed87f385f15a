use std::net::SocketAddr;
use std::sync::Arc;

use aldb_store::DirectoryError;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, HandlerState};
use crate::presenter::{NavView, NavigationPresenter};
use crate::rpc::{RpcRequest, RpcResponse};

/// Server configuration.
pub struct ServerConfig {
    pub host: String,
    /// 0 picks a free port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub handler_state: Arc<HandlerState>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/activities", get(main_activity_handler))
        .route("/nav", get(nav_handler))
        .route("/rpc", post(rpc_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and start serving. Returns once the listener is up.
pub async fn start(
    config: ServerConfig,
    presenter: Arc<NavigationPresenter>,
) -> Result<ServerHandle, std::io::Error> {
    let state = AppState {
        handler_state: Arc::new(HandlerState::new(presenter)),
    };
    let router = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(addr = %local_addr, "aldb server started");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(e) = result {
            tracing::error!(error = %e, "server stopped with error");
        }
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        addr: local_addr,
        shutdown: Some(shutdown_tx),
        server,
    })
}

/// Handle returned by `start()`. Dropping it leaves the server running.
pub struct ServerHandle {
    pub port: u16,
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.server.await {
            tracing::warn!(error = %e, "server task ended abnormally");
        }
        tracing::info!("aldb server stopped");
    }
}

pub fn status_for(e: &DirectoryError) -> StatusCode {
    match e {
        DirectoryError::NotFound(_) => StatusCode::NOT_FOUND,
        DirectoryError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        DirectoryError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn error_body(e: &DirectoryError) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "error": { "code": e.code(), "message": e.to_string() }
    }))
}

/// Health check HTTP endpoint.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let resp = handlers::dispatch(
        &state.handler_state,
        "health",
        &serde_json::json!({}),
        None,
    )
    .await;

    let status = resp
        .result
        .as_ref()
        .and_then(|r| r.get("status"))
        .and_then(|s| s.as_str())
        .unwrap_or("unknown");

    let http_status = if status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (http_status, Json(resp.result.unwrap_or_default()))
}

/// The main activity as plain JSON.
async fn main_activity_handler(State(state): State<AppState>) -> axum::response::Response {
    match state.handler_state.presenter.root_activity().await {
        Ok(activity) => Json(activity.as_ref().clone()).into_response(),
        Err(e) => (status_for(&e), error_body(&e)).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct NavQuery {
    locale: Option<String>,
    depth: Option<usize>,
}

async fn nav_handler(
    State(state): State<AppState>,
    Query(query): Query<NavQuery>,
) -> impl IntoResponse {
    let presenter = &state.handler_state.presenter;
    match presenter.nav_tree(query.locale.as_deref(), query.depth).await {
        Ok(tree) => (StatusCode::OK, Json(NavView::Ready { tree })),
        Err(e) => (status_for(&e), Json(NavView::from(&e))),
    }
}

async fn rpc_handler(State(state): State<AppState>, body: String) -> Json<RpcResponse> {
    let request: RpcRequest = match serde_json::from_str(&body) {
        Ok(req) => req,
        Err(_) => return Json(RpcResponse::parse_error()),
    };

    let params = request.params.unwrap_or(serde_json::json!({}));
    Json(handlers::dispatch(&state.handler_state, &request.method, &params, request.id).await)
}
