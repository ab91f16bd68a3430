use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    pub markdown: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetPageResponse {
    pub markdown: String,
    pub title: String,
}

#[derive(Deserialize)]
pub struct AppendPageRequest {
    pub markdown: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AppendPageResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Page>>>;

/// Shared server state: the expected API key and the page store.
///
/// With no API key configured every page route answers 500, matching a
/// misconfigured deployment of the real service.
#[derive(Clone, Default)]
pub struct AppState {
    api_key: Option<Arc<str>>,
    db: Db,
}

impl AppState {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()).map(Arc::from),
            db: Db::default(),
        }
    }

    pub async fn insert_page(&self, id: Uuid, title: &str, markdown: &str) {
        self.db.write().await.insert(
            id,
            Page {
                title: title.to_string(),
                markdown: markdown.to_string(),
            },
        );
    }

    pub async fn page(&self, id: Uuid) -> Option<Page> {
        self.db.read().await.get(&id).cloned()
    }
}

pub fn app(state: AppState) -> Router {
    let pages = Router::new()
        .route("/api/pages/{page_id}", get(get_page))
        .route("/api/pages/{page_id}/append", post(append_page))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(health))
        .route("/api", get(api_info))
        .route("/api/health", get(health))
        .merge(pages)
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock page server listening");
    }
    axum::serve(listener, app(state)).await
}

/// Accept a hyphenated or compact (32 hex digit) UUID in any case and
/// return it in canonical form.
pub fn normalize_page_id(input: &str) -> Option<Uuid> {
    let trimmed = input.trim();
    let hex_only = trimmed.bytes().all(|b| b.is_ascii_hexdigit());
    let canonical = trimmed.len() == 36
        && trimmed
            .char_indices()
            .all(|(i, c)| matches!(i, 8 | 13 | 18 | 23) == (c == '-') && (c == '-' || c.is_ascii_hexdigit()));
    if (trimmed.len() == 32 && hex_only) || canonical {
        Uuid::parse_str(trimmed).ok()
    } else {
        None
    }
}

fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
            details,
        }),
    )
        .into_response()
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(api_key) = state.api_key.as_deref() else {
        warn!("rejecting page request: API key is not configured");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "API key is not configured", None);
    };

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        None => error_response(
            StatusCode::UNAUTHORIZED,
            "Authorization header is missing or invalid",
            None,
        ),
        Some(token) if token != api_key => {
            error_response(StatusCode::UNAUTHORIZED, "Invalid API key", None)
        }
        Some(_) => next.run(request).await,
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn api_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "notion-markdown-api",
        "version": "1.0.0",
        "description": "Notion pages to Markdown converter API",
    }))
}

fn parse_id(raw: &str) -> Result<Uuid, Response> {
    normalize_page_id(raw).ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            "Invalid UUID format. Expected standard UUID or compact UUID",
            None,
        )
    })
}

fn not_found(id: Uuid) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "Page not found",
        Some(format!("no page with id {id}")),
    )
}

async fn get_page(State(state): State<AppState>, Path(page_id): Path<String>) -> Response {
    let id = match parse_id(&page_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.page(id).await {
        Some(page) => Json(GetPageResponse {
            markdown: page.markdown,
            title: page.title,
        })
        .into_response(),
        None => not_found(id),
    }
}

async fn append_page(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    body: Result<Json<AppendPageRequest>, JsonRejection>,
) -> Response {
    let id = match parse_id(&page_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Json(input) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Invalid request body",
                Some(rejection.body_text()),
            )
        }
    };

    let mut pages = state.db.write().await;
    let Some(page) = pages.get_mut(&id) else {
        return not_found(id);
    };
    if !page.markdown.is_empty() && !page.markdown.ends_with('\n') {
        page.markdown.push('\n');
    }
    page.markdown.push_str(&input.markdown);
    debug!(%id, appended = input.markdown.len(), "appended to page");

    Json(AppendPageResponse { success: true }).into_response()
}
