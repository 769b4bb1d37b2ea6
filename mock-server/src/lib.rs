use axum::{
    body::Bytes,
    extract::{Path, RawQuery},
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    routing::any,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub user_agent: Option<String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let header_value = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    tracing::debug!(%method, bytes = body.len(), "echo");
    Json(Echo {
        method: method.to_string(),
        query,
        content_type: header_value(header::CONTENT_TYPE),
        user_agent: header_value(header::USER_AGENT),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn status(Path(code): Path<u16>) -> (StatusCode, String) {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, status.canonical_reason().unwrap_or_default().to_string()),
        Err(_) => (StatusCode::BAD_REQUEST, format!("invalid status {code}")),
    }
}
