use axum::{
    extract::{Multipart, Query, RawQuery},
    http::{
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cookie::Cookie;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use uuid::Uuid;

/// Cookie handed out by `/session`.
pub const SESSION_COOKIE: &str = "woot";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GreetingIn {
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GreetingOut {
    pub message: String,
}

#[derive(Deserialize)]
pub struct EchoParams {
    #[serde(default)]
    pub q: String,
}

/// One part of a multipart upload as the server saw it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedPart {
    pub name: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

pub fn app() -> Router {
    Router::new()
        .route("/greeting", post(greeting))
        .route("/echo", get(echo))
        .route("/query", get(raw_query))
        .route("/session", get(session).delete(end_session))
        .route("/whoami", get(whoami))
        .route("/upload", post(upload))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn greeting(Json(input): Json<GreetingIn>) -> Json<GreetingOut> {
    Json(GreetingOut {
        message: format!("Hello {}", input.name),
    })
}

async fn echo(Query(params): Query<EchoParams>) -> String {
    params.q
}

async fn raw_query(RawQuery(query): RawQuery) -> String {
    query.unwrap_or_default()
}

/// Hands out a session cookie on first contact, then echoes it back.
async fn session(headers: HeaderMap) -> Response {
    match request_cookie(&headers, SESSION_COOKIE) {
        Some(value) => value.into_response(),
        None => {
            let value = Uuid::new_v4();
            tracing::debug!(%value, "new session");
            (
                StatusCode::OK,
                [(SET_COOKIE, format!("{SESSION_COOKIE}={value}; Path=/"))],
            )
                .into_response()
        }
    }
}

async fn end_session() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, format!("{SESSION_COOKIE}=; Path=/; Max-Age=0"))],
    )
}

async fn whoami(headers: HeaderMap) -> Result<String, StatusCode> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or(StatusCode::UNAUTHORIZED)
}

async fn upload(mut multipart: Multipart) -> Result<Json<Vec<UploadedPart>>, StatusCode> {
    let mut parts = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        parts.push(UploadedPart {
            name,
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }
    Ok(Json(parts))
}

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn request_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}
