//! Session authentication
//!
//! Clients send `Authorization: Bearer <token>`. EventSource cannot set
//! headers, so `GET /api/events` also accepts an `access_token` query
//! parameter. No other route does.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use scfm_common::models::User;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::services::accounts::{self, RegisterRequest};
use crate::{ApiError, ApiResult, AppState};

/// The only route that reads the token from the query string
pub const EVENTS_PATH: &str = "/api/events";

/// The authenticated caller, inserted by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The bearer token of the current request
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

/// Resolve the session and attach the caller to the request
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(&request)
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;
    let user = accounts::authenticate(&state, &token).await?;
    debug!(user_id = %user.id, path = %request.uri().path(), "Authenticated request");

    request.extensions_mut().insert(CurrentUser(user));
    request.extensions_mut().insert(SessionToken(token));
    Ok(next.run(request).await)
}

/// Reject callers without the admin role; runs inside [`auth_middleware`]
pub async fn require_admin(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());
    if let Some(token) = from_header.filter(|t| !t.is_empty()) {
        return Some(token);
    }
    if request.uri().path() != EVENTS_PATH {
        return None;
    }

    request
        .uri()
        .query()
        .unwrap_or("")
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "access_token")
        .map(|(_, value)| value.to_string())
        .filter(|t| !t.is_empty())
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(input) = payload?;
    let (user, token) = accounts::register(&state, input).await?;
    Ok((StatusCode::CREATED, Json(SessionResponse { token, user })).into_response())
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<SessionResponse>> {
    let Json(input) = payload?;
    let (user, token) = accounts::login(&state, &input.email, &input.password).await?;
    Ok(Json(SessionResponse { token, user }))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> ApiResult<StatusCode> {
    accounts::logout(&state, &token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/me
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(uri: &str, bearer: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_header_token_on_any_route() {
        assert_eq!(bearer_token(&request("/api/me", Some("abc"))).as_deref(), Some("abc"));
        assert_eq!(
            bearer_token(&request("/api/events?access_token=q", Some("abc"))).as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_query_token_only_for_event_stream() {
        assert_eq!(
            bearer_token(&request("/api/events?access_token=abc", None)).as_deref(),
            Some("abc")
        );
        assert_eq!(bearer_token(&request("/api/me?access_token=abc", None)), None);
        assert_eq!(bearer_token(&request("/api/releases?access_token=abc", None)), None);
        assert_eq!(bearer_token(&request("/api/events?access_token=", None)), None);
    }
}
