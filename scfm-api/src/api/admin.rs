//! Admin console endpoints, mounted behind `require_admin`

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use scfm_common::models::{Release, Ticket, TicketStatus, User};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::CurrentUser;
use crate::services::accounts::{self, UpdateUserRequest};
use crate::services::review::{self, Decision};
use crate::services::tickets;
use crate::{ApiError, ApiResult, AppState};

/// Approve/reject body; both fields optional, an empty body is allowed
#[derive(Debug, Default, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub version: Option<i64>,
}

impl DecisionRequest {
    /// Parse a decision body regardless of Content-Type; only an empty body means "no fields"
    pub fn from_body(body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid decision body: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
pub struct FinancialsRequest {
    pub streams: u64,
    pub revenue: f64,
    #[serde(default)]
    pub version: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TicketStatusRequest {
    pub status: TicketStatus,
}

/// GET /api/admin/releases
pub async fn list_releases(State(state): State<AppState>) -> ApiResult<Json<Vec<Release>>> {
    Ok(Json(review::list_all(&state).await?))
}

/// POST /api/admin/releases/:id/approve
pub async fn approve_release(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Json<Release>> {
    let request = DecisionRequest::from_body(&body)?;
    let release =
        review::decide(&state, &admin, id, Decision::Approve, request.note, request.version)
            .await?;
    Ok(Json(release))
}

/// POST /api/admin/releases/:id/reject
pub async fn reject_release(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Json<Release>> {
    let request = DecisionRequest::from_body(&body)?;
    let release =
        review::decide(&state, &admin, id, Decision::Reject, request.note, request.version)
            .await?;
    Ok(Json(release))
}

/// PUT /api/admin/releases/:id/financials
pub async fn update_financials(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<FinancialsRequest>, JsonRejection>,
) -> ApiResult<Json<Release>> {
    let Json(request) = payload?;
    let release =
        review::update_financials(&state, id, request.streams, request.revenue, request.version)
            .await?;
    Ok(Json(release))
}

/// GET /api/admin/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(accounts::list_users(&state).await?))
}

/// PUT /api/admin/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Json(changes) = payload?;
    Ok(Json(accounts::update_user(&state, &admin, id, changes).await?))
}

/// POST /api/admin/users/:id/ban
pub async fn ban_user(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(accounts::ban_user(&state, &admin, id).await?))
}

/// GET /api/admin/tickets
pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Ticket>>> {
    Ok(Json(tickets::list_tickets(&state, &admin).await?))
}

/// PUT /api/admin/tickets/:id/status
pub async fn set_ticket_status(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<TicketStatusRequest>, JsonRejection>,
) -> ApiResult<Json<Ticket>> {
    let Json(request) = payload?;
    Ok(Json(tickets::set_status(&state, &admin, id, request.status).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_decision_body_uses_defaults() {
        for body in [&b""[..], &b"  \n"[..]] {
            let request = DecisionRequest::from_body(body).unwrap();
            assert!(request.note.is_none());
            assert!(request.version.is_none());
        }
    }

    #[test]
    fn test_decision_body_read_without_content_type() {
        let request = DecisionRequest::from_body(br#"{"note":"Great mix","version":3}"#).unwrap();
        assert_eq!(request.note.as_deref(), Some("Great mix"));
        assert_eq!(request.version, Some(3));
    }

    #[test]
    fn test_malformed_decision_body_is_rejected() {
        assert!(matches!(
            DecisionRequest::from_body(b"{\"version\": \"three\"}"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            DecisionRequest::from_body(b"not json"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
