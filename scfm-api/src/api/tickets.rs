//! Support ticket endpoints shared by artists and admins

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use scfm_common::models::Ticket;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::CurrentUser;
use crate::services::tickets::{self, NewTicket};
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub message: String,
}

/// GET /api/tickets
pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Ticket>>> {
    Ok(Json(tickets::list_tickets(&state, &user).await?))
}

/// POST /api/tickets
pub async fn create_ticket(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<NewTicket>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    let Json(input) = payload?;
    let ticket = tickets::create_ticket(&state, &user, input).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /api/tickets/:id
pub async fn get_ticket(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Ticket>> {
    Ok(Json(tickets::get_ticket(&state, &user, id).await?))
}

/// POST /api/tickets/:id/replies
pub async fn reply(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<ReplyRequest>, JsonRejection>,
) -> ApiResult<Json<Ticket>> {
    let Json(input) = payload?;
    Ok(Json(tickets::reply(&state, &user, id, &input.message).await?))
}

/// POST /api/tickets/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Ticket>> {
    Ok(Json(tickets::mark_read(&state, &user, id).await?))
}
