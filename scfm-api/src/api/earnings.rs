//! Payouts, stats and payment details

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use scfm_common::models::PaymentDetails;
use serde::Serialize;

use crate::api::CurrentUser;
use crate::services::earnings::{self, PayoutSummary, ProfileStats};
use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct PaymentDetailsResponse {
    pub details: Option<PaymentDetails>,
}

/// GET /api/payouts
pub async fn payouts(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<PayoutSummary>> {
    Ok(Json(earnings::payouts(&state, &user).await?))
}

/// GET /api/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ProfileStats>> {
    Ok(Json(earnings::stats(&state, &user).await?))
}

/// GET /api/payment-details
pub async fn get_payment_details(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<PaymentDetailsResponse>> {
    let details = earnings::get_payment_details(&state, &user).await?;
    Ok(Json(PaymentDetailsResponse { details }))
}

/// PUT /api/payment-details
pub async fn put_payment_details(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<PaymentDetails>, JsonRejection>,
) -> ApiResult<Json<PaymentDetails>> {
    let Json(details) = payload?;
    Ok(Json(earnings::save_payment_details(&state, &user, details).await?))
}
