use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::api::extract::AppJson;
use crate::api::handler::AppState;
use crate::error::{AppError, AppResult};
use crate::sponsorships::models::{NewPending, PendingSponsorship, PendingWithRunner};
use crate::sponsorships::reconcile;

#[derive(Deserialize, Validate)]
pub struct CreatePendingRequest {
    pub runner_id: Uuid,
    pub mile_number: Decimal,
    pub sponsor_name: Option<String>,
    #[validate(email(message = "sponsor_email must be a valid email"))]
    pub sponsor_email: String,
    pub dedication: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub is_anonymous: bool,
}

#[derive(Serialize)]
pub struct CreatePendingResponse {
    pub success: bool,
    pub pending: PendingSponsorship,
}

#[derive(Deserialize)]
pub struct PendingEmailParams {
    pub email: String,
}

#[derive(Serialize)]
pub struct PendingListResponse {
    pub pending: Vec<PendingSponsorship>,
}

#[derive(Serialize)]
pub struct AdminPendingListResponse {
    pub pending: Vec<PendingWithRunner>,
}

#[derive(Deserialize)]
pub struct ConfirmPendingRequest {
    pub pending_id: Uuid,
}

#[derive(Deserialize)]
pub struct PendingIdParams {
    pub id: Uuid,
}

#[derive(Serialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// POST /pending - sponsor selects a slot before paying.
///
/// A repeat selection by the same email for the same runner replaces the
/// earlier claim; the selection fails outright when the mile is already
/// confirmed. Pending claims never reserve the slot.
pub async fn create_pending(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreatePendingRequest>,
) -> AppResult<(StatusCode, Json<CreatePendingResponse>)> {
    req.validate()?;

    if req.mile_number <= Decimal::ZERO {
        return Err(AppError::Validation(
            "mile_number must be positive".to_string(),
        ));
    }
    if req.amount < Decimal::ZERO {
        return Err(AppError::Validation(
            "amount must not be negative".to_string(),
        ));
    }

    if state.runners.get_by_id(req.runner_id).await?.is_none() {
        return Err(AppError::NotFound("Runner not found".to_string()));
    }

    let pending = reconcile::select_slot(
        state.sponsorships.as_ref(),
        state.pending.as_ref(),
        NewPending {
            runner_id: req.runner_id,
            mile_number: req.mile_number,
            sponsor_name: req.sponsor_name.unwrap_or_else(|| "Anonymous".to_string()),
            sponsor_email: req.sponsor_email,
            dedication: req.dedication,
            amount: req.amount,
            is_anonymous: req.is_anonymous,
        },
        state.config.pending_ttl_hours,
    )
    .await?;

    info!(
        "Pending claim created: mile {} for runner {} ({})",
        pending.mile_number, pending.runner_id, pending.sponsor_email
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatePendingResponse {
            success: true,
            pending,
        }),
    ))
}

/// GET /pending?email=... - claims for one sponsor (debugging/admin)
pub async fn list_pending_by_email(
    State(state): State<AppState>,
    Query(params): Query<PendingEmailParams>,
) -> AppResult<Json<PendingListResponse>> {
    let pending = state.pending.list_by_email(&params.email).await?;
    Ok(Json(PendingListResponse { pending }))
}

/// GET /admin/pending - unexpired claims with runner context, newest first
pub async fn admin_list_pending(
    State(state): State<AppState>,
) -> AppResult<Json<AdminPendingListResponse>> {
    let pending = state.pending.list_active().await?;
    Ok(Json(AdminPendingListResponse { pending }))
}

/// POST /admin/pending - admin confirms a claim after verifying payment
pub async fn admin_confirm_pending(
    State(state): State<AppState>,
    AppJson(req): AppJson<ConfirmPendingRequest>,
) -> AppResult<Json<ActionResponse>> {
    let pending = state
        .pending
        .get(req.pending_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Pending sponsorship not found".to_string()))?;

    let confirmed = reconcile::promote(
        state.sponsorships.as_ref(),
        state.pending.as_ref(),
        &pending,
        None,
    )
    .await?;

    Ok(Json(ActionResponse {
        success: true,
        message: Some(format!(
            "Mile {} confirmed for {}",
            confirmed.mile_number, confirmed.sponsor_name
        )),
    }))
}

/// DELETE /admin/pending?id=... - admin rejects a claim outright
pub async fn admin_reject_pending(
    State(state): State<AppState>,
    Query(params): Query<PendingIdParams>,
) -> AppResult<Json<ActionResponse>> {
    state.pending.delete(params.id).await?;
    info!("Pending claim rejected: {}", params.id);

    Ok(Json(ActionResponse {
        success: true,
        message: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(email: &str) -> CreatePendingRequest {
        CreatePendingRequest {
            runner_id: Uuid::new_v4(),
            mile_number: dec!(5),
            sponsor_name: None,
            sponsor_email: email.to_string(),
            dedication: None,
            amount: dec!(36),
            is_anonymous: false,
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(request("a@x.com").validate().is_ok());
        assert!(request("not-an-email").validate().is_err());
    }

    #[test]
    fn test_is_anonymous_defaults_to_false() {
        let req: CreatePendingRequest = serde_json::from_value(serde_json::json!({
            "runner_id": Uuid::new_v4(),
            "mile_number": 5,
            "sponsor_email": "a@x.com",
            "amount": 36
        }))
        .unwrap();
        assert!(!req.is_anonymous);
        assert!(req.sponsor_name.is_none());
    }
}
