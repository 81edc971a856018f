use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::extract::AppJson;
use crate::api::handler::AppState;
use crate::error::{AppError, AppResult};
use crate::sponsorships::models::NewSponsorship;
use crate::sponsorships::reconcile;

const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// External payment confirmations arrive in one of two shapes.
///
/// The full payload carries everything needed to confirm a mile directly
/// (the payment processor knows which slot was bought); the email shape only
/// identifies the sponsor, and the newest unexpired pending claim supplies
/// the rest. The presence of `mile_number` selects the shape, so a direct
/// payload with a field missing is rejected rather than misread as an
/// email match.
#[derive(Debug, Clone)]
pub enum DonationPayload {
    Direct(DirectDonation),
    EmailMatch(EmailDonation),
}

impl<'de> Deserialize<'de> for DonationPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.get("mile_number").is_some() {
            serde_json::from_value::<DirectDonation>(value)
                .map(DonationPayload::Direct)
                .map_err(serde::de::Error::custom)
        } else {
            serde_json::from_value::<EmailDonation>(value)
                .map(DonationPayload::EmailMatch)
                .map_err(serde::de::Error::custom)
        }
    }
}

/// Full payload: confirms a mile without any prior pending claim
#[derive(Debug, Clone, Deserialize)]
pub struct DirectDonation {
    pub runner_id: Uuid,
    pub mile_number: Decimal,
    pub sponsor_name: String,
    pub sponsor_email: Option<String>,
    pub dedication: Option<String>,
    pub amount: Decimal,
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Email-matching payload: promotes the sponsor's newest pending claim
#[derive(Debug, Clone, Deserialize)]
pub struct EmailDonation {
    pub sponsor_email: String,
    pub runner_id: Option<Uuid>,
    pub transaction_id: Option<String>,
}

#[derive(Serialize)]
pub struct ConfirmedSponsorshipView {
    pub id: Uuid,
    pub mile_number: Decimal,
    pub sponsor_name: String,
    pub dedication: Option<String>,
    pub amount: Decimal,
}

#[derive(Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsorship: Option<ConfirmedSponsorshipView>,
}

/// POST /webhooks/donation - reconcile an external payment confirmation.
///
/// Optionally authenticated with a shared secret in the x-webhook-secret
/// header; auth is skipped when no secret is configured.
pub async fn donation_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(payload): AppJson<DonationPayload>,
) -> AppResult<(StatusCode, Json<WebhookResponse>)> {
    if let Some(secret) = &state.config.webhook_secret {
        let provided = headers
            .get(WEBHOOK_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(secret.as_str()) {
            return Err(AppError::Unauthorized);
        }
    }

    match payload {
        DonationPayload::Direct(donation) => confirm_direct(&state, donation).await,
        DonationPayload::EmailMatch(donation) => confirm_by_email(&state, donation).await,
    }
}

async fn confirm_direct(
    state: &AppState,
    donation: DirectDonation,
) -> AppResult<(StatusCode, Json<WebhookResponse>)> {
    validate_direct(&donation)?;

    info!(
        "Donation webhook (direct): mile {} for runner {}",
        donation.mile_number, donation.runner_id
    );

    if state.runners.get_by_id(donation.runner_id).await?.is_none() {
        return Err(AppError::NotFound("Runner not found".to_string()));
    }

    let confirmed = state
        .sponsorships
        .insert(NewSponsorship {
            runner_id: donation.runner_id,
            mile_number: donation.mile_number,
            sponsor_name: donation.sponsor_name,
            sponsor_email: donation.sponsor_email,
            dedication: donation.dedication,
            amount: donation.amount,
            transaction_id: donation.transaction_id,
            is_anonymous: donation.is_anonymous,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(WebhookResponse {
            success: true,
            message: "Mile sponsorship created successfully".to_string(),
            sponsorship: Some(ConfirmedSponsorshipView {
                id: confirmed.id,
                mile_number: confirmed.mile_number,
                sponsor_name: confirmed.public_name().to_string(),
                dedication: confirmed.dedication.clone(),
                amount: confirmed.amount,
            }),
        }),
    ))
}

async fn confirm_by_email(
    state: &AppState,
    donation: EmailDonation,
) -> AppResult<(StatusCode, Json<WebhookResponse>)> {
    info!(
        "Donation webhook (email match): {} runner {:?}",
        donation.sponsor_email, donation.runner_id
    );

    let pending = state
        .pending
        .latest_for_email(&donation.sponsor_email, donation.runner_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No pending sponsorship found for {}",
                donation.sponsor_email
            ))
        })?;

    let confirmed = reconcile::promote(
        state.sponsorships.as_ref(),
        state.pending.as_ref(),
        &pending,
        donation.transaction_id,
    )
    .await?;

    Ok((
        StatusCode::OK,
        Json(WebhookResponse {
            success: true,
            message: format!(
                "Mile {} confirmed for {}",
                confirmed.mile_number, confirmed.sponsor_name
            ),
            sponsorship: Some(ConfirmedSponsorshipView {
                id: confirmed.id,
                mile_number: confirmed.mile_number,
                sponsor_name: confirmed.public_name().to_string(),
                dedication: confirmed.dedication.clone(),
                amount: confirmed.amount,
            }),
        }),
    ))
}

fn validate_direct(donation: &DirectDonation) -> AppResult<()> {
    if donation.mile_number <= Decimal::ZERO || donation.mile_number > dec!(100) {
        return Err(AppError::Validation(
            "Invalid mile_number. Must be a positive number between 0 and 100.".to_string(),
        ));
    }
    if donation.sponsor_name.trim().is_empty() {
        return Err(AppError::Validation(
            "sponsor_name is required".to_string(),
        ));
    }
    if donation.amount < Decimal::ZERO {
        return Err(AppError::Validation(
            "amount must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// GET /webhooks/donation - payload descriptor for the external automation
pub async fn webhook_descriptor() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "endpoint": "donation-webhook",
        "expected_payload": {
            "runner_id": "uuid (required for direct confirmation)",
            "mile_number": "number (required for direct confirmation)",
            "sponsor_name": "string (required for direct confirmation)",
            "sponsor_email": "string (required for email matching)",
            "dedication": "string (optional)",
            "amount": "number (required for direct confirmation)",
            "transaction_id": "string (optional)",
            "is_anonymous": "boolean (optional, default: false)"
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_payload_parses_as_direct() {
        let payload: DonationPayload = serde_json::from_value(serde_json::json!({
            "runner_id": Uuid::new_v4(),
            "mile_number": 13.1,
            "sponsor_name": "Sarah K.",
            "sponsor_email": "sarah@example.com",
            "dedication": "For my kids - Maya and Eli",
            "amount": 36.0,
            "transaction_id": "ch_abc123",
            "is_anonymous": false
        }))
        .unwrap();

        match payload {
            DonationPayload::Direct(d) => {
                assert_eq!(d.mile_number, dec!(13.1));
                assert_eq!(d.sponsor_name, "Sarah K.");
                assert_eq!(d.transaction_id.as_deref(), Some("ch_abc123"));
            }
            DonationPayload::EmailMatch(_) => panic!("expected direct payload"),
        }
    }

    #[test]
    fn test_email_only_payload_parses_as_email_match() {
        let payload: DonationPayload = serde_json::from_value(serde_json::json!({
            "sponsor_email": "a@x.com"
        }))
        .unwrap();

        match payload {
            DonationPayload::EmailMatch(d) => {
                assert_eq!(d.sponsor_email, "a@x.com");
                assert!(d.runner_id.is_none());
            }
            DonationPayload::Direct(_) => panic!("expected email payload"),
        }
    }

    #[test]
    fn test_email_payload_with_runner_scope() {
        let runner_id = Uuid::new_v4();
        let payload: DonationPayload = serde_json::from_value(serde_json::json!({
            "sponsor_email": "a@x.com",
            "runner_id": runner_id,
            "transaction_id": "ch_1"
        }))
        .unwrap();

        match payload {
            DonationPayload::EmailMatch(d) => {
                assert_eq!(d.runner_id, Some(runner_id));
                assert_eq!(d.transaction_id.as_deref(), Some("ch_1"));
            }
            DonationPayload::Direct(_) => panic!("expected email payload"),
        }
    }

    #[test]
    fn test_partial_direct_payload_is_rejected_not_email_matched() {
        // Names a mile but is missing sponsor_name and amount; must fail
        // instead of silently matching against the sponsor's pending claim
        let result = serde_json::from_value::<DonationPayload>(serde_json::json!({
            "runner_id": Uuid::new_v4(),
            "mile_number": 5,
            "sponsor_email": "a@x.com"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_direct_validation_bounds_mile_number() {
        let mut donation = DirectDonation {
            runner_id: Uuid::new_v4(),
            mile_number: dec!(13.1),
            sponsor_name: "Sarah K.".to_string(),
            sponsor_email: None,
            dedication: None,
            amount: dec!(36),
            transaction_id: None,
            is_anonymous: false,
        };
        assert!(validate_direct(&donation).is_ok());

        donation.mile_number = dec!(0);
        assert!(validate_direct(&donation).is_err());

        donation.mile_number = dec!(100.1);
        assert!(validate_direct(&donation).is_err());

        donation.mile_number = dec!(100);
        assert!(validate_direct(&donation).is_ok());
    }

    #[test]
    fn test_direct_validation_requires_sponsor_name() {
        let donation = DirectDonation {
            runner_id: Uuid::new_v4(),
            mile_number: dec!(5),
            sponsor_name: "  ".to_string(),
            sponsor_email: None,
            dedication: None,
            amount: dec!(36),
            transaction_id: None,
            is_anonymous: false,
        };
        assert!(validate_direct(&donation).is_err());
    }
}
