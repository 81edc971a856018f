use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Confirmed sponsorship - a payment-verified claim on one mile slot
///
/// INVARIANT: (runner_id, mile_number) is unique; rows are insert-only and
/// removed solely by the runner-deletion cascade.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MileSponsorship {
    pub id: Uuid,
    pub runner_id: Uuid,
    pub mile_number: Decimal,
    pub sponsor_name: String,
    pub sponsor_email: Option<String>,
    pub dedication: Option<String>,
    pub amount: Decimal,
    pub transaction_id: Option<String>,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

impl MileSponsorship {
    /// Name shown on public pages; anonymous sponsors are masked.
    pub fn public_name(&self) -> &str {
        if self.is_anonymous {
            "Anonymous"
        } else {
            &self.sponsor_name
        }
    }
}

/// A sponsor's tentative slot selection, made before payment completes.
/// Does not block other sponsors from selecting the same mile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingSponsorship {
    pub id: Uuid,
    pub runner_id: Uuid,
    pub mile_number: Decimal,
    pub sponsor_name: String,
    pub sponsor_email: String,
    pub dedication: Option<String>,
    pub amount: Decimal,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Pending claim joined with its runner's name and slug (admin listing)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PendingWithRunner {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub pending: PendingSponsorship,
    pub runner_name: String,
    pub runner_slug: String,
}

/// Input for the confirmed-sponsorship insert
#[derive(Debug, Clone)]
pub struct NewSponsorship {
    pub runner_id: Uuid,
    pub mile_number: Decimal,
    pub sponsor_name: String,
    pub sponsor_email: Option<String>,
    pub dedication: Option<String>,
    pub amount: Decimal,
    pub transaction_id: Option<String>,
    pub is_anonymous: bool,
}

impl From<&PendingSponsorship> for NewSponsorship {
    fn from(p: &PendingSponsorship) -> Self {
        Self {
            runner_id: p.runner_id,
            mile_number: p.mile_number,
            sponsor_name: p.sponsor_name.clone(),
            sponsor_email: Some(p.sponsor_email.clone()),
            dedication: p.dedication.clone(),
            amount: p.amount,
            transaction_id: None,
            is_anonymous: p.is_anonymous,
        }
    }
}

/// Input for a new pending claim
#[derive(Debug, Clone)]
pub struct NewPending {
    pub runner_id: Uuid,
    pub mile_number: Decimal,
    pub sponsor_name: String,
    pub sponsor_email: String,
    pub dedication: Option<String>,
    pub amount: Decimal,
    pub is_anonymous: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sponsorship(is_anonymous: bool) -> MileSponsorship {
        MileSponsorship {
            id: Uuid::new_v4(),
            runner_id: Uuid::new_v4(),
            mile_number: dec!(5),
            sponsor_name: "Sarah K.".to_string(),
            sponsor_email: Some("sarah@example.com".to_string()),
            dedication: Some("For my kids".to_string()),
            amount: dec!(36),
            transaction_id: None,
            is_anonymous,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_public_name_masks_anonymous_sponsors() {
        assert_eq!(sponsorship(false).public_name(), "Sarah K.");
        assert_eq!(sponsorship(true).public_name(), "Anonymous");
    }

    #[test]
    fn test_pending_promotes_without_transaction_id() {
        let pending = PendingSponsorship {
            id: Uuid::new_v4(),
            runner_id: Uuid::new_v4(),
            mile_number: dec!(13.1),
            sponsor_name: "Maya".to_string(),
            sponsor_email: "maya@example.com".to_string(),
            dedication: None,
            amount: dec!(36),
            is_anonymous: false,
            created_at: Utc::now(),
            expires_at: Utc::now(),
        };

        let new = NewSponsorship::from(&pending);
        assert_eq!(new.runner_id, pending.runner_id);
        assert_eq!(new.mile_number, dec!(13.1));
        assert_eq!(new.sponsor_email.as_deref(), Some("maya@example.com"));
        assert!(new.transaction_id.is_none());
    }
}
