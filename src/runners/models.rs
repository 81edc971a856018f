use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Runner entity - one fundraising page with a fixed mileage course
///
/// INVARIANT: slug is unique and never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Runner {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub donation_url: Option<String>,
    pub photo_url: Option<String>,
    pub total_miles: Decimal,
    pub mile_increment: Decimal,
    pub price_per_mile: Decimal,
    pub goal_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Runner row joined with its sponsorship aggregates (admin listing)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RunnerWithStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub runner: Runner,
    pub sponsored_count: i64,
    pub total_raised: Decimal,
}

/// Fields for a new runner, validated before they reach the repository
#[derive(Debug, Clone)]
pub struct NewRunner {
    pub name: String,
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub donation_url: Option<String>,
    pub photo_url: Option<String>,
    pub total_miles: Decimal,
    pub mile_increment: Decimal,
    pub price_per_mile: Decimal,
    pub goal_amount: Decimal,
}

/// Partial update; None leaves the stored column untouched
#[derive(Debug, Clone, Default)]
pub struct RunnerUpdate {
    pub name: Option<String>,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub donation_url: Option<String>,
    pub photo_url: Option<String>,
    pub total_miles: Option<Decimal>,
    pub mile_increment: Option<Decimal>,
    pub price_per_mile: Option<Decimal>,
    pub goal_amount: Option<Decimal>,
}

/// Goal defaults to one full price per slot unless the admin set one.
pub fn derived_goal(total_miles: Decimal, mile_increment: Decimal, price_per_mile: Decimal) -> Decimal {
    (total_miles / mile_increment).ceil() * price_per_mile
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_marathon_goal() {
        // 26.2 miles in 1-mile slots at $36: ceil(26.2) = 27 slots
        assert_eq!(derived_goal(dec!(26.2), dec!(1), dec!(36)), dec!(972));
    }

    #[test]
    fn test_fractional_increment_goal() {
        // 13.1 in half-mile slots: ceil(26.2) = 27 slots at $20
        assert_eq!(derived_goal(dec!(13.1), dec!(0.5), dec!(20)), dec!(540));
    }

    #[test]
    fn test_exact_division_goal() {
        assert_eq!(derived_goal(dec!(10), dec!(1), dec!(36)), dec!(360));
    }
}
