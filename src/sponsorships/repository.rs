use std::collections::HashSet;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::course::normalize_slot;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::sponsorships::models::{
    MileSponsorship, NewPending, NewSponsorship, PendingSponsorship, PendingWithRunner,
};

const SPONSORSHIP_COLUMNS: &str = "id, runner_id, mile_number, sponsor_name, sponsor_email, \
     dedication, amount, transaction_id, is_anonymous, created_at";

const PENDING_COLUMNS: &str = "id, runner_id, mile_number, sponsor_name, sponsor_email, \
     dedication, amount, is_anonymous, created_at, expires_at";

/// Repository for confirmed sponsorships - the authoritative mile ledger
pub struct SponsorshipRepository {
    pool: PgPool,
}

impl SponsorshipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_runner(&self, runner_id: Uuid) -> AppResult<Vec<MileSponsorship>> {
        let sponsorships = sqlx::query_as::<_, MileSponsorship>(&format!(
            r#"
            SELECT {SPONSORSHIP_COLUMNS}
            FROM mile_sponsorships
            WHERE runner_id = $1
            ORDER BY mile_number ASC
            "#
        ))
        .bind(runner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sponsorships)
    }

    /// Confirmed mile numbers for a runner, normalized for set membership
    pub async fn sponsored_miles(&self, runner_id: Uuid) -> AppResult<HashSet<Decimal>> {
        let miles: Vec<(Decimal,)> =
            sqlx::query_as("SELECT mile_number FROM mile_sponsorships WHERE runner_id = $1")
                .bind(runner_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(miles.into_iter().map(|(m,)| normalize_slot(m)).collect())
    }

    pub async fn mile_taken(&self, runner_id: Uuid, mile_number: Decimal) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM mile_sponsorships WHERE runner_id = $1 AND mile_number = $2)",
        )
        .bind(runner_id)
        .bind(mile_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    /// Insert a confirmed sponsorship.
    ///
    /// A unique-constraint violation on (runner_id, mile_number) means
    /// another sponsor won the slot first; it is reported as a Conflict, not
    /// a storage failure.
    pub async fn insert(&self, new: NewSponsorship) -> AppResult<MileSponsorship> {
        let result = sqlx::query_as::<_, MileSponsorship>(&format!(
            r#"
            INSERT INTO mile_sponsorships
                (runner_id, mile_number, sponsor_name, sponsor_email,
                 dedication, amount, transaction_id, is_anonymous)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SPONSORSHIP_COLUMNS}
            "#
        ))
        .bind(new.runner_id)
        .bind(new.mile_number)
        .bind(&new.sponsor_name)
        .bind(&new.sponsor_email)
        .bind(&new.dedication)
        .bind(new.amount)
        .bind(&new.transaction_id)
        .bind(new.is_anonymous)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(sponsorship) => Ok(sponsorship),
            Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(
                "This mile has already been sponsored".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

/// Repository for pending claims - tentative, time-boxed slot selections
pub struct PendingRepository {
    pool: PgPool,
}

impl PendingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending claim, superseding any earlier claim by the same
    /// sponsor for the same runner (the sponsor changed their mind). Both
    /// steps run in one transaction so at most one pending row exists per
    /// (runner_id, sponsor_email).
    pub async fn create(&self, new: NewPending, ttl_hours: i64) -> AppResult<PendingSponsorship> {
        let expires_at = Utc::now() + Duration::hours(ttl_hours);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM pending_sponsorships WHERE sponsor_email = $1 AND runner_id = $2",
        )
        .bind(&new.sponsor_email)
        .bind(new.runner_id)
        .execute(&mut *tx)
        .await?;

        let pending = sqlx::query_as::<_, PendingSponsorship>(&format!(
            r#"
            INSERT INTO pending_sponsorships
                (runner_id, mile_number, sponsor_name, sponsor_email,
                 dedication, amount, is_anonymous, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PENDING_COLUMNS}
            "#
        ))
        .bind(new.runner_id)
        .bind(new.mile_number)
        .bind(&new.sponsor_name)
        .bind(&new.sponsor_email)
        .bind(&new.dedication)
        .bind(new.amount)
        .bind(new.is_anonymous)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(pending)
    }

    /// Unexpired claims with runner context, newest first (admin queue)
    pub async fn list_active(&self) -> AppResult<Vec<PendingWithRunner>> {
        let pending = sqlx::query_as::<_, PendingWithRunner>(
            r#"
            SELECT
                ps.*,
                r.name AS runner_name,
                r.slug AS runner_slug
            FROM pending_sponsorships ps
            JOIN runners r ON ps.runner_id = r.id
            WHERE ps.expires_at > NOW()
            ORDER BY ps.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pending)
    }

    pub async fn list_by_email(&self, email: &str) -> AppResult<Vec<PendingSponsorship>> {
        let pending = sqlx::query_as::<_, PendingSponsorship>(&format!(
            r#"
            SELECT {PENDING_COLUMNS}
            FROM pending_sponsorships
            WHERE sponsor_email = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(pending)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<PendingSponsorship>> {
        let pending = sqlx::query_as::<_, PendingSponsorship>(&format!(
            "SELECT {PENDING_COLUMNS} FROM pending_sponsorships WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pending)
    }

    /// Newest unexpired claim for a sponsor email, optionally scoped to one
    /// runner. Used by the email-matching webhook path.
    pub async fn latest_for_email(
        &self,
        email: &str,
        runner_id: Option<Uuid>,
    ) -> AppResult<Option<PendingSponsorship>> {
        let pending = sqlx::query_as::<_, PendingSponsorship>(&format!(
            r#"
            SELECT {PENDING_COLUMNS}
            FROM pending_sponsorships
            WHERE sponsor_email = $1
              AND expires_at > NOW()
              AND ($2::uuid IS NULL OR runner_id = $2)
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(email)
        .bind(runner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pending)
    }

    /// Returns false when the claim was already gone.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM pending_sponsorships WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Drop claims past their expiry; called by the background reaper.
    pub async fn delete_expired(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM pending_sponsorships WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
