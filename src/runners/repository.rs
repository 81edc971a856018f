use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::runners::models::{NewRunner, Runner, RunnerUpdate, RunnerWithStats};
use crate::runners::slug::slugify;

const RUNNER_COLUMNS: &str = "id, name, slug, event_name, event_date, donation_url, photo_url, \
     total_miles, mile_increment, price_per_mile, goal_amount, created_at, updated_at";

/// Runner repository - slug allocation and CRUD against the runners table
pub struct RunnerRepository {
    pool: PgPool,
}

impl RunnerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a runner, allocating a unique slug from the name.
    ///
    /// Collisions get a numeric suffix: sarah-k, sarah-k-1, sarah-k-2, ...
    pub async fn create(&self, new: NewRunner) -> AppResult<Runner> {
        let base_slug = slugify(&new.name);
        let base_slug = if base_slug.is_empty() {
            "runner".to_string()
        } else {
            base_slug
        };

        let mut slug = base_slug.clone();
        let mut counter = 1;
        loop {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM runners WHERE slug = $1)")
                    .bind(&slug)
                    .fetch_one(&self.pool)
                    .await?;
            if !exists {
                break;
            }
            slug = format!("{}-{}", base_slug, counter);
            counter += 1;
        }

        let runner = sqlx::query_as::<_, Runner>(&format!(
            r#"
            INSERT INTO runners
                (name, event_name, event_date, donation_url, photo_url,
                 total_miles, mile_increment, price_per_mile, goal_amount, slug)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {RUNNER_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.event_name)
        .bind(new.event_date)
        .bind(&new.donation_url)
        .bind(&new.photo_url)
        .bind(new.total_miles)
        .bind(new.mile_increment)
        .bind(new.price_per_mile)
        .bind(new.goal_amount)
        .bind(&slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(runner)
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppResult<Option<Runner>> {
        let runner = sqlx::query_as::<_, Runner>(&format!(
            "SELECT {RUNNER_COLUMNS} FROM runners WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(runner)
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Runner>> {
        let runner = sqlx::query_as::<_, Runner>(&format!(
            "SELECT {RUNNER_COLUMNS} FROM runners WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(runner)
    }

    /// Admin listing with per-runner sponsorship aggregates
    pub async fn list_with_stats(&self) -> AppResult<Vec<RunnerWithStats>> {
        let runners = sqlx::query_as::<_, RunnerWithStats>(
            r#"
            SELECT
                r.*,
                COUNT(ms.id) AS sponsored_count,
                COALESCE(SUM(ms.amount), 0) AS total_raised
            FROM runners r
            LEFT JOIN mile_sponsorships ms ON r.id = ms.runner_id
            GROUP BY r.id
            ORDER BY r.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(runners)
    }

    /// Partial update; unset fields keep their stored values. The slug is
    /// intentionally not updatable.
    pub async fn update(&self, id: Uuid, update: RunnerUpdate) -> AppResult<Option<Runner>> {
        let runner = sqlx::query_as::<_, Runner>(&format!(
            r#"
            UPDATE runners SET
                name = COALESCE($2, name),
                event_name = COALESCE($3, event_name),
                event_date = COALESCE($4, event_date),
                donation_url = COALESCE($5, donation_url),
                photo_url = COALESCE($6, photo_url),
                total_miles = COALESCE($7, total_miles),
                mile_increment = COALESCE($8, mile_increment),
                price_per_mile = COALESCE($9, price_per_mile),
                goal_amount = COALESCE($10, goal_amount),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {RUNNER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.name)
        .bind(update.event_name)
        .bind(update.event_date)
        .bind(update.donation_url)
        .bind(update.photo_url)
        .bind(update.total_miles)
        .bind(update.mile_increment)
        .bind(update.price_per_mile)
        .bind(update.goal_amount)
        .fetch_optional(&self.pool)
        .await?;

        Ok(runner)
    }

    /// Delete a runner; sponsorships and pending claims go with it via
    /// ON DELETE CASCADE. Returns false when no such runner existed.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM runners WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Confirmed-sponsorship aggregates for one runner
    pub async fn stats(&self, runner_id: Uuid) -> AppResult<(i64, Decimal)> {
        let row: (i64, Decimal) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(amount), 0)
            FROM mile_sponsorships
            WHERE runner_id = $1
            "#,
        )
        .bind(runner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
