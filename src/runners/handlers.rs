use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::api::extract::AppJson;
use crate::api::handler::AppState;
use crate::course::{classify_slot, featured_slots, generate_slots, SlotStatus};
use crate::error::{AppError, AppResult};
use crate::runners::models::{derived_goal, NewRunner, Runner, RunnerUpdate, RunnerWithStats};

#[derive(Deserialize, Validate)]
pub struct CreateRunnerRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "event name is required"))]
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub donation_url: Option<String>,
    pub photo_url: Option<String>,
    pub total_miles: Option<Decimal>,
    pub mile_increment: Option<Decimal>,
    pub price_per_mile: Option<Decimal>,
    pub goal_amount: Option<Decimal>,
}

#[derive(Serialize)]
pub struct CreateRunnerResponse {
    pub success: bool,
    pub runner: Runner,
    pub page_url: String,
}

#[derive(Serialize)]
pub struct RunnersResponse {
    pub runners: Vec<RunnerWithStats>,
}

#[derive(Deserialize)]
pub struct UpdateRunnerRequest {
    pub id: Uuid,
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

#[derive(Serialize)]
pub struct UpdateRunnerResponse {
    pub success: bool,
    pub runner: Runner,
}

#[derive(Deserialize)]
pub struct RunnerIdParams {
    pub id: Uuid,
}

#[derive(Serialize)]
pub struct DeleteRunnerResponse {
    pub success: bool,
}

/// GET /admin/runners - all runners with sponsorship aggregates
pub async fn list_runners(State(state): State<AppState>) -> AppResult<Json<RunnersResponse>> {
    let runners = state.runners.list_with_stats().await?;
    Ok(Json(RunnersResponse { runners }))
}

/// POST /admin/runners
pub async fn create_runner(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateRunnerRequest>,
) -> AppResult<(StatusCode, Json<CreateRunnerResponse>)> {
    req.validate()?;

    let total_miles = req.total_miles.unwrap_or(dec!(26.2));
    let mile_increment = req.mile_increment.unwrap_or(dec!(1));
    let price_per_mile = req.price_per_mile.unwrap_or(dec!(36));

    validate_course(total_miles, mile_increment, price_per_mile)?;

    // ceil(total/increment) slots, one price each, unless explicitly set
    let goal_amount = req
        .goal_amount
        .unwrap_or_else(|| derived_goal(total_miles, mile_increment, price_per_mile));
    if goal_amount < Decimal::ZERO {
        return Err(AppError::Validation(
            "goal_amount must not be negative".to_string(),
        ));
    }

    let runner = state
        .runners
        .create(NewRunner {
            name: req.name,
            event_name: req.event_name,
            event_date: req.event_date,
            donation_url: req.donation_url,
            photo_url: req.photo_url,
            total_miles,
            mile_increment,
            price_per_mile,
            goal_amount,
        })
        .await?;

    info!("Runner created: {} ({})", runner.name, runner.slug);

    let page_url = format!("/runner/{}", runner.slug);
    Ok((
        StatusCode::CREATED,
        Json(CreateRunnerResponse {
            success: true,
            runner,
            page_url,
        }),
    ))
}

/// PUT /admin/runners - partial update, slug stays fixed
pub async fn update_runner(
    State(state): State<AppState>,
    AppJson(req): AppJson<UpdateRunnerRequest>,
) -> AppResult<Json<UpdateRunnerResponse>> {
    if let Some(total) = req.total_miles {
        if total <= Decimal::ZERO {
            return Err(AppError::Validation(
                "total_miles must be positive".to_string(),
            ));
        }
    }
    if let Some(increment) = req.mile_increment {
        if increment <= Decimal::ZERO {
            return Err(AppError::Validation(
                "mile_increment must be positive".to_string(),
            ));
        }
    }
    if let Some(price) = req.price_per_mile {
        if price < Decimal::ZERO {
            return Err(AppError::Validation(
                "price_per_mile must not be negative".to_string(),
            ));
        }
    }

    let runner = state
        .runners
        .update(
            req.id,
            RunnerUpdate {
                name: req.name,
                event_name: req.event_name,
                event_date: req.event_date,
                donation_url: req.donation_url,
                photo_url: req.photo_url,
                total_miles: req.total_miles,
                mile_increment: req.mile_increment,
                price_per_mile: req.price_per_mile,
                goal_amount: req.goal_amount,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Runner not found".to_string()))?;

    Ok(Json(UpdateRunnerResponse {
        success: true,
        runner,
    }))
}

/// DELETE /admin/runners?id=...
pub async fn delete_runner(
    State(state): State<AppState>,
    Query(params): Query<RunnerIdParams>,
) -> AppResult<Json<DeleteRunnerResponse>> {
    let deleted = state.runners.delete(params.id).await?;
    if !deleted {
        return Err(AppError::NotFound("Runner not found".to_string()));
    }

    info!("Runner deleted: {}", params.id);
    Ok(Json(DeleteRunnerResponse { success: true }))
}

// ========== PUBLIC RUNNER PAGE ==========

#[derive(Serialize)]
pub struct RunnerSummary {
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
}

#[derive(Serialize)]
pub struct SponsorshipView {
    pub id: Uuid,
    pub mile_number: Decimal,
    pub sponsor_name: String,
    pub dedication: Option<String>,
    pub amount: Decimal,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct RunnerStatsView {
    pub sponsored_count: i64,
    pub total_raised: Decimal,
    pub total_miles: Decimal,
    pub goal_amount: Decimal,
    pub progress_percent: Decimal,
}

#[derive(Serialize)]
pub struct RunnerPageResponse {
    pub runner: RunnerSummary,
    pub sponsorships: Vec<SponsorshipView>,
    pub stats: RunnerStatsView,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct FeaturedMileView {
    pub mile_number: Decimal,
    pub label: &'static str,
}

#[derive(Serialize)]
pub struct AvailableMilesResponse {
    pub runner_id: Uuid,
    pub total_miles: Decimal,
    pub mile_increment: Decimal,
    pub available_miles: Vec<Decimal>,
    pub available_count: usize,
    pub featured_miles: Vec<FeaturedMileView>,
}

/// Landmark slots for the slot picker (Start / Halfway / Finish)
fn featured_views(total_miles: Decimal, mile_increment: Decimal) -> Vec<FeaturedMileView> {
    featured_slots(total_miles, mile_increment)
        .into_iter()
        .map(|(mile_number, label)| FeaturedMileView { mile_number, label })
        .collect()
}

/// Fraction of the goal raised, clamped to 100
pub fn progress_percent(total_raised: Decimal, goal_amount: Decimal) -> Decimal {
    if goal_amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (total_raised / goal_amount * dec!(100)).round_dp(2).min(dec!(100))
}

/// GET /runners/:slug - public page data: runner, sponsorships, stats
pub async fn get_runner_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<RunnerPageResponse>> {
    let runner = state
        .runners
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Runner not found".to_string()))?;

    let sponsorships = state.sponsorships.list_for_runner(runner.id).await?;
    let (sponsored_count, total_raised) = state.runners.stats(runner.id).await?;

    let sponsorship_views = sponsorships
        .iter()
        .map(|s| SponsorshipView {
            id: s.id,
            mile_number: s.mile_number,
            sponsor_name: s.public_name().to_string(),
            dedication: s.dedication.clone(),
            amount: s.amount,
            is_anonymous: s.is_anonymous,
            created_at: s.created_at,
        })
        .collect();

    Ok(Json(RunnerPageResponse {
        stats: RunnerStatsView {
            sponsored_count,
            total_raised,
            total_miles: runner.total_miles,
            goal_amount: runner.goal_amount,
            progress_percent: progress_percent(total_raised, runner.goal_amount),
        },
        sponsorships: sponsorship_views,
        runner: RunnerSummary {
            id: runner.id,
            name: runner.name,
            slug: runner.slug,
            event_name: runner.event_name,
            event_date: runner.event_date,
            donation_url: runner.donation_url,
            photo_url: runner.photo_url,
            total_miles: runner.total_miles,
            mile_increment: runner.mile_increment,
            price_per_mile: runner.price_per_mile,
            goal_amount: runner.goal_amount,
        },
    }))
}

/// GET /runners/:slug/available-miles - unsponsored slots for the course
pub async fn get_available_miles(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<AvailableMilesResponse>> {
    let runner = state
        .runners
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Runner not found".to_string()))?;

    let sponsored = state.sponsorships.sponsored_miles(runner.id).await?;
    let available_miles: Vec<Decimal> = generate_slots(runner.total_miles, runner.mile_increment)
        .into_iter()
        .filter(|slot| classify_slot(*slot, &sponsored) == SlotStatus::Available)
        .collect();

    Ok(Json(AvailableMilesResponse {
        runner_id: runner.id,
        total_miles: runner.total_miles,
        mile_increment: runner.mile_increment,
        available_count: available_miles.len(),
        featured_miles: featured_views(runner.total_miles, runner.mile_increment),
        available_miles,
    }))
}

fn validate_course(
    total_miles: Decimal,
    mile_increment: Decimal,
    price_per_mile: Decimal,
) -> AppResult<()> {
    if total_miles <= Decimal::ZERO {
        return Err(AppError::Validation(
            "total_miles must be positive".to_string(),
        ));
    }
    if mile_increment <= Decimal::ZERO {
        return Err(AppError::Validation(
            "mile_increment must be positive".to_string(),
        ));
    }
    if price_per_mile < Decimal::ZERO {
        return Err(AppError::Validation(
            "price_per_mile must not be negative".to_string(),
        ));
    }
    Ok(())
}
