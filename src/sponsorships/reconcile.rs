use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::sponsorships::models::{
    MileSponsorship, NewPending, NewSponsorship, PendingSponsorship,
};
use crate::sponsorships::repository::{PendingRepository, SponsorshipRepository};

/// Confirmed-side operations the reconciliation workflow depends on
#[async_trait]
pub trait ConfirmedLedger: Send + Sync {
    async fn mile_taken(&self, runner_id: Uuid, mile_number: Decimal) -> AppResult<bool>;
    async fn insert(&self, new: NewSponsorship) -> AppResult<MileSponsorship>;
}

/// Pending-side operations the reconciliation workflow depends on
#[async_trait]
pub trait PendingLedger: Send + Sync {
    async fn create(&self, new: NewPending, ttl_hours: i64) -> AppResult<PendingSponsorship>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
impl ConfirmedLedger for SponsorshipRepository {
    async fn mile_taken(&self, runner_id: Uuid, mile_number: Decimal) -> AppResult<bool> {
        SponsorshipRepository::mile_taken(self, runner_id, mile_number).await
    }

    async fn insert(&self, new: NewSponsorship) -> AppResult<MileSponsorship> {
        SponsorshipRepository::insert(self, new).await
    }
}

#[async_trait]
impl PendingLedger for PendingRepository {
    async fn create(&self, new: NewPending, ttl_hours: i64) -> AppResult<PendingSponsorship> {
        PendingRepository::create(self, new, ttl_hours).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        PendingRepository::delete(self, id).await
    }
}

/// Record a sponsor's slot selection as a pending claim.
///
/// Fails with a Conflict when the mile already has a confirmed sponsor;
/// otherwise any earlier claim by the same sponsor for the same runner is
/// superseded. A pending claim never reserves the slot.
pub async fn select_slot<C, P>(
    confirmed: &C,
    pending: &P,
    new: NewPending,
    ttl_hours: i64,
) -> AppResult<PendingSponsorship>
where
    C: ConfirmedLedger + ?Sized,
    P: PendingLedger + ?Sized,
{
    if confirmed.mile_taken(new.runner_id, new.mile_number).await? {
        return Err(AppError::Conflict(
            "This mile has already been sponsored".to_string(),
        ));
    }

    pending.create(new, ttl_hours).await
}

/// Promote a pending claim to a confirmed sponsorship.
///
/// State machine per (runner, mile): AVAILABLE -> PENDING -> CONFIRMED, with
/// PENDING returning to AVAILABLE on rejection or expiry. Pending claims do
/// not reserve the slot, so by the time a payment is verified another
/// sponsor may have confirmed the same mile. In that case the claim is
/// deleted and the caller gets a Conflict.
///
/// The existence pre-check only avoids a doomed insert; the unique index on
/// (runner_id, mile_number) remains the arbiter when two confirmations race
/// between the check and the insert. A constraint violation is handled the
/// same way as a failed pre-check.
pub async fn promote<C, P>(
    sponsorships: &C,
    pending_repo: &P,
    pending: &PendingSponsorship,
    transaction_id: Option<String>,
) -> AppResult<MileSponsorship>
where
    C: ConfirmedLedger + ?Sized,
    P: PendingLedger + ?Sized,
{
    if sponsorships
        .mile_taken(pending.runner_id, pending.mile_number)
        .await?
    {
        warn!(
            "Mile {} for runner {} already confirmed; dropping pending claim {}",
            pending.mile_number, pending.runner_id, pending.id
        );
        pending_repo.delete(pending.id).await?;
        return Err(AppError::Conflict(
            "This mile has already been sponsored".to_string(),
        ));
    }

    let mut new = NewSponsorship::from(pending);
    new.transaction_id = transaction_id;

    let confirmed = match sponsorships.insert(new).await {
        Ok(confirmed) => confirmed,
        Err(AppError::Conflict(msg)) => {
            // Lost the race between the pre-check and the insert
            warn!(
                "Confirmation race lost for mile {} runner {}; dropping pending claim {}",
                pending.mile_number, pending.runner_id, pending.id
            );
            pending_repo.delete(pending.id).await?;
            return Err(AppError::Conflict(msg));
        }
        Err(e) => return Err(e),
    };

    pending_repo.delete(pending.id).await?;

    info!(
        "Mile {} confirmed for {} (runner {})",
        confirmed.mile_number, confirmed.sponsor_name, confirmed.runner_id
    );

    Ok(confirmed)
}
