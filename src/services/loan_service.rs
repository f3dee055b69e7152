//! Loan Service - Pure business logic without HTTP layer
//!
//! A loan is Active from borrow until return, then Historical for good.
//! Copies are not tracked one by one; availability is an aggregate count.

use serde::Serialize;
use std::collections::HashSet;

use crate::domain::{Collection, DomainError};
use crate::infrastructure::{LibraryRepository, SaveBatch};
use crate::models::change::Snapshot;
use crate::models::{
    ActiveLoan, Asset, ChangeRecord, ChangeType, LoanHistoryRecord, LoanSnapshot,
};
use crate::services::change_tracker::ChangeTracker;
use crate::utils::marc::strip_marc_prefix;
use crate::utils::now_iso;

/// Borrow-time checks. The default trusts the caller to have checked
/// availability; `enforce_copy_limit` makes `borrow` check it too.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoanPolicy {
    pub enforce_copy_limit: bool,
}

/// Availability of one asset
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub asset_id: String,
    pub copies: u32,
    pub on_loan: usize,
    /// Negative when the asset is over-committed
    pub available: i64,
    pub borrowable: bool,
}

/// Collections touched by a return, after the return
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnedLoan {
    pub active_loans: Vec<ActiveLoan>,
    pub history: Vec<LoanHistoryRecord>,
}

/// What `repair_loans` changed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    /// Active loans already present in history
    pub closed_duplicates: usize,
    pub duplicate_active: usize,
    pub duplicate_history: usize,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self.closed_duplicates == 0 && self.duplicate_active == 0 && self.duplicate_history == 0
    }
}

pub fn available_copies(asset: &Asset, active_loans: &[ActiveLoan]) -> i64 {
    let on_loan = active_loans.iter().filter(|l| l.asset_id == asset.id).count();
    i64::from(asset.copies) - on_loan as i64
}

pub fn is_borrowable(asset: &Asset, active_loans: &[ActiveLoan]) -> bool {
    asset.is_loanable && available_copies(asset, active_loans) > 0
}

pub async fn availability(
    repo: &LibraryRepository,
    asset_id: &str,
) -> Result<Availability, DomainError> {
    let asset = repo
        .get_assets()
        .await?
        .into_iter()
        .find(|a| a.id == asset_id)
        .ok_or_else(|| DomainError::asset_not_found(asset_id))?;
    let active_loans = repo.get_active_loans().await?;

    Ok(Availability {
        asset_id: asset.id.clone(),
        copies: asset.copies,
        on_loan: active_loans.iter().filter(|l| l.asset_id == asset.id).count(),
        available: available_copies(&asset, &active_loans),
        borrowable: is_borrowable(&asset, &active_loans),
    })
}

pub async fn list_active_loans(repo: &LibraryRepository) -> Result<Vec<ActiveLoan>, DomainError> {
    repo.get_active_loans().await
}

/// Lend `asset_id` to `user_id`, snapshotting the title and the user's name.
///
/// Returns the updated active set.
pub async fn borrow(
    repo: &LibraryRepository,
    policy: LoanPolicy,
    asset_id: &str,
    user_id: &str,
) -> Result<Vec<ActiveLoan>, DomainError> {
    let asset = repo
        .get_assets()
        .await?
        .into_iter()
        .find(|a| a.id == asset_id)
        .ok_or_else(|| DomainError::asset_not_found(asset_id))?;
    let user = repo
        .get_users()
        .await?
        .into_iter()
        .find(|u| u.id == user_id)
        .ok_or_else(|| DomainError::user_not_found(user_id))?;

    let mut active_loans = repo.get_active_loans().await?;

    let available = available_copies(&asset, &active_loans);
    if policy.enforce_copy_limit {
        if !asset.is_loanable {
            return Err(DomainError::OverCommitted(format!(
                "Asset '{}' is not loanable",
                asset.title
            )));
        }
        if available <= 0 {
            return Err(DomainError::OverCommitted(format!(
                "No copies of '{}' are available",
                asset.title
            )));
        }
    } else if available <= 0 {
        tracing::warn!(
            "Lending asset {} with no available copies ({} on loan for {} copies)",
            asset.id,
            i64::from(asset.copies) - available,
            asset.copies
        );
    }

    let title = strip_marc_prefix(&asset.title, "title").trim();
    let loan = ActiveLoan {
        id: uuid::Uuid::new_v4().to_string(),
        asset_id: asset.id.clone(),
        asset_title: if title.is_empty() {
            "Untitled".to_string()
        } else {
            title.to_string()
        },
        user_id: user.id.clone(),
        user_name: user.display_name(),
        borrow_date: now_iso(),
    };

    let log = ChangeTracker::<LoanSnapshot>::new(repo)
        .stage_create(&loan.id, LoanSnapshot::from(&loan))
        .await?;

    tracing::info!(
        "Loan {}: '{}' to {}",
        loan.id,
        loan.asset_title,
        loan.user_name
    );
    active_loans.push(loan);

    repo.save_batch(
        SaveBatch::new()
            .with(Collection::ActiveLoans, &active_loans)?
            .with(LoanSnapshot::LOG, &log)?,
    )
    .await?;

    Ok(active_loans)
}

/// Close an active loan with the caller-supplied return date.
///
/// History and active set are written in one batch.
pub async fn return_loan(
    repo: &LibraryRepository,
    loan_id: &str,
    return_date: &str,
) -> Result<ReturnedLoan, DomainError> {
    if return_date.trim().is_empty() {
        return Err(DomainError::Validation(
            "Return date is required".to_string(),
        ));
    }

    let mut active_loans = repo.get_active_loans().await?;
    let pos = active_loans
        .iter()
        .position(|l| l.id == loan_id)
        .ok_or_else(|| DomainError::loan_not_found(loan_id))?;
    let loan = active_loans.remove(pos);
    let closed_snapshot = LoanSnapshot::from(&loan);

    let record = loan.close(return_date.to_string());
    let mut history = repo.get_completed_loan_history().await?;

    let tracker = ChangeTracker::<LoanSnapshot>::new(repo);
    let mut log = tracker.stage_delete(loan_id, closed_snapshot).await?;
    log.push(ChangeRecord::new(
        ChangeType::Create,
        loan_id,
        None,
        Some(LoanSnapshot::from(&record)),
    ));

    tracing::info!("Loan {} returned on {}", loan_id, return_date);
    history.push(record);

    repo.save_batch(
        SaveBatch::new()
            .with(Collection::LoanHistory, &history)?
            .with(Collection::ActiveLoans, &active_loans)?
            .with(LoanSnapshot::LOG, &log)?,
    )
    .await?;

    Ok(ReturnedLoan {
        active_loans,
        history,
    })
}

/// Reconcile active set and history after an interrupted return.
///
/// Drops active loans whose id is already in history and keeps the first
/// occurrence of any id repeated within either set. Running it twice
/// changes nothing the second time.
pub async fn repair_loans(repo: &LibraryRepository) -> Result<RepairReport, DomainError> {
    let active_loans = repo.get_active_loans().await?;
    let history = repo.get_completed_loan_history().await?;
    let mut report = RepairReport::default();

    let mut seen = HashSet::new();
    let history: Vec<LoanHistoryRecord> = history
        .into_iter()
        .filter(|r| {
            let first = seen.insert(r.id.clone());
            if !first {
                report.duplicate_history += 1;
            }
            first
        })
        .collect();

    let closed: HashSet<&str> = history.iter().map(|r| r.id.as_str()).collect();
    let mut seen = HashSet::new();
    let active_loans: Vec<ActiveLoan> = active_loans
        .into_iter()
        .filter(|l| {
            if closed.contains(l.id.as_str()) {
                report.closed_duplicates += 1;
                return false;
            }
            let first = seen.insert(l.id.clone());
            if !first {
                report.duplicate_active += 1;
            }
            first
        })
        .collect();

    if report.is_clean() {
        tracing::debug!("Loan repair: nothing to fix");
        return Ok(report);
    }

    tracing::warn!("Loan repair: {:?}", report);
    repo.save_batch(
        SaveBatch::new()
            .with(Collection::ActiveLoans, &active_loans)?
            .with(Collection::LoanHistory, &history)?,
    )
    .await?;

    Ok(report)
}
