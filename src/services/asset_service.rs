//! Asset Service - catalog CRUD with change tracking
//!
//! Deleting an asset cascades to its active loans and loan history.

use serde::Serialize;

use crate::domain::{Collection, DomainError};
use crate::infrastructure::{LibraryRepository, SaveBatch};
use crate::models::change::Snapshot;
use crate::models::{
    ActiveLoan, Asset, AssetForm, AssetSnapshot, ChangeRecord, ChangeType, LoanHistoryRecord,
    LoanSnapshot,
};
use crate::services::change_tracker::ChangeTracker;

/// Collections touched by a cascading delete, after the delete
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedAsset {
    pub assets: Vec<Asset>,
    pub active_loans: Vec<ActiveLoan>,
    pub history: Vec<LoanHistoryRecord>,
}

pub async fn list_assets(repo: &LibraryRepository) -> Result<Vec<Asset>, DomainError> {
    repo.get_assets().await
}

pub async fn get_asset(repo: &LibraryRepository, id: &str) -> Result<Asset, DomainError> {
    repo.get_assets()
        .await?
        .into_iter()
        .find(|a| a.id == id)
        .ok_or_else(|| DomainError::asset_not_found(id))
}

pub async fn add_asset(
    repo: &LibraryRepository,
    form: AssetForm,
) -> Result<Vec<Asset>, DomainError> {
    let mut assets = repo.get_assets().await?;
    let mut asset = Asset::blank(uuid::Uuid::new_v4().to_string());
    form.apply_to(&mut asset);

    let log = ChangeTracker::<AssetSnapshot>::new(repo)
        .stage_create(&asset.id, AssetSnapshot::from(&asset))
        .await?;

    tracing::info!("Adding asset '{}' ({})", asset.title, asset.id);
    assets.push(asset);

    repo.save_batch(
        SaveBatch::new()
            .with(Collection::Assets, &assets)?
            .with(AssetSnapshot::LOG, &log)?,
    )
    .await?;

    Ok(assets)
}

pub async fn update_asset(
    repo: &LibraryRepository,
    id: &str,
    form: AssetForm,
) -> Result<Vec<Asset>, DomainError> {
    let mut assets = repo.get_assets().await?;
    let asset = assets
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| DomainError::asset_not_found(id))?;

    let before = AssetSnapshot::from(&*asset);
    form.apply_to(asset);
    let after = AssetSnapshot::from(&*asset);

    let log = ChangeTracker::<AssetSnapshot>::new(repo)
        .stage_update(id, before, after)
        .await?;

    tracing::info!("Updated asset {}", id);
    repo.save_batch(
        SaveBatch::new()
            .with(Collection::Assets, &assets)?
            .with(AssetSnapshot::LOG, &log)?,
    )
    .await?;

    Ok(assets)
}

/// Delete an asset together with every active loan and history record
/// that references it. All five collections are written as one batch.
pub async fn delete_asset(repo: &LibraryRepository, id: &str) -> Result<DeletedAsset, DomainError> {
    let mut assets = repo.get_assets().await?;
    let pos = assets
        .iter()
        .position(|a| a.id == id)
        .ok_or_else(|| DomainError::asset_not_found(id))?;
    let removed = assets.remove(pos);

    let (dropped_active, active_loans): (Vec<ActiveLoan>, Vec<ActiveLoan>) = repo
        .get_active_loans()
        .await?
        .into_iter()
        .partition(|l| l.asset_id == id);
    let (dropped_history, history): (Vec<LoanHistoryRecord>, Vec<LoanHistoryRecord>) = repo
        .get_completed_loan_history()
        .await?
        .into_iter()
        .partition(|r| r.asset_id == id);

    let asset_log = ChangeTracker::<AssetSnapshot>::new(repo)
        .stage_delete(id, AssetSnapshot::from(&removed))
        .await?;

    let loans = ChangeTracker::<LoanSnapshot>::new(repo);
    let mut loan_log = loans.all().await?;
    for loan in &dropped_active {
        loan_log.push(ChangeRecord::new(
            ChangeType::Delete,
            &loan.id,
            Some(LoanSnapshot::from(loan)),
            None,
        ));
    }
    for record in &dropped_history {
        loan_log.push(ChangeRecord::new(
            ChangeType::Delete,
            &record.id,
            Some(LoanSnapshot::from(record)),
            None,
        ));
    }

    tracing::info!(
        "Deleted asset {} with {} active loan(s) and {} history record(s)",
        id,
        dropped_active.len(),
        dropped_history.len()
    );

    repo.save_batch(
        SaveBatch::new()
            .with(Collection::Assets, &assets)?
            .with(Collection::ActiveLoans, &active_loans)?
            .with(Collection::LoanHistory, &history)?
            .with(AssetSnapshot::LOG, &asset_log)?
            .with(LoanSnapshot::LOG, &loan_log)?,
    )
    .await?;

    Ok(DeletedAsset {
        assets,
        active_loans,
        history,
    })
}
