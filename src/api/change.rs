//! Change log inspection and maintenance, per sync domain

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::DomainError;
use crate::infrastructure::{AppState, LibraryRepository};
use crate::models::change::Snapshot;
use crate::models::{AssetSnapshot, LoanSnapshot, UserSnapshot};
use crate::services::ChangeTracker;
use crate::sync::SyncDomain;

#[derive(Deserialize)]
pub struct MarkSyncedRequest {
    pub ids: Vec<String>,
}

async fn log_json<S: Snapshot>(
    repo: &LibraryRepository,
    pending_only: bool,
) -> Result<Value, DomainError> {
    let tracker = ChangeTracker::<S>::new(repo);
    let changes = if pending_only {
        tracker.pending().await?
    } else {
        tracker.all().await?
    };
    Ok(serde_json::to_value(changes)?)
}

async fn read_log(
    repo: &LibraryRepository,
    domain: &str,
    pending_only: bool,
) -> Result<Json<Value>, DomainError> {
    let value = match domain.parse::<SyncDomain>()? {
        SyncDomain::Users => log_json::<UserSnapshot>(repo, pending_only).await?,
        SyncDomain::Assets => log_json::<AssetSnapshot>(repo, pending_only).await?,
        SyncDomain::Loans => log_json::<LoanSnapshot>(repo, pending_only).await?,
    };
    Ok(Json(value))
}

pub async fn list_changes(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<Value>, DomainError> {
    read_log(&state.repo, &domain, false).await
}

pub async fn list_pending(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<Value>, DomainError> {
    read_log(&state.repo, &domain, true).await
}

pub async fn mark_synced(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Json(req): Json<MarkSyncedRequest>,
) -> Result<StatusCode, DomainError> {
    let repo = &state.repo;
    match domain.parse::<SyncDomain>()? {
        SyncDomain::Users => ChangeTracker::<UserSnapshot>::new(repo).mark_synced(&req.ids).await?,
        SyncDomain::Assets => {
            ChangeTracker::<AssetSnapshot>::new(repo)
                .mark_synced(&req.ids)
                .await?
        }
        SyncDomain::Loans => ChangeTracker::<LoanSnapshot>::new(repo).mark_synced(&req.ids).await?,
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_changes(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<StatusCode, DomainError> {
    let repo = &state.repo;
    match domain.parse::<SyncDomain>()? {
        SyncDomain::Users => ChangeTracker::<UserSnapshot>::new(repo).clear().await?,
        SyncDomain::Assets => ChangeTracker::<AssetSnapshot>::new(repo).clear().await?,
        SyncDomain::Loans => ChangeTracker::<LoanSnapshot>::new(repo).clear().await?,
    }
    Ok(StatusCode::NO_CONTENT)
}
