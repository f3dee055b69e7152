use axum::{
    Json,
    extract::{Path, State},
};

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::sync::{SyncDomain, SyncReport};

pub async fn sync_down(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<SyncReport>, DomainError> {
    let domain: SyncDomain = domain.parse()?;
    Ok(Json(state.sync.sync_down(domain).await?))
}

pub async fn sync_up(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<SyncReport>, DomainError> {
    let domain: SyncDomain = domain.parse()?;
    Ok(Json(state.sync.sync_up(domain).await?))
}
