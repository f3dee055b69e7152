use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::models::{Asset, AssetForm};
use crate::services::loan_service::{self, Availability};
use crate::services::search::{self, AssetFilter};
use crate::services::{DeletedAsset, asset_service};

#[derive(Deserialize)]
pub struct ListAssetsQuery {
    pub q: Option<String>,
    /// Comma-separated
    pub types: Option<String>,
}

pub async fn list_assets(
    State(state): State<AppState>,
    Query(query): Query<ListAssetsQuery>,
) -> Result<Json<Vec<Asset>>, DomainError> {
    let assets = asset_service::list_assets(&state.repo).await?;
    let filter = AssetFilter {
        query: query.q,
        types: query
            .types
            .map(|t| {
                t.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
    };
    Ok(Json(search::filter_assets(&assets, &filter)))
}

pub async fn list_asset_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, DomainError> {
    let assets = asset_service::list_assets(&state.repo).await?;
    Ok(Json(search::asset_types(&assets)))
}

pub async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Asset>, DomainError> {
    Ok(Json(asset_service::get_asset(&state.repo, &id).await?))
}

pub async fn get_availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Availability>, DomainError> {
    Ok(Json(loan_service::availability(&state.repo, &id).await?))
}

pub async fn create_asset(
    State(state): State<AppState>,
    Json(form): Json<AssetForm>,
) -> Result<(StatusCode, Json<Vec<Asset>>), DomainError> {
    let assets = asset_service::add_asset(&state.repo, form).await?;
    Ok((StatusCode::CREATED, Json(assets)))
}

pub async fn update_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<AssetForm>,
) -> Result<Json<Vec<Asset>>, DomainError> {
    Ok(Json(asset_service::update_asset(&state.repo, &id, form).await?))
}

pub async fn delete_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedAsset>, DomainError> {
    Ok(Json(asset_service::delete_asset(&state.repo, &id).await?))
}
