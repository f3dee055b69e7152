use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::models::{NewUser, User, UserPatch, UserType};
use crate::services::search::{self, UserFilter};
use crate::services::user_service;

#[derive(Deserialize)]
pub struct ListUsersQuery {
    pub q: Option<String>,
    /// Comma-separated, either label set
    pub types: Option<String>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>, DomainError> {
    let types = match query.types.as_deref() {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<UserType>().map_err(DomainError::Validation))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let users = user_service::list_users(&state.repo).await?;
    Ok(Json(search::filter_users(
        &users,
        &UserFilter {
            query: query.q,
            types,
        },
    )))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, DomainError> {
    Ok(Json(user_service::get_user(&state.repo, &id).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<NewUser>,
) -> Result<(StatusCode, Json<Vec<User>>), DomainError> {
    let users = user_service::add_user(&state.repo, &state.library_config, input).await?;
    Ok((StatusCode::CREATED, Json(users)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<Vec<User>>, DomainError> {
    Ok(Json(user_service::update_user(&state.repo, &id, patch).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<User>>, DomainError> {
    Ok(Json(user_service::delete_user(&state.repo, &id).await?))
}
