use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::models::loan::{BorrowRequest, ReturnRequest};
use crate::models::{ActiveLoan, LoanHistoryRecord};
use crate::services::loan_service::{self, RepairReport, ReturnedLoan};
use crate::services::search::{self, HistoryFilter};

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub asset: Option<String>,
    pub user: Option<String>,
    /// `YYYY-MM-DD`, inclusive
    pub from: Option<String>,
    /// `YYYY-MM-DD`, inclusive
    pub to: Option<String>,
}

fn parse_day(raw: Option<String>) -> Result<Option<NaiveDate>, DomainError> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(day) => NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| DomainError::Validation(format!("Invalid date '{}'", day))),
        None => Ok(None),
    }
}

pub async fn list_loans(
    State(state): State<AppState>,
) -> Result<Json<Vec<ActiveLoan>>, DomainError> {
    Ok(Json(loan_service::list_active_loans(&state.repo).await?))
}

pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<LoanHistoryRecord>>, DomainError> {
    let filter = HistoryFilter {
        asset: query.asset,
        user: query.user,
        from: parse_day(query.from)?,
        to: parse_day(query.to)?,
    };
    let history = state.repo.get_completed_loan_history().await?;
    Ok(Json(search::filter_history(&history, &filter)))
}

pub async fn create_loan(
    State(state): State<AppState>,
    Json(req): Json<BorrowRequest>,
) -> Result<(StatusCode, Json<Vec<ActiveLoan>>), DomainError> {
    let loans =
        loan_service::borrow(&state.repo, state.loan_policy, &req.asset_id, &req.user_id).await?;
    Ok((StatusCode::CREATED, Json(loans)))
}

pub async fn return_loan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReturnRequest>,
) -> Result<Json<ReturnedLoan>, DomainError> {
    Ok(Json(
        loan_service::return_loan(&state.repo, &id, &req.return_date).await?,
    ))
}

pub async fn repair_loans(
    State(state): State<AppState>,
) -> Result<Json<RepairReport>, DomainError> {
    Ok(Json(loan_service::repair_loans(&state.repo).await?))
}
