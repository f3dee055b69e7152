use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::models::{
    ActiveLoan, Asset, AssetChange, LoanChange, LoanHistoryRecord, User, UserChange,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    pub version: String,
    pub timestamp: String,
    pub user_code_prefix: String,
    pub assets: Vec<Asset>,
    pub users: Vec<User>,
    pub active_loans: Vec<ActiveLoan>,
    pub loan_history: Vec<LoanHistoryRecord>,
    pub user_changes: Vec<UserChange>,
    pub asset_changes: Vec<AssetChange>,
    pub loan_changes: Vec<LoanChange>,
}

pub async fn export_data(State(state): State<AppState>) -> Result<impl IntoResponse, DomainError> {
    let repo = &state.repo;
    let backup = BackupData {
        version: "1.0".to_string(),
        timestamp: crate::utils::now_iso(),
        user_code_prefix: state.library_config.user_code_prefix.clone(),
        assets: repo.get_assets().await?,
        users: repo.get_users().await?,
        active_loans: repo.get_active_loans().await?,
        loan_history: repo.get_completed_loan_history().await?,
        user_changes: repo.get_user_changes().await?,
        asset_changes: repo.get_asset_changes().await?,
        loan_changes: repo.get_loan_changes().await?,
    };

    let filename = format!(
        "bibliolend_backup_{}.json",
        chrono::Utc::now().format("%Y-%m-%d")
    );

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((headers, Json(backup)))
}
