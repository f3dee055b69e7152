//! Sync Reconciler - spreadsheet down/up flows per domain
//!
//! Down overwrites the local collections with the sheet and drops the
//! domain's change log. Up pushes pending change records in one request;
//! what happens to them after a failed push depends on the `ClearPolicy`.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::mapping::{
    asset_descriptor, asset_from_row, loan_descriptor, split_loans, user_descriptor,
    user_from_row,
};
use super::spreadsheet::SpreadsheetClient;
use crate::domain::{Collection, DomainError};
use crate::infrastructure::config::{ClearPolicy, SheetsConfig};
use crate::infrastructure::{LibraryRepository, SaveBatch};
use crate::models::change::Snapshot;
use crate::models::{
    Asset, AssetChange, AssetSnapshot, ChangeRecord, LoanChange, LoanSnapshot, User, UserChange,
    UserSnapshot,
};
use crate::services::change_tracker::ChangeTracker;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDomain {
    Users,
    Assets,
    Loans,
}

impl SyncDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDomain::Users => "users",
            SyncDomain::Assets => "assets",
            SyncDomain::Loans => "loans",
        }
    }

    /// `action` parameter understood by the spreadsheet web app
    pub fn action(&self) -> &'static str {
        match self {
            SyncDomain::Users => "syncChanges",
            SyncDomain::Assets => "syncAssetChanges",
            SyncDomain::Loans => "syncLoanChanges",
        }
    }

    fn entity(&self) -> &'static str {
        match self {
            SyncDomain::Users => UserSnapshot::ENTITY,
            SyncDomain::Assets => AssetSnapshot::ENTITY,
            SyncDomain::Loans => LoanSnapshot::ENTITY,
        }
    }

    fn sheet_id<'a>(&self, sheets: &'a SheetsConfig) -> &'a str {
        match self {
            SyncDomain::Users => &sheets.users_sheet_id,
            SyncDomain::Assets => &sheets.assets_sheet_id,
            SyncDomain::Loans => &sheets.loans_sheet_id,
        }
    }
}

impl fmt::Display for SyncDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncDomain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "users" | "user" => Ok(SyncDomain::Users),
            "assets" | "asset" => Ok(SyncDomain::Assets),
            "loans" | "loan" => Ok(SyncDomain::Loans),
            other => Err(DomainError::Validation(format!(
                "Unknown sync domain '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    Down,
    Up,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncStatus {
    Synced,
    /// The sheet was empty; nothing was overwritten
    NoData,
    /// No pending changes; the spreadsheet was not called
    NothingPending,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub domain: SyncDomain,
    pub direction: SyncDirection,
    pub status: SyncStatus,
    /// Rows fetched or change records pushed
    pub count: usize,
    pub message: String,
}

#[derive(Clone)]
pub struct SyncReconciler {
    repo: LibraryRepository,
    client: Option<SpreadsheetClient>,
    sheets: SheetsConfig,
    clear_policy: ClearPolicy,
}

impl SyncReconciler {
    pub fn new(
        repo: LibraryRepository,
        client: Option<SpreadsheetClient>,
        sheets: SheetsConfig,
        clear_policy: ClearPolicy,
    ) -> Self {
        Self {
            repo,
            client,
            sheets,
            clear_policy,
        }
    }

    /// Build from config; without a spreadsheet URL every sync fails with
    /// a configuration error.
    pub fn from_config(
        repo: LibraryRepository,
        sheets: SheetsConfig,
        clear_policy: ClearPolicy,
    ) -> Result<Self, DomainError> {
        let client = match &sheets.url {
            Some(url) => Some(SpreadsheetClient::new(url.clone())?),
            None => {
                tracing::warn!("SHEETS_URL not set, spreadsheet sync disabled");
                None
            }
        };
        Ok(Self::new(repo, client, sheets, clear_policy))
    }

    fn target(&self, domain: SyncDomain) -> Result<(&SpreadsheetClient, &str), DomainError> {
        let client = self.client.as_ref().ok_or_else(|| {
            DomainError::Configuration("Spreadsheet URL not configured.".to_string())
        })?;
        let sheet_id = domain.sheet_id(&self.sheets);
        if sheet_id.is_empty() {
            return Err(DomainError::Configuration(format!(
                "No spreadsheet configured for {}.",
                domain
            )));
        }
        Ok((client, sheet_id))
    }

    /// Replace the local collections of `domain` with the sheet contents.
    ///
    /// Nothing is written when the fetch fails or the sheet is empty.
    pub async fn sync_down(&self, domain: SyncDomain) -> Result<SyncReport, DomainError> {
        let (client, sheet_id) = self.target(domain)?;
        tracing::info!("Sync down: {}", domain);

        let sheet = client.fetch_sheet(sheet_id).await?;
        if sheet.rows.is_empty() {
            tracing::info!("Sync down: no {} data in the spreadsheet", domain.entity());
            return Ok(SyncReport {
                domain,
                direction: SyncDirection::Down,
                status: SyncStatus::NoData,
                count: 0,
                message: format!("No {} data found in the spreadsheet.", domain.entity()),
            });
        }

        let count = sheet.rows.len();
        let batch = match domain {
            SyncDomain::Users => {
                let users: Vec<User> = sheet.rows.iter().map(user_from_row).collect();
                SaveBatch::new()
                    .with(Collection::Users, &users)?
                    .with::<UserChange>(UserSnapshot::LOG, &[])?
            }
            SyncDomain::Assets => {
                let assets: Vec<Asset> = sheet.rows.iter().map(asset_from_row).collect();
                SaveBatch::new()
                    .with(Collection::Assets, &assets)?
                    .with::<AssetChange>(AssetSnapshot::LOG, &[])?
            }
            SyncDomain::Loans => {
                let (active, history) = split_loans(&sheet.rows);
                tracing::debug!(
                    "Sync down: {} active loan(s), {} returned",
                    active.len(),
                    history.len()
                );
                SaveBatch::new()
                    .with(Collection::ActiveLoans, &active)?
                    .with(Collection::LoanHistory, &history)?
                    .with::<LoanChange>(LoanSnapshot::LOG, &[])?
            }
        };
        self.repo.save_batch(batch).await?;

        tracing::info!("Sync down: {} {} row(s) stored", count, domain);
        Ok(SyncReport {
            domain,
            direction: SyncDirection::Down,
            status: SyncStatus::Synced,
            count,
            message: format!("Synced {} {} from the spreadsheet.", count, domain),
        })
    }

    /// Push the pending change records of `domain` in one request.
    pub async fn sync_up(&self, domain: SyncDomain) -> Result<SyncReport, DomainError> {
        match domain {
            SyncDomain::Users => self.push(domain, user_descriptor).await,
            SyncDomain::Assets => self.push(domain, asset_descriptor).await,
            SyncDomain::Loans => self.push(domain, loan_descriptor).await,
        }
    }

    async fn push<S, D, F>(&self, domain: SyncDomain, describe: F) -> Result<SyncReport, DomainError>
    where
        S: Snapshot,
        D: Serialize,
        F: Fn(&ChangeRecord<S>) -> D,
    {
        let (client, sheet_id) = self.target(domain)?;
        let tracker = ChangeTracker::<S>::new(&self.repo);

        let pending = tracker.pending().await?;
        if pending.is_empty() {
            tracing::info!("Sync up: no pending {} changes", S::ENTITY);
            return Ok(SyncReport {
                domain,
                direction: SyncDirection::Up,
                status: SyncStatus::NothingPending,
                count: 0,
                message: format!("No pending {} changes.", S::ENTITY),
            });
        }

        let descriptors: Vec<D> = pending.iter().map(describe).collect();
        let ids: Vec<String> = pending.iter().map(|c| c.id.clone()).collect();
        tracing::info!("Sync up: pushing {} {} change(s)", ids.len(), S::ENTITY);

        let pushed = client
            .push_changes(sheet_id, domain.action(), &descriptors)
            .await;

        match (&pushed, self.clear_policy) {
            (Err(e), ClearPolicy::OnSuccess) => {
                tracing::warn!(
                    "Sync up failed, keeping {} {} change(s) pending: {}",
                    ids.len(),
                    S::ENTITY,
                    e
                );
            }
            (result, _) => {
                if result.is_err() {
                    tracing::warn!(
                        "Sync up failed, discarding {} {} change(s)",
                        ids.len(),
                        S::ENTITY
                    );
                }
                tracker.mark_synced(&ids).await?;
                tracker.clear().await?;
            }
        }

        let message = pushed?;
        Ok(SyncReport {
            domain,
            direction: SyncDirection::Up,
            status: SyncStatus::Synced,
            count: ids.len(),
            message,
        })
    }
}
