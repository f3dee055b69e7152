//! Spreadsheet rows to entities, change records to push descriptors
//!
//! Blank cells fall back to the entity defaults. List fields travel as a
//! `", "`-joined string, flags as `"true"`/`"false"`.

use serde::Serialize;

use super::spreadsheet::SheetRow;
use crate::models::asset::parse_count;
use crate::models::{
    ActiveLoan, Asset, AssetChange, ChangeType, LoanChange, LoanHistoryRecord, User, UserChange,
    UserType,
};

pub const DEFAULT_ASSET_TYPE: &str = "Libro";

fn cell<'a>(row: &'a SheetRow, column: &str) -> &'a str {
    row.get(column).map(|v| v.trim()).unwrap_or_default()
}

fn optional_cell(row: &SheetRow, column: &str) -> Option<String> {
    Some(cell(row, column))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn id_or_new(row: &SheetRow) -> String {
    optional_cell(row, "id").unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|s| s.trim().to_string()).collect()
}

pub fn user_from_row(row: &SheetRow) -> User {
    let raw_type = cell(row, "type");
    let user_type = if raw_type.is_empty() {
        UserType::default()
    } else {
        raw_type.parse().unwrap_or_else(|e| {
            tracing::warn!("{} in user sheet, using {}", e, UserType::default());
            UserType::default()
        })
    };

    User {
        id: id_or_new(row),
        user_code: cell(row, "userCode").to_string(),
        name: cell(row, "name").to_string(),
        last_name: cell(row, "lastName").to_string(),
        user_type,
        grade: optional_cell(row, "grade"),
    }
}

pub fn asset_from_row(row: &SheetRow) -> Asset {
    Asset {
        id: id_or_new(row),
        title: cell(row, "title").to_string(),
        asset_type: optional_cell(row, "type").unwrap_or_else(|| DEFAULT_ASSET_TYPE.to_string()),
        description: cell(row, "description").to_string(),
        registration_number: optional_cell(row, "registrationNumber"),
        signature: optional_cell(row, "signature"),
        isbn: optional_cell(row, "isbn"),
        author: optional_cell(row, "author"),
        publisher: optional_cell(row, "publisher"),
        publication_place: optional_cell(row, "publicationPlace"),
        edition: optional_cell(row, "edition"),
        publication_year: optional_cell(row, "publicationYear"),
        collection_title: optional_cell(row, "collectionTitle"),
        collection_number: optional_cell(row, "collectionNumber"),
        volumes: parse_count(cell(row, "volumes")),
        copies: parse_count(cell(row, "copies")),
        is_loanable: cell(row, "isLoanable").eq_ignore_ascii_case("true"),
        subjects: split_list(cell(row, "subjects")),
        ibic_subjects: split_list(cell(row, "ibicSubjects")),
    }
}

/// A loan row is active until the sheet records a return date
#[derive(Debug, Clone, PartialEq)]
pub enum SheetLoan {
    Active(ActiveLoan),
    Closed(LoanHistoryRecord),
}

pub fn loan_from_row(row: &SheetRow) -> SheetLoan {
    let loan = ActiveLoan {
        id: id_or_new(row),
        asset_id: cell(row, "assetId").to_string(),
        asset_title: cell(row, "assetTitle").to_string(),
        user_id: cell(row, "userId").to_string(),
        user_name: cell(row, "userName").to_string(),
        borrow_date: cell(row, "borrowDate").to_string(),
    };

    match optional_cell(row, "returnDate") {
        Some(return_date) => SheetLoan::Closed(loan.close(return_date)),
        None => SheetLoan::Active(loan),
    }
}

/// Split loan rows into the active set and the history
pub fn split_loans(rows: &[SheetRow]) -> (Vec<ActiveLoan>, Vec<LoanHistoryRecord>) {
    let mut active = Vec::new();
    let mut history = Vec::new();
    for row in rows {
        match loan_from_row(row) {
            SheetLoan::Active(loan) => active.push(loan),
            SheetLoan::Closed(record) => history.push(record),
        }
    }
    (active, history)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: String,
    pub user_code: String,
    pub name: String,
    pub last_name: String,
    #[serde(rename = "type")]
    pub user_type: String,
    pub grade: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDescriptor {
    pub change_type: ChangeType,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<UserData>,
}

pub fn user_descriptor(change: &UserChange) -> UserDescriptor {
    UserDescriptor {
        change_type: change.change_type,
        user_id: change.entity_id.clone(),
        user_data: change.new_data.as_ref().map(|data| UserData {
            id: change.entity_id.clone(),
            user_code: data.user_code.clone().unwrap_or_default(),
            name: data.name.clone().unwrap_or_default(),
            last_name: data.last_name.clone().unwrap_or_default(),
            user_type: data.user_type.clone().unwrap_or_default(),
            grade: data.grade.clone().unwrap_or_default(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetData {
    pub id: String,
    pub title: String,
    pub description: String,
    pub isbn: String,
    pub author: String,
    pub publisher: String,
    pub publication_place: String,
    pub edition: String,
    pub publication_year: String,
    pub collection_title: String,
    pub collection_number: String,
    pub subjects: String,
    pub ibic_subjects: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub registration_number: String,
    pub signature: String,
    pub volumes: String,
    pub copies: String,
    pub is_loanable: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    pub change_type: ChangeType,
    pub asset_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_data: Option<AssetData>,
}

pub fn asset_descriptor(change: &AssetChange) -> AssetDescriptor {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let list = |v: &Option<Vec<String>>| v.as_ref().map(|l| l.join(", ")).unwrap_or_default();

    AssetDescriptor {
        change_type: change.change_type,
        asset_id: change.entity_id.clone(),
        asset_data: change.new_data.as_ref().map(|data| AssetData {
            id: change.entity_id.clone(),
            title: text(&data.title),
            description: text(&data.description),
            isbn: text(&data.isbn),
            author: text(&data.author),
            publisher: text(&data.publisher),
            publication_place: text(&data.publication_place),
            edition: text(&data.edition),
            publication_year: text(&data.publication_year),
            collection_title: text(&data.collection_title),
            collection_number: text(&data.collection_number),
            subjects: list(&data.subjects),
            ibic_subjects: list(&data.ibic_subjects),
            asset_type: text(&data.asset_type),
            registration_number: text(&data.registration_number),
            signature: text(&data.signature),
            volumes: text(&data.volumes),
            copies: text(&data.copies),
            is_loanable: data.is_loanable.unwrap_or(false).to_string(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanData {
    pub id: String,
    pub asset_id: String,
    pub asset_title: String,
    pub user_id: String,
    pub user_name: String,
    pub borrow_date: String,
    /// Empty while the loan is active
    pub return_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanDescriptor {
    pub change_type: ChangeType,
    pub loan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_data: Option<LoanData>,
}

pub fn loan_descriptor(change: &LoanChange) -> LoanDescriptor {
    LoanDescriptor {
        change_type: change.change_type,
        loan_id: change.entity_id.clone(),
        loan_data: change.new_data.as_ref().map(|data| LoanData {
            id: change.entity_id.clone(),
            asset_id: data.asset_id.clone(),
            asset_title: data.asset_title.clone(),
            user_id: data.user_id.clone(),
            user_name: data.user_name.clone(),
            borrow_date: data.borrow_date.clone(),
            return_date: data.return_date.clone().unwrap_or_default(),
        }),
    }
}
