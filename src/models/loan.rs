use serde::{Deserialize, Serialize};

/// An open borrowing record. Title and name are snapshots taken at borrow time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveLoan {
    pub id: String,
    pub asset_id: String,
    pub asset_title: String,
    pub user_id: String,
    pub user_name: String,
    /// ISO-8601
    pub borrow_date: String,
}

/// A closed loan. Created once per return, never modified afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanHistoryRecord {
    pub id: String,
    pub asset_id: String,
    pub asset_title: String,
    pub user_id: String,
    pub user_name: String,
    pub borrow_date: String,
    pub return_date: String,
}

impl ActiveLoan {
    /// Close the loan with the caller-supplied return date
    pub fn close(self, return_date: String) -> LoanHistoryRecord {
        LoanHistoryRecord {
            id: self.id,
            asset_id: self.asset_id,
            asset_title: self.asset_title,
            user_id: self.user_id,
            user_name: self.user_name,
            borrow_date: self.borrow_date,
            return_date,
        }
    }
}

/// Borrow request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub asset_id: String,
    pub user_id: String,
}

/// Return request; the date may be back-dated by the librarian
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub return_date: String,
}
