use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Borrower category. Stored with the labels the spreadsheet uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserType {
    #[default]
    #[serde(rename = "Estudiante", alias = "Student")]
    Student,
    #[serde(rename = "Profesor", alias = "Teacher")]
    Teacher,
    #[serde(rename = "Personal", alias = "Staff")]
    Staff,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Student => "Estudiante",
            UserType::Teacher => "Profesor",
            UserType::Staff => "Personal",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "estudiante" | "student" => Ok(UserType::Student),
            "profesor" | "teacher" => Ok(UserType::Teacher),
            "personal" | "staff" => Ok(UserType::Staff),
            other => Err(format!("Unknown user type '{}'", other)),
        }
    }
}

/// A borrower.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// `{prefix}-{4-digit sequence}`
    pub user_code: String,
    pub name: String,
    pub last_name: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

impl User {
    /// Display name snapshot used on loans
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.name)
    }
}

/// Input for creating a user
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub last_name: String,
    #[serde(rename = "type", default)]
    pub user_type: UserType,
    pub grade: Option<String>,
}

/// Input for updating a user; absent fields keep their stored value,
/// an empty `grade` clears it.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub last_name: Option<String>,
    #[serde(rename = "type")]
    pub user_type: Option<UserType>,
    pub grade: Option<String>,
}

impl UserPatch {
    pub fn apply_to(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(user_type) = self.user_type {
            user.user_type = user_type;
        }
        if let Some(grade) = self.grade {
            user.grade = if grade.is_empty() { None } else { Some(grade) };
        }
    }
}
