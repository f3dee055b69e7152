use serde::{Deserialize, Serialize};

use crate::utils::parse_leading_int;

/// A loanable catalog item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub title: String,
    /// Free-form category ("Libro", "DVD", ...)
    #[serde(rename = "type")]
    pub asset_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_number: Option<String>,
    #[serde(default = "default_count")]
    pub volumes: u32,
    /// Total physical copies
    #[serde(default = "default_count")]
    pub copies: u32,
    #[serde(default)]
    pub is_loanable: bool,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub ibic_subjects: Vec<String>,
}

fn default_count() -> u32 {
    1
}

impl Asset {
    /// Empty asset with the given id and default counts
    pub fn blank(id: String) -> Self {
        Self {
            id,
            title: String::new(),
            asset_type: String::new(),
            description: String::new(),
            registration_number: None,
            signature: None,
            isbn: None,
            author: None,
            publisher: None,
            publication_place: None,
            edition: None,
            publication_year: None,
            collection_title: None,
            collection_number: None,
            volumes: 1,
            copies: 1,
            is_loanable: false,
            subjects: Vec::new(),
            ibic_subjects: Vec::new(),
        }
    }
}

/// Asset form as submitted by the UI.
///
/// Every field is optional: on create, missing fields take their defaults;
/// on update, missing fields keep the stored value. Counts arrive as the
/// raw form strings. An empty string clears an optional bibliographic field.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetForm {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub description: Option<String>,
    pub registration_number: Option<String>,
    pub signature: Option<String>,
    pub isbn: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub publication_place: Option<String>,
    pub edition: Option<String>,
    pub publication_year: Option<String>,
    pub collection_title: Option<String>,
    pub collection_number: Option<String>,
    pub volumes: Option<String>,
    pub copies: Option<String>,
    pub is_loanable: Option<bool>,
    pub subjects: Option<Vec<String>>,
    pub ibic_subjects: Option<Vec<String>>,
}

impl AssetForm {
    /// Apply the submitted fields onto `asset`, field by field.
    pub fn apply_to(self, asset: &mut Asset) {
        if let Some(title) = self.title {
            asset.title = title;
        }
        if let Some(asset_type) = self.asset_type {
            asset.asset_type = asset_type;
        }
        if let Some(description) = self.description {
            asset.description = description;
        }
        set_optional(&mut asset.registration_number, self.registration_number);
        set_optional(&mut asset.signature, self.signature);
        set_optional(&mut asset.isbn, self.isbn);
        set_optional(&mut asset.author, self.author);
        set_optional(&mut asset.publisher, self.publisher);
        set_optional(&mut asset.publication_place, self.publication_place);
        set_optional(&mut asset.edition, self.edition);
        set_optional(&mut asset.publication_year, self.publication_year);
        set_optional(&mut asset.collection_title, self.collection_title);
        set_optional(&mut asset.collection_number, self.collection_number);
        if let Some(volumes) = self.volumes {
            asset.volumes = parse_count(&volumes);
        }
        if let Some(copies) = self.copies {
            asset.copies = parse_count(&copies);
        }
        if let Some(is_loanable) = self.is_loanable {
            asset.is_loanable = is_loanable;
        }
        if let Some(subjects) = self.subjects {
            asset.subjects = subjects;
        }
        if let Some(ibic_subjects) = self.ibic_subjects {
            asset.ibic_subjects = ibic_subjects;
        }
    }
}

fn set_optional(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *slot = if value.is_empty() { None } else { Some(value) };
    }
}

/// Parse a form-submitted count.
///
/// Reads the leading integer like a lenient form parser ("3 vols" -> 3).
/// Anything unparsable, zero or negative becomes 1.
pub fn parse_count(raw: &str) -> u32 {
    match parse_leading_int(raw) {
        Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count_defaults_to_one() {
        assert_eq!(parse_count("3"), 3);
        assert_eq!(parse_count(" 12 "), 12);
        assert_eq!(parse_count("4 tomos"), 4);
        assert_eq!(parse_count(""), 1);
        assert_eq!(parse_count("abc"), 1);
        assert_eq!(parse_count("0"), 1);
        assert_eq!(parse_count("-2"), 1);
    }

    #[test]
    fn form_update_keeps_missing_fields() {
        let mut asset = Asset::blank("a-1".into());
        asset.title = "Old".into();
        asset.isbn = Some("978".into());
        asset.copies = 3;

        AssetForm {
            title: Some("New".into()),
            isbn: Some(String::new()),
            ..Default::default()
        }
        .apply_to(&mut asset);

        assert_eq!(asset.title, "New");
        assert_eq!(asset.isbn, None);
        assert_eq!(asset.copies, 3);
    }

    #[test]
    fn stored_json_is_camel_case() {
        let mut asset = Asset::blank("a-1".into());
        asset.is_loanable = true;
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["isLoanable"], true);
        assert_eq!(json["type"], "");
        assert!(json.get("isbn").is_none());
    }
}
