//! Catalog, borrower and history filters
//!
//! Pure functions over loaded collections. Text matching is
//! case-insensitive substring matching.

use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::models::{Asset, LoanHistoryRecord, User, UserType};
use crate::utils::marc::strip_marc_prefix;
use crate::utils::parse_timestamp;

#[derive(Debug, Default, Clone)]
pub struct AssetFilter {
    /// Matched against title and description
    pub query: Option<String>,
    /// Empty means every type
    pub types: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct UserFilter {
    /// Matched against "name lastName", "lastName, name" and the user code
    pub query: Option<String>,
    pub types: Vec<UserType>,
}

#[derive(Debug, Default, Clone)]
pub struct HistoryFilter {
    pub asset: Option<String>,
    pub user: Option<String>,
    /// Inclusive, on the borrow date
    pub from: Option<NaiveDate>,
    /// Inclusive, on the borrow date
    pub to: Option<NaiveDate>,
}

/// Lowercased needle, or `None` when the query is blank
fn needle(query: &Option<String>) -> Option<String> {
    query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

pub fn filter_assets(assets: &[Asset], filter: &AssetFilter) -> Vec<Asset> {
    let needle = needle(&filter.query);
    assets
        .iter()
        .filter(|a| {
            needle.as_deref().is_none_or(|n| {
                contains(strip_marc_prefix(&a.title, "title"), n)
                    || contains(strip_marc_prefix(&a.description, "description"), n)
            })
        })
        .filter(|a| filter.types.is_empty() || filter.types.contains(&a.asset_type))
        .cloned()
        .collect()
}

/// Distinct non-empty asset types, sorted
pub fn asset_types(assets: &[Asset]) -> Vec<String> {
    assets
        .iter()
        .map(|a| a.asset_type.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn filter_users(users: &[User], filter: &UserFilter) -> Vec<User> {
    let needle = needle(&filter.query);
    let mut matched: Vec<User> = users
        .iter()
        .filter(|u| {
            needle.as_deref().is_none_or(|n| {
                contains(&format!("{} {}", u.name, u.last_name), n)
                    || contains(&u.display_name(), n)
                    || contains(&u.user_code, n)
            })
        })
        .filter(|u| filter.types.is_empty() || filter.types.contains(&u.user_type))
        .cloned()
        .collect();

    matched.sort_by(|a, b| {
        a.last_name
            .to_lowercase()
            .cmp(&b.last_name.to_lowercase())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    matched
}

/// Filter history and order it newest borrow first.
///
/// Records whose borrow date cannot be read are dropped when a date bound
/// is set and sort last otherwise.
pub fn filter_history(history: &[LoanHistoryRecord], filter: &HistoryFilter) -> Vec<LoanHistoryRecord> {
    let asset = needle(&filter.asset);
    let user = needle(&filter.user);

    let mut matched: Vec<LoanHistoryRecord> = history
        .iter()
        .filter(|r| {
            asset
                .as_deref()
                .is_none_or(|n| contains(strip_marc_prefix(&r.asset_title, "title"), n))
        })
        .filter(|r| user.as_deref().is_none_or(|n| contains(&r.user_name, n)))
        .filter(|r| {
            if filter.from.is_none() && filter.to.is_none() {
                return true;
            }
            let Some(day) = parse_timestamp(&r.borrow_date).map(|t| t.date_naive()) else {
                return false;
            };
            filter.from.is_none_or(|from| day >= from) && filter.to.is_none_or(|to| day <= to)
        })
        .cloned()
        .collect();

    matched.sort_by(|a, b| newest_first(&a.borrow_date, &b.borrow_date));
    matched
}

fn newest_first(a: &str, b: &str) -> Ordering {
    parse_timestamp(b).cmp(&parse_timestamp(a))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: &str, title: &str, kind: &str, description: &str) -> Asset {
        let mut asset = Asset::blank(id.into());
        asset.title = title.into();
        asset.asset_type = kind.into();
        asset.description = description.into();
        asset
    }

    fn user(code: &str, name: &str, last_name: &str, user_type: UserType) -> User {
        User {
            id: code.to_lowercase(),
            user_code: code.into(),
            name: name.into(),
            last_name: last_name.into(),
            user_type,
            grade: None,
        }
    }

    fn record(id: &str, title: &str, who: &str, borrowed: &str) -> LoanHistoryRecord {
        LoanHistoryRecord {
            id: id.into(),
            asset_id: "a".into(),
            asset_title: title.into(),
            user_id: "u".into(),
            user_name: who.into(),
            borrow_date: borrowed.into(),
            return_date: "2024-12-31T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn assets_match_title_without_marc_tag() {
        let assets = vec![
            asset("1", "245-Rayuela", "Libro", ""),
            asset("2", "Mapa de Europa", "Mapa", "Político, 1:5.000.000"),
            asset("3", "Planeta azul", "DVD", "Documental"),
        ];

        let by_title = filter_assets(
            &assets,
            &AssetFilter {
                query: Some("RAYU".into()),
                ..Default::default()
            },
        );
        assert_eq!(by_title.len(), 1);

        // the tag itself is not searchable text
        assert!(
            filter_assets(
                &assets,
                &AssetFilter {
                    query: Some("245".into()),
                    ..Default::default()
                }
            )
            .is_empty()
        );

        let by_type = filter_assets(
            &assets,
            &AssetFilter {
                query: Some("  ".into()),
                types: vec!["DVD".into(), "Mapa".into()],
            },
        );
        let ids: Vec<&str> = by_type.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);

        assert_eq!(asset_types(&assets), vec!["DVD", "Libro", "Mapa"]);
    }

    #[test]
    fn users_match_either_name_order_and_sort_by_last_name() {
        let users = vec![
            user("LIB-0001", "Luis", "Gil", UserType::Teacher),
            user("LIB-0002", "Ana", "Ruiz", UserType::Student),
            user("LIB-0003", "Berta", "Gil", UserType::Student),
        ];

        let all = filter_users(&users, &UserFilter::default());
        let codes: Vec<&str> = all.iter().map(|u| u.user_code.as_str()).collect();
        assert_eq!(codes, vec!["LIB-0003", "LIB-0001", "LIB-0002"]);

        let forward = filter_users(
            &users,
            &UserFilter {
                query: Some("ana ruiz".into()),
                ..Default::default()
            },
        );
        let reversed = filter_users(
            &users,
            &UserFilter {
                query: Some("gil, lu".into()),
                ..Default::default()
            },
        );
        let by_code = filter_users(
            &users,
            &UserFilter {
                query: Some("0003".into()),
                types: vec![UserType::Student],
            },
        );
        assert_eq!(forward[0].user_code, "LIB-0002");
        assert_eq!(reversed[0].user_code, "LIB-0001");
        assert_eq!(by_code.len(), 1);
        assert_eq!(by_code[0].name, "Berta");
    }

    #[test]
    fn history_day_range_is_inclusive_and_newest_first() {
        let history = vec![
            record("1", "Momo", "Ruiz, Ana", "2024-03-01T08:00:00.000Z"),
            record("2", "Momo", "Gil, Luis", "2024-03-10T23:59:00.000Z"),
            record("3", "Rayuela", "Ruiz, Ana", "2024-03-05T12:00"),
            record("4", "Momo", "Ruiz, Ana", "not a date"),
        ];

        let all = filter_history(&history, &HistoryFilter::default());
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1", "4"]);

        let ranged = filter_history(
            &history,
            &HistoryFilter {
                from: NaiveDate::from_ymd_opt(2024, 3, 5),
                to: NaiveDate::from_ymd_opt(2024, 3, 10),
                ..Default::default()
            },
        );
        let ids: Vec<&str> = ranged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);

        let ana_momo = filter_history(
            &history,
            &HistoryFilter {
                asset: Some("momo".into()),
                user: Some("ana".into()),
                ..Default::default()
            },
        );
        let ids: Vec<&str> = ana_momo.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn history_title_tag_is_not_searchable() {
        let history = vec![
            record("1", "245-Rayuela", "Ruiz, Ana", "2024-03-01T08:00:00.000Z"),
            record("2", "Momo", "Gil, Luis", "2024-03-02T08:00:00.000Z"),
        ];

        let by_tag = filter_history(
            &history,
            &HistoryFilter {
                asset: Some("245".into()),
                ..Default::default()
            },
        );
        assert!(by_tag.is_empty());

        let by_title = filter_history(
            &history,
            &HistoryFilter {
                asset: Some("rayuela".into()),
                ..Default::default()
            },
        );
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].id, "1");
    }
}
