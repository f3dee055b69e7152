use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::domain::DomainError;

/// What happens to the pushed change records when a sync-up fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClearPolicy {
    /// Mark synced and clear the log whatever the outcome of the push
    #[default]
    Always,
    /// Only mark and clear after the spreadsheet accepted the batch
    OnSuccess,
}

impl FromStr for ClearPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always" => Ok(ClearPolicy::Always),
            "on_success" | "on-success" => Ok(ClearPolicy::OnSuccess),
            other => Err(format!("Unknown sync clear policy '{}'", other)),
        }
    }
}

/// Spreadsheet web app endpoint and the sheet backing each domain
#[derive(Clone, Debug, Default)]
pub struct SheetsConfig {
    pub url: Option<String>,
    pub users_sheet_id: String,
    pub assets_sheet_id: String,
    pub loans_sheet_id: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub profile: String,
    /// Path or http(s) URL of the JSON holding `userCodePrefix`
    pub library_config_source: String,
    pub sheets: SheetsConfig,
    pub clear_policy: ClearPolicy,
    pub enforce_copy_limit: bool,
    pub seed_demo: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = lookup("PROFILE").unwrap_or_else(|| "default".to_string());

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| {
            if profile == "default" {
                "sqlite://bibliolend.db?mode=rwc".to_string()
            } else {
                format!("sqlite://bibliolend_{}.db?mode=rwc", profile)
            }
        });

        let clear_policy = match lookup("SYNC_CLEAR_POLICY") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, falling back to 'always'", e);
                ClearPolicy::Always
            }),
            None => ClearPolicy::Always,
        };

        Self {
            database_url,
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default(),
            library_config_source: lookup("LIBRARY_CONFIG")
                .unwrap_or_else(|| "config.json".to_string()),
            sheets: SheetsConfig {
                url: lookup("SHEETS_URL").filter(|s| !s.is_empty()),
                users_sheet_id: lookup("SHEETS_USERS_ID").unwrap_or_default(),
                assets_sheet_id: lookup("SHEETS_ASSETS_ID").unwrap_or_default(),
                loans_sheet_id: lookup("SHEETS_LOANS_ID").unwrap_or_default(),
            },
            clear_policy,
            enforce_copy_limit: lookup("ENFORCE_COPY_LIMIT")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            seed_demo: lookup("SEED_DEMO").is_some(),
            profile,
        }
    }
}

/// Library settings fetched once at startup and injected where needed.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryConfig {
    #[serde(default)]
    pub user_code_prefix: String,
}

impl LibraryConfig {
    pub const FALLBACK_PREFIX: &'static str = "XX";

    pub fn fallback() -> Self {
        Self {
            user_code_prefix: Self::FALLBACK_PREFIX.to_string(),
        }
    }

    /// Read the config document from a local path or an http(s) URL.
    pub async fn load(source: &str) -> Result<Self, DomainError> {
        let body = if source.starts_with("http://") || source.starts_with("https://") {
            let resp = reqwest::get(source).await?;
            if !resp.status().is_success() {
                return Err(DomainError::Configuration(format!(
                    "Failed to load config: {}",
                    resp.status()
                )));
            }
            resp.text().await?
        } else {
            tokio::fs::read_to_string(source).await.map_err(|e| {
                DomainError::Configuration(format!("Failed to read {}: {}", source, e))
            })?
        };

        serde_json::from_str(&body)
            .map_err(|e| DomainError::Configuration(format!("Invalid config document: {}", e)))
    }

    /// `load`, downgraded to the fixed fallback prefix on any failure
    pub async fn load_or_fallback(source: &str) -> Self {
        match Self::load(source).await {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("{} - using default user code prefix", e);
                Self::fallback()
            }
        }
    }
}
