use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

pub const DEFAULT_LANGUAGE: &str = "plaintext";

/// A stored paste, including its secret key.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Paste {
    pub id: String,
    pub title: Option<String>,
    pub content: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub views: i64,
    pub secret_key: String,
}

impl Paste {
    pub fn is_expired(&self, now: &DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= *now)
    }
}

/// Listing row for the public index.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PasteSummary {
    pub id: String,
    pub title: Option<String>,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub views: i64,
}

/// Listing row for the admin panel.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdminPasteSummary {
    pub id: String,
    pub title: Option<String>,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub views: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SiteStats {
    pub id: i64,
    pub visit_count: i64,
}
