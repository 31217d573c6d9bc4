use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{PasteSort, SortOrder};
use crate::models::Paste;

#[derive(Debug, Default, Deserialize)]
pub struct CreatePaste {
    pub title: Option<String>,
    pub content: Option<String>,
    pub language: Option<String>,
    /// Minutes until the paste expires.
    pub expires_in: Option<i64>,
}

/// Response to a successful create, the only place the secret key is shown.
#[derive(Debug, Serialize)]
pub struct CreatedPaste {
    pub id: String,
    pub title: Option<String>,
    pub secret_key: String,
    pub content: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub views: i64,
}

impl From<Paste> for CreatedPaste {
    fn from(paste: Paste) -> Self {
        CreatedPaste {
            id: paste.id,
            title: paste.title,
            secret_key: paste.secret_key,
            content: paste.content,
            language: paste.language,
            created_at: paste.created_at,
            expires_at: paste.expires_at,
            views: paste.views,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicPaste {
    pub id: String,
    pub title: Option<String>,
    pub content: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub views: i64,
}

impl From<Paste> for PublicPaste {
    fn from(paste: Paste) -> Self {
        PublicPaste {
            id: paste.id,
            title: paste.title,
            content: paste.content,
            language: paste.language,
            created_at: paste.created_at,
            expires_at: paste.expires_at,
            views: paste.views,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub secret_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisitStats {
    pub visit_count: i64,
    pub paste_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct AdminLogin {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminListParams {
    pub search: Option<String>,
    #[serde(default)]
    pub sort: PasteSort,
    #[serde(default)]
    pub order: SortOrder,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

