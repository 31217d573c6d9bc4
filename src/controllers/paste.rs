use chrono::{Duration, Utc};

use crate::models::{Paste, PasteSummary, DEFAULT_LANGUAGE};
use crate::types::api::CreatePaste;
use crate::{ids, ApiError, App};

pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_LANGUAGE_LENGTH: usize = 50;

/// A century, well inside what `chrono` can represent.
pub const MAX_EXPIRES_IN_MINUTES: i64 = 60 * 24 * 365 * 100;

pub const DEFAULT_LIST_LIMIT: i64 = 10;
pub const MAX_LIST_LIMIT: i64 = 100;

pub async fn create(app: &App, request: CreatePaste) -> crate::ApiResult<Paste> {
    let content = request
        .content
        .ok_or_else(|| ApiError::InvalidInput("content is required".into()))?;

    if let Some(title) = &request.title {
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(ApiError::InvalidInput(format!(
                "title must be at most {MAX_TITLE_LENGTH} characters"
            )));
        }
    }

    let language = request
        .language
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned());
    if language.chars().count() > MAX_LANGUAGE_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "language must be at most {MAX_LANGUAGE_LENGTH} characters"
        )));
    }

    if let Some(minutes) = request.expires_in {
        if minutes.abs() > MAX_EXPIRES_IN_MINUTES {
            return Err(ApiError::InvalidInput(format!(
                "expires_in must be within {MAX_EXPIRES_IN_MINUTES} minutes"
            )));
        }
    }

    let created_at = Utc::now();
    // zero means "never", same as leaving it out
    let expires_at = match request.expires_in {
        Some(0) | None => None,
        Some(minutes) => Some(created_at + Duration::minutes(minutes)),
    };

    let paste = Paste {
        id: ids::generate_unique_id(&app.database, app.config.limits.id_length).await?,
        title: request.title,
        content,
        language,
        created_at,
        expires_at,
        views: 0,
        secret_key: ids::generate_secret_key(),
    };

    app.database.insert_paste(&paste).await?;

    Ok(paste)
}

pub async fn view(app: &App, id: &str) -> crate::ApiResult<Paste> {
    app.database.view_paste(id, Utc::now()).await
}

pub async fn list(app: &App, limit: Option<i64>) -> crate::ApiResult<Vec<PasteSummary>> {
    let limit = limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let now = Utc::now();
    app.database.purge_expired(now).await?;
    app.database.list_pastes(now, limit).await
}

pub async fn delete(app: &App, id: &str, secret_key: &str) -> crate::ApiResult<()> {
    app.database
        .delete_paste_with_key(id, secret_key, Utc::now())
        .await
}

/// Delete every expired paste, returning how many were removed.
pub async fn purge_expired(app: &App) -> crate::ApiResult<u64> {
    app.database.purge_expired(Utc::now()).await
}
