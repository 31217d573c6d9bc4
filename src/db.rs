use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;

use crate::models::{AdminPasteSummary, Paste, PasteSummary, SiteStats};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS paste (
        id TEXT PRIMARY KEY NOT NULL,
        title TEXT,
        content TEXT NOT NULL,
        language TEXT NOT NULL DEFAULT 'plaintext',
        created_at DATETIME NOT NULL,
        expires_at DATETIME,
        views INTEGER NOT NULL DEFAULT 0,
        secret_key TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS paste_created_at ON paste (created_at)",
    "CREATE INDEX IF NOT EXISTS paste_expires_at ON paste (expires_at)",
    "CREATE TABLE IF NOT EXISTS site_stats (
        id INTEGER PRIMARY KEY NOT NULL,
        visit_count INTEGER NOT NULL DEFAULT 0
    )",
];

const PASTE_COLUMNS: &str = "id, title, content, language, created_at, expires_at, views, secret_key";

/// Row id of the singleton stats record.
const SITE_STATS_ID: i64 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasteSort {
    #[default]
    CreatedAt,
    Views,
    ExpiresAt,
}

impl PasteSort {
    fn column(self) -> &'static str {
        match self {
            PasteSort::CreatedAt => "created_at",
            PasteSort::Views => "views",
            PasteSort::ExpiresAt => "expires_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filter and ordering for the admin paste listing.
#[derive(Debug, Clone, Default)]
pub struct PasteSearch {
    pub search: Option<String>,
    pub sort: PasteSort,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    /// Connect to a database by URL.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Create the tables if they don't exist yet.
    pub async fn migrate(&self) -> crate::ApiResult<()> {
        let mut conn = self.pool.acquire().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut conn).await?;
        }
        Ok(())
    }

    /// Check whether a paste id is taken.
    pub async fn paste_exists(&self, id: &str) -> crate::ApiResult<bool> {
        let mut conn = self.pool.acquire().await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM paste WHERE id = ?")
            .bind(id)
            .fetch_one(&mut conn)
            .await?;
        Ok(count > 0)
    }

    /// Insert a paste.
    pub async fn insert_paste(&self, paste: &Paste) -> crate::ApiResult<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(
            "INSERT INTO paste (id, title, content, language, created_at, expires_at, views, \
             secret_key) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&paste.id)
        .bind(&paste.title)
        .bind(&paste.content)
        .bind(&paste.language)
        .bind(paste.created_at)
        .bind(paste.expires_at)
        .bind(paste.views)
        .bind(&paste.secret_key)
        .execute(&mut conn)
        .await?;
        Ok(())
    }

    /// Get a paste by id without touching its view count.
    pub async fn get_paste(&self, id: &str) -> crate::ApiResult<Paste> {
        let mut conn = self.pool.acquire().await?;
        let paste = sqlx::query_as::<_, Paste>(&format!(
            "SELECT {PASTE_COLUMNS} FROM paste WHERE id = ?"
        ))
        .bind(id)
        .fetch_one(&mut conn)
        .await?;
        Ok(paste)
    }

    /// Count a view of a paste and return it, or drop it if it has expired.
    ///
    /// The increment is issued first so the transaction holds the write lock
    /// from the start.
    pub async fn view_paste(&self, id: &str, now: DateTime<Utc>) -> crate::ApiResult<Paste> {
        let mut tx = self.pool.begin().await?;

        let paste = sqlx::query_as::<_, Paste>(&format!(
            "UPDATE paste SET views = views + 1 WHERE id = ? RETURNING {PASTE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(paste) = paste else {
            return Err(crate::ApiError::NotFound);
        };

        if paste.is_expired(&now) {
            sqlx::query("DELETE FROM paste WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Err(crate::ApiError::NotFound);
        }

        tx.commit().await?;
        Ok(paste)
    }

    /// Delete a paste if the secret key matches.
    ///
    /// Like `view_paste`, the first statement is a write, so the whole check
    /// runs under the write lock.
    pub async fn delete_paste_with_key(
        &self,
        id: &str,
        secret_key: &str,
        now: DateTime<Utc>,
    ) -> crate::ApiResult<()> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM paste WHERE id = ? AND secret_key = ? AND (expires_at IS NULL OR \
             expires_at > ?)",
        )
        .bind(id)
        .bind(secret_key)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted > 0 {
            tx.commit().await?;
            return Ok(());
        }

        // nothing matched, so work out why
        let expired = sqlx::query("DELETE FROM paste WHERE id = ? AND expires_at <= ?")
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM paste WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if expired > 0 || exists == 0 {
            Err(crate::ApiError::NotFound)
        } else {
            Err(crate::ApiError::Forbidden)
        }
    }

    /// Delete a paste by id unconditionally.
    pub async fn delete_paste(&self, id: &str) -> crate::ApiResult<()> {
        let mut conn = self.pool.acquire().await?;
        let deleted = sqlx::query("DELETE FROM paste WHERE id = ?")
            .bind(id)
            .execute(&mut conn)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(crate::ApiError::NotFound);
        }
        Ok(())
    }

    /// Delete every paste that expired at or before `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> crate::ApiResult<u64> {
        let mut conn = self.pool.acquire().await?;
        let result =
            sqlx::query("DELETE FROM paste WHERE expires_at IS NOT NULL AND expires_at <= ?")
                .bind(now)
                .execute(&mut conn)
                .await?;
        Ok(result.rows_affected())
    }

    /// Get the most recently created live pastes.
    pub async fn list_pastes(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> crate::ApiResult<Vec<PasteSummary>> {
        let mut conn = self.pool.acquire().await?;
        let pastes = sqlx::query_as::<_, PasteSummary>(
            "SELECT id, title, language, created_at, views FROM paste WHERE expires_at IS NULL OR \
             expires_at > ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&mut conn)
        .await?;
        Ok(pastes)
    }

    /// Search all pastes, expired ones included.
    pub async fn search_pastes(
        &self,
        search: &PasteSearch,
    ) -> crate::ApiResult<Vec<AdminPasteSummary>> {
        let pattern = search
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let filter = if pattern.is_some() {
            "WHERE id LIKE ? ESCAPE '\\' OR title LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\'"
        } else {
            ""
        };
        let sql = format!(
            "SELECT id, title, language, created_at, views, expires_at FROM paste {filter} ORDER \
             BY {column} {order} LIMIT ? OFFSET ?",
            column = search.sort.column(),
            order = search.order.keyword(),
        );

        let mut query = sqlx::query_as::<_, AdminPasteSummary>(&sql);
        if let Some(pattern) = &pattern {
            query = query.bind(pattern).bind(pattern).bind(pattern);
        }

        let mut conn = self.pool.acquire().await?;
        let pastes = query
            .bind(search.limit)
            .bind(search.offset)
            .fetch_all(&mut conn)
            .await?;
        Ok(pastes)
    }

    /// Count pastes that have not expired.
    pub async fn count_live_pastes(&self, now: DateTime<Utc>) -> crate::ApiResult<i64> {
        let mut conn = self.pool.acquire().await?;
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM paste WHERE expires_at IS NULL OR expires_at > ?",
        )
        .bind(now)
        .fetch_one(&mut conn)
        .await?;
        Ok(count)
    }

    /// Get the stats row, creating it on first use.
    pub async fn get_site_stats(&self) -> crate::ApiResult<SiteStats> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("INSERT INTO site_stats (id, visit_count) VALUES (?, 0) ON CONFLICT (id) DO NOTHING")
            .bind(SITE_STATS_ID)
            .execute(&mut conn)
            .await?;
        let stats =
            sqlx::query_as::<_, SiteStats>("SELECT id, visit_count FROM site_stats WHERE id = ?")
                .bind(SITE_STATS_ID)
                .fetch_one(&mut conn)
                .await?;
        Ok(stats)
    }

    /// Add one to the visit count and return the new value.
    pub async fn increment_visits(&self) -> crate::ApiResult<i64> {
        let mut conn = self.pool.acquire().await?;
        let count = sqlx::query_scalar::<_, i64>(
            "INSERT INTO site_stats (id, visit_count) VALUES (?, 1) ON CONFLICT (id) DO UPDATE \
             SET visit_count = site_stats.visit_count + 1 RETURNING visit_count",
        )
        .bind(SITE_STATS_ID)
        .fetch_one(&mut conn)
        .await?;
        Ok(count)
    }
}

fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
