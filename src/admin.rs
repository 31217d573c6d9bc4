//! Administrative API, guarded by a session cookie.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts, Path, State};
use axum::headers::Cookie;
use axum::http::header;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router, TypedHeader};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::controllers::stats;
use crate::db::{Database, PasteSearch};
use crate::extract::{JsonBody, QueryParams};
use crate::models::{AdminPasteSummary, Paste};
use crate::types::api::{AdminListParams, AdminLogin, Message, VisitStats};
use crate::{ApiError, App};

pub const SESSION_COOKIE: &str = "pasty_admin";

pub const DEFAULT_ADMIN_LIMIT: i64 = 50;
pub const MAX_ADMIN_LIMIT: i64 = 500;

/// How long a login stays valid, also sent as the cookie's `Max-Age`.
pub const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Tokens of the admin sessions currently logged in, with their login time.
#[derive(Debug, Clone)]
pub struct AdminSessions {
    tokens: Arc<RwLock<HashMap<String, Instant>>>,
    ttl: Duration,
}

impl Default for AdminSessions {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl AdminSessions {
    pub fn with_ttl(ttl: Duration) -> Self {
        AdminSessions {
            tokens: Arc::default(),
            ttl,
        }
    }

    /// Start a session. Sessions past their lifetime are dropped first.
    pub async fn open(&self) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, opened| opened.elapsed() < self.ttl);
        tokens.insert(token.clone(), Instant::now());
        token
    }

    pub async fn is_open(&self, token: &str) -> bool {
        self.tokens
            .read()
            .await
            .get(token)
            .map_or(false, |opened| opened.elapsed() < self.ttl)
    }

    pub async fn close(&self, token: &str) -> bool {
        self.tokens.write().await.remove(token).is_some()
    }
}

/// Extractor that only succeeds for requests carrying a live admin session.
#[derive(Debug)]
pub struct AdminSession {
    token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    AdminSessions: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(cookies) = TypedHeader::<Cookie>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Unauthorized)?;
        let token = cookies.get(SESSION_COOKIE).ok_or(ApiError::Unauthorized)?;

        if AdminSessions::from_ref(state).is_open(token).await {
            Ok(AdminSession {
                token: token.to_owned(),
            })
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

pub fn router() -> Router<App> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/pastes", get(list_pastes))
        .route("/pastes/:id", get(get_paste).delete(delete_paste))
        .route("/stats", get(get_stats))
}

fn session_cookie(token: &str) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/admin; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_TTL.as_secs()
    )
}

async fn login(
    State(config): State<Config>,
    State(sessions): State<AdminSessions>,
    JsonBody(login): JsonBody<AdminLogin>,
) -> crate::ApiResult<impl IntoResponse> {
    if !config
        .admin
        .check_credentials(&login.username, &login.password)
    {
        warn!("failed admin login for '{}'", login.username);
        return Err(ApiError::Unauthorized);
    }

    let token = sessions.open().await;
    info!("admin logged in: '{}'", login.username);

    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(Message {
            message: "Logged in".into(),
        }),
    ))
}

async fn logout(
    session: AdminSession,
    State(sessions): State<AdminSessions>,
) -> impl IntoResponse {
    sessions.close(&session.token).await;
    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}=; Path=/admin; HttpOnly; SameSite=Lax; Max-Age=0"),
        )],
        Json(Message {
            message: "Logged out".into(),
        }),
    )
}

async fn list_pastes(
    _session: AdminSession,
    State(db): State<Database>,
    QueryParams(params): QueryParams<AdminListParams>,
) -> crate::ApiResult<Json<Vec<AdminPasteSummary>>> {
    let search = PasteSearch {
        search: params.search,
        sort: params.sort,
        order: params.order,
        limit: params
            .limit
            .unwrap_or(DEFAULT_ADMIN_LIMIT)
            .clamp(1, MAX_ADMIN_LIMIT),
        offset: params.offset.unwrap_or(0).max(0),
    };
    Ok(Json(db.search_pastes(&search).await?))
}

async fn get_paste(
    _session: AdminSession,
    State(db): State<Database>,
    Path(id): Path<String>,
) -> crate::ApiResult<Json<Paste>> {
    Ok(Json(db.get_paste(&id).await?))
}

async fn delete_paste(
    _session: AdminSession,
    State(db): State<Database>,
    Path(id): Path<String>,
) -> crate::ApiResult<Json<Message>> {
    db.delete_paste(&id).await?;
    info!("admin deleted paste: id='{id}'");
    Ok(Json(Message {
        message: "Paste deleted".into(),
    }))
}

async fn get_stats(
    _session: AdminSession,
    State(app): State<App>,
) -> crate::ApiResult<Json<VisitStats>> {
    Ok(Json(stats::get_count(&app).await?))
}
