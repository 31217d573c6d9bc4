use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Json, Router};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tracing::{info, warn};

use crate::controllers::{paste, stats};
use crate::extract::{JsonBody, QueryParams};
use crate::models::PasteSummary;
use crate::types::api::{
    CreatePaste, CreatedPaste, DeleteParams, Health, ListParams, Message, PublicPaste, VisitStats,
};
use crate::{access_log, admin, ApiError, App};

pub async fn run(app: App) -> anyhow::Result<()> {
    let addr = app.config.socket_addr();

    if let Some(secs) = app.config.expiry.sweep_interval_secs.filter(|&s| s > 0) {
        spawn_sweeper(app.clone(), Duration::from_secs(secs));
    }

    let router = router(app)?;

    info!("listening on {addr}");
    axum::Server::bind(&addr)
        .serve(router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Build the full HTTP application.
pub fn router(app: App) -> anyhow::Result<Router> {
    let origins = app
        .config
        .cors
        .origins()
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .context("invalid CORS origin")?;

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    let max_upload_size = app.config.limits.max_upload_size;

    Ok(Router::new()
        .route("/api/health", get(health))
        .route("/api/pastes", get(list_pastes).post(create_paste))
        .route("/api/pastes/:id", get(get_paste).delete(delete_paste))
        .route("/api/stats/visits", get(get_visits).post(increment_visits))
        .nest("/admin", admin::router())
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(cors)
        .layer(access_log::layer())
        .with_state(app))
}

/// Periodically delete expired pastes. Ticks that fall behind are skipped so
/// only one sweep is ever in flight.
pub fn spawn_sweeper(app: App, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match paste::purge_expired(&app).await {
                Ok(0) => {}
                Ok(count) => info!("swept {count} expired pastes"),
                Err(err) => warn!("expiry sweep failed: {err}"),
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn health() -> Json<Health> {
    Json(Health { status: "healthy" })
}

async fn create_paste(
    State(app): State<App>,
    JsonBody(request): JsonBody<CreatePaste>,
) -> crate::ApiResult<Json<CreatedPaste>> {
    let paste = paste::create(&app, request).await?;

    info!(
        "new paste: id='{id}', language='{language}', size={size}",
        id = paste.id,
        language = paste.language,
        size = paste.content.len()
    );

    Ok(Json(paste.into()))
}

async fn get_paste(
    State(app): State<App>,
    Path(id): Path<String>,
) -> crate::ApiResult<Json<PublicPaste>> {
    Ok(Json(paste::view(&app, &id).await?.into()))
}

async fn list_pastes(
    State(app): State<App>,
    QueryParams(params): QueryParams<ListParams>,
) -> crate::ApiResult<Json<Vec<PasteSummary>>> {
    Ok(Json(paste::list(&app, params.limit).await?))
}

async fn delete_paste(
    State(app): State<App>,
    Path(id): Path<String>,
    QueryParams(params): QueryParams<DeleteParams>,
) -> crate::ApiResult<Json<Message>> {
    let secret_key = params.secret_key.ok_or(ApiError::MissingSecretKey)?;

    paste::delete(&app, &id, &secret_key).await?;
    info!("deleted paste: id='{id}'");

    Ok(Json(Message {
        message: "Paste deleted".into(),
    }))
}

async fn get_visits(State(app): State<App>) -> crate::ApiResult<Json<VisitStats>> {
    Ok(Json(stats::get_count(&app).await?))
}

async fn increment_visits(State(app): State<App>) -> crate::ApiResult<Json<VisitStats>> {
    Ok(Json(stats::increment(&app).await?))
}
