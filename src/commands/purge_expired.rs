use tracing::info;

use crate::controllers::paste;
use crate::App;

pub async fn run(app: App) -> anyhow::Result<()> {
    let count = paste::purge_expired(&app).await?;
    info!("deleted {count} expired pastes");
    Ok(())
}
