use chrono::Utc;

use crate::types::api::VisitStats;
use crate::App;

/// Current visit count, plus how many live pastes there are.
pub async fn get_count(app: &App) -> crate::ApiResult<VisitStats> {
    let stats = app.database.get_site_stats().await?;
    let paste_count = app.database.count_live_pastes(Utc::now()).await?;
    Ok(VisitStats {
        visit_count: stats.visit_count,
        paste_count,
    })
}

/// Record one visit.
pub async fn increment(app: &App) -> crate::ApiResult<VisitStats> {
    let visit_count = app.database.increment_visits().await?;
    let paste_count = app.database.count_live_pastes(Utc::now()).await?;
    Ok(VisitStats {
        visit_count,
        paste_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::paste;
    use crate::types::api::CreatePaste;

    #[tokio::test]
    async fn counter_starts_at_zero_and_counts_increments() {
        let (app, _dir) = crate::tests::test_app().await;

        assert_eq!(get_count(&app).await.unwrap().visit_count, 0);
        for expected in 1..=3 {
            assert_eq!(increment(&app).await.unwrap().visit_count, expected);
        }
        assert_eq!(get_count(&app).await.unwrap().visit_count, 3);
        assert_eq!(get_count(&app).await.unwrap(), get_count(&app).await.unwrap());
    }

    #[tokio::test]
    async fn paste_count_ignores_expired() {
        let (app, _dir) = crate::tests::test_app().await;
        for expires_in in [None, Some(60), Some(-1)] {
            paste::create(
                &app,
                CreatePaste {
                    content: Some("x".into()),
                    expires_in,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let stats = increment(&app).await.unwrap();
        assert_eq!(stats.visit_count, 1);
        assert_eq!(stats.paste_count, 2);
    }
}
