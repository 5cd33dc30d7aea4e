use anyhow::Context;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::models::Record;
use crate::source::Dataset;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Upserts every record of `dataset`, keyed by date. Returns the number of
/// rows written.
pub async fn import_dataset(pool: &PgPool, dataset: &Dataset) -> anyhow::Result<usize> {
    let mut written = 0usize;
    let mut tx = pool.begin().await?;

    for record in dataset.records() {
        let active_users = i32::try_from(record.active_users)
            .with_context(|| format!("active_users on {} does not fit the schema", record.date))?;
        let videos_processed = i32::try_from(record.videos_processed).with_context(|| {
            format!("videos_processed on {} does not fit the schema", record.date)
        })?;

        let result = sqlx::query(
            r#"
            INSERT INTO engagement.daily_metrics
            (metric_date, active_users, session_duration_minutes, user_retention_percent,
             videos_processed, user_satisfaction_score, popular_theme, trending_topic,
             most_used_feature, user_location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (metric_date) DO UPDATE
            SET active_users = EXCLUDED.active_users,
                session_duration_minutes = EXCLUDED.session_duration_minutes,
                user_retention_percent = EXCLUDED.user_retention_percent,
                videos_processed = EXCLUDED.videos_processed,
                user_satisfaction_score = EXCLUDED.user_satisfaction_score,
                popular_theme = EXCLUDED.popular_theme,
                trending_topic = EXCLUDED.trending_topic,
                most_used_feature = EXCLUDED.most_used_feature,
                user_location = EXCLUDED.user_location,
                updated_at = now()
            "#,
        )
        .bind(record.date)
        .bind(active_users)
        .bind(record.session_duration_minutes)
        .bind(record.user_retention_percent)
        .bind(videos_processed)
        .bind(record.user_satisfaction_score)
        .bind(record.popular_theme.label())
        .bind(record.trending_topic.label())
        .bind(record.most_used_feature.label())
        .bind(record.user_location.label())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() > 0 {
            written += 1;
        }
    }

    tx.commit().await?;
    info!(written, "imported records");
    Ok(written)
}

pub async fn fetch_records(pool: &PgPool) -> anyhow::Result<Vec<Record>> {
    let rows = sqlx::query(
        "SELECT metric_date, active_users, session_duration_minutes, user_retention_percent, \
         videos_processed, user_satisfaction_score, popular_theme, trending_topic, \
         most_used_feature, user_location \
         FROM engagement.daily_metrics \
         ORDER BY metric_date",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let active_users: i32 = row.try_get("active_users")?;
        let videos_processed: i32 = row.try_get("videos_processed")?;
        let theme: String = row.try_get("popular_theme")?;
        let topic: String = row.try_get("trending_topic")?;
        let feature: String = row.try_get("most_used_feature")?;
        let location: String = row.try_get("user_location")?;

        records.push(Record {
            date: row.try_get("metric_date")?,
            active_users: u32::try_from(active_users).context("negative active_users in store")?,
            session_duration_minutes: row.try_get("session_duration_minutes")?,
            user_retention_percent: row.try_get("user_retention_percent")?,
            videos_processed: u32::try_from(videos_processed)
                .context("negative videos_processed in store")?,
            user_satisfaction_score: row.try_get("user_satisfaction_score")?,
            popular_theme: theme.parse()?,
            trending_topic: topic.parse()?,
            most_used_feature: feature.parse()?,
            user_location: location.parse()?,
        });
    }

    info!(records = records.len(), "fetched records from postgres");
    Ok(records)
}
