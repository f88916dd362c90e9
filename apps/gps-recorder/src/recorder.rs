use crate::notify::InvalidGpsNotifier;
use crate::record::GpsRecord;
use crate::store;
use anyhow::Result;
use sqlx::PgPool;

/// Per-message processing: validate bounds, alert on out-of-range
/// coordinates, persist. Each message owns its record end-to-end; there is
/// no shared state between invocations.
#[derive(Clone)]
pub struct GpsRecorder {
    pool: PgPool,
    notifier: Option<InvalidGpsNotifier>,
}

impl GpsRecorder {
    pub fn new(pool: PgPool, notifier: Option<InvalidGpsNotifier>) -> Self {
        Self { pool, notifier }
    }

    pub async fn record(&self, record: GpsRecord) -> Result<()> {
        // The bounds check is advisory: out-of-range records are flagged and
        // still persisted.
        if !record.has_valid_coordinates() {
            tracing::warn!(
                vehicle=%record.vehicle_id,
                latitude=record.latitude,
                longitude=record.longitude,
                "GPS coordinates out of range"
            );
            match &self.notifier {
                Some(notifier) => notifier.enqueue(record.clone()),
                None => tracing::debug!(
                    vehicle=%record.vehicle_id,
                    "webhook URL not configured; skipping invalid-GPS alert"
                ),
            }
        }

        store::insert_record(&self.pool, &record).await?;
        tracing::debug!(vehicle=%record.vehicle_id, id=%record.id, "stored GPS record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::GpsRecorder;
    use crate::record::GpsRecord;
    use anyhow::Result;
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;
    use sqlx::PgPool;
    use std::env;
    use uuid::Uuid;

    async fn setup_test_pool(database_url: &str, schema: &str) -> Result<PgPool> {
        let admin_pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
            .execute(&admin_pool)
            .await?;
        drop(admin_pool);

        let schema_name = schema.to_string();
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .after_connect(move |conn, _meta| {
                let schema = schema_name.clone();
                Box::pin(async move {
                    sqlx::query(&format!("SET search_path TO {}", schema))
                        .execute(conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS gps_records (
                vehicle_id text not null,
                latitude double precision not null,
                longitude double precision not null,
                ts timestamptz not null,
                inserted_at timestamptz not null
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(pool)
    }

    fn sample_record(vehicle_id: &str, latitude: f64, longitude: f64) -> GpsRecord {
        GpsRecord {
            id: Uuid::new_v4(),
            vehicle_id: vehicle_id.to_string(),
            latitude,
            longitude,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_recorder_persists_valid_and_invalid_records() -> Result<()> {
        if env::var("RECORDER_INTEGRATION_TEST").ok().as_deref() != Some("1") {
            return Ok(());
        }
        let database_url = match env::var("RECORDER_TEST_DATABASE_URL") {
            Ok(value) => value,
            Err(_) => return Ok(()),
        };

        let schema = format!("recorder_test_{}", std::process::id());
        let pool = setup_test_pool(&database_url, &schema).await?;
        let recorder = GpsRecorder::new(pool.clone(), None);

        recorder.record(sample_record("V1", 45.0, 90.0)).await?;
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM gps_records WHERE vehicle_id = $1")
                .bind("V1")
                .fetch_one(&pool)
                .await?;
        assert_eq!(count, 1);
        let (latitude, longitude): (f64, f64) =
            sqlx::query_as("SELECT latitude, longitude FROM gps_records WHERE vehicle_id = $1")
                .bind("V1")
                .fetch_one(&pool)
                .await?;
        assert_eq!(latitude, 45.0);
        assert_eq!(longitude, 90.0);

        // Out-of-range coordinates are flagged, never dropped from storage.
        recorder.record(sample_record("V2", 95.0, 10.0)).await?;
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM gps_records WHERE vehicle_id = $1")
                .bind("V2")
                .fetch_one(&pool)
                .await?;
        assert_eq!(count, 1);

        // Redelivery of the same logical message inserts a second row.
        let record = sample_record("V3", 1.0, 2.0);
        recorder.record(record.clone()).await?;
        recorder.record(record).await?;
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM gps_records WHERE vehicle_id = $1")
                .bind("V3")
                .fetch_one(&pool)
                .await?;
        assert_eq!(count, 2);

        let admin_pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await?;
        let _ = sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema))
            .execute(&admin_pool)
            .await;

        Ok(())
    }
}
