use crate::record::GpsRecord;
use anyhow::Result;
use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub async fn build_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Single-row insert, no conflict handling: a redelivered message inserts a
/// duplicate row.
pub async fn insert_record(pool: &PgPool, record: &GpsRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO gps_records (vehicle_id, latitude, longitude, ts, inserted_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(&record.vehicle_id)
    .bind(record.latitude)
    .bind(record.longitude)
    .bind(record.timestamp)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}
