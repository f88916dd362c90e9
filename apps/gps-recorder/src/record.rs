use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Queue wire format: JSON with camelCase keys and an RFC 3339 UTC
/// timestamp. All fields are required; a message missing any of them is
/// malformed and dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsRecord {
    pub id: Uuid,
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl GpsRecord {
    /// Advisory bounds check. Out-of-range records are flagged, never
    /// rejected.
    pub fn has_valid_coordinates(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty payload")]
    Empty,
    #[error("malformed GPS payload: {0}")]
    Json(#[from] simd_json::Error),
}

pub fn decode_record(payload: &mut [u8]) -> Result<GpsRecord, DecodeError> {
    if payload.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(simd_json::from_slice(payload)?)
}
