use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One GPS reading tied to a vehicle. This is the queue wire format: JSON
/// with camelCase keys and an RFC 3339 UTC timestamp.
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
    /// Stamps a fresh id and the server-side receipt time. Callers never
    /// supply either field.
    pub fn new(vehicle_id: String, latitude: f64, longitude: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id,
            latitude,
            longitude,
            timestamp: Utc::now(),
        }
    }
}
