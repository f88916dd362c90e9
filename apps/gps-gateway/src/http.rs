use crate::auth::{ApiTokenSet, AuthToken};
use crate::error::{ApiError, ApiResult};
use crate::publisher::PublisherHandle;
use crate::record::GpsRecord;
use axum::extract::{FromRef, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct HttpState {
    pub publisher: PublisherHandle,
    pub tokens: Arc<ApiTokenSet>,
}

impl FromRef<HttpState> for Arc<ApiTokenSet> {
    fn from_ref(state: &HttpState) -> Self {
        state.tokens.clone()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendGpsRequest {
    vehicle_id: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
struct SendGpsResponse {
    message: &'static str,
    data: GpsRecord,
}

async fn healthz() -> &'static str {
    "ok"
}

fn validate_request(request: &SendGpsRequest) -> Result<(), &'static str> {
    if request.vehicle_id.trim().is_empty() {
        return Err("vehicleId must not be empty");
    }
    if !request.latitude.is_finite() || !request.longitude.is_finite() {
        return Err("latitude and longitude must be finite numbers");
    }
    Ok(())
}

async fn send_gps(
    State(state): State<HttpState>,
    _auth: AuthToken,
    Json(request): Json<SendGpsRequest>,
) -> ApiResult<Json<SendGpsResponse>> {
    validate_request(&request).map_err(ApiError::bad_request)?;

    let record = GpsRecord::new(
        request.vehicle_id.trim().to_string(),
        request.latitude,
        request.longitude,
    );

    // One enqueue attempt per accepted request; the caller does not wait for
    // downstream processing.
    if let Err(err) = state.publisher.enqueue(record.clone()).await {
        tracing::error!(error=%err, vehicle=%record.vehicle_id, "failed to enqueue GPS record");
        return Err(ApiError::enqueue_failed(&err));
    }

    tracing::info!(vehicle=%record.vehicle_id, id=%record.id, "queued GPS record");
    Ok(Json(SendGpsResponse {
        message: "Data sent to queue",
        data: record,
    }))
}

pub fn router(state: HttpState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/gps/send", post(send_gps))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::{validate_request, SendGpsRequest};

    fn request(vehicle_id: &str, latitude: f64, longitude: f64) -> SendGpsRequest {
        SendGpsRequest {
            vehicle_id: vehicle_id.to_string(),
            latitude,
            longitude,
        }
    }

    #[test]
    fn well_formed_requests_pass_validation() {
        assert!(validate_request(&request("V1", 45.0, 90.0)).is_ok());
        // Out-of-range coordinates are accepted here; bounds are the
        // consumer's advisory check, not an ingestion gate.
        assert!(validate_request(&request("V2", 95.0, 10.0)).is_ok());
    }

    #[test]
    fn empty_vehicle_id_is_rejected() {
        assert!(validate_request(&request("", 45.0, 90.0)).is_err());
        assert!(validate_request(&request("   ", 45.0, 90.0)).is_err());
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        assert!(validate_request(&request("V1", f64::NAN, 0.0)).is_err());
        assert!(validate_request(&request("V1", 0.0, f64::INFINITY)).is_err());
    }
}
