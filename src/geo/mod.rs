pub mod google;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::coordinate::GeoPoint;

pub use google::GoogleDistanceMatrix;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Error)]
pub enum ResolverError {
    /// Zero meters or no route: the pair cannot be routed.
    #[error("coordinates invalid")]
    InvalidCoordinates,

    #[error("mapping api returned {status}: {message}")]
    Api { status: String, message: String },

    #[error("mapping api response malformed: {0}")]
    MalformedResponse(String),

    #[error("mapping api request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Turns an origin/destination pair into a travel distance in meters.
#[async_trait]
pub trait DistanceResolver: Send + Sync {
    async fn resolve(&self, origin: &GeoPoint, destination: &GeoPoint)
        -> Result<i64, ResolverError>;

    fn name(&self) -> &'static str;
}

/// Rejects the zero-meter sentinel every backend may return.
pub fn non_zero_distance(meters: i64) -> Result<i64, ResolverError> {
    if meters <= 0 {
        return Err(ResolverError::InvalidCoordinates);
    }
    Ok(meters)
}

pub fn haversine_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_M * central_angle
}

/// Offline great-circle resolver for running without a mapping API key.
#[derive(Debug, Default, Clone)]
pub struct HaversineResolver;

#[async_trait]
impl DistanceResolver for HaversineResolver {
    async fn resolve(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
    ) -> Result<i64, ResolverError> {
        non_zero_distance(haversine_m(origin, destination).round() as i64)
    }

    fn name(&self) -> &'static str {
        "haversine"
    }
}
