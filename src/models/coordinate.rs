use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Parses a `[lat, lng]` pair of numeric strings.
    ///
    /// `label` names the field ("origin", "destination") in error messages.
    pub fn from_pair(label: &str, raw: &[String]) -> Result<Self, AppError> {
        let [lat, lng] = raw else {
            return Err(AppError::Validation(format!(
                "invalid request payload: {label} must be an array of exactly two strings"
            )));
        };

        let lat = parse_component(label, lat)?;
        let lng = parse_component(label, lng)?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::Validation(format!(
                "invalid request payload: {label} latitude {lat} out of range"
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::Validation(format!(
                "invalid request payload: {label} longitude {lng} out of range"
            )));
        }

        Ok(Self { lat, lng })
    }

    /// `lat,lng` as accepted by the Distance Matrix API.
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

fn parse_component(label: &str, raw: &str) -> Result<f64, AppError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(AppError::Validation(format!(
            "invalid request payload: {label}'s string is not a number"
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
}
