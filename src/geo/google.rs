//! Google Distance Matrix client.
//!
//! One `GET /maps/api/distancematrix/json` per resolution, no retries. The
//! first element of the first row carries the distance.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{non_zero_distance, DistanceResolver, ResolverError};
use crate::models::coordinate::GeoPoint;

const MATRIX_PATH: &str = "/maps/api/distancematrix/json";

pub struct GoogleDistanceMatrix {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<TextValue>,
}

#[derive(Deserialize)]
struct TextValue {
    value: i64,
}

impl GoogleDistanceMatrix {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ResolverError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl DistanceResolver for GoogleDistanceMatrix {
    async fn resolve(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
    ) -> Result<i64, ResolverError> {
        let url = format!("{}{MATRIX_PATH}", self.base_url);
        let origins = origin.to_query_value();
        let destinations = destination.to_query_value();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let http_status = response.status();
        if !http_status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|err| format!("failed to read error body: {err}"));
            return Err(ResolverError::Api {
                status: http_status.to_string(),
                message,
            });
        }

        let matrix: MatrixResponse = response
            .json()
            .await
            .map_err(|err| ResolverError::MalformedResponse(err.to_string()))?;

        if matrix.status != "OK" {
            return Err(ResolverError::Api {
                status: matrix.status,
                message: matrix.error_message.unwrap_or_default(),
            });
        }

        let element = matrix
            .rows
            .first()
            .and_then(|row| row.elements.first())
            .ok_or_else(|| ResolverError::MalformedResponse("no matrix element".to_string()))?;

        if element.status != "OK" {
            debug!(element_status = %element.status, "no route between coordinates");
            return Err(ResolverError::InvalidCoordinates);
        }

        let meters = element
            .distance
            .as_ref()
            .map(|distance| distance.value)
            .ok_or_else(|| ResolverError::MalformedResponse("element has no distance".to_string()))?;

        non_zero_distance(meters)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}
