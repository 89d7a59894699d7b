use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Position fix errors, one variant per user-facing message category.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("location access was denied; allow the lookup and try again")]
    PermissionDenied,
    #[error("position unavailable")]
    Unavailable,
    #[error("timed out waiting for a position fix")]
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[async_trait]
pub trait Locator: Send {
    async fn current_position(&self) -> Result<GeoPoint, GeoError>;
}

/// Coarse position via an IP-geolocation HTTP service. Good enough to center
/// a map view on the operator; not a GPS fix.
pub struct IpLocator {
    client: reqwest::Client,
    endpoint: String,
}

impl IpLocator {
    pub fn new() -> Result<Self, GeoError> {
        Self::with_endpoint("http://ip-api.com/json")
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, GeoError> {
        let client = reqwest::Client::builder()
            .user_agent("camwatch")
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|_| GeoError::Unavailable)?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[derive(Deserialize)]
struct IpApiResponse {
    lat: f64,
    lon: f64,
}

#[async_trait]
impl Locator for IpLocator {
    async fn current_position(&self) -> Result<GeoPoint, GeoError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    GeoError::Timeout
                } else {
                    GeoError::Unavailable
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GeoError::PermissionDenied);
        }
        if !status.is_success() {
            return Err(GeoError::Unavailable);
        }

        let body: IpApiResponse = response.json().await.map_err(|_| GeoError::Unavailable)?;
        Ok(GeoPoint {
            lat: body.lat,
            lng: body.lon,
        })
    }
}
