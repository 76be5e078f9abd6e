//! IP geolocation
//!
//! Regions are looked up through the [`Geolocator`] trait and memoized
//! process-wide by [`GeoResolver`]. The crawl never depends on a lookup
//! succeeding: failures only leave the region unknown.

mod ip_api;
mod resolver;

pub use ip_api::IpApiGeolocator;
pub use resolver::GeoResolver;

use async_trait::async_trait;
use std::net::IpAddr;
use thiserror::Error;

/// Errors from geolocation lookups
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Geolocation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Geolocation service rejected {ip}: {message}")]
    Rejected { ip: IpAddr, message: String },

    #[error("Invalid geolocation endpoint: {0}")]
    Endpoint(String),
}

/// Resolves an IP address to a human-readable region
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Returns the region for `ip`, or `None` if the service does not know it
    async fn lookup(&self, ip: IpAddr) -> Result<Option<String>, GeoError>;
}

/// Geolocator that never knows a region
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGeolocator;

#[async_trait]
impl Geolocator for NoopGeolocator {
    async fn lookup(&self, _ip: IpAddr) -> Result<Option<String>, GeoError> {
        Ok(None)
    }
}
