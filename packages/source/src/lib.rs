#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Client for the restaurant rat-risk data service.
//!
//! The data service exposes two endpoints: a tabular list endpoint
//! (`GET /data/{dataset}`) that returns every restaurant row, and a lookup
//! endpoint (`POST /query`) used to fetch one establishment's detail rows.
//! The [`DataService`] trait is the seam the dashboard depends on;
//! [`client::HttpDataService`] is the production implementation.

pub mod client;
pub mod config;
pub mod http;
pub mod lookups;

use async_trait::async_trait;
use rat_risk_restaurant_models::{InspectionDetail, RatDetail, RestaurantId, RestaurantRecord};

/// Errors that can occur while talking to the data service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Transport-level failure (connection refused, DNS, TLS, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Numeric status code.
        status: u16,
        /// Request URL.
        url: String,
    },

    /// The response body was not the expected shape.
    #[error("Malformed response payload: {message}")]
    Payload {
        /// Description of what was wrong with the payload.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// A lookup definition is missing or invalid.
    #[error("Invalid lookup definition: {message}")]
    Lookup {
        /// Description of the problem.
        message: String,
    },
}

/// Read-only access to restaurant and detail data.
///
/// Implementations perform no retries; a failed call is reported to the
/// caller, which decides how to degrade.
#[async_trait]
pub trait DataService: Send + Sync {
    /// Fetches the full restaurant list (bounded by the configured fetch
    /// limit).
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the request fails or the payload is
    /// malformed.
    async fn fetch_restaurants(&self) -> Result<Vec<RestaurantRecord>, ServiceError>;

    /// Fetches the most recent inspection of one establishment.
    ///
    /// Returns `Ok(None)` when the establishment has no inspections on
    /// file.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the request fails or the payload is
    /// malformed.
    async fn latest_inspection(
        &self,
        id: &RestaurantId,
    ) -> Result<Option<InspectionDetail>, ServiceError>;

    /// Fetches the rat-activity summary of one establishment.
    ///
    /// Returns `Ok(None)` when no summary row exists.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the request fails or the payload is
    /// malformed.
    async fn rat_summary(&self, id: &RestaurantId) -> Result<Option<RatDetail>, ServiceError>;
}
