//! `reqwest`-backed [`DataService`] implementation.

use async_trait::async_trait;
use rat_risk_restaurant_models::{
    InspectionDetail, RatDetail, RestaurantId, RestaurantRecord, RestaurantRow,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ServiceConfig;
use crate::lookups::{Lookup, LookupRegistry};
use crate::{DataService, ServiceError, http};

/// Data service client speaking the `/data` and `/query` endpoints.
#[derive(Debug, Clone)]
pub struct HttpDataService {
    client: reqwest::Client,
    config: ServiceConfig,
    lookups: LookupRegistry,
}

impl HttpDataService {
    /// Builds a client with the configured timeout and the embedded lookup
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the HTTP client cannot be built or the
    /// lookup registry fails to load.
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("rat-risk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            lookups: LookupRegistry::load()?,
        })
    }

    /// Returns the connection settings in use.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// URL of the restaurant list endpoint (without the query string).
    #[must_use]
    pub fn list_url(&self) -> String {
        format!("{}/data/{}", self.config.base_url, self.config.dataset)
    }

    /// URL of the lookup endpoint.
    #[must_use]
    pub fn query_url(&self) -> String {
        format!("{}/query", self.config.base_url)
    }

    async fn lookup_rows(
        &self,
        lookup: Lookup,
        id: &RestaurantId,
    ) -> Result<Vec<Value>, ServiceError> {
        let request = self.lookups.get(lookup)?.request(id);
        log::debug!("Looking up {} for {id}", lookup.id());

        let body = http::send_json(self.client.post(self.query_url()).json(&request)).await?;
        http::data_rows(body)
    }
}

#[async_trait]
impl DataService for HttpDataService {
    async fn fetch_restaurants(&self) -> Result<Vec<RestaurantRecord>, ServiceError> {
        let url = self.list_url();
        log::info!(
            "Fetching restaurants from {url} (limit={})",
            self.config.fetch_limit
        );

        let body = http::send_json(
            self.client
                .get(&url)
                .query(&[("limit", self.config.fetch_limit)]),
        )
        .await?;

        let records = decode_restaurants(http::data_rows(body)?);
        log::info!("Fetched {} restaurants", records.len());
        Ok(records)
    }

    async fn latest_inspection(
        &self,
        id: &RestaurantId,
    ) -> Result<Option<InspectionDetail>, ServiceError> {
        decode_first(self.lookup_rows(Lookup::InspectionLatest, id).await?)
    }

    async fn rat_summary(&self, id: &RestaurantId) -> Result<Option<RatDetail>, ServiceError> {
        decode_first(self.lookup_rows(Lookup::RatSummary, id).await?)
    }
}

/// Decodes restaurant rows, dropping rows that are not objects or have no
/// identifier.
#[must_use]
pub fn decode_restaurants(rows: Vec<Value>) -> Vec<RestaurantRecord> {
    let total = rows.len();
    let mut malformed = 0usize;
    let mut missing_id = 0usize;

    let records: Vec<RestaurantRecord> = rows
        .into_iter()
        .filter_map(|row| match object_row::<RestaurantRow>(row) {
            Ok(row) => RestaurantRecord::try_from(row)
                .inspect_err(|_| missing_id += 1)
                .ok(),
            Err(e) => {
                log::trace!("Skipping malformed restaurant row: {e}");
                malformed += 1;
                None
            }
        })
        .collect();

    if malformed + missing_id > 0 {
        log::warn!(
            "Dropped {} of {total} restaurant rows ({malformed} malformed, {missing_id} without an id)",
            malformed + missing_id
        );
    }

    records
}

/// Decodes the first row of a lookup result.
///
/// # Errors
///
/// Returns [`ServiceError::Payload`] if the first row does not decode.
pub fn decode_first<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>, ServiceError> {
    let Some(first) = rows.into_iter().next() else {
        return Ok(None);
    };

    object_row(first).map(Some)
}

/// Decodes a row that must be a JSON object. Derived struct decoding would
/// otherwise accept arrays positionally.
fn object_row<T: DeserializeOwned>(row: Value) -> Result<T, ServiceError> {
    if !row.is_object() {
        return Err(ServiceError::Payload {
            message: "row is not a JSON object".to_string(),
        });
    }
    serde_json::from_value(row).map_err(|e| ServiceError::Payload {
        message: format!("row did not decode: {e}"),
    })
}
