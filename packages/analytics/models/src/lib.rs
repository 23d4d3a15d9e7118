#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-zone aggregation result types.
//!
//! [`ZoneStats`] is the raw aggregate the zone aggregator produces from a
//! restaurant list. [`ClassifiedZone`] is what the map renderer consumes:
//! the same zone with its risk tier attached and its contributing
//! restaurants reduced to placeable markers.

use rat_risk_restaurant_models::{Coordinate, RestaurantId, RestaurantRecord, RiskTier};
use serde::Serialize;

/// Summary statistics for one postal zone.
///
/// Invariant: `mean_activity_rate == activity_sum / restaurant_count()`
/// and `restaurant_count() >= 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStats {
    /// Postal zone key (ZIP code).
    pub zone: String,
    /// Sum of the contributing records' zone-level rates (missing = 0).
    pub activity_sum: f64,
    /// Arithmetic mean of the zone-level rate.
    pub mean_activity_rate: f64,
    /// Contributing records in input order.
    pub restaurants: Vec<RestaurantRecord>,
}

impl ZoneStats {
    /// Number of restaurants that contributed to this zone.
    #[must_use]
    pub fn restaurant_count(&self) -> usize {
        self.restaurants.len()
    }
}

/// A single placeable restaurant within a classified zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneMarker {
    /// Establishment identifier.
    pub id: RestaurantId,
    /// Display name, for popups.
    pub name: Option<String>,
    /// Marker position.
    pub coordinate: Coordinate,
}

/// A zone with its risk tier, ready to hand to the map renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedZone {
    /// Postal zone key (ZIP code).
    pub zone: String,
    /// Risk tier of the zone's mean activity rate.
    pub tier: RiskTier,
    /// Mean zone-level activity rate.
    pub mean_activity_rate: f64,
    /// Number of contributing restaurants, placeable or not.
    pub restaurant_count: usize,
    /// Markers for the contributing restaurants that have coordinates,
    /// in contributing-list order.
    pub markers: Vec<ZoneMarker>,
}
