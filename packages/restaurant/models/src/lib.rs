#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Restaurant, inspection, and rat-activity record types.
//!
//! The data service returns loosely typed warehouse rows. [`RestaurantRow`],
//! [`InspectionDetail`], and [`RatDetail`] decode those rows with a single
//! missing-field policy (see [`de`]), and [`RestaurantRecord`] is the
//! immutable, validated form the rest of the dashboard works with.

pub mod de;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Lower bound (inclusive) of the [`RiskTier::High`] tier.
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Lower bound (inclusive) of the [`RiskTier::Medium`] tier.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.3;

/// Unique establishment identifier (the city's `CAMIS` number).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantId(String);

impl RestaurantId {
    /// Creates an identifier from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RestaurantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RestaurantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RestaurantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A WGS84 point used for map placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Builds a coordinate from optional parts.
    ///
    /// Returns `None` unless both parts are present, finite, and non-zero.
    /// A zero on either axis is how the warehouse marks a record that was
    /// never geocoded.
    #[must_use]
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        let (latitude, longitude) = (latitude?, longitude?);
        let usable = |v: f64| v.is_finite() && v != 0.0;
        (usable(latitude) && usable(longitude)).then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// Restaurant risk tier derived from a rat-activity rate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskTier {
    /// Rate below [`MEDIUM_RISK_THRESHOLD`].
    Low,
    /// Rate in `[MEDIUM_RISK_THRESHOLD, HIGH_RISK_THRESHOLD)`.
    Medium,
    /// Rate at or above [`HIGH_RISK_THRESHOLD`].
    High,
}

impl RiskTier {
    /// Returns all variants of this enum, lowest risk first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High]
    }
}

/// Four-step quality rating shared by inspection grades and score badges.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Rating {
    /// Worst rating, also used when nothing is known.
    Poor,
    /// Below average.
    Fair,
    /// Above average.
    Good,
    /// Best rating.
    Excellent,
}

/// A restaurant row exactly as the data service returns it.
///
/// Field names follow the warehouse's `fact_restaurant_rat` columns.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RestaurantRow {
    /// Establishment identifier.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub camis: Option<String>,
    /// "Doing business as" display name.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub dba: Option<String>,
    /// Street address.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub street: Option<String>,
    /// Borough name.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub boro: Option<String>,
    /// Five-digit ZIP code.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub zipcode: Option<String>,
    /// Latitude (WGS84).
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub latitude: Option<f64>,
    /// Longitude (WGS84).
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub longitude: Option<f64>,
    /// Trailing 6-month average inspection score.
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub avg_score_6m: Option<f64>,
    /// Trailing 6-month rat-activity rate of the restaurant's ZIP code.
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub zip_rat_activity_rate_6m: Option<f64>,
    /// Trailing 6-month rat-activity rate at the establishment itself.
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub rat_activity_rate_6m: Option<f64>,
}

/// Error returned when a [`RestaurantRow`] has no usable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingIdError;

impl std::fmt::Display for MissingIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "restaurant row has no camis identifier")
    }
}

impl std::error::Error for MissingIdError {}

/// A validated restaurant record.
///
/// Immutable once built; the dashboard replaces the whole list on every
/// reload rather than mutating records in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRecord {
    /// Unique establishment identifier.
    pub id: RestaurantId,
    /// Display name.
    pub name: Option<String>,
    /// Street address.
    pub street: Option<String>,
    /// Borough.
    pub borough: Option<String>,
    /// Postal zone. `None` excludes the record from zone aggregation.
    pub zipcode: Option<String>,
    /// Map position. `None` excludes the record from map placement.
    pub coordinate: Option<Coordinate>,
    /// Trailing 6-month average inspection score.
    pub avg_score_6m: Option<f64>,
    /// Trailing 6-month zone-level rat-activity rate.
    pub zip_rat_activity_rate_6m: Option<f64>,
    /// Trailing 6-month establishment-level rat-activity rate.
    pub rat_activity_rate_6m: Option<f64>,
}

impl RestaurantRecord {
    /// Returns the zone key this record aggregates under, if any.
    #[must_use]
    pub fn zone_key(&self) -> Option<&str> {
        self.zipcode.as_deref().filter(|z| !z.is_empty())
    }

    /// Zone-level activity rate with a missing value counted as zero.
    #[must_use]
    pub fn zone_activity_rate(&self) -> f64 {
        self.zip_rat_activity_rate_6m.unwrap_or(0.0)
    }
}

impl TryFrom<RestaurantRow> for RestaurantRecord {
    type Error = MissingIdError;

    fn try_from(row: RestaurantRow) -> Result<Self, Self::Error> {
        let id = row.camis.ok_or(MissingIdError)?;

        Ok(Self {
            id: RestaurantId(id),
            name: row.dba,
            street: row.street,
            borough: row.boro,
            zipcode: row.zipcode,
            coordinate: Coordinate::from_parts(row.latitude, row.longitude),
            avg_score_6m: row.avg_score_6m,
            zip_rat_activity_rate_6m: row.zip_rat_activity_rate_6m,
            rat_activity_rate_6m: row.rat_activity_rate_6m,
        })
    }
}

/// Most recent inspection of one establishment
/// (`fact_restaurant_inspection` row).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectionDetail {
    /// Average score of the inspection.
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub average_score: Option<f64>,
    /// Inspection date.
    #[serde(default, deserialize_with = "de::opt_date")]
    pub inspection_date: Option<NaiveDate>,
    /// Number of critical violations cited.
    #[serde(default, deserialize_with = "de::count_or_zero")]
    pub critical_violations: u32,
    /// Number of high-severity violations cited.
    #[serde(default, deserialize_with = "de::count_or_zero")]
    pub high_severity_violation_count: u32,
    /// Letter grade (`A`, `B`, `C`, or a pending code such as `N`/`Z`/`P`).
    #[serde(default, deserialize_with = "de::opt_string")]
    pub grade: Option<String>,
    /// Violation descriptions in the order the inspector recorded them.
    #[serde(default, deserialize_with = "de::string_list")]
    pub violation_descriptions: Vec<String>,
}

/// Rat-activity summary of one establishment (`fact_restaurant_rat` row).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatDetail {
    /// Share of rat inspections in the trailing window that found activity.
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub rat_activity_rate_6m: Option<f64>,
    /// Share of rat inspections in the trailing window that passed.
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub rat_pass_rate_6m: Option<f64>,
    /// Number of rat inspections in the trailing window.
    #[serde(default, deserialize_with = "de::opt_count")]
    pub total_rat_inspections_6m: Option<u32>,
    /// Date of the most recent rat inspection.
    #[serde(default, deserialize_with = "de::opt_date")]
    pub recent_rat_insp_date: Option<NaiveDate>,
    /// Signed change in activity rate over the trailing window.
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub rat_activity_trend_6m: Option<f64>,
}

impl RatDetail {
    /// Activity rate with a missing value counted as zero.
    #[must_use]
    pub fn activity_rate(&self) -> f64 {
        self.rat_activity_rate_6m.unwrap_or(0.0)
    }

    /// Pass rate with a missing value counted as zero.
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        self.rat_pass_rate_6m.unwrap_or(0.0)
    }
}
