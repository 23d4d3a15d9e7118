//! Rat-activity risk classification.

use std::collections::BTreeMap;

use rat_risk_analytics_models::{ClassifiedZone, ZoneMarker, ZoneStats};
use rat_risk_restaurant_models::{HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD, RiskTier};

/// Classifies an activity rate into a [`RiskTier`].
///
/// Rates are expected in `[0, 1]` but are not clamped: the threshold rule
/// is applied to the raw value, so `1.4` is [`RiskTier::High`] and `-0.2`
/// is [`RiskTier::Low`]. `NaN` fails both comparisons and is
/// [`RiskTier::Low`].
#[must_use]
pub fn classify(rate: f64) -> RiskTier {
    if rate >= HIGH_RISK_THRESHOLD {
        RiskTier::High
    } else if rate >= MEDIUM_RISK_THRESHOLD {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

/// Attaches a risk tier and map markers to every aggregated zone.
///
/// Zones are returned in key order. Restaurants without a coordinate still
/// count toward `restaurant_count` but produce no marker.
#[must_use]
pub fn classify_zones(zones: &BTreeMap<String, ZoneStats>) -> Vec<ClassifiedZone> {
    zones
        .values()
        .map(|stats| ClassifiedZone {
            zone: stats.zone.clone(),
            tier: classify(stats.mean_activity_rate),
            mean_activity_rate: stats.mean_activity_rate,
            restaurant_count: stats.restaurant_count(),
            markers: stats
                .restaurants
                .iter()
                .filter_map(|r| {
                    r.coordinate.map(|coordinate| ZoneMarker {
                        id: r.id.clone(),
                        name: r.name.clone(),
                        coordinate,
                    })
                })
                .collect(),
        })
        .collect()
}
