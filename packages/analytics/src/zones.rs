//! Groups restaurants by postal zone.

use std::collections::BTreeMap;

use rat_risk_analytics_models::ZoneStats;
use rat_risk_restaurant_models::RestaurantRecord;

/// Aggregates restaurant records into per-zone statistics.
///
/// Records without a zone key are skipped entirely. For every other
/// record the zone's count grows by one, its zone-level rate (missing
/// counts as 0) is added to the zone's sum, and the record is appended to
/// the zone's contributing list. Means are computed once the pass is
/// complete.
///
/// The map is keyed and ordered by zone, and each contributing list keeps
/// input order, so running this twice over the same records yields
/// identical output.
#[must_use]
pub fn aggregate(records: &[RestaurantRecord]) -> BTreeMap<String, ZoneStats> {
    let mut zones: BTreeMap<String, ZoneStats> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records {
        let Some(zone) = record.zone_key() else {
            skipped += 1;
            continue;
        };

        let stats = zones
            .entry(zone.to_string())
            .or_insert_with(|| ZoneStats {
                zone: zone.to_string(),
                activity_sum: 0.0,
                mean_activity_rate: 0.0,
                restaurants: Vec::new(),
            });
        stats.activity_sum += record.zone_activity_rate();
        stats.restaurants.push(record.clone());
    }

    for stats in zones.values_mut() {
        #[allow(clippy::cast_precision_loss)]
        let count = stats.restaurants.len() as f64;
        stats.mean_activity_rate = stats.activity_sum / count;
    }

    log::debug!(
        "Aggregated {} restaurants into {} zones ({skipped} without a zone)",
        records.len(),
        zones.len()
    );

    zones
}
