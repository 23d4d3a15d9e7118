//! Presentation-ready values for the search dropdown, detail panel, and
//! zone popups.
//!
//! Everything here is a pure function of the domain types. A front end
//! should be able to render these without any further formatting
//! decisions; "not available" is always the [`NOT_AVAILABLE`] sentinel.

use chrono::NaiveDate;
use rat_risk_analytics_models::ClassifiedZone;
use rat_risk_restaurant_models::{
    InspectionDetail, RatDetail, Rating, RestaurantId, RestaurantRecord, RiskTier,
};
use serde::Serialize;

use crate::detail::{Detail, RatStatus, Trend, classify_trend, grade_rating, rat_status};

/// Text shown in place of a missing value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Letter shown when an inspection has no grade.
pub const UNGRADED: &str = "N";

/// Formats a fraction as a percentage with one decimal, e.g. `0.153` →
/// `"15.3%"`.
#[must_use]
pub fn format_percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// Rates an average inspection score for the search dropdown badge.
#[must_use]
pub fn score_rating(score: f64) -> Rating {
    if score >= 90.0 {
        Rating::Excellent
    } else if score >= 80.0 {
        Rating::Good
    } else if score >= 70.0 {
        Rating::Fair
    } else {
        Rating::Poor
    }
}

fn score_text(score: Option<f64>) -> String {
    match score {
        Some(s) if s > 0.0 => format!("{s:.1}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn date_text(date: Option<NaiveDate>) -> String {
    date.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |d| d.format("%Y-%m-%d").to_string(),
    )
}

/// One row of the search dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultView {
    /// Establishment id, used to select the row.
    pub id: RestaurantId,
    /// Display name (empty when unknown).
    pub name: String,
    /// `"street, borough"`, omitting absent parts.
    pub address: String,
    /// Average score with one decimal, or [`NOT_AVAILABLE`].
    pub score_text: String,
    /// Badge class for the score.
    pub score_rating: Rating,
}

impl From<&RestaurantRecord> for SearchResultView {
    fn from(record: &RestaurantRecord) -> Self {
        let address = [record.street.as_deref(), record.borough.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        let score = record.avg_score_6m.unwrap_or(0.0);

        Self {
            id: record.id.clone(),
            name: record.name.clone().unwrap_or_default(),
            address,
            score_text: score_text(record.avg_score_6m),
            score_rating: score_rating(score),
        }
    }
}

/// Latest-inspection section of the detail panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionView {
    /// Average score to one decimal, or [`NOT_AVAILABLE`].
    pub score_text: String,
    /// Inspection date as `YYYY-MM-DD`, or [`NOT_AVAILABLE`].
    pub date_text: String,
    pub critical_violations: u32,
    pub high_severity_violations: u32,
    /// Grade letter, or [`UNGRADED`].
    pub grade: String,
    /// Badge color for the grade.
    pub grade_rating: Rating,
    /// Violation descriptions in the order the service returned them.
    pub violations: Vec<String>,
}

impl InspectionView {
    /// Returns `true` when the panel should say "No violations recorded".
    #[must_use]
    pub fn no_violations(&self) -> bool {
        self.violations.is_empty()
    }
}

impl From<&InspectionDetail> for InspectionView {
    fn from(inspection: &InspectionDetail) -> Self {
        let grade = inspection
            .grade
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty());

        Self {
            score_text: score_text(inspection.average_score),
            date_text: date_text(inspection.inspection_date),
            critical_violations: inspection.critical_violations,
            high_severity_violations: inspection.high_severity_violation_count,
            grade: grade.unwrap_or(UNGRADED).to_string(),
            grade_rating: grade_rating(grade),
            violations: inspection.violation_descriptions.clone(),
        }
    }
}

/// Rat-activity section of the detail panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatView {
    /// Six-month activity rate as a percentage.
    pub activity_text: String,
    /// Six-month pass rate as a percentage.
    pub pass_rate_text: String,
    /// Inspection count, or [`NOT_AVAILABLE`] when zero or unknown.
    pub inspections_text: String,
    /// Date of the latest rat inspection, or [`NOT_AVAILABLE`].
    pub last_inspection_text: String,
    pub status: RatStatus,
    pub trend: Trend,
}

impl From<&RatDetail> for RatView {
    fn from(rat: &RatDetail) -> Self {
        let inspections_text = match rat.total_rat_inspections_6m {
            Some(n) if n > 0 => n.to_string(),
            _ => NOT_AVAILABLE.to_string(),
        };

        Self {
            activity_text: format_percent(rat.activity_rate()),
            pass_rate_text: format_percent(rat.pass_rate()),
            inspections_text,
            last_inspection_text: date_text(rat.recent_rat_insp_date),
            status: rat_status(Some(rat)).unwrap_or(RatStatus::Inactive),
            trend: classify_trend(rat.rat_activity_trend_6m),
        }
    }
}

/// The whole detail panel for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailView {
    pub id: RestaurantId,
    /// Restaurant name, empty when the record has none.
    pub name: String,
    /// `None` renders the "no inspection data" state.
    pub inspection: Option<InspectionView>,
    /// `None` renders the "no rat inspection data" state.
    pub rat: Option<RatView>,
}

impl DetailView {
    /// Builds the panel for `restaurant` from whatever detail arrived.
    #[must_use]
    pub fn new(restaurant: &RestaurantRecord, detail: &Detail) -> Self {
        Self {
            id: restaurant.id.clone(),
            name: restaurant.name.clone().unwrap_or_default(),
            inspection: detail.inspection.as_ref().map(InspectionView::from),
            rat: detail.rat.as_ref().map(RatView::from),
        }
    }
}

/// Map popup for one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSummaryView {
    /// Zip code.
    pub zone: String,
    pub tier: RiskTier,
    pub restaurant_count: usize,
    /// Mean activity rate as a percentage.
    pub activity_text: String,
}

impl From<&ClassifiedZone> for ZoneSummaryView {
    fn from(zone: &ClassifiedZone) -> Self {
        Self {
            zone: zone.zone.clone(),
            tier: zone.tier,
            restaurant_count: zone.restaurant_count,
            activity_text: format_percent(zone.mean_activity_rate),
        }
    }
}
