//! Detail retrieval for the selected restaurant.
//!
//! A selection needs two independent rows: the latest inspection and the
//! rat-activity summary. [`DetailOrchestrator::load_detail`] fetches both
//! concurrently, each under its own timeout, and degrades every failure
//! to an absent value so the selection flow never errors out.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rat_risk_restaurant_models::{InspectionDetail, RatDetail, RestaurantId, Rating};
use rat_risk_source::{DataService, ServiceError};
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// Activity rate (inclusive) at which a restaurant is flagged active.
pub const RAT_ACTIVE_THRESHOLD: f64 = 0.5;

/// Magnitude a trend must exceed to count as increasing or decreasing.
pub const TREND_THRESHOLD: f64 = 0.1;

/// Which of the two detail retrievals a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DetailKind {
    /// Latest inspection lookup.
    Inspection,
    /// Rat-activity summary lookup.
    RatActivity,
}

/// The detail pair for one selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detail {
    /// Latest inspection, if one was found.
    pub inspection: Option<InspectionDetail>,
    /// Rat-activity summary, if one was found.
    pub rat: Option<RatDetail>,
    /// Retrievals that failed (as opposed to finding nothing).
    pub failures: Vec<DetailKind>,
}

impl Detail {
    /// Returns `true` if neither value is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inspection.is_none() && self.rat.is_none()
    }
}

/// Rat-activity badge.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RatStatus {
    /// Activity rate at or above [`RAT_ACTIVE_THRESHOLD`].
    Active,
    /// Activity rate below [`RAT_ACTIVE_THRESHOLD`].
    Inactive,
}

/// Direction of the trailing activity trend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "direction", content = "magnitude", rename_all = "snake_case")]
pub enum Trend {
    /// Activity rose by the given fraction.
    Increasing(f64),
    /// Activity fell by the given (positive) fraction.
    Decreasing(f64),
    /// Change within ±[`TREND_THRESHOLD`].
    Stable,
    /// No trend on file.
    Unknown,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Increasing(t) => write!(f, "Activity increasing by {:.1}%", t * 100.0),
            Self::Decreasing(t) => write!(f, "Activity decreasing by {:.1}%", t * 100.0),
            Self::Stable => write!(f, "Activity stable"),
            Self::Unknown => write!(f, "No trend data available"),
        }
    }
}

/// Rates a letter grade: `A` excellent, `B` good, `C` fair, anything else
/// (pending codes, missing) poor.
#[must_use]
pub fn grade_rating(grade: Option<&str>) -> Rating {
    match grade.map(str::trim) {
        Some("A") => Rating::Excellent,
        Some("B") => Rating::Good,
        Some("C") => Rating::Fair,
        _ => Rating::Poor,
    }
}

/// Derives the activity badge, or `None` when there is no rat detail.
#[must_use]
pub fn rat_status(rat: Option<&RatDetail>) -> Option<RatStatus> {
    rat.map(|r| {
        if r.activity_rate() >= RAT_ACTIVE_THRESHOLD {
            RatStatus::Active
        } else {
            RatStatus::Inactive
        }
    })
}

/// Classifies a signed trend fraction. Non-finite values count as absent.
#[must_use]
pub fn classify_trend(trend: Option<f64>) -> Trend {
    match trend.filter(|t| t.is_finite()) {
        None => Trend::Unknown,
        Some(t) if t > TREND_THRESHOLD => Trend::Increasing(t),
        Some(t) if t < -TREND_THRESHOLD => Trend::Decreasing(t.abs()),
        Some(_) => Trend::Stable,
    }
}

/// Fetches and reconciles the detail pair for a restaurant.
pub struct DetailOrchestrator<S: ?Sized> {
    service: Arc<S>,
    timeout: Duration,
}

impl<S: DataService + ?Sized> DetailOrchestrator<S> {
    /// Creates an orchestrator that gives each retrieval `timeout` to
    /// complete.
    #[must_use]
    pub const fn new(service: Arc<S>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    /// Loads both detail values for `id`.
    ///
    /// The two retrievals are issued together and may complete in either
    /// order. Each one that fails, times out, or returns a malformed
    /// payload yields `None` and is recorded in [`Detail::failures`]; the
    /// other is unaffected. Nothing is retried.
    pub async fn load_detail(&self, id: &RestaurantId) -> Detail {
        let (inspection, rat) = tokio::join!(
            settle(
                DetailKind::Inspection,
                id,
                self.timeout,
                self.service.latest_inspection(id),
            ),
            settle(
                DetailKind::RatActivity,
                id,
                self.timeout,
                self.service.rat_summary(id),
            ),
        );

        let mut failures = Vec::new();
        let inspection = inspection.unwrap_or_else(|kind| {
            failures.push(kind);
            None
        });
        let rat = rat.unwrap_or_else(|kind| {
            failures.push(kind);
            None
        });

        Detail {
            inspection,
            rat,
            failures,
        }
    }
}

/// Awaits one retrieval under `timeout`, logging why it came back empty.
///
/// `Ok(None)` means "nothing on file"; `Err(kind)` means the retrieval
/// failed.
async fn settle<T>(
    kind: DetailKind,
    id: &RestaurantId,
    timeout: Duration,
    retrieval: impl Future<Output = Result<Option<T>, ServiceError>>,
) -> Result<Option<T>, DetailKind> {
    match tokio::time::timeout(timeout, retrieval).await {
        Ok(Ok(Some(value))) => Ok(Some(value)),
        Ok(Ok(None)) => {
            log::info!("No {kind} data on file for {id}");
            Ok(None)
        }
        Ok(Err(e)) => {
            log::warn!("Error loading {kind} data for {id}: {e}");
            Err(kind)
        }
        Err(_) => {
            log::warn!("Timed out after {timeout:?} loading {kind} data for {id}");
            Err(kind)
        }
    }
}
