//! Terminal implementations of the dashboard collaborators.
//!
//! [`init_logger`] wraps `pretty_env_logger` in `indicatif-log-bridge` so
//! that log lines are suspended while the busy spinner redraws. The
//! [`ConsolePresenter`] prints through the same [`MultiProgress`] and the
//! [`LogRenderer`] reports map updates as log lines.

use std::fmt::Write as _;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rat_risk_analytics::search::{MIN_QUERY_CHARS, SearchOutcome};
use rat_risk_analytics_models::ClassifiedZone;
use rat_risk_dashboard::view::{
    DetailView, InspectionView, RatView, SearchResultView, ZoneSummaryView,
};
use rat_risk_dashboard::{Presenter, Renderer};
use rat_risk_restaurant_models::{Coordinate, RestaurantRecord, RiskTier};

/// Initializes the global logger behind `indicatif-log-bridge`.
///
/// Returns the [`MultiProgress`] the spinner and all console output must go
/// through.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}

/// Prints dashboard output to stdout, as text or as JSON.
pub struct ConsolePresenter {
    multi: MultiProgress,
    json: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsolePresenter {
    #[must_use]
    pub const fn new(multi: MultiProgress, json: bool) -> Self {
        Self {
            multi,
            json,
            spinner: Mutex::new(None),
        }
    }

    /// Prints `text` to stdout without tearing the spinner.
    pub fn print(&self, text: &str) {
        self.multi.suspend(|| print!("{text}"));
    }

    fn print_json<T: serde::Serialize>(&self, value: &T) {
        if let Some(json) = to_json(value) {
            self.print(&json);
        }
    }

    /// Prints the zone table.
    pub fn show_zones(&self, zones: &[ZoneSummaryView]) {
        if self.json {
            self.print_json(&zones);
        } else {
            self.print(&format_zones(zones));
        }
    }
}

impl Presenter for ConsolePresenter {
    fn set_busy(&self, busy: bool) {
        let mut spinner = self.spinner.lock().unwrap_or_else(PoisonError::into_inner);

        if busy {
            if spinner.is_none() {
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.enable_steady_tick(Duration::from_millis(100));
                bar.set_style(
                    ProgressStyle::with_template("{spinner:.cyan} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar.set_message("Loading...");
                *spinner = Some(bar);
            }
        } else if let Some(bar) = spinner.take() {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
    }

    fn show_error(&self, message: &str) {
        self.multi.suspend(|| eprintln!("error: {message}"));
    }

    fn show_warning(&self, message: &str) {
        self.multi.suspend(|| eprintln!("warning: {message}"));
    }

    fn show_search(&self, outcome: &SearchOutcome<SearchResultView>) {
        if self.json {
            self.print_json(outcome);
        } else {
            self.print(&format_search(outcome));
        }
    }

    fn show_detail(&self, detail: &DetailView) {
        if self.json {
            self.print_json(detail);
        } else {
            self.print(&format_detail(detail));
        }
    }
}

/// Reports map updates through the logger.
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn draw_zones(&self, zones: &[ClassifiedZone]) {
        log::info!("Drawing {} zones ({})", zones.len(), tier_counts(zones));
        for zone in zones {
            log::debug!(
                "Zone {}: {} restaurants, {} markers, tier {}",
                zone.zone,
                zone.restaurant_count,
                zone.markers.len(),
                zone.tier
            );
        }
    }

    fn highlight_selection(&self, restaurant: &RestaurantRecord, coordinate: Coordinate) {
        log::info!(
            "Highlighting {} at ({:.5}, {:.5})",
            restaurant.id,
            coordinate.latitude,
            coordinate.longitude
        );
    }
}

/// Zone count per tier, highest risk first: `"2 high, 0 medium, 1 low"`.
fn tier_counts(zones: &[ClassifiedZone]) -> String {
    RiskTier::all()
        .iter()
        .rev()
        .map(|&tier| {
            let count = zones.iter().filter(|z| z.tier == tier).count();
            format!("{count} {tier}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pretty-printed JSON followed by a newline, or `None` (logged) if the
/// value does not serialize.
#[must_use]
pub fn to_json<T: serde::Serialize>(value: &T) -> Option<String> {
    serde_json::to_string_pretty(value)
        .map(|json| format!("{json}\n"))
        .inspect_err(|e| log::error!("Failed to serialize output: {e}"))
        .ok()
}

#[must_use]
pub fn format_zones(zones: &[ZoneSummaryView]) -> String {
    let mut out = format!(
        "{:<8} {:<8} {:>12} {:>10}\n",
        "ZIP", "TIER", "RESTAURANTS", "ACTIVITY"
    );
    out.push_str(&"-".repeat(41));
    out.push('\n');
    for zone in zones {
        let _ = writeln!(
            out,
            "{:<8} {:<8} {:>12} {:>10}",
            zone.zone,
            zone.tier.as_ref(),
            zone.restaurant_count,
            zone.activity_text
        );
    }
    let _ = writeln!(out, "\n{} zone(s)", zones.len());
    out
}

#[must_use]
pub fn format_search(outcome: &SearchOutcome<SearchResultView>) -> String {
    match outcome {
        SearchOutcome::NotRun => {
            format!("Enter at least {MIN_QUERY_CHARS} characters to search\n")
        }
        SearchOutcome::NoResults => "No restaurants found\n".to_string(),
        SearchOutcome::Results(results) => {
            let mut out = String::new();
            for r in results {
                let _ = writeln!(
                    out,
                    "{:<10} {:<32} {:>6} ({})  {}",
                    r.id.as_str(),
                    r.name,
                    r.score_text,
                    r.score_rating.as_ref(),
                    r.address
                );
            }
            out
        }
    }
}

fn format_inspection(out: &mut String, inspection: &InspectionView) {
    let _ = writeln!(out, "  Latest inspection ({})", inspection.date_text);
    let _ = writeln!(
        out,
        "    Score: {}  Grade: {} ({})",
        inspection.score_text,
        inspection.grade,
        inspection.grade_rating.as_ref()
    );
    let _ = writeln!(
        out,
        "    Critical violations: {}  High severity: {}",
        inspection.critical_violations, inspection.high_severity_violations
    );
    if inspection.no_violations() {
        out.push_str("    No violations recorded\n");
    } else {
        for violation in &inspection.violations {
            let _ = writeln!(out, "    - {violation}");
        }
    }
}

fn format_rat(out: &mut String, rat: &RatView) {
    let _ = writeln!(out, "  Rat activity: {}", rat.status);
    let _ = writeln!(
        out,
        "    Activity rate: {}  Pass rate: {}",
        rat.activity_text, rat.pass_rate_text
    );
    let _ = writeln!(
        out,
        "    Inspections: {}  Last inspection: {}",
        rat.inspections_text, rat.last_inspection_text
    );
    let _ = writeln!(out, "    {}", rat.trend);
}

#[must_use]
pub fn format_detail(detail: &DetailView) -> String {
    let mut out = format!("{} ({})\n", detail.name, detail.id);

    match &detail.inspection {
        Some(inspection) => format_inspection(&mut out, inspection),
        None => out.push_str("  No inspection data available\n"),
    }
    match &detail.rat {
        Some(rat) => format_rat(&mut out, rat),
        None => out.push_str("  No rat inspection data available\n"),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rat_risk_dashboard::detail::{RatStatus, Trend};
    use rat_risk_restaurant_models::Rating;

    fn result(id: &str, name: &str) -> SearchResultView {
        SearchResultView {
            id: id.into(),
            name: name.to_string(),
            address: "12 Main St, Manhattan".to_string(),
            score_text: "13.0".to_string(),
            score_rating: Rating::Poor,
        }
    }

    #[test]
    fn search_states_have_distinct_text() {
        assert!(format_search(&SearchOutcome::NotRun).contains("at least 2"));
        assert_eq!(
            format_search(&SearchOutcome::NoResults),
            "No restaurants found\n"
        );

        let text = format_search(&SearchOutcome::Results(vec![
            result("1", "Hana"),
            result("2", "Shake Shack"),
        ]));
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().next().unwrap().contains("Hana"));
    }

    #[test]
    fn search_json_keeps_outcome_state() {
        let parse = |outcome: &SearchOutcome<SearchResultView>| -> serde_json::Value {
            serde_json::from_str(&to_json(outcome).unwrap()).unwrap()
        };

        assert_eq!(
            parse(&SearchOutcome::NotRun),
            serde_json::json!({ "state": "not_run" })
        );
        assert_eq!(
            parse(&SearchOutcome::NoResults),
            serde_json::json!({ "state": "no_results" })
        );

        let results = parse(&SearchOutcome::Results(vec![result("1", "Hana")]));
        assert_eq!(results["state"], "results");
        assert_eq!(results["results"][0]["name"], "Hana");
        assert_eq!(results["results"][0]["scoreText"], "13.0");
    }

    #[test]
    fn detail_without_data_shows_empty_states() {
        let text = format_detail(&DetailView {
            id: "1".into(),
            name: "Hana".to_string(),
            inspection: None,
            rat: None,
        });
        assert!(text.starts_with("Hana (1)\n"));
        assert!(text.contains("No inspection data available"));
        assert!(text.contains("No rat inspection data available"));
    }

    #[test]
    fn detail_lists_violations_and_trend() {
        let text = format_detail(&DetailView {
            id: "1".into(),
            name: "Hana".to_string(),
            inspection: Some(InspectionView {
                score_text: "21.0".to_string(),
                date_text: "2024-03-01".to_string(),
                critical_violations: 1,
                high_severity_violations: 0,
                grade: "B".to_string(),
                grade_rating: Rating::Good,
                violations: vec!["Evidence of mice".to_string()],
            }),
            rat: Some(RatView {
                activity_text: "60.0%".to_string(),
                pass_rate_text: "40.0%".to_string(),
                inspections_text: "5".to_string(),
                last_inspection_text: "2024-02-11".to_string(),
                status: RatStatus::Active,
                trend: Trend::Increasing(0.15),
            }),
        });
        assert!(text.contains("- Evidence of mice"));
        assert!(text.contains("Rat activity: ACTIVE"));
        assert!(text.contains("Activity increasing by 15.0%"));
        assert!(!text.contains("No violations recorded"));
    }

    #[test]
    fn tier_counts_cover_every_tier() {
        let zone = |tier| ClassifiedZone {
            zone: "10001".to_string(),
            tier,
            mean_activity_rate: 0.0,
            restaurant_count: 1,
            markers: vec![],
        };
        let zones = vec![zone(RiskTier::High), zone(RiskTier::Low), zone(RiskTier::High)];
        assert_eq!(tier_counts(&zones), "2 high, 0 medium, 1 low");
        assert_eq!(tier_counts(&[]), "0 high, 0 medium, 0 low");
    }

    #[test]
    fn zone_table_has_one_row_per_zone() {
        let zones = vec![ZoneSummaryView {
            zone: "10001".to_string(),
            tier: RiskTier::High,
            restaurant_count: 2,
            activity_text: "80.0%".to_string(),
        }];
        let text = format_zones(&zones);
        assert!(text.contains("10001"));
        assert!(text.contains("high"));
        assert!(text.ends_with("1 zone(s)\n"));
    }
}
