//! The dashboard state machine.
//!
//! [`DashboardController`] is the single owner of the restaurant list, the
//! zone aggregates, and the selection. Its state lives behind a
//! [`std::sync::Mutex`] that is only ever held between awaits, so
//! overlapping `load` and `select` futures interleave only at the network
//! calls. Collaborators are invoked after the lock is released.
//!
//! Every selection is tagged with a monotonic token. A detail result is
//! applied only if its token is still current when it arrives, so a slow
//! answer for an earlier selection can never overwrite a newer one.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rat_risk_analytics::classifier::classify_zones;
use rat_risk_analytics::search::{self, SearchOutcome, SearchQuery};
use rat_risk_analytics::zones::aggregate;
use rat_risk_analytics_models::{ClassifiedZone, ZoneStats};
use rat_risk_restaurant_models::{RestaurantId, RestaurantRecord};
use rat_risk_source::DataService;
use serde::Serialize;
use strum_macros::{AsRefStr, Display};

use crate::config::DashboardConfig;
use crate::debounce::SearchDebouncer;
use crate::detail::{Detail, DetailOrchestrator};
use crate::view::{DetailView, SearchResultView};
use crate::{DashboardError, Presenter, Renderer};

/// Shown when the restaurant list cannot be fetched.
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load data. Please check if the API is running.";

/// Shown when neither detail value could be loaded for a selection.
pub const DETAIL_WARNING_MESSAGE: &str = "Failed to load restaurant details";

/// Where the dashboard is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Nothing loaded yet.
    Idle,
    /// A list fetch is in flight.
    Loading,
    /// List loaded, nothing selected.
    Ready,
    /// The last list fetch failed; no data is shown.
    LoadFailed,
    /// Detail for the current selection is in flight.
    DetailLoading,
    /// Detail for the current selection has been applied.
    DetailReady,
}

/// Whether a [`DashboardController::select`] result reached the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SelectOutcome {
    /// The detail was applied.
    Applied,
    /// A newer selection arrived first; the detail was discarded.
    Superseded,
}

#[derive(Debug)]
struct Selection {
    token: u64,
    restaurant: RestaurantRecord,
    /// `None` while the detail is in flight.
    detail: Option<Detail>,
}

#[derive(Debug)]
struct DashboardState {
    loaded: bool,
    load_failed: bool,
    loads_in_flight: usize,
    restaurants: Arc<[RestaurantRecord]>,
    zones: Arc<BTreeMap<String, ZoneStats>>,
    classified: Arc<[ClassifiedZone]>,
    selection: Option<Selection>,
    last_token: u64,
    busy_shown: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            loaded: false,
            load_failed: false,
            loads_in_flight: 0,
            restaurants: Arc::from(Vec::new()),
            zones: Arc::new(BTreeMap::new()),
            classified: Arc::from(Vec::new()),
            selection: None,
            last_token: 0,
            busy_shown: false,
        }
    }
}

impl DashboardState {
    fn phase(&self) -> Phase {
        if self.loads_in_flight > 0 {
            return Phase::Loading;
        }
        if !self.loaded {
            return if self.load_failed {
                Phase::LoadFailed
            } else {
                Phase::Idle
            };
        }
        match &self.selection {
            None => Phase::Ready,
            Some(Selection { detail: None, .. }) => Phase::DetailLoading,
            Some(Selection {
                detail: Some(_), ..
            }) => Phase::DetailReady,
        }
    }

    fn is_busy(&self) -> bool {
        self.loads_in_flight > 0 || self.selection.as_ref().is_some_and(|s| s.detail.is_none())
    }

    /// Returns the new busy value if it differs from what the presenter
    /// last saw.
    fn busy_transition(&mut self) -> Option<bool> {
        let busy = self.is_busy();
        (busy != self.busy_shown).then(|| {
            self.busy_shown = busy;
            busy
        })
    }
}

/// Drives loading, searching, and selection for one dashboard.
pub struct DashboardController<R, P> {
    service: Arc<dyn DataService>,
    orchestrator: DetailOrchestrator<dyn DataService>,
    renderer: R,
    presenter: P,
    search_limit: usize,
    debouncer: SearchDebouncer,
    state: Mutex<DashboardState>,
}

impl<R: Renderer, P: Presenter> DashboardController<R, P> {
    /// Creates an idle controller with no data loaded. Call [`Self::load`]
    /// before searching or selecting.
    #[must_use]
    pub fn new(
        service: Arc<dyn DataService>,
        renderer: R,
        presenter: P,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            orchestrator: DetailOrchestrator::new(service.clone(), config.service.timeout),
            service,
            renderer,
            presenter,
            search_limit: config.search_limit,
            debouncer: SearchDebouncer::new(config.search_debounce),
            state: Mutex::new(DashboardState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push_busy(&self, transition: Option<bool>) {
        if let Some(busy) = transition {
            self.presenter.set_busy(busy);
        }
    }

    /// Fetches the restaurant list and redraws the zones.
    ///
    /// Used both at startup and as the retry after a failure. On success
    /// the list is replaced wholesale and the current selection, if still
    /// present and placed on the map, is highlighted again. On failure the
    /// presenter shows [`LOAD_ERROR_MESSAGE`] and the dashboard is left
    /// without data.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Service`] if the list cannot be fetched.
    pub async fn load(&self) -> Result<(), DashboardError> {
        let busy = {
            let mut state = self.lock();
            state.loads_in_flight += 1;
            state.busy_transition()
        };
        self.push_busy(busy);
        log::info!("Loading restaurant data");

        let result = self.service.fetch_restaurants().await;

        let mut guard = self.lock();
        let state = &mut *guard;
        state.loads_in_flight = state.loads_in_flight.saturating_sub(1);

        match result {
            Ok(records) => {
                let zones = aggregate(&records);
                let classified: Arc<[ClassifiedZone]> = classify_zones(&zones).into();
                state.restaurants = records.into();
                state.zones = Arc::new(zones);
                state.classified = classified.clone();
                state.loaded = true;
                state.load_failed = false;

                let highlight = state.selection.as_mut().and_then(|selection| {
                    let fresh = state
                        .restaurants
                        .iter()
                        .find(|r| r.id == selection.restaurant.id)?;
                    selection.restaurant = fresh.clone();
                    fresh.coordinate.map(|c| (fresh.clone(), c))
                });
                let restaurant_count = state.restaurants.len();
                let busy = state.busy_transition();
                drop(guard);

                log::info!(
                    "Loaded {restaurant_count} restaurants across {} zones",
                    classified.len()
                );
                self.renderer.draw_zones(&classified);
                if let Some((restaurant, coordinate)) = highlight {
                    self.renderer.highlight_selection(&restaurant, coordinate);
                }
                self.push_busy(busy);
                Ok(())
            }
            Err(e) => {
                let had_zones = !state.classified.is_empty();
                state.restaurants = Arc::from(Vec::new());
                state.zones = Arc::new(BTreeMap::new());
                state.classified = Arc::from(Vec::new());
                state.loaded = false;
                state.load_failed = true;
                let busy = state.busy_transition();
                drop(guard);

                log::error!("Error loading restaurant data: {e}");
                if had_zones {
                    self.renderer.draw_zones(&[]);
                }
                self.presenter.show_error(LOAD_ERROR_MESSAGE);
                self.push_busy(busy);
                Err(e.into())
            }
        }
    }

    /// Runs a search over the current list and presents the outcome.
    ///
    /// Input shorter than two characters (after trimming) is not searched
    /// and yields [`SearchOutcome::NotRun`].
    pub fn search(&self, raw: &str) -> SearchOutcome<SearchResultView> {
        let outcome = match SearchQuery::parse(raw) {
            None => SearchOutcome::NotRun,
            Some(query) => {
                let records = self.restaurants();
                let matches = search::search(query.as_str(), &records, self.search_limit);
                log::debug!(
                    "Search {:?} matched {} restaurants",
                    query.as_str(),
                    matches.len()
                );
                SearchOutcome::from_results(
                    matches.into_iter().map(SearchResultView::from).collect(),
                )
            }
        };

        self.presenter.show_search(&outcome);
        outcome
    }

    /// Debounced [`Self::search`] for keystroke input. Returns `None` when
    /// a newer keystroke superseded this one.
    pub async fn search_as_typed(&self, raw: &str) -> Option<SearchOutcome<SearchResultView>> {
        log::trace!("Waiting {:?} for input to settle", self.debouncer.idle());
        let query = self.debouncer.settle(raw).await?;
        Some(self.search(&query))
    }

    /// Selects a restaurant and loads its detail.
    ///
    /// The previous detail is cleared immediately. When the detail arrives
    /// it is presented only if no newer selection has been made in the
    /// meantime.
    ///
    /// # Errors
    ///
    /// * [`DashboardError::NotReady`] if no restaurant list is loaded.
    /// * [`DashboardError::UnknownRestaurant`] if `id` is not in the list.
    pub async fn select(&self, id: &RestaurantId) -> Result<SelectOutcome, DashboardError> {
        let (token, restaurant, busy) = {
            let mut state = self.lock();
            if !state.loaded {
                return Err(DashboardError::NotReady);
            }
            let restaurant = state
                .restaurants
                .iter()
                .find(|r| &r.id == id)
                .cloned()
                .ok_or_else(|| DashboardError::UnknownRestaurant { id: id.clone() })?;

            state.last_token += 1;
            let token = state.last_token;
            state.selection = Some(Selection {
                token,
                restaurant: restaurant.clone(),
                detail: None,
            });
            (token, restaurant, state.busy_transition())
        };
        self.push_busy(busy);
        log::info!(
            "Selected {id} ({})",
            restaurant.name.as_deref().unwrap_or("unnamed")
        );

        let detail = self.orchestrator.load_detail(id).await;

        let (applied, busy) = {
            let mut state = self.lock();
            let applied = match state.selection.as_mut() {
                Some(selection) if selection.token == token => {
                    selection.detail = Some(detail.clone());
                    true
                }
                _ => false,
            };
            (applied, state.busy_transition())
        };

        if !applied {
            log::debug!("Discarding stale detail for {id} (selection {token} superseded)");
            self.push_busy(busy);
            return Ok(SelectOutcome::Superseded);
        }

        self.presenter
            .show_detail(&DetailView::new(&restaurant, &detail));
        if detail.is_empty() {
            self.presenter.show_warning(DETAIL_WARNING_MESSAGE);
        }
        if let Some(coordinate) = restaurant.coordinate {
            self.renderer.highlight_selection(&restaurant, coordinate);
        }
        self.push_busy(busy);
        Ok(SelectOutcome::Applied)
    }

    /// Where the dashboard is in its load lifecycle.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.lock().phase()
    }

    /// `true` while a load or a detail fetch is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.lock().is_busy()
    }

    /// Snapshot of the current restaurant list.
    #[must_use]
    pub fn restaurants(&self) -> Arc<[RestaurantRecord]> {
        self.lock().restaurants.clone()
    }

    /// Per-zone aggregates of the current list, keyed by zip code.
    #[must_use]
    pub fn zones(&self) -> Arc<BTreeMap<String, ZoneStats>> {
        self.lock().zones.clone()
    }

    /// The zones as last drawn, with their risk tiers.
    #[must_use]
    pub fn classified_zones(&self) -> Arc<[ClassifiedZone]> {
        self.lock().classified.clone()
    }

    /// The restaurant most recently selected, whether or not its detail
    /// has arrived yet.
    #[must_use]
    pub fn selected(&self) -> Option<RestaurantRecord> {
        self.lock().selection.as_ref().map(|s| s.restaurant.clone())
    }

    /// Detail of the current selection, once it has been applied.
    #[must_use]
    pub fn detail(&self) -> Option<Detail> {
        self.lock()
            .selection
            .as_ref()
            .and_then(|s| s.detail.clone())
    }

    #[must_use]
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The presenter, for output the controller itself does not drive.
    #[must_use]
    pub const fn presenter(&self) -> &P {
        &self.presenter
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rat_risk_restaurant_models::{Coordinate, RiskTier};

    use super::*;
    use crate::detail::DetailKind;
    use crate::testing::{
        FakeService, RecordingPresenter, RecordingRenderer, Reply, inspection, located, rat,
        record,
    };

    type TestController = DashboardController<RecordingRenderer, RecordingPresenter>;

    fn controller(service: FakeService) -> TestController {
        DashboardController::new(
            Arc::new(service),
            RecordingRenderer::default(),
            RecordingPresenter::default(),
            &DashboardConfig::default(),
        )
    }

    fn sample() -> Vec<RestaurantRecord> {
        vec![
            located(record("1", "Hana", Some("10001"), Some(0.9)), 40.75, -73.99),
            located(record("2", "Shake Shack", Some("10001"), Some(0.7)), 40.74, -73.98),
            record("3", "Aha Bistro", Some("11201"), Some(0.1)),
            record("4", "No Zip Deli", None, Some(0.9)),
        ]
    }

    #[tokio::test]
    async fn load_draws_classified_zones() {
        let c = controller(FakeService::new().with_list(sample()));
        assert_eq!(c.phase(), Phase::Idle);

        c.load().await.unwrap();

        assert_eq!(c.phase(), Phase::Ready);
        assert_eq!(c.restaurants().len(), 4);
        let zones = c.classified_zones();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].zone, "10001");
        assert_eq!(zones[0].tier, RiskTier::High);
        assert_eq!(zones[0].markers.len(), 2);
        assert_eq!(zones[1].tier, RiskTier::Low);
        assert_eq!(c.renderer().draws().len(), 1);
        assert_eq!(c.presenter().busy(), vec![true, false]);
        assert!(!c.is_busy());
    }

    #[tokio::test]
    async fn load_failure_shows_error_and_leaves_no_data() {
        let c = controller(FakeService::new().with_list(sample()).with_list_failure());
        c.load().await.unwrap();

        let result = c.load().await;
        assert!(matches!(result, Err(DashboardError::Service(_))));
        assert_eq!(c.phase(), Phase::LoadFailed);
        assert!(c.restaurants().is_empty());
        assert!(c.zones().is_empty());
        assert_eq!(c.presenter().errors(), vec![LOAD_ERROR_MESSAGE.to_string()]);
        assert!(c.renderer().draws().last().unwrap().is_empty());
        assert!(!c.is_busy());
        assert_eq!(c.presenter().busy().last(), Some(&false));

        assert!(matches!(
            c.select(&"1".into()).await,
            Err(DashboardError::NotReady)
        ));
    }

    #[tokio::test]
    async fn load_can_be_retried_after_failure() {
        let c = controller(FakeService::new().with_list_failure().with_list(sample()));
        assert!(c.load().await.is_err());
        assert_eq!(c.phase(), Phase::LoadFailed);

        c.load().await.unwrap();
        assert_eq!(c.phase(), Phase::Ready);
        assert_eq!(c.restaurants().len(), 4);
    }

    #[tokio::test]
    async fn select_before_load_is_not_ready() {
        let c = controller(FakeService::new());
        assert!(matches!(
            c.select(&"1".into()).await,
            Err(DashboardError::NotReady)
        ));
        assert!(c.presenter().busy().is_empty());
    }

    #[tokio::test]
    async fn unknown_restaurant_is_rejected() {
        let c = controller(FakeService::new().with_list(sample()));
        c.load().await.unwrap();

        let result = c.select(&"99".into()).await;
        assert!(matches!(
            result,
            Err(DashboardError::UnknownRestaurant { id }) if id.as_str() == "99"
        ));
        assert!(c.selected().is_none());
    }

    #[tokio::test]
    async fn select_presents_detail_and_highlights() {
        let service = FakeService::new()
            .with_list(sample())
            .with_inspection("1", Reply::Found(inspection(Some("A"), 9.0)))
            .with_rat("1", Reply::Found(rat(0.6, Some(0.15))));
        let c = controller(service);
        c.load().await.unwrap();

        let outcome = c.select(&"1".into()).await.unwrap();

        assert_eq!(outcome, SelectOutcome::Applied);
        assert_eq!(c.phase(), Phase::DetailReady);
        let details = c.presenter().details();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].name, "Hana");
        assert_eq!(
            details[0].inspection.as_ref().map(|i| i.grade.as_str()),
            Some("A")
        );
        assert_eq!(c.renderer().highlights(), vec![RestaurantId::from("1")]);
        assert!(c.presenter().warnings().is_empty());
        assert!(!c.is_busy());
    }

    #[tokio::test]
    async fn partial_detail_failure_still_applies() {
        let service = FakeService::new()
            .with_list(sample())
            .with_inspection("3", Reply::Fail)
            .with_rat("3", Reply::Found(rat(0.2, None)));
        let c = controller(service);
        c.load().await.unwrap();

        c.select(&"3".into()).await.unwrap();

        let detail = c.detail().unwrap();
        assert!(detail.inspection.is_none());
        assert!(detail.rat.is_some());
        assert_eq!(detail.failures, vec![DetailKind::Inspection]);
        assert!(c.presenter().warnings().is_empty());
        // No coordinate, no highlight.
        assert!(c.renderer().highlights().is_empty());
    }

    #[tokio::test]
    async fn both_details_missing_warns() {
        let service = FakeService::new()
            .with_list(sample())
            .with_inspection("2", Reply::Fail)
            .with_rat("2", Reply::Fail);
        let c = controller(service);
        c.load().await.unwrap();

        let outcome = c.select(&"2".into()).await.unwrap();

        assert_eq!(outcome, SelectOutcome::Applied);
        assert_eq!(
            c.presenter().warnings(),
            vec![DETAIL_WARNING_MESSAGE.to_string()]
        );
        let details = c.presenter().details();
        assert!(details[0].inspection.is_none());
        assert!(details[0].rat.is_none());
        assert_eq!(c.selected().map(|r| r.id), Some("2".into()));
        assert!(!c.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_earlier_selection_cannot_overwrite_newer_one() {
        let slow = Reply::After(Duration::from_secs(3), Box::new(Reply::Found(rat(0.9, None))));
        let service = FakeService::new()
            .with_list(sample())
            .with_inspection("1", Reply::After(Duration::from_secs(3), Box::new(Reply::Empty)))
            .with_rat("1", slow)
            .with_inspection("2", Reply::Found(inspection(Some("B"), 20.0)))
            .with_rat("2", Reply::Found(rat(0.1, None)));
        let c = controller(service);
        c.load().await.unwrap();

        let (slow_id, fast_id) = (RestaurantId::from("1"), RestaurantId::from("2"));
        let (first, second) = tokio::join!(c.select(&slow_id), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            c.select(&fast_id).await
        });

        assert_eq!(first.unwrap(), SelectOutcome::Superseded);
        assert_eq!(second.unwrap(), SelectOutcome::Applied);
        assert_eq!(c.selected().map(|r| r.id), Some("2".into()));
        let details = c.presenter().details();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].id, RestaurantId::from("2"));
        assert_eq!(c.detail().and_then(|d| d.rat), Some(rat(0.1, None)));
        assert_eq!(c.renderer().highlights(), vec![RestaurantId::from("2")]);
        assert!(!c.is_busy());
        assert_eq!(c.presenter().busy().last(), Some(&false));
    }

    #[tokio::test(start_paused = true)]
    async fn busy_stays_on_while_newer_selection_is_in_flight() {
        let service = FakeService::new()
            .with_list(sample())
            .with_rat("1", Reply::After(Duration::from_secs(1), Box::new(Reply::Empty)))
            .with_rat("2", Reply::After(Duration::from_secs(5), Box::new(Reply::Empty)));
        let c = controller(service);
        c.load().await.unwrap();

        let (first_id, second_id) = (RestaurantId::from("1"), RestaurantId::from("2"));
        let (first, ()) = tokio::join!(c.select(&first_id), async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            let second = c.select(&second_id);
            tokio::pin!(second);
            // Let the first selection finish while the second is pending.
            tokio::select! {
                _ = &mut second => unreachable!("second selection finished early"),
                () = tokio::time::sleep(Duration::from_secs(2)) => {}
            }
            assert!(c.is_busy());
            assert_eq!(c.phase(), Phase::DetailLoading);
            assert_eq!(second.await.unwrap(), SelectOutcome::Applied);
        });

        assert_eq!(first.unwrap(), SelectOutcome::Superseded);
        assert!(!c.is_busy());
    }

    #[tokio::test]
    async fn reload_rehighlights_current_selection() {
        let mut moved = sample();
        moved[0] = located(record("1", "Hana", Some("10001"), Some(0.9)), 40.76, -73.97);
        let c = controller(FakeService::new().with_list(sample()).with_list(moved));
        c.load().await.unwrap();
        c.select(&"1".into()).await.unwrap();
        assert_eq!(c.renderer().highlights().len(), 1);

        c.load().await.unwrap();

        assert_eq!(c.renderer().highlights().len(), 2);
        assert_eq!(c.renderer().draws().len(), 2);
        assert_eq!(
            c.selected().and_then(|r| r.coordinate),
            Some(Coordinate {
                latitude: 40.76,
                longitude: -73.97,
            })
        );
        assert_eq!(c.phase(), Phase::DetailReady);
    }

    #[tokio::test]
    async fn search_distinguishes_not_run_from_no_results() {
        let c = controller(FakeService::new().with_list(sample()));
        c.load().await.unwrap();

        assert_eq!(c.search("h"), SearchOutcome::NotRun);
        assert_eq!(c.search("  zz  "), SearchOutcome::NoResults);

        let outcome = c.search("ha");
        let names: Vec<&str> = outcome.results().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Hana", "Shake Shack", "Aha Bistro"]);
        assert_eq!(c.presenter().searches().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn typed_search_runs_once_per_burst() {
        let c = controller(FakeService::new().with_list(sample()));
        c.load().await.unwrap();

        let (a, b) = tokio::join!(c.search_as_typed("ha"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            c.search_as_typed("han").await
        });

        assert!(a.is_none());
        assert_eq!(b.map(|o| o.results().len()), Some(1));
        assert_eq!(c.presenter().searches().len(), 1);
    }
}
