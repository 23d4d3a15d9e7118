//! Fakes for the data service and the two front-end collaborators.

use std::collections::{BTreeMap, VecDeque};
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rat_risk_analytics::search::SearchOutcome;
use rat_risk_analytics_models::ClassifiedZone;
use rat_risk_restaurant_models::{
    Coordinate, InspectionDetail, RatDetail, RestaurantId, RestaurantRecord,
};
use rat_risk_source::{DataService, ServiceError};

use crate::view::{DetailView, SearchResultView};
use crate::{Presenter, Renderer};

pub fn record(
    id: &str,
    name: &str,
    zip: Option<&str>,
    zone_rate: Option<f64>,
) -> RestaurantRecord {
    RestaurantRecord {
        id: id.into(),
        name: Some(name.to_string()),
        zipcode: zip.map(String::from),
        zip_rat_activity_rate_6m: zone_rate,
        ..RestaurantRecord::default()
    }
}

pub fn located(mut record: RestaurantRecord, latitude: f64, longitude: f64) -> RestaurantRecord {
    record.coordinate = Some(Coordinate {
        latitude,
        longitude,
    });
    record
}

pub fn inspection(grade: Option<&str>, score: f64) -> InspectionDetail {
    InspectionDetail {
        average_score: Some(score),
        grade: grade.map(String::from),
        ..InspectionDetail::default()
    }
}

pub fn rat(rate: f64, trend: Option<f64>) -> RatDetail {
    RatDetail {
        rat_activity_rate_6m: Some(rate),
        rat_activity_trend_6m: trend,
        ..RatDetail::default()
    }
}

fn failure() -> ServiceError {
    ServiceError::Status {
        status: 500,
        url: "http://fake/query".to_string(),
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted answer to one detail lookup.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Found(T),
    Empty,
    Fail,
    /// Never completes.
    Hang,
    /// Answers with the inner reply after a delay.
    After(Duration, Box<Self>),
}

type Resolved<'a, T> =
    Pin<Box<dyn Future<Output = Result<Option<T>, ServiceError>> + Send + 'a>>;

impl<T: Clone + Send + Sync> Reply<T> {
    fn resolve(&self) -> Resolved<'_, T> {
        Box::pin(async move {
            match self {
                Self::Found(value) => Ok(Some(value.clone())),
                Self::Empty => Ok(None),
                Self::Fail => Err(failure()),
                Self::Hang => std::future::pending().await,
                Self::After(delay, inner) => {
                    tokio::time::sleep(*delay).await;
                    inner.resolve().await
                }
            }
        })
    }
}

/// In-memory [`DataService`]. List replies are consumed in order; once
/// they run out every list fetch fails. Ids without a scripted detail
/// reply find nothing.
#[derive(Default)]
pub struct FakeService {
    lists: Mutex<VecDeque<Option<Vec<RestaurantRecord>>>>,
    inspections: BTreeMap<RestaurantId, Reply<InspectionDetail>>,
    rats: BTreeMap<RestaurantId, Reply<RatDetail>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(self, records: Vec<RestaurantRecord>) -> Self {
        lock(&self.lists).push_back(Some(records));
        self
    }

    pub fn with_list_failure(self) -> Self {
        lock(&self.lists).push_back(None);
        self
    }

    pub fn with_inspection(mut self, id: &str, reply: Reply<InspectionDetail>) -> Self {
        self.inspections.insert(id.into(), reply);
        self
    }

    pub fn with_rat(mut self, id: &str, reply: Reply<RatDetail>) -> Self {
        self.rats.insert(id.into(), reply);
        self
    }
}

#[async_trait]
impl DataService for FakeService {
    async fn fetch_restaurants(&self) -> Result<Vec<RestaurantRecord>, ServiceError> {
        let next = lock(&self.lists).pop_front();
        next.flatten().ok_or_else(failure)
    }

    async fn latest_inspection(
        &self,
        id: &RestaurantId,
    ) -> Result<Option<InspectionDetail>, ServiceError> {
        match self.inspections.get(id) {
            Some(reply) => reply.resolve().await,
            None => Ok(None),
        }
    }

    async fn rat_summary(&self, id: &RestaurantId) -> Result<Option<RatDetail>, ServiceError> {
        match self.rats.get(id) {
            Some(reply) => reply.resolve().await,
            None => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct RecordingRenderer {
    draws: Mutex<Vec<Vec<ClassifiedZone>>>,
    highlights: Mutex<Vec<(RestaurantId, Coordinate)>>,
}

impl RecordingRenderer {
    pub fn draws(&self) -> Vec<Vec<ClassifiedZone>> {
        lock(&self.draws).clone()
    }

    pub fn highlights(&self) -> Vec<RestaurantId> {
        lock(&self.highlights).iter().map(|(id, _)| id.clone()).collect()
    }
}

impl Renderer for RecordingRenderer {
    fn draw_zones(&self, zones: &[ClassifiedZone]) {
        lock(&self.draws).push(zones.to_vec());
    }

    fn highlight_selection(&self, restaurant: &RestaurantRecord, coordinate: Coordinate) {
        lock(&self.highlights).push((restaurant.id.clone(), coordinate));
    }
}

#[derive(Default)]
pub struct RecordingPresenter {
    busy: Mutex<Vec<bool>>,
    errors: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
    searches: Mutex<Vec<SearchOutcome<SearchResultView>>>,
    details: Mutex<Vec<DetailView>>,
}

impl RecordingPresenter {
    pub fn busy(&self) -> Vec<bool> {
        lock(&self.busy).clone()
    }

    pub fn errors(&self) -> Vec<String> {
        lock(&self.errors).clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        lock(&self.warnings).clone()
    }

    pub fn searches(&self) -> Vec<SearchOutcome<SearchResultView>> {
        lock(&self.searches).clone()
    }

    pub fn details(&self) -> Vec<DetailView> {
        lock(&self.details).clone()
    }
}

impl Presenter for RecordingPresenter {
    fn set_busy(&self, busy: bool) {
        lock(&self.busy).push(busy);
    }

    fn show_error(&self, message: &str) {
        lock(&self.errors).push(message.to_string());
    }

    fn show_warning(&self, message: &str) {
        lock(&self.warnings).push(message.to_string());
    }

    fn show_search(&self, outcome: &SearchOutcome<SearchResultView>) {
        lock(&self.searches).push(outcome.clone());
    }

    fn show_detail(&self, detail: &DetailView) {
        lock(&self.details).push(detail.clone());
    }
}
