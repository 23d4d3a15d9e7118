#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard state machine for the restaurant rat-risk view.
//!
//! [`controller::DashboardController`] owns the restaurant list, the
//! per-zone aggregates, and the current selection. It is the only
//! component that talks to the outside world: the
//! [`DataService`](rat_risk_source::DataService) for data, a [`Renderer`]
//! for the map, and a [`Presenter`] for everything textual. Both
//! collaborators are traits so that front ends (and tests) can plug in
//! their own.

pub mod config;
pub mod controller;
pub mod debounce;
pub mod detail;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

use rat_risk_analytics::search::SearchOutcome;
use rat_risk_analytics_models::ClassifiedZone;
use rat_risk_restaurant_models::{Coordinate, RestaurantId, RestaurantRecord};
use rat_risk_source::ServiceError;

use crate::view::{DetailView, SearchResultView};

/// Errors returned by dashboard operations.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// No restaurant list has been loaded yet.
    #[error("Restaurant data has not been loaded")]
    NotReady,

    /// The selected id is not in the current restaurant list.
    #[error("Unknown restaurant {id}")]
    UnknownRestaurant {
        /// The id that was requested.
        id: RestaurantId,
    },

    /// The data service call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Map drawing collaborator.
pub trait Renderer: Send + Sync {
    /// Replaces every zone marker on the map.
    fn draw_zones(&self, zones: &[ClassifiedZone]);

    /// Draws the highlighted marker for the selected restaurant and
    /// recenters the view on it.
    fn highlight_selection(&self, restaurant: &RestaurantRecord, coordinate: Coordinate);
}

/// Text and indicator collaborator.
pub trait Presenter: Send + Sync {
    /// Shows or hides the busy overlay.
    fn set_busy(&self, busy: bool);

    /// Shows a user-visible error.
    fn show_error(&self, message: &str);

    /// Shows a user-visible warning.
    fn show_warning(&self, message: &str);

    /// Shows the search dropdown (or hides it for
    /// [`SearchOutcome::NotRun`]).
    fn show_search(&self, outcome: &SearchOutcome<SearchResultView>);

    /// Shows the selected restaurant's detail panel.
    fn show_detail(&self, detail: &DetailView);
}
