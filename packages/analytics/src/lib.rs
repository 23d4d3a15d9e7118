#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zone aggregation, risk classification, and name search.
//!
//! Everything in this crate is a pure function over an in-memory
//! restaurant list. The dashboard controller owns the list and calls
//! into these modules whenever it changes or the analyst types a query:
//!
//! - [`zones::aggregate`] groups records by ZIP code.
//! - [`classifier::classify`] maps a mean activity rate to a
//!   [`RiskTier`](rat_risk_restaurant_models::RiskTier).
//! - [`search::search`] runs the incremental name search.

pub mod classifier;
pub mod search;
pub mod zones;
