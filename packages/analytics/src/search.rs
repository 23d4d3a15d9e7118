//! Incremental substring search over establishment names.

use rat_risk_restaurant_models::RestaurantRecord;
use serde::Serialize;

/// Number of results shown in the search dropdown.
pub const DEFAULT_LIMIT: usize = 10;

/// Shortest query (in characters, after trimming) that triggers a search.
pub const MIN_QUERY_CHARS: usize = 2;

/// A trimmed, non-trivial search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Trims `raw` and accepts it if it has at least [`MIN_QUERY_CHARS`]
    /// characters.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (trimmed.chars().count() >= MIN_QUERY_CHARS).then(|| Self(trimmed.to_string()))
    }

    /// Returns the trimmed query text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What the search dropdown should show.
///
/// `NotRun` (query too short, dropdown hidden) is deliberately distinct
/// from `NoResults` ("No restaurants found"). Serializes as
/// `{"state": "not_run" | "no_results" | "results", "results": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "results", rename_all = "snake_case")]
pub enum SearchOutcome<T> {
    /// No search has been run for the current input.
    NotRun,
    /// The search ran and matched nothing.
    NoResults,
    /// Matches in source-list order.
    Results(Vec<T>),
}

impl<T> SearchOutcome<T> {
    /// Wraps a result list, mapping an empty list to [`Self::NoResults`].
    #[must_use]
    pub fn from_results(results: Vec<T>) -> Self {
        if results.is_empty() {
            Self::NoResults
        } else {
            Self::Results(results)
        }
    }

    /// Maps each result, preserving the outcome variant.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> SearchOutcome<U> {
        match self {
            Self::NotRun => SearchOutcome::NotRun,
            Self::NoResults => SearchOutcome::NoResults,
            Self::Results(results) => SearchOutcome::Results(results.into_iter().map(f).collect()),
        }
    }

    /// Returns the matches, or an empty slice when there are none.
    #[must_use]
    pub fn results(&self) -> &[T] {
        match self {
            Self::Results(results) => results,
            Self::NotRun | Self::NoResults => &[],
        }
    }
}

/// Returns up to `limit` records whose display name contains `query`,
/// ignoring case.
///
/// Matches keep their order in `records`. Records without a name never
/// match, and an empty query matches nothing.
#[must_use]
pub fn search<'a>(
    query: &str,
    records: &'a [RestaurantRecord],
    limit: usize,
) -> Vec<&'a RestaurantRecord> {
    if query.is_empty() {
        return Vec::new();
    }

    let needle = query.to_lowercase();

    records
        .iter()
        .filter(|r| {
            r.name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&needle))
        })
        .take(limit)
        .collect()
}
