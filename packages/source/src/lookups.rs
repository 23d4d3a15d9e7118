//! Compile-time registry of parameterized detail lookups.
//!
//! Each lookup the dashboard issues against `POST /query` is defined in a
//! TOML file under `lookups/` and embedded at compile time. A definition
//! names the table, the key column, an optional ordering, and a row limit;
//! the query text it produces contains a single `?` placeholder and the
//! establishment identifier travels separately in
//! [`QueryRequest::params`]. Identifiers are never spliced into query
//! text.

use std::collections::BTreeMap;

use rat_risk_restaurant_models::RestaurantId;
use serde::{Deserialize, Serialize};

use crate::ServiceError;

/// The lookups the dashboard needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lookup {
    /// Most recent inspection row for an establishment.
    InspectionLatest,
    /// Pre-aggregated rat-activity row for an establishment.
    RatSummary,
}

impl Lookup {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::InspectionLatest, Self::RatSummary]
    }

    /// Registry id of the lookup's TOML definition.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::InspectionLatest => "inspection_latest",
            Self::RatSummary => "rat_summary",
        }
    }
}

/// Ordering applied before the row limit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderBy {
    /// Column to sort by.
    pub column: String,
    /// Sort newest/largest first.
    #[serde(default)]
    pub descending: bool,
}

/// A lookup definition loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LookupDefinition {
    /// Unique identifier (e.g., `"inspection_latest"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Schema-qualified table name.
    pub table: String,
    /// Column compared against the bound establishment identifier.
    pub key_column: String,
    /// Optional ordering.
    pub order_by: Option<OrderBy>,
    /// Maximum number of rows returned.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

const fn default_limit() -> u32 {
    1
}

/// Body of a `POST /query` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    /// Lookup text with `?` placeholders.
    pub query: String,
    /// Values bound to the placeholders, in order.
    pub params: Vec<String>,
}

impl LookupDefinition {
    /// Renders the lookup text with a single `?` placeholder for the key.
    #[must_use]
    pub fn query_text(&self) -> String {
        let mut text = format!(
            "SELECT * FROM {} WHERE {} = ?",
            self.table, self.key_column
        );
        if let Some(order) = &self.order_by {
            text.push_str(" ORDER BY ");
            text.push_str(&order.column);
            text.push_str(if order.descending { " DESC" } else { " ASC" });
        }
        text.push_str(&format!(" LIMIT {}", self.limit));
        text
    }

    /// Builds the request that looks up `id`.
    #[must_use]
    pub fn request(&self, id: &RestaurantId) -> QueryRequest {
        QueryRequest {
            query: self.query_text(),
            params: vec![id.as_str().to_string()],
        }
    }

    fn validate(&self) -> Result<(), ServiceError> {
        let invalid = |what: &str, value: &str| ServiceError::Lookup {
            message: format!("lookup '{}' has invalid {what} {value:?}", self.id),
        };

        if !is_qualified_identifier(&self.table) {
            return Err(invalid("table", &self.table));
        }
        if !is_identifier(&self.key_column) {
            return Err(invalid("key column", &self.key_column));
        }
        if let Some(order) = &self.order_by
            && !is_identifier(&order.column)
        {
            return Err(invalid("order column", &order.column));
        }
        if self.limit == 0 {
            return Err(invalid("limit", "0"));
        }
        Ok(())
    }
}

/// Returns `true` for a plain SQL identifier: an ASCII letter or `_`
/// followed by ASCII letters, digits, or `_`.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns `true` for one or more dot-separated identifiers.
fn is_qualified_identifier(s: &str) -> bool {
    s.split('.').all(is_identifier)
}

// ── Compile-time embedded TOML files ────────────────────────────────

const LOOKUP_TOMLS: &[(&str, &str)] = &[
    (
        "inspection_latest",
        include_str!("../lookups/inspection_latest.toml"),
    ),
    ("rat_summary", include_str!("../lookups/rat_summary.toml")),
];

/// Validated set of lookup definitions, keyed by id.
#[derive(Debug, Clone)]
pub struct LookupRegistry {
    lookups: BTreeMap<String, LookupDefinition>,
}

impl LookupRegistry {
    /// Loads the embedded lookup definitions.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Lookup`] if a definition fails to parse or
    /// validate, or a required lookup is missing.
    pub fn load() -> Result<Self, ServiceError> {
        Self::from_tomls(LOOKUP_TOMLS)
    }

    /// Loads lookup definitions from `(name, toml)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Lookup`] if a definition fails to parse or
    /// validate, an id is duplicated, or a required lookup is missing.
    pub fn from_tomls(tomls: &[(&str, &str)]) -> Result<Self, ServiceError> {
        let mut lookups = BTreeMap::new();

        for (name, toml_str) in tomls {
            let def: LookupDefinition =
                toml::de::from_str(toml_str).map_err(|e| ServiceError::Lookup {
                    message: format!("failed to parse lookup '{name}': {e}"),
                })?;
            def.validate()?;

            if lookups.contains_key(&def.id) {
                return Err(ServiceError::Lookup {
                    message: format!("duplicate lookup id '{}'", def.id),
                });
            }
            lookups.insert(def.id.clone(), def);
        }

        if let Some(missing) = Lookup::all().iter().find(|l| !lookups.contains_key(l.id())) {
            return Err(ServiceError::Lookup {
                message: format!("required lookup '{}' is not defined", missing.id()),
            });
        }

        Ok(Self { lookups })
    }

    /// Returns the definition for `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Lookup`] if the definition is missing. This
    /// cannot happen for a registry built by [`Self::from_tomls`].
    pub fn get(&self, lookup: Lookup) -> Result<&LookupDefinition, ServiceError> {
        self.lookups
            .get(lookup.id())
            .ok_or_else(|| ServiceError::Lookup {
                message: format!("lookup '{}' is not defined", lookup.id()),
            })
    }

    /// Iterates over every loaded definition in id order.
    pub fn iter(&self) -> impl Iterator<Item = &LookupDefinition> {
        self.lookups.values()
    }
}
