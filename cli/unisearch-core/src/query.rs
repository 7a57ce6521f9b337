//! Conversion between [FilterState] and URL query parameters.
//!
//! The same key/value pairs are used for the catalog request
//! and for the shareable query string of the listing.

use std::num::NonZeroU32;

use tracing::trace;

use crate::filter::{DEFAULT_PAGE_SIZE, FilterField, FilterState};

pub const SORT_KEY: &str = "sort";
pub const PAGE_KEY: &str = "page";
pub const LIMIT_KEY: &str = "limit";

/// Ordered query parameters.
pub type QueryParams = Vec<(String, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryCodec {
    default_limit: NonZeroU32,
}

impl Default for QueryCodec {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl QueryCodec {
    pub fn new(default_limit: NonZeroU32) -> Self {
        Self { default_limit }
    }

    pub fn default_limit(&self) -> NonZeroU32 {
        self.default_limit
    }

    /// A state with every field at its default.
    pub fn default_state(&self) -> FilterState {
        FilterState::with_limit(self.default_limit)
    }

    /// Encode a state as query parameters.
    ///
    /// Empty fields are omitted; `sort`, `page` and `limit` are always present.
    pub fn encode(&self, state: &FilterState) -> QueryParams {
        let mut params = FilterField::ALL
            .into_iter()
            .filter_map(|field| {
                let value = state.field(field);
                (!value.is_empty()).then(|| (field.key().to_string(), value.to_string()))
            })
            .collect::<QueryParams>();

        params.push((SORT_KEY.to_string(), state.sort.to_string()));
        params.push((PAGE_KEY.to_string(), state.page.to_string()));
        params.push((LIMIT_KEY.to_string(), state.limit.to_string()));
        params
    }

    /// Decode query parameters into a state.
    ///
    /// The first occurrence of a key wins, unknown keys are ignored.
    /// Invalid `sort`, `page` and `limit` values fall back to the defaults.
    pub fn decode<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> FilterState
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut state = self.default_state();
        let mut seen: Vec<String> = Vec::new();

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            if seen.iter().any(|k| k == key) {
                continue;
            }
            seen.push(key.to_string());

            match key {
                SORT_KEY => match value.parse() {
                    Ok(sort) => state.sort = sort,
                    Err(e) => trace!(%e, "ignoring sort parameter"),
                },
                PAGE_KEY => {
                    if let Some(page) = parse_positive(value) {
                        state.page = page;
                    }
                },
                LIMIT_KEY => {
                    if let Some(limit) = parse_positive(value) {
                        state.limit = limit;
                    }
                },
                other => match FilterField::from_key(other) {
                    Some(field) => *state.field_mut(field) = value.to_string(),
                    None => trace!(key = other, "ignoring unknown query parameter"),
                },
            }
        }
        state
    }

    /// Render a state as an `application/x-www-form-urlencoded` query string.
    pub fn to_query_string(&self, state: &FilterState) -> String {
        params_to_query_string(&self.encode(state))
    }

    /// Parse a query string, with or without a leading `?`.
    pub fn from_query_string(&self, query: &str) -> FilterState {
        let query = query.strip_prefix('?').unwrap_or(query);
        self.decode(url::form_urlencoded::parse(query.as_bytes()))
    }
}

/// Serialize ordered parameters into a query string.
pub fn params_to_query_string(params: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

/// Parse a strictly positive integer, rejecting fractions, signs and garbage.
fn parse_positive(value: &str) -> Option<NonZeroU32> {
    value.trim().parse::<NonZeroU32>().ok()
}
