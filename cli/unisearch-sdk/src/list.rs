//! The university listing.
//!
//! [ListController] owns the current [FilterState] and the most recent
//! result. Every filter mutation starts a new fetch; responses that arrive
//! after a newer fetch has started are discarded.

use std::num::NonZeroU32;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, instrument};
use unisearch_catalog::{CatalogClientError, CatalogRecord, ClientTrait, ListResponse};
use unisearch_core::filter::{FilterField, FilterState};
use unisearch_core::pagination::PaginationDescriptor;
use unisearch_core::query::{QueryCodec, QueryParams, params_to_query_string};

use crate::debounce::Debounce;
use crate::profile::profile_params;
use crate::{SharedProfile, failure_message, lock_profile};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ListState {
    #[default]
    Idle,
    Loading,
    Loaded {
        items: Vec<CatalogRecord>,
        /// Absent when the catalog didn't report a total.
        pagination: Option<PaginationDescriptor>,
        total: u64,
    },
    Empty {
        total: u64,
    },
    Failed {
        message: String,
    },
}

impl ListState {
    pub fn items(&self) -> &[CatalogRecord] {
        match self {
            ListState::Loaded { items, .. } => items,
            _ => &[],
        }
    }

    pub fn pagination(&self) -> Option<&PaginationDescriptor> {
        match self {
            ListState::Loaded { pagination, .. } => pagination.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Inner {
    filter: FilterState,
    state: ListState,
    /// Incremented for every fetch, a response is only applied if it still matches.
    sequence: u64,
    url_query: String,
    last_pagination: Option<PaginationDescriptor>,
}

#[derive(Debug)]
pub struct ListController<C> {
    client: C,
    codec: QueryCodec,
    profile: SharedProfile,
    debounce: Debounce,
    inner: Mutex<Inner>,
}

impl<C: ClientTrait> ListController<C> {
    pub fn new(client: C, codec: QueryCodec, profile: SharedProfile) -> Self {
        let filter = codec.default_state();
        Self {
            client,
            codec,
            profile,
            debounce: Debounce::default(),
            inner: Mutex::new(Inner {
                filter,
                state: ListState::Idle,
                sequence: 0,
                url_query: String::new(),
                last_pagination: None,
            }),
        }
    }

    /// Start from a filter, e.g. one decoded from a shared query string.
    pub fn with_filter(self, filter: FilterState) -> Self {
        self.lock().filter = filter;
        self
    }

    pub fn with_debounce(mut self, debounce: Debounce) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn filter(&self) -> FilterState {
        self.lock().filter.clone()
    }

    pub fn state(&self) -> ListState {
        self.lock().state.clone()
    }

    /// Pagination of the most recent response that reported a total.
    pub fn last_pagination(&self) -> Option<PaginationDescriptor> {
        self.lock().last_pagination
    }

    /// The shareable query string of the most recent fetch.
    ///
    /// Only filter parameters are included, never profile-derived ones.
    pub fn url_query(&self) -> String {
        self.lock().url_query.clone()
    }

    /// Fetch with the current filter.
    pub async fn refresh(&self) {
        self.fetch().await
    }

    /// Apply a structural filter change and fetch immediately.
    ///
    /// The page returns to 1 and any pending text edit is dropped.
    pub async fn update_filter(&self, change: impl FnOnce(&mut FilterState)) {
        self.debounce.cancel();
        {
            let mut inner = self.lock();
            change(&mut inner.filter);
            inner.filter.page = NonZeroU32::MIN;
            inner.last_pagination = None;
        }
        self.fetch().await
    }

    /// Apply a text edit, fetching once input has settled.
    ///
    /// Returns whether this edit triggered the fetch.
    pub async fn edit_text(&self, field: FilterField, value: impl Into<String>) -> bool {
        {
            let mut inner = self.lock();
            inner.filter.set(field, value);
            inner.filter.page = NonZeroU32::MIN;
            inner.last_pagination = None;
            // results on screen no longer match the filter
            inner.sequence += 1;
            inner.state = ListState::Loading;
        }
        if !self.debounce.settle().await {
            return false;
        }
        self.fetch().await;
        true
    }

    /// Move to a page, clamped to the known page range.
    pub async fn go_to_page(&self, page: u32) {
        {
            let mut inner = self.lock();
            inner.filter.page = match &inner.last_pagination {
                Some(pagination) => pagination.clamp(page),
                None => NonZeroU32::new(page).unwrap_or(NonZeroU32::MIN),
            };
        }
        self.fetch().await
    }

    /// Clear every filter but keep the page size.
    pub async fn reset(&self) {
        self.debounce.cancel();
        {
            let mut inner = self.lock();
            inner.filter.reset();
            inner.last_pagination = None;
        }
        self.fetch().await
    }

    #[instrument(skip(self))]
    async fn fetch(&self) {
        let (sequence, params) = self.begin_fetch();
        let result = self.client.list_universities(&params).await;
        self.finish_fetch(sequence, result);
    }

    fn begin_fetch(&self) -> (u64, QueryParams) {
        let mut inner = self.lock();
        inner.sequence += 1;
        inner.state = ListState::Loading;

        let filter_params = self.codec.encode(&inner.filter);
        inner.url_query = params_to_query_string(&filter_params);

        let mut params = filter_params;
        params.extend(profile_params(
            lock_profile(&self.profile).profile(),
            &inner.filter,
        ));
        debug!(sequence = inner.sequence, query = %inner.url_query, "fetching universities");
        (inner.sequence, params)
    }

    fn finish_fetch(&self, sequence: u64, result: Result<ListResponse, CatalogClientError>) {
        let mut inner = self.lock();
        if inner.sequence != sequence {
            debug!(sequence, latest = inner.sequence, "discarding superseded response");
            return;
        }

        inner.state = match result {
            Ok(response) => {
                let total = response.total_label();
                let pagination = response.total.map(|total_items| {
                    PaginationDescriptor::new(total_items, inner.filter.limit, inner.filter.page)
                });
                // the page range only holds for the filter that produced it
                inner.last_pagination = pagination;
                if response.items.is_empty() {
                    ListState::Empty { total }
                } else {
                    ListState::Loaded {
                        items: response.items,
                        pagination,
                        total,
                    }
                }
            },
            Err(e) => {
                debug!(error = %e, "listing failed");
                inner.last_pagination = None;
                ListState::Failed {
                    message: failure_message(&e),
                }
            },
        };
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("list controller mutex poisoned")
    }
}
