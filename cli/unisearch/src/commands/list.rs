use std::num::NonZeroU32;

use anyhow::{Result, bail};
use bpaf::Bpaf;
use serde_json::json;
use tracing::{debug, instrument};
use unisearch_catalog::ClientTrait;
use unisearch_core::filter::{FilterField, FilterState, SortKey};
use unisearch_core::QueryCodec;
use unisearch_sdk::badges::badges;
use unisearch_sdk::list::{ListController, ListState};
use unisearch_sdk::lock_profile;

use super::Session;
use crate::utils::message;
use crate::utils::render::{render_card, render_pagination};

#[derive(Debug, Default, Bpaf, Clone)]
pub struct FilterFlags {
    /// Search universities by name
    #[bpaf(long("search"), short('s'), argument("TEXT"))]
    q: Option<String>,

    #[bpaf(argument("COUNTRY"))]
    country: Option<String>,

    #[bpaf(argument("CITY"))]
    city: Option<String>,

    /// Only universities offering this major
    #[bpaf(argument("MAJOR"))]
    major: Option<String>,

    /// e.g. Bachelor, Master
    #[bpaf(argument("LEVEL"))]
    study_level: Option<String>,

    /// e.g. On-campus, Online
    #[bpaf(argument("FORMAT"))]
    format: Option<String>,

    #[bpaf(argument("USD"))]
    min_tuition: Option<String>,
    #[bpaf(argument("USD"))]
    max_tuition: Option<String>,

    #[bpaf(argument("PERCENT"))]
    min_acceptance: Option<String>,
    #[bpaf(argument("PERCENT"))]
    max_acceptance: Option<String>,

    #[bpaf(argument("SCORE"))]
    min_ielts: Option<String>,
    #[bpaf(argument("SCORE"))]
    max_ielts: Option<String>,

    #[bpaf(argument("SCORE"))]
    min_gpa: Option<String>,
    #[bpaf(argument("SCORE"))]
    max_gpa: Option<String>,
}

impl FilterFlags {
    /// Set the given filters, returning whether any was given.
    fn apply(self, filter: &mut FilterState) -> bool {
        let flags = [
            (FilterField::Query, self.q),
            (FilterField::Country, self.country),
            (FilterField::City, self.city),
            (FilterField::Major, self.major),
            (FilterField::StudyLevel, self.study_level),
            (FilterField::Format, self.format),
            (FilterField::MinTuition, self.min_tuition),
            (FilterField::MaxTuition, self.max_tuition),
            (FilterField::MinAcceptance, self.min_acceptance),
            (FilterField::MaxAcceptance, self.max_acceptance),
            (FilterField::MinIelts, self.min_ielts),
            (FilterField::MaxIelts, self.max_ielts),
            (FilterField::MinGpa, self.min_gpa),
            (FilterField::MaxGpa, self.max_gpa),
        ];

        let mut changed = false;
        for (field, value) in flags {
            if let Some(value) = value {
                filter.set(field, value);
                changed = true;
            }
        }
        changed
    }
}

// Search the catalog
#[derive(Debug, Bpaf, Clone)]
pub struct List {
    /// Start from a shared query string, e.g. 'country=Germany&sort=tuition_asc'
    #[bpaf(long, argument("QUERY"))]
    query: Option<String>,

    #[bpaf(external(filter_flags))]
    filters: FilterFlags,

    /// Sort order: name_asc, name_desc, rating_desc, tuition_asc, tuition_desc,
    /// acceptance_asc or acceptance_desc
    #[bpaf(long, argument("SORT"))]
    sort: Option<SortKey>,

    /// Page to show, starting at 1
    #[bpaf(long, argument("PAGE"))]
    page: Option<u32>,

    /// Universities per page
    #[bpaf(long, argument("LIMIT"))]
    limit: Option<NonZeroU32>,

    /// Print the result as JSON
    #[bpaf(long)]
    json: bool,
}

impl List {
    #[instrument(name = "list", skip_all)]
    pub async fn handle(self, session: Session) -> Result<()> {
        let codec = session.codec();
        let filter = self.filter_state(&codec);
        let requested_page = filter.page.get();

        let controller =
            ListController::new(session.client, codec, session.profile.clone()).with_filter(filter);
        let state = search(&controller, requested_page).await;
        let query = controller.url_query();

        if self.json {
            let output = json!({ "query": query, "result": state });
            println!("{}", serde_json::to_string_pretty(&output)?);
            if let ListState::Failed { message } = state {
                bail!(message);
            }
            return Ok(());
        }

        match state {
            ListState::Loaded {
                items,
                pagination,
                total,
            } => {
                let profile = lock_profile(&session.profile).profile().clone();
                println!("{total} universities found");
                for item in &items {
                    println!("\n{}", render_card(item, &badges(item, &profile)));
                }
                if let Some(navigation) = pagination.as_ref().and_then(render_pagination) {
                    println!("\n{navigation}");
                }
            },
            ListState::Empty { total } => {
                debug!(total, "no results");
                message::plain("No universities match the selected filters.");
            },
            ListState::Failed { message } => bail!(message),
            ListState::Idle | ListState::Loading => bail!("search did not complete"),
        }

        message::plain(format!("Share this search: ?{query}"));
        Ok(())
    }

    /// The filter to search with.
    ///
    /// Flags override the shared query, changing a filter returns to page 1
    /// unless a page is given explicitly.
    fn filter_state(&self, codec: &QueryCodec) -> FilterState {
        let mut filter = match &self.query {
            Some(query) => codec.from_query_string(query),
            None => codec.default_state(),
        };

        let mut changed = self.filters.clone().apply(&mut filter);
        if let Some(sort) = self.sort {
            filter.sort = sort;
            changed = true;
        }
        if let Some(limit) = self.limit {
            filter.limit = limit;
            changed = true;
        }

        match self.page {
            Some(page) => filter.page = NonZeroU32::new(page).unwrap_or(NonZeroU32::MIN),
            None if changed => filter.page = NonZeroU32::MIN,
            None => {},
        }
        filter
    }
}

/// Fetch once, moving to the last page if the requested one is past the end.
async fn search<C: ClientTrait>(controller: &ListController<C>, requested_page: u32) -> ListState {
    controller.refresh().await;

    if let (ListState::Empty { .. }, Some(pagination)) =
        (controller.state(), controller.last_pagination())
    {
        if pagination.page_count() > 0 && requested_page > pagination.page_count() {
            debug!(requested_page, page_count = pagination.page_count(), "page out of range");
            controller.go_to_page(requested_page).await;
        }
    }

    controller.state()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use unisearch_catalog::mock::{MockClient, MockReply};
    use unisearch_catalog::{CatalogRecord, ListResponse};
    use unisearch_core::profile::{MemoryBackend, ProfileStore};
    use unisearch_sdk::shared_profile;

    use super::*;

    fn list(query: Option<&str>) -> List {
        List {
            query: query.map(str::to_string),
            filters: FilterFlags::default(),
            sort: None,
            page: None,
            limit: None,
            json: false,
        }
    }

    #[test]
    fn shared_query_is_kept() {
        let codec = QueryCodec::default();
        let filter = list(Some("?country=Germany&page=3&sort=tuition_asc")).filter_state(&codec);

        assert_eq!(filter.country, "Germany");
        assert_eq!(filter.sort, SortKey::TuitionAsc);
        assert_eq!(filter.page.get(), 3);
    }

    #[test]
    fn flags_override_query_and_reset_page() {
        let codec = QueryCodec::default();
        let mut args = list(Some("country=Germany&city=Berlin&page=3"));
        args.filters.country = Some("France".to_string());
        args.filters.q = Some("  sorbonne ".to_string());

        let filter = args.filter_state(&codec);

        assert_eq!(filter.country, "France");
        assert_eq!(filter.city, "Berlin");
        assert_eq!(filter.q, "sorbonne");
        assert_eq!(filter.page.get(), 1);
    }

    #[test]
    fn explicit_page_wins() {
        let codec = QueryCodec::default();
        let mut args = list(None);
        args.sort = Some(SortKey::RatingDesc);
        args.page = Some(2);
        assert_eq!(args.filter_state(&codec).page.get(), 2);

        args.page = Some(0);
        assert_eq!(args.filter_state(&codec).page.get(), 1);
    }

    #[tokio::test]
    async fn page_past_the_end_moves_to_last_page() {
        let profile = shared_profile(ProfileStore::open(MemoryBackend::new()));
        let client = MockClient::new();
        client
            .push_list(MockReply::ok(ListResponse {
                items: vec![],
                total: Some(37),
                count: Some(0),
            }))
            .push_list(MockReply::ok(ListResponse {
                items: vec![CatalogRecord::new(serde_json::json!({ "name": "Last" }))],
                total: Some(37),
                count: Some(1),
            }));

        let mut filter = QueryCodec::default().default_state();
        filter.page = NonZeroU32::new(10).unwrap();
        let controller =
            ListController::new(client, QueryCodec::default(), profile).with_filter(filter);

        let state = search(&controller, 10).await;

        assert_eq!(state.items().len(), 1);
        assert_eq!(state.pagination().unwrap().current_page().get(), 4);
        assert_eq!(controller.url_query(), "sort=name_asc&page=4&limit=12");
    }
}
