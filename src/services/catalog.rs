//! Catalog query state
//!
//! Owns the filter/sort/pagination record and keeps three copies of it in
//! step: the in-memory record, the navigable catalog URL, and the persisted
//! preference blob (which never stores the page number). Server filters
//! produce [`FetchTicket`]s; client refinements only re-derive the displayed
//! list from the page already fetched.
//!
//! Every fetch is tagged with a generation number and only the result of the
//! most recently issued fetch is applied, so rapid filter changes cannot leave
//! an older response on screen.

use std::rc::Rc;
use std::str::FromStr;
use std::time::{Duration, Instant};

use indexmap::IndexSet;
use reqwest::Url;

use super::debounce::Debouncer;
use crate::{
    api::LibraryApi,
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::{
        book::{Book, BookPage, BookQuery},
        filters::{CatalogFilters, FilterKey, FilterPreferences, SortKey, StatusFilter, YearRange},
        reference::Category,
    },
    storage::{keys, load_json, save_json, KeyValueStore},
};

const URL_KEYS: &[&str] = &[
    "q",
    "category",
    "categorySlug",
    "publisher",
    "faculty",
    "department",
    "year",
    "page",
    "limit",
    "status",
    "sort",
    "yearMin",
    "yearMax",
];

/// What the catalog view should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogStatus {
    Idle,
    Loading,
    Loaded,
    Empty,
    Failed(String),
}

/// A server query tagged with the generation that issued it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: BookQuery,
}

impl FetchTicket {
    /// Perform the request; the result still has to go through `complete_fetch`
    pub async fn run(self, api: &dyn LibraryApi) -> FetchResult {
        let result = api.list_books(&self.query).await;
        FetchResult {
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug)]
pub struct FetchResult {
    pub generation: u64,
    pub result: AppResult<BookPage>,
}

pub struct CatalogQuery {
    filters: CatalogFilters,
    default_limit: u32,
    base_url: Url,
    url: Url,
    storage: Rc<dyn KeyValueStore>,
    search: Debouncer<String>,
    search_text: String,
    generation: u64,
    status: CatalogStatus,
    fetched: Vec<Book>,
    total: u64,
    pages: u32,
    displayed: Vec<Book>,
    selection: IndexSet<String>,
    categories_resolved: bool,
    scroll_requested: bool,
}

impl CatalogQuery {
    /// Build the initial state: URL parameters win, then persisted preferences, then defaults
    pub fn new(
        config: &CatalogConfig,
        storage: Rc<dyn KeyValueStore>,
        initial_url: Option<&Url>,
    ) -> AppResult<Self> {
        let base_url = Url::parse(&config.app_url)
            .map_err(|e| AppError::Validation(format!("Invalid catalog URL '{}': {}", config.app_url, e)))?;
        let default_limit = config.page_size.max(1);

        let filters = match initial_url.filter(|u| has_filter_params(u)) {
            Some(url) => {
                tracing::debug!("Catalog filters initialized from URL");
                Self::parse_url(url, default_limit)
            }
            None => match load_json::<FilterPreferences>(storage.as_ref(), keys::CATALOG_FILTERS) {
                Some(prefs) => {
                    tracing::debug!("Catalog filters restored from preferences");
                    prefs.into_filters(default_limit)
                }
                None => CatalogFilters::with_limit(default_limit),
            },
        };

        let search_text = filters.q.clone().unwrap_or_default();
        let mut catalog = Self {
            filters,
            default_limit,
            url: base_url.clone(),
            base_url,
            storage,
            search: Debouncer::new(Duration::from_millis(config.search_debounce_ms)),
            search_text,
            generation: 0,
            status: CatalogStatus::Idle,
            fetched: Vec::new(),
            total: 0,
            pages: 1,
            displayed: Vec::new(),
            selection: IndexSet::new(),
            categories_resolved: false,
            scroll_requested: false,
        };
        catalog.sync_url();
        Ok(catalog)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn filters(&self) -> &CatalogFilters {
        &self.filters
    }

    pub fn status(&self) -> &CatalogStatus {
        &self.status
    }

    /// Fetched page after status, year-range and sort refinements
    pub fn displayed(&self) -> &[Book] {
        &self.displayed
    }

    pub fn fetched(&self) -> &[Book] {
        &self.fetched
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn pages(&self) -> u32 {
        self.pages
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Navigable URL mirroring the current filters
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Raw text in the search box, possibly not yet applied
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Whether the view should scroll back to the top; reading clears the request
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }

    // -----------------------------------------------------------------------
    // Server filters
    // -----------------------------------------------------------------------

    /// Update one server filter and go back to page 1. An empty value unsets it.
    pub fn set_filter(&mut self, key: FilterKey, value: &str) -> FetchTicket {
        let value = value.trim();
        let text = (!value.is_empty()).then(|| value.to_string());

        match key {
            FilterKey::Query => {
                self.search.cancel();
                self.search_text = value.to_string();
                self.filters.q = text;
            }
            FilterKey::Category => {
                self.filters.category = text;
                self.filters.category_slug = None;
                self.filters.category_name = None;
            }
            FilterKey::Publisher => self.filters.publisher = text,
            FilterKey::Faculty => self.filters.faculty = text,
            FilterKey::Department => self.filters.department = text,
            FilterKey::Year => {
                self.filters.year = match text.as_deref().map(str::parse::<i32>) {
                    None => None,
                    Some(Ok(year)) => Some(year),
                    Some(Err(_)) => {
                        tracing::warn!("Ignoring non-numeric year filter '{}'", value);
                        None
                    }
                };
            }
            FilterKey::Limit => {
                self.filters.limit = value
                    .parse::<u32>()
                    .ok()
                    .filter(|l| *l > 0)
                    .unwrap_or(self.default_limit);
            }
        }

        tracing::info!(filter = key.as_str(), value = %value, "Catalog filter changed");
        self.filters.page = 1;
        self.selection.clear();
        self.persist_preferences();
        self.sync_url();
        self.begin_fetch()
    }

    /// Select a category by slug, e.g. from a deep link. Stays pending until
    /// `resolve_categories` sees the category list.
    pub fn select_category_slug(&mut self, slug: &str) {
        let slug = slug.trim();
        self.filters.category = None;
        self.filters.category_name = None;
        self.filters.category_slug = (!slug.is_empty()).then(|| slug.to_string());
        self.filters.page = 1;
        self.selection.clear();
        self.categories_resolved = false;
        self.persist_preferences();
        self.sync_url();
    }

    /// Fill in a pending category from the loaded list. Runs at most once per
    /// pending slug; returns a fetch when the filter changed.
    pub fn resolve_categories(&mut self, categories: &[Category]) -> Option<FetchTicket> {
        if self.categories_resolved || !self.filters.is_category_pending() {
            return None;
        }
        self.categories_resolved = true;

        let slug = self.filters.category_slug.clone()?;
        match categories.iter().find(|c| c.slug() == slug) {
            Some(category) => {
                tracing::info!(slug = %slug, id = %category.id, "Pending category resolved");
                self.filters.category = Some(category.id.clone());
                self.filters.category_name = Some(category.name.clone());
            }
            None => {
                tracing::warn!("Unknown category slug '{}', dropping it", slug);
                self.filters.category_slug = None;
            }
        }

        self.persist_preferences();
        self.sync_url();
        Some(self.begin_fetch())
    }

    /// Go to page `n`, clamped to the last reported page count
    pub fn set_page(&mut self, n: u32) -> FetchTicket {
        let page = n.clamp(1, self.pages.max(1));
        if page != n {
            tracing::debug!("Page {} out of range, clamped to {}", n, page);
        }
        self.filters.page = page;
        self.selection.clear();
        self.sync_url();
        self.begin_fetch()
    }

    /// Reset everything to defaults and forget the persisted preferences
    pub fn clear_filters(&mut self) -> FetchTicket {
        self.filters = CatalogFilters::with_limit(self.default_limit);
        self.search.cancel();
        self.search_text.clear();
        self.selection.clear();
        self.categories_resolved = false;
        if let Err(e) = self.storage.remove(keys::CATALOG_FILTERS) {
            tracing::warn!("Failed to clear catalog preferences: {}", e);
        }
        self.scroll_requested = true;
        self.sync_url();
        self.rederive();
        tracing::info!("Catalog filters cleared");
        self.begin_fetch()
    }

    // -----------------------------------------------------------------------
    // Debounced search
    // -----------------------------------------------------------------------

    /// Buffer text typed into the search box
    pub fn type_search(&mut self, text: &str, now: Instant) {
        self.search_text = text.to_string();
        self.search.push(text.trim().to_string(), now);
    }

    /// When the buffered search text becomes due
    pub fn search_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    /// Apply buffered search text once it has been quiet long enough
    pub fn poll_search(&mut self, now: Instant) -> Option<FetchTicket> {
        let text = self.search.poll(now)?;
        self.apply_search(text)
    }

    /// Wait out the quiet period and apply the buffered search text
    pub async fn settle_search(&mut self) -> Option<FetchTicket> {
        let text = self.search.settled().await?;
        self.apply_search(text)
    }

    fn apply_search(&mut self, text: String) -> Option<FetchTicket> {
        if self.filters.q.as_deref().unwrap_or("") == text {
            return None;
        }
        let search_text = std::mem::take(&mut self.search_text);
        let ticket = self.set_filter(FilterKey::Query, &text);
        self.search_text = search_text;
        Some(ticket)
    }

    // -----------------------------------------------------------------------
    // Client refinements
    // -----------------------------------------------------------------------

    pub fn set_sort(&mut self, sort: SortKey) {
        self.filters.sort = sort;
        self.refinements_changed();
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.filters.status = status;
        self.refinements_changed();
    }

    pub fn set_year_range(&mut self, min: Option<i32>, max: Option<i32>) {
        self.filters.year_range = YearRange::new(min, max);
        self.refinements_changed();
    }

    fn refinements_changed(&mut self) {
        self.rederive();
        self.persist_preferences();
        self.sync_url();
    }

    fn rederive(&mut self) {
        self.displayed = self
            .filters
            .refine(&self.fetched)
            .into_iter()
            .cloned()
            .collect();
    }

    // -----------------------------------------------------------------------
    // Fetching
    // -----------------------------------------------------------------------

    /// Issue a new generation for the current query
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.status = CatalogStatus::Loading;
        FetchTicket {
            generation: self.generation,
            query: self.filters.to_query(),
        }
    }

    /// Apply a fetch result. Results from superseded generations are dropped;
    /// returns whether this one was applied.
    pub fn complete_fetch(&mut self, fetch: FetchResult) -> bool {
        if fetch.generation != self.generation {
            tracing::debug!(
                "Discarding stale catalog response (generation {}, latest {})",
                fetch.generation,
                self.generation
            );
            return false;
        }

        match fetch.result {
            Ok(page) => {
                for book in page.items.iter().filter(|b| !b.is_consistent()) {
                    tracing::warn!(
                        "Book {} reports {} available of {} total",
                        book.id,
                        book.quantity_available,
                        book.quantity_total
                    );
                }
                self.total = page.total;
                self.pages = page.page_count();
                self.status = if page.items.is_empty() {
                    CatalogStatus::Empty
                } else {
                    CatalogStatus::Loaded
                };
                self.fetched = page.items;
                self.rederive();
                tracing::debug!("Catalog page loaded: {} of {} books", self.fetched.len(), self.total);
            }
            Err(e) => {
                tracing::warn!("Catalog fetch failed: {}", e);
                self.status = CatalogStatus::Failed(e.user_message());
            }
        }
        true
    }

    /// Fetch the current query and apply the result
    pub async fn fetch(&mut self, api: &dyn LibraryApi) -> bool {
        let ticket = self.begin_fetch();
        let result = ticket.run(api).await;
        self.complete_fetch(result)
    }

    /// Re-issue the same query after a failure
    pub async fn retry(&mut self, api: &dyn LibraryApi) -> bool {
        tracing::info!("Retrying catalog fetch");
        self.fetch(api).await
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn toggle_selection(&mut self, book_id: &str) {
        if !self.selection.shift_remove(book_id) {
            self.selection.insert(book_id.to_string());
        }
    }

    pub fn select_all_visible(&mut self) {
        let ids: Vec<String> = self.displayed.iter().map(|b| b.id.clone()).collect();
        self.selection.extend(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_selected(&self, book_id: &str) -> bool {
        self.selection.contains(book_id)
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    /// Selected books still present in the fetched page, in selection order
    pub fn selected_books(&self) -> Vec<Book> {
        self.selection
            .iter()
            .filter_map(|id| self.fetched.iter().find(|b| &b.id == id))
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------------
    // URL and preference sync
    // -----------------------------------------------------------------------

    /// Catalog URL for a filter record; default values are left out
    pub fn filters_to_url(base: &Url, filters: &CatalogFilters, default_limit: u32) -> Url {
        let mut url = base.clone();
        url.set_query(None);

        let mut params: Vec<(&str, String)> = Vec::new();
        let mut push_opt = |key: &'static str, value: &Option<String>| {
            if let Some(v) = value {
                params.push((key, v.clone()));
            }
        };
        push_opt("q", &filters.q);
        push_opt("category", &filters.category);
        if filters.category.is_none() {
            push_opt("categorySlug", &filters.category_slug);
        }
        push_opt("publisher", &filters.publisher);
        push_opt("faculty", &filters.faculty);
        push_opt("department", &filters.department);
        if let Some(year) = filters.year {
            params.push(("year", year.to_string()));
        }
        if filters.page > 1 {
            params.push(("page", filters.page.to_string()));
        }
        if filters.limit != default_limit {
            params.push(("limit", filters.limit.to_string()));
        }
        if filters.status != StatusFilter::All {
            params.push(("status", filters.status.as_str().to_string()));
        }
        if filters.sort != SortKey::Default {
            params.push(("sort", filters.sort.as_str().to_string()));
        }
        if let Some(min) = filters.year_range.min {
            params.push(("yearMin", min.to_string()));
        }
        if let Some(max) = filters.year_range.max {
            params.push(("yearMax", max.to_string()));
        }

        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        url
    }

    /// Filter record from a catalog URL; unparseable values fall back to defaults
    pub fn parse_url(url: &Url, default_limit: u32) -> CatalogFilters {
        let mut filters = CatalogFilters::with_limit(default_limit);
        let mut year_min = None;
        let mut year_max = None;

        for (key, value) in url.query_pairs() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let text = Some(value.to_string());
            match &*key {
                "q" => filters.q = text,
                "category" => filters.category = text,
                "categorySlug" => filters.category_slug = text,
                "publisher" => filters.publisher = text,
                "faculty" => filters.faculty = text,
                "department" => filters.department = text,
                "year" => filters.year = parse_or_warn(&key, value),
                "page" => filters.page = parse_or_warn::<u32>(&key, value).unwrap_or(1).max(1),
                "limit" => {
                    filters.limit = parse_or_warn::<u32>(&key, value)
                        .filter(|l| *l > 0)
                        .unwrap_or(default_limit)
                }
                "status" => filters.status = parse_or_warn(&key, value).unwrap_or_default(),
                "sort" => filters.sort = parse_or_warn(&key, value).unwrap_or_default(),
                "yearMin" => year_min = parse_or_warn(&key, value),
                "yearMax" => year_max = parse_or_warn(&key, value),
                _ => {}
            }
        }

        if filters.category.is_some() {
            filters.category_slug = None;
        }
        filters.year_range = YearRange::new(year_min, year_max);
        filters
    }

    fn sync_url(&mut self) {
        self.url = Self::filters_to_url(&self.base_url, &self.filters, self.default_limit);
    }

    fn persist_preferences(&self) {
        let prefs = FilterPreferences::from(&self.filters);
        if let Err(e) = save_json(self.storage.as_ref(), keys::CATALOG_FILTERS, &prefs) {
            tracing::warn!("Failed to persist catalog preferences: {}", e);
        }
    }
}

fn has_filter_params(url: &Url) -> bool {
    url.query_pairs()
        .any(|(k, v)| URL_KEYS.contains(&&*k) && !v.trim().is_empty())
}

fn parse_or_warn<T: FromStr>(key: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring invalid '{}' URL parameter: {}", key, value);
            None
        }
    }
}
