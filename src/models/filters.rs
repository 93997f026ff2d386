//! Catalog filter record and client-side refinements

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::book::{Book, BookQuery};
use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Server-side filter fields addressable by `set_filter`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Query,
    Category,
    Publisher,
    Faculty,
    Department,
    Year,
    Limit,
}

impl FilterKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::Query => "q",
            FilterKey::Category => "category",
            FilterKey::Publisher => "publisher",
            FilterKey::Faculty => "faculty",
            FilterKey::Department => "department",
            FilterKey::Year => "year",
            FilterKey::Limit => "limit",
        }
    }
}

impl FromStr for FilterKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "q" | "query" | "search" => Ok(FilterKey::Query),
            "category" => Ok(FilterKey::Category),
            "publisher" => Ok(FilterKey::Publisher),
            "faculty" => Ok(FilterKey::Faculty),
            "department" => Ok(FilterKey::Department),
            "year" => Ok(FilterKey::Year),
            "limit" => Ok(FilterKey::Limit),
            other => Err(AppError::Validation(format!("Unknown filter: {}", other))),
        }
    }
}

/// Availability refinement applied to the fetched page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Available,
    Unavailable,
}

impl StatusFilter {
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Available => book.is_available(),
            StatusFilter::Unavailable => !book.is_available(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Available => "available",
            StatusFilter::Unavailable => "unavailable",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(StatusFilter::All),
            "available" => Ok(StatusFilter::Available),
            "unavailable" => Ok(StatusFilter::Unavailable),
            other => Err(AppError::Validation(format!("Unknown status filter: {}", other))),
        }
    }
}

/// Client-side sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Fetch order
    #[default]
    Default,
    TitleAsc,
    TitleDesc,
    YearDesc,
    YearAsc,
    AvailabilityDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Default => "default",
            SortKey::TitleAsc => "title_asc",
            SortKey::TitleDesc => "title_desc",
            SortKey::YearDesc => "year_desc",
            SortKey::YearAsc => "year_asc",
            SortKey::AvailabilityDesc => "availability_desc",
        }
    }

    /// Comparator for a stable sort; `Equal` keeps fetch order
    pub fn compare(&self, a: &Book, b: &Book) -> Ordering {
        match self {
            SortKey::Default => Ordering::Equal,
            SortKey::TitleAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortKey::TitleDesc => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
            // None sorts below every year, so undated books land last
            SortKey::YearDesc => b.publication_year.cmp(&a.publication_year),
            SortKey::YearAsc => match (a.publication_year, b.publication_year) {
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (x, y) => x.cmp(&y),
            },
            SortKey::AvailabilityDesc => b.quantity_available.cmp(&a.quantity_available),
        }
    }
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "default" => Ok(SortKey::Default),
            "title_asc" => Ok(SortKey::TitleAsc),
            "title_desc" => Ok(SortKey::TitleDesc),
            "year_desc" | "newest" => Ok(SortKey::YearDesc),
            "year_asc" | "oldest" => Ok(SortKey::YearAsc),
            "availability_desc" => Ok(SortKey::AvailabilityDesc),
            other => Err(AppError::Validation(format!("Unknown sort key: {}", other))),
        }
    }
}

/// Inclusive publication-year range; either bound may be open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct YearRange {
    pub min: Option<i32>,
    pub max: Option<i32>,
}

impl YearRange {
    /// Build a range, swapping inverted bounds
    pub fn new(min: Option<i32>, max: Option<i32>) -> Self {
        match (min, max) {
            (Some(lo), Some(hi)) if lo > hi => Self {
                min: Some(hi),
                max: Some(lo),
            },
            _ => Self { min, max },
        }
    }

    pub fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    pub fn contains(&self, book: &Book) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(year) = book.publication_year else {
            return false;
        };
        self.min.map_or(true, |lo| year >= lo) && self.max.map_or(true, |hi| year <= hi)
    }
}

/// Complete catalog filter state: server filters plus client refinements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilters {
    pub q: Option<String>,
    pub category: Option<String>,
    /// Category selected by slug whose id is not known yet
    pub category_slug: Option<String>,
    pub category_name: Option<String>,
    pub publisher: Option<String>,
    pub faculty: Option<String>,
    pub department: Option<String>,
    pub year: Option<i32>,
    pub page: u32,
    pub limit: u32,
    pub status: StatusFilter,
    pub year_range: YearRange,
    pub sort: SortKey,
}

impl Default for CatalogFilters {
    fn default() -> Self {
        Self::with_limit(DEFAULT_PAGE_SIZE)
    }
}

impl CatalogFilters {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            q: None,
            category: None,
            category_slug: None,
            category_name: None,
            publisher: None,
            faculty: None,
            department: None,
            year: None,
            page: 1,
            limit: limit.max(1),
            status: StatusFilter::All,
            year_range: YearRange::default(),
            sort: SortKey::Default,
        }
    }

    /// Category slug waiting for the category list
    pub fn is_category_pending(&self) -> bool {
        self.category.is_none() && self.category_slug.is_some()
    }

    /// Server query for the current state
    pub fn to_query(&self) -> BookQuery {
        BookQuery {
            q: self.q.clone(),
            category: self.category.clone(),
            publisher: self.publisher.clone(),
            faculty: self.faculty.clone(),
            department: self.department.clone(),
            year: self.year,
            page: self.page,
            limit: self.limit,
        }
    }

    /// Apply status, year-range and sort, in that order
    pub fn refine<'a>(&self, books: &'a [Book]) -> Vec<&'a Book> {
        let mut view: Vec<&Book> = books
            .iter()
            .filter(|b| self.status.matches(b))
            .filter(|b| self.year_range.contains(b))
            .collect();
        view.sort_by(|a, b| self.sort.compare(a, b));
        view
    }
}

/// Persisted preference record: the filter state minus the page number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FilterPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub year_range: YearRange,
    #[serde(default)]
    pub sort: SortKey,
}

impl From<&CatalogFilters> for FilterPreferences {
    fn from(f: &CatalogFilters) -> Self {
        Self {
            q: f.q.clone(),
            category: f.category.clone(),
            category_slug: f.category_slug.clone(),
            category_name: f.category_name.clone(),
            publisher: f.publisher.clone(),
            faculty: f.faculty.clone(),
            department: f.department.clone(),
            year: f.year,
            limit: Some(f.limit),
            status: f.status,
            year_range: f.year_range,
            sort: f.sort,
        }
    }
}

impl FilterPreferences {
    /// Rebuild a filter record on page 1
    pub fn into_filters(self, default_limit: u32) -> CatalogFilters {
        CatalogFilters {
            q: self.q,
            category: self.category,
            category_slug: self.category_slug,
            category_name: self.category_name,
            publisher: self.publisher,
            faculty: self.faculty,
            department: self.department,
            year: self.year,
            page: 1,
            limit: self.limit.filter(|l| *l > 0).unwrap_or(default_limit),
            status: self.status,
            year_range: YearRange::new(self.year_range.min, self.year_range.max),
            sort: self.sort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::BookStatus;

    fn book(id: &str, title: &str, year: Option<i32>, available: u32) -> Book {
        Book {
            id: id.to_string(),
            title: title.to_string(),
            authors: vec![],
            isbn: None,
            publication_year: year,
            quantity_total: available.max(1),
            quantity_available: available,
            category: None,
            publisher: None,
            faculty: None,
            department: None,
            cover_image: None,
            description: None,
            status: BookStatus::Active,
            created_at: None,
            updated_at: None,
        }
    }

    fn ids(view: &[&Book]) -> Vec<String> {
        view.iter().map(|b| b.id.clone()).collect()
    }

    #[test]
    fn test_year_range_inverted_and_open() {
        let range = YearRange::new(Some(2000), Some(1990));
        assert_eq!(range.min, Some(1990));
        assert_eq!(range.max, Some(2000));
        assert!(range.contains(&book("a", "A", Some(1995), 1)));
        assert!(!range.contains(&book("a", "A", None, 1)));

        let open = YearRange::new(Some(2010), None);
        assert!(open.contains(&book("a", "A", Some(2024), 1)));
        assert!(!open.contains(&book("a", "A", Some(2009), 1)));
    }

    #[test]
    fn test_stable_sort_keeps_fetch_order_on_ties() {
        let books = vec![
            book("1", "Beta", Some(2001), 0),
            book("2", "alpha", Some(2001), 2),
            book("3", "Alpha", Some(1999), 1),
        ];
        let mut filters = CatalogFilters::default();

        filters.sort = SortKey::TitleAsc;
        assert_eq!(ids(&filters.refine(&books)), vec!["2", "3", "1"]);

        filters.sort = SortKey::YearDesc;
        assert_eq!(ids(&filters.refine(&books)), vec!["1", "2", "3"]);

        filters.sort = SortKey::Default;
        assert_eq!(ids(&filters.refine(&books)), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_status_and_range_commute() {
        let books = vec![
            book("1", "A", Some(1985), 1),
            book("2", "B", Some(1990), 0),
            book("3", "C", Some(1995), 3),
            book("4", "D", Some(2000), 1),
            book("5", "E", None, 1),
            book("6", "F", Some(2005), 0),
        ];
        let mut status_only = CatalogFilters::default();
        status_only.status = StatusFilter::Available;
        let mut range_only = CatalogFilters::default();
        range_only.year_range = YearRange::new(Some(1990), Some(2000));
        let mut both = status_only.clone();
        both.year_range = range_only.year_range;

        let owned = |view: Vec<&Book>| view.into_iter().cloned().collect::<Vec<Book>>();
        let after_status = owned(status_only.refine(&books));
        let after_range = owned(range_only.refine(&books));
        let status_first = range_only.refine(&after_status);
        let range_first = status_only.refine(&after_range);

        assert_eq!(ids(&status_first), ids(&range_first));
        assert_eq!(ids(&both.refine(&books)), ids(&status_first));
        assert_eq!(ids(&status_first), vec!["3", "4"]);
    }

    #[test]
    fn test_preferences_drop_page() {
        let mut filters = CatalogFilters::default();
        filters.q = Some("rust".to_string());
        filters.page = 4;
        filters.sort = SortKey::TitleDesc;

        let prefs = FilterPreferences::from(&filters);
        let json = serde_json::to_value(&prefs).unwrap();
        assert!(json.get("page").is_none());

        let restored = prefs.into_filters(DEFAULT_PAGE_SIZE);
        assert_eq!(restored.page, 1);
        assert_eq!(restored.q.as_deref(), Some("rust"));
        assert_eq!(restored.sort, SortKey::TitleDesc);
    }
}
