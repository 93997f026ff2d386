//! Reference data used to populate catalog filter choices

use std::sync::Arc;

use serde::Serialize;

use crate::{
    api::LibraryApi,
    error::AppResult,
    models::reference::{Category, Department, Faculty, Publisher},
};

/// Categories are requested in pages of this size
pub const CATEGORY_PAGE_SIZE: u32 = 100;
/// Stop paging after this many pages even if the server reports more
pub const MAX_CATEGORY_PAGES: u32 = 20;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceData {
    pub categories: Vec<Category>,
    pub publishers: Vec<Publisher>,
    pub faculties: Vec<Faculty>,
    pub departments: Vec<Department>,
}

impl ReferenceData {
    pub fn departments_of<'a>(&'a self, faculty_id: &'a str) -> impl Iterator<Item = &'a Department> {
        self.departments
            .iter()
            .filter(move |d| d.faculty.as_deref() == Some(faculty_id))
    }
}

#[derive(Clone)]
pub struct ReferenceService {
    api: Arc<dyn LibraryApi>,
}

impl ReferenceService {
    pub fn new(api: Arc<dyn LibraryApi>) -> Self {
        Self { api }
    }

    /// Every category, with slugs filled in where the server left them out
    pub async fn categories(&self) -> AppResult<Vec<Category>> {
        let mut categories = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.api.list_categories(page, CATEGORY_PAGE_SIZE).await?;
            let pages = batch.page_count();
            let received = batch.items.len();
            categories.extend(batch.items);

            if received == 0 || page >= pages {
                break;
            }
            if page >= MAX_CATEGORY_PAGES {
                tracing::warn!("Category listing truncated after {} pages", page);
                break;
            }
            page += 1;
        }

        for category in &mut categories {
            if category.slug.as_deref().map_or(true, str::is_empty) {
                category.slug = Some(category.slug());
            }
        }
        tracing::debug!("Loaded {} categories", categories.len());
        Ok(categories)
    }

    pub async fn load_all(&self) -> AppResult<ReferenceData> {
        let (categories, publishers, faculties, departments) = tokio::try_join!(
            self.categories(),
            self.api.list_publishers(),
            self.api.list_faculties(),
            self.api.list_departments(),
        )?;
        Ok(ReferenceData {
            categories,
            publishers,
            faculties,
            departments,
        })
    }
}
