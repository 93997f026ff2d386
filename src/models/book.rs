//! Book (catalog entry) model and listing types.
//!
//! Books are owned by the server; the client only reads them. References to
//! categories, publishers, faculties and departments arrive either as bare
//! identifiers or populated `{_id, name}` objects depending on the endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::BookStatus;

/// Reference to another catalog entity, bare or populated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slug: Option<String>,
    },
}

impl EntityRef {
    pub fn id(&self) -> &str {
        match self {
            EntityRef::Id(id) => id,
            EntityRef::Populated { id, .. } => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            EntityRef::Id(_) => None,
            EntityRef::Populated { name, .. } => name.as_deref(),
        }
    }
}

/// Full book model as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub quantity_total: u32,
    #[serde(default)]
    pub quantity_available: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Book {
    /// `0 <= quantity_available <= quantity_total`
    pub fn is_consistent(&self) -> bool {
        self.quantity_available <= self.quantity_total
    }

    pub fn is_available(&self) -> bool {
        self.quantity_available > 0
    }

    /// Authors joined for display
    pub fn author_line(&self) -> String {
        if self.authors.is_empty() {
            "Unknown author".to_string()
        } else {
            self.authors.join(", ")
        }
    }
}

/// `GET /books/{id}` answers bare or wrapped in `{book: ...}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BookResponse {
    Wrapped { book: Book },
    Bare(Book),
}

impl From<BookResponse> for Book {
    fn from(r: BookResponse) -> Self {
        match r {
            BookResponse::Wrapped { book } => book,
            BookResponse::Bare(book) => book,
        }
    }
}

/// Server-side listing parameters for `GET /books`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub page: u32,
    pub limit: u32,
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(alias = "books", alias = "data", alias = "categories")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub limit: Option<u32>,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    /// Page count, never below one
    pub fn page_count(&self) -> u32 {
        self.pages.max(1)
    }
}

pub type BookPage = Page<Book>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_populated_and_bare_refs() {
        let json = r#"{
            "_id": "b1",
            "title": "Compilers",
            "authors": ["Aho", "Ullman"],
            "publicationYear": 1986,
            "quantityTotal": 3,
            "quantityAvailable": 1,
            "category": {"_id": "c1", "name": "Computer Science"},
            "publisher": "p9",
            "status": "ACTIVE"
        }"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.category.as_ref().unwrap().id(), "c1");
        assert_eq!(book.category.as_ref().unwrap().name(), Some("Computer Science"));
        assert_eq!(book.publisher.as_ref().unwrap().id(), "p9");
        assert_eq!(book.author_line(), "Aho, Ullman");
        assert!(book.is_consistent());
    }

    #[test]
    fn test_page_aliases() {
        let json = r#"{"books": [], "total": 0, "pages": 0}"#;
        let page: BookPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_count(), 1);
    }
}
