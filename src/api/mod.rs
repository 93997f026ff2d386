//! REST client for the library backend

pub mod client;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookPage, BookQuery, Page},
        loan::{CreateLoan, Loan},
        reference::{Category, Department, Faculty, Publisher},
        user::{LoginRequest, Session, User},
    },
};

pub use client::ApiClient;

/// Backend operations used by the client services
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryApi: Send + Sync {
    /// Replace (or drop) the bearer token sent with every request
    fn set_token(&self, token: Option<String>);

    // Catalog
    async fn list_books(&self, query: &BookQuery) -> AppResult<BookPage>;
    async fn get_book(&self, id: &str) -> AppResult<Book>;

    // Reference data
    async fn list_categories(&self, page: u32, limit: u32) -> AppResult<Page<Category>>;
    async fn list_publishers(&self) -> AppResult<Vec<Publisher>>;
    async fn list_faculties(&self) -> AppResult<Vec<Faculty>>;
    async fn list_departments(&self) -> AppResult<Vec<Department>>;

    // Loans
    async fn create_loan(&self, loan: &CreateLoan) -> AppResult<Loan>;
    async fn my_loans(&self) -> AppResult<Vec<Loan>>;

    // Favorites
    async fn is_favorite(&self, book_id: &str) -> AppResult<bool>;
    async fn add_favorite(&self, book_id: &str) -> AppResult<()>;
    async fn remove_favorite(&self, book_id: &str) -> AppResult<()>;

    // Authentication
    async fn login(&self, request: &LoginRequest) -> AppResult<Session>;
    async fn me(&self) -> AppResult<User>;
}
