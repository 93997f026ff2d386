//! HTTP implementation of [`LibraryApi`] on top of reqwest

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::LibraryApi;
use crate::{
    config::ApiConfig,
    error::{AppError, AppResult},
    models::{
        book::{Book, BookPage, BookQuery, BookResponse, Page},
        loan::{CreateLoan, Loan, LoanResponse},
        reference::{Category, Department, Faculty, ListResponse, Publisher},
        user::{FavoriteStatus, LoginRequest, Session, User},
    },
};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// API client for the library REST backend
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Creates a new API client from configuration
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(config.token.clone()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn current_token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request_id = Uuid::new_v4().to_string();
        tracing::debug!(%method, %url, %request_id, "API request");

        let mut req = self
            .client
            .request(method, &url)
            .header(REQUEST_ID_HEADER, request_id);
        if let Some(token) = self.current_token() {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Send a request and decode the JSON body
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> AppResult<T> {
        let response = req.send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                tracing::warn!("Unexpected response shape ({}): {}", status, e);
                AppError::Serialization(e)
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            let err = AppError::from_response(status, &body);
            tracing::debug!("API error {}: {}", status, err);
            Err(err)
        }
    }

    /// Send a request whose response body is ignored
    async fn send_empty(&self, req: RequestBuilder) -> AppResult<()> {
        let response = req.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(AppError::from_response(status, &body))
        }
    }
}

#[async_trait]
impl LibraryApi for ApiClient {
    fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    async fn list_books(&self, query: &BookQuery) -> AppResult<BookPage> {
        let req = self.request(Method::GET, "/books").query(query);
        self.send(req).await
    }

    async fn get_book(&self, id: &str) -> AppResult<Book> {
        let req = self.request(Method::GET, &format!("/books/{}", id));
        let book: BookResponse = self.send(req).await?;
        Ok(book.into())
    }

    // -----------------------------------------------------------------------
    // Reference data
    // -----------------------------------------------------------------------

    async fn list_categories(&self, page: u32, limit: u32) -> AppResult<Page<Category>> {
        let req = self
            .request(Method::GET, "/categories")
            .query(&[("page", page), ("limit", limit)]);
        self.send(req).await
    }

    async fn list_publishers(&self) -> AppResult<Vec<Publisher>> {
        let list: ListResponse<Publisher> = self.send(self.request(Method::GET, "/publishers")).await?;
        Ok(list.into_vec())
    }

    async fn list_faculties(&self) -> AppResult<Vec<Faculty>> {
        let list: ListResponse<Faculty> = self.send(self.request(Method::GET, "/faculties")).await?;
        Ok(list.into_vec())
    }

    async fn list_departments(&self) -> AppResult<Vec<Department>> {
        let list: ListResponse<Department> =
            self.send(self.request(Method::GET, "/departments")).await?;
        Ok(list.into_vec())
    }

    // -----------------------------------------------------------------------
    // Loans
    // -----------------------------------------------------------------------

    async fn create_loan(&self, loan: &CreateLoan) -> AppResult<Loan> {
        let req = self.request(Method::POST, "/loans").json(loan);
        let created: LoanResponse = self.send(req).await?;
        Ok(created.into())
    }

    async fn my_loans(&self) -> AppResult<Vec<Loan>> {
        let list: ListResponse<Loan> = self.send(self.request(Method::GET, "/loans/my")).await?;
        Ok(list.into_vec())
    }

    // -----------------------------------------------------------------------
    // Favorites
    // -----------------------------------------------------------------------

    async fn is_favorite(&self, book_id: &str) -> AppResult<bool> {
        let req = self.request(Method::GET, &format!("/favorites/{}/check", book_id));
        let status: FavoriteStatus = self.send(req).await?;
        Ok(status.is_favorite)
    }

    async fn add_favorite(&self, book_id: &str) -> AppResult<()> {
        self.send_empty(self.request(Method::POST, &format!("/favorites/{}", book_id)))
            .await
    }

    async fn remove_favorite(&self, book_id: &str) -> AppResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("/favorites/{}", book_id)))
            .await
    }

    // -----------------------------------------------------------------------
    // Authentication
    // -----------------------------------------------------------------------

    async fn login(&self, request: &LoginRequest) -> AppResult<Session> {
        let req = self.request(Method::POST, "/auth/login").json(request);
        self.send(req).await
    }

    async fn me(&self) -> AppResult<User> {
        self.send(self.request(Method::GET, "/auth/me")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let config = ApiConfig {
            base_url: "http://localhost:5000/api/".to_string(),
            timeout_secs: 5,
            token: None,
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn test_token_replacement() {
        let client = ApiClient::new(&ApiConfig::default()).unwrap();
        assert_eq!(client.current_token(), None);
        client.set_token(Some("abc".to_string()));
        assert_eq!(client.current_token().as_deref(), Some("abc"));
        client.set_token(None);
        assert_eq!(client.current_token(), None);
    }
}
