//! Favorite books

use std::sync::Arc;

use super::notifications::Notifier;
use crate::{api::LibraryApi, error::AppResult, models::book::Book};

#[derive(Clone)]
pub struct FavoritesService {
    api: Arc<dyn LibraryApi>,
    notifier: Notifier,
}

impl FavoritesService {
    pub fn new(api: Arc<dyn LibraryApi>, notifier: Notifier) -> Self {
        Self { api, notifier }
    }

    pub async fn is_favorite(&self, book_id: &str) -> AppResult<bool> {
        self.api.is_favorite(book_id).await
    }

    pub async fn add(&self, book_id: &str) -> AppResult<()> {
        self.api.add_favorite(book_id).await
    }

    pub async fn remove(&self, book_id: &str) -> AppResult<()> {
        self.api.remove_favorite(book_id).await
    }

    /// Flip the favorite flag and return the new state
    pub async fn toggle(&self, book: &Book) -> AppResult<bool> {
        let result = self.flip(&book.id).await;

        match &result {
            Ok(true) => self
                .notifier
                .success(format!("\"{}\" added to favorites", book.title)),
            Ok(false) => self
                .notifier
                .info(format!("\"{}\" removed from favorites", book.title)),
            Err(e) => {
                tracing::warn!(book_id = %book.id, "Favorite toggle failed: {}", e);
                self.notifier.error(e.user_message());
            }
        }
        result
    }

    async fn flip(&self, book_id: &str) -> AppResult<bool> {
        if self.api.is_favorite(book_id).await? {
            self.api.remove_favorite(book_id).await?;
            Ok(false)
        } else {
            self.api.add_favorite(book_id).await?;
            Ok(true)
        }
    }
}
