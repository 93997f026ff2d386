//! Client services

pub mod availability;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod debounce;
pub mod favorites;
pub mod notifications;
pub mod references;
pub mod session;

use std::rc::Rc;
use std::sync::Arc;

use reqwest::Url;

use crate::{
    api::LibraryApi,
    config::AppConfig,
    error::AppResult,
    storage::KeyValueStore,
};

use notifications::{NotificationReceiver, Notifier};

/// Container for all services, wired to one API client and one store
pub struct Services {
    pub api: Arc<dyn LibraryApi>,
    pub notifier: Notifier,
    pub cart: cart::CartStore,
    pub catalog: catalog::CatalogQuery,
    pub checkout: checkout::CheckoutService,
    pub favorites: favorites::FavoritesService,
    pub references: references::ReferenceService,
    pub session: session::SessionService,
}

impl Services {
    /// Create all services; the returned receiver gets every user notification
    pub fn new(
        config: &AppConfig,
        api: Arc<dyn LibraryApi>,
        storage: Rc<dyn KeyValueStore>,
        initial_url: Option<&Url>,
    ) -> AppResult<(Self, NotificationReceiver)> {
        let (notifier, rx) = Notifier::channel();

        let session = session::SessionService::new(api.clone(), storage.clone(), notifier.clone());
        if config.api.token.is_none() {
            session.restore();
        }

        let services = Self {
            cart: cart::CartStore::load(storage.clone(), notifier.clone()),
            catalog: catalog::CatalogQuery::new(&config.catalog, storage, initial_url)?,
            checkout: checkout::CheckoutService::new(
                api.clone(),
                notifier.clone(),
                config.loans.duration_days,
            ),
            favorites: favorites::FavoritesService::new(api.clone(), notifier.clone()),
            references: references::ReferenceService::new(api.clone()),
            session,
            api,
            notifier,
        };
        Ok((services, rx))
    }

    /// Add one copy of every selected catalog book to the cart, then clear the
    /// selection. Returns how many books were actually added.
    pub fn add_selection_to_cart(&mut self) -> usize {
        let mut added = 0;
        for book in self.catalog.selected_books() {
            let before = self.cart.quantity_of(&book.id);
            self.cart.add_item(&book, 1);
            if self.cart.quantity_of(&book.id) > before {
                added += 1;
            }
        }
        self.catalog.clear_selection();
        added
    }

    pub async fn checkout(&mut self) -> AppResult<checkout::CheckoutOutcome> {
        self.checkout.checkout(&mut self.cart).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockLibraryApi;
    use crate::models::book::BookPage;
    use crate::storage::{keys, MemoryStore};
    use test_support::book;

    #[tokio::test]
    async fn test_add_selection_to_cart_clears_selection() {
        let mut api = MockLibraryApi::new();
        api.expect_list_books().returning(|_| {
            Ok(BookPage {
                items: vec![book("b1", 2), book("b2", 0), book("b3", 1)],
                total: 3,
                page: 1,
                pages: 1,
                limit: Some(12),
            })
        });
        let api: Arc<dyn LibraryApi> = Arc::new(api);

        let store = MemoryStore::new();
        let (mut services, _rx) =
            Services::new(&AppConfig::default(), api.clone(), Rc::new(store.clone()), None).unwrap();

        services.catalog.fetch(api.as_ref()).await;
        services.catalog.select_all_visible();
        assert_eq!(services.catalog.selection_len(), 3);

        let added = services.add_selection_to_cart();
        assert_eq!(added, 2);
        assert_eq!(services.catalog.selection_len(), 0);
        assert!(services.cart.contains("b1"));
        assert!(!services.cart.contains("b2"));
        assert!(store.get(keys::CART).unwrap().is_some());
    }

    #[test]
    fn test_saved_token_is_restored() {
        let mut api = MockLibraryApi::new();
        api.expect_set_token()
            .withf(|t| t.as_deref() == Some("saved"))
            .times(1)
            .return_const(());

        let store = MemoryStore::new();
        store.set(keys::AUTH_TOKEN, "saved").unwrap();
        let result = Services::new(&AppConfig::default(), Arc::new(api), Rc::new(store), None);
        assert!(result.is_ok());
    }
}
