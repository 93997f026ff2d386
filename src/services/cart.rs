//! Borrowing cart
//!
//! Keeps the user's (book, quantity) selections in cart order and enforces the
//! availability ceiling recorded in each book snapshot. Every mutation is
//! written to local storage before returning.

use std::rc::Rc;

use indexmap::IndexMap;

use super::availability::check_capacity;
use super::notifications::Notifier;
use crate::{
    models::{book::Book, cart::CartItem, loan::LoanItemRequest},
    storage::{keys, load_json, save_json, KeyValueStore},
};

pub struct CartStore {
    items: IndexMap<String, CartItem>,
    storage: Rc<dyn KeyValueStore>,
    notifier: Notifier,
}

impl CartStore {
    /// Hydrate from storage; missing or corrupt state yields an empty cart
    pub fn load(storage: Rc<dyn KeyValueStore>, notifier: Notifier) -> Self {
        let persisted: Vec<CartItem> = load_json(storage.as_ref(), keys::CART).unwrap_or_default();

        let mut items = IndexMap::with_capacity(persisted.len());
        for item in persisted {
            if item.qty == 0 || items.contains_key(&item.book_id) {
                tracing::debug!("Dropping invalid cart entry for book {}", item.book_id);
                continue;
            }
            items.insert(item.book_id.clone(), item);
        }

        tracing::debug!("Cart hydrated with {} entries", items.len());
        Self {
            items,
            storage,
            notifier,
        }
    }

    /// Add `qty` copies, merging with an existing entry
    pub fn add_item(&mut self, book: &Book, qty: u32) {
        if qty == 0 {
            return;
        }

        let existing = self.quantity_of(&book.id);
        let new_total = existing.saturating_add(qty);
        if let Err(shortfall) = check_capacity(book, new_total) {
            tracing::info!(book_id = %book.id, requested = new_total, "Cart add rejected");
            self.notifier.warning(shortfall.to_string());
            return;
        }

        match self.items.get_mut(&book.id) {
            Some(item) => {
                item.qty = new_total;
                item.book = book.clone();
            }
            None => {
                self.items
                    .insert(book.id.clone(), CartItem::new(book.clone(), qty));
            }
        }

        tracing::info!(book_id = %book.id, qty = new_total, "Cart item added");
        self.notifier
            .success(format!("\"{}\" added to your cart", book.title));
        self.persist();
    }

    /// Remove an entry; absent ids are ignored
    pub fn remove_item(&mut self, book_id: &str) {
        if let Some(item) = self.items.shift_remove(book_id) {
            tracing::info!(book_id = %book_id, "Cart item removed");
            self.notifier
                .info(format!("\"{}\" removed from your cart", item.book.title));
        }
        self.persist();
    }

    /// Set an entry's quantity; zero removes it
    pub fn update_quantity(&mut self, book_id: &str, qty: u32) {
        if qty == 0 {
            self.remove_item(book_id);
            return;
        }

        let Some(item) = self.items.get_mut(book_id) else {
            tracing::debug!("Quantity update for book {} not in cart", book_id);
            return;
        };

        if let Err(shortfall) = check_capacity(&item.book, qty) {
            tracing::info!(book_id = %book_id, requested = qty, "Cart update rejected");
            self.notifier.warning(shortfall.to_string());
            return;
        }

        item.qty = qty;
        tracing::info!(book_id = %book_id, qty, "Cart quantity updated");
        self.persist();
    }

    pub fn clear_cart(&mut self) {
        self.items.clear();
        tracing::info!("Cart cleared");
        self.persist();
    }

    /// Replace a snapshot with fresher book data, clamping the quantity to it.
    /// An entry whose book has no copies left is dropped.
    pub fn refresh_snapshot(&mut self, book: &Book) {
        let Some(item) = self.items.get_mut(&book.id) else {
            return;
        };

        item.book = book.clone();
        if item.qty > book.quantity_available {
            item.qty = book.quantity_available;
        }
        if item.qty == 0 {
            self.items.shift_remove(&book.id);
        }
        self.persist();
    }

    pub fn total_items(&self) -> u32 {
        self.items.values().map(|i| i.qty).sum()
    }

    pub fn items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, book_id: &str) -> bool {
        self.items.contains_key(book_id)
    }

    pub fn quantity_of(&self, book_id: &str) -> u32 {
        self.items.get(book_id).map_or(0, |i| i.qty)
    }

    /// `{bookId, qty}` pairs in cart order
    pub fn loan_items(&self) -> Vec<LoanItemRequest> {
        self.items.values().map(LoanItemRequest::from).collect()
    }

    fn persist(&self) {
        let snapshot: Vec<&CartItem> = self.items.values().collect();
        if let Err(e) = save_json(self.storage.as_ref(), keys::CART, &snapshot) {
            tracing::warn!("Failed to persist cart: {}", e);
            self.notifier.error(e.user_message());
        }
    }
}
