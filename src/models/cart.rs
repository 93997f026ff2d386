//! Cart entry model

use serde::{Deserialize, Serialize};

use super::book::Book;
use super::loan::LoanItemRequest;

/// One borrowing selection: a book snapshot and the requested quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub book_id: String,
    /// Book data as last seen; availability is a ceiling fixed at add time
    pub book: Book,
    pub qty: u32,
}

impl CartItem {
    pub fn new(book: Book, qty: u32) -> Self {
        Self {
            book_id: book.id.clone(),
            book,
            qty,
        }
    }

    pub fn snapshot_available(&self) -> u32 {
        self.book.quantity_available
    }
}

impl From<&CartItem> for LoanItemRequest {
    fn from(item: &CartItem) -> Self {
        LoanItemRequest {
            book_id: item.book_id.clone(),
            qty: item.qty,
        }
    }
}
