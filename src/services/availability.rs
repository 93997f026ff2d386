//! Availability checks shared by the cart and checkout

use std::fmt;

use crate::models::book::Book;

/// A request for more copies than a book has available
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub book_id: String,
    pub title: String,
    pub requested: u32,
    pub available: u32,
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.available == 0 {
            write!(f, "\"{}\" is not available", self.title)
        } else {
            write!(
                f,
                "Only {} cop{} of \"{}\" available ({} requested)",
                self.available,
                if self.available == 1 { "y" } else { "ies" },
                self.title,
                self.requested
            )
        }
    }
}

/// Check that `requested` copies fit within the book's reported availability
pub fn check_capacity(book: &Book, requested: u32) -> Result<(), Shortfall> {
    if requested <= book.quantity_available {
        Ok(())
    } else {
        Err(Shortfall {
            book_id: book.id.clone(),
            title: book.title.clone(),
            requested,
            available: book.quantity_available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::book;

    #[test]
    fn test_capacity_boundary() {
        let b = book("b1", 2);
        assert!(check_capacity(&b, 2).is_ok());
        let shortfall = check_capacity(&b, 3).unwrap_err();
        assert_eq!(shortfall.requested, 3);
        assert_eq!(shortfall.available, 2);
        assert_eq!(shortfall.to_string(), "Only 2 copies of \"Book b1\" available (3 requested)");
    }

    #[test]
    fn test_unavailable_message() {
        let b = book("b1", 0);
        assert_eq!(check_capacity(&b, 1).unwrap_err().to_string(), "\"Book b1\" is not available");
    }
}
