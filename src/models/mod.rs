//! Data models for the library client

pub mod book;
pub mod cart;
pub mod enums;
pub mod filters;
pub mod loan;
pub mod reference;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookPage, BookQuery, EntityRef, Page};
pub use cart::CartItem;
pub use enums::{BookStatus, LoanStatus, Role};
pub use filters::{CatalogFilters, FilterKey, FilterPreferences, SortKey, StatusFilter, YearRange};
pub use loan::{CreateLoan, Loan, LoanItemRequest};
pub use reference::{Category, Department, Faculty, Publisher};
pub use user::{Session, User};
