//! Cart checkout into a server-side loan

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use validator::Validate;

use super::availability::{check_capacity, Shortfall};
use super::cart::CartStore;
use super::notifications::Notifier;
use crate::{
    api::LibraryApi,
    error::{AppError, AppResult},
    models::loan::{CreateLoan, Loan},
};

#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Loan created and cart cleared
    Submitted(Loan),
    /// The server now reports less availability than the cart asks for.
    /// Snapshots were refreshed and nothing was submitted.
    NeedsReconciliation(Vec<Shortfall>),
    EmptyCart,
}

#[derive(Clone)]
pub struct CheckoutService {
    api: Arc<dyn LibraryApi>,
    notifier: Notifier,
    loan_duration_days: i64,
}

impl CheckoutService {
    pub fn new(api: Arc<dyn LibraryApi>, notifier: Notifier, loan_duration_days: i64) -> Self {
        Self {
            api,
            notifier,
            loan_duration_days: loan_duration_days.max(1),
        }
    }

    /// Default due date for a loan starting today
    pub fn default_due_date(&self) -> NaiveDate {
        Utc::now().date_naive() + Duration::days(self.loan_duration_days)
    }

    pub async fn checkout(&self, cart: &mut CartStore) -> AppResult<CheckoutOutcome> {
        let due_date = self.default_due_date();
        self.checkout_with_due_date(cart, due_date).await
    }

    /// Re-validate the cart against the server, then submit it as one loan.
    /// The cart is only cleared once the loan exists.
    pub async fn checkout_with_due_date(
        &self,
        cart: &mut CartStore,
        due_date: NaiveDate,
    ) -> AppResult<CheckoutOutcome> {
        if cart.is_empty() {
            self.notifier.warning("Your cart is empty");
            return Ok(CheckoutOutcome::EmptyCart);
        }

        let shortfalls = match self.revalidate(cart).await {
            Ok(shortfalls) => shortfalls,
            Err(e) => {
                self.notifier.error(e.user_message());
                return Err(e);
            }
        };
        if !shortfalls.is_empty() {
            tracing::info!("Checkout needs reconciliation for {} book(s)", shortfalls.len());
            for shortfall in &shortfalls {
                self.notifier.warning(shortfall.to_string());
            }
            return Ok(CheckoutOutcome::NeedsReconciliation(shortfalls));
        }

        let request = CreateLoan {
            due_date,
            items: cart.loan_items(),
        };
        if let Err(e) = request.validate() {
            let err = AppError::from(e);
            self.notifier.error(err.user_message());
            return Err(err);
        }

        match self.api.create_loan(&request).await {
            Ok(loan) => {
                tracing::info!(loan_id = %loan.id, copies = cart.total_items(), "Loan created");
                cart.clear_cart();
                self.notifier
                    .success(format!("Loan request submitted, due {}", due_date));
                Ok(CheckoutOutcome::Submitted(loan))
            }
            Err(e) => {
                tracing::warn!("Loan creation failed: {}", e);
                self.notifier.error(e.user_message());
                Err(e)
            }
        }
    }

    /// Fetch every book in the cart and compare with the requested quantities
    async fn revalidate(&self, cart: &mut CartStore) -> AppResult<Vec<Shortfall>> {
        let requested: Vec<(String, u32, String)> = cart
            .items()
            .map(|i| (i.book_id.clone(), i.qty, i.book.title.clone()))
            .collect();

        // The cart is only touched once every fetch has succeeded
        let mut fresh = Vec::with_capacity(requested.len());
        let mut missing = Vec::new();
        let mut shortfalls = Vec::new();
        for (book_id, qty, title) in requested {
            match self.api.get_book(&book_id).await {
                Ok(book) => {
                    if let Err(shortfall) = check_capacity(&book, qty) {
                        shortfalls.push(shortfall);
                    }
                    fresh.push(book);
                }
                Err(AppError::NotFound(_)) => {
                    tracing::warn!("Book {} in cart no longer exists", book_id);
                    shortfalls.push(Shortfall {
                        book_id: book_id.clone(),
                        title,
                        requested: qty,
                        available: 0,
                    });
                    missing.push(book_id);
                }
                Err(e) => return Err(e),
            }
        }

        if !shortfalls.is_empty() {
            for book_id in &missing {
                cart.remove_item(book_id);
            }
            for book in &fresh {
                cart.refresh_snapshot(book);
            }
        }
        Ok(shortfalls)
    }
}
