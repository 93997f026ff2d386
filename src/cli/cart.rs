//! `cart` and `checkout` commands

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::{
    api::LibraryApi,
    services::{checkout::CheckoutOutcome, Services},
};

#[derive(Debug, Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub action: Option<CartAction>,
}

#[derive(Debug, Subcommand)]
pub enum CartAction {
    /// Show the cart (default).
    Show,
    /// Add copies of a book.
    Add {
        book_id: String,
        #[arg(default_value = "1")]
        qty: u32,
    },
    /// Remove a book.
    Remove { book_id: String },
    /// Set the number of copies; 0 removes the book.
    Update { book_id: String, qty: u32 },
    /// Empty the cart.
    Clear,
}

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Due date (YYYY-MM-DD); defaults to the configured loan period.
    #[arg(long)]
    pub due: Option<NaiveDate>,
}

pub async fn cart(args: CartArgs, services: &mut Services, format: OutputFormat) -> Result<()> {
    match args.action.unwrap_or(CartAction::Show) {
        CartAction::Show => {}
        CartAction::Add { book_id, qty } => {
            // Fresh data so the availability check uses the current snapshot
            let book = services.api.get_book(&book_id).await?;
            services.cart.add_item(&book, qty);
        }
        CartAction::Remove { book_id } => services.cart.remove_item(&book_id),
        CartAction::Update { book_id, qty } => services.cart.update_quantity(&book_id, qty),
        CartAction::Clear => services.cart.clear_cart(),
    }
    show(services, format)
}

fn show(services: &Services, format: OutputFormat) -> Result<()> {
    let items: Vec<_> = services.cart.items().collect();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        OutputFormat::Text => {
            if items.is_empty() {
                println!("Your cart is empty");
                return Ok(());
            }
            for item in &items {
                println!(
                    "  {}  {} x{} (of {} available)",
                    item.book_id,
                    item.book.title,
                    item.qty,
                    item.snapshot_available()
                );
            }
            println!("{} copies in cart", services.cart.total_items());
        }
    }
    Ok(())
}

pub async fn checkout(args: CheckoutArgs, services: &mut Services, format: OutputFormat) -> Result<()> {
    let outcome = match args.due {
        Some(due) => {
            services
                .checkout
                .checkout_with_due_date(&mut services.cart, due)
                .await?
        }
        None => services.checkout().await?,
    };

    match outcome {
        CheckoutOutcome::Submitted(loan) => match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&loan)?),
            OutputFormat::Text => println!(
                "Loan {} ({}), {} copies due {}",
                loan.id,
                loan.status,
                loan.total_copies(),
                loan.due_date.date_naive()
            ),
        },
        CheckoutOutcome::NeedsReconciliation(_) => {
            println!("Availability changed since these books were added. Review your cart:");
            show(services, format)?;
        }
        CheckoutOutcome::EmptyCart => {}
    }
    Ok(())
}
