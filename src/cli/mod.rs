//! Command-line front end for the library client

pub mod account;
pub mod cart;
pub mod catalog;

use clap::{Parser, Subcommand, ValueEnum};

use crate::services::notifications::{drain, Level, NotificationReceiver};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// University library client
#[derive(Debug, Parser)]
#[command(name = "unilib", version, about = "Browse the university library catalog and borrow books")]
pub struct Cli {
    /// Output format.
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Catalog link to start from; its filters take precedence over saved ones.
    #[arg(long, global = true)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search and list books.
    Books(catalog::BooksArgs),
    /// Show one book.
    Book(catalog::BookArgs),
    /// List categories, publishers, faculties and departments.
    References,
    /// Inspect or edit the borrowing cart.
    Cart(cart::CartArgs),
    /// Submit the cart as a loan request.
    Checkout(cart::CheckoutArgs),
    /// Toggle a book in your favorites.
    Favorite(account::FavoriteArgs),
    /// Log in and remember the session.
    Login(account::LoginArgs),
    /// Forget the saved session.
    Logout,
    /// Show the logged-in user.
    Me,
    /// List your loans.
    Loans,
}

/// Print pending notifications to stderr
pub fn print_notifications(rx: &mut NotificationReceiver) {
    for note in drain(rx) {
        let tag = match note.level {
            Level::Success => "ok",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        eprintln!("[{}] {}", tag, note.message);
    }
}
