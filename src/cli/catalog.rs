//! `books`, `book` and `references` commands

use anyhow::Result;
use clap::Args;

use super::OutputFormat;
use crate::{
    api::LibraryApi,
    models::{
        book::Book,
        filters::{FilterKey, SortKey, StatusFilter},
    },
    services::{catalog::CatalogStatus, Services},
};

#[derive(Debug, Args)]
pub struct BooksArgs {
    /// Full-text search on title, author and ISBN.
    #[arg(long, short = 'q')]
    pub query: Option<String>,

    /// Category slug, e.g. `computer-science`.
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    #[arg(long)]
    pub publisher: Option<String>,

    #[arg(long)]
    pub faculty: Option<String>,

    #[arg(long)]
    pub department: Option<String>,

    /// Exact publication year (server filter).
    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long, short = 'p')]
    pub page: Option<u32>,

    #[arg(long)]
    pub limit: Option<u32>,

    /// title_asc, title_desc, year_desc, year_asc or availability_desc.
    #[arg(long)]
    pub sort: Option<String>,

    /// all, available or unavailable.
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub year_min: Option<i32>,

    #[arg(long)]
    pub year_max: Option<i32>,

    /// Reset all filters before applying the others.
    #[arg(long)]
    pub clear: bool,

    /// Add one copy of every listed book to the cart.
    #[arg(long)]
    pub add_all: bool,
}

#[derive(Debug, Args)]
pub struct BookArgs {
    pub id: String,
}

pub async fn books(args: BooksArgs, services: &mut Services, format: OutputFormat) -> Result<()> {
    let api = services.api.clone();
    let catalog = &mut services.catalog;

    if args.clear {
        let _ = catalog.clear_filters();
    }

    let server_filters = [
        (FilterKey::Query, args.query),
        (FilterKey::Publisher, args.publisher),
        (FilterKey::Faculty, args.faculty),
        (FilterKey::Department, args.department),
        (FilterKey::Year, args.year.map(|y| y.to_string())),
        (FilterKey::Limit, args.limit.map(|l| l.to_string())),
    ];
    for (key, value) in server_filters {
        if let Some(value) = value {
            let _ = catalog.set_filter(key, &value);
        }
    }

    if let Some(sort) = args.sort {
        catalog.set_sort(sort.parse::<SortKey>()?);
    }
    if let Some(status) = args.status {
        catalog.set_status_filter(status.parse::<StatusFilter>()?);
    }
    if args.year_min.is_some() || args.year_max.is_some() {
        catalog.set_year_range(args.year_min, args.year_max);
    }

    if let Some(slug) = args.category {
        catalog.select_category_slug(&slug);
    }
    if catalog.filters().is_category_pending() {
        let categories = services.references.categories().await?;
        let _ = catalog.resolve_categories(&categories);
    }

    catalog.fetch(api.as_ref()).await;
    if let Some(page) = page_change(args.page, catalog.filters().page) {
        let ticket = catalog.set_page(page);
        let result = ticket.run(api.as_ref()).await;
        catalog.complete_fetch(result);
    }

    if let CatalogStatus::Failed(message) = catalog.status() {
        anyhow::bail!("Could not load books: {message}");
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(catalog.displayed())?);
        }
        OutputFormat::Text => {
            if catalog.displayed().is_empty() {
                println!("No books match these filters");
            }
            for book in catalog.displayed() {
                print_book_line(book, services.cart.quantity_of(&book.id));
            }
            println!();
            println!(
                "Page {} of {} ({} books)",
                catalog.filters().page,
                catalog.pages(),
                catalog.total()
            );
            println!("{}", catalog.url());
        }
    }

    if args.add_all {
        services.catalog.select_all_visible();
        let added = services.add_selection_to_cart();
        println!("Added {added} book(s) to the cart");
    }
    Ok(())
}

pub async fn book(args: BookArgs, services: &Services, format: OutputFormat) -> Result<()> {
    let book = services.api.get_book(&args.id).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&book)?),
        OutputFormat::Text => {
            println!("{}", book.title);
            println!("  by {}", book.author_line());
            if let Some(isbn) = &book.isbn {
                println!("  ISBN {isbn}");
            }
            if let Some(year) = book.publication_year {
                println!("  Published {year}");
            }
            if let Some(category) = book.category.as_ref().and_then(|c| c.name()) {
                println!("  Category: {category}");
            }
            println!(
                "  {} of {} copies available",
                book.quantity_available, book.quantity_total
            );
            if let Some(description) = &book.description {
                println!();
                println!("{description}");
            }
        }
    }
    Ok(())
}

pub async fn references(services: &Services, format: OutputFormat) -> Result<()> {
    let data = services.references.load_all().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
        OutputFormat::Text => {
            println!("Categories:");
            for c in &data.categories {
                println!("  {:<28} {}", c.slug(), c.name);
            }
            println!("Publishers:");
            for p in &data.publishers {
                println!("  {:<28} {}", p.id, p.name);
            }
            println!("Faculties:");
            for f in &data.faculties {
                println!("  {:<28} {}", f.id, f.name);
                for d in data.departments_of(&f.id) {
                    println!("    {:<26} {}", d.id, d.name);
                }
            }
        }
    }
    Ok(())
}

/// A `--page` that differs from the page already loaded
fn page_change(requested: Option<u32>, current: u32) -> Option<u32> {
    requested.filter(|p| *p != current)
}

fn print_book_line(book: &Book, in_cart: u32) {
    let year = book
        .publication_year
        .map_or_else(|| "----".to_string(), |y| y.to_string());
    let cart = if in_cart > 0 {
        format!(" [{in_cart} in cart]")
    } else {
        String::new()
    };
    println!(
        "  {}  {}  {} ({}) {}/{}{}",
        book.id,
        year,
        book.title,
        book.author_line(),
        book.quantity_available,
        book.quantity_total,
        cart
    );
}
