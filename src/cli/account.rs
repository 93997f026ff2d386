//! Session, favorites and loan history commands

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;

use super::OutputFormat;
use crate::{api::LibraryApi, services::Services};

#[derive(Debug, Args)]
pub struct LoginArgs {
    pub email: String,

    /// Password; read from UNILIB_PASSWORD when omitted.
    #[arg(long, env = "UNILIB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct FavoriteArgs {
    pub book_id: String,
}

pub async fn login(args: LoginArgs, services: &Services) -> Result<()> {
    let password = args
        .password
        .context("Password is required. Use --password or set UNILIB_PASSWORD")?;
    let user = services.session.login(&args.email, &password).await?;
    println!("Logged in as {} ({})", user.display_name(), user.role);
    Ok(())
}

pub fn logout(services: &Services) -> Result<()> {
    services.session.logout()?;
    Ok(())
}

pub async fn me(services: &Services, format: OutputFormat) -> Result<()> {
    let user = services.session.me().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&user)?),
        OutputFormat::Text => {
            println!("{} <{}>", user.display_name(), user.email);
            println!("  role: {}", user.role);
            if let Some(student_id) = &user.student_id {
                println!("  student id: {student_id}");
            }
        }
    }
    Ok(())
}

pub async fn favorite(args: FavoriteArgs, services: &Services) -> Result<()> {
    let book = services.api.get_book(&args.book_id).await?;
    services.favorites.toggle(&book).await?;
    Ok(())
}

pub async fn loans(services: &Services, format: OutputFormat) -> Result<()> {
    let loans = services.api.my_loans().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&loans)?),
        OutputFormat::Text => {
            if loans.is_empty() {
                println!("No loans yet");
            }
            let now = Utc::now();
            for loan in &loans {
                let overdue = if loan.is_overdue(now) { " OVERDUE" } else { "" };
                println!(
                    "  {}  {:<9} {} copies, due {}{}",
                    loan.id,
                    loan.status.to_string(),
                    loan.total_copies(),
                    loan.due_date.date_naive(),
                    overdue
                );
            }
        }
    }
    Ok(())
}
