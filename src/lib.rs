//! University library client
//!
//! Client-side core of the university library: a persistent borrowing cart,
//! catalog query state kept in step with a shareable URL, and checkout of the
//! cart into a loan through the library REST API.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
