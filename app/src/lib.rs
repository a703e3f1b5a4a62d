// app/src/lib.rs

//! Bookstore backend: accounts and auth workflows, the book catalog, order
//! history and the admin dashboard, served over actix-web.

pub mod config;
pub mod dashboard;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use state::AppState;
