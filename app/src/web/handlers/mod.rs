// app/src/web/handlers/mod.rs

pub mod auth_handlers;
pub mod book_handlers;
pub mod dashboard_handlers;
pub mod order_handlers;
