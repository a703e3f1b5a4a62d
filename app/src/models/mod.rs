// app/src/models/mod.rs

//! Store rows (snake_case, as the database returns them) and the camelCase
//! views handed to API callers.

pub mod book;
pub mod order;
pub mod user;

pub use book::{AuthorRef, Book, BookPage, BookPatch, BookQuery, CategoryRef, NewBook, PublisherRef};
pub use order::{Order, OrderItem, OrderStatus, PaymentStatus};
pub use user::{NewUser, Role, UserChanges, UserRow, UserView};
