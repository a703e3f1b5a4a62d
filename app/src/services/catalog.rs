// app/src/services/catalog.rs

//! Book catalog: input validation, listing normalisation and the storefront's
//! "new" / "popular" flags.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{AuthorRef, Book, BookPage, BookPatch, BookQuery, CategoryRef, NewBook, PublisherRef};
use crate::store::BookStore;

pub const DEFAULT_PAGE_SIZE: u32 = 12;
/// Larger `limit` values are clamped to this. The storefront loads the whole
/// catalog with `limit=1000` for client-side filtering.
pub const MAX_PAGE_SIZE: u32 = 1000;
pub const NEW_BOOK_WINDOW_DAYS: i64 = 30;
pub const POPULAR_STOCK_BELOW: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
  #[default]
  Title,
  Price,
  CreatedAt,
  PublishYear,
  Stock,
}

impl SortField {
  fn parse(value: &str) -> Option<Self> {
    match value {
      "title" => Some(SortField::Title),
      "price" => Some(SortField::Price),
      "createdAt" => Some(SortField::CreatedAt),
      "publishYear" => Some(SortField::PublishYear),
      "stock" => Some(SortField::Stock),
      _ => None,
    }
  }

  /// Column name in the `books` table.
  pub fn column(&self) -> &'static str {
    match self {
      SortField::Title => "title",
      SortField::Price => "price",
      SortField::CreatedAt => "created_at",
      SortField::PublishYear => "publish_year",
      SortField::Stock => "stock",
    }
  }

  pub fn compare(&self, a: &Book, b: &Book) -> Ordering {
    match self {
      SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
      SortField::Price => a.price.total_cmp(&b.price),
      SortField::CreatedAt => a.created_at.cmp(&b.created_at),
      SortField::PublishYear => a.publish_year.cmp(&b.publish_year),
      SortField::Stock => a.stock.cmp(&b.stock),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
  #[default]
  Asc,
  Desc,
}

impl SortOrder {
  pub fn sql(&self) -> &'static str {
    match self {
      SortOrder::Asc => "ASC",
      SortOrder::Desc => "DESC",
    }
  }
}

/// A validated `GET /books` query.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
  pub category_id: Option<Uuid>,
  pub author_id: Option<Uuid>,
  pub publisher_id: Option<Uuid>,
  /// Lowercased, trimmed, never empty.
  pub search: Option<String>,
  pub sort_by: SortField,
  pub sort_order: SortOrder,
  pub page: u32,
  pub limit: u32,
  pub is_new: bool,
  pub is_popular: bool,
}

impl Default for ListingQuery {
  fn default() -> Self {
    ListingQuery {
      category_id: None,
      author_id: None,
      publisher_id: None,
      search: None,
      sort_by: SortField::default(),
      sort_order: SortOrder::default(),
      page: 1,
      limit: DEFAULT_PAGE_SIZE,
      is_new: false,
      is_popular: false,
    }
  }
}

impl ListingQuery {
  pub fn from_query(query: &BookQuery) -> Result<Self> {
    let sort_by = match query.sort_by.as_deref() {
      None => SortField::default(),
      Some(raw) => SortField::parse(raw).ok_or_else(|| AppError::Validation(format!("Unsupported sortBy '{}'", raw)))?,
    };
    let sort_order = match query.sort_order.as_deref() {
      None | Some("asc") => SortOrder::Asc,
      Some("desc") => SortOrder::Desc,
      Some(raw) => return Err(AppError::Validation(format!("Unsupported sortOrder '{}'", raw))),
    };
    let page = query.page.unwrap_or(1);
    if page == 0 {
      return Err(AppError::Validation("page must be at least 1".to_string()));
    }
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit == 0 {
      return Err(AppError::Validation("limit must be at least 1".to_string()));
    }
    let limit = limit.min(MAX_PAGE_SIZE);
    let search = query
      .search
      .as_deref()
      .map(|s| s.trim().to_lowercase())
      .filter(|s| !s.is_empty());

    Ok(ListingQuery {
      category_id: query.category_id,
      author_id: query.author_id,
      publisher_id: query.publisher_id,
      search,
      sort_by,
      sort_order,
      page,
      limit,
      is_new: query.is_new.unwrap_or(false),
      is_popular: query.is_popular.unwrap_or(false),
    })
  }

  pub fn offset(&self) -> i64 {
    i64::from(self.page - 1) * i64::from(self.limit)
  }

  /// Filter predicate shared by stores that evaluate listings in memory.
  pub fn matches(&self, book: &Book) -> bool {
    if let Some(publisher_id) = self.publisher_id {
      if book.publisher_id != publisher_id {
        return false;
      }
    }
    if let Some(author_id) = self.author_id {
      if !book.authors.iter().any(|a| a.id == author_id) {
        return false;
      }
    }
    if let Some(category_id) = self.category_id {
      if !book.categories.iter().any(|c| c.id == category_id) {
        return false;
      }
    }
    if let Some(search) = &self.search {
      if !book.title.to_lowercase().contains(search.as_str()) {
        return false;
      }
    }
    true
  }

  pub fn compare(&self, a: &Book, b: &Book) -> Ordering {
    let ord = self.sort_by.compare(a, b);
    match self.sort_order {
      SortOrder::Asc => ord,
      SortOrder::Desc => ord.reverse(),
    }
  }
}

pub fn is_new(book: &Book, now: DateTime<Utc>) -> bool {
  now - book.created_at <= Duration::days(NEW_BOOK_WINDOW_DAYS)
}

pub fn is_popular(book: &Book) -> bool {
  book.stock > 0 && book.stock < POPULAR_STOCK_BELOW
}

/// Applies the flags over an already fetched page.
pub fn apply_listing_flags(books: Vec<Book>, query: &ListingQuery, now: DateTime<Utc>) -> Vec<Book> {
  books
    .into_iter()
    .filter(|b| !query.is_new || is_new(b, now))
    .filter(|b| !query.is_popular || is_popular(b))
    .collect()
}

fn check_price_and_stock(price: Option<f64>, stock: Option<i32>) -> Result<()> {
  if let Some(price) = price {
    if !price.is_finite() || price < 0.0 {
      return Err(AppError::Validation("price must be a non-negative number".to_string()));
    }
  }
  if let Some(stock) = stock {
    if stock < 0 {
      return Err(AppError::Validation("stock must be a non-negative number".to_string()));
    }
  }
  Ok(())
}

pub fn validate_new_book(input: &NewBook) -> Result<()> {
  if input.title.trim().is_empty() {
    return Err(AppError::Validation("title is required".to_string()));
  }
  if input.publisher_id.is_none() {
    return Err(AppError::Validation("publisherId is required".to_string()));
  }
  check_price_and_stock(input.price, input.stock)
}

pub fn validate_patch(patch: &BookPatch) -> Result<()> {
  if let Some(title) = &patch.title {
    if title.trim().is_empty() {
      return Err(AppError::Validation("title cannot be empty".to_string()));
    }
  }
  check_price_and_stock(patch.price, patch.stock)
}

#[instrument(name = "catalog::list_books", skip(store, query), err(Display))]
pub async fn list_books(store: &dyn BookStore, query: &BookQuery, now: DateTime<Utc>) -> Result<BookPage> {
  let listing = ListingQuery::from_query(query)?;
  let (books, total) = store.list(&listing).await?;
  let fetched = books.len();
  let books = apply_listing_flags(books, &listing, now);
  let total = if listing.is_new || listing.is_popular {
    books.len() as i64
  } else {
    total
  };
  debug!(fetched, returned = books.len(), total, "Book page assembled.");
  Ok(BookPage {
    books,
    total,
    page: listing.page,
    limit: listing.limit,
  })
}

#[instrument(name = "catalog::get_book", skip(store), err(Display))]
pub async fn get_book(store: &dyn BookStore, id: Uuid) -> Result<Book> {
  store
    .get(id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
}

#[instrument(name = "catalog::create_book", skip(store, input), fields(title = %input.title), err(Display))]
pub async fn create_book(store: &dyn BookStore, input: NewBook) -> Result<Book> {
  validate_new_book(&input)?;
  let book = store.create(&input).await?;
  debug!(book_id = %book.id, "Book created.");
  Ok(book)
}

#[instrument(name = "catalog::update_book", skip(store, patch), err(Display))]
pub async fn update_book(store: &dyn BookStore, id: Uuid, patch: BookPatch) -> Result<Book> {
  validate_patch(&patch)?;
  store
    .update(id, &patch)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
}

#[instrument(name = "catalog::delete_book", skip(store), err(Display))]
pub async fn delete_book(store: &dyn BookStore, id: Uuid) -> Result<()> {
  if store.delete(id).await? {
    Ok(())
  } else {
    warn!("Delete requested for a missing book.");
    Err(AppError::NotFound(format!("Book {} not found", id)))
  }
}

pub async fn list_categories(store: &dyn BookStore) -> Result<Vec<CategoryRef>> {
  store.categories().await
}

pub async fn list_authors(store: &dyn BookStore) -> Result<Vec<AuthorRef>> {
  store.authors().await
}

pub async fn list_publishers(store: &dyn BookStore) -> Result<Vec<PublisherRef>> {
  store.publishers().await
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn query_defaults() {
    let listing = ListingQuery::from_query(&BookQuery::default()).unwrap();
    assert_eq!(listing, ListingQuery::default());
    assert_eq!(listing.offset(), 0);
  }

  #[test]
  fn query_rejects_bad_paging_and_sort() {
    let zero_page = BookQuery {
      page: Some(0),
      ..Default::default()
    };
    assert!(matches!(ListingQuery::from_query(&zero_page), Err(AppError::Validation(_))));

    let zero_limit = BookQuery {
      limit: Some(0),
      ..Default::default()
    };
    assert!(matches!(ListingQuery::from_query(&zero_limit), Err(AppError::Validation(_))));

    let sort = BookQuery {
      sort_by: Some("isbn".to_string()),
      ..Default::default()
    };
    assert!(matches!(ListingQuery::from_query(&sort), Err(AppError::Validation(_))));
  }

  #[test]
  fn oversized_limit_is_clamped() {
    let whole_catalog = BookQuery {
      limit: Some(1000),
      ..Default::default()
    };
    assert_eq!(ListingQuery::from_query(&whole_catalog).unwrap().limit, 1000);

    let huge = BookQuery {
      limit: Some(50_000),
      ..Default::default()
    };
    assert_eq!(ListingQuery::from_query(&huge).unwrap().limit, MAX_PAGE_SIZE);
  }

  #[test]
  fn offset_follows_page() {
    let q = BookQuery {
      page: Some(3),
      limit: Some(20),
      search: Some("  Dế Mèn ".to_string()),
      ..Default::default()
    };
    let listing = ListingQuery::from_query(&q).unwrap();
    assert_eq!(listing.offset(), 40);
    assert_eq!(listing.search.as_deref(), Some("dế mèn"));
  }

  #[test]
  fn negative_price_or_stock_is_rejected() {
    let input = NewBook {
      title: "Tuổi thơ dữ dội".to_string(),
      publisher_id: Some(Uuid::new_v4()),
      price: Some(-1.0),
      ..Default::default()
    };
    assert!(matches!(validate_new_book(&input), Err(AppError::Validation(_))));

    let patch = BookPatch {
      stock: Some(-3),
      ..Default::default()
    };
    assert!(matches!(validate_patch(&patch), Err(AppError::Validation(_))));
  }

  #[test]
  fn missing_title_or_publisher_is_rejected() {
    let no_publisher = NewBook {
      title: "Số đỏ".to_string(),
      ..Default::default()
    };
    assert!(validate_new_book(&no_publisher).is_err());
    let blank_title = NewBook {
      title: "   ".to_string(),
      publisher_id: Some(Uuid::new_v4()),
      ..Default::default()
    };
    assert!(validate_new_book(&blank_title).is_err());
  }
}
