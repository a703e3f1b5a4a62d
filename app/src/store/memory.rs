// app/src/store/memory.rs

//! In-process store used for local development and tests. Enforces the same
//! constraints the database does: unique emails and existing references.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{email_registered, email_taken, BookStore, OrderStore, UserStore};
use crate::errors::{AppError, Result};
use crate::models::{
  AuthorRef, Book, BookPatch, CategoryRef, NewBook, NewUser, Order, OrderItem, OrderStatus, PaymentStatus,
  PublisherRef, UserChanges, UserRow,
};
use crate::services::catalog::ListingQuery;

#[derive(Default)]
struct Tables {
  users: Vec<UserRow>,
  books: Vec<Book>,
  authors: HashMap<Uuid, String>,
  categories: HashMap<Uuid, String>,
  publishers: HashMap<Uuid, String>,
  orders: Vec<Order>,
}

impl Tables {
  fn resolve_authors(&self, ids: &[Uuid]) -> Result<Vec<AuthorRef>> {
    ids
      .iter()
      .map(|id| {
        self
          .authors
          .get(id)
          .map(|name| AuthorRef {
            id: *id,
            name: name.clone(),
            role: None,
          })
          .ok_or_else(|| AppError::Validation(format!("Unknown author {}", id)))
      })
      .collect()
  }

  fn resolve_categories(&self, ids: &[Uuid]) -> Result<Vec<CategoryRef>> {
    ids
      .iter()
      .map(|id| {
        self
          .categories
          .get(id)
          .map(|name| CategoryRef { id: *id, name: name.clone() })
          .ok_or_else(|| AppError::Validation(format!("Unknown category {}", id)))
      })
      .collect()
  }

  fn resolve_publisher(&self, id: Uuid) -> Result<PublisherRef> {
    self
      .publishers
      .get(&id)
      .map(|name| PublisherRef { id, name: name.clone() })
      .ok_or_else(|| AppError::Validation(format!("Unknown publisher {}", id)))
  }
}

#[derive(Default)]
pub struct MemoryStore {
  tables: RwLock<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_author(&self, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    self.tables.write().authors.insert(id, name.to_string());
    id
  }

  pub fn add_category(&self, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    self.tables.write().categories.insert(id, name.to_string());
    id
  }

  pub fn add_publisher(&self, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    self.tables.write().publishers.insert(id, name.to_string());
    id
  }

  pub fn add_order(&self, order: Order) {
    self.tables.write().orders.push(order);
  }

  /// Hard-deletes a user. The API never does this; it exists for operators
  /// and for exercising stale tokens.
  pub fn remove_user(&self, id: Uuid) -> bool {
    let mut tables = self.tables.write();
    let before = tables.users.len();
    tables.users.retain(|u| u.id != id);
    tables.users.len() != before
  }

  /// Overrides a book's creation time. Used to age catalog entries.
  pub fn set_book_created_at(&self, id: Uuid, created_at: DateTime<Utc>) -> bool {
    let mut tables = self.tables.write();
    match tables.books.iter_mut().find(|b| b.id == id) {
      Some(book) => {
        book.created_at = created_at;
        true
      }
      None => false,
    }
  }

  /// Fills an empty store with a small demo catalog and a couple of orders.
  #[instrument(name = "MemoryStore::seed_demo", skip(self))]
  pub fn seed_demo(&self, now: DateTime<Utc>) -> Result<()> {
    let kim_dong = self.add_publisher("NXB Kim Đồng");
    let tre = self.add_publisher("NXB Trẻ");
    let to_hoai = self.add_author("Tô Hoài");
    let nguyen_nhat_anh = self.add_author("Nguyễn Nhật Ánh");
    let thieu_nhi = self.add_category("Thiếu nhi");
    let van_hoc = self.add_category("Văn học");

    let catalog = [
      ("Dế Mèn phiêu lưu ký", 45_000.0, 120, kim_dong, to_hoai, thieu_nhi, 400),
      ("Mắt biếc", 110_000.0, 8, tre, nguyen_nhat_anh, van_hoc, 10),
      ("Cho tôi xin một vé đi tuổi thơ", 80_000.0, 3, tre, nguyen_nhat_anh, van_hoc, 2),
      ("Tôi thấy hoa vàng trên cỏ xanh", 125_000.0, 0, tre, nguyen_nhat_anh, van_hoc, 90),
    ];

    let mut first_books = Vec::new();
    for (title, price, stock, publisher, author, category, age_days) in catalog {
      let book = self.insert_book(
        &NewBook {
          title: title.to_string(),
          price: Some(price),
          stock: Some(stock),
          publisher_id: Some(publisher),
          language: Some("vi".to_string()),
          author_ids: vec![author],
          category_ids: vec![category],
          ..Default::default()
        },
        now - Duration::days(age_days),
      )?;
      first_books.push(book);
    }

    for (book, status) in first_books.iter().take(2).zip([OrderStatus::Delivered, OrderStatus::Pending]) {
      self.add_order(Order {
        id: Uuid::new_v4(),
        user_id: Uuid::nil(),
        items: vec![OrderItem {
          book_id: book.id,
          quantity: 1,
          unit_price: book.price,
          title: book.title.clone(),
          author: book.authors.first().map(|a| a.name.clone()),
        }],
        status,
        payment_status: PaymentStatus::Completed,
        payment_method: "cod".to_string(),
        total_amount: book.price,
        created_at: now,
        updated_at: None,
      });
    }

    info!(books = first_books.len(), "Demo catalog seeded.");
    Ok(())
  }

  fn insert_book(&self, input: &NewBook, created_at: DateTime<Utc>) -> Result<Book> {
    let mut tables = self.tables.write();
    let publisher_id = input
      .publisher_id
      .ok_or_else(|| AppError::Validation("publisherId is required".to_string()))?;
    let book = Book {
      id: Uuid::new_v4(),
      title: input.title.clone(),
      description: input.description.clone(),
      price: input.price.unwrap_or(0.0),
      stock: input.stock.unwrap_or(0),
      publisher_id,
      isbn: input.isbn.clone(),
      publish_year: input.publish_year,
      language: input.language.clone(),
      page_count: input.page_count,
      cover_image: input.cover_image.clone(),
      highlights: input.highlights.clone(),
      detailed_description: input.detailed_description.clone(),
      suitable_for: input.suitable_for.clone(),
      specifications: input.specifications.clone(),
      brand: input.brand.clone(),
      cover_type: input.cover_type.clone(),
      dimensions: input.dimensions.clone(),
      weight: input.weight.clone(),
      distributor: input.distributor.clone(),
      tags: input.tags.clone(),
      created_at,
      updated_at: None,
      authors: tables.resolve_authors(&input.author_ids)?,
      categories: tables.resolve_categories(&input.category_ids)?,
      publisher: Some(tables.resolve_publisher(publisher_id)?),
    };
    tables.books.push(book.clone());
    Ok(book)
  }
}

#[async_trait]
impl UserStore for MemoryStore {
  async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>> {
    Ok(self.tables.read().users.iter().find(|u| u.email == email).cloned())
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
    Ok(self.tables.read().users.iter().find(|u| u.id == id).cloned())
  }

  async fn email_taken_by_other(&self, email: &str, except: Uuid) -> Result<bool> {
    Ok(self.tables.read().users.iter().any(|u| u.email == email && u.id != except))
  }

  #[instrument(name = "MemoryStore::insert_user", skip(self, user), fields(email = %user.email), err(Display))]
  async fn insert(&self, user: NewUser) -> Result<UserRow> {
    let mut tables = self.tables.write();
    if tables.users.iter().any(|u| u.email == user.email) {
      return Err(email_registered());
    }
    let row = UserRow {
      id: Uuid::new_v4(),
      full_name: user.full_name,
      email: user.email,
      password: user.password_hash,
      role: Some(user.role.as_str().to_string()),
      phone: None,
      created_at: Utc::now(),
      updated_at: None,
    };
    tables.users.push(row.clone());
    debug!(user_id = %row.id, "User inserted.");
    Ok(row)
  }

  async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<Option<UserRow>> {
    let mut tables = self.tables.write();
    if let Some(email) = &changes.email {
      if tables.users.iter().any(|u| &u.email == email && u.id != id) {
        return Err(email_taken());
      }
    }
    Ok(tables.users.iter_mut().find(|u| u.id == id).map(|row| {
      changes.apply_to(row);
      row.clone()
    }))
  }

  async fn count(&self) -> Result<i64> {
    Ok(self.tables.read().users.len() as i64)
  }
}

#[async_trait]
impl BookStore for MemoryStore {
  async fn list(&self, query: &ListingQuery) -> Result<(Vec<Book>, i64)> {
    let tables = self.tables.read();
    let mut matched: Vec<&Book> = tables.books.iter().filter(|b| query.matches(b)).collect();
    matched.sort_by(|a, b| query.compare(a, b));
    let total = matched.len() as i64;
    let page = matched
      .into_iter()
      .skip(query.offset() as usize)
      .take(query.limit as usize)
      .cloned()
      .collect();
    Ok((page, total))
  }

  async fn get(&self, id: Uuid) -> Result<Option<Book>> {
    Ok(self.tables.read().books.iter().find(|b| b.id == id).cloned())
  }

  async fn create(&self, input: &NewBook) -> Result<Book> {
    self.insert_book(input, Utc::now())
  }

  async fn update(&self, id: Uuid, patch: &BookPatch) -> Result<Option<Book>> {
    let mut tables = self.tables.write();
    let authors = patch.author_ids.as_deref().map(|ids| tables.resolve_authors(ids)).transpose()?;
    let categories = patch
      .category_ids
      .as_deref()
      .map(|ids| tables.resolve_categories(ids))
      .transpose()?;
    let publisher = patch.publisher_id.map(|id| tables.resolve_publisher(id)).transpose()?;

    let Some(book) = tables.books.iter_mut().find(|b| b.id == id) else {
      return Ok(None);
    };
    patch.apply_fields(book);
    if let Some(authors) = authors {
      book.authors = authors;
    }
    if let Some(categories) = categories {
      book.categories = categories;
    }
    if publisher.is_some() {
      book.publisher = publisher;
    }
    book.updated_at = Some(Utc::now());
    Ok(Some(book.clone()))
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    let before = tables.books.len();
    tables.books.retain(|b| b.id != id);
    Ok(tables.books.len() != before)
  }

  async fn count(&self) -> Result<i64> {
    Ok(self.tables.read().books.len() as i64)
  }

  async fn low_stock(&self, below: i32, limit: i64) -> Result<Vec<Book>> {
    let tables = self.tables.read();
    let mut low: Vec<&Book> = tables.books.iter().filter(|b| b.stock < below).collect();
    low.sort_by_key(|b| b.stock);
    Ok(low.into_iter().take(limit.max(0) as usize).cloned().collect())
  }

  async fn categories(&self) -> Result<Vec<CategoryRef>> {
    let mut all: Vec<CategoryRef> = self
      .tables
      .read()
      .categories
      .iter()
      .map(|(id, name)| CategoryRef { id: *id, name: name.clone() })
      .collect();
    all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(all)
  }

  async fn authors(&self) -> Result<Vec<AuthorRef>> {
    let mut all: Vec<AuthorRef> = self
      .tables
      .read()
      .authors
      .iter()
      .map(|(id, name)| AuthorRef {
        id: *id,
        name: name.clone(),
        role: None,
      })
      .collect();
    all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(all)
  }

  async fn publishers(&self) -> Result<Vec<PublisherRef>> {
    let mut all: Vec<PublisherRef> = self
      .tables
      .read()
      .publishers
      .iter()
      .map(|(id, name)| PublisherRef { id: *id, name: name.clone() })
      .collect();
    all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(all)
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
    let tables = self.tables.read();
    let mut orders: Vec<Order> = tables.orders.iter().filter(|o| o.user_id == user_id).cloned().collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn recent(&self, limit: i64) -> Result<Vec<Order>> {
    let tables = self.tables.read();
    let mut orders: Vec<Order> = tables.orders.clone();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders.truncate(limit.max(0) as usize);
    Ok(orders)
  }

  async fn count(&self) -> Result<i64> {
    Ok(self.tables.read().orders.len() as i64)
  }

  async fn total_revenue(&self) -> Result<f64> {
    Ok(
      self
        .tables
        .read()
        .orders
        .iter()
        .filter(|o| o.counts_towards_revenue())
        .map(|o| o.total_amount)
        .sum(),
    )
  }
}
