// app/src/store/postgres.rs

//! Postgres-backed store. Runtime-checked queries; the schema lives in
//! `app/schema.sql`.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{email_registered, email_taken, BookStore, OrderStore, UserStore};
use crate::errors::{AppError, Result};
use crate::models::{
  AuthorRef, Book, BookPatch, CategoryRef, NewBook, NewUser, Order, OrderItem, OrderStatus, PaymentStatus,
  PublisherRef, UserChanges, UserRow,
};
use crate::services::catalog::ListingQuery;

const USER_COLUMNS: &str = "id, full_name, email, password, role, phone, created_at, updated_at";

const BOOK_SELECT: &str = "SELECT b.id, b.title, b.description, b.price, b.stock, b.publisher_id, b.isbn, \
  b.publish_year, b.language, b.page_count, b.cover_image, b.highlights, b.detailed_description, \
  b.suitable_for, b.specifications, b.brand, b.cover_type, b.dimensions, b.weight, b.distributor, b.tags, \
  b.created_at, b.updated_at, p.name AS publisher_name \
  FROM books b LEFT JOIN publishers p ON p.id = b.publisher_id";

/// Maps constraint violations to the caller-facing kinds; everything else is
/// a store failure.
fn constraint_error(err: sqlx::Error, on_unique: impl FnOnce() -> AppError) -> AppError {
  if let sqlx::Error::Database(db_err) = &err {
    if db_err.is_unique_violation() {
      return on_unique();
    }
    if db_err.is_foreign_key_violation() {
      return AppError::Validation(format!(
        "Referenced record does not exist ({})",
        db_err.constraint().unwrap_or("foreign key")
      ));
    }
  }
  AppError::from(err)
}

#[derive(FromRow)]
struct BookRow {
  id: Uuid,
  title: String,
  description: Option<String>,
  price: f64,
  stock: i32,
  publisher_id: Uuid,
  isbn: Option<String>,
  publish_year: Option<i32>,
  language: Option<String>,
  page_count: Option<i32>,
  cover_image: Option<String>,
  highlights: Vec<String>,
  detailed_description: Option<String>,
  suitable_for: Vec<String>,
  specifications: Json<HashMap<String, String>>,
  brand: Option<String>,
  cover_type: Option<String>,
  dimensions: Option<String>,
  weight: Option<String>,
  distributor: Option<String>,
  tags: Vec<String>,
  created_at: DateTime<Utc>,
  updated_at: Option<DateTime<Utc>>,
  publisher_name: Option<String>,
}

impl BookRow {
  fn into_book(self, authors: Vec<AuthorRef>, categories: Vec<CategoryRef>) -> Book {
    let publisher = self.publisher_name.map(|name| PublisherRef {
      id: self.publisher_id,
      name,
    });
    Book {
      id: self.id,
      title: self.title,
      description: self.description,
      price: self.price,
      stock: self.stock,
      publisher_id: self.publisher_id,
      isbn: self.isbn,
      publish_year: self.publish_year,
      language: self.language,
      page_count: self.page_count,
      cover_image: self.cover_image,
      highlights: self.highlights,
      detailed_description: self.detailed_description,
      suitable_for: self.suitable_for,
      specifications: self.specifications.0,
      brand: self.brand,
      cover_type: self.cover_type,
      dimensions: self.dimensions,
      weight: self.weight,
      distributor: self.distributor,
      tags: self.tags,
      created_at: self.created_at,
      updated_at: self.updated_at,
      authors,
      categories,
      publisher,
    }
  }
}

#[derive(FromRow)]
struct AuthorLink {
  book_id: Uuid,
  id: Uuid,
  name: String,
  role: Option<String>,
}

#[derive(FromRow)]
struct CategoryLink {
  book_id: Uuid,
  id: Uuid,
  name: String,
}

#[derive(FromRow)]
struct OrderRow {
  id: Uuid,
  user_id: Uuid,
  status: String,
  payment_status: String,
  payment_method: String,
  total_amount: f64,
  created_at: DateTime<Utc>,
  updated_at: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct OrderItemRow {
  order_id: Uuid,
  book_id: Uuid,
  quantity: i32,
  unit_price: f64,
  title: String,
  author: Option<String>,
}

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    PgStore { pool }
  }

  /// Connects to `database_url`. When an access key is configured it is used
  /// as the connection password.
  #[instrument(name = "PgStore::connect", skip_all, err(Display))]
  pub async fn connect(database_url: &str, access_key: Option<&str>) -> Result<Self> {
    let mut options = PgConnectOptions::from_str(database_url)
      .map_err(|e| AppError::Config(format!("Invalid DATABASE_URL: {}", e)))?;
    if let Some(key) = access_key {
      options = options.password(key);
    }
    let pool = PgPoolOptions::new().max_connections(10).connect_with(options).await?;
    info!("Connected to the database.");
    Ok(PgStore { pool })
  }

  async fn populate(&self, rows: Vec<BookRow>) -> Result<Vec<Book>> {
    if rows.is_empty() {
      return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let author_links: Vec<AuthorLink> = sqlx::query_as(
      "SELECT ba.book_id, a.id, a.name, ba.role FROM book_authors ba \
       JOIN authors a ON a.id = ba.author_id WHERE ba.book_id = ANY($1) ORDER BY a.name",
    )
    .bind(&ids)
    .fetch_all(&self.pool)
    .await?;
    let category_links: Vec<CategoryLink> = sqlx::query_as(
      "SELECT bc.book_id, c.id, c.name FROM book_categories bc \
       JOIN categories c ON c.id = bc.category_id WHERE bc.book_id = ANY($1) ORDER BY c.name",
    )
    .bind(&ids)
    .fetch_all(&self.pool)
    .await?;

    let mut authors: HashMap<Uuid, Vec<AuthorRef>> = HashMap::new();
    for link in author_links {
      authors.entry(link.book_id).or_default().push(AuthorRef {
        id: link.id,
        name: link.name,
        role: link.role,
      });
    }
    let mut categories: HashMap<Uuid, Vec<CategoryRef>> = HashMap::new();
    for link in category_links {
      categories.entry(link.book_id).or_default().push(CategoryRef {
        id: link.id,
        name: link.name,
      });
    }

    Ok(
      rows
        .into_iter()
        .map(|row| {
          let id = row.id;
          row.into_book(
            authors.remove(&id).unwrap_or_default(),
            categories.remove(&id).unwrap_or_default(),
          )
        })
        .collect(),
    )
  }

  async fn replace_links(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    book_id: Uuid,
    author_ids: Option<&[Uuid]>,
    category_ids: Option<&[Uuid]>,
  ) -> Result<()> {
    if let Some(author_ids) = author_ids {
      sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut **tx)
        .await?;
      for author_id in author_ids {
        sqlx::query("INSERT INTO book_authors (book_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
          .bind(book_id)
          .bind(author_id)
          .execute(&mut **tx)
          .await
          .map_err(|e| constraint_error(e, || AppError::Conflict("Duplicate author link".to_string())))?;
      }
    }
    if let Some(category_ids) = category_ids {
      sqlx::query("DELETE FROM book_categories WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut **tx)
        .await?;
      for category_id in category_ids {
        sqlx::query("INSERT INTO book_categories (book_id, category_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
          .bind(book_id)
          .bind(category_id)
          .execute(&mut **tx)
          .await
          .map_err(|e| constraint_error(e, || AppError::Conflict("Duplicate category link".to_string())))?;
      }
    }
    Ok(())
  }

  async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
    if rows.is_empty() {
      return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let item_rows: Vec<OrderItemRow> = sqlx::query_as(
      "SELECT order_id, book_id, quantity, unit_price, title, author FROM order_items WHERE order_id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(&self.pool)
    .await?;

    let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in item_rows {
      items.entry(item.order_id).or_default().push(OrderItem {
        book_id: item.book_id,
        quantity: item.quantity,
        unit_price: item.unit_price,
        title: item.title,
        author: item.author,
      });
    }

    Ok(
      rows
        .into_iter()
        .map(|row| Order {
          items: items.remove(&row.id).unwrap_or_default(),
          id: row.id,
          user_id: row.user_id,
          status: OrderStatus::from_db(&row.status),
          payment_status: PaymentStatus::from_db(&row.payment_status),
          payment_method: row.payment_method,
          total_amount: row.total_amount,
          created_at: row.created_at,
          updated_at: row.updated_at,
        })
        .collect(),
    )
  }
}

/// `search` as an `ILIKE` substring pattern matched literally.
fn like_pattern(search: &str) -> String {
  let mut pattern = String::with_capacity(search.len() + 2);
  pattern.push('%');
  for c in search.chars() {
    if matches!(c, '\\' | '%' | '_') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

fn push_book_filters(qb: &mut QueryBuilder<'static, Postgres>, query: &ListingQuery) {
  qb.push(" WHERE TRUE");
  if let Some(publisher_id) = query.publisher_id {
    qb.push(" AND b.publisher_id = ").push_bind(publisher_id);
  }
  if let Some(author_id) = query.author_id {
    qb.push(" AND EXISTS (SELECT 1 FROM book_authors ba WHERE ba.book_id = b.id AND ba.author_id = ")
      .push_bind(author_id)
      .push(")");
  }
  if let Some(category_id) = query.category_id {
    qb.push(" AND EXISTS (SELECT 1 FROM book_categories bc WHERE bc.book_id = b.id AND bc.category_id = ")
      .push_bind(category_id)
      .push(")");
  }
  if let Some(search) = &query.search {
    qb.push(" AND b.title ILIKE ")
      .push_bind(like_pattern(search))
      .push(" ESCAPE '\\'");
  }
}

fn book_count_query(query: &ListingQuery) -> QueryBuilder<'static, Postgres> {
  let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM books b");
  push_book_filters(&mut qb, query);
  qb
}

fn book_page_query(query: &ListingQuery) -> QueryBuilder<'static, Postgres> {
  let mut qb = QueryBuilder::new(BOOK_SELECT);
  push_book_filters(&mut qb, query);
  // Column and direction come from closed enums, never from input text.
  qb.push(format!(
    " ORDER BY b.{} {}, b.id LIMIT ",
    query.sort_by.column(),
    query.sort_order.sql()
  ))
  .push_bind(i64::from(query.limit))
  .push(" OFFSET ")
  .push_bind(query.offset());
  qb
}

#[async_trait]
impl UserStore for PgStore {
  async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
      .bind(email)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row)
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row)
  }

  async fn email_taken_by_other(&self, email: &str, except: Uuid) -> Result<bool> {
    let taken = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)")
      .bind(email)
      .bind(except)
      .fetch_one(&self.pool)
      .await?;
    Ok(taken)
  }

  #[instrument(name = "PgStore::insert_user", skip(self, user), fields(email = %user.email), err(Display))]
  async fn insert(&self, user: NewUser) -> Result<UserRow> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
      "INSERT INTO users (full_name, email, password, role) VALUES ($1, $2, $3, $4) RETURNING {}",
      USER_COLUMNS
    ))
    .bind(&user.full_name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .fetch_one(&self.pool)
    .await
    .map_err(|e| constraint_error(e, email_registered))?;
    debug!(user_id = %row.id, "User inserted.");
    Ok(row)
  }

  #[instrument(name = "PgStore::update_user", skip(self, changes), err(Display))]
  async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
      "UPDATE users SET updated_at = $2, \
         full_name = COALESCE($3, full_name), \
         email = COALESCE($4, email), \
         phone = CASE WHEN $5 THEN $6 ELSE phone END, \
         password = COALESCE($7, password) \
       WHERE id = $1 RETURNING {}",
      USER_COLUMNS
    ))
    .bind(id)
    .bind(changes.updated_at)
    .bind(changes.full_name.as_deref())
    .bind(changes.email.as_deref())
    .bind(changes.phone.is_some())
    .bind(changes.phone.clone().flatten())
    .bind(changes.password_hash.as_deref())
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| constraint_error(e, email_taken))?;
    Ok(row)
  }

  async fn count(&self) -> Result<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
      .fetch_one(&self.pool)
      .await?;
    Ok(n)
  }
}

#[async_trait]
impl BookStore for PgStore {
  #[instrument(name = "PgStore::list_books", skip(self, query), err(Display))]
  async fn list(&self, query: &ListingQuery) -> Result<(Vec<Book>, i64)> {
    let mut count_qb = book_count_query(query);
    let total = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

    let mut page_qb = book_page_query(query);
    let rows = page_qb.build_query_as::<BookRow>().fetch_all(&self.pool).await?;

    Ok((self.populate(rows).await?, total))
  }

  async fn get(&self, id: Uuid) -> Result<Option<Book>> {
    let row: Option<BookRow> = sqlx::query_as(&format!("{} WHERE b.id = $1", BOOK_SELECT))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    match row {
      Some(row) => Ok(self.populate(vec![row]).await?.pop()),
      None => Ok(None),
    }
  }

  #[instrument(name = "PgStore::create_book", skip(self, input), err(Display))]
  async fn create(&self, input: &NewBook) -> Result<Book> {
    let mut tx = self.pool.begin().await?;
    let id: Uuid = sqlx::query_scalar(
      "INSERT INTO books (title, description, price, stock, publisher_id, isbn, publish_year, language, \
         page_count, cover_image, highlights, detailed_description, suitable_for, specifications, brand, \
         cover_type, dimensions, weight, distributor, tags) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20) \
       RETURNING id",
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.price.unwrap_or(0.0))
    .bind(input.stock.unwrap_or(0))
    .bind(input.publisher_id)
    .bind(&input.isbn)
    .bind(input.publish_year)
    .bind(&input.language)
    .bind(input.page_count)
    .bind(&input.cover_image)
    .bind(&input.highlights)
    .bind(&input.detailed_description)
    .bind(&input.suitable_for)
    .bind(Json(&input.specifications))
    .bind(&input.brand)
    .bind(&input.cover_type)
    .bind(&input.dimensions)
    .bind(&input.weight)
    .bind(&input.distributor)
    .bind(&input.tags)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| constraint_error(e, || AppError::Conflict("Book already exists".to_string())))?;

    Self::replace_links(
      &mut tx,
      id,
      Some(input.author_ids.as_slice()),
      Some(input.category_ids.as_slice()),
    )
    .await?;
    tx.commit().await?;

    self
      .get(id)
      .await?
      .ok_or_else(|| AppError::Internal(format!("Book {} vanished after insert", id)))
  }

  #[instrument(name = "PgStore::update_book", skip(self, patch), err(Display))]
  async fn update(&self, id: Uuid, patch: &BookPatch) -> Result<Option<Book>> {
    let Some(mut book) = self.get(id).await? else {
      return Ok(None);
    };
    patch.apply_fields(&mut book);

    let mut tx = self.pool.begin().await?;
    let updated = sqlx::query(
      "UPDATE books SET title = $2, description = $3, price = $4, stock = $5, publisher_id = $6, isbn = $7, \
         publish_year = $8, language = $9, page_count = $10, cover_image = $11, highlights = $12, \
         detailed_description = $13, suitable_for = $14, specifications = $15, brand = $16, cover_type = $17, \
         dimensions = $18, weight = $19, distributor = $20, tags = $21, updated_at = now() \
       WHERE id = $1",
    )
    .bind(id)
    .bind(&book.title)
    .bind(&book.description)
    .bind(book.price)
    .bind(book.stock)
    .bind(book.publisher_id)
    .bind(&book.isbn)
    .bind(book.publish_year)
    .bind(&book.language)
    .bind(book.page_count)
    .bind(&book.cover_image)
    .bind(&book.highlights)
    .bind(&book.detailed_description)
    .bind(&book.suitable_for)
    .bind(Json(&book.specifications))
    .bind(&book.brand)
    .bind(&book.cover_type)
    .bind(&book.dimensions)
    .bind(&book.weight)
    .bind(&book.distributor)
    .bind(&book.tags)
    .execute(&mut *tx)
    .await
    .map_err(|e| constraint_error(e, || AppError::Conflict("Book already exists".to_string())))?;
    if updated.rows_affected() == 0 {
      return Ok(None);
    }

    Self::replace_links(&mut tx, id, patch.author_ids.as_deref(), patch.category_ids.as_deref()).await?;
    tx.commit().await?;
    self.get(id).await
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM books WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn count(&self) -> Result<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books")
      .fetch_one(&self.pool)
      .await?;
    Ok(n)
  }

  async fn low_stock(&self, below: i32, limit: i64) -> Result<Vec<Book>> {
    let rows: Vec<BookRow> = sqlx::query_as(&format!(
      "{} WHERE b.stock < $1 ORDER BY b.stock ASC, b.title ASC LIMIT $2",
      BOOK_SELECT
    ))
    .bind(below)
    .bind(limit)
    .fetch_all(&self.pool)
    .await?;
    self.populate(rows).await
  }

  async fn categories(&self) -> Result<Vec<CategoryRef>> {
    let rows = sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM categories ORDER BY name, id")
      .fetch_all(&self.pool)
      .await?;
    Ok(rows.into_iter().map(|(id, name)| CategoryRef { id, name }).collect())
  }

  async fn authors(&self) -> Result<Vec<AuthorRef>> {
    let rows = sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM authors ORDER BY name, id")
      .fetch_all(&self.pool)
      .await?;
    Ok(rows.into_iter().map(|(id, name)| AuthorRef { id, name, role: None }).collect())
  }

  async fn publishers(&self) -> Result<Vec<PublisherRef>> {
    let rows = sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM publishers ORDER BY name, id")
      .fetch_all(&self.pool)
      .await?;
    Ok(rows.into_iter().map(|(id, name)| PublisherRef { id, name }).collect())
  }
}

const ORDER_COLUMNS: &str = "id, user_id, status, payment_status, payment_method, total_amount, created_at, updated_at";

#[async_trait]
impl OrderStore for PgStore {
  async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
      ORDER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    self.attach_items(rows).await
  }

  async fn recent(&self, limit: i64) -> Result<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {} FROM orders ORDER BY created_at DESC LIMIT $1",
      ORDER_COLUMNS
    ))
    .bind(limit)
    .fetch_all(&self.pool)
    .await?;
    self.attach_items(rows).await
  }

  async fn count(&self) -> Result<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
      .fetch_one(&self.pool)
      .await?;
    Ok(n)
  }

  async fn total_revenue(&self) -> Result<f64> {
    let sum = sqlx::query_scalar::<_, f64>(
      "SELECT COALESCE(SUM(total_amount), 0)::float8 FROM orders WHERE status <> 'cancelled'",
    )
    .fetch_one(&self.pool)
    .await?;
    Ok(sum)
  }
}
