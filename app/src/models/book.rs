// app/src/models/book.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorRef {
  pub id: Uuid,
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
  pub id: Uuid,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherRef {
  pub id: Uuid,
  pub name: String,
}

/// A book with its associations populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
  pub id: Uuid,
  pub title: String,
  pub description: Option<String>,
  pub price: f64,
  pub stock: i32,
  pub publisher_id: Uuid,
  #[serde(rename = "ISBN")]
  pub isbn: Option<String>,
  pub publish_year: Option<i32>,
  pub language: Option<String>,
  pub page_count: Option<i32>,
  pub cover_image: Option<String>,
  pub highlights: Vec<String>,
  pub detailed_description: Option<String>,
  pub suitable_for: Vec<String>,
  pub specifications: HashMap<String, String>,
  pub brand: Option<String>,
  pub cover_type: Option<String>,
  pub dimensions: Option<String>,
  pub weight: Option<String>,
  pub distributor: Option<String>,
  pub tags: Vec<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: Option<DateTime<Utc>>,
  pub authors: Vec<AuthorRef>,
  pub categories: Vec<CategoryRef>,
  pub publisher: Option<PublisherRef>,
}

/// Body of `POST /books`. Association ids replace the populated lists.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
  #[serde(default)]
  pub title: String,
  pub description: Option<String>,
  pub price: Option<f64>,
  pub stock: Option<i32>,
  pub publisher_id: Option<Uuid>,
  #[serde(rename = "ISBN")]
  pub isbn: Option<String>,
  pub publish_year: Option<i32>,
  pub language: Option<String>,
  pub page_count: Option<i32>,
  pub cover_image: Option<String>,
  #[serde(default)]
  pub highlights: Vec<String>,
  pub detailed_description: Option<String>,
  #[serde(default)]
  pub suitable_for: Vec<String>,
  #[serde(default)]
  pub specifications: HashMap<String, String>,
  pub brand: Option<String>,
  pub cover_type: Option<String>,
  pub dimensions: Option<String>,
  pub weight: Option<String>,
  pub distributor: Option<String>,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub author_ids: Vec<Uuid>,
  #[serde(default)]
  pub category_ids: Vec<Uuid>,
}

/// Body of `PATCH /books/{id}`. Absent fields are left as they are; populated
/// association fields sent back by clients are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
  pub title: Option<String>,
  pub description: Option<String>,
  pub price: Option<f64>,
  pub stock: Option<i32>,
  pub publisher_id: Option<Uuid>,
  #[serde(rename = "ISBN")]
  pub isbn: Option<String>,
  pub publish_year: Option<i32>,
  pub language: Option<String>,
  pub page_count: Option<i32>,
  pub cover_image: Option<String>,
  pub highlights: Option<Vec<String>>,
  pub detailed_description: Option<String>,
  pub suitable_for: Option<Vec<String>>,
  pub specifications: Option<HashMap<String, String>>,
  pub brand: Option<String>,
  pub cover_type: Option<String>,
  pub dimensions: Option<String>,
  pub weight: Option<String>,
  pub distributor: Option<String>,
  pub tags: Option<Vec<String>>,
  pub author_ids: Option<Vec<Uuid>>,
  pub category_ids: Option<Vec<Uuid>>,
}

impl BookPatch {
  /// Copies every supplied scalar field onto `book`. Associations are handled
  /// by the store, which owns the join tables.
  pub fn apply_fields(&self, book: &mut Book) {
    macro_rules! set {
      ($field:ident) => {
        if let Some(v) = &self.$field {
          book.$field = v.clone();
        }
      };
      (opt $field:ident) => {
        if let Some(v) = &self.$field {
          book.$field = Some(v.clone());
        }
      };
    }
    set!(title);
    set!(opt description);
    set!(price);
    set!(stock);
    set!(publisher_id);
    set!(opt isbn);
    set!(opt publish_year);
    set!(opt language);
    set!(opt page_count);
    set!(opt cover_image);
    set!(highlights);
    set!(opt detailed_description);
    set!(suitable_for);
    set!(specifications);
    set!(opt brand);
    set!(opt cover_type);
    set!(opt dimensions);
    set!(opt weight);
    set!(opt distributor);
    set!(tags);
  }
}

/// Raw query string of `GET /books`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookQuery {
  pub category_id: Option<Uuid>,
  pub author_id: Option<Uuid>,
  pub publisher_id: Option<Uuid>,
  pub search: Option<String>,
  pub sort_by: Option<String>,
  pub sort_order: Option<String>,
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub is_new: Option<bool>,
  pub is_popular: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookPage {
  pub books: Vec<Book>,
  pub total: i64,
  pub page: u32,
  pub limit: u32,
}
