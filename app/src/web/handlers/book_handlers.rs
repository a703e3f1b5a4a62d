// app/src/web/handlers/book_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{BookPatch, BookQuery, NewBook};
use crate::services::catalog;
use crate::state::AppState;
use crate::web::extractors::{is_staff, AuthenticatedUser};

#[instrument(name = "handler::list_books", skip(app_state))]
pub async fn list_books_handler(
  app_state: web::Data<AppState>,
  query: web::Query<BookQuery>,
) -> Result<HttpResponse, AppError> {
  let page = catalog::list_books(app_state.books.as_ref(), &query, Utc::now()).await?;
  Ok(HttpResponse::Ok().json(page))
}

#[instrument(name = "handler::get_book", skip(app_state))]
pub async fn get_book_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let book = catalog::get_book(app_state.books.as_ref(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(book))
}

#[instrument(name = "handler::create_book", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn create_book_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<NewBook>,
) -> Result<HttpResponse, AppError> {
  auth_user.require(&app_state, is_staff).await?;
  let book = catalog::create_book(app_state.books.as_ref(), payload.into_inner()).await?;
  info!(book_id = %book.id, "Book created.");
  Ok(HttpResponse::Created().json(book))
}

#[instrument(name = "handler::update_book", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn update_book_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<BookPatch>,
) -> Result<HttpResponse, AppError> {
  auth_user.require(&app_state, is_staff).await?;
  let book = catalog::update_book(app_state.books.as_ref(), path.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(book))
}

#[instrument(name = "handler::delete_book", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn delete_book_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  auth_user.require(&app_state, is_staff).await?;
  let id = path.into_inner();
  catalog::delete_book(app_state.books.as_ref(), id).await?;
  info!(book_id = %id, "Book deleted.");
  Ok(HttpResponse::NoContent().finish())
}

#[instrument(name = "handler::list_categories", skip(app_state))]
pub async fn list_categories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let categories = catalog::list_categories(app_state.books.as_ref()).await?;
  Ok(HttpResponse::Ok().json(categories))
}

#[instrument(name = "handler::list_authors", skip(app_state))]
pub async fn list_authors_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let authors = catalog::list_authors(app_state.books.as_ref()).await?;
  Ok(HttpResponse::Ok().json(authors))
}

#[instrument(name = "handler::list_publishers", skip(app_state))]
pub async fn list_publishers_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let publishers = catalog::list_publishers(app_state.books.as_ref()).await?;
  Ok(HttpResponse::Ok().json(publishers))
}
