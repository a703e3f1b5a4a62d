// app/src/web/routes.rs

use actix_web::{error::InternalError, web, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{auth_handlers, book_handlers, dashboard_handlers, order_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Malformed bodies and query strings get the same JSON error shape as
/// everything else.
fn bad_request(err: impl std::fmt::Display) -> actix_web::Error {
  let app_err = AppError::Validation(err.to_string());
  let response = actix_web::ResponseError::error_response(&app_err);
  InternalError::from_response(app_err, response).into()
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(|err, _req| bad_request(err)))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| bad_request(err)))
    .app_data(web::PathConfig::default().error_handler(|err, _req| bad_request(err)))
    .service(
      web::scope("/api/v1")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/auth")
            .route("/register", web::post().to(auth_handlers::register_handler))
            .route("/login", web::post().to(auth_handlers::login_handler))
            .route("/me", web::get().to(auth_handlers::me_handler))
            .route("/profile", web::patch().to(auth_handlers::update_profile_handler)),
        )
        .service(
          web::scope("/books")
            .route("", web::get().to(book_handlers::list_books_handler))
            .route("", web::post().to(book_handlers::create_book_handler))
            .route("/{id}", web::get().to(book_handlers::get_book_handler))
            .route("/{id}", web::patch().to(book_handlers::update_book_handler))
            .route("/{id}", web::delete().to(book_handlers::delete_book_handler)),
        )
        .route("/categories", web::get().to(book_handlers::list_categories_handler))
        .route("/authors", web::get().to(book_handlers::list_authors_handler))
        .route("/publishers", web::get().to(book_handlers::list_publishers_handler))
        .service(web::scope("/orders").route("/mine", web::get().to(order_handlers::my_orders_handler)))
        .service(web::scope("/admin").route("/dashboard", web::get().to(dashboard_handlers::dashboard_handler))),
    );
}
