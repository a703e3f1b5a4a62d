// tests/catalog_tests.rs
mod common;

use bookstore::errors::AppError;
use bookstore::models::{BookPatch, BookQuery, NewBook};
use bookstore::services::catalog;
use bookstore::store::{BookStore, MemoryStore};
use chrono::{Duration, Utc};
use common::*;
use uuid::Uuid;

struct Catalog {
  store: std::sync::Arc<MemoryStore>,
  kim_dong: Uuid,
  tre: Uuid,
  to_hoai: Uuid,
  nguyen_nhat_anh: Uuid,
  thieu_nhi: Uuid,
}

fn new_book(title: &str, price: f64, stock: i32, publisher: Uuid, author: Uuid, category: Option<Uuid>) -> NewBook {
  NewBook {
    title: title.to_string(),
    price: Some(price),
    stock: Some(stock),
    publisher_id: Some(publisher),
    author_ids: vec![author],
    category_ids: category.into_iter().collect(),
    ..Default::default()
  }
}

/// Five books; "Dế Mèn" and "Võ sĩ" were created 60 days ago.
async fn seeded_catalog() -> Catalog {
  let (_state, store) = test_state();
  let kim_dong = store.add_publisher("NXB Kim Đồng");
  let tre = store.add_publisher("NXB Trẻ");
  let to_hoai = store.add_author("Tô Hoài");
  let nguyen_nhat_anh = store.add_author("Nguyễn Nhật Ánh");
  let thieu_nhi = store.add_category("Thiếu nhi");

  let books = [
    new_book("Dế Mèn phiêu lưu ký", 45_000.0, 120, kim_dong, to_hoai, Some(thieu_nhi)),
    new_book("Võ sĩ giác đấu", 30_000.0, 4, kim_dong, to_hoai, Some(thieu_nhi)),
    new_book("Mắt biếc", 110_000.0, 8, tre, nguyen_nhat_anh, None),
    new_book("Kính vạn hoa", 60_000.0, 0, tre, nguyen_nhat_anh, Some(thieu_nhi)),
    new_book("Cho tôi xin một vé đi tuổi thơ", 80_000.0, 25, tre, nguyen_nhat_anh, None),
  ];
  let mut ids = Vec::new();
  for input in &books {
    ids.push(catalog::create_book(store.as_ref(), input.clone()).await.unwrap().id);
  }
  let old = Utc::now() - Duration::days(60);
  assert!(store.set_book_created_at(ids[0], old));
  assert!(store.set_book_created_at(ids[1], old));

  Catalog {
    store,
    kim_dong,
    tre,
    to_hoai,
    nguyen_nhat_anh,
    thieu_nhi,
  }
}

fn titles(page: &bookstore::models::BookPage) -> Vec<&str> {
  page.books.iter().map(|b| b.title.as_str()).collect()
}

#[tokio::test]
async fn test_created_book_has_populated_associations() {
  let c = seeded_catalog().await;
  let page = catalog::list_books(
    c.store.as_ref(),
    &BookQuery {
      search: Some("mắt".to_string()),
      ..Default::default()
    },
    Utc::now(),
  )
  .await
  .unwrap();
  assert_eq!(page.total, 1);
  let book = &page.books[0];
  assert_eq!(book.publisher.as_ref().map(|p| p.id), Some(c.tre));
  assert_eq!(book.authors[0].id, c.nguyen_nhat_anh);
  assert_eq!(book.authors[0].name, "Nguyễn Nhật Ánh");
  assert!(book.categories.is_empty());

  let json = serde_json::to_value(book).unwrap();
  assert!(json.get("ISBN").is_some());
  assert!(json.get("publisherId").is_some());
}

#[tokio::test]
async fn test_list_filters_by_association() {
  let c = seeded_catalog().await;
  let now = Utc::now();

  let by_publisher = catalog::list_books(
    c.store.as_ref(),
    &BookQuery {
      publisher_id: Some(c.kim_dong),
      ..Default::default()
    },
    now,
  )
  .await
  .unwrap();
  assert_eq!(by_publisher.total, 2);

  let by_author = catalog::list_books(
    c.store.as_ref(),
    &BookQuery {
      author_id: Some(c.to_hoai),
      ..Default::default()
    },
    now,
  )
  .await
  .unwrap();
  assert_eq!(titles(&by_author), vec!["Dế Mèn phiêu lưu ký", "Võ sĩ giác đấu"]);

  let by_category = catalog::list_books(
    c.store.as_ref(),
    &BookQuery {
      category_id: Some(c.thieu_nhi),
      ..Default::default()
    },
    now,
  )
  .await
  .unwrap();
  assert_eq!(by_category.total, 3);
}

#[tokio::test]
async fn test_list_sorts_and_paginates() {
  let c = seeded_catalog().await;
  let query = BookQuery {
    sort_by: Some("price".to_string()),
    sort_order: Some("desc".to_string()),
    page: Some(2),
    limit: Some(2),
    ..Default::default()
  };
  let page = catalog::list_books(c.store.as_ref(), &query, Utc::now()).await.unwrap();
  assert_eq!(page.total, 5);
  assert_eq!(page.page, 2);
  assert_eq!(page.limit, 2);
  assert_eq!(titles(&page), vec!["Kính vạn hoa", "Dế Mèn phiêu lưu ký"]);

  let last = catalog::list_books(
    c.store.as_ref(),
    &BookQuery {
      page: Some(3),
      ..query
    },
    Utc::now(),
  )
  .await
  .unwrap();
  assert_eq!(titles(&last), vec!["Võ sĩ giác đấu"]);
}

#[tokio::test]
async fn test_new_and_popular_flags_filter_the_page() {
  let c = seeded_catalog().await;
  let now = Utc::now();

  let fresh = catalog::list_books(
    c.store.as_ref(),
    &BookQuery {
      is_new: Some(true),
      ..Default::default()
    },
    now,
  )
  .await
  .unwrap();
  assert_eq!(fresh.total, 3);
  assert!(!titles(&fresh).contains(&"Dế Mèn phiêu lưu ký"));

  // In stock but under ten copies.
  let popular = catalog::list_books(
    c.store.as_ref(),
    &BookQuery {
      is_popular: Some(true),
      ..Default::default()
    },
    now,
  )
  .await
  .unwrap();
  assert_eq!(titles(&popular), vec!["Mắt biếc", "Võ sĩ giác đấu"]);
  assert_eq!(popular.total, 2);

  let both = catalog::list_books(
    c.store.as_ref(),
    &BookQuery {
      is_new: Some(true),
      is_popular: Some(true),
      ..Default::default()
    },
    now,
  )
  .await
  .unwrap();
  assert_eq!(titles(&both), vec!["Mắt biếc"]);
}

#[tokio::test]
async fn test_invalid_writes_never_reach_the_store() {
  let c = seeded_catalog().await;
  let before = BookStore::count(c.store.as_ref()).await.unwrap();

  let err = catalog::create_book(
    c.store.as_ref(),
    new_book("Negative", -5.0, 1, c.tre, c.to_hoai, None),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
  let err = catalog::create_book(c.store.as_ref(), new_book("Negative", 5.0, -1, c.tre, c.to_hoai, None))
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
  assert_eq!(BookStore::count(c.store.as_ref()).await.unwrap(), before);

  let target = catalog::list_books(c.store.as_ref(), &BookQuery::default(), Utc::now())
    .await
    .unwrap()
    .books[0]
    .clone();
  let err = catalog::update_book(
    c.store.as_ref(),
    target.id,
    BookPatch {
      price: Some(-1.0),
      ..Default::default()
    },
  )
  .await
  .unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
  let unchanged = catalog::get_book(c.store.as_ref(), target.id).await.unwrap();
  assert_eq!(unchanged.price, target.price);
  assert_eq!(unchanged.updated_at, None);
}

#[tokio::test]
async fn test_update_replaces_supplied_associations_only() {
  let c = seeded_catalog().await;
  let book = catalog::create_book(
    c.store.as_ref(),
    new_book("Tuổi thơ dữ dội", 90_000.0, 12, c.kim_dong, c.to_hoai, Some(c.thieu_nhi)),
  )
  .await
  .unwrap();

  let updated = catalog::update_book(
    c.store.as_ref(),
    book.id,
    BookPatch {
      stock: Some(7),
      author_ids: Some(vec![c.nguyen_nhat_anh]),
      ..Default::default()
    },
  )
  .await
  .unwrap();
  assert_eq!(updated.stock, 7);
  assert_eq!(updated.price, 90_000.0);
  assert_eq!(updated.authors.len(), 1);
  assert_eq!(updated.authors[0].id, c.nguyen_nhat_anh);
  assert_eq!(updated.categories.len(), 1);
  assert!(updated.updated_at.is_some());
}

#[tokio::test]
async fn test_get_and_delete_missing_book() {
  let c = seeded_catalog().await;
  let missing = Uuid::new_v4();
  assert!(matches!(
    catalog::get_book(c.store.as_ref(), missing).await,
    Err(AppError::NotFound(_))
  ));
  assert!(matches!(
    catalog::delete_book(c.store.as_ref(), missing).await,
    Err(AppError::NotFound(_))
  ));
  assert!(matches!(
    catalog::update_book(c.store.as_ref(), missing, BookPatch::default()).await,
    Err(AppError::NotFound(_))
  ));
}

#[tokio::test]
async fn test_unknown_reference_is_rejected() {
  let c = seeded_catalog().await;
  let err = catalog::create_book(
    c.store.as_ref(),
    new_book("Orphan", 1.0, 1, c.tre, Uuid::new_v4(), None),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_lookup_lists_are_sorted_by_name() {
  let c = seeded_catalog().await;
  let extra = c.store.add_category("Giáo khoa");

  let categories = catalog::list_categories(c.store.as_ref()).await.unwrap();
  let names: Vec<&str> = categories.iter().map(|x| x.name.as_str()).collect();
  assert_eq!(names, ["Giáo khoa", "Thiếu nhi"]);
  assert_eq!(categories[0].id, extra);
  assert_eq!(categories[1].id, c.thieu_nhi);

  let authors = catalog::list_authors(c.store.as_ref()).await.unwrap();
  assert_eq!(
    authors.iter().map(|a| a.id).collect::<Vec<_>>(),
    [c.nguyen_nhat_anh, c.to_hoai]
  );
  assert!(authors.iter().all(|a| a.role.is_none()));

  let publishers = catalog::list_publishers(c.store.as_ref()).await.unwrap();
  assert_eq!(publishers.iter().map(|p| p.id).collect::<Vec<_>>(), [c.kim_dong, c.tre]);
}

#[tokio::test]
async fn test_whole_catalog_request_is_served_not_rejected() {
  let c = seeded_catalog().await;
  let query = BookQuery {
    limit: Some(1000),
    ..Default::default()
  };
  let page = catalog::list_books(c.store.as_ref(), &query, Utc::now()).await.unwrap();
  assert_eq!(page.books.len(), 5);
  assert_eq!(page.total, 5);
  assert_eq!(page.limit, 1000);

  let oversized = BookQuery {
    limit: Some(1_000_000),
    ..Default::default()
  };
  let page = catalog::list_books(c.store.as_ref(), &oversized, Utc::now()).await.unwrap();
  assert_eq!(page.limit, catalog::MAX_PAGE_SIZE);
  assert_eq!(page.books.len(), 5);
}

#[tokio::test]
async fn test_search_wildcards_match_literally() {
  let c = seeded_catalog().await;
  for search in ["%", "_", "\\"] {
    let query = BookQuery {
      search: Some(search.to_string()),
      ..Default::default()
    };
    let page = catalog::list_books(c.store.as_ref(), &query, Utc::now()).await.unwrap();
    assert!(page.books.is_empty(), "{:?} matched {:?}", search, titles(&page));
  }
}
