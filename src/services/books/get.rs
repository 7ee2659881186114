use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::BookService;
use crate::cache::{CacheResult, ObjectCache, keys};
use crate::errors::Result;
use crate::models::books::entities::Book;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{cache_of, internal_error, not_found};
use crate::storage::Storage;
use crate::utils::validate::normalize_code;

pub async fn list_books(service: &BookService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let cache = cache_of(request)?;

    match cached_books(storage.as_ref(), cache.as_ref()).await {
        Ok(books) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            books,
            "Books retrieved successfully",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            "Failed to list books",
            &e,
        )),
    }
}

pub async fn get_book(
    service: &BookService,
    request: &HttpRequest,
    book_id: String,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let cache = cache_of(request)?;

    match cached_book(storage.as_ref(), cache.as_ref(), &normalize_code(&book_id)).await {
        Ok(Some(book)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            book,
            "Book retrieved successfully",
        ))),
        Ok(None) => Ok(not_found(ErrorCode::BookNotFound, "Book not found")),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            "Failed to get book",
            &e,
        )),
    }
}

pub(crate) async fn cached_books(
    storage: &dyn Storage,
    cache: &dyn ObjectCache,
) -> Result<Vec<Book>> {
    if let CacheResult::Found(books) = cache.get::<Vec<Book>>(keys::BOOKS_ALL).await {
        return Ok(books);
    }
    let books = storage.list_books().await?;
    cache.insert(keys::BOOKS_ALL, &books, 0).await;
    Ok(books)
}

pub(crate) async fn cached_book(
    storage: &dyn Storage,
    cache: &dyn ObjectCache,
    book_id: &str,
) -> Result<Option<Book>> {
    let key = keys::book(book_id);
    if let CacheResult::Found(book) = cache.get::<Book>(&key).await {
        return Ok(Some(book));
    }
    let book = storage.get_book_by_id(book_id).await?;
    if let Some(book) = &book {
        cache.insert(&key, book, 0).await;
    }
    Ok(book)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::books::requests::CreateBookRequest;
    use crate::services::reload::reload_books;
    use crate::services::test_support;

    fn book(id: &str) -> CreateBookRequest {
        CreateBookRequest {
            id: id.into(),
            name: "Robotics".into(),
            book_type: "Robotic".into(),
            price: 1.0,
            describe: None,
            image: None,
            badge: None,
            topics: vec!["Gears".into()],
        }
    }

    #[tokio::test]
    async fn test_list_is_served_from_cache_until_reload() {
        let storage = test_support::storage().await;
        let cache = test_support::cache();
        storage.create_book(book("A")).await.unwrap();

        assert_eq!(cached_books(storage.as_ref(), cache.as_ref()).await.unwrap().len(), 1);
        storage.create_book(book("B")).await.unwrap();
        assert_eq!(cached_books(storage.as_ref(), cache.as_ref()).await.unwrap().len(), 1);

        reload_books(cache.as_ref(), None).await;
        assert_eq!(cached_books(storage.as_ref(), cache.as_ref()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_book_is_not_cached() {
        let storage = test_support::storage().await;
        let cache = test_support::cache();

        assert!(cached_book(storage.as_ref(), cache.as_ref(), "A").await.unwrap().is_none());
        storage.create_book(book("A")).await.unwrap();
        let found = cached_book(storage.as_ref(), cache.as_ref(), "A").await.unwrap().unwrap();
        assert_eq!(found.topics[0].name, "Gears");
    }
}
