use crate::controller::Exhaust;
use application::transfer::BookDto;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

static BOOK_NOT_FOUND_MESSAGE: &str = "This book don't exist";

#[derive(Debug, Serialize)]
pub struct BookResponse {
    id: i64,
    title: String,
    author: String,
}

impl From<BookDto> for BookResponse {
    fn from(value: BookDto) -> Self {
        let BookDto { id, title, author } = value;
        Self { id, title, author }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedBookResponse {
    books: BookResponse,
}

impl IntoResponse for CreatedBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct UpdatedBookResponse {
    book: BookResponse,
}

impl IntoResponse for UpdatedBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    message: &'static str,
}

#[derive(Debug)]
pub enum SearchedBookResponse {
    Found(Vec<BookResponse>),
    Missing,
}

impl IntoResponse for SearchedBookResponse {
    fn into_response(self) -> Response {
        match self {
            SearchedBookResponse::Found(books) => (StatusCode::OK, Json(books)).into_response(),
            SearchedBookResponse::Missing => {
                let body = MessageResponse {
                    message: BOOK_NOT_FOUND_MESSAGE,
                };
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
        }
    }
}

fn to_responses(input: Vec<BookDto>) -> Vec<BookResponse> {
    input.into_iter().map(BookResponse::from).collect()
}

pub struct BookPresenter;

impl Exhaust<()> for BookPresenter {
    type To = StatusCode;
    fn emit(&self, _: ()) -> Self::To {
        StatusCode::NO_CONTENT
    }
}

// A single book is answered as a one-element array
impl Exhaust<Option<BookDto>> for BookPresenter {
    type To = Option<Json<Vec<BookResponse>>>;
    fn emit(&self, input: Option<BookDto>) -> Self::To {
        input.map(|book| Json(vec![BookResponse::from(book)]))
    }
}

impl Exhaust<Vec<BookDto>> for BookPresenter {
    type To = Json<Vec<BookResponse>>;
    fn emit(&self, input: Vec<BookDto>) -> Self::To {
        Json::from(to_responses(input))
    }
}

pub struct CreatedBookPresenter;

impl Exhaust<BookDto> for CreatedBookPresenter {
    type To = CreatedBookResponse;
    fn emit(&self, input: BookDto) -> Self::To {
        CreatedBookResponse {
            books: BookResponse::from(input),
        }
    }
}

pub struct UpdatedBookPresenter;

impl Exhaust<Option<BookDto>> for UpdatedBookPresenter {
    type To = Option<UpdatedBookResponse>;
    fn emit(&self, input: Option<BookDto>) -> Self::To {
        input.map(|book| UpdatedBookResponse {
            book: BookResponse::from(book),
        })
    }
}

pub struct SearchedBookPresenter;

impl Exhaust<Vec<BookDto>> for SearchedBookPresenter {
    type To = SearchedBookResponse;
    fn emit(&self, input: Vec<BookDto>) -> Self::To {
        if input.is_empty() {
            SearchedBookResponse::Missing
        } else {
            SearchedBookResponse::Found(to_responses(input))
        }
    }
}
