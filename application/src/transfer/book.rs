use kernel::prelude::entity::{Book, DestructBook};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BookDto {
    pub id: i64,
    pub title: String,
    pub author: String,
}

impl From<Book> for BookDto {
    fn from(value: Book) -> Self {
        let DestructBook { id, title, author } = value.into_destruct();
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
        }
    }
}

pub struct GetBookDto {
    pub id: i64,
}

pub struct SearchBookDto {
    pub search: String,
}

pub struct CreateBookDto {
    pub title: String,
    pub author: String,
}

pub struct UpdateBookDto {
    pub id: i64,
    pub title: Option<String>,
    pub author: Option<String>,
}

pub struct DeleteBookDto {
    pub id: i64,
}
