use vodca::References;

use super::{BookAuthor, BookTitle};

/// Field values to overwrite on an existing book. `None` keeps the stored value.
#[derive(Debug, Clone, Eq, PartialEq, Default, References)]
pub struct BookPatch {
    title: Option<BookTitle>,
    author: Option<BookAuthor>,
}

impl BookPatch {
    pub fn new(title: Option<BookTitle>, author: Option<BookAuthor>) -> Self {
        Self { title, author }
    }
}
