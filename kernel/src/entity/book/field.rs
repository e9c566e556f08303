use std::fmt::{Display, Formatter};

use super::{BookAuthor, BookTitle};

/// Text column of a book that a prefix search runs against.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BookField {
    Title,
    Author,
}

impl BookField {
    pub fn select<'a>(&self, title: &'a BookTitle, author: &'a BookAuthor) -> &'a str {
        match self {
            BookField::Title => AsRef::<String>::as_ref(title),
            BookField::Author => AsRef::<String>::as_ref(author),
        }
    }
}

impl Display for BookField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BookField::Title => write!(f, "title"),
            BookField::Author => write!(f, "author"),
        }
    }
}
