mod author;
mod field;
mod id;
mod patch;
mod title;

pub use self::{author::*, field::*, id::*, patch::*, title::*};
use destructure::Destructure;
use vodca::References;

#[derive(Debug, Clone, Eq, PartialEq, References, Destructure)]
pub struct Book {
    id: BookId,
    title: BookTitle,
    author: BookAuthor,
}

impl Book {
    pub fn new(id: BookId, title: BookTitle, author: BookAuthor) -> Self {
        Self { id, title, author }
    }

    /// Applies the present fields of `patch`, leaving the others untouched.
    pub fn patched(self, patch: &BookPatch) -> Self {
        self.reconstruct(|book| {
            if let Some(title) = patch.title() {
                book.title = title.clone();
            }
            if let Some(author) = patch.author() {
                book.author = author.clone();
            }
        })
    }
}
