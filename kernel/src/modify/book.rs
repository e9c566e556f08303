use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Book, BookAuthor, BookId, BookPatch, BookTitle};
use crate::KernelError;

#[async_trait::async_trait]
pub trait BookModifier: 'static + Sync + Send {
    type Transaction: Transaction;
    /// Persists a new row and returns it with the id assigned by the store.
    async fn create(
        &self,
        con: &mut Self::Transaction,
        title: &BookTitle,
        author: &BookAuthor,
    ) -> error_stack::Result<Book, KernelError>;
    async fn update(
        &self,
        con: &mut Self::Transaction,
        id: &BookId,
        patch: &BookPatch,
    ) -> error_stack::Result<Option<Book>, KernelError>;
    /// Returns the removed row, or `None` when nothing matched.
    async fn delete(
        &self,
        con: &mut Self::Transaction,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError>;
}

pub trait DependOnBookModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type BookModifier: BookModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn book_modifier(&self) -> &Self::BookModifier;
}
