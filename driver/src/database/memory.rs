use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use error_stack::Report;

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{BookQuery, DependOnBookQuery};
use kernel::interface::update::{BookModifier, DependOnBookModifier};
use kernel::prelude::entity::{Book, BookAuthor, BookField, BookId, BookPatch, BookTitle};
use kernel::KernelError;

#[derive(Debug, Default)]
struct BookTable {
    last_id: i64,
    rows: BTreeMap<BookId, Book>,
}

/// Volatile book store. Cloned handles share the same table.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDatabase {
    table: Arc<Mutex<BookTable>>,
}

/// Writes are applied immediately, so commit and roll back have nothing to do.
pub struct InMemoryConnection {
    table: Arc<Mutex<BookTable>>,
}

impl InMemoryConnection {
    fn lock(&self) -> error_stack::Result<MutexGuard<'_, BookTable>, KernelError> {
        self.table.lock().map_err(|_| {
            Report::new(KernelError::Internal).attach_printable("Book table lock is poisoned")
        })
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for InMemoryDatabase {
    type Transaction = InMemoryConnection;
    async fn transact(&self) -> error_stack::Result<InMemoryConnection, KernelError> {
        Ok(InMemoryConnection {
            table: Arc::clone(&self.table),
        })
    }
}

#[async_trait::async_trait]
impl Transaction for InMemoryConnection {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        Ok(())
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        Ok(())
    }
}

impl DependOnBookQuery for InMemoryDatabase {
    type BookQuery = InMemoryBookRepository;
    fn book_query(&self) -> &Self::BookQuery {
        &InMemoryBookRepository
    }
}

impl DependOnBookModifier for InMemoryDatabase {
    type BookModifier = InMemoryBookRepository;
    fn book_modifier(&self) -> &Self::BookModifier {
        &InMemoryBookRepository
    }
}

pub struct InMemoryBookRepository;

#[async_trait::async_trait]
impl BookQuery for InMemoryBookRepository {
    type Transaction = InMemoryConnection;

    async fn find_by_id(
        &self,
        con: &mut InMemoryConnection,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        Ok(con.lock()?.rows.get(id).cloned())
    }

    async fn find_all(
        &self,
        con: &mut InMemoryConnection,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        Ok(con.lock()?.rows.values().cloned().collect())
    }

    async fn find_by_prefix(
        &self,
        con: &mut InMemoryConnection,
        field: &BookField,
        prefix: &str,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        let table = con.lock()?;
        let found = table
            .rows
            .values()
            .filter(|book| field.select(book.title(), book.author()).starts_with(prefix))
            .cloned()
            .collect();
        Ok(found)
    }
}

#[async_trait::async_trait]
impl BookModifier for InMemoryBookRepository {
    type Transaction = InMemoryConnection;

    async fn create(
        &self,
        con: &mut InMemoryConnection,
        title: &BookTitle,
        author: &BookAuthor,
    ) -> error_stack::Result<Book, KernelError> {
        let mut table = con.lock()?;
        table.last_id += 1;
        let id = BookId::new(table.last_id);
        let book = Book::new(id, title.clone(), author.clone());
        table.rows.insert(id, book.clone());
        Ok(book)
    }

    async fn update(
        &self,
        con: &mut InMemoryConnection,
        id: &BookId,
        patch: &BookPatch,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        let mut table = con.lock()?;
        let Some(book) = table.rows.remove(id) else {
            return Ok(None);
        };
        let book = book.patched(patch);
        table.rows.insert(*id, book.clone());
        Ok(Some(book))
    }

    async fn delete(
        &self,
        con: &mut InMemoryConnection,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        Ok(con.lock()?.rows.remove(id))
    }
}
