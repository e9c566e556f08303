use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{BookQuery, DependOnBookQuery};
use kernel::interface::update::{BookModifier, DependOnBookModifier};
use kernel::prelude::entity::{BookAuthor, BookField, BookId, BookPatch, BookTitle};
use kernel::KernelError;

use crate::transfer::{
    BookDto, CreateBookDto, DeleteBookDto, GetBookDto, SearchBookDto, UpdateBookDto,
};

#[async_trait::async_trait]
pub trait GetBookService: 'static + Sync + Send + DependOnBookQuery {
    async fn get_all_books(&self) -> error_stack::Result<Vec<BookDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let books = self.book_query().find_all(&mut connection).await?;

        Ok(books.into_iter().map(BookDto::from).collect())
    }

    async fn get_book(&self, dto: &GetBookDto) -> error_stack::Result<Option<BookDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let id = BookId::new(dto.id);
        let book = self.book_query().find_by_id(&mut connection, &id).await?;

        Ok(book.map(BookDto::from))
    }

    /// Searches title prefixes first and only falls back to author prefixes
    /// when no title matched.
    async fn search_books(
        &self,
        dto: &SearchBookDto,
    ) -> error_stack::Result<Vec<BookDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let mut books = self
            .book_query()
            .find_by_prefix(&mut connection, &BookField::Title, &dto.search)
            .await?;
        if books.is_empty() {
            tracing::debug!("no title starts with {:?}, searching authors", dto.search);
            books = self
                .book_query()
                .find_by_prefix(&mut connection, &BookField::Author, &dto.search)
                .await?;
        }

        Ok(books.into_iter().map(BookDto::from).collect())
    }
}

impl<T> GetBookService for T where T: DependOnBookQuery {}

#[async_trait::async_trait]
pub trait CreateBookService: 'static + Sync + Send + DependOnBookModifier {
    async fn create_book(&self, dto: CreateBookDto) -> error_stack::Result<BookDto, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let title = BookTitle::new(dto.title);
        let author = BookAuthor::new(dto.author);
        let book = self
            .book_modifier()
            .create(&mut connection, &title, &author)
            .await?;
        connection.commit().await?;

        Ok(BookDto::from(book))
    }
}

impl<T> CreateBookService for T where T: DependOnBookModifier {}

#[async_trait::async_trait]
pub trait UpdateBookService: 'static + Sync + Send + DependOnBookModifier {
    async fn update_book(
        &self,
        dto: UpdateBookDto,
    ) -> error_stack::Result<Option<BookDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let id = BookId::new(dto.id);
        let patch = BookPatch::new(
            dto.title.map(BookTitle::new),
            dto.author.map(BookAuthor::new),
        );
        let book = self
            .book_modifier()
            .update(&mut connection, &id, &patch)
            .await?;
        connection.commit().await?;

        Ok(book.map(BookDto::from))
    }
}

impl<T> UpdateBookService for T where T: DependOnBookModifier {}

#[async_trait::async_trait]
pub trait DeleteBookService: 'static + Sync + Send + DependOnBookModifier {
    async fn delete_book(&self, dto: DeleteBookDto) -> error_stack::Result<(), KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let id = BookId::new(dto.id);
        let deleted = self.book_modifier().delete(&mut connection, &id).await?;
        connection.commit().await?;

        if deleted.is_none() {
            tracing::debug!("book {} did not exist, nothing deleted", dto.id);
        }
        Ok(())
    }
}

impl<T> DeleteBookService for T where T: DependOnBookModifier {}

#[cfg(test)]
mod test {
    use driver::database::InMemoryDatabase;
    use kernel::KernelError;

    use crate::service::{CreateBookService, DeleteBookService, GetBookService, UpdateBookService};
    use crate::transfer::{
        BookDto, CreateBookDto, DeleteBookDto, GetBookDto, SearchBookDto, UpdateBookDto,
    };

    async fn create(
        db: &InMemoryDatabase,
        title: &str,
        author: &str,
    ) -> error_stack::Result<BookDto, KernelError> {
        db.create_book(CreateBookDto {
            title: title.to_string(),
            author: author.to_string(),
        })
        .await
    }

    fn search(search: &str) -> SearchBookDto {
        SearchBookDto {
            search: search.to_string(),
        }
    }

    #[tokio::test]
    async fn created_book_can_be_read_back() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::default();
        let created = create(&db, "Dune", "Herbert").await?;

        let found = db.get_book(&GetBookDto { id: created.id }).await?;
        assert_eq!(found, Some(created.clone()));
        assert_eq!(created.title, "Dune");
        assert_eq!(created.author, "Herbert");
        Ok(())
    }

    #[tokio::test]
    async fn missing_book_is_none() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::default();
        assert_eq!(db.get_book(&GetBookDto { id: 42 }).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn get_all_returns_every_book() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::default();
        assert!(db.get_all_books().await?.is_empty());

        create(&db, "Dune", "Herbert").await?;
        create(&db, "Emma", "Austen").await?;
        create(&db, "Ubik", "Dick").await?;

        let mut titles = db
            .get_all_books()
            .await?
            .into_iter()
            .map(|book| book.title)
            .collect::<Vec<_>>();
        titles.sort();
        assert_eq!(titles, vec!["Dune", "Emma", "Ubik"]);
        Ok(())
    }

    #[tokio::test]
    async fn search_prefers_title_matches() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::default();
        let hobbit = create(&db, "Hobbit", "Tolkien").await?;
        create(&db, "Dune", "Herbert").await?;

        let found = db.search_books(&search("H")).await?;
        assert_eq!(found, vec![hobbit]);
        Ok(())
    }

    #[tokio::test]
    async fn search_falls_back_to_author() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::default();
        let dune = create(&db, "Dune", "Herbert").await?;
        create(&db, "Emma", "Austen").await?;

        let found = db.search_books(&search("Her")).await?;
        assert_eq!(found, vec![dune]);

        assert!(db.search_books(&search("erbert")).await?.is_empty());
        assert!(db.search_books(&search("Zzz")).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn update_only_touches_given_fields() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::default();
        let dune = create(&db, "Dune", "Herbert").await?;

        let updated = db
            .update_book(UpdateBookDto {
                id: dune.id,
                title: Some("Dune Messiah".to_string()),
                author: None,
            })
            .await?;
        let expected = BookDto {
            id: dune.id,
            title: "Dune Messiah".to_string(),
            author: "Herbert".to_string(),
        };
        assert_eq!(updated, Some(expected.clone()));
        assert_eq!(db.get_book(&GetBookDto { id: dune.id }).await?, Some(expected));
        Ok(())
    }

    #[tokio::test]
    async fn update_missing_book_is_none() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::default();
        let updated = db
            .update_book(UpdateBookDto {
                id: 7,
                title: Some("Dune".to_string()),
                author: None,
            })
            .await?;
        assert!(updated.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn delete_is_idempotent() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::default();
        let dune = create(&db, "Dune", "Herbert").await?;

        db.delete_book(DeleteBookDto { id: dune.id }).await?;
        db.delete_book(DeleteBookDto { id: dune.id }).await?;

        assert_eq!(db.get_book(&GetBookDto { id: dune.id }).await?, None);
        assert!(db.get_all_books().await?.is_empty());
        Ok(())
    }
}
