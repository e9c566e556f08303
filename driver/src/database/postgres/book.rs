use sqlx::PgConnection;

use kernel::interface::query::BookQuery;
use kernel::interface::update::BookModifier;
use kernel::prelude::entity::{Book, BookAuthor, BookField, BookId, BookPatch, BookTitle};
use kernel::KernelError;

use crate::database::postgres::PostgresConnection;
use crate::error::ConvertError;

pub struct PostgresBookRepository;

#[async_trait::async_trait]
impl BookQuery for PostgresBookRepository {
    type Transaction = PostgresConnection;

    async fn find_by_id(
        &self,
        con: &mut PostgresConnection,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        PgBookInternal::find_by_id(con, id).await
    }

    async fn find_all(
        &self,
        con: &mut PostgresConnection,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        PgBookInternal::find_all(con).await
    }

    async fn find_by_prefix(
        &self,
        con: &mut PostgresConnection,
        field: &BookField,
        prefix: &str,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        PgBookInternal::find_by_prefix(con, field, prefix).await
    }
}

#[async_trait::async_trait]
impl BookModifier for PostgresBookRepository {
    type Transaction = PostgresConnection;

    async fn create(
        &self,
        con: &mut PostgresConnection,
        title: &BookTitle,
        author: &BookAuthor,
    ) -> error_stack::Result<Book, KernelError> {
        PgBookInternal::create(con, title, author).await
    }

    async fn update(
        &self,
        con: &mut PostgresConnection,
        id: &BookId,
        patch: &BookPatch,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        PgBookInternal::update(con, id, patch).await
    }

    async fn delete(
        &self,
        con: &mut PostgresConnection,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        PgBookInternal::delete(con, id).await
    }
}

#[derive(sqlx::FromRow)]
struct BookRow {
    id: i64,
    title: String,
    author: String,
}

impl From<BookRow> for Book {
    fn from(value: BookRow) -> Self {
        Book::new(
            BookId::new(value.id),
            BookTitle::new(value.title),
            BookAuthor::new(value.author),
        )
    }
}

/// Turns `prefix` into a `LIKE` pattern that matches it literally at the start.
fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub(in crate::database) struct PgBookInternal;

impl PgBookInternal {
    pub(in crate::database) async fn create_table(
        con: &mut PgConnection,
    ) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id     BIGSERIAL PRIMARY KEY,
                title  VARCHAR(255) NOT NULL,
                author VARCHAR(255) NOT NULL
            )
            "#,
        )
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn find_by_id(
        con: &mut PgConnection,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        let row = sqlx::query_as::<_, BookRow>(
            // language=postgresql
            r#"
            SELECT id, title, author
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Book::from))
    }

    async fn find_all(con: &mut PgConnection) -> error_stack::Result<Vec<Book>, KernelError> {
        let rows = sqlx::query_as::<_, BookRow>(
            // language=postgresql
            r#"
            SELECT id, title, author
            FROM books
            ORDER BY id
            "#,
        )
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn find_by_prefix(
        con: &mut PgConnection,
        field: &BookField,
        prefix: &str,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        let query = match field {
            // language=postgresql
            BookField::Title => {
                r#"
                SELECT id, title, author
                FROM books
                WHERE title LIKE $1 ESCAPE '\'
                ORDER BY id
                "#
            }
            // language=postgresql
            BookField::Author => {
                r#"
                SELECT id, title, author
                FROM books
                WHERE author LIKE $1 ESCAPE '\'
                ORDER BY id
                "#
            }
        };
        let rows = sqlx::query_as::<_, BookRow>(query)
            .bind(prefix_pattern(prefix))
            .fetch_all(con)
            .await
            .convert_error()?;
        tracing::debug!("{} rows with {field} prefix {prefix:?}", rows.len());
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn create(
        con: &mut PgConnection,
        title: &BookTitle,
        author: &BookAuthor,
    ) -> error_stack::Result<Book, KernelError> {
        let row = sqlx::query_as::<_, BookRow>(
            // language=postgresql
            r#"
            INSERT INTO books (title, author)
            VALUES ($1, $2)
            RETURNING id, title, author
            "#,
        )
        .bind(AsRef::<String>::as_ref(title))
        .bind(AsRef::<String>::as_ref(author))
        .fetch_one(con)
        .await
        .convert_error()?;
        tracing::debug!("created book {}", row.id);
        Ok(Book::from(row))
    }

    async fn update(
        con: &mut PgConnection,
        id: &BookId,
        patch: &BookPatch,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        let row = sqlx::query_as::<_, BookRow>(
            // language=postgresql
            r#"
            UPDATE books
            SET title = COALESCE($2, title), author = COALESCE($3, author)
            WHERE id = $1
            RETURNING id, title, author
            "#,
        )
        .bind(id.as_ref())
        .bind(patch.title().as_ref().map(AsRef::<String>::as_ref))
        .bind(patch.author().as_ref().map(AsRef::<String>::as_ref))
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Book::from))
    }

    async fn delete(
        con: &mut PgConnection,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        let row = sqlx::query_as::<_, BookRow>(
            // language=postgresql
            r#"
            DELETE FROM books
            WHERE id = $1
            RETURNING id, title, author
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Book::from))
    }
}
