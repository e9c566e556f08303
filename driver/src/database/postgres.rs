use std::ops::{Deref, DerefMut};
use std::time::Duration;

use error_stack::{Report, ResultExt};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Error, PgConnection, Pool, Postgres};

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::DependOnBookQuery;
use kernel::interface::update::DependOnBookModifier;
use kernel::KernelError;

use crate::error::ConvertError;
use crate::{env, env_optional};

pub use self::book::*;

mod book;

static DATABASE_USER: &str = "DATABASE_USER";
static DATABASE_PASSWORD: &str = "DATABASE_PASSWORD";
static DATABASE_HOST: &str = "DATABASE_HOST";
static DATABASE_PORT: &str = "DATABASE_PORT";
static DATABASE_NAME: &str = "DATABASE_NAME";
static DATABASE_ACQUIRE_TIMEOUT: &str = "DATABASE_ACQUIRE_TIMEOUT";

const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct PostgresDatabase {
    pool: Pool<Postgres>,
}

impl PostgresDatabase {
    /// Connects with the `DATABASE_*` environment and creates the schema if absent.
    pub async fn new() -> error_stack::Result<Self, KernelError> {
        let options = connect_options()?;
        let timeout = match env_optional(DATABASE_ACQUIRE_TIMEOUT)? {
            None => DEFAULT_ACQUIRE_TIMEOUT,
            Some(secs) => secs
                .parse::<u64>()
                .map(Duration::from_secs)
                .convert_error()
                .attach_printable_lazy(|| format!("`{DATABASE_ACQUIRE_TIMEOUT}` must be seconds"))?,
        };
        let pool = PgPoolOptions::new()
            .acquire_timeout(timeout)
            .connect_with(options)
            .await
            .convert_error()
            .attach_printable("Failed to connect postgres")?;

        let mut con = pool.acquire().await.convert_error()?;
        PgBookInternal::create_table(&mut con).await?;
        tracing::info!("postgres connection pool ready");

        Ok(Self { pool })
    }
}

fn connect_options() -> error_stack::Result<PgConnectOptions, KernelError> {
    let user = env(DATABASE_USER)?;
    let host = env(DATABASE_HOST)?;
    let port = env(DATABASE_PORT)?
        .parse::<u16>()
        .convert_error()
        .attach_printable_lazy(|| format!("`{DATABASE_PORT}` must be a port number"))?;
    let name = env(DATABASE_NAME)?;

    let options = PgConnectOptions::new()
        .username(&user)
        .host(&host)
        .port(port)
        .database(&name);
    Ok(match env_optional(DATABASE_PASSWORD)? {
        Some(password) => options.password(&password),
        None => options,
    })
}

#[async_trait::async_trait]
impl DatabaseConnection for PostgresDatabase {
    type Transaction = PostgresConnection;
    async fn transact(&self) -> error_stack::Result<PostgresConnection, KernelError> {
        let con = self.pool.begin().await.convert_error()?;
        Ok(PostgresConnection(con))
    }
}

impl DependOnBookQuery for PostgresDatabase {
    type BookQuery = PostgresBookRepository;
    fn book_query(&self) -> &Self::BookQuery {
        &PostgresBookRepository
    }
}

impl DependOnBookModifier for PostgresDatabase {
    type BookModifier = PostgresBookRepository;
    fn book_modifier(&self) -> &Self::BookModifier {
        &PostgresBookRepository
    }
}

pub struct PostgresConnection(sqlx::Transaction<'static, Postgres>);

#[async_trait::async_trait]
impl Transaction for PostgresConnection {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        self.0.commit().await.convert_error()
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        self.0.rollback().await.convert_error()
    }
}

impl Deref for PostgresConnection {
    type Target = PgConnection;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PostgresConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> ConvertError for Result<T, Error> {
    type Ok = T;
    fn convert_error(self) -> error_stack::Result<T, KernelError> {
        self.map_err(|error| match error {
            Error::PoolTimedOut => Report::from(error).change_context(KernelError::Timeout),
            _ => Report::from(error).change_context(KernelError::Internal),
        })
    }
}
