use std::fmt;
use std::sync::Arc;

use crate::error::SimpleDbError;
use crate::query::Query;
use crate::results::{Row, Rows};
use crate::sqlite::config::{DatabaseOptions, DatabaseOptionsBuilder};
use crate::sqlite::connection::{SharedSqliteConnection, open_connection, run_blocking};
use crate::sqlite::params::{NamedParams, Params};
use crate::sqlite::query::build_rows;
use crate::table::Table;
use crate::types::FieldValue;

/// Handle to an open database.
///
/// Clones share the same underlying connection. Statements run one at a time on a
/// blocking thread; pass the handle to whatever needs to query.
/// ```rust,no_run
/// use simple_db::prelude::*;
///
/// # async fn demo() -> Result<(), SimpleDbError> {
/// let db = Database::builder("app.db").wal(true).build().await?;
/// let users = db.all("SELECT * FROM users WHERE active = ?", &[FieldValue::Bool(true)]).await?;
/// # let _ = users;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Database {
    conn: SharedSqliteConnection,
    options: Arc<DatabaseOptions>,
}

impl Database {
    #[must_use]
    pub fn builder(db_path: impl Into<String>) -> DatabaseOptionsBuilder {
        DatabaseOptionsBuilder::new(db_path)
    }

    /// Open (or create) the database described by `options`.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::ConfigError` for invalid options and
    /// `SimpleDbError::ConnectionError` if the file cannot be opened.
    pub async fn open(options: DatabaseOptions) -> Result<Self, SimpleDbError> {
        options.validate()?;
        let conn = open_connection(&options).await?;
        tracing::info!(path = %options.db_path, wal = options.wal, "simple_db.open");
        Ok(Self {
            conn,
            options: Arc::new(options),
        })
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::ConnectionError` if `SQLite` cannot allocate the database.
    pub async fn open_in_memory() -> Result<Self, SimpleDbError> {
        Self::open(DatabaseOptions::in_memory()).await
    }

    #[must_use]
    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    /// Get a handle on a table of this database.
    #[must_use]
    pub fn table(&self, name: &str) -> Table {
        Table::new(self.clone(), name)
    }

    /// Names of the user tables in this database.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if the catalog query fails.
    pub async fn tables(&self) -> Result<Vec<String>, SimpleDbError> {
        let sql = Query::select_fields("sqlite_master", ["name"])
            .where_eq(["type"])
            .order("name", "asc")
            .compile();
        let rows = self.all(&sql, &[FieldValue::from("table")]).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("name").and_then(FieldValue::as_text))
            .filter(|name| !name.starts_with("sqlite_"))
            .map(str::to_string)
            .collect())
    }

    /// Execute a batch of statements with no parameters.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::SqliteError` if any statement fails.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SimpleDbError> {
        tracing::debug!(sql = %sql, params = 0, "simple_db.query");
        let sql_owned = sql.to_owned();
        run_blocking(self.conn_handle(), move |conn| {
            conn.execute_batch(&sql_owned)
                .map_err(SimpleDbError::SqliteError)
        })
        .await
    }

    /// Execute a statement with positional parameters and return the rows affected.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::SqliteError` if preparation or execution fails.
    pub async fn query(&self, sql: &str, params: &[FieldValue]) -> Result<usize, SimpleDbError> {
        tracing::debug!(sql = %sql, params = params.len(), "simple_db.query");
        let sql_owned = sql.to_owned();
        let params = Params::convert(params);
        run_blocking(self.conn_handle(), move |conn| {
            let mut stmt = conn.prepare(&sql_owned)?;
            Ok(stmt.execute(&params.as_refs()[..])?)
        })
        .await
    }

    /// Execute a statement with `:name` parameters and return the rows affected.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::SqliteError` if preparation or execution fails.
    pub async fn query_named<S: AsRef<str>>(
        &self,
        sql: &str,
        params: &[(S, FieldValue)],
    ) -> Result<usize, SimpleDbError> {
        tracing::debug!(sql = %sql, params = params.len(), "simple_db.query");
        let sql_owned = sql.to_owned();
        let params = NamedParams::convert(params);
        run_blocking(self.conn_handle(), move |conn| {
            let mut stmt = conn.prepare(&sql_owned)?;
            Ok(stmt.execute(&params.as_refs()[..])?)
        })
        .await
    }

    /// Run a `:name` parameterized statement and return every row it yields, such as
    /// the output of a `RETURNING` clause.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::SqliteError` if preparation, execution or extraction fails.
    pub async fn all_named<S: AsRef<str>>(
        &self,
        sql: &str,
        params: &[(S, FieldValue)],
    ) -> Result<Rows, SimpleDbError> {
        tracing::debug!(sql = %sql, params = params.len(), "simple_db.query");
        let sql_owned = sql.to_owned();
        let params = NamedParams::convert(params);
        run_blocking(self.conn_handle(), move |conn| {
            let mut stmt = conn.prepare(&sql_owned)?;
            build_rows(&mut stmt, &params.as_refs()[..])
        })
        .await
    }

    /// Run a query and return every row.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError::SqliteError` if preparation, execution or extraction fails.
    pub async fn all(&self, sql: &str, params: &[FieldValue]) -> Result<Rows, SimpleDbError> {
        tracing::debug!(sql = %sql, params = params.len(), "simple_db.query");
        let sql_owned = sql.to_owned();
        let params = Params::convert(params);
        run_blocking(self.conn_handle(), move |conn| {
            let mut stmt = conn.prepare(&sql_owned)?;
            build_rows(&mut stmt, &params.as_refs()[..])
        })
        .await
    }

    /// Run a query and return its first row, if any.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if the query fails.
    pub async fn one(&self, sql: &str, params: &[FieldValue]) -> Result<Option<Row>, SimpleDbError> {
        Ok(self.all(sql, params).await?.into_iter().next())
    }

    /// Run a query and return the first column of its first row, if any.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if the query fails.
    pub async fn prop(
        &self,
        sql: &str,
        params: &[FieldValue],
    ) -> Result<Option<FieldValue>, SimpleDbError> {
        Ok(self
            .one(sql, params)
            .await?
            .and_then(|row| row.get_by_index(0).cloned()))
    }

    /// Rowid of the most recent successful insert on this connection.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if the blocking task fails.
    pub async fn last_insert_id(&self) -> Result<i64, SimpleDbError> {
        run_blocking(self.conn_handle(), |conn| Ok(conn.last_insert_rowid())).await
    }

    fn conn_handle(&self) -> SharedSqliteConnection {
        Arc::clone(&self.conn)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("db_path", &self.options.db_path)
            .field("wal", &self.options.wal)
            .finish()
    }
}
