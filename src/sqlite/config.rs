use crate::database::Database;
use crate::error::SimpleDbError;

/// Path used to open a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Options for opening a `SQLite` database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseOptions {
    pub db_path: String,
    pub wal: bool,
}

impl DatabaseOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            wal: false,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    #[must_use]
    pub fn with_wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }

    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.db_path == IN_MEMORY
    }

    pub(crate) fn validate(&self) -> Result<(), SimpleDbError> {
        if self.db_path.trim().is_empty() {
            return Err(SimpleDbError::ConfigError(
                "database path must not be empty".into(),
            ));
        }
        if self.wal && self.is_in_memory() {
            return Err(SimpleDbError::ConfigError(
                "WAL journaling needs an on-disk database".into(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct DatabaseOptionsBuilder {
    opts: DatabaseOptions,
}

impl DatabaseOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: DatabaseOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn finish(self) -> DatabaseOptions {
        self.opts
    }

    /// Open a `Database` with these options.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if the options are invalid or the database cannot be opened.
    pub async fn build(self) -> Result<Database, SimpleDbError> {
        Database::open(self.finish()).await
    }
}
