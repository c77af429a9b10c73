use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::SimpleDbError;

use super::config::DatabaseOptions;

/// The one connection a `Database` owns, shared by its clones.
pub(crate) type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

pub(crate) async fn open_connection(
    options: &DatabaseOptions,
) -> Result<SharedSqliteConnection, SimpleDbError> {
    let path = options.db_path.clone();
    let in_memory = options.is_in_memory();
    let wal = options.wal;

    let conn = tokio::task::spawn_blocking(move || {
        let conn = if in_memory {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| {
            SimpleDbError::ConnectionError(format!("failed to open SQLite database {path}: {e}"))
        })?;
        if wal {
            conn.execute_batch("PRAGMA journal_mode = WAL;")
                .map_err(SimpleDbError::SqliteError)?;
        }
        Ok::<_, SimpleDbError>(conn)
    })
    .await
    .map_err(|e| SimpleDbError::ConnectionError(format!("sqlite open join error: {e}")))??;

    Ok(Arc::new(Mutex::new(conn)))
}

pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SimpleDbError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SimpleDbError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| SimpleDbError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}
