pub mod migrations;
pub mod queries;

use std::time::Duration;

use anyhow::Context;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use crate::errors::{AppError, AppResult};

pub const MEMORY: &str = ":memory:";

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let mut conn = Connection::open(path).context("failed to open database")?;
    configure(&mut conn, Duration::from_millis(5000)).context("failed to configure database")?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

fn configure(conn: &mut Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    register_functions(conn)
}

/// `icontains(haystack, needle)`: Unicode case-insensitive substring match.
/// SQLite's own `lower()` folds ASCII only.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "icontains",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let haystack: String = ctx.get(0)?;
            let needle: String = ctx.get(1)?;
            Ok(haystack.to_lowercase().contains(&needle.to_lowercase()))
        },
    )
}

/// Pool of SQLite connections. Each connection is an independent store
/// client, so cross-request ordering comes from SQLite transactions. An
/// in-memory database lives inside its one connection, so the pool is
/// capped at one there and that connection is never recycled.
#[derive(Clone)]
pub struct Pool {
    inner: r2d2::Pool<SqliteConnectionManager>,
}

impl Pool {
    pub fn open(path: &str, max_size: usize, busy_timeout: Duration) -> anyhow::Result<Self> {
        let in_memory = path == MEMORY;
        let manager = if in_memory {
            SqliteConnectionManager::memory()
        } else {
            SqliteConnectionManager::file(path)
        }
        .with_init(move |conn| configure(conn, busy_timeout));

        let max_size = if in_memory { 1 } else { max_size.max(1) as u32 };
        let mut builder = r2d2::Pool::builder().max_size(max_size);
        if in_memory {
            builder = builder.max_lifetime(None).idle_timeout(None);
        }
        let inner = builder
            .build(manager)
            .context("failed to open database pool")?;

        let conn = inner.get().context("failed to check out connection")?;
        migrations::run_migrations(&conn)?;
        drop(conn);

        tracing::info!(path, max_size, "database pool ready");
        Ok(Self { inner })
    }

    pub fn get(&self) -> anyhow::Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.inner
            .get()
            .context("timed out waiting for a database connection")
    }

    /// Runs `f` on a pooled connection on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Connection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("database task failed")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_pool_is_single_connection() {
        let pool = Pool::open(MEMORY, 8, Duration::from_millis(100)).unwrap();
        assert_eq!(pool.inner.max_size(), 1);

        {
            let conn = pool.get().unwrap();
            conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1);")
                .unwrap();
        }

        // same underlying database after the connection is returned
        let conn = pool.get().unwrap();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_migrations_applied() {
        let conn = init_db(MEMORY).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('cars', 'bookings', 'profiles')",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn test_icontains_folds_unicode() {
        let conn = init_db(MEMORY).unwrap();
        let matches = |needle: &str| -> bool {
            conn.query_row("SELECT icontains('Zürich Altstadt', ?1)", [needle], |r| r.get(0))
                .unwrap()
        };

        assert!(matches("zürich"));
        assert!(matches("ZÜRICH"));
        assert!(matches("ALTSTADT"));
        assert!(!matches("zurich"));
    }
}
