use crate::config::StoreConfig;
use crate::errors::{
    GenoSeekError,
    Result,
};
use log::{
    debug,
    info,
};
use r2d2_sqlite::SqliteConnectionManager;
use std::time::Instant;

/// A connection checked out of a [`ConnectionPool`].
///
/// Derefs to [`rusqlite::Connection`] and goes back to the pool when dropped.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// A bounded pool of SQLite connections.
///
/// Built once and passed by reference to every operation. Every connection
/// has the busy timeout set and foreign keys enforced before it is handed out.
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    pool: r2d2::Pool<SqliteConnectionManager>,
    max_connections: usize,
}

impl ConnectionPool {
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let pool_config = config.pool.clone().normalized();
        info!(
            "Initializing database connection pool at {:?} ({}..={} connections)",
            config.database_path, pool_config.min_connections, pool_config.max_connections
        );

        let busy_timeout = pool_config.busy_timeout;
        let manager = SqliteConnectionManager::file(&config.database_path).with_init(move |c| {
            c.busy_timeout(busy_timeout)?;
            c.execute_batch("PRAGMA foreign_keys = ON;")
        });

        let pool = r2d2::Pool::builder()
            .min_idle(Some(pool_config.min_connections as u32))
            .max_size(pool_config.max_connections as u32)
            .connection_timeout(pool_config.acquire_timeout)
            .build(manager)?;

        Ok(Self {
            pool,
            max_connections: pool_config.max_connections,
        })
    }

    /// Checks out a connection, blocking while the pool is exhausted.
    ///
    /// Fails with [`GenoSeekError::PoolTimeout`] once `acquire_timeout` has
    /// elapsed without a connection becoming free.
    pub fn get(&self) -> Result<PooledConnection> {
        let start = Instant::now();
        self.pool.get().map_err(|e| {
            debug!("Connection checkout failed: {}", e);
            GenoSeekError::PoolTimeout {
                waited: start.elapsed(),
                max_connections: self.max_connections,
            }
        })
    }

    pub fn idle_connections(&self) -> usize {
        self.pool.state().idle_connections as usize
    }

    pub fn open_connections(&self) -> usize {
        self.pool.state().connections as usize
    }

    /// Connections currently held by callers.
    pub fn checked_out(&self) -> usize {
        let state = self.pool.state();
        (state.connections - state.idle_connections) as usize
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Shuts the pool down, closing its connections.
    pub fn close(self) {
        let state = self.pool.state();
        info!(
            "Closing connection pool ({} open, {} idle)",
            state.connections, state.idle_connections
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use std::time::Duration;

    fn test_config(dir: &tempfile::TempDir, max_connections: usize) -> StoreConfig {
        StoreConfig::new(dir.path().join("pool.sqlite")).with_pool(PoolConfig {
            min_connections: 1,
            max_connections,
            acquire_timeout: Duration::from_millis(50),
            ..Default::default()
        })
    }

    #[test]
    fn test_connections_return_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&test_config(&dir, 2)).unwrap();
        assert_eq!(pool.checked_out(), 0);
        {
            let first = pool.get().unwrap();
            let second = pool.get().unwrap();
            assert_eq!(pool.checked_out(), 2);
            assert!(pool.open_connections() <= pool.max_connections());
            let one: i64 = first.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
            assert_eq!(one, 1);
            drop(second);
            assert_eq!(pool.checked_out(), 1);
        }
        assert_eq!(pool.checked_out(), 0);
    }

    #[test]
    fn test_connection_returns_on_error_path() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&test_config(&dir, 1)).unwrap();
        let failing = || -> Result<()> {
            let conn = pool.get()?;
            conn.execute("INSERT INTO missing_table VALUES (1)", [])?;
            Ok(())
        };
        assert!(matches!(failing(), Err(GenoSeekError::Sqlite(_))));
        assert_eq!(pool.checked_out(), 0);
        assert_eq!(pool.idle_connections(), 1);
        assert!(pool.get().is_ok());
    }

    #[test]
    fn test_exhausted_pool_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&test_config(&dir, 1)).unwrap();
        let _held = pool.get().unwrap();
        match pool.get() {
            Err(GenoSeekError::PoolTimeout {
                waited,
                max_connections,
            }) => {
                assert_eq!(max_connections, 1);
                assert!(waited >= Duration::from_millis(50), "Gave up after {:?}", waited);
            }
            other => panic!("Expected a pool timeout, got: {:?}", other.map(|_| ())),
        };
    }

    #[test]
    fn test_waiting_caller_gets_released_connection() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir, 1);
        config.pool.acquire_timeout = Duration::from_secs(5);
        let pool = ConnectionPool::open(&config).unwrap();

        let held = pool.get().unwrap();
        std::thread::scope(|s| {
            let waiter = s.spawn(|| pool.get().map(|_| ()));
            std::thread::sleep(Duration::from_millis(20));
            drop(held);
            assert!(waiter.join().unwrap().is_ok());
        });
        assert_eq!(pool.open_connections(), 1);
        assert_eq!(pool.checked_out(), 0);
    }

    #[test]
    fn test_init_runs_on_every_connection() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&test_config(&dir, 2)).unwrap();
        let first = pool.get().unwrap();
        let second = pool.get().unwrap();
        for conn in [&first, &second] {
            let enabled: i64 = conn
                .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                .unwrap();
            assert_eq!(enabled, 1);
            let busy_ms: i64 = conn
                .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
                .unwrap();
            assert_eq!(busy_ms, 5000);
        }
    }
}
