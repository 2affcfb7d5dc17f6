use std::path::PathBuf;
use std::time::Duration;

/// Sizing and waiting behavior of the connection pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Connections opened eagerly when the pool is created.
    pub min_connections: usize,
    pub max_connections: usize,
    /// How long `get` waits for a free connection before giving up.
    pub acquire_timeout: Duration,
    /// SQLite busy timeout set on every connection.
    pub busy_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl PoolConfig {
    /// Clamps the bounds so that `1 <= min_connections <= max_connections`.
    pub fn normalized(mut self) -> Self {
        self.max_connections = self.max_connections.max(1);
        self.min_connections = self.min_connections.clamp(1, self.max_connections);
        self
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_path: PathBuf,
    pub pool: PoolConfig,
}

impl StoreConfig {
    pub fn new<P: Into<PathBuf>>(database_path: P) -> Self {
        Self {
            database_path: database_path.into(),
            pool: PoolConfig::default(),
        }
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }
}
