use std::time::Duration;

#[derive(Debug)]
pub enum GenoSeekError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Pool(r2d2::Error),
    PoolTimeout {
        waited: Duration,
        max_connections: usize,
    },
    GenomeNotFound(i64),
    PatternNotFound(String),
    /// A row of an all-or-nothing batch was refused, the whole batch was rolled back.
    BatchRejected {
        row: usize,
        source: rusqlite::Error,
    },
}

impl std::fmt::Display for GenoSeekError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PoolTimeout {
                waited,
                max_connections,
            } => write!(
                f,
                "No database connection available after {:?} ({} in use)",
                waited, max_connections
            ),
            Self::Pool(e) => write!(f, "Could not set up the connection pool: {}", e),
            Self::GenomeNotFound(id) => write!(f, "Genome ID {} not found", id),
            Self::PatternNotFound(name) => write!(f, "Pattern '{}' not found", name),
            Self::BatchRejected { row, source } => write!(
                f,
                "Batch rolled back, row {} was rejected: {}",
                row, source
            ),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl std::error::Error for GenoSeekError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(x) => Some(x),
            Self::Io(x) => Some(x),
            Self::Csv(x) => Some(x),
            Self::Json(x) => Some(x),
            Self::Pool(x) => Some(x),
            Self::BatchRejected { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenoSeekError>;

impl From<std::io::Error> for GenoSeekError {
    fn from(x: std::io::Error) -> Self {
        Self::Io(x)
    }
}

impl From<rusqlite::Error> for GenoSeekError {
    fn from(x: rusqlite::Error) -> Self {
        Self::Sqlite(x)
    }
}

impl From<csv::Error> for GenoSeekError {
    fn from(x: csv::Error) -> Self {
        Self::Csv(x)
    }
}

impl From<serde_json::Error> for GenoSeekError {
    fn from(x: serde_json::Error) -> Self {
        Self::Json(x)
    }
}

impl From<r2d2::Error> for GenoSeekError {
    fn from(x: r2d2::Error) -> Self {
        Self::Pool(x)
    }
}
