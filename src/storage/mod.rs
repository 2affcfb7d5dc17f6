pub mod batch;
pub mod catalog;
pub mod genomes;
pub mod pool;
pub mod results;
pub mod schema;

pub use batch::{
    BatchReport,
    BatchRow,
    BatchWriter,
    FailureMode,
    RowFailure,
};
pub use pool::{
    ConnectionPool,
    PooledConnection,
};
