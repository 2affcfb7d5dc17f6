//! Pattern search and positional variation detection over stored genomic
//! sequences, with batched, transactional logging of the results.

pub mod analysis;
pub mod config;
pub mod errors;
pub mod models;
pub mod search;
pub mod storage;
pub mod variation;
