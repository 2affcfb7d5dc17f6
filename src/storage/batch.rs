use crate::errors::{
    GenoSeekError,
    Result,
};
use indicatif::ProgressBar;
use log::{
    info,
    warn,
};
use rusqlite::{
    Connection,
    Statement,
};
use serde::Serialize;
use std::time::Instant;

/// A record that can be written by a [`BatchWriter`].
pub trait BatchRow {
    /// Parameterized INSERT used for every row of a batch.
    const INSERT_SQL: &'static str;

    fn insert(&self, statement: &mut Statement<'_>) -> rusqlite::Result<usize>;
}

/// What happens to a batch when one of its rows is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Roll back the whole batch, nothing is committed.
    #[default]
    AbortOnError,
    /// Roll back only the rejected row and commit the rest.
    SkipOnError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub inserted: usize,
    pub skipped: Vec<RowFailure>,
}

/// Writes a list of rows in a single transaction with one prepared statement.
#[derive(Clone, Default)]
pub struct BatchWriter {
    mode: FailureMode,
    progress: Option<ProgressBar>,
}

impl std::fmt::Debug for BatchWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchWriter")
            .field("mode", &self.mode)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl BatchWriter {
    pub fn new(mode: FailureMode) -> Self {
        Self {
            mode,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn mode(&self) -> FailureMode {
        self.mode
    }

    pub fn write<R: BatchRow>(&self, connection: &mut Connection, rows: &[R]) -> Result<BatchReport> {
        let start = Instant::now();
        if let Some(progress) = &self.progress {
            progress.set_length(rows.len() as u64);
        }

        let report = match self.mode {
            FailureMode::AbortOnError => self.write_all_or_nothing(connection, rows)?,
            FailureMode::SkipOnError => self.write_skipping_failures(connection, rows)?,
        };

        if let Some(progress) = &self.progress {
            progress.finish();
        }
        info!(
            "Batch insert of {} row(s) ({} skipped) took {:?}",
            report.inserted,
            report.skipped.len(),
            start.elapsed()
        );
        Ok(report)
    }

    fn tick(&self) {
        if let Some(progress) = &self.progress {
            progress.inc(1);
        }
    }

    fn write_all_or_nothing<R: BatchRow>(
        &self,
        connection: &mut Connection,
        rows: &[R],
    ) -> Result<BatchReport> {
        let transaction = connection.transaction()?;
        {
            let mut statement = transaction.prepare_cached(R::INSERT_SQL)?;
            for (row, record) in rows.iter().enumerate() {
                // Returning drops the transaction, which rolls it back.
                if let Err(source) = record.insert(&mut statement) {
                    warn!("Transaction failed on row {}, rolling back: {}", row, source);
                    return Err(GenoSeekError::BatchRejected { row, source });
                }
                self.tick();
            }
        }
        transaction.commit()?;
        Ok(BatchReport {
            inserted: rows.len(),
            skipped: Vec::new(),
        })
    }

    fn write_skipping_failures<R: BatchRow>(
        &self,
        connection: &mut Connection,
        rows: &[R],
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let mut transaction = connection.transaction()?;
        for (row, record) in rows.iter().enumerate() {
            let savepoint = transaction.savepoint()?;
            let inserted = savepoint
                .prepare_cached(R::INSERT_SQL)
                .and_then(|mut statement| record.insert(&mut statement));
            match inserted {
                Ok(_) => {
                    savepoint.commit()?;
                    report.inserted += 1;
                }
                Err(e) => {
                    drop(savepoint);
                    warn!("Error on row {}. Skipping. Details: {}", row, e);
                    report.skipped.push(RowFailure {
                        row,
                        message: e.to_string(),
                    });
                }
            }
            self.tick();
        }
        transaction.commit()?;
        Ok(report)
    }
}
