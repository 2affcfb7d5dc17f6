//! Operations offered to the CLI and other front ends.
//!
//! Every operation borrows a [`ConnectionPool`], holds a connection only
//! while it talks to the database and releases it before returning. The
//! matching and diffing passes run on data that has already been read.

use crate::errors::Result;
use crate::models::{
    Mutation,
    PatternMatch,
    StoredPattern,
};
use crate::search::{
    PatternDiagnostic,
    SearchOutcome,
};
use crate::storage::catalog;
use crate::storage::genomes::{
    self,
    GenomeRow,
    GenomeSummary,
};
use crate::storage::results::{
    MatchRow,
    MutationRow,
};
use crate::storage::schema::create_schema;
use crate::storage::{
    BatchReport,
    BatchWriter,
    ConnectionPool,
    FailureMode,
};
use crate::variation::{
    detect_mutations,
    gc_content,
    VariationReport,
};
use log::info;
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub genome_id: i64,
    pub pattern: String,
    /// Set when the pattern came from the catalog.
    pub pattern_id: Option<i64>,
    pub matches: Vec<PatternMatch>,
    pub diagnostic: Option<PatternDiagnostic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub reference_id: i64,
    pub comparison_id: i64,
    pub variation_rate: f64,
    #[serde(flatten)]
    pub variations: VariationReport,
}

impl ComparisonReport {
    pub fn mutations(&self) -> &[Mutation] {
        &self.variations.mutations
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogHits {
    pub pattern: StoredPattern,
    pub matches: usize,
    pub diagnostic: Option<PatternDiagnostic>,
}

/// Creates the schema and seeds the default patterns.
pub fn initialize(pool: &ConnectionPool) -> Result<usize> {
    let mut conn = pool.get()?;
    create_schema(&conn)?;
    catalog::seed_default_patterns(&mut conn)
}

fn run_search(genome_id: i64, sequence: &str, pattern: &str, pattern_id: Option<i64>) -> SearchReport {
    let start = Instant::now();
    let outcome = SearchOutcome::compile(pattern);
    let matches: Vec<PatternMatch> = outcome.matches(sequence).collect();
    info!(
        "Searching for '{}' in genome {} found {} match(es), took {:?}",
        pattern,
        genome_id,
        matches.len(),
        start.elapsed()
    );
    SearchReport {
        genome_id,
        pattern: pattern.to_string(),
        pattern_id,
        matches,
        diagnostic: outcome.diagnostic().cloned(),
    }
}

/// Searches a stored genome for an ad hoc regex pattern.
///
/// A malformed pattern is not an error: the report has no matches and
/// carries the diagnostic.
pub fn search(pool: &ConnectionPool, genome_id: i64, pattern: &str) -> Result<SearchReport> {
    let genome = {
        let conn = pool.get()?;
        genomes::fetch_genome(&conn, genome_id)?
    };
    Ok(run_search(genome_id, &genome.sequence, pattern, None))
}

/// Searches a stored genome for a catalog pattern, looked up by name.
pub fn search_saved(pool: &ConnectionPool, genome_id: i64, pattern_name: &str) -> Result<SearchReport> {
    let (genome, pattern) = {
        let conn = pool.get()?;
        let genome = genomes::fetch_genome(&conn, genome_id)?;
        let pattern = catalog::pattern_by_name(&conn, pattern_name)?;
        (genome, pattern)
    };
    Ok(run_search(
        genome_id,
        &genome.sequence,
        &pattern.regex_pattern,
        Some(pattern.pattern_id),
    ))
}

/// Compares two stored genomes position by position.
pub fn compare(pool: &ConnectionPool, reference_id: i64, comparison_id: i64) -> Result<ComparisonReport> {
    let (reference, comparison) = {
        let conn = pool.get()?;
        let reference = genomes::fetch_genome(&conn, reference_id)?;
        let comparison = genomes::fetch_genome(&conn, comparison_id)?;
        (reference, comparison)
    };

    let start = Instant::now();
    let variations = detect_mutations(&reference.sequence, &comparison.sequence);
    info!(
        "Comparing genome {} with {} found {} variation(s), took {:?}",
        reference_id,
        comparison_id,
        variations.mutations.len(),
        start.elapsed()
    );
    Ok(ComparisonReport {
        reference_id,
        comparison_id,
        variation_rate: variations.variation_rate(),
        variations,
    })
}

/// Stores mutations for `genome_id` in one all-or-nothing batch.
///
/// On failure nothing is written and `mutations` can be logged again later.
pub fn log_mutations(pool: &ConnectionPool, genome_id: i64, mutations: &[Mutation]) -> Result<usize> {
    let rows: Vec<MutationRow> = mutations
        .iter()
        .map(|mutation| MutationRow {
            genome_id,
            mutation,
        })
        .collect();

    let mut conn = pool.get()?;
    genomes::ensure_genome(&conn, genome_id)?;
    info!(
        "Logging {} variation(s) for genome {} using a batch insert",
        rows.len(),
        genome_id
    );
    let report = BatchWriter::new(FailureMode::AbortOnError).write(&mut conn, &rows)?;
    Ok(report.inserted)
}

/// Stores the matches of one search in one all-or-nothing batch.
pub fn log_matches(
    pool: &ConnectionPool,
    genome_id: i64,
    pattern_id: Option<i64>,
    matches: &[PatternMatch],
) -> Result<usize> {
    let rows: Vec<MatchRow> = matches
        .iter()
        .map(|hit| MatchRow {
            genome_id,
            pattern_id,
            hit,
        })
        .collect();

    let mut conn = pool.get()?;
    genomes::ensure_genome(&conn, genome_id)?;
    if let Some(pattern_id) = pattern_id {
        catalog::pattern_by_id(&conn, pattern_id)?;
    }
    let report = BatchWriter::new(FailureMode::AbortOnError).write(&mut conn, &rows)?;
    Ok(report.inserted)
}

/// Searches a genome for every catalog pattern and logs all matches.
///
/// All matches of all patterns go into a single batch, so either the whole
/// scan is recorded or none of it is.
pub fn scan_catalog(pool: &ConnectionPool, genome_id: i64) -> Result<Vec<CatalogHits>> {
    let (genome, patterns) = {
        let conn = pool.get()?;
        let genome = genomes::fetch_genome(&conn, genome_id)?;
        let patterns = catalog::list_patterns(&conn)?;
        (genome, patterns)
    };

    let reports: Vec<SearchReport> = patterns
        .iter()
        .map(|pattern| {
            run_search(
                genome_id,
                &genome.sequence,
                &pattern.regex_pattern,
                Some(pattern.pattern_id),
            )
        })
        .collect();

    {
        let rows: Vec<MatchRow> = reports
            .iter()
            .flat_map(|report| {
                report.matches.iter().map(move |hit| MatchRow {
                    genome_id,
                    pattern_id: report.pattern_id,
                    hit,
                })
            })
            .collect();
        let mut conn = pool.get()?;
        BatchWriter::new(FailureMode::AbortOnError).write(&mut conn, &rows)?;
    }

    Ok(patterns
        .into_iter()
        .zip(reports)
        .map(|(pattern, report)| CatalogHits {
            pattern,
            matches: report.matches.len(),
            diagnostic: report.diagnostic,
        })
        .collect())
}

pub fn genome_gc_content(pool: &ConnectionPool, genome_id: i64) -> Result<f64> {
    let genome = {
        let conn = pool.get()?;
        genomes::fetch_genome(&conn, genome_id)?
    };
    Ok(gc_content(&genome.sequence))
}

pub fn list_genomes(pool: &ConnectionPool) -> Result<Vec<GenomeSummary>> {
    let conn = pool.get()?;
    genomes::list_genomes(&conn)
}

pub fn list_patterns(pool: &ConnectionPool) -> Result<Vec<StoredPattern>> {
    let conn = pool.get()?;
    catalog::list_patterns(&conn)
}

/// Ingests genomes through `writer`, usually in skip-on-error mode.
pub fn load_genomes(pool: &ConnectionPool, rows: &[GenomeRow], writer: &BatchWriter) -> Result<BatchReport> {
    let mut conn = pool.get()?;
    info!(
        "Inserting {} genome(s), failure mode {:?}",
        rows.len(),
        writer.mode()
    );
    writer.write(&mut conn, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::errors::GenoSeekError;
    use crate::models::MutationKind;
    use crate::storage::results::{
        count_matches,
        count_mutations,
    };

    struct Fixture {
        pool: ConnectionPool,
        _dir: tempfile::TempDir,
    }

    fn fixture(genomes: &[(i64, &str)]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&StoreConfig::new(dir.path().join("genomes.sqlite"))).unwrap();
        initialize(&pool).unwrap();
        let rows: Vec<GenomeRow> = genomes
            .iter()
            .map(|(genome_id, sequence)| GenomeRow {
                genome_id: *genome_id,
                description: format!("genome {}", genome_id),
                sequence: sequence.to_string(),
            })
            .collect();
        let report = load_genomes(&pool, &rows, &BatchWriter::new(FailureMode::AbortOnError)).unwrap();
        assert_eq!(report.inserted, rows.len());
        Fixture { pool, _dir: dir }
    }

    #[test]
    fn test_search_stored_genome() {
        let fx = fixture(&[(1, "GAATTCGAATTC")]);
        let report = search(&fx.pool, 1, "GAATTC").unwrap();
        let spans: Vec<(usize, usize)> = report.matches.iter().map(|m| (m.start, m.end)).collect();
        assert_eq!(spans, vec![(0, 6), (6, 12)]);
        assert!(report.diagnostic.is_none());
        assert_eq!(fx.pool.checked_out(), 0);
    }

    #[test]
    fn test_search_with_bad_pattern_is_empty() {
        let fx = fixture(&[(1, "GAATTC")]);
        let report = search(&fx.pool, 1, "GAA[TTC").unwrap();
        assert!(report.matches.is_empty());
        assert!(report.diagnostic.is_some());
    }

    #[test]
    fn test_unknown_genome() {
        let fx = fixture(&[(1, "ACGT")]);
        assert!(matches!(
            search(&fx.pool, 42, "A"),
            Err(GenoSeekError::GenomeNotFound(42))
        ));
        assert!(matches!(
            compare(&fx.pool, 1, 42),
            Err(GenoSeekError::GenomeNotFound(42))
        ));
        let mutation = Mutation::substitution(0, 'A', 'C');
        assert!(matches!(
            log_mutations(&fx.pool, 42, &[mutation]),
            Err(GenoSeekError::GenomeNotFound(42))
        ));
        assert_eq!(fx.pool.checked_out(), 0);
    }

    #[test]
    fn test_search_saved_pattern() {
        let fx = fixture(&[(1, "CCGAATTCAA")]);
        let report = search_saved(&fx.pool, 1, "EcoRI Restriction Site").unwrap();
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].start, 2);
        assert!(report.pattern_id.is_some());

        assert!(matches!(
            search_saved(&fx.pool, 1, "NotI"),
            Err(GenoSeekError::PatternNotFound(_))
        ));
    }

    #[test]
    fn test_compare_and_log_all() {
        let fx = fixture(&[(1, "ACGTACGT"), (2, "AGGTACGAAA")]);
        let report = compare(&fx.pool, 1, 2).unwrap();
        let kinds: Vec<MutationKind> = report.mutations().iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MutationKind::Substitution,
                MutationKind::Substitution,
                MutationKind::Insertion
            ]
        );
        assert_eq!(report.variation_rate, 3.0 / 8.0 * 100.0);

        let logged = log_mutations(&fx.pool, 2, report.mutations()).unwrap();
        assert_eq!(logged, 3);
        let conn = fx.pool.get().unwrap();
        assert_eq!(count_mutations(&conn, 2).unwrap(), 3);
    }

    #[test]
    fn test_compare_identical_genomes() {
        let fx = fixture(&[(1, "ACGTACGT"), (2, "ACGTACGT")]);
        let report = compare(&fx.pool, 1, 2).unwrap();
        assert!(report.mutations().is_empty());
        assert_eq!(report.variation_rate, 0.0);
    }

    #[test]
    fn test_failed_row_logs_nothing() {
        let fx = fixture(&[(1, "ACGT"), (2, "TGCA")]);
        let mut mutations = compare(&fx.pool, 1, 2).unwrap().mutations().to_vec();
        assert_eq!(mutations.len(), 4);

        // Out of range for the position column.
        mutations[2].position = usize::MAX;
        match log_mutations(&fx.pool, 2, &mutations) {
            Err(GenoSeekError::BatchRejected { row, .. }) => assert_eq!(row, 2),
            other => panic!("Expected the batch to be rejected, got: {:?}", other),
        }
        let conn = fx.pool.get().unwrap();
        assert_eq!(count_mutations(&conn, 2).unwrap(), 0);
        drop(conn);

        // The computed results are still there for a retry.
        mutations[2].position = 2;
        assert_eq!(log_mutations(&fx.pool, 2, &mutations).unwrap(), 4);
    }

    #[test]
    fn test_log_matches() {
        let fx = fixture(&[(1, "GAATTCGAATTC")]);
        let report = search(&fx.pool, 1, "GAATTC").unwrap();
        assert_eq!(log_matches(&fx.pool, 1, None, &report.matches).unwrap(), 2);
        assert!(matches!(
            log_matches(&fx.pool, 1, Some(999), &report.matches),
            Err(GenoSeekError::PatternNotFound(_))
        ));
        let conn = fx.pool.get().unwrap();
        assert_eq!(count_matches(&conn, 1).unwrap(), 2);
    }

    #[test]
    fn test_scan_catalog() {
        let fx = fixture(&[(3, "TATAAATGAATTCAGGAGGTTGAATTC")]);
        let hits = scan_catalog(&fx.pool, 3).unwrap();
        let counts: Vec<(&str, usize)> = hits
            .iter()
            .map(|h| (h.pattern.pattern_name.as_str(), h.matches))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("Bacterial TATA Box", 1),
                ("EcoRI Restriction Site", 2),
                ("Shine-Dalgarno Sequence", 1)
            ]
        );
        let conn = fx.pool.get().unwrap();
        assert_eq!(count_matches(&conn, 3).unwrap(), 4);
    }

    #[test]
    fn test_gc_content_of_stored_genome() {
        let fx = fixture(&[(1, "GGCCAATT")]);
        assert_eq!(genome_gc_content(&fx.pool, 1).unwrap(), 50.0);
    }
}
