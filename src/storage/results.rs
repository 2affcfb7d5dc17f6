use super::batch::BatchRow;
use crate::models::{
    Mutation,
    PatternMatch,
};
use rusqlite::{
    Connection,
    Statement,
};

/// A detected mutation, attributed to the comparison genome.
#[derive(Debug, Clone, Copy)]
pub struct MutationRow<'a> {
    pub genome_id: i64,
    pub mutation: &'a Mutation,
}

impl BatchRow for MutationRow<'_> {
    const INSERT_SQL: &'static str = "INSERT INTO mutations
        (genome_id, mutation_type, position, original_sequence, mutated_sequence)
        VALUES (?1, ?2, ?3, ?4, ?5)";

    fn insert(&self, statement: &mut Statement<'_>) -> rusqlite::Result<usize> {
        statement.execute((
            self.genome_id,
            self.mutation.kind.as_str(),
            self.mutation.position as i64,
            &self.mutation.original,
            &self.mutation.mutated,
        ))
    }
}

/// A pattern match. `pattern_id` is `None` for ad hoc patterns.
#[derive(Debug, Clone, Copy)]
pub struct MatchRow<'a> {
    pub genome_id: i64,
    pub pattern_id: Option<i64>,
    pub hit: &'a PatternMatch,
}

impl BatchRow for MatchRow<'_> {
    const INSERT_SQL: &'static str = "INSERT INTO search_results
        (genome_id, pattern_id, match_start, match_end, matched_sequence)
        VALUES (?1, ?2, ?3, ?4, ?5)";

    fn insert(&self, statement: &mut Statement<'_>) -> rusqlite::Result<usize> {
        statement.execute((
            self.genome_id,
            self.pattern_id,
            self.hit.start as i64,
            self.hit.end as i64,
            &self.hit.matched_sequence,
        ))
    }
}

pub fn count_mutations(connection: &Connection, genome_id: i64) -> rusqlite::Result<usize> {
    connection.query_row(
        "SELECT COUNT(*) FROM mutations WHERE genome_id = ?1",
        [genome_id],
        |row| row.get::<_, i64>(0).map(|x| x as usize),
    )
}

pub fn count_matches(connection: &Connection, genome_id: i64) -> rusqlite::Result<usize> {
    connection.query_row(
        "SELECT COUNT(*) FROM search_results WHERE genome_id = ?1",
        [genome_id],
        |row| row.get::<_, i64>(0).map(|x| x as usize),
    )
}
