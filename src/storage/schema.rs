use rusqlite::Connection;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS genomes (
    genome_id INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    sequence TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS patterns (
    pattern_id INTEGER PRIMARY KEY,
    pattern_name TEXT NOT NULL UNIQUE,
    regex_pattern TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS mutations (
    id INTEGER PRIMARY KEY,
    genome_id INTEGER NOT NULL REFERENCES genomes(genome_id),
    mutation_type TEXT NOT NULL
        CHECK (mutation_type IN ('substitution', 'insertion', 'deletion')),
    position INTEGER NOT NULL CHECK (position >= 0),
    original_sequence TEXT NOT NULL,
    mutated_sequence TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS search_results (
    id INTEGER PRIMARY KEY,
    genome_id INTEGER NOT NULL REFERENCES genomes(genome_id),
    pattern_id INTEGER REFERENCES patterns(pattern_id),
    match_start INTEGER NOT NULL CHECK (match_start >= 0),
    match_end INTEGER NOT NULL CHECK (match_end >= match_start),
    matched_sequence TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS mutations_genome ON mutations(genome_id);
CREATE INDEX IF NOT EXISTS search_results_genome ON search_results(genome_id);
";

/// Creates the tables if they do not exist yet.
pub fn create_schema(connection: &Connection) -> rusqlite::Result<()> {
    connection.execute_batch(SCHEMA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();
        create_schema(&connection).unwrap();
        create_schema(&connection).unwrap();
        let tables: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }
}
