use super::batch::BatchRow;
use crate::errors::{
    GenoSeekError,
    Result,
};
use crate::models::Genome;
use rusqlite::{
    Connection,
    OptionalExtension,
    Statement,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::io::Read;
use std::path::Path;

/// Sequences longer than this are cut when ingested.
pub const DEFAULT_SEQUENCE_LENGTH_LIMIT: usize = 100_000;

/// A genome as it arrives for ingestion, one CSV record per genome.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenomeRow {
    pub genome_id: i64,
    pub description: String,
    pub sequence: String,
}

impl GenomeRow {
    pub fn truncated(mut self, max_len: usize) -> Self {
        if let Some((cut, _)) = self.sequence.char_indices().nth(max_len) {
            self.sequence.truncate(cut);
        }
        self
    }
}

impl BatchRow for GenomeRow {
    const INSERT_SQL: &'static str =
        "INSERT INTO genomes (genome_id, description, sequence) VALUES (?1, ?2, ?3)";

    fn insert(&self, statement: &mut Statement<'_>) -> rusqlite::Result<usize> {
        statement.execute((self.genome_id, &self.description, &self.sequence))
    }
}

/// Reads genomes from CSV data with a `genome_id,description,sequence` header.
pub fn read_genome_csv<R: Read>(reader: R) -> Result<Vec<GenomeRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

pub fn read_genome_csv_file<P: AsRef<Path>>(path: P) -> Result<Vec<GenomeRow>> {
    let file = std::fs::File::open(path)?;
    read_genome_csv(std::io::BufReader::new(file))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenomeSummary {
    pub genome_id: i64,
    pub description: String,
    pub length: usize,
}

pub fn fetch_genome(connection: &Connection, genome_id: i64) -> Result<Genome> {
    let genome = connection
        .query_row(
            "SELECT genome_id, description, sequence FROM genomes WHERE genome_id = ?1",
            [genome_id],
            |row| {
                Ok(Genome {
                    genome_id: row.get(0)?,
                    description: row.get(1)?,
                    sequence: row.get::<_, String>(2)?.into(),
                })
            },
        )
        .optional()?;
    genome.ok_or(GenoSeekError::GenomeNotFound(genome_id))
}

pub fn genome_exists(connection: &Connection, genome_id: i64) -> Result<bool> {
    let found = connection
        .query_row(
            "SELECT 1 FROM genomes WHERE genome_id = ?1",
            [genome_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn ensure_genome(connection: &Connection, genome_id: i64) -> Result<()> {
    if genome_exists(connection, genome_id)? {
        Ok(())
    } else {
        Err(GenoSeekError::GenomeNotFound(genome_id))
    }
}

pub fn list_genomes(connection: &Connection) -> Result<Vec<GenomeSummary>> {
    let mut statement = connection.prepare(
        "SELECT genome_id, description, length(sequence) FROM genomes ORDER BY genome_id",
    )?;
    let rows = statement.query_map([], |row| {
        Ok(GenomeSummary {
            genome_id: row.get(0)?,
            description: row.get(1)?,
            length: row.get::<_, i64>(2)? as usize,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::batch::{
        BatchWriter,
        FailureMode,
    };
    use crate::storage::schema::create_schema;

    fn setup() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_schema(&connection).unwrap();
        connection
    }

    #[test]
    fn test_csv_parsing() {
        let data = r#""genome_id","description","sequence"
"1","NC_000913.3 Escherichia coli","ACGTACGT"
"2","sample, with comma","GGCC"
"#;
        let rows = read_genome_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].genome_id, 1);
        assert_eq!(rows[1].description, "sample, with comma");
        assert_eq!(rows[1].sequence, "GGCC");
    }

    #[test]
    fn test_truncation() {
        let row = GenomeRow {
            genome_id: 1,
            description: "long".to_string(),
            sequence: "ACGTACGT".to_string(),
        };
        assert_eq!(row.clone().truncated(3).sequence, "ACG");
        assert_eq!(row.truncated(100).sequence, "ACGTACGT");
    }

    #[test]
    fn test_fetch_and_list() {
        let mut connection = setup();
        let rows = vec![
            GenomeRow {
                genome_id: 2,
                description: "second".to_string(),
                sequence: "GGCC".to_string(),
            },
            GenomeRow {
                genome_id: 1,
                description: "first".to_string(),
                sequence: "ACGTAC".to_string(),
            },
        ];
        BatchWriter::new(FailureMode::AbortOnError)
            .write(&mut connection, &rows)
            .unwrap();

        let genome = fetch_genome(&connection, 1).unwrap();
        assert_eq!(genome.sequence.as_ref(), "ACGTAC");

        let listed = list_genomes(&connection).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].genome_id, 1);
        assert_eq!(listed[0].length, 6);

        match fetch_genome(&connection, 3) {
            Err(GenoSeekError::GenomeNotFound(3)) => {}
            other => panic!("Expected genome 3 to be missing, got: {:?}", other),
        }
        assert!(ensure_genome(&connection, 2).is_ok());
        assert!(ensure_genome(&connection, 9).is_err());
    }

    #[test]
    fn test_duplicate_ids_are_skipped_on_ingestion() {
        let mut connection = setup();
        let row = GenomeRow {
            genome_id: 1,
            description: "dup".to_string(),
            sequence: "A".to_string(),
        };
        let rows = vec![row.clone(), row.clone(), row];
        let report = BatchWriter::new(FailureMode::SkipOnError)
            .write(&mut connection, &rows)
            .unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped.len(), 2);
    }
}
