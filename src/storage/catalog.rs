use crate::errors::{
    GenoSeekError,
    Result,
};
use crate::models::StoredPattern;
use log::info;
use rusqlite::{
    Connection,
    OptionalExtension,
    Row,
};

/// Reference patterns every fresh catalog starts with.
pub const DEFAULT_PATTERNS: [(&str, &str, &str); 3] = [
    (
        "Bacterial TATA Box",
        "TATA[AT]A[AT]",
        "A common promoter sequence (TATA box) found in bacteria.",
    ),
    (
        "EcoRI Restriction Site",
        "GAATTC",
        "The specific recognition site for the EcoRI restriction enzyme.",
    ),
    (
        "Shine-Dalgarno Sequence",
        "AGGAGG",
        "A ribosomal binding site in bacterial mRNA.",
    ),
];

const SELECT_PATTERN: &str =
    "SELECT pattern_id, pattern_name, regex_pattern, description FROM patterns";

fn pattern_from_row(row: &Row<'_>) -> rusqlite::Result<StoredPattern> {
    Ok(StoredPattern {
        pattern_id: row.get(0)?,
        pattern_name: row.get(1)?,
        regex_pattern: row.get(2)?,
        description: row.get(3)?,
    })
}

/// Inserts the default patterns, leaving existing names untouched.
///
/// Returns how many were actually added.
pub fn seed_default_patterns(connection: &mut Connection) -> Result<usize> {
    let transaction = connection.transaction()?;
    let mut added = 0;
    {
        let mut insert = transaction.prepare(
            "INSERT INTO patterns (pattern_name, regex_pattern, description) VALUES (?1, ?2, ?3)
             ON CONFLICT (pattern_name) DO NOTHING",
        )?;
        for pattern in DEFAULT_PATTERNS.iter() {
            added += insert.execute(*pattern)?;
        }
    }
    transaction.commit()?;
    info!("Checked for sample patterns, {} added", added);
    Ok(added)
}

/// Adds a pattern to the catalog and returns its id.
///
/// The regex itself is not validated here, searching with a malformed
/// pattern simply yields no matches.
pub fn add_pattern(
    connection: &Connection,
    name: &str,
    regex_pattern: &str,
    description: &str,
) -> Result<i64> {
    connection.execute(
        "INSERT INTO patterns (pattern_name, regex_pattern, description) VALUES (?1, ?2, ?3)",
        (name, regex_pattern, description),
    )?;
    Ok(connection.last_insert_rowid())
}

pub fn list_patterns(connection: &Connection) -> Result<Vec<StoredPattern>> {
    let mut statement = connection.prepare(&format!("{} ORDER BY pattern_name", SELECT_PATTERN))?;
    let rows = statement.query_map([], pattern_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn pattern_by_name(connection: &Connection, name: &str) -> Result<StoredPattern> {
    connection
        .query_row(
            &format!("{} WHERE pattern_name = ?1", SELECT_PATTERN),
            [name],
            pattern_from_row,
        )
        .optional()?
        .ok_or_else(|| GenoSeekError::PatternNotFound(name.to_string()))
}

pub fn pattern_by_id(connection: &Connection, pattern_id: i64) -> Result<StoredPattern> {
    connection
        .query_row(
            &format!("{} WHERE pattern_id = ?1", SELECT_PATTERN),
            [pattern_id],
            pattern_from_row,
        )
        .optional()?
        .ok_or_else(|| GenoSeekError::PatternNotFound(format!("#{}", pattern_id)))
}
