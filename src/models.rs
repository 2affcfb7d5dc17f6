use serde::{
    Deserialize,
    Serialize,
};
use std::sync::Arc;

/// A stored genomic sequence.
///
/// Genomes are owned by the database, the analysis code only reads them.
#[derive(Debug, Clone)]
pub struct Genome {
    pub genome_id: i64,
    pub description: String,
    pub sequence: Arc<str>,
}

impl Genome {
    pub fn len(&self) -> usize {
        self.sequence.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// A named, reusable regex pattern from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPattern {
    pub pattern_id: i64,
    pub pattern_name: String,
    pub regex_pattern: String,
    pub description: String,
}

/// One match of a pattern in a sequence.
///
/// Offsets are 0-based, half-open character positions, the same positions
/// mutations use, so `start <= end <= sequence.chars().count()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    pub start: usize,
    pub end: usize,
    pub matched_sequence: String,
}

impl PatternMatch {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, std::hash::Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Substitution,
    Insertion,
    Deletion,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Substitution => "substitution",
            MutationKind::Insertion => "insertion",
            MutationKind::Deletion => "deletion",
        }
    }
}

/// A difference between a reference and a comparison sequence.
///
/// NOTE: for substitutions both `original` and `mutated` are a single character,
/// insertions have an empty `original` and deletions an empty `mutated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mutation {
    #[serde(rename = "type")]
    pub kind: MutationKind,
    pub position: usize,
    pub original: String,
    pub mutated: String,
}

impl Mutation {
    pub fn substitution(position: usize, original: char, mutated: char) -> Self {
        Self {
            kind: MutationKind::Substitution,
            position,
            original: original.to_string(),
            mutated: mutated.to_string(),
        }
    }

    pub fn insertion(position: usize, inserted: &str) -> Self {
        Self {
            kind: MutationKind::Insertion,
            position,
            original: String::new(),
            mutated: inserted.to_string(),
        }
    }

    pub fn deletion(position: usize, deleted: &str) -> Self {
        Self {
            kind: MutationKind::Deletion,
            position,
            original: deleted.to_string(),
            mutated: String::new(),
        }
    }
}
