pub mod matcher;

pub use matcher::{
    find_patterns,
    MatchIter,
    PatternDiagnostic,
    PatternMatcher,
    SearchOutcome,
};
