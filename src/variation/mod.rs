pub mod composition;
pub mod detector;

pub use composition::gc_content;
pub use detector::{
    detect_mutations,
    VariationReport,
};
