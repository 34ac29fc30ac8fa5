// Format layer: style metadata extraction, format-preserving rebuild, and
// verification of generated documents against the reference.

pub mod metadata;
pub mod rebuilder;
pub mod verify;

pub use metadata::FormatMetadata;
pub use rebuilder::{
    BuildOutcome, BuiltDocument, DriftPolicy, FormatRebuilder, ParagraphText, SkipReason, SkippedField,
};
