// Content layer: the structural content map, the line parsers and extractor that
// produce it from the reference document, and the working-copy draft.

pub mod draft;
pub mod extractor;
pub mod header;
pub mod models;

pub use draft::{DraftStore, FieldUpdate, RejectedField};
pub use extractor::{extract_content, ContentExtractor};
pub use models::{FieldPath, StructuralContentMap};
