// Cover letters: drafted by the writer, built from their own template through the
// same format metadata and rebuilder as the résumé.

pub mod builder;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod writer;

pub use builder::CoverLetterBuilder;
pub use models::LetterLayout;
pub use writer::{LetterWriter, LlmLetterWriter};
