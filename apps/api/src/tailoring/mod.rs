// Tailoring: limits for every editable field, the external text transform, and the
// transaction that merges its proposals into a draft and reports on them.

pub mod handlers;
pub mod limits;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod transform;

pub use pipeline::{TailoringOutcome, TailoringPipeline};
pub use transform::{DisabledTransform, LlmTransform, TextTransform, TransformError};
