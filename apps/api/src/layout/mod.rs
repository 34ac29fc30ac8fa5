// Text fitting: glyph metrics for the reference font and the adaptive per-field
// character limits built on them.
// Measuring is one table lookup per character, so callers run it inline.

pub mod font_metrics;
pub mod limiter;

// Re-export the public API consumed by other modules (tailoring, handlers).
pub use font_metrics::{default_page_config, shared_metrics, GlyphMetrics, PageConfig};
pub use limiter::{AdaptiveLimiter, FieldLimit, LineBudget};
