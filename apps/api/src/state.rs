use std::sync::Arc;

use crate::config::Config;
use crate::cover_letter::{CoverLetterBuilder, LetterWriter};
use crate::content::{DraftStore, StructuralContentMap};
use crate::format::FormatRebuilder;
use crate::layout::AdaptiveLimiter;
use crate::tailoring::transform::TextTransform;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is read-only after startup except the draft file behind `drafts`.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub limiter: Arc<AdaptiveLimiter>,
    /// Reference bytes plus format metadata; every build starts from these.
    pub rebuilder: FormatRebuilder,
    /// The pristine content template. Never mutated.
    pub seed: Arc<StructuralContentMap>,
    /// The working copy. Last writer wins.
    pub drafts: DraftStore,
    /// Pluggable text transform: `LlmTransform` with an API key, `DisabledTransform` without.
    pub transform: Arc<dyn TextTransform>,
    /// Present when the cover letter template could be loaded.
    pub cover_letters: Option<CoverLetterBuilder>,
    pub letter_writer: Arc<dyn LetterWriter>,
}
