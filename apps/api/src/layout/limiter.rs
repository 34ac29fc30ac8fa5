//! Adaptive character limits from actual glyph widths.
//!
//! A field's capacity is a pixel budget (`LineBudget × num_lines`) minus what the
//! prefix and the already-typed text consume. The leftover pixels are converted to
//! characters by dividing by the *widest* glyph, so the reported capacity is safe
//! even if every remaining character is a "W". Typing narrow glyphs ("i", "l")
//! therefore raises `current_limit`; typing wide ones lowers it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::{shared_metrics, GlyphMetrics, PageConfig};

/// Fields with fewer than this many characters left are "near" their limit.
pub const NEAR_LIMIT_CHARS: i64 = 10;

const TWIPS_PER_INCH: f64 = 1440.0;

// ────────────────────────────────────────────────────────────────────────────
// Line budget
// ────────────────────────────────────────────────────────────────────────────

/// Pixel width of one rendered line of body text. Constant for a template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineBudget {
    pub pixels: f64,
}

impl LineBudget {
    pub fn from_pixels(pixels: f64) -> Self {
        Self {
            pixels: pixels.max(0.0),
        }
    }

    pub fn from_page_config(config: &PageConfig) -> Self {
        Self::from_pixels(config.line_budget_px())
    }

    /// Content width of a section (page width minus left/right margins, all in twips)
    /// at `dpi`. Returns `None` when the geometry leaves no room for text.
    pub fn from_section_twips(page_width: i64, margin_left: i64, margin_right: i64, dpi: f32) -> Option<Self> {
        let content = page_width - margin_left - margin_right;
        if content <= 0 {
            return None;
        }
        Some(Self::from_pixels(
            (content as f64 / TWIPS_PER_INCH * dpi as f64).floor(),
        ))
    }

    pub fn for_lines(&self, num_lines: u32) -> f64 {
        self.pixels * num_lines.max(1) as f64
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field limit
// ────────────────────────────────────────────────────────────────────────────

/// Capacity of one field for its current text. Derived on every change, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldLimit {
    /// `chars_typed + remaining`. Can fall below `chars_typed` once the field overflows.
    pub current_limit: i64,
    /// Conservative number of characters that still fit (negative when over budget).
    pub remaining: i64,
    pub pixels_used: f64,
    pub pixels_available: f64,
    pub total_pixels: f64,
    pub percentage_used: f64,
    pub num_lines: u32,
    pub is_near_limit: bool,
    pub is_at_limit: bool,
    pub chars_typed: usize,
    /// How many characters beyond the worst-case estimate the typed text earned.
    pub efficiency_gain: i64,
}

// ────────────────────────────────────────────────────────────────────────────
// Limiter
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AdaptiveLimiter {
    metrics: Arc<GlyphMetrics>,
    budget: LineBudget,
}

impl AdaptiveLimiter {
    pub fn new(metrics: Arc<GlyphMetrics>, budget: LineBudget) -> Self {
        Self { metrics, budget }
    }

    /// Limiter over the shared metrics for `config`, with the budget from its line width.
    pub fn from_config(config: &PageConfig) -> Self {
        Self::new(shared_metrics(config), LineBudget::from_page_config(config))
    }

    pub fn budget(&self) -> LineBudget {
        self.budget
    }

    pub fn metrics(&self) -> &GlyphMetrics {
        &self.metrics
    }

    pub fn measure(&self, text: &str) -> f64 {
        self.metrics.measure(text)
    }

    /// Worst-case capacity of one line after `prefix`, before anything is typed.
    pub fn initial_limit(&self, prefix: &str) -> usize {
        let available = self.budget.pixels - self.measure(prefix);
        self.chars_for_pixels(available).max(0) as usize
    }

    /// Number of lines `prefix + reference_text` occupies at this budget (at least 1).
    pub fn detect_num_lines(&self, prefix: &str, reference_text: &str) -> u32 {
        if self.budget.pixels <= 0.0 {
            return 1;
        }
        let total = self.measure(prefix) + self.measure(reference_text);
        ((total / self.budget.pixels).ceil() as u32).max(1)
    }

    /// Capacity of a field given what is typed now.
    ///
    /// Line count resolution: an explicit `num_lines` wins; otherwise it is detected
    /// from `reference_text` (how the original rendered) or, failing that, from
    /// `current_text`.
    pub fn adaptive_limit(
        &self,
        prefix: &str,
        current_text: &str,
        reference_text: Option<&str>,
        num_lines: Option<u32>,
    ) -> FieldLimit {
        let num_lines = match (num_lines, reference_text) {
            (Some(n), _) => n.max(1),
            (None, Some(reference)) => self.detect_num_lines(prefix, reference),
            (None, None) => self.detect_num_lines(prefix, current_text),
        };

        let total_pixels = self.budget.for_lines(num_lines);
        let pixels_used = self.measure(prefix) + self.measure(current_text);
        let pixels_available = total_pixels - pixels_used;

        let remaining = self.chars_for_pixels(pixels_available);
        let chars_typed = current_text.chars().count();
        let current_limit = chars_typed as i64 + remaining;
        let worst_case = self.initial_limit(prefix) as i64 * num_lines as i64;

        let percentage_used = if total_pixels > 0.0 {
            (pixels_used / total_pixels * 1000.0).round() / 10.0
        } else {
            100.0
        };

        FieldLimit {
            current_limit,
            remaining,
            pixels_used,
            pixels_available,
            total_pixels,
            percentage_used,
            num_lines,
            is_near_limit: remaining < NEAR_LIMIT_CHARS,
            is_at_limit: remaining <= 0,
            chars_typed,
            efficiency_gain: current_limit - worst_case,
        }
    }

    /// Pixels → characters, assuming every character is the widest glyph.
    fn chars_for_pixels(&self, pixels: f64) -> i64 {
        let widest = self.metrics.widest();
        if widest <= 0.0 {
            return 0;
        }
        (pixels / widest).floor() as i64
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
