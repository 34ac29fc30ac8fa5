//! Glyph metrics for the reference résumé font.
//!
//! Widths are horizontal advances in pixels at the configured point size and DPI.
//! When the configured TrueType file loads, advances come from its `hmtx` table;
//! otherwise a built-in Times-Roman-compatible table is used. The built-in table is
//! accurate enough for the conservative limit math in `limiter.rs`, which always
//! divides by the widest glyph.
//!
//! Every width is quantized to 1/64 px, so measuring a string is an exact sum of
//! its per-character widths: `measure(a + b) == measure(a) + measure(b)`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

// ────────────────────────────────────────────────────────────────────────────
// Page configuration
// ────────────────────────────────────────────────────────────────────────────

/// Font and line geometry for the reference document.
///
/// Example: 10.5pt at 96 DPI → 14 px glyph em; a 7.87" line → 755 px budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    /// TrueType file for the reference font. `None` selects the built-in table.
    pub font_path: Option<PathBuf>,
    pub font_size_pt: f32,
    pub dpi: f32,
    /// Width of one rendered line of body text, in inches.
    pub line_width_in: f32,
}

/// Returns the page config matching the reference résumé: 10.5pt Times New Roman,
/// 96 DPI, 7.87" of usable line width.
pub fn default_page_config() -> PageConfig {
    PageConfig {
        font_path: None,
        font_size_pt: 10.5,
        dpi: 96.0,
        line_width_in: 7.87,
    }
}

impl PageConfig {
    /// Pixel size of one em, truncated to whole pixels the way rasterizers size fonts.
    pub fn font_size_px(&self) -> f64 {
        (self.font_size_pt as f64 * self.dpi as f64 / 72.0).floor()
    }

    /// Pixel width of one line (the line budget).
    pub fn line_budget_px(&self) -> f64 {
        (self.line_width_in as f64 * self.dpi as f64).floor()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Width table
// ────────────────────────────────────────────────────────────────────────────

/// Characters whose widths drive the widest/narrowest/average aggregates.
pub const PRINTABLE: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 .,;:!?-+*/()[]{}@#$%^&_=<>|~`\"'\\";

/// Typographic glyphs that show up in résumé text outside printable ASCII.
/// Measured when available but excluded from the aggregates.
const EXTRA_GLYPHS: &[(char, u16)] = &[
    ('•', 350),
    ('●', 604),
    ('–', 500),
    ('—', 1000),
    ('‘', 333),
    ('’', 333),
    ('“', 444),
    ('”', 444),
    ('…', 1000),
    ('é', 444),
];

/// Pixel widths for the printable set of one font at one size.
///
/// `widest`, `narrowest` and `average` are recomputed by every constructor, so a table
/// is always internally consistent. Tables are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlyphWidthTable {
    widths: HashMap<char, f64>,
    pub widest: f64,
    pub narrowest: f64,
    pub average: f64,
}

impl GlyphWidthTable {
    pub fn from_widths(widths: HashMap<char, f64>) -> Self {
        let (widest, narrowest, sum) = widths.values().fold(
            (0.0_f64, f64::MAX, 0.0_f64),
            |(max, min, sum), &w| (max.max(w), min.min(w), sum + w),
        );
        let (narrowest, average) = if widths.is_empty() {
            (0.0, 0.0)
        } else {
            (narrowest, quantize(sum / widths.len() as f64))
        };
        Self {
            widths,
            widest,
            narrowest,
            average,
        }
    }

    pub fn get(&self, c: char) -> Option<f64> {
        self.widths.get(&c).copied()
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }
}

/// Rounds a pixel width to the 1/64 px grid.
fn quantize(px: f64) -> f64 {
    (px * 64.0).round() / 64.0
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in metrics (Times Roman, 1/1000 em)
// ────────────────────────────────────────────────────────────────────────────

/// Advance widths for ASCII 0x20..=0x7E in 1/1000 em.
///
/// Slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
#[rustfmt::skip]
static TIMES_ROMAN_WIDTHS: [u16; 95] = [
    // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    // 0    1    2    3    4    5    6    7    8    9
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    // :    ;    <    =    >    ?    @
    278, 278, 564, 564, 564, 444, 921,
    // A    B    C    D    E    F    G    H    I    J    K    L    M
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    // [    \    ]    ^    _    `
    333, 278, 333, 469, 500, 333,
    // a    b    c    d    e    f    g    h    i    j    k    l    m
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    // n    o    p    q    r    s    t    u    v    w    x    y    z
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    // {    |    }    ~
    480, 200, 480, 541,
];

fn builtin_width(c: char, size_px: f64) -> Option<f64> {
    let code = c as usize;
    let units = if (32..=126).contains(&code) {
        TIMES_ROMAN_WIDTHS[code - 32]
    } else {
        EXTRA_GLYPHS.iter().find(|(g, _)| *g == c).map(|(_, w)| *w)?
    };
    Some(quantize(units as f64 * size_px / 1000.0))
}

// ────────────────────────────────────────────────────────────────────────────
// Metrics engine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to read font file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse font file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Where the glyph widths came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GlyphSource {
    Font { path: PathBuf },
    /// Fallback table; accuracy is degraded but measurement never fails.
    Builtin,
}

/// Measures text for one font at one size.
#[derive(Debug, Clone)]
pub struct GlyphMetrics {
    table: GlyphWidthTable,
    extras: HashMap<char, f64>,
    space_width: f64,
    size_px: f64,
    source: GlyphSource,
}

impl GlyphMetrics {
    /// Builds metrics for `config`, falling back to the built-in table when the font
    /// file is missing or unreadable.
    pub fn new(config: &PageConfig) -> Self {
        let size_px = config.font_size_px();
        let Some(path) = config.font_path.as_deref() else {
            return Self::builtin(size_px);
        };

        match load_font_widths(path, size_px) {
            Ok(widths) => {
                info!(font = %path.display(), size_px, "Loaded glyph metrics from font file");
                Self::from_font_widths(widths, size_px, path.to_path_buf())
            }
            Err(e) => {
                warn!("Glyph metrics degraded, using built-in table: {e}");
                Self::builtin(size_px)
            }
        }
    }

    /// Metrics from the built-in Times Roman table.
    pub fn builtin(size_px: f64) -> Self {
        let widths = PRINTABLE
            .chars()
            .filter_map(|c| builtin_width(c, size_px).map(|w| (c, w)))
            .collect();
        let extras = EXTRA_GLYPHS
            .iter()
            .filter_map(|(c, _)| builtin_width(*c, size_px).map(|w| (*c, w)))
            .collect();
        Self::assemble(widths, extras, size_px, GlyphSource::Builtin)
    }

    fn from_font_widths(mut widths: HashMap<char, f64>, size_px: f64, path: PathBuf) -> Self {
        let extras = EXTRA_GLYPHS
            .iter()
            .filter_map(|(c, _)| widths.remove(c).map(|w| (*c, w)))
            .collect();
        // Glyphs the font lacks are measured with the built-in table.
        for c in PRINTABLE.chars() {
            if !widths.contains_key(&c) {
                if let Some(w) = builtin_width(c, size_px) {
                    widths.insert(c, w);
                }
            }
        }
        Self::assemble(widths, extras, size_px, GlyphSource::Font { path })
    }

    fn assemble(
        widths: HashMap<char, f64>,
        extras: HashMap<char, f64>,
        size_px: f64,
        source: GlyphSource,
    ) -> Self {
        let table = GlyphWidthTable::from_widths(widths);
        let space_width = table.get(' ').unwrap_or(table.average);
        Self {
            table,
            extras,
            space_width,
            size_px,
            source,
        }
    }

    /// Width of a single character. Whitespace measures as a space; characters
    /// outside the table measure as the table average.
    pub fn char_width(&self, c: char) -> f64 {
        if let Some(w) = self.table.get(c) {
            return w;
        }
        if let Some(w) = self.extras.get(&c) {
            return *w;
        }
        if c.is_whitespace() {
            self.space_width
        } else {
            self.table.average
        }
    }

    /// Horizontal extent of `text` in pixels. Empty text measures zero.
    pub fn measure(&self, text: &str) -> f64 {
        text.chars().map(|c| self.char_width(c)).sum()
    }

    pub fn widest(&self) -> f64 {
        self.table.widest
    }

    pub fn narrowest(&self) -> f64 {
        self.table.narrowest
    }

    pub fn average(&self) -> f64 {
        self.table.average
    }

    pub fn table(&self) -> &GlyphWidthTable {
        &self.table
    }

    pub fn size_px(&self) -> f64 {
        self.size_px
    }

    pub fn source(&self) -> &GlyphSource {
        &self.source
    }
}

fn load_font_widths(path: &Path, size_px: f64) -> Result<HashMap<char, f64>, MetricsError> {
    let data = std::fs::read(path).map_err(|source| MetricsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let face = ttf_parser::Face::parse(&data, 0).map_err(|e| MetricsError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let units_per_em = face.units_per_em() as f64;

    let mut widths = HashMap::new();
    let wanted = PRINTABLE.chars().chain(EXTRA_GLYPHS.iter().map(|(c, _)| *c));
    for c in wanted {
        let Some(glyph) = face.glyph_index(c) else {
            continue;
        };
        if let Some(advance) = face.glyph_hor_advance(glyph) {
            widths.insert(c, quantize(advance as f64 * size_px / units_per_em));
        }
    }
    Ok(widths)
}

// ────────────────────────────────────────────────────────────────────────────
// Process-wide cache
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MetricsKey {
    font_path: Option<PathBuf>,
    /// Pixel size in 1/100 px.
    size: u64,
}

static SHARED_METRICS: Lazy<Mutex<HashMap<MetricsKey, Arc<GlyphMetrics>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Returns the process-wide metrics for `config`'s font and size, building them on
/// first use. Entries are never mutated after insertion.
pub fn shared_metrics(config: &PageConfig) -> Arc<GlyphMetrics> {
    let key = MetricsKey {
        font_path: config.font_path.clone(),
        size: (config.font_size_px() * 100.0).round() as u64,
    };
    let mut cache = SHARED_METRICS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    cache
        .entry(key)
        .or_insert_with(|| Arc::new(GlyphMetrics::new(config)))
        .clone()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
