use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::format::metadata::SectionProperties;
use crate::format::DriftPolicy;
use crate::layout::{default_page_config, shared_metrics, AdaptiveLimiter, LineBudget, PageConfig};

/// Application configuration loaded from environment variables.
/// Every variable has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub reference_docx: PathBuf,
    pub format_metadata_path: PathBuf,
    pub content_template_path: PathBuf,
    pub working_copy_path: PathBuf,
    pub output_dir: PathBuf,
    /// The cover letter endpoint is off when this file does not exist.
    pub cover_letter_docx: PathBuf,
    pub cover_letter_metadata_path: PathBuf,
    pub drift_policy: DriftPolicy,
    pub font_path: Option<PathBuf>,
    pub font_size_pt: f32,
    pub render_dpi: f32,
    /// Explicit line width; `None` derives it from the reference page geometry.
    pub line_width_in: Option<f32>,
    /// The text transform is disabled when unset.
    pub anthropic_api_key: Option<String>,
    pub transform_timeout: Duration,
    pub port: u16,
    /// Empty allows any origin.
    pub cors_allowed_origins: Vec<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            reference_docx: env_or("REFERENCE_DOCX", "reference_docx/resume.docx").into(),
            format_metadata_path: env_or("FORMAT_METADATA_PATH", "metadata/format_metadata.json").into(),
            content_template_path: env_or(
                "CONTENT_TEMPLATE_PATH",
                "templates/resume_content_template.json",
            )
            .into(),
            working_copy_path: env_or("WORKING_COPY_PATH", "templates/resume_content.json").into(),
            output_dir: env_or("OUTPUT_DIR", "output/api_generated").into(),
            cover_letter_docx: env_or("COVER_LETTER_DOCX", "reference_docx/cover_letter_template.docx").into(),
            cover_letter_metadata_path: env_or(
                "COVER_LETTER_METADATA_PATH",
                "metadata/cover_letter_format_metadata.json",
            )
            .into(),
            drift_policy: parse_drift_policy(&env_or("DRIFT_POLICY", "skip"))?,
            font_path: optional_env("FONT_PATH").map(PathBuf::from),
            font_size_pt: parse_env("FONT_SIZE_PT", "10.5")?,
            render_dpi: parse_env("RENDER_DPI", "96")?,
            line_width_in: optional_env("LINE_WIDTH_IN")
                .map(|v| v.parse::<f32>())
                .transpose()
                .context("LINE_WIDTH_IN must be a number of inches")?,
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            transform_timeout: Duration::from_secs(parse_env("TRANSFORM_TIMEOUT_SECS", "120")?),
            port: parse_env("PORT", "8080")?,
            cors_allowed_origins: split_list(&env_or("CORS_ALLOWED_ORIGINS", "")),
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Font and line geometry for measuring. Without an explicit line width the
    /// default width is used here; `limiter` replaces it with the section's.
    pub fn page_config(&self) -> PageConfig {
        let defaults = default_page_config();
        PageConfig {
            font_path: self.font_path.clone(),
            font_size_pt: self.font_size_pt,
            dpi: self.render_dpi,
            line_width_in: self.line_width_in.unwrap_or(defaults.line_width_in),
        }
    }

    /// The limiter for the reference document. The line budget is the configured
    /// width, else page width minus left/right margins, else the default width.
    pub fn limiter(&self, section: &SectionProperties) -> AdaptiveLimiter {
        let page = self.page_config();
        let from_section = match (section.page_width, section.left_margin, section.right_margin) {
            (Some(width), Some(left), Some(right)) => {
                LineBudget::from_section_twips(width, left, right, self.render_dpi)
            }
            _ => None,
        };
        let budget = match (self.line_width_in, from_section) {
            (Some(_), _) | (None, None) => LineBudget::from_page_config(&page),
            (None, Some(budget)) => budget,
        };
        info!(budget_px = budget.pixels, font_size_pt = page.font_size_pt, "Line budget");
        AdaptiveLimiter::new(shared_metrics(&page), budget)
    }
}

fn parse_drift_policy(value: &str) -> Result<DriftPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "skip" => Ok(DriftPolicy::Skip),
        "write" => Ok(DriftPolicy::Write),
        other => bail!("DRIFT_POLICY must be 'skip' or 'write', got '{other}'"),
    }
}

/// Comma-separated list, blanks dropped.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Unset and empty both read as `None`.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_or(key, default)
        .trim()
        .parse::<T>()
        .with_context(|| format!("Environment variable '{key}' has an invalid value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(line_width_in: Option<f32>) -> Config {
        Config {
            reference_docx: "resume.docx".into(),
            format_metadata_path: "format.json".into(),
            content_template_path: "template.json".into(),
            working_copy_path: "draft.json".into(),
            output_dir: "out".into(),
            cover_letter_docx: "letter.docx".into(),
            cover_letter_metadata_path: "letter.json".into(),
            drift_policy: DriftPolicy::Skip,
            font_path: None,
            font_size_pt: 10.5,
            render_dpi: 96.0,
            line_width_in,
            anthropic_api_key: None,
            transform_timeout: Duration::from_secs(120),
            port: 8080,
            cors_allowed_origins: Vec::new(),
            rust_log: "info".to_string(),
        }
    }

    fn letter_half_inch_margins() -> SectionProperties {
        SectionProperties {
            page_width: Some(12240),
            left_margin: Some(720),
            right_margin: Some(720),
            ..SectionProperties::default()
        }
    }

    #[test]
    fn test_budget_from_section_geometry() {
        let limiter = config(None).limiter(&letter_half_inch_margins());
        // 7.5 in at 96 DPI
        assert_eq!(limiter.budget().pixels, 720.0);
    }

    #[test]
    fn test_explicit_line_width_wins() {
        let limiter = config(Some(7.87)).limiter(&letter_half_inch_margins());
        assert_eq!(limiter.budget().pixels, 755.0);
    }

    #[test]
    fn test_default_width_without_geometry() {
        let limiter = config(None).limiter(&SectionProperties::default());
        assert_eq!(limiter.budget().pixels, 755.0);
    }

    #[test]
    fn test_drift_policy_values() {
        assert_eq!(parse_drift_policy("skip").unwrap(), DriftPolicy::Skip);
        assert_eq!(parse_drift_policy(" Write ").unwrap(), DriftPolicy::Write);
        assert!(parse_drift_policy("ignore").is_err());
    }

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(
            split_list("https://a.example, ,https://b.example,"),
            ["https://a.example", "https://b.example"]
        );
        assert!(split_list("").is_empty());
    }
}
