//! Cover letter content and where each part of it goes in the letter template.
//!
//! The template is a fixed layout: letterhead, date, recipient block, salutation,
//! five body paragraphs, sign-off. Only the slots listed in a [`LetterLayout`] are
//! rewritten; the letterhead and sign-off keep the template's own text.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::format::ParagraphText;

pub const DEFAULT_HIRING_MANAGER: &str = "Hiring Manager";

/// `October 18, 2026`
pub const DATE_FORMAT: &str = "%B %d, %Y";

/// Word cap for each body paragraph.
pub const MAX_PARAGRAPH_WORDS: usize = 55;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub hiring_manager: Option<String>,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub company_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterBody {
    pub opening: String,
    pub skills: String,
    pub achievements: String,
    pub company_knowledge: String,
    pub closing: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverLetterContent {
    /// Printed as-is; today's date when unset or still a placeholder.
    pub date: Option<String>,
    pub recipient: Recipient,
    pub body: LetterBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterSlot {
    Date,
    HiringManager,
    JobTitle,
    CompanyName,
    CompanyAddress,
    Salutation,
    Opening,
    Skills,
    Achievements,
    CompanyKnowledge,
    Closing,
}

impl LetterSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            LetterSlot::Date => "date",
            LetterSlot::HiringManager => "recipient.hiring_manager",
            LetterSlot::JobTitle => "recipient.job_title",
            LetterSlot::CompanyName => "recipient.company_name",
            LetterSlot::CompanyAddress => "recipient.company_address",
            LetterSlot::Salutation => "salutation",
            LetterSlot::Opening => "body.opening",
            LetterSlot::Skills => "body.skills",
            LetterSlot::Achievements => "body.achievements",
            LetterSlot::CompanyKnowledge => "body.company_knowledge",
            LetterSlot::Closing => "body.closing",
        }
    }
}

/// Paragraph index of each slot in the letter template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterLayout {
    pub slots: Vec<(LetterSlot, usize)>,
}

impl Default for LetterLayout {
    /// Three letterhead lines, then one paragraph per slot in reading order.
    fn default() -> Self {
        use LetterSlot::*;
        Self {
            slots: vec![
                (Date, 3),
                (HiringManager, 4),
                (JobTitle, 5),
                (CompanyName, 6),
                (CompanyAddress, 7),
                (Salutation, 8),
                (Opening, 9),
                (Skills, 10),
                (Achievements, 11),
                (CompanyKnowledge, 12),
                (Closing, 13),
            ],
        }
    }
}

/// `None` for blank values and unfilled template placeholders such as `[Company Name]`.
pub fn present(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.starts_with('['))
}

impl CoverLetterContent {
    /// The text written into `slot`. Missing recipient details leave their line blank,
    /// except the hiring manager, who defaults to "Hiring Manager".
    pub fn slot_text(&self, slot: LetterSlot, today: NaiveDate) -> String {
        let recipient = &self.recipient;
        let hiring_manager = present(recipient.hiring_manager.as_deref()).unwrap_or(DEFAULT_HIRING_MANAGER);
        let optional = |value: &Option<String>| present(value.as_deref()).unwrap_or_default().to_string();
        match slot {
            LetterSlot::Date => present(self.date.as_deref())
                .map(str::to_string)
                .unwrap_or_else(|| today.format(DATE_FORMAT).to_string()),
            LetterSlot::HiringManager => hiring_manager.to_string(),
            LetterSlot::JobTitle => optional(&recipient.job_title),
            LetterSlot::CompanyName => optional(&recipient.company_name),
            LetterSlot::CompanyAddress => optional(&recipient.company_address),
            LetterSlot::Salutation => format!("Dear {hiring_manager},"),
            LetterSlot::Opening => self.body.opening.trim().to_string(),
            LetterSlot::Skills => self.body.skills.trim().to_string(),
            LetterSlot::Achievements => self.body.achievements.trim().to_string(),
            LetterSlot::CompanyKnowledge => self.body.company_knowledge.trim().to_string(),
            LetterSlot::Closing => self.body.closing.trim().to_string(),
        }
    }

    pub fn paragraphs(&self, layout: &LetterLayout, today: NaiveDate) -> Vec<ParagraphText> {
        layout
            .slots
            .iter()
            .map(|&(slot, paragraph_index)| ParagraphText {
                field: slot.as_str().to_string(),
                paragraph_index,
                text: self.slot_text(slot, today),
            })
            .collect()
    }
}

/// Keeps the first `max` words; longer text is cut and ends in "...".
pub fn cap_words(text: &str, max: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max {
        return text.trim().to_string();
    }
    format!("{}...", words[..max].join(" "))
}
