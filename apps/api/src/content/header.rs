//! Parsers for the fixed line shapes of the reference résumé.
//!
//! These are heuristics over a known document layout, not general parsers:
//! entry headers must end with their dates and separate entity from role with a
//! comma; skill lines must carry a `Label:` prefix.

use once_cell::sync::Lazy;
use regex::Regex;

const MONTH: &str = r"(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?|Sept?(?:ember)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\.?";

/// `Month YYYY`, optionally followed by `- Month YYYY`, `- YYYY` or `- Present`.
static MONTH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?:Expected\s+)?\b{MONTH}\s+\d{{4}}(?:\s*[-–—]\s*(?:{MONTH}\s+\d{{4}}|\d{{4}}|Present|Current|Now))?"
    ))
    .expect("valid month date regex")
});

/// `YYYY - YYYY` or `YYYY - Present`.
static YEAR_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{4}\s*[-–—]\s*(?:\d{4}|Present|Current|Now)\b").expect("valid year range regex")
});

/// Month names or a plausible year anywhere in a line.
static HAS_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b{MONTH}\b|\b(?:19|20)\d{{2}}\b")).expect("valid date hint regex")
});

static DEGREE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:(?:Master|Bachelor|Doctor|Associate)(?:'s)?\s+of\s+\w+|Ph\.?D\.?|MBA\b|[BM]\.(?:S|E|A|Sc|Tech)\.?)",
    )
    .expect("valid degree regex")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Byte range of the last date expression in `text`: month dates first, then bare
/// year ranges.
fn last_date(text: &str) -> Option<(usize, usize)> {
    MONTH_DATE
        .find_iter(text)
        .last()
        .or_else(|| YEAR_RANGE.find_iter(text).last())
        .map(|m| (m.start(), m.end()))
}

pub fn has_date(text: &str) -> bool {
    HAS_DATE.is_match(text)
}

// ────────────────────────────────────────────────────────────────────────────
// Entry headers
// ────────────────────────────────────────────────────────────────────────────

/// `entity, role | location    dates`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderParts {
    pub entity: String,
    pub role: String,
    pub location: String,
    pub dates: String,
}

pub fn parse_header_line(text: &str) -> HeaderParts {
    let cleaned = collapse_whitespace(text);
    let (rest, dates) = match last_date(&cleaned) {
        Some((start, end)) => (cleaned[..start].trim(), cleaned[start..end].trim()),
        None => (cleaned.as_str(), ""),
    };

    let (before_pipe, location) = match rest.split_once('|') {
        Some((before, location)) => (before, location.trim()),
        None => (rest, ""),
    };
    let (entity, role) = match before_pipe.split_once(',') {
        Some((entity, role)) => (entity.trim(), role.trim()),
        None => (before_pipe.trim(), ""),
    };

    HeaderParts {
        entity: entity.to_string(),
        role: role.to_string(),
        location: location.to_string(),
        dates: dates.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Education lines
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EducationParts {
    pub university: String,
    pub degree: String,
    pub dates: String,
}

/// `University    Degree    Dates`; any of the three may be missing.
pub fn parse_education_line(text: &str) -> EducationParts {
    let (head, dates) = match last_date(text) {
        Some((start, end)) => (&text[..start], collapse_whitespace(&text[start..end])),
        None => (text, String::new()),
    };
    let (university, degree) = match DEGREE.find(head) {
        Some(m) => (&head[..m.start()], &head[m.start()..]),
        None => (head, ""),
    };
    EducationParts {
        university: collapse_whitespace(university)
            .trim_end_matches([',', '|', '-'])
            .trim()
            .to_string(),
        degree: collapse_whitespace(degree)
            .trim_end_matches([',', '|', '-'])
            .trim()
            .to_string(),
        dates,
    }
}

pub fn looks_like_degree(text: &str) -> bool {
    DEGREE.is_match(text) || text.contains("Engineering")
}

// ────────────────────────────────────────────────────────────────────────────
// Labeled lines
// ────────────────────────────────────────────────────────────────────────────

/// Splits `Label: value` on the first colon.
pub fn split_label(text: &str) -> Option<(String, String)> {
    let (label, value) = text.split_once(':')?;
    Some((label.trim().to_string(), value.trim().to_string()))
}

/// Lowercase, `&` → `and`, spaces and `/` → `_`.
pub fn skill_key(label: &str) -> String {
    label
        .to_lowercase()
        .replace(' ', "_")
        .replace('&', "and")
        .replace('/', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_with_location_and_month_range() {
        let parts = parse_header_line("Acme Corp, Software Engineer | Austin, TX\t\tJun 2021 - Present");
        assert_eq!(parts.entity, "Acme Corp");
        assert_eq!(parts.role, "Software Engineer");
        assert_eq!(parts.location, "Austin, TX");
        assert_eq!(parts.dates, "Jun 2021 - Present");
    }

    #[test]
    fn test_header_with_full_month_names() {
        let parts = parse_header_line("Test-Lab, Lead Developer     January 2023 – March 2023");
        assert_eq!(parts.entity, "Test-Lab");
        assert_eq!(parts.role, "Lead Developer");
        assert_eq!(parts.location, "");
        assert_eq!(parts.dates, "January 2023 – March 2023");
    }

    #[test]
    fn test_header_with_year_range() {
        let parts = parse_header_line("Robotics Club, President\t2019 - 2021");
        assert_eq!(parts.entity, "Robotics Club");
        assert_eq!(parts.role, "President");
        assert_eq!(parts.dates, "2019 - 2021");
    }

    #[test]
    fn test_header_takes_last_date() {
        let parts = parse_header_line("May 2020 Hackathon, Organizer    Aug 2020 - Dec 2020");
        assert_eq!(parts.dates, "Aug 2020 - Dec 2020");
        assert_eq!(parts.entity, "May 2020 Hackathon");
    }

    #[test]
    fn test_header_without_dates_or_comma() {
        let parts = parse_header_line("Freelance");
        assert_eq!(parts, HeaderParts { entity: "Freelance".into(), ..Default::default() });
    }

    #[test]
    fn test_education_line_with_degree_and_expected_date() {
        let parts = parse_education_line(
            "Stanford University\tMaster of Science in Computer Science\tExpected May 2025",
        );
        assert_eq!(parts.university, "Stanford University");
        assert_eq!(parts.degree, "Master of Science in Computer Science");
        assert_eq!(parts.dates, "Expected May 2025");
    }

    #[test]
    fn test_education_degree_line_only() {
        let parts = parse_education_line("Bachelor of Engineering in Computer Engineering\t  Aug 2017 - May 2021");
        assert_eq!(parts.university, "");
        assert_eq!(parts.degree, "Bachelor of Engineering in Computer Engineering");
        assert_eq!(parts.dates, "Aug 2017 - May 2021");
    }

    #[test]
    fn test_education_abbreviated_degree() {
        let parts = parse_education_line("Georgia Institute of Technology, M.S. Computer Science, 2021 - 2023");
        assert_eq!(parts.university, "Georgia Institute of Technology");
        assert_eq!(parts.degree, "M.S. Computer Science");
        assert_eq!(parts.dates, "2021 - 2023");
    }

    #[test]
    fn test_has_date_hint() {
        assert!(has_date("Acme, Engineer 2021"));
        assert!(has_date("Acme, Engineer | June"));
        assert!(!has_date("Cut p99 latency by 40%"));
        assert!(!has_date("Built a pipeline for 2M events"));
    }

    #[test]
    fn test_split_label_and_skill_key() {
        assert_eq!(
            split_label("Frameworks & Libraries: React, Django"),
            Some(("Frameworks & Libraries".into(), "React, Django".into()))
        );
        assert_eq!(split_label("no colon"), None);
        assert_eq!(skill_key("Frameworks & Libraries"), "frameworks_and_libraries");
        assert_eq!(skill_key("Cloud/DevOps"), "cloud_devops");
        assert_eq!(skill_key("Languages"), "languages");
    }
}
