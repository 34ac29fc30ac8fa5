//! Content-to-position extraction.
//!
//! Walks the non-empty paragraphs of the reference document, recognizes section
//! headers, and parses each line into fields of the structural content map. For every
//! line it also derives a style recipe: parsed field values are located in the raw
//! paragraph text, the text between them becomes literals, and each piece is tied to
//! the reference run it came from.
//!
//! Extraction is best-effort over a known document shape. Lines that match nothing
//! are attached to the open entry as bullets or dropped, never rejected.

use regex::Regex;
use tracing::{debug, info, warn};

use super::header::{
    collapse_whitespace, has_date, looks_like_degree, parse_education_line, parse_header_line,
    skill_key, split_label,
};
use super::models::{
    ContactLine, ContentMetadata, EducationEntry, ExperienceEntry, LabeledLine, SegmentPart,
    SkillLine, StructuralContentMap, StyleSegment, StyledLine, TextLine,
};
use crate::docx::document::{paragraph_text, run_text, runs};
use crate::docx::{Docx, DocxError};

pub const BULLET_GLYPHS: &[char] = &['●', '•'];
const TECH_STACK_LABEL: &str = "Tech Stack:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Education,
    Skills,
    Professional,
    Projects,
    Leadership,
}

fn section_header(text: &str) -> Option<Mode> {
    match text.to_uppercase().as_str() {
        "EDUCATION" => Some(Mode::Education),
        "TECHNICAL SKILLS" => Some(Mode::Skills),
        "PROFESSIONAL EXPERIENCE" => Some(Mode::Professional),
        "PROJECT EXPERIENCE" => Some(Mode::Projects),
        "LEADERSHIP EXPERIENCE" => Some(Mode::Leadership),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Recipe derivation
// ────────────────────────────────────────────────────────────────────────────

/// Run texts of one paragraph with their byte ranges in the joined text.
struct RunLayout {
    text: String,
    bounds: Vec<(usize, usize)>,
}

impl RunLayout {
    fn new(run_texts: &[String]) -> Self {
        let mut text = String::new();
        let mut bounds = Vec::with_capacity(run_texts.len());
        for t in run_texts {
            let start = text.len();
            text.push_str(t);
            bounds.push((start, text.len()));
        }
        Self { text, bounds }
    }

    fn run_at(&self, offset: usize) -> usize {
        self.bounds
            .iter()
            .position(|(start, end)| offset >= *start && offset < *end)
            .unwrap_or(0)
    }

    /// Run of the first non-whitespace character in `start..end` (or of `start`).
    fn anchor_run(&self, start: usize, end: usize) -> usize {
        let offset = self.text[start..end]
            .char_indices()
            .find(|(_, c)| !c.is_whitespace())
            .map(|(i, _)| start + i)
            .unwrap_or(start);
        self.run_at(offset)
    }

    /// Splits literal text `start..end` at run boundaries.
    fn literal_pieces(&self, start: usize, end: usize) -> Vec<(SegmentPart, usize)> {
        let mut pieces = Vec::new();
        for (run, (run_start, run_end)) in self.bounds.iter().enumerate() {
            let lo = start.max(*run_start);
            let hi = end.min(*run_end);
            if lo < hi {
                pieces.push((SegmentPart::Literal(self.text[lo..hi].to_string()), run));
            }
        }
        pieces
    }
}

/// Regex matching `value` with any whitespace run between its tokens.
fn value_pattern(value: &str) -> Option<Regex> {
    let tokens: Vec<String> = value.split_whitespace().map(regex::escape).collect();
    if tokens.is_empty() {
        return None;
    }
    Regex::new(&tokens.join(r"\s+")).ok()
}

/// Builds the style recipe of a paragraph from its run texts and the ordered field
/// values parsed out of it. Fields that cannot be located (or are empty) are left
/// out of the recipe.
pub fn derive_recipe(paragraph_index: usize, run_texts: &[String], fields: &[(&str, &str)]) -> StyledLine {
    let layout = RunLayout::new(run_texts);
    let mut pieces: Vec<(SegmentPart, usize)> = Vec::new();
    let mut cursor = 0;

    for (name, value) in fields {
        let Some(pattern) = value_pattern(value) else {
            continue;
        };
        let Some(found) = pattern.find_at(&layout.text, cursor) else {
            warn!(paragraph_index, field = %name, "Field not found in paragraph text, left out of style recipe");
            continue;
        };
        pieces.extend(layout.literal_pieces(cursor, found.start()));
        pieces.push((
            SegmentPart::Field(name.to_string()),
            layout.anchor_run(found.start(), found.end()),
        ));
        cursor = found.end();
    }
    pieces.extend(layout.literal_pieces(cursor, layout.text.len()));

    let mut recipe: Vec<StyleSegment> = Vec::new();
    for (part, run) in pieces {
        match recipe.last_mut() {
            Some(seg) if seg.source_run == run => seg.parts.push(part),
            _ => recipe.push(StyleSegment {
                parts: vec![part],
                source_run: run,
            }),
        }
    }
    if recipe.is_empty() {
        recipe.push(StyleSegment {
            parts: Vec::new(),
            source_run: 0,
        });
    }

    StyledLine {
        paragraph_index,
        recipe,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction
// ────────────────────────────────────────────────────────────────────────────

struct Line {
    index: usize,
    /// Trimmed paragraph text.
    text: String,
    runs: Vec<String>,
}

impl Line {
    fn recipe(&self, fields: &[(&str, &str)]) -> StyledLine {
        derive_recipe(self.index, &self.runs, fields)
    }

    fn text_line(&self, value: String) -> TextLine {
        let line = self.recipe(&[("value", value.as_str())]);
        TextLine { value, line }
    }

    fn labeled_line(&self, label: String, value: String) -> LabeledLine {
        let line = self.recipe(&[("label", label.as_str()), ("value", value.as_str())]);
        LabeledLine { label, value, line }
    }

    /// `Label: value`, or an unlabeled value when the line has no colon.
    fn labeled_or_plain(&self) -> LabeledLine {
        match split_label(&self.text) {
            Some((label, value)) => self.labeled_line(label, value),
            None => self.labeled_line(String::new(), self.text.clone()),
        }
    }

    fn bullet(&self) -> TextLine {
        let value = self
            .text
            .trim_start_matches(BULLET_GLYPHS)
            .trim_start()
            .to_string();
        self.text_line(value)
    }

    fn starts_with_bullet(&self) -> bool {
        self.text.starts_with(BULLET_GLYPHS)
    }
}

pub struct ContentExtractor<'a> {
    docx: &'a Docx,
    source_file: String,
}

impl<'a> ContentExtractor<'a> {
    pub fn new(docx: &'a Docx, source_file: impl Into<String>) -> Self {
        Self {
            docx,
            source_file: source_file.into(),
        }
    }

    fn lines(&self) -> Vec<Line> {
        self.docx
            .paragraphs()
            .enumerate()
            .filter_map(|(index, p)| {
                let text = paragraph_text(p).trim().to_string();
                (!text.is_empty()).then(|| Line {
                    index,
                    text,
                    runs: runs(p).map(run_text).collect(),
                })
            })
            .collect()
    }

    pub fn extract(&self) -> StructuralContentMap {
        let lines = self.lines();
        let mut map = StructuralContentMap {
            metadata: ContentMetadata {
                source_file: self.source_file.clone(),
                total_paragraphs: self.docx.paragraph_count(),
            },
            ..Default::default()
        };

        if let Some(first) = lines.first() {
            map.personal.name = Some(first.text_line(first.text.clone()));
        }
        if let Some(second) = lines.get(1) {
            map.personal.contact = Some(contact_line(second));
        }

        let mut mode: Option<Mode> = None;
        for line in &lines {
            if let Some(next) = section_header(&line.text) {
                mode = Some(next);
                continue;
            }
            match mode {
                Some(Mode::Education) => education_line(&mut map.education, line),
                Some(Mode::Skills) => skill_line(&mut map.skills, line),
                Some(Mode::Professional) => experience_line(&mut map.professional, line, true, true),
                Some(Mode::Projects) => experience_line(&mut map.projects, line, true, false),
                Some(Mode::Leadership) => experience_line(&mut map.leadership, line, false, false),
                None => {}
            }
        }

        info!(
            education = map.education.len(),
            skills = map.skills.len(),
            professional = map.professional.len(),
            projects = map.projects.len(),
            leadership = map.leadership.len(),
            "Extracted structural content map"
        );
        map
    }
}

/// Extracts the structural content map from document bytes.
pub fn extract_content(bytes: &[u8], source_file: &str) -> Result<StructuralContentMap, DocxError> {
    let docx = Docx::from_bytes(bytes)?;
    Ok(ContentExtractor::new(&docx, source_file).extract())
}

fn contact_line(line: &Line) -> ContactLine {
    let mut parts = line.text.split('|').map(str::trim);
    let mut next = || parts.next().unwrap_or_default().to_string();
    let (location, phone, email, linkedin, portfolio) = (next(), next(), next(), next(), next());
    let styled = line.recipe(&[
        ("location", location.as_str()),
        ("phone", phone.as_str()),
        ("email", email.as_str()),
        ("linkedin", linkedin.as_str()),
        ("portfolio", portfolio.as_str()),
    ]);
    ContactLine {
        location,
        phone,
        email,
        linkedin,
        portfolio,
        line: styled,
    }
}

fn education_line(entries: &mut Vec<EducationEntry>, line: &Line) {
    let text = &line.text;
    if ["University", "College", "Institute"].iter().any(|k| text.contains(k)) {
        let parts = parse_education_line(text);
        let institution_line = line.recipe(&[
            ("university", parts.university.as_str()),
            ("degree", parts.degree.as_str()),
            ("dates", parts.dates.as_str()),
        ]);
        entries.push(EducationEntry {
            university: parts.university,
            degree: parts.degree,
            dates: parts.dates,
            institution_line,
            degree_line: None,
            gpa: None,
            coursework: Vec::new(),
        });
        return;
    }

    let Some(entry) = entries.last_mut() else {
        debug!(paragraph_index = line.index, "Education line before any institution, dropped");
        return;
    };
    let lower = text.to_lowercase();
    if lower.contains("gpa") {
        entry.gpa = Some(line.labeled_or_plain());
    } else if lower.contains("coursework") {
        entry.coursework.push(line.labeled_or_plain());
    } else if entry.degree.is_empty() && looks_like_degree(text) {
        let parts = parse_education_line(text);
        if parts.degree.is_empty() {
            debug!(paragraph_index = line.index, "Degree-like line without a degree, dropped");
            return;
        }
        entry.degree_line = Some(line.recipe(&[("degree", parts.degree.as_str()), ("dates", parts.dates.as_str())]));
        entry.degree = parts.degree;
        if !parts.dates.is_empty() {
            entry.dates = parts.dates;
        }
    } else {
        debug!(paragraph_index = line.index, text = %text, "Unrecognized education line, dropped");
    }
}

fn skill_line(skills: &mut Vec<SkillLine>, line: &Line) {
    match split_label(&line.text) {
        Some((label, value)) => skills.push(SkillLine {
            key: unique_skill_key(skills, &label),
            line: line.labeled_line(label, value),
        }),
        None => debug!(paragraph_index = line.index, "Skill line without a label, dropped"),
    }
}

/// Labels that normalize to a taken key get `_2`, `_3`, ... so every `skills.<key>`
/// path addresses exactly one line.
fn unique_skill_key(skills: &[SkillLine], label: &str) -> String {
    let base = skill_key(label);
    let taken = |key: &str| skills.iter().any(|s| s.key == key);
    if !taken(&base) {
        return base;
    }
    let key = (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|k| !taken(k))
        .unwrap_or_default();
    debug!(label, key = %key, "Skill label repeats an existing key");
    key
}

/// One line of an experience-style section.
///
/// `with_tech_stack`: `Tech Stack:` lines attach to the open entry.
/// `pipe_header`: a `|` (not only a comma) marks a header line.
fn experience_line(entries: &mut Vec<ExperienceEntry>, line: &Line, with_tech_stack: bool, pipe_header: bool) {
    let text = &line.text;

    if with_tech_stack && text.contains(TECH_STACK_LABEL) {
        match entries.last_mut() {
            Some(entry) => {
                let value = text.replacen(TECH_STACK_LABEL, "", 1).trim().to_string();
                entry.tech_stack = Some(line.labeled_line("Tech Stack".to_string(), value));
            }
            None => debug!(paragraph_index = line.index, "Tech stack before any entry, dropped"),
        }
        return;
    }

    if !line.starts_with_bullet() {
        let separated = text.contains(',') || (pipe_header && text.contains('|'));
        if has_date(text) && separated {
            let parts = parse_header_line(text);
            let header = line.recipe(&[
                ("organization", parts.entity.as_str()),
                ("role", parts.role.as_str()),
                ("location", parts.location.as_str()),
                ("dates", parts.dates.as_str()),
            ]);
            entries.push(ExperienceEntry {
                organization: parts.entity,
                role: parts.role,
                location: parts.location,
                dates: parts.dates,
                header,
                tech_stack: None,
                bullets: Vec::new(),
            });
            return;
        }
    }

    match entries.last_mut() {
        Some(entry) => entry.bullets.push(line.bullet()),
        None => debug!(paragraph_index = line.index, text = %collapse_whitespace(text), "Line outside any entry, dropped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::models::{PlacementContent, Section};
    use crate::docx::fixtures;

    fn extracted() -> StructuralContentMap {
        extract_content(&fixtures::resume_docx(), "resume.docx").unwrap()
    }

    fn strings(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_derive_recipe_splits_literals_at_run_boundaries() {
        let runs = strings(&["Acme Corp, ", "Software Engineer ", "| ", "Austin, TX", "\t\t", "Jun 2021 - Present"]);
        let line = derive_recipe(
            15,
            &runs,
            &[
                ("organization", "Acme Corp"),
                ("role", "Software Engineer"),
                ("location", "Austin, TX"),
                ("dates", "Jun 2021 - Present"),
            ],
        );
        let runs_used: Vec<usize> = line.source_runs().collect();
        assert_eq!(runs_used, [0, 1, 2, 3, 4, 5]);
        assert_eq!(
            line.recipe[0].parts,
            [SegmentPart::Field("organization".into()), SegmentPart::Literal(", ".into())]
        );
        assert_eq!(line.recipe[2].parts, [SegmentPart::Literal("| ".into())]);
    }

    #[test]
    fn test_derive_recipe_single_run_with_glyph() {
        let line = derive_recipe(3, &strings(&["● Built things"]), &[("value", "Built things")]);
        assert_eq!(line.recipe.len(), 1);
        assert_eq!(
            line.recipe[0].parts,
            [SegmentPart::Literal("● ".into()), SegmentPart::Field("value".into())]
        );
    }

    #[test]
    fn test_derive_recipe_matches_across_collapsed_whitespace() {
        let line = derive_recipe(
            0,
            &strings(&["Robotics Club, ", "President", "\t", "2019 -  2021"]),
            &[("organization", "Robotics Club"), ("role", "President"), ("dates", "2019 - 2021")],
        );
        let last = line.recipe.last().unwrap();
        assert_eq!(last.source_run, 3);
        assert_eq!(last.parts, [SegmentPart::Field("dates".into())]);
    }

    #[test]
    fn test_derive_recipe_leaves_out_missing_fields() {
        let line = derive_recipe(0, &strings(&["Hello world"]), &[("a", "absent"), ("b", "world"), ("c", "")]);
        assert_eq!(
            line.recipe[0].parts,
            [SegmentPart::Literal("Hello ".into()), SegmentPart::Field("b".into())]
        );
    }

    #[test]
    fn test_personal_section() {
        let map = extracted();
        assert_eq!(map.metadata.total_paragraphs, 27);
        let name = map.personal.name.as_ref().unwrap();
        assert_eq!(name.value, "Jane Doe");
        assert_eq!(name.line.paragraph_index, 0);

        let contact = map.personal.contact.as_ref().unwrap();
        assert_eq!(contact.location, "San Francisco, CA");
        assert_eq!(contact.phone, "(555) 123-4567");
        assert_eq!(contact.email, "jane.doe@example.com");
        assert_eq!(contact.portfolio, "janedoe.dev");
        assert_eq!(contact.line.recipe.len(), 1);
    }

    #[test]
    fn test_education_section() {
        let map = extracted();
        assert_eq!(map.education.len(), 2);

        let first = &map.education[0];
        assert_eq!(first.university, "Stanford University");
        assert_eq!(first.degree, "Master of Science in Computer Science");
        assert_eq!(first.dates, "Expected May 2025");
        assert_eq!(first.institution_line.paragraph_index, 4);
        let gpa = first.gpa.as_ref().unwrap();
        assert_eq!((gpa.label.as_str(), gpa.value.as_str()), ("Cumulative GPA", "3.9/4.0"));
        assert_eq!(first.coursework.len(), 1);
        assert_eq!(first.coursework[0].line.paragraph_index, 6);

        let second = &map.education[1];
        assert_eq!(second.university, "University of Mumbai");
        assert_eq!(second.degree, "Bachelor of Engineering in Computer Engineering");
        assert_eq!(second.dates, "Aug 2017 - May 2021");
        assert_eq!(second.degree_line.as_ref().unwrap().paragraph_index, 8);
    }

    #[test]
    fn test_skills_section() {
        let map = extracted();
        let keys: Vec<&str> = map.skills.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["languages", "frameworks_and_libraries", "cloud_devops"]);
        let languages = map.skill("languages").unwrap();
        assert_eq!(languages.line.label, "Languages");
        assert_eq!(languages.line.value, "Python, Java, C++, SQL");
        let placement = languages.line.line.placement("skills.languages".into(), &languages.line);
        assert_eq!(
            placement.content,
            PlacementContent::Segments(vec![
                ("Languages:".into(), 0),
                (" Python, Java, C++, SQL".into(), 1),
            ])
        );
    }

    #[test]
    fn test_professional_section() {
        let map = extracted();
        assert_eq!(map.professional.len(), 1);
        let job = &map.professional[0];
        assert_eq!(job.organization, "Acme Corp");
        assert_eq!(job.role, "Software Engineer");
        assert_eq!(job.location, "Austin, TX");
        assert_eq!(job.dates, "Jun 2021 - Present");
        assert_eq!(job.header.recipe.len(), 6);
        assert_eq!(job.tech_stack.as_ref().unwrap().value, "Python, Kafka, PostgreSQL");

        let bullets: Vec<&str> = job.bullets.iter().map(|b| b.value.as_str()).collect();
        assert_eq!(
            bullets,
            [
                "Built a streaming pipeline processing 2M events per day with Kafka and Flink",
                "Cut p99 latency by 40% by redesigning the caching layer",
                "Mentored two interns on testing practices",
            ]
        );
    }

    #[test]
    fn test_projects_and_leadership_sections() {
        let map = extracted();
        let project = &map.projects[0];
        assert_eq!(project.organization, "Test-Lab");
        assert_eq!(project.role, "Lead Developer");
        assert_eq!(project.dates, "Jan 2023 - Mar 2023");
        let tech = project.tech_stack.as_ref().unwrap();
        assert_eq!(tech.value, "Rust, Tokio, gRPC");
        // Whole line is one italic run.
        assert_eq!(tech.line.recipe.len(), 1);
        assert_eq!(project.bullets.len(), 1);

        let lead = &map.leadership[0];
        assert_eq!(lead.organization, "Robotics Club");
        assert_eq!(lead.role, "President");
        assert_eq!(lead.dates, "2019 - 2021");
        assert_eq!(lead.bullets.len(), 1);
    }

    #[test]
    fn test_prefixes_come_from_recipes() {
        let map = extracted();
        let prefix = |p: &str| map.prefix_for(&p.parse().unwrap());
        assert_eq!(prefix("skills.languages").as_deref(), Some("Languages: "));
        assert_eq!(prefix("professional[0].tech_stack").as_deref(), Some("Tech Stack: "));
        assert_eq!(prefix("professional[0].bullets[0]").as_deref(), Some("● "));
        assert_eq!(prefix("professional[0].bullets[2]").as_deref(), Some(""));
        assert_eq!(prefix("projects[0].tech_stack").as_deref(), Some("Tech Stack: "));
    }

    #[test]
    fn test_placements_render_original_text() {
        let bytes = fixtures::resume_docx();
        let docx = Docx::from_bytes(&bytes).unwrap();
        let map = ContentExtractor::new(&docx, "resume.docx").extract();
        for placement in map.placements() {
            let original = paragraph_text(docx.paragraph(placement.paragraph_index).unwrap());
            let rendered: String = match &placement.content {
                PlacementContent::Single(text) => text.clone(),
                PlacementContent::Segments(segments) => segments.iter().map(|(t, _)| t.as_str()).collect(),
            };
            assert_eq!(rendered, original, "{}", placement.field);
        }
    }

    #[test]
    fn test_colliding_skill_labels_get_distinct_keys() {
        let paragraphs = vec![
            fixtures::styled_paragraph(&[(fixtures::BOLD, "Jane Doe")]),
            fixtures::styled_paragraph(&[(fixtures::PLAIN, "City | 555 | a@b.c | in/x | x.dev")]),
            fixtures::styled_paragraph(&[(fixtures::BOLD, "TECHNICAL SKILLS")]),
            fixtures::styled_paragraph(&[(fixtures::BOLD, "Cloud/DevOps:"), (fixtures::PLAIN, " AWS")]),
            fixtures::styled_paragraph(&[(fixtures::BOLD, "Cloud DevOps:"), (fixtures::PLAIN, " GCP")]),
            fixtures::styled_paragraph(&[(fixtures::BOLD, "Cloud devops:"), (fixtures::PLAIN, " Azure")]),
        ];
        let mut map = extract_content(&fixtures::docx_from_paragraphs(&paragraphs), "x.docx").unwrap();
        let keys: Vec<&str> = map.skills.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["cloud_devops", "cloud_devops_2", "cloud_devops_3"]);

        let second = crate::content::models::FieldPath::Skill("cloud_devops_2".into());
        *map.get_mut(&second).unwrap() = "GCP, Terraform".into();
        assert_eq!(map.skill("cloud_devops").unwrap().line.value, "AWS");
        assert_eq!(map.skill("cloud_devops_2").unwrap().line.value, "GCP, Terraform");
        assert_eq!(map.skill("cloud_devops_3").unwrap().line.value, "Azure");
    }

    #[test]
    fn test_lines_outside_entries_are_dropped() {
        let paragraphs = vec![
            fixtures::styled_paragraph(&[(fixtures::BOLD, "Jane Doe")]),
            fixtures::styled_paragraph(&[(fixtures::PLAIN, "City | 555 | a@b.c | in/x | x.dev")]),
            fixtures::styled_paragraph(&[(fixtures::BOLD, "PROFESSIONAL EXPERIENCE")]),
            fixtures::styled_paragraph(&[(fixtures::PLAIN, "● Orphan bullet")]),
            fixtures::styled_paragraph(&[(fixtures::PLAIN, "Tech Stack: Go")]),
            fixtures::styled_paragraph(&[(fixtures::BOLD, "Globex, Analyst | Remote 2020 - 2021")]),
            fixtures::styled_paragraph(&[(fixtures::PLAIN, "● Real bullet")]),
        ];
        let map = extract_content(&fixtures::docx_from_paragraphs(&paragraphs), "x.docx").unwrap();
        assert_eq!(map.professional.len(), 1);
        assert_eq!(map.professional[0].bullets.len(), 1);
        assert!(map.professional[0].tech_stack.is_none());
        assert!(map.professional.iter().all(|e| e.organization == "Globex"));
        assert_eq!(map.editable_paths().len(), 1);
        assert_eq!(
            map.editable_paths()[0],
            crate::content::models::FieldPath::Bullet { section: Section::Professional, entry: 0, bullet: 0 }
        );
    }
}
