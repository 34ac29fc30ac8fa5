//! The structural content map: résumé fields tagged with the paragraph that holds them
//! and a style recipe describing which reference run styles which part of the line.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Style recipes
// ────────────────────────────────────────────────────────────────────────────

/// One piece of a rendered line: a named field of the owning entry, or fixed text
/// (separators, bullet glyphs, tab padding) copied from the reference line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentPart {
    Field(String),
    Literal(String),
}

/// Consecutive parts rendered into one run, styled like reference run `source_run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSegment {
    pub parts: Vec<SegmentPart>,
    pub source_run: usize,
}

/// Where a line lives and how to rebuild it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledLine {
    pub paragraph_index: usize,
    pub recipe: Vec<StyleSegment>,
}

/// Field values of whatever owns a [`StyledLine`].
pub trait LineFields {
    fn field_value(&self, name: &str) -> Option<&str>;
}

impl StyledLine {
    /// A line whose parts all take the style of the first run.
    pub fn single(paragraph_index: usize, parts: Vec<SegmentPart>) -> Self {
        Self {
            paragraph_index,
            recipe: vec![StyleSegment {
                parts,
                source_run: 0,
            }],
        }
    }

    fn render_parts(parts: &[SegmentPart], owner: &dyn LineFields) -> String {
        parts
            .iter()
            .map(|part| match part {
                SegmentPart::Field(name) => owner.field_value(name).unwrap_or_default(),
                SegmentPart::Literal(text) => text.as_str(),
            })
            .collect()
    }

    /// `(text, source_run)` pairs for the current field values.
    pub fn render(&self, owner: &dyn LineFields) -> Vec<(String, usize)> {
        self.recipe
            .iter()
            .map(|seg| (Self::render_parts(&seg.parts, owner), seg.source_run))
            .collect()
    }

    pub fn text(&self, owner: &dyn LineFields) -> String {
        self.render(owner).into_iter().map(|(text, _)| text).collect()
    }

    /// Everything rendered on the line before `field`, or `None` when the recipe does
    /// not mention the field.
    pub fn prefix_before(&self, owner: &dyn LineFields, field: &str) -> Option<String> {
        let mut prefix = String::new();
        for part in self.recipe.iter().flat_map(|seg| &seg.parts) {
            match part {
                SegmentPart::Field(name) if name == field => return Some(prefix),
                SegmentPart::Field(name) => prefix.push_str(owner.field_value(name).unwrap_or_default()),
                SegmentPart::Literal(text) => prefix.push_str(text),
            }
        }
        None
    }

    /// The run indices this line borrows styles from.
    pub fn source_runs(&self) -> impl Iterator<Item = usize> + '_ {
        self.recipe.iter().map(|seg| seg.source_run)
    }

    /// Rebuild instruction for the current values. A recipe with one segment styled
    /// by run 0 is a plain single-run replacement.
    pub fn placement(&self, field: String, owner: &dyn LineFields) -> Placement {
        let content = match self.recipe.as_slice() {
            [only] if only.source_run == 0 => {
                PlacementContent::Single(Self::render_parts(&only.parts, owner))
            }
            _ => PlacementContent::Segments(self.render(owner)),
        };
        Placement {
            field,
            paragraph_index: self.paragraph_index,
            content,
        }
    }
}

/// One paragraph rewrite handed to the rebuilder.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Path of the line, e.g. `skills.languages` or `professional[0].header`.
    pub field: String,
    pub paragraph_index: usize,
    pub content: PlacementContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlacementContent {
    Single(String),
    Segments(Vec<(String, usize)>),
}

// ────────────────────────────────────────────────────────────────────────────
// Lines
// ────────────────────────────────────────────────────────────────────────────

/// A line holding one free-text value (name, bullet). Recipe field: `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub value: String,
    #[serde(flatten)]
    pub line: StyledLine,
}

impl LineFields for TextLine {
    fn field_value(&self, name: &str) -> Option<&str> {
        (name == "value").then_some(self.value.as_str())
    }
}

/// A `Label: value` line (skills, tech stack, GPA, coursework).
/// Recipe fields: `label`, `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledLine {
    pub label: String,
    pub value: String,
    #[serde(flatten)]
    pub line: StyledLine,
}

impl LineFields for LabeledLine {
    fn field_value(&self, name: &str) -> Option<&str> {
        match name {
            "label" => Some(&self.label),
            "value" => Some(&self.value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillLine {
    /// Normalized label: lowercase, `&` → `and`, spaces and `/` → `_`.
    pub key: String,
    #[serde(flatten)]
    pub line: LabeledLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPart {
    Location,
    Phone,
    Email,
    Linkedin,
    Portfolio,
}

impl ContactPart {
    pub const ALL: [ContactPart; 5] = [
        ContactPart::Location,
        ContactPart::Phone,
        ContactPart::Email,
        ContactPart::Linkedin,
        ContactPart::Portfolio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactPart::Location => "location",
            ContactPart::Phone => "phone",
            ContactPart::Email => "email",
            ContactPart::Linkedin => "linkedin",
            ContactPart::Portfolio => "portfolio",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

/// `location | phone | email | linkedin | portfolio`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactLine {
    pub location: String,
    pub phone: String,
    pub email: String,
    pub linkedin: String,
    pub portfolio: String,
    #[serde(flatten)]
    pub line: StyledLine,
}

impl ContactLine {
    pub fn part(&self, part: ContactPart) -> &str {
        match part {
            ContactPart::Location => &self.location,
            ContactPart::Phone => &self.phone,
            ContactPart::Email => &self.email,
            ContactPart::Linkedin => &self.linkedin,
            ContactPart::Portfolio => &self.portfolio,
        }
    }

    pub fn part_mut(&mut self, part: ContactPart) -> &mut String {
        match part {
            ContactPart::Location => &mut self.location,
            ContactPart::Phone => &mut self.phone,
            ContactPart::Email => &mut self.email,
            ContactPart::Linkedin => &mut self.linkedin,
            ContactPart::Portfolio => &mut self.portfolio,
        }
    }
}

impl LineFields for ContactLine {
    fn field_value(&self, name: &str) -> Option<&str> {
        ContactPart::parse(name).map(|p| self.part(p))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Personal {
    pub name: Option<TextLine>,
    pub contact: Option<ContactLine>,
}

/// Institution line fields: `university`, `degree`, `dates`. The optional degree
/// line (when the degree sits on its own paragraph) uses `degree` and `dates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub university: String,
    pub degree: String,
    pub dates: String,
    pub institution_line: StyledLine,
    pub degree_line: Option<StyledLine>,
    pub gpa: Option<LabeledLine>,
    #[serde(default)]
    pub coursework: Vec<LabeledLine>,
}

impl LineFields for EducationEntry {
    fn field_value(&self, name: &str) -> Option<&str> {
        match name {
            "university" => Some(&self.university),
            "degree" => Some(&self.degree),
            "dates" => Some(&self.dates),
            _ => None,
        }
    }
}

/// A job, project or leadership role. For projects `organization` is the project
/// name; for leadership `role` is the title.
/// Header line fields: `organization`, `role`, `location`, `dates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub organization: String,
    pub role: String,
    #[serde(default)]
    pub location: String,
    pub dates: String,
    pub header: StyledLine,
    pub tech_stack: Option<LabeledLine>,
    #[serde(default)]
    pub bullets: Vec<TextLine>,
}

impl LineFields for ExperienceEntry {
    fn field_value(&self, name: &str) -> Option<&str> {
        match name {
            "organization" => Some(&self.organization),
            "role" => Some(&self.role),
            "location" => Some(&self.location),
            "dates" => Some(&self.dates),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Professional,
    Projects,
    Leadership,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Professional, Section::Projects, Section::Leadership];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Professional => "professional",
            Section::Projects => "projects",
            Section::Leadership => "leadership",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sec| sec.as_str() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub source_file: String,
    pub total_paragraphs: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructuralContentMap {
    pub metadata: ContentMetadata,
    pub personal: Personal,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub skills: Vec<SkillLine>,
    #[serde(default)]
    pub professional: Vec<ExperienceEntry>,
    #[serde(default)]
    pub projects: Vec<ExperienceEntry>,
    #[serde(default)]
    pub leadership: Vec<ExperienceEntry>,
}

// ────────────────────────────────────────────────────────────────────────────
// Field paths
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryField {
    Organization,
    Role,
    Location,
    Dates,
}

impl EntryField {
    fn as_str(&self) -> &'static str {
        match self {
            EntryField::Organization => "organization",
            EntryField::Role => "role",
            EntryField::Location => "location",
            EntryField::Dates => "dates",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EducationField {
    University,
    Degree,
    Dates,
    Gpa,
}

impl EducationField {
    fn as_str(&self) -> &'static str {
        match self {
            EducationField::University => "university",
            EducationField::Degree => "degree",
            EducationField::Dates => "dates",
            EducationField::Gpa => "gpa",
        }
    }
}

/// Address of one editable value, written as e.g. `skills.languages`,
/// `professional[0].bullets[2]` or `personal.contact.email`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldPath {
    Name,
    Contact(ContactPart),
    Skill(String),
    TechStack { section: Section, entry: usize },
    Bullet { section: Section, entry: usize, bullet: usize },
    Entry { section: Section, entry: usize, field: EntryField },
    Education { entry: usize, field: EducationField },
    Coursework { entry: usize, line: usize },
}

impl FieldPath {
    /// Only skills, tech stacks and bullets may be proposed by the text transform;
    /// names, contact details, education and entry identity stay as written.
    pub fn is_transform_editable(&self) -> bool {
        matches!(
            self,
            FieldPath::Skill(_) | FieldPath::TechStack { .. } | FieldPath::Bullet { .. }
        )
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Name => write!(f, "personal.name"),
            FieldPath::Contact(part) => write!(f, "personal.contact.{}", part.as_str()),
            FieldPath::Skill(key) => write!(f, "skills.{key}"),
            FieldPath::TechStack { section, entry } => {
                write!(f, "{}[{entry}].tech_stack", section.as_str())
            }
            FieldPath::Bullet { section, entry, bullet } => {
                write!(f, "{}[{entry}].bullets[{bullet}]", section.as_str())
            }
            FieldPath::Entry { section, entry, field } => {
                write!(f, "{}[{entry}].{}", section.as_str(), field.as_str())
            }
            FieldPath::Education { entry, field } => {
                write!(f, "education[{entry}].{}", field.as_str())
            }
            FieldPath::Coursework { entry, line } => {
                write!(f, "education[{entry}].coursework[{line}]")
            }
        }
    }
}

static ENTRY_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(professional|projects|leadership)\[(\d+)\]\.(tech_stack|organization|role|location|dates|bullets\[(\d+)\])$")
        .expect("valid entry path regex")
});

static EDUCATION_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^education\[(\d+)\]\.(university|degree|dates|gpa|coursework\[(\d+)\])$")
        .expect("valid education path regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized field path: {0}")]
pub struct FieldPathError(pub String);

impl FromStr for FieldPath {
    type Err = FieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || FieldPathError(s.to_string());
        let s = s.trim();

        if s == "personal.name" {
            return Ok(FieldPath::Name);
        }
        if let Some(part) = s.strip_prefix("personal.contact.") {
            return ContactPart::parse(part).map(FieldPath::Contact).ok_or_else(err);
        }
        if let Some(key) = s.strip_prefix("skills.") {
            if key.is_empty() {
                return Err(err());
            }
            return Ok(FieldPath::Skill(key.to_string()));
        }

        let index = |m: Option<regex::Match<'_>>| m.and_then(|m| m.as_str().parse::<usize>().ok());

        if let Some(caps) = ENTRY_PATH.captures(s) {
            let section = Section::parse(&caps[1]).ok_or_else(err)?;
            let entry = index(caps.get(2)).ok_or_else(err)?;
            let field = match &caps[3] {
                "tech_stack" => return Ok(FieldPath::TechStack { section, entry }),
                "organization" => EntryField::Organization,
                "role" => EntryField::Role,
                "location" => EntryField::Location,
                "dates" => EntryField::Dates,
                _ => {
                    let bullet = index(caps.get(4)).ok_or_else(err)?;
                    return Ok(FieldPath::Bullet { section, entry, bullet });
                }
            };
            return Ok(FieldPath::Entry { section, entry, field });
        }

        if let Some(caps) = EDUCATION_PATH.captures(s) {
            let entry = index(caps.get(1)).ok_or_else(err)?;
            let field = match &caps[2] {
                "university" => EducationField::University,
                "degree" => EducationField::Degree,
                "dates" => EducationField::Dates,
                "gpa" => EducationField::Gpa,
                _ => {
                    let line = index(caps.get(3)).ok_or_else(err)?;
                    return Ok(FieldPath::Coursework { entry, line });
                }
            };
            return Ok(FieldPath::Education { entry, field });
        }

        Err(err())
    }
}

impl TryFrom<String> for FieldPath {
    type Error = FieldPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Access
// ────────────────────────────────────────────────────────────────────────────

impl StructuralContentMap {
    fn section(&self, section: Section) -> &[ExperienceEntry] {
        match section {
            Section::Professional => &self.professional,
            Section::Projects => &self.projects,
            Section::Leadership => &self.leadership,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut Vec<ExperienceEntry> {
        match section {
            Section::Professional => &mut self.professional,
            Section::Projects => &mut self.projects,
            Section::Leadership => &mut self.leadership,
        }
    }

    pub fn skill(&self, key: &str) -> Option<&SkillLine> {
        self.skills.iter().find(|s| s.key == key)
    }

    /// Current value at `path`, or `None` when the path does not exist in this map.
    pub fn get(&self, path: &FieldPath) -> Option<&str> {
        match path {
            FieldPath::Name => self.personal.name.as_ref().map(|n| n.value.as_str()),
            FieldPath::Contact(part) => self.personal.contact.as_ref().map(|c| c.part(*part)),
            FieldPath::Skill(key) => self.skill(key).map(|s| s.line.value.as_str()),
            FieldPath::TechStack { section, entry } => self
                .section(*section)
                .get(*entry)?
                .tech_stack
                .as_ref()
                .map(|t| t.value.as_str()),
            FieldPath::Bullet { section, entry, bullet } => self
                .section(*section)
                .get(*entry)?
                .bullets
                .get(*bullet)
                .map(|b| b.value.as_str()),
            FieldPath::Entry { section, entry, field } => self
                .section(*section)
                .get(*entry)?
                .field_value(field.as_str()),
            FieldPath::Education { entry, field } => {
                let edu = self.education.get(*entry)?;
                match field {
                    EducationField::Gpa => edu.gpa.as_ref().map(|g| g.value.as_str()),
                    other => edu.field_value(other.as_str()),
                }
            }
            FieldPath::Coursework { entry, line } => self
                .education
                .get(*entry)?
                .coursework
                .get(*line)
                .map(|c| c.value.as_str()),
        }
    }

    /// Mutable slot at `path`; `None` when the path does not exist in this map.
    pub fn get_mut(&mut self, path: &FieldPath) -> Option<&mut String> {
        match path {
            FieldPath::Name => self.personal.name.as_mut().map(|n| &mut n.value),
            FieldPath::Contact(part) => self.personal.contact.as_mut().map(|c| c.part_mut(*part)),
            FieldPath::Skill(key) => self
                .skills
                .iter_mut()
                .find(|s| &s.key == key)
                .map(|s| &mut s.line.value),
            FieldPath::TechStack { section, entry } => self
                .section_mut(*section)
                .get_mut(*entry)?
                .tech_stack
                .as_mut()
                .map(|t| &mut t.value),
            FieldPath::Bullet { section, entry, bullet } => self
                .section_mut(*section)
                .get_mut(*entry)?
                .bullets
                .get_mut(*bullet)
                .map(|b| &mut b.value),
            FieldPath::Entry { section, entry, field } => {
                let e = self.section_mut(*section).get_mut(*entry)?;
                Some(match field {
                    EntryField::Organization => &mut e.organization,
                    EntryField::Role => &mut e.role,
                    EntryField::Location => &mut e.location,
                    EntryField::Dates => &mut e.dates,
                })
            }
            FieldPath::Education { entry, field } => {
                let edu = self.education.get_mut(*entry)?;
                match field {
                    EducationField::University => Some(&mut edu.university),
                    EducationField::Degree => Some(&mut edu.degree),
                    EducationField::Dates => Some(&mut edu.dates),
                    EducationField::Gpa => edu.gpa.as_mut().map(|g| &mut g.value),
                }
            }
            FieldPath::Coursework { entry, line } => self
                .education
                .get_mut(*entry)?
                .coursework
                .get_mut(*line)
                .map(|c| &mut c.value),
        }
    }

    /// Every field the text transform may rewrite, in document order.
    pub fn editable_paths(&self) -> Vec<FieldPath> {
        let mut paths: Vec<FieldPath> = self
            .skills
            .iter()
            .map(|s| FieldPath::Skill(s.key.clone()))
            .collect();
        for section in Section::ALL {
            for (entry, e) in self.section(section).iter().enumerate() {
                if e.tech_stack.is_some() {
                    paths.push(FieldPath::TechStack { section, entry });
                }
                paths.extend((0..e.bullets.len()).map(|bullet| FieldPath::Bullet {
                    section,
                    entry,
                    bullet,
                }));
            }
        }
        paths
    }

    /// Text rendered on the same line before the value at `path` (e.g. `"Languages: "`
    /// or the bullet glyph). `None` for paths without a line of their own.
    pub fn prefix_for(&self, path: &FieldPath) -> Option<String> {
        match path {
            FieldPath::Name => {
                let name = self.personal.name.as_ref()?;
                name.line.prefix_before(name, "value")
            }
            FieldPath::Contact(part) => {
                let contact = self.personal.contact.as_ref()?;
                contact.line.prefix_before(contact, part.as_str())
            }
            FieldPath::Skill(key) => {
                let skill = self.skill(key)?;
                skill.line.line.prefix_before(&skill.line, "value")
            }
            FieldPath::TechStack { section, entry } => {
                let tech = self.section(*section).get(*entry)?.tech_stack.as_ref()?;
                tech.line.prefix_before(tech, "value")
            }
            FieldPath::Bullet { section, entry, bullet } => {
                let line = self.section(*section).get(*entry)?.bullets.get(*bullet)?;
                line.line.prefix_before(line, "value")
            }
            FieldPath::Entry { section, entry, field } => {
                let e = self.section(*section).get(*entry)?;
                e.header.prefix_before(e, field.as_str())
            }
            FieldPath::Education { .. } | FieldPath::Coursework { .. } => None,
        }
    }

    /// Rebuild instructions for every line in the map, in document order of sections.
    pub fn placements(&self) -> Vec<Placement> {
        let mut out = Vec::new();

        if let Some(name) = &self.personal.name {
            out.push(name.line.placement(FieldPath::Name.to_string(), name));
        }
        if let Some(contact) = &self.personal.contact {
            out.push(contact.line.placement("personal.contact".to_string(), contact));
        }

        for (i, edu) in self.education.iter().enumerate() {
            out.push(edu.institution_line.placement(format!("education[{i}].institution"), edu));
            if let Some(line) = &edu.degree_line {
                out.push(line.placement(format!("education[{i}].degree_line"), edu));
            }
            if let Some(gpa) = &edu.gpa {
                out.push(gpa.line.placement(format!("education[{i}].gpa"), gpa));
            }
            for (j, course) in edu.coursework.iter().enumerate() {
                out.push(course.line.placement(format!("education[{i}].coursework[{j}]"), course));
            }
        }

        for skill in &self.skills {
            out.push(skill.line.line.placement(format!("skills.{}", skill.key), &skill.line));
        }

        for section in Section::ALL {
            for (i, entry) in self.section(section).iter().enumerate() {
                let base = format!("{}[{i}]", section.as_str());
                out.push(entry.header.placement(format!("{base}.header"), entry));
                if let Some(tech) = &entry.tech_stack {
                    out.push(tech.line.placement(format!("{base}.tech_stack"), tech));
                }
                for (j, bullet) in entry.bullets.iter().enumerate() {
                    out.push(bullet.line.placement(format!("{base}.bullets[{j}]"), bullet));
                }
            }
        }
        out
    }

    /// Every `(paragraph_index, source_run)` the recipes reference.
    pub fn style_references(&self) -> Vec<(String, usize, usize)> {
        let mut refs = Vec::new();
        let mut push = |field: String, line: &StyledLine| {
            refs.extend(line.source_runs().map(|run| (field.clone(), line.paragraph_index, run)));
        };
        if let Some(name) = &self.personal.name {
            push("personal.name".to_string(), &name.line);
        }
        if let Some(contact) = &self.personal.contact {
            push("personal.contact".to_string(), &contact.line);
        }
        for (i, edu) in self.education.iter().enumerate() {
            push(format!("education[{i}].institution"), &edu.institution_line);
            if let Some(line) = &edu.degree_line {
                push(format!("education[{i}].degree_line"), line);
            }
            if let Some(gpa) = &edu.gpa {
                push(format!("education[{i}].gpa"), &gpa.line);
            }
            for (j, c) in edu.coursework.iter().enumerate() {
                push(format!("education[{i}].coursework[{j}]"), &c.line);
            }
        }
        for skill in &self.skills {
            push(format!("skills.{}", skill.key), &skill.line.line);
        }
        for section in Section::ALL {
            for (i, entry) in self.section(section).iter().enumerate() {
                let base = format!("{}[{i}]", section.as_str());
                push(format!("{base}.header"), &entry.header);
                if let Some(tech) = &entry.tech_stack {
                    push(format!("{base}.tech_stack"), &tech.line);
                }
                for (j, b) in entry.bullets.iter().enumerate() {
                    push(format!("{base}.bullets[{j}]"), &b.line);
                }
            }
        }
        refs
    }
}
