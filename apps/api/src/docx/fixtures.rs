//! In-memory .docx builders for tests.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const PLAIN: &str = "";
pub const BOLD: &str = "b";
pub const ITALIC: &str = "i";
pub const BOLD_ITALIC: &str = "bi";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const CORE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Resume</dc:title><dc:creator>Jane Doe</dc:creator><dc:subject>Software Engineering</dc:subject></cp:coreProperties>"#;

const SECTION: &str = r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="720" w:right="720" w:bottom="720" w:left="720" w:header="360" w:footer="360" w:gutter="0"/></w:sectPr>"#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// A run in the reference font. `style` holds `b` and/or `i`.
pub fn run(style: &str, text: &str) -> String {
    sized_run(style, 21, text)
}

pub fn sized_run(style: &str, half_points: u32, text: &str) -> String {
    let mut xml = String::from(r#"<w:r><w:rPr><w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman"/>"#);
    if style.contains('b') {
        xml.push_str("<w:b/>");
    }
    if style.contains('i') {
        xml.push_str("<w:i/>");
    }
    xml.push_str(&format!(r#"<w:sz w:val="{half_points}"/><w:lang w:val="en-US"/></w:rPr>"#));
    for (i, piece) in text.split('\t').enumerate() {
        if i > 0 {
            xml.push_str("<w:tab/>");
        }
        if !piece.is_empty() {
            xml.push_str(&format!(r#"<w:t xml:space="preserve">{}</w:t>"#, escape(piece)));
        }
    }
    xml.push_str("</w:r>");
    xml
}

/// A paragraph with raw `w:pPr` content and pre-built runs.
pub fn paragraph(ppr: &str, runs: &[String]) -> String {
    let ppr = if ppr.is_empty() {
        String::new()
    } else {
        format!("<w:pPr>{ppr}</w:pPr>")
    };
    format!("<w:p>{ppr}{}</w:p>", runs.concat())
}

pub fn styled_paragraph(runs: &[(&str, &str)]) -> String {
    let runs: Vec<String> = runs.iter().map(|(style, text)| run(style, text)).collect();
    paragraph(r#"<w:spacing w:after="0" w:line="240" w:lineRule="auto"/>"#, &runs)
}

pub fn package_with_parts(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// A complete package whose body holds `paragraphs` followed by the section.
pub fn docx_from_paragraphs(paragraphs: &[String]) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{}{SECTION}</w:body></w:document>"#,
        paragraphs.concat()
    );
    package_with_parts(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("docProps/core.xml", CORE),
        ("word/document.xml", &document),
    ])
}

/// A one-page résumé in the reference document's shape.
///
/// Paragraph indices:
/// ```text
///  0 name              9 (blank)              18 bullet
///  1 contact line     10 TECHNICAL SKILLS     19 continuation line
///  2 (blank)          11 Languages            20 PROJECT EXPERIENCE
///  3 EDUCATION        12 Frameworks           21 project header
///  4 institution+deg  13 Cloud/DevOps         22 tech stack (single italic run)
///  5 GPA              14 PROFESSIONAL EXP.    23 bullet
///  6 coursework       15 job header (6 runs)  24 LEADERSHIP EXPERIENCE
///  7 institution      16 tech stack           25 leadership header
///  8 degree line      17 bullet               26 bullet
/// ```
pub fn resume_docx() -> Vec<u8> {
    let heading = |text: &str| {
        paragraph(
            r#"<w:keepNext/><w:pBdr><w:bottom w:val="single" w:sz="4" w:space="1" w:color="auto"/></w:pBdr><w:spacing w:before="120" w:after="40"/>"#,
            &[run(BOLD, text)],
        )
    };
    let bullet = |text: &str| {
        paragraph(
            r#"<w:spacing w:after="0"/><w:ind w:left="360" w:hanging="180"/><w:jc w:val="both"/>"#,
            &[run(PLAIN, text)],
        )
    };
    let blank = paragraph("", &[]);

    let paragraphs = vec![
        paragraph(r#"<w:jc w:val="center"/>"#, &[sized_run(BOLD, 32, "Jane Doe")]),
        paragraph(
            r#"<w:spacing w:after="60"/><w:jc w:val="center"/>"#,
            &[run(
                PLAIN,
                "San Francisco, CA | (555) 123-4567 | jane.doe@example.com | linkedin.com/in/janedoe | janedoe.dev",
            )],
        ),
        blank.clone(),
        heading("EDUCATION"),
        styled_paragraph(&[
            (BOLD, "Stanford University"),
            (PLAIN, "\t"),
            (ITALIC, "Master of Science in Computer Science"),
            (PLAIN, "\t"),
            (ITALIC, "Expected May 2025"),
        ]),
        styled_paragraph(&[(BOLD, "Cumulative GPA:"), (PLAIN, " 3.9/4.0")]),
        styled_paragraph(&[
            (BOLD, "Relevant Coursework:"),
            (PLAIN, " Distributed Systems, Machine Learning, Databases"),
        ]),
        styled_paragraph(&[(BOLD, "University of Mumbai")]),
        styled_paragraph(&[
            (ITALIC, "Bachelor of Engineering in Computer Engineering"),
            (ITALIC, "\t"),
            (PLAIN, "  "),
            (ITALIC, "Aug 2017 - May 2021"),
        ]),
        blank,
        heading("TECHNICAL SKILLS"),
        styled_paragraph(&[(BOLD, "Languages:"), (PLAIN, " Python, Java, C++, SQL")]),
        styled_paragraph(&[(BOLD, "Frameworks & Libraries: "), (PLAIN, "React, Django, PyTorch")]),
        styled_paragraph(&[(BOLD, "Cloud/DevOps:"), (PLAIN, " AWS, Docker, Kubernetes")]),
        heading("PROFESSIONAL EXPERIENCE"),
        styled_paragraph(&[
            (BOLD, "Acme Corp, "),
            (ITALIC, "Software Engineer "),
            (BOLD, "| "),
            (PLAIN, "Austin, TX"),
            (PLAIN, "\t\t"),
            (ITALIC, "Jun 2021 - Present"),
        ]),
        styled_paragraph(&[(BOLD, "Tech Stack:"), (PLAIN, " Python, Kafka, PostgreSQL")]),
        bullet("● Built a streaming pipeline processing 2M events per day with Kafka and Flink"),
        bullet("● Cut p99 latency by 40% by redesigning the caching layer"),
        bullet("Mentored two interns on testing practices"),
        heading("PROJECT EXPERIENCE"),
        styled_paragraph(&[
            (BOLD, "Test-Lab, "),
            (ITALIC, "Lead Developer"),
            (PLAIN, "\t"),
            (ITALIC, "Jan 2023 - Mar 2023"),
        ]),
        styled_paragraph(&[(ITALIC, "Tech Stack: Rust, Tokio, gRPC")]),
        bullet("● Designed a distributed test runner for embedded targets"),
        heading("LEADERSHIP EXPERIENCE"),
        styled_paragraph(&[
            (BOLD, "Robotics Club, "),
            (ITALIC, "President"),
            (PLAIN, "\t"),
            (ITALIC, "2019 - 2021"),
        ]),
        bullet("● Organized a regional robotics competition with 30 teams"),
    ];
    docx_from_paragraphs(&paragraphs)
}

/// A cover letter template with placeholder text in every replaceable slot.
///
/// Paragraph indices:
/// ```text
///  0 name            6 [Company Name]      12 [Company knowledge paragraph]
///  1 contact line    7 [Company Address]   13 [Closing paragraph]
///  2 contact line    8 salutation          14 Sincerely,
///  3 [Date]          9 [Opening paragraph] 15 signature
///  4 [Hiring Mgr]   10 [Skills paragraph]
///  5 [Job Title]    11 [Achievements ...]
/// ```
pub fn cover_letter_docx() -> Vec<u8> {
    let line = |style: &str, text: &str| paragraph(r#"<w:spacing w:after="0"/>"#, &[run(style, text)]);
    let body = |text: &str| {
        paragraph(
            r#"<w:spacing w:before="0" w:after="160"/><w:jc w:val="both"/>"#,
            &[run(PLAIN, text)],
        )
    };

    let paragraphs = vec![
        paragraph(r#"<w:jc w:val="center"/>"#, &[sized_run(BOLD, 28, "Jane Doe")]),
        paragraph(r#"<w:jc w:val="center"/>"#, &[run(PLAIN, "San Francisco, CA | (555) 123-4567")]),
        paragraph(
            r#"<w:spacing w:after="240"/><w:jc w:val="center"/>"#,
            &[run(PLAIN, "jane.doe@example.com | linkedin.com/in/janedoe")],
        ),
        paragraph(r#"<w:spacing w:after="240"/>"#, &[run(PLAIN, "[Date]")]),
        line(PLAIN, "[Hiring Manager]"),
        line(ITALIC, "[Job Title]"),
        line(BOLD, "[Company Name]"),
        paragraph(r#"<w:spacing w:after="240"/>"#, &[run(PLAIN, "[Company Address]")]),
        paragraph(r#"<w:spacing w:after="160"/>"#, &[run(PLAIN, "Dear [Hiring Manager],")]),
        body("[Opening paragraph]"),
        body("[Skills paragraph]"),
        body("[Achievements paragraph]"),
        body("[Company knowledge paragraph]"),
        body("[Closing paragraph]"),
        line(PLAIN, "Sincerely,"),
        line(BOLD, "Jane Doe"),
    ];
    docx_from_paragraphs(&paragraphs)
}
