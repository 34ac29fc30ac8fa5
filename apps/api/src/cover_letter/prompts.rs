// Prompt for drafting a cover letter in one call.
// Placeholders are replaced with `str::replace`; the reply shape is what
// `writer::normalize_letter` reads.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

pub const LETTER_SYSTEM_ROLE: &str = "You are an experienced career coach who writes \
    short, specific cover letters. You only claim experience, skills and results that \
    the résumé supports.";

pub fn letter_system() -> String {
    format!("{LETTER_SYSTEM_ROLE}\n\n{JSON_ONLY_SYSTEM}")
}

/// Placeholders: `{job_description}`, `{resume_text}`, `{context}`, `{max_words}`.
pub const LETTER_PROMPT_TEMPLATE: &str = r#"Write a cover letter for the job below.

JOB DESCRIPTION:
{job_description}

RÉSUMÉ:
{resume_text}

ADDITIONAL CONTEXT FROM THE APPLICANT:
{context}

First extract from the job description, using null for anything it does not state:
the company name, the job title, the hiring manager's name and the company address.

Then write five paragraphs, each at most {max_words} words, complete and polished,
with no placeholders such as [Company]:
1. opening: enthusiasm for this specific position and why the applicant fits.
2. skills: the most relevant technical skills, with concrete metrics from the résumé.
3. achievements: specific projects and their measurable impact, tied to this role.
4. company_knowledge: the company's mission or work and why the applicant wants to join.
5. closing: renewed interest, a request to discuss the role, thanks.

Return exactly this JSON shape:
{
  "recipient": {
    "company_name": "..." or null,
    "job_title": "..." or null,
    "hiring_manager": "..." or null,
    "company_address": "..." or null
  },
  "paragraphs": {
    "opening": "...",
    "skills": "...",
    "achievements": "...",
    "company_knowledge": "...",
    "closing": "..."
  }
}"#;
