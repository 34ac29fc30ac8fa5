// Prompts for the résumé tailoring transform.
// Placeholders are replaced with `str::replace` before sending; every prompt here
// asks for the flat `fields` shape that `transform::normalize_reply` expects first.

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, LIMIT_INSTRUCTION};

pub const TAILOR_SYSTEM_ROLE: &str = "You are an expert ATS (applicant tracking system) \
    résumé optimizer. You rewrite a fixed set of résumé fields so that they match a job \
    description while keeping every claim true to the original text.";

/// Builds the system prompt: role plus the JSON-only rule.
pub fn tailor_system() -> String {
    format!("{TAILOR_SYSTEM_ROLE}\n\n{JSON_ONLY_SYSTEM}")
}

/// Placeholders: `{job_description}`, `{fields_json}`, `{limits_json}`, `{limit_instruction}`.
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"Tailor the résumé fields below to the job description.

JOB DESCRIPTION:
{job_description}

CURRENT FIELD VALUES (field path -> text):
{fields_json}

MAXIMUM CHARACTERS PER FIELD (field path -> limit):
{limits_json}

{limit_instruction}

RULES:
1. Additive keyword strategy: keep the relevant terms already present and add the
   job's missing keywords. Replace a term only when a field would exceed its limit.
2. Skills fields are comma-separated lists. Keep the list format.
3. Tech stack fields are comma-separated lists of technologies.
4. Bullets stay single sentences in past tense, starting with a strong verb. Keep
   every number and metric that is already there.
5. Only return field paths that appear in CURRENT FIELD VALUES. Never invent new
   skill categories, entries or bullets. Names, contact details, education,
   organizations, roles and dates are not yours to change.
6. A field you leave as-is may be omitted.

Return exactly this JSON shape:
{
  "fields": {
    "skills.languages": "...",
    "professional[0].tech_stack": "...",
    "professional[0].bullets[0]": "..."
  },
  "report": {
    "keywords_extracted": ["keyword", "..."],
    "keywords_added": ["keyword", "..."],
    "match_score_estimate": "90%",
    "changes_summary": "One or two sentences."
  }
}"#;
