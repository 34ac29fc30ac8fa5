// Shared prompt constants and prompt-building utilities.
// The tailoring prompts live in tailoring/prompts.rs and reuse these fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Common instruction for every prompt that shows per-field character limits.
pub const LIMIT_INSTRUCTION: &str = "\
    CRITICAL: Every field has a maximum character count, already reduced by a safety \
    margin. A value longer than its limit breaks the page layout and is flagged. \
    Count characters before answering and stay a few characters below each limit.";
