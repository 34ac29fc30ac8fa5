//! Per-field limits over a whole content map.
//!
//! The line count of every field is detected from the *reference* map (how the
//! template rendered), so a field that wrapped to two lines in the template keeps a
//! two-line budget however the draft changes.

use std::collections::BTreeMap;

use crate::content::models::{FieldPath, StructuralContentMap};
use crate::layout::{AdaptiveLimiter, FieldLimit};

/// Share of a limit shown to the text transform.
pub const TRANSFORM_MARGIN: f64 = 0.8;

/// Prefix assumed for bullets whose glyph is not part of the paragraph text
/// (list numbering draws it).
pub const BULLET_PREFIX: &str = "• ";

/// Key of the whole contact line in a limits map.
pub const CONTACT_FIELD: &str = "personal.contact";

/// Limit of one field path, or `None` when the draft does not have it.
pub fn limit_for(
    limiter: &AdaptiveLimiter,
    draft: &StructuralContentMap,
    reference: &StructuralContentMap,
    path: &FieldPath,
) -> Option<FieldLimit> {
    let current = draft.get(path)?;
    let prefix = match (path, draft.prefix_for(path)) {
        (FieldPath::Bullet { .. }, Some(p)) if p.trim().is_empty() => BULLET_PREFIX.to_string(),
        (FieldPath::Bullet { .. }, None) => BULLET_PREFIX.to_string(),
        (_, p) => p.unwrap_or_default(),
    };
    let reference_text = reference.get(path).unwrap_or(current);
    Some(limiter.adaptive_limit(&prefix, current, Some(reference_text), None))
}

/// Limits for the name, the contact line and every transform-editable field, keyed
/// by field path.
pub fn field_limits(
    limiter: &AdaptiveLimiter,
    draft: &StructuralContentMap,
    reference: &StructuralContentMap,
) -> BTreeMap<String, FieldLimit> {
    let mut limits = BTreeMap::new();

    if let Some(limit) = limit_for(limiter, draft, reference, &FieldPath::Name) {
        limits.insert(FieldPath::Name.to_string(), limit);
    }
    if let Some(contact) = &draft.personal.contact {
        let text = contact.line.text(contact);
        let reference_text = reference
            .personal
            .contact
            .as_ref()
            .map(|c| c.line.text(c))
            .unwrap_or_else(|| text.clone());
        limits.insert(
            CONTACT_FIELD.to_string(),
            limiter.adaptive_limit("", &text, Some(&reference_text), None),
        );
    }

    for path in draft.editable_paths() {
        if let Some(limit) = limit_for(limiter, draft, reference, &path) {
            limits.insert(path.to_string(), limit);
        }
    }
    limits
}

/// The limits the transform is shown: editable fields only, each reduced to
/// `floor(current_limit × TRANSFORM_MARGIN)`.
pub fn transform_limits(limits: &BTreeMap<String, FieldLimit>) -> BTreeMap<String, usize> {
    limits
        .iter()
        .filter(|(field, _)| {
            field
                .parse::<FieldPath>()
                .map(|p| p.is_transform_editable())
                .unwrap_or(false)
        })
        .map(|(field, limit)| {
            let shown = (limit.current_limit.max(0) as f64 * TRANSFORM_MARGIN).floor() as usize;
            (field.clone(), shown)
        })
        .collect()
}
