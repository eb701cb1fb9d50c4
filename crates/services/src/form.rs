use study_core::SubjectDraft;

use crate::error::FormError;

/// Validate the manual add-subject form.
///
/// The name is trimmed and must be non-empty; the cycle count must parse as
/// an integer of at least 1. Counts above the maximum pass through and are
/// clamped (with a warning) when the subject is created.
///
/// # Errors
///
/// Returns `FormError` when the input is rejected; no subject should be created.
pub fn parse_subject_form(name: &str, cycles: &str) -> Result<SubjectDraft, FormError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FormError::EmptyName);
    }

    let total = cycles
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| FormError::InvalidCycles {
            raw: cycles.to_owned(),
        })?;

    Ok(SubjectDraft::new(name, total))
}
