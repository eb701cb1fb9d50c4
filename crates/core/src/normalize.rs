//! Single gate that turns untrusted subject input into canonical [`Subject`]s.
//!
//! Manual creation, storage reload, and file import all pass through
//! [`normalize`]. It never fails: malformed fields degrade to defaults.

use serde_json::Value;

use crate::model::{ClampWarning, DEFAULT_TITLE, MAX_CYCLES, MIN_CYCLES, Subject, SubjectId};

/// Loosely typed subject input.
///
/// Each field is `None` when the source omitted it or supplied a value of the
/// wrong type. `total_cycles` only ever holds a positive integer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectDraft {
    pub id: Option<String>,
    pub title: Option<String>,
    pub total_cycles: Option<u64>,
    pub marks: Option<Vec<bool>>,
}

impl SubjectDraft {
    /// Draft for a manually created subject.
    ///
    /// A zero or negative `total_cycles` is treated as absent.
    #[must_use]
    pub fn new(title: impl Into<String>, total_cycles: i64) -> Self {
        Self {
            id: None,
            title: Some(title.into()),
            total_cycles: u64::try_from(total_cycles).ok().filter(|n| *n > 0),
            marks: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_marks(mut self, marks: Vec<bool>) -> Self {
        self.marks = Some(marks);
        self
    }

    /// Extracts a draft from one element of a stored or imported document.
    ///
    /// Reads `id`, `title`, `hours`, and `checks`. Non-object values yield an
    /// empty draft.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(record) = value.as_object() else {
            return Self::default();
        };

        let id = match record.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        };
        let title = match record.get("title") {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };
        let total_cycles = record.get("hours").and_then(positive_integer);
        let marks = match record.get("checks") {
            Some(Value::Array(items)) => Some(items.iter().map(truthy).collect()),
            _ => None,
        };

        Self {
            id,
            title,
            total_cycles,
            marks,
        }
    }
}

/// Result of normalizing one draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub subject: Subject,
    /// Original cycle count when it exceeded [`MAX_CYCLES`] and was reduced.
    ///
    /// Counts too large for a `u64` saturate to `u64::MAX`.
    pub clamped_from: Option<u64>,
}

impl Normalized {
    /// Warning to surface to the user when the cycle count was clamped.
    #[must_use]
    pub fn clamp_warning(&self) -> Option<ClampWarning> {
        self.clamped_from.map(|requested| ClampWarning {
            subject_title: self.subject.title().to_owned(),
            requested: (requested != u64::MAX).then_some(requested),
            applied: self.subject.total_cycles(),
        })
    }
}

/// Brings a draft into canonical form.
///
/// 1. title falls back to [`DEFAULT_TITLE`]
/// 2. cycle count falls back to the marks length, then to 1
/// 3. cycle count is clamped to `MIN_CYCLES..=MAX_CYCLES`
/// 4. marks are truncated or padded with `false` to the cycle count
/// 5. a missing or empty id is generated
#[must_use]
pub fn normalize(draft: SubjectDraft) -> Normalized {
    let SubjectDraft {
        id,
        title,
        total_cycles,
        marks,
    } = draft;

    let title = title.unwrap_or_else(|| DEFAULT_TITLE.to_owned());

    let requested = total_cycles
        .or_else(|| marks.as_ref().map(|m| as_u64(m.len())))
        .unwrap_or(1);
    let total = usize::try_from(requested)
        .unwrap_or(MAX_CYCLES)
        .clamp(MIN_CYCLES, MAX_CYCLES);
    let clamped_from = (requested > as_u64(MAX_CYCLES)).then_some(requested);

    let mut marks = marks.unwrap_or_default();
    marks.resize(total, false);

    let id = id
        .and_then(SubjectId::new)
        .unwrap_or_else(SubjectId::generate);

    Normalized {
        subject: Subject::from_canonical(id, title, marks),
        clamped_from,
    }
}

fn as_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Accepts integral JSON numbers greater than zero, including `3.0`.
fn positive_integer(value: &Value) -> Option<u64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(u) = n.as_u64() {
        return (u > 0).then_some(u);
    }
    let f = n.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f > 0.0 {
        // saturates at u64::MAX, which clamp_warning reports as unrepresentable
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let whole = f as u64;
        return Some(whole);
    }
    None
}

/// Loose truthiness for stored marks: `false`, `0`, `""`, and `null` are incomplete.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
