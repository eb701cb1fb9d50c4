use std::fmt;

use crate::model::ids::SubjectId;

/// Smallest number of cycles a subject can have.
pub const MIN_CYCLES: usize = 1;

/// Largest number of cycles a subject can have.
pub const MAX_CYCLES: usize = 300;

/// Title used when a stored or imported record carries no usable title.
pub const DEFAULT_TITLE: &str = "Matéria";

//
// ─── SUBJECT ───────────────────────────────────────────────────────────────────
//

/// A named item of study work split into a fixed number of cycles.
///
/// The cycle count is the length of `marks`, so the two can never disagree.
/// Instances only come out of [`crate::normalize`], which keeps the count in
/// `MIN_CYCLES..=MAX_CYCLES`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    id: SubjectId,
    title: String,
    marks: Vec<bool>,
}

impl Subject {
    pub(crate) fn from_canonical(id: SubjectId, title: String, marks: Vec<bool>) -> Self {
        debug_assert!((MIN_CYCLES..=MAX_CYCLES).contains(&marks.len()));
        Self { id, title, marks }
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &SubjectId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn total_cycles(&self) -> usize {
        self.marks.len()
    }

    /// `marks()[i]` is whether cycle `i + 1` is complete.
    #[must_use]
    pub fn marks(&self) -> &[bool] {
        &self.marks
    }

    /// Number of completed cycles.
    #[must_use]
    pub fn completion_count(&self) -> usize {
        self.marks.iter().filter(|done| **done).count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completion_count() == self.total_cycles()
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            done: self.completion_count(),
            total: self.total_cycles(),
        }
    }

    /// Flips the mark at `index` and returns its new value.
    ///
    /// Returns `None` and leaves the subject untouched when `index` is out of range.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let mark = self.marks.get_mut(index)?;
        *mark = !*mark;
        Some(*mark)
    }

    /// Resets every mark to incomplete.
    pub fn clear(&mut self) {
        self.marks.fill(false);
    }
}

/// Completed versus total cycles for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.done == self.total
    }
}

//
// ─── CLAMP WARNING ─────────────────────────────────────────────────────────────
//

/// A supplied cycle count exceeded [`MAX_CYCLES`] and was reduced.
///
/// Non-fatal: the subject is still created with `applied` cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClampWarning {
    pub subject_title: String,
    /// `None` when the supplied count was too large to represent.
    pub requested: Option<u64>,
    pub applied: usize,
}

impl fmt::Display for ClampWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "subject \"{}\" has more than {} cycles",
            self.subject_title, self.applied
        )?;
        if let Some(requested) = self.requested {
            write!(f, " ({requested} requested)")?;
        }
        write!(f, "; limited to {}", self.applied)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
