use study_core::{Normalized, Progress, Subject, SubjectDraft, SubjectId, normalize};

use crate::error::StoreError;
use crate::persistence::PersistenceGateway;

/// Owns the ordered subject collection and persists every mutation.
///
/// Insertion order is display and export order. Id-addressed operations act
/// on the first subject carrying that id.
///
/// Mark toggles and creations schedule a debounced write; clearing,
/// deleting, and replacing write immediately. Call [`SubjectStore::flush`]
/// before shutting down so a pending debounced write is not lost.
pub struct SubjectStore {
    subjects: Vec<Subject>,
    gateway: PersistenceGateway,
}

impl SubjectStore {
    /// Build a store populated from whatever the gateway has persisted.
    pub async fn open(gateway: PersistenceGateway) -> Self {
        let subjects = gateway.load().await;
        tracing::info!(count = subjects.len(), "loaded subjects");
        Self { subjects, gateway }
    }

    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &SubjectId) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id() == id)
    }

    #[must_use]
    pub fn gateway(&self) -> &PersistenceGateway {
        &self.gateway
    }

    /// Normalize `draft`, append it, and schedule a debounced write.
    ///
    /// The returned value carries the stored subject and, when the cycle
    /// count had to be reduced, the original count so the caller can warn.
    pub fn create(&mut self, draft: SubjectDraft) -> Normalized {
        let normalized = normalize(draft);
        if let Some(warning) = normalized.clamp_warning() {
            tracing::warn!(%warning, "subject clamped on create");
        }
        self.subjects.push(normalized.subject.clone());
        self.gateway.schedule_save(&self.subjects);
        normalized
    }

    /// Flip mark `index` (zero-based) and schedule a debounced write.
    ///
    /// Returns the new value of the mark.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SubjectNotFound` or `StoreError::MarkOutOfRange`;
    /// nothing changes and nothing is written in that case.
    pub fn toggle_mark(&mut self, id: &SubjectId, index: usize) -> Result<bool, StoreError> {
        let subject = self.find_mut(id)?;
        let total = subject.total_cycles();
        let value = subject.toggle(index).ok_or_else(|| StoreError::MarkOutOfRange {
            id: id.clone(),
            index,
            total,
        })?;
        self.gateway.schedule_save(&self.subjects);
        Ok(value)
    }

    /// Reset every mark of the subject and write immediately.
    ///
    /// Returns `false` if the write failed; the marks stay cleared in memory.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SubjectNotFound` if no subject has `id`.
    pub async fn clear_marks(&mut self, id: &SubjectId) -> Result<bool, StoreError> {
        self.find_mut(id)?.clear();
        Ok(self.gateway.save_now(&self.subjects).await)
    }

    /// Remove the subject and write immediately.
    ///
    /// Returns `false` if the write failed; the subject stays removed in memory.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SubjectNotFound` if no subject has `id`.
    pub async fn delete(&mut self, id: &SubjectId) -> Result<bool, StoreError> {
        let position = self.position(id)?;
        let removed = self.subjects.remove(position);
        tracing::debug!(id = %removed.id(), "subject deleted");
        Ok(self.gateway.save_now(&self.subjects).await)
    }

    /// Discard the whole collection in favour of `subjects` and write immediately.
    ///
    /// Returns `false` if the write failed.
    pub async fn replace_all(&mut self, subjects: Vec<Subject>) -> bool {
        tracing::info!(
            previous = self.subjects.len(),
            incoming = subjects.len(),
            "replacing all subjects"
        );
        self.subjects = subjects;
        self.gateway.save_now(&self.subjects).await
    }

    /// Number of completed cycles of the subject.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SubjectNotFound` if no subject has `id`.
    pub fn completion_count(&self, id: &SubjectId) -> Result<usize, StoreError> {
        Ok(self.find(id)?.completion_count())
    }

    /// Whether every cycle of the subject is complete.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SubjectNotFound` if no subject has `id`.
    pub fn is_complete(&self, id: &SubjectId) -> Result<bool, StoreError> {
        Ok(self.find(id)?.is_complete())
    }

    /// # Errors
    ///
    /// Returns `StoreError::SubjectNotFound` if no subject has `id`.
    pub fn progress(&self, id: &SubjectId) -> Result<Progress, StoreError> {
        Ok(self.find(id)?.progress())
    }

    /// Write any pending debounced snapshot now. Returns `false` if that write failed.
    pub async fn flush(&mut self) -> bool {
        self.gateway.flush().await
    }

    fn position(&self, id: &SubjectId) -> Result<usize, StoreError> {
        self.subjects
            .iter()
            .position(|s| s.id() == id)
            .ok_or_else(|| StoreError::SubjectNotFound { id: id.clone() })
    }

    fn find(&self, id: &SubjectId) -> Result<&Subject, StoreError> {
        self.position(id).map(|i| &self.subjects[i])
    }

    fn find_mut(&mut self, id: &SubjectId) -> Result<&mut Subject, StoreError> {
        let position = self.position(id)?;
        Ok(&mut self.subjects[position])
    }
}
