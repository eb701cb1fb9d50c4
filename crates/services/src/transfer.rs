//! Export to and import from the portable subject document.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use storage::document::{decode_elements, encode_pretty};
use study_core::time::file_stamp;
use study_core::{ClampWarning, Subject, SubjectDraft, normalize};

use crate::Clock;
use crate::error::ImportError;
use crate::prompt::UserPrompt;
use crate::subject_store::SubjectStore;

pub const REPLACE_QUESTION: &str =
    "Importing will replace the current subjects. Do you want to continue?";
pub const IMPORT_DONE_MESSAGE: &str = "Import completed successfully.";

/// A ready-to-save export document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub contents: String,
}

/// Export file name for a given instant, e.g. `materias-2023-11-14T22-13-20-000Z.json`.
#[must_use]
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("materias-{}.json", file_stamp(at))
}

/// Render the collection, in order, as a pretty-printed document.
#[must_use]
pub fn export(subjects: &[Subject], clock: &Clock) -> ExportArtifact {
    ExportArtifact {
        file_name: export_file_name(clock.now()),
        contents: encode_pretty(subjects),
    }
}

/// Where an import document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    File(PathBuf),
    Text(String),
}

impl ImportSource {
    async fn read(self) -> Result<String, ImportError> {
        match self {
            ImportSource::Text(text) => Ok(text),
            ImportSource::File(path) => tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| ImportError::Read { path, source }),
        }
    }
}

/// The selected-but-not-yet-imported document.
///
/// [`import`] empties it on every attempt, whatever the outcome, so the
/// same file can be selected again.
#[derive(Debug, Default)]
pub struct ImportInput {
    selected: Option<ImportSource>,
}

impl ImportInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, source: ImportSource) {
        self.selected = Some(source);
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Nothing was selected.
    NothingSelected,
    /// The user declined to replace the existing subjects.
    Declined,
    Imported(ImportReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub warnings: Vec<ClampWarning>,
    /// Whether the replaced collection reached storage.
    pub persisted: bool,
}

/// Replace the store's collection with the selected document.
///
/// Replacing a non-empty collection needs the user's confirmation. Every
/// record is normalized; each clamped cycle count is passed to
/// [`UserPrompt::warn`] before the replace happens.
///
/// # Errors
///
/// Returns `ImportError::Read` if the file cannot be read and
/// `ImportError::Format` if the document is not a JSON array. The store is
/// untouched in both cases.
pub async fn import(
    store: &mut SubjectStore,
    input: &mut ImportInput,
    prompt: &dyn UserPrompt,
) -> Result<ImportOutcome, ImportError> {
    let Some(source) = input.selected.take() else {
        return Ok(ImportOutcome::NothingSelected);
    };

    let text = source.read().await?;
    let elements = decode_elements(&text)?;

    if !store.is_empty() && !prompt.confirm(REPLACE_QUESTION) {
        tracing::info!("import declined; keeping current subjects");
        return Ok(ImportOutcome::Declined);
    }

    let mut subjects = Vec::with_capacity(elements.len());
    let mut warnings = Vec::new();
    for element in &elements {
        let normalized = normalize(SubjectDraft::from_value(element));
        if let Some(warning) = normalized.clamp_warning() {
            prompt.warn(&warning);
            warnings.push(warning);
        }
        subjects.push(normalized.subject);
    }

    let imported = subjects.len();
    let persisted = store.replace_all(subjects).await;
    prompt.notify(IMPORT_DONE_MESSAGE);
    tracing::info!(imported, clamped = warnings.len(), persisted, "import finished");

    Ok(ImportOutcome::Imported(ImportReport {
        imported,
        warnings,
        persisted,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use storage::document::DocumentError;
    use storage::repository::InMemoryStore;
    use study_core::time::fixed_now;

    use super::*;
    use crate::persistence::{PersistenceConfig, PersistenceGateway};

    #[derive(Default)]
    struct RecordingPrompt {
        answer: bool,
        questions: Mutex<Vec<String>>,
        warnings: Mutex<Vec<ClampWarning>>,
        notices: Mutex<Vec<String>>,
    }

    impl RecordingPrompt {
        fn answering(answer: bool) -> Self {
            Self {
                answer,
                ..Self::default()
            }
        }
    }

    impl UserPrompt for RecordingPrompt {
        fn confirm(&self, question: &str) -> bool {
            self.questions.lock().unwrap().push(question.to_owned());
            self.answer
        }

        fn warn(&self, warning: &ClampWarning) {
            self.warnings.lock().unwrap().push(warning.clone());
        }

        fn notify(&self, message: &str) {
            self.notices.lock().unwrap().push(message.to_owned());
        }
    }

    async fn open(kv: &InMemoryStore) -> SubjectStore {
        let gateway = PersistenceGateway::new(Arc::new(kv.clone()), PersistenceConfig::default());
        SubjectStore::open(gateway).await
    }

    fn text_input(text: &str) -> ImportInput {
        let mut input = ImportInput::new();
        input.select(ImportSource::Text(text.to_owned()));
        input
    }

    #[test]
    fn export_file_name_embeds_timestamp() {
        assert_eq!(
            export_file_name(fixed_now()),
            "materias-2023-11-14T22-13-20-000Z.json"
        );
    }

    #[tokio::test]
    async fn export_then_import_round_trips() {
        let kv = InMemoryStore::new();
        let mut store = open(&kv).await;
        store.create(SubjectDraft::new("Math", 3).with_marks(vec![true, false, true]));
        store.create(SubjectDraft::new("Art", 1));
        let before = store.subjects().to_vec();

        let artifact = export(store.subjects(), &Clock::fixed(fixed_now()));
        assert!(artifact.file_name.starts_with("materias-"));

        let prompt = RecordingPrompt::answering(true);
        let outcome = import(&mut store, &mut text_input(&artifact.contents), &prompt)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ImportOutcome::Imported(ImportReport {
                imported: 2,
                warnings: vec![],
                persisted: true,
            })
        );
        assert_eq!(store.subjects(), before.as_slice());
        assert_eq!(prompt.questions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn import_clamps_and_warns_per_subject() {
        let kv = InMemoryStore::new();
        let mut store = open(&kv).await;
        let prompt = RecordingPrompt::answering(true);

        let outcome = import(
            &mut store,
            &mut text_input(r#"[{"title":"X","hours":400,"checks":[]}]"#),
            &prompt,
        )
        .await
        .unwrap();

        let subject = &store.subjects()[0];
        assert_eq!(subject.total_cycles(), 300);
        assert_eq!(subject.marks(), vec![false; 300].as_slice());

        let warnings = prompt.warnings.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].subject_title, "X");
        assert_eq!(warnings[0].requested, Some(400));
        assert!(matches!(outcome, ImportOutcome::Imported(r) if r.warnings.len() == 1));
        // empty store: no confirmation needed
        assert!(prompt.questions.lock().unwrap().is_empty());
        assert_eq!(*prompt.notices.lock().unwrap(), vec![IMPORT_DONE_MESSAGE]);
    }

    #[tokio::test]
    async fn import_reports_failed_write() {
        let kv = InMemoryStore::new();
        let mut store = open(&kv).await;
        kv.set_reject_writes(true);
        let prompt = RecordingPrompt::answering(true);

        let outcome = import(
            &mut store,
            &mut text_input(r#"[{"title":"A","hours":1}]"#),
            &prompt,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, ImportOutcome::Imported(ref r) if !r.persisted));
        assert_eq!(store.len(), 1);
        assert_eq!(kv.write_count(), 0);
    }

    #[tokio::test]
    async fn import_rejects_non_array_and_resets_input() {
        let kv = InMemoryStore::new();
        let mut store = open(&kv).await;
        store.create(SubjectDraft::new("Keep", 1));
        let prompt = RecordingPrompt::answering(true);

        let mut input = text_input(r#"{"title":"X"}"#);
        let err = import(&mut store, &mut input, &prompt).await.unwrap_err();

        assert!(matches!(err, ImportError::Format(DocumentError::NotASequence)));
        assert!(!input.is_selected());
        assert_eq!(store.len(), 1);
        assert!(prompt.questions.lock().unwrap().is_empty());
        assert!(prompt.notices.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn declining_leaves_store_untouched() {
        let kv = InMemoryStore::new();
        let mut store = open(&kv).await;
        store.create(SubjectDraft::new("Keep", 2).with_id("k"));
        store.flush().await;
        let writes = kv.write_count();
        let prompt = RecordingPrompt::answering(false);

        let mut input = text_input(r#"[{"title":"Other","hours":400}]"#);
        let outcome = import(&mut store, &mut input, &prompt).await.unwrap();

        assert_eq!(outcome, ImportOutcome::Declined);
        assert!(!input.is_selected());
        assert_eq!(store.subjects()[0].title(), "Keep");
        assert!(prompt.warnings.lock().unwrap().is_empty());
        assert_eq!(kv.write_count(), writes);
    }

    #[tokio::test]
    async fn nothing_selected_is_a_noop() {
        let kv = InMemoryStore::new();
        let mut store = open(&kv).await;
        let prompt = RecordingPrompt::answering(true);

        let outcome = import(&mut store, &mut ImportInput::new(), &prompt)
            .await
            .unwrap();
        assert_eq!(outcome, ImportOutcome::NothingSelected);
    }

    #[tokio::test]
    async fn import_writes_immediately() {
        let kv = InMemoryStore::new();
        let mut store = open(&kv).await;
        let prompt = RecordingPrompt::answering(true);

        import(
            &mut store,
            &mut text_input(r#"[{"id":"a","title":"A","hours":2,"checks":[true]}]"#),
            &prompt,
        )
        .await
        .unwrap();

        assert_eq!(kv.write_count(), 1);
        let reopened = open(&kv).await;
        assert_eq!(reopened.subjects()[0].id().as_str(), "a");
        assert_eq!(reopened.subjects()[0].marks(), &[true, false]);
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let kv = InMemoryStore::new();
        let mut store = open(&kv).await;
        let prompt = RecordingPrompt::answering(true);
        let mut input = ImportInput::new();
        input.select(ImportSource::File(PathBuf::from("/definitely/not/here.json")));

        let err = import(&mut store, &mut input, &prompt).await.unwrap_err();
        assert!(matches!(err, ImportError::Read { .. }));
        assert!(!input.is_selected());
    }
}
