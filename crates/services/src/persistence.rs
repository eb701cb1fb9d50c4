//! Debounced writer and eager reader for the subject collection.

use std::sync::Arc;
use std::time::Duration;

use storage::document::{decode_elements, encode_compact};
use storage::repository::KeyValueStore;
use study_core::{Subject, SubjectDraft, normalize};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Key the collection is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "studySubjects";

/// Quiet period before a debounced write lands.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    pub key: String,
    pub debounce: Duration,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_owned(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

enum WriteState {
    Idle,
    /// `timer` is `None` when no runtime was available to arm it; `flush` still writes.
    Pending {
        document: String,
        timer: Option<Timer>,
    },
}

/// A debounced write waiting out its quiet period.
///
/// The task resolves to `None` when cancelled before writing, otherwise to
/// whether the write succeeded. Once the write has started it always runs to
/// completion, so stores never see two snapshots written at once.
struct Timer {
    cancel: oneshot::Sender<()>,
    task: JoinHandle<Option<bool>>,
}

impl Timer {
    fn cancel(self) -> JoinHandle<Option<bool>> {
        let _ = self.cancel.send(());
        self.task
    }
}

/// Reads the stored collection and writes snapshots of it back.
///
/// At most one debounced write is pending at any time. Scheduling another
/// cancels the pending one and restarts the window, so a burst of mutations
/// produces a single write of the final state. Writes land in the order they
/// were requested.
///
/// Write failures are logged and reported as `false`; they never interrupt
/// the caller.
pub struct PersistenceGateway {
    kv: Arc<dyn KeyValueStore>,
    config: PersistenceConfig,
    state: WriteState,
}

impl PersistenceGateway {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, config: PersistenceConfig) -> Self {
        Self {
            kv,
            config,
            state: WriteState::Idle,
        }
    }

    /// Load the stored collection.
    ///
    /// A missing, unreadable, or malformed document yields an empty
    /// collection. Every stored element is normalized.
    pub async fn load(&self) -> Vec<Subject> {
        let raw = match self.kv.get(&self.config.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(key = %self.config.key, %err, "could not read stored subjects; starting empty");
                return Vec::new();
            }
        };

        let elements = match decode_elements(&raw) {
            Ok(elements) => elements,
            Err(err) => {
                tracing::warn!(key = %self.config.key, %err, "ignoring corrupt stored subjects");
                return Vec::new();
            }
        };

        elements
            .iter()
            .map(|value| {
                let normalized = normalize(SubjectDraft::from_value(value));
                if let Some(warning) = normalized.clamp_warning() {
                    tracing::warn!(%warning, "stored subject clamped");
                }
                normalized.subject
            })
            .collect()
    }

    /// Schedule a write of `subjects` once the debounce window passes quietly.
    pub fn schedule_save(&mut self, subjects: &[Subject]) {
        let previous = self.cancel_timer();
        let document = encode_compact(subjects);

        let timer = match Handle::try_current() {
            Ok(handle) => {
                let kv = Arc::clone(&self.kv);
                let key = self.config.key.clone();
                let delay = self.config.debounce;
                let pending = document.clone();
                let (cancel, mut cancelled) = oneshot::channel();
                let task = handle.spawn(async move {
                    // a cancelled predecessor may still be mid-write
                    if let Some(previous) = previous {
                        let _ = previous.await;
                    }
                    tokio::select! {
                        () = tokio::time::sleep(delay) => {
                            Some(write_document(kv.as_ref(), &key, &pending).await)
                        }
                        Ok(()) = &mut cancelled => None,
                    }
                });
                Some(Timer { cancel, task })
            }
            Err(_) => {
                tracing::debug!("no async runtime; debounced write waits for flush");
                None
            }
        };

        self.state = WriteState::Pending { document, timer };
    }

    /// Write `subjects` now, dropping any pending debounced write.
    ///
    /// Returns `false` if the write failed.
    pub async fn save_now(&mut self, subjects: &[Subject]) -> bool {
        if let Some(previous) = self.cancel_timer() {
            let _ = previous.await;
        }
        self.state = WriteState::Idle;
        let document = encode_compact(subjects);
        write_document(self.kv.as_ref(), &self.config.key, &document).await
    }

    /// Write the pending snapshot immediately, if there is one.
    ///
    /// Returns `false` if the pending write failed.
    pub async fn flush(&mut self) -> bool {
        let WriteState::Pending { document, timer } =
            std::mem::replace(&mut self.state, WriteState::Idle)
        else {
            return true;
        };

        if let Some(timer) = timer {
            // the timer may have fired already; its result is the flush result
            if let Ok(Some(written)) = timer.cancel().await {
                return written;
            }
        }
        write_document(self.kv.as_ref(), &self.config.key, &document).await
    }

    /// Whether a debounced write has been scheduled but not yet written.
    #[must_use]
    pub fn has_pending_write(&self) -> bool {
        match &self.state {
            WriteState::Idle => false,
            WriteState::Pending { timer, .. } => {
                timer.as_ref().is_none_or(|t| !t.task.is_finished())
            }
        }
    }

    /// Stops the pending countdown and hands back its task so callers can
    /// wait for a write that already started.
    fn cancel_timer(&mut self) -> Option<JoinHandle<Option<bool>>> {
        match &mut self.state {
            WriteState::Pending { timer, .. } => timer.take().map(Timer::cancel),
            WriteState::Idle => None,
        }
    }
}

async fn write_document(kv: &dyn KeyValueStore, key: &str, document: &str) -> bool {
    match kv.set(key, document).await {
        Ok(()) => {
            tracing::debug!(key, bytes = document.len(), "persisted subjects");
            true
        }
        Err(err) => {
            tracing::error!(key, %err, "failed to persist subjects; in-memory state kept");
            false
        }
    }
}
