#![forbid(unsafe_code)]

pub mod error;
pub mod form;
pub mod persistence;
pub mod prompt;
pub mod subject_store;
pub mod transfer;

pub use study_core::Clock;

pub use error::{FormError, ImportError, StoreError};
pub use form::parse_subject_form;
pub use persistence::{DEFAULT_DEBOUNCE, DEFAULT_STORAGE_KEY, PersistenceConfig, PersistenceGateway};
pub use prompt::UserPrompt;
pub use subject_store::SubjectStore;
pub use transfer::{
    ExportArtifact, ImportInput, ImportOutcome, ImportReport, ImportSource, export,
    export_file_name, import,
};
