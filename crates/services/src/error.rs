//! Shared error types for the services crate.

use std::path::PathBuf;

use storage::document::DocumentError;
use study_core::SubjectId;
use thiserror::Error;

/// Errors emitted by `SubjectStore` when an operation addresses nothing.
///
/// The store is left untouched whenever one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    #[error("no subject with id {id}")]
    SubjectNotFound { id: SubjectId },
    #[error("subject {id} has {total} cycles; index {index} is out of range")]
    MarkOutOfRange {
        id: SubjectId,
        index: usize,
        total: usize,
    },
}

/// Errors that abort an import before the store is touched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error(transparent)]
    Format(#[from] DocumentError),
    #[error("could not read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rejections from the manual add-subject form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormError {
    #[error("subject name cannot be empty")]
    EmptyName,
    #[error("cycle count must be a whole number of at least 1 (got {raw:?})")]
    InvalidCycles { raw: String },
}
