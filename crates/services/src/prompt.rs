use study_core::ClampWarning;

/// Seam between the services and whoever is in front of the user.
///
/// Implemented by the front end; services call it for destructive-action
/// confirmation and for non-fatal reports.
pub trait UserPrompt: Send + Sync {
    /// Ask a yes/no question. `false` means the user declined.
    fn confirm(&self, question: &str) -> bool;

    /// Report a cycle count that was reduced to the maximum.
    fn warn(&self, warning: &ClampWarning);

    /// Report a completed operation.
    fn notify(&self, message: &str);
}
