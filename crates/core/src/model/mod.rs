mod ids;
mod subject;

pub use ids::{ParseIdError, SubjectId, generate_id};
pub use subject::{ClampWarning, DEFAULT_TITLE, MAX_CYCLES, MIN_CYCLES, Progress, Subject};
