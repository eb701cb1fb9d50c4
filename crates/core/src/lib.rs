#![forbid(unsafe_code)]

pub mod model;
pub mod normalize;
pub mod time;

pub use model::{ClampWarning, Progress, Subject, SubjectId};
pub use normalize::{Normalized, SubjectDraft, normalize};
pub use time::Clock;
