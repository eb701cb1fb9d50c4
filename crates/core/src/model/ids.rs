use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Unique identifier for a Subject.
///
/// Opaque text assigned at creation and never reassigned. Identifiers read
/// back from storage or an imported file are kept verbatim.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(String);

impl SubjectId {
    /// Wraps an existing identifier.
    ///
    /// Returns `None` when `id` is empty, since an empty id can never address a subject.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() { None } else { Some(Self(id)) }
    }

    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(generate_id())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({})", self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error type for parsing an ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for SubjectId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubjectId::new(s.trim()).ok_or_else(|| ParseIdError {
            kind: "SubjectId".to_string(),
        })
    }
}

// ─── Generation ────────────────────────────────────────────────────────────────

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Produces a non-empty identifier that is unique for practical purposes.
///
/// Draws a random UUID from the operating system. If the OS source is
/// unavailable, falls back to a base-36 millisecond timestamp followed by a
/// base-36 pseudo-random suffix. Never fails.
#[must_use]
pub fn generate_id() -> String {
    secure_id().unwrap_or_else(fallback_id)
}

fn secure_id() -> Option<String> {
    let mut bytes = [0u8; 16];
    getrandom::fill(&mut bytes).ok()?;
    Some(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
}

fn fallback_id() -> String {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let salt = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut rng = SmallRng::seed_from_u64(millis ^ salt.rotate_left(32));
    format!("{}{}", to_base36(millis), to_base36(rng.random::<u64>()))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_owned();
    }
    let mut out = Vec::with_capacity(13);
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_subject_id_rejects_empty() {
        assert!(SubjectId::new("").is_none());
        assert!("   ".parse::<SubjectId>().is_err());
    }

    #[test]
    fn test_subject_id_display_and_from_str() {
        let id: SubjectId = "abc-123".parse().unwrap();
        assert_eq!(id.to_string(), "abc-123");
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let ids: HashSet<String> = (0..1_000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1_000);
        assert!(ids.iter().all(|id| !id.is_empty()));
    }

    #[test]
    fn test_secure_id_is_uuid_shaped() {
        let id = secure_id().expect("os random source available in tests");
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_fallback_id_is_base36() {
        let first = fallback_id();
        let second = fallback_id();
        assert_ne!(first, second);
        assert!(
            first
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(u64::MAX), "3w5e11264sgsf");
    }
}
