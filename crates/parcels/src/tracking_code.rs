//! Human-facing tracking codes: `QB` + year letter + 5 random characters.

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;

use parcelhub_core::{DomainError, DomainResult};

pub const PREFIX: &str = "QB";

/// Unambiguous characters (no I, L, O, U, 0, 1).
pub const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTVWXYZ23456789";

pub const RANDOM_LEN: usize = 5;

/// `A` for 2025 and earlier, one letter per year after, capped at `Z`.
pub fn year_letter(at: DateTime<Utc>) -> char {
    let offset = (at.year() - 2025).clamp(0, 25) as u8;
    (b'A' + offset) as char
}

/// Whether `code` has the shape of a tracking code.
pub fn is_well_formed(code: &str) -> bool {
    let Some(rest) = code.strip_prefix(PREFIX) else {
        return false;
    };
    let bytes = rest.as_bytes();
    bytes.len() == RANDOM_LEN + 1
        && bytes[0].is_ascii_uppercase()
        && bytes[1..].iter().all(|b| ALPHABET.contains(b))
}

/// Source of tracking-code candidates.
pub trait TrackingCodeGenerator: Send + Sync {
    fn candidate(&self, at: DateTime<Utc>) -> String;
}

/// Candidates drawn from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTrackingCodeGenerator;

impl TrackingCodeGenerator for RandomTrackingCodeGenerator {
    fn candidate(&self, at: DateTime<Utc>) -> String {
        let mut rng = rand::thread_rng();
        let mut code = String::with_capacity(PREFIX.len() + 1 + RANDOM_LEN);
        code.push_str(PREFIX);
        code.push(year_letter(at));
        for _ in 0..RANDOM_LEN {
            code.push(ALPHABET[rng.gen_range(0..ALPHABET.len())] as char);
        }
        code
    }
}

/// Draw candidates and hand each to `claim`, at most `attempts` times.
///
/// `claim` answers `Ok(None)` when the code is already taken by any tenant,
/// whether found up front or rejected on insert; that uses up one attempt.
/// Running out of attempts is an internal failure.
pub fn assign_tracking_code<G, T, F>(
    generator: &G,
    at: DateTime<Utc>,
    attempts: u32,
    mut claim: F,
) -> DomainResult<T>
where
    G: TrackingCodeGenerator + ?Sized,
    F: FnMut(&str) -> DomainResult<Option<T>>,
{
    for attempt in 1..=attempts.max(1) {
        let code = generator.candidate(at);
        if let Some(claimed) = claim(&code)? {
            return Ok(claimed);
        }
        tracing::debug!(attempt, "tracking code collision, retrying");
    }
    Err(DomainError::internal("could not assign a unique tracking code"))
}
