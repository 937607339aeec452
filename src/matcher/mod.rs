//! Medicine-name resolution engine.
//!
//! Resolves noisy multi-line package-scan text against the reference
//! dictionary in two tiers: an O(1) exact probe on the normalized line, then a
//! fuzzy search confined to name-length buckets within ±2 characters of the
//! line. Exact hits are trusted unconditionally; fuzzy candidates carry a
//! lower-is-better score and are only surfaced below [`SCORE_CUTOFF`].
//!
//! The index is built once, up front, and is immutable afterward —
//! [`MedicineMatcher::resolve`] is a pure read and safe to call from anywhere.

pub mod dictionary;
pub(crate) mod index;
mod resolver;

pub use dictionary::{DictionaryError, ReferenceEntry};
pub use resolver::{MatchResult, MedicineMatcher};

/// Fuzzy candidates scoring at or above this are never returned.
/// 0.0 is an exact match; scores grow as similarity weakens.
pub const SCORE_CUTOFF: f64 = 0.35;

/// A fuzzy score below this is trusted immediately, without scanning the
/// remaining lines or buckets.
pub const INSTANT_MATCH_SCORE: f64 = 0.1;

/// Names (and cleaned lines) shorter than this are too noisy to fuzzy-match.
pub(crate) const MIN_FUZZY_LEN: usize = 3;

/// A line may match names up to this many characters longer or shorter,
/// absorbing OCR insertions and dropped characters without widening the
/// search past the relevant buckets.
pub(crate) const LENGTH_TOLERANCE: usize = 2;
