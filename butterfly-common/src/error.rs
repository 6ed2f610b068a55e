//! Error types and utilities for butterfly-osm toolkit
//!
//! Provides the I/O-boundary error type shared by the tools, plus fuzzy
//! matching used to suggest corrections for mistyped tag and role values.

use std::fmt;
use strsim::{jaro_winkler, normalized_levenshtein};

/// Find the best fuzzy match using character-based scoring
///
/// Jaro-Winkler 70% + Normalized Levenshtein 30%, minimum score 0.65.
fn find_best_fuzzy_match(input: &str, candidates: &[&str]) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }

    let input_lower = input.to_lowercase();
    let mut best_match = None;
    let mut best_score = 0.0f64;

    // Empirically tuned: short role words ("lfet", "rigth") must still clear it,
    // unrelated values ("through" vs "left") must not.
    let min_threshold = 0.65;

    for candidate in candidates {
        let candidate_lower = candidate.to_lowercase();

        // Jaro-Winkler: strong for transposition/prefix typos (e.g., "rigth" → "right").
        let jw_score = jaro_winkler(&input_lower, &candidate_lower);

        // Normalized Levenshtein: better for insertions/deletions (e.g., "rod" → "road").
        let lev_score = normalized_levenshtein(&input_lower, &candidate_lower);

        let combined_score = (jw_score * 0.7) + (lev_score * 0.3);

        if combined_score >= min_threshold && combined_score > best_score {
            best_score = combined_score;
            best_match = Some(candidate.to_string());
        }
    }

    best_match
}

/// Suggest a correction for a potentially misspelled value
///
/// Returns `None` when the value already matches a candidate (ignoring case)
/// or when nothing is close enough.
pub fn suggest_correction(value: &str, candidates: &[&str]) -> Option<String> {
    if candidates.iter().any(|c| c.eq_ignore_ascii_case(value)) {
        return None;
    }

    find_best_fuzzy_match(value, candidates)
}

/// Main error type for butterfly-osm operations
#[derive(Debug)]
pub enum Error {
    /// File I/O error
    IoError(std::io::Error),

    /// Invalid configuration or parameters
    InvalidInput(String),

    /// Input document could not be decoded
    ParseError(String),

    /// An output channel could not be written
    OutputFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IoError(err) => {
                write!(f, "I/O error: {err}")
            }
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {msg}")
            }
            Error::ParseError(msg) => {
                write!(f, "Parse error: {msg}")
            }
            Error::OutputFailed(msg) => {
                write!(f, "Output failed: {msg}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

/// Convenience result type for butterfly-osm operations
pub type Result<T> = std::result::Result<T, Error>;
