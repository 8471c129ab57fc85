//! Voting and grid evaluation of candidates against the reference database.
//!
//! Two complementary rules decide a match. The voting rule requires enough
//! of the three full-image algorithms to agree, which tolerates global
//! edits like recompression or brightness shifts. The grid rule requires
//! enough of the nine spatial cells to agree, which tolerates cropping and
//! pasting where global hashes diverge but sub-regions still align.

use std::borrow::Cow;
use std::fmt;

use image::DynamicImage;
use serde::Serialize;
use tracing::debug;

use crate::frames::{sample_frames, DEFAULT_FRAME_LIMIT};
use crate::orient::Rotation;
use crate::signature::{Signature, SignatureHasher};
use crate::store::SignatureDatabase;

/// Matching thresholds. The defaults balance false positives against
/// resilience to single-algorithm noise: 2 of 3 votes, 4 of 9 cells.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Inclusive Hamming-distance cutoff for one hash comparison.
    pub threshold: u32,
    /// Full-image algorithms (of 3) that must agree for a vote match.
    pub min_votes: u32,
    /// Grid cells (of 9) that must agree for a grid match.
    pub min_grid_matches: u32,
    /// Maximum frames sampled from an animated candidate.
    pub frame_limit: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: 10,
            min_votes: 2,
            min_grid_matches: 4,
            frame_limit: DEFAULT_FRAME_LIMIT,
        }
    }
}

/// Why a candidate matched a reference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchReason {
    /// Enough full-image algorithms agreed within threshold.
    Vote { votes: u32 },
    /// Enough grid cells agreed within threshold.
    Grid { cells: u32 },
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchReason::Vote { votes } => write!(f, "vote ({votes}/3)"),
            MatchReason::Grid { cells } => write!(f, "grid ({cells}/9)"),
        }
    }
}

/// A successful match with its diagnostic context.
#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    /// Id of the matching reference entry.
    pub reference: String,
    pub reason: MatchReason,
    /// Candidate rotation at which the match was found.
    pub rotation: Rotation,
}

/// Compare one candidate signature against every entry in the snapshot,
/// returning the first entry satisfying either rule. The voting rule is
/// checked before the grid rule for each entry.
pub fn evaluate(
    candidate: &Signature,
    db: &SignatureDatabase,
    config: &MatcherConfig,
) -> Option<(String, MatchReason)> {
    for entry in db.entries() {
        let votes = candidate.votes_against(&entry.signature, config.threshold);
        if votes >= config.min_votes {
            return Some((entry.id.clone(), MatchReason::Vote { votes }));
        }
        let cells = candidate.grid_matches_against(&entry.signature, config.threshold);
        if cells >= config.min_grid_matches {
            return Some((entry.id.clone(), MatchReason::Grid { cells }));
        }
    }
    None
}

/// Evaluate the four orientation variants of one frame, in order,
/// short-circuiting on the first hit.
pub fn check_frame(
    frame: &DynamicImage,
    db: &SignatureDatabase,
    config: &MatcherConfig,
    hasher: &SignatureHasher,
) -> Option<MatchOutcome> {
    for rotation in Rotation::ALL {
        let variant: Cow<'_, DynamicImage> = match rotation {
            Rotation::Deg0 => Cow::Borrowed(frame),
            _ => Cow::Owned(rotation.apply(frame)),
        };
        let signature = hasher.compute(&variant);
        if let Some((reference, reason)) = evaluate(&signature, db, config) {
            debug!(%reference, %reason, %rotation, "candidate matched");
            return Some(MatchOutcome {
                reference,
                reason,
                rotation,
            });
        }
    }
    None
}

/// Full candidate pipeline: frame sampling, orientation expansion,
/// signature computation, and database evaluation. The first hit
/// short-circuits; an undecodable candidate or an empty database yields a
/// deterministic no-match.
pub fn check_bytes(
    bytes: &[u8],
    db: &SignatureDatabase,
    config: &MatcherConfig,
) -> Option<MatchOutcome> {
    if db.is_empty() {
        return None;
    }
    let hasher = SignatureHasher::new();
    for frame in sample_frames(bytes, config.frame_limit) {
        if let Some(outcome) = check_frame(&frame, db, config, &hasher) {
            return Some(outcome);
        }
    }
    None
}
