//! Upgrade decisions for incoming films that already exist.
//!
//! Precedence, per duplicate:
//! 1. duplicate checking disabled: keep both, except that `force_overwrite`
//!    replaces a file at the very destination path;
//! 2. a different part of the film, or a lone part next to a complete copy:
//!    keep both;
//! 3. a tier change the upgrade table does not allow: ignore the incoming film;
//! 4. better media wins regardless of size, worse media is ignored;
//! 5. equal media and tier: a `PROPER` release beats one that is not;
//! 6. otherwise the smaller film wins when it is smaller by more than
//!    the size tolerance, otherwise the incoming film is ignored. Whole films
//!    are weighed against whole films, summing parts. This also applies to
//!    allowed tier upgrades.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DuplicatesConfig;
use crate::duplicates::{DuplicateCandidate, Relationship};
use crate::parser::FilmDescriptor;

/// What to do about one existing copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    IgnoreIncoming,
    ReplaceExisting,
    KeepBoth,
}

/// Film-level result of the decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "verdict")]
pub enum Verdict {
    /// No duplicates: transfer as usual.
    Proceed,
    /// Transfer, then remove the listed duplicates.
    Transfer { replace: Vec<std::path::PathBuf> },
    /// At least one existing copy is as good or better.
    Skip { reason: String },
}

/// Decide, per duplicate, what happens to it.
pub fn decide(
    incoming: &FilmDescriptor,
    duplicates: &[DuplicateCandidate],
    policy: &DuplicatesConfig,
) -> Vec<Decision> {
    duplicates
        .iter()
        .map(|dup| {
            let decision = decide_one(incoming, dup, policy);
            debug!(
                "{} vs existing {}: {:?}",
                incoming.display_name(),
                dup.existing.path.display(),
                decision
            );
            decision
        })
        .collect()
}

fn decide_one(
    incoming: &FilmDescriptor,
    dup: &DuplicateCandidate,
    policy: &DuplicatesConfig,
) -> Decision {
    if !policy.enabled {
        return if policy.force_overwrite && dup.same_path {
            Decision::ReplaceExisting
        } else {
            Decision::KeepBoth
        };
    }

    if dup.relationship == Relationship::Distinct {
        return Decision::KeepBoth;
    }

    let existing = &dup.existing;
    let incoming_tier = incoming.quality.tier();
    let same_tier = incoming_tier == existing.quality.tier();
    if !same_tier
        && !policy
            .upgrade_table
            .get(existing.quality)
            .iter()
            .any(|q| q.tier() == incoming_tier)
    {
        return Decision::IgnoreIncoming;
    }

    match incoming.media.rank().cmp(&existing.media.rank()) {
        std::cmp::Ordering::Greater => Decision::ReplaceExisting,
        std::cmp::Ordering::Less => Decision::IgnoreIncoming,
        std::cmp::Ordering::Equal if same_tier && incoming.proper && !existing.proper => {
            Decision::ReplaceExisting
        }
        std::cmp::Ordering::Equal if same_tier && existing.proper && !incoming.proper => {
            Decision::IgnoreIncoming
        }
        std::cmp::Ordering::Equal => {
            // the smaller encode wins
            if incoming.size_bytes.saturating_add(policy.size_tolerance_bytes) < dup.film_size_bytes {
                Decision::ReplaceExisting
            } else {
                Decision::IgnoreIncoming
            }
        }
    }
}

/// Combine per-duplicate decisions into what happens to the film.
pub fn verdict(duplicates: &[DuplicateCandidate], decisions: &[Decision]) -> Verdict {
    if duplicates.is_empty() {
        return Verdict::Proceed;
    }

    if let Some((dup, _)) = duplicates
        .iter()
        .zip(decisions)
        .find(|(_, d)| **d == Decision::IgnoreIncoming)
    {
        return Verdict::Skip {
            reason: format!(
                "existing copy is as good or better: {}",
                dup.existing.path.display()
            ),
        };
    }

    let replace = duplicates
        .iter()
        .zip(decisions)
        .filter(|(_, d)| **d == Decision::ReplaceExisting)
        .map(|(dup, _)| dup.existing.path.clone())
        .collect();
    Verdict::Transfer { replace }
}
