//! Operator review of matches and duplicate actions.
//!
//! The organizer asks a [`Reviewer`] before naming a film and before acting
//! on its duplicates. [`AutoReviewer`] accepts whatever was computed; the
//! binary provides a terminal implementation for `--interactive`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::ResolvedFilm;
use crate::duplicates::{DuplicateCandidate, Relationship};
use crate::upgrade::Decision;

/// What to do with a film's catalog match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchChoice {
    /// Keep the resolver's result.
    Accept,
    /// Use `alternates[index]` instead.
    PickAlternate(usize),
    /// Name the film from its parsed descriptor.
    ForceOffline,
    /// Leave the film where it is.
    Skip,
}

/// What to do about a film's existing copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateChoice {
    /// Keep the computed decisions.
    Accept,
    /// Replace every existing copy of the same part.
    Upgrade,
    /// Transfer without touching existing copies.
    KeepBoth,
    /// Leave the film where it is.
    Skip,
}

impl DuplicateChoice {
    /// Decisions after the operator's choice, or `None` when the film is
    /// skipped.
    pub fn apply(
        self,
        duplicates: &[DuplicateCandidate],
        decisions: &[Decision],
    ) -> Option<Vec<Decision>> {
        match self {
            DuplicateChoice::Accept => Some(decisions.to_vec()),
            DuplicateChoice::Skip => None,
            DuplicateChoice::KeepBoth => Some(vec![Decision::KeepBoth; duplicates.len()]),
            DuplicateChoice::Upgrade => Some(
                duplicates
                    .iter()
                    .map(|d| match d.relationship {
                        Relationship::Distinct => Decision::KeepBoth,
                        _ => Decision::ReplaceExisting,
                    })
                    .collect(),
            ),
        }
    }
}

/// Decision seam between the organizer and the operator.
#[async_trait]
pub trait Reviewer: Send + Sync {
    async fn review_match(&self, film: &ResolvedFilm) -> MatchChoice;

    async fn review_duplicates(
        &self,
        film: &ResolvedFilm,
        duplicates: &[DuplicateCandidate],
        decisions: &[Decision],
    ) -> DuplicateChoice;
}

/// Accepts every computed result.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoReviewer;

#[async_trait]
impl Reviewer for AutoReviewer {
    async fn review_match(&self, _film: &ResolvedFilm) -> MatchChoice {
        MatchChoice::Accept
    }

    async fn review_duplicates(
        &self,
        _film: &ResolvedFilm,
        _duplicates: &[DuplicateCandidate],
        _decisions: &[Decision],
    ) -> DuplicateChoice {
        DuplicateChoice::Accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::ExistingFilm;
    use crate::quality::{Media, Quality};
    use std::path::PathBuf;

    fn dup(relationship: Relationship) -> DuplicateCandidate {
        DuplicateCandidate {
            existing: ExistingFilm {
                path: PathBuf::from("/films/Heat (1995).mkv"),
                title: "Heat".to_string(),
                year: Some(1995),
                edition: None,
                quality: Quality::Hd720,
                media: Media::Bluray,
                proper: false,
                part: None,
                size_bytes: 1,
            },
            relationship,
            same_path: false,
            film_size_bytes: 1,
        }
    }

    #[test]
    fn test_auto_reviewer_accepts() {
        let film = crate::testing::fixtures::resolved(crate::testing::fixtures::descriptor(
            "Heat",
            Some(1995),
        ));
        let reviewer = AutoReviewer;
        assert_eq!(
            tokio_test::block_on(reviewer.review_match(&film)),
            MatchChoice::Accept
        );
        assert_eq!(
            tokio_test::block_on(reviewer.review_duplicates(&film, &[], &[])),
            DuplicateChoice::Accept
        );
    }

    #[test]
    fn test_apply_choices() {
        let dups = [dup(Relationship::SameQuality), dup(Relationship::Distinct)];
        let computed = [Decision::IgnoreIncoming, Decision::KeepBoth];

        assert_eq!(
            DuplicateChoice::Accept.apply(&dups, &computed),
            Some(computed.to_vec())
        );
        assert_eq!(DuplicateChoice::Skip.apply(&dups, &computed), None);
        assert_eq!(
            DuplicateChoice::KeepBoth.apply(&dups, &computed),
            Some(vec![Decision::KeepBoth, Decision::KeepBoth])
        );
        assert_eq!(
            DuplicateChoice::Upgrade.apply(&dups, &computed),
            Some(vec![Decision::ReplaceExisting, Decision::KeepBoth])
        );
    }
}
