//! Reviewer answering from a script.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::ResolvedFilm;
use crate::duplicates::DuplicateCandidate;
use crate::review::{DuplicateChoice, MatchChoice, Reviewer};
use crate::upgrade::Decision;

/// Reviewer that plays back queued answers and accepts once a queue runs dry.
///
/// Every question is recorded with the film's title so tests can check what
/// the operator would have been asked.
#[derive(Debug, Default)]
pub struct ScriptedReviewer {
    match_choices: Arc<RwLock<VecDeque<MatchChoice>>>,
    duplicate_choices: Arc<RwLock<VecDeque<DuplicateChoice>>>,
    match_reviews: Arc<RwLock<Vec<String>>>,
    duplicate_reviews: Arc<RwLock<Vec<(String, Vec<Decision>)>>>,
}

impl ScriptedReviewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_match_choice(&self, choice: MatchChoice) {
        self.match_choices.write().await.push_back(choice);
    }

    pub async fn push_duplicate_choice(&self, choice: DuplicateChoice) {
        self.duplicate_choices.write().await.push_back(choice);
    }

    /// Titles of the films whose match was reviewed.
    pub async fn match_reviews(&self) -> Vec<String> {
        self.match_reviews.read().await.clone()
    }

    /// Titles and computed decisions of the films whose duplicates were
    /// reviewed.
    pub async fn duplicate_reviews(&self) -> Vec<(String, Vec<Decision>)> {
        self.duplicate_reviews.read().await.clone()
    }
}

#[async_trait]
impl Reviewer for ScriptedReviewer {
    async fn review_match(&self, film: &ResolvedFilm) -> MatchChoice {
        self.match_reviews
            .write()
            .await
            .push(film.title().to_string());
        self.match_choices
            .write()
            .await
            .pop_front()
            .unwrap_or(MatchChoice::Accept)
    }

    async fn review_duplicates(
        &self,
        film: &ResolvedFilm,
        _duplicates: &[DuplicateCandidate],
        decisions: &[Decision],
    ) -> DuplicateChoice {
        self.duplicate_reviews
            .write()
            .await
            .push((film.title().to_string(), decisions.to_vec()));
        self.duplicate_choices
            .write()
            .await
            .pop_front()
            .unwrap_or(DuplicateChoice::Accept)
    }
}
