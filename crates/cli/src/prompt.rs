//! Terminal reviewer for `--interactive` runs.

use anyhow::Result;
use async_trait::async_trait;
use dialoguer::{console::Term, Select};
use tracing::warn;

use filmsort_core::{
    catalog::ResolvedFilm, DuplicateCandidate, DuplicateChoice, MatchChoice, Reviewer,
};
use filmsort_core::upgrade::Decision;

/// Asks the operator on stderr. Prompts run on the blocking pool; a failed
/// prompt skips the film.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalReviewer;

fn select(prompt: String, items: Vec<String>) -> Result<usize> {
    Ok(Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact_on(&Term::stderr())?)
}

async fn ask(prompt: String, items: Vec<String>) -> Option<usize> {
    match tokio::task::spawn_blocking(move || select(prompt, items)).await {
        Ok(Ok(index)) => Some(index),
        Ok(Err(e)) => {
            warn!("Prompt failed: {}", e);
            None
        }
        Err(e) => {
            warn!("Prompt task failed: {}", e);
            None
        }
    }
}

fn describe(film: &ResolvedFilm) -> String {
    let year = film
        .year()
        .map(|y| format!(" ({})", y))
        .unwrap_or_default();
    match &film.matched {
        Some(m) => format!(
            "{} -> {}{} [tmdb {}, similarity {:.2}]",
            film.descriptor.path.display(),
            film.title(),
            year,
            m.catalog_id,
            m.similarity
        ),
        None => format!(
            "{} -> {}{} [no match]",
            film.descriptor.path.display(),
            film.title(),
            year
        ),
    }
}

#[async_trait]
impl Reviewer for TerminalReviewer {
    async fn review_match(&self, film: &ResolvedFilm) -> MatchChoice {
        let mut items = vec!["Accept".to_string()];
        items.extend(film.alternates.iter().map(|alt| {
            let year = alt.year.map(|y| format!(" ({})", y)).unwrap_or_default();
            format!("Use {}{} [tmdb {}]", alt.title, year, alt.id)
        }));
        items.push("Name from the file name".to_string());
        items.push("Skip".to_string());

        let alternates = film.alternates.len();
        match ask(describe(film), items).await {
            Some(0) => MatchChoice::Accept,
            Some(i) if i <= alternates => MatchChoice::PickAlternate(i - 1),
            Some(i) if i == alternates + 1 => MatchChoice::ForceOffline,
            _ => MatchChoice::Skip,
        }
    }

    async fn review_duplicates(
        &self,
        film: &ResolvedFilm,
        duplicates: &[DuplicateCandidate],
        decisions: &[Decision],
    ) -> DuplicateChoice {
        let mut prompt = format!("{} already exists:", film.title());
        for (dup, decision) in duplicates.iter().zip(decisions) {
            prompt.push_str(&format!(
                "\n  {} ({} {}, {} bytes): {:?}",
                dup.existing.path.display(),
                dup.existing.media,
                dup.existing.quality,
                dup.existing.size_bytes,
                decision
            ));
        }
        let items = vec![
            "Accept".to_string(),
            "Upgrade".to_string(),
            "Keep both".to_string(),
            "Skip".to_string(),
        ];

        match ask(prompt, items).await {
            Some(0) => DuplicateChoice::Accept,
            Some(1) => DuplicateChoice::Upgrade,
            Some(2) => DuplicateChoice::KeepBoth,
            _ => DuplicateChoice::Skip,
        }
    }
}
