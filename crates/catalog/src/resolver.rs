use std::io;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::decision::{ArtistChoice, DecisionChannel};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverPolicy {
    pub max_suggestions: usize,
    pub similarity_threshold: f64,
    pub confirm_unmatched: bool,
    pub placeholder_names: Vec<String>,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            max_suggestions: 5,
            similarity_threshold: 0.8,
            confirm_unmatched: true,
            placeholder_names: vec![
                "unknown".to_string(),
                "unknown artist".to_string(),
                "various".to_string(),
                "various artists".to_string(),
                "va".to_string(),
            ],
        }
    }
}

pub fn suggest(
    name: &str,
    known_names: &[String],
    max_suggestions: usize,
    similarity_threshold: f64,
) -> Vec<String> {
    let needle = name.to_lowercase();
    let mut scored: Vec<(f64, usize)> = known_names
        .iter()
        .enumerate()
        .filter_map(|(idx, known)| {
            let score = strsim::jaro_winkler(&needle, &known.to_lowercase());
            (score >= similarity_threshold).then_some((score, idx))
        })
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(_, idx)| known_names[idx].clone())
        .collect()
}

#[derive(Clone, Debug, Default)]
pub struct FuzzyResolver {
    policy: ResolverPolicy,
}

impl FuzzyResolver {
    pub fn new(policy: ResolverPolicy) -> Self {
        Self { policy }
    }

    pub fn suggest(&self, name: &str, known_names: &[String]) -> Vec<String> {
        suggest(
            name,
            known_names,
            self.policy.max_suggestions,
            self.policy.similarity_threshold,
        )
    }

    pub fn is_placeholder(&self, name: &str) -> bool {
        let name = name.trim();
        self.policy
            .placeholder_names
            .iter()
            .any(|placeholder| placeholder.eq_ignore_ascii_case(name))
    }

    pub fn decide(
        &self,
        name: &str,
        suggestions: &[String],
        channel: &mut dyn DecisionChannel,
    ) -> io::Result<String> {
        let unmatched = suggestions.is_empty() && !self.is_placeholder(name);
        if unmatched && !self.policy.confirm_unmatched {
            debug!("No close match for {:?}; accepted as new artist", name);
            return Ok(name.to_string());
        }

        loop {
            match channel.choose_artist(name, suggestions)? {
                ArtistChoice::Literal => return Ok(name.to_string()),
                ArtistChoice::Suggestion(idx) => match suggestions.get(idx) {
                    Some(chosen) => return Ok(chosen.clone()),
                    None => {
                        warn!("Suggestion {} does not exist for {:?}; asking again", idx, name)
                    }
                },
                ArtistChoice::Replacement(value) => {
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        return Ok(trimmed.to_string());
                    }
                    warn!("Empty replacement for {:?}; asking again", name);
                }
            }
        }
    }
}
