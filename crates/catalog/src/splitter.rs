use std::io;

use common::ArtistCredit;
use tracing::debug;

use crate::decision::DecisionChannel;
use crate::decision_log::DecisionLog;
use crate::registry::ArtistRegistry;

const LEADING_ARTICLES: [&str; 2] = ["the ", "de "];
const TRAILING_ARTICLES: [&str; 2] = [", the", ", de"];

// Order matters: at any position the first matching pattern wins.
const SEPARATORS: [&str; 25] = [
    "Featuring",
    "featuring",
    "FEATURING",
    "FEAT ",
    "Feat ",
    "feat ",
    "feat.",
    "Feat.",
    "FEAT.",
    " ft.",
    " ft ",
    " Ft.",
    "&",
    "+",
    ",",
    "/",
    ";",
    " and ",
    " AND ",
    " And ",
    " with ",
    " WITH ",
    " guest ",
    " Guest ",
    " GUEST ",
];

pub fn normalize(name: &str) -> String {
    let name = strip_leading_articles(name.trim());
    let name = strip_trailing_articles(name);
    name.trim().to_string()
}

fn strip_leading_articles(mut name: &str) -> &str {
    for article in LEADING_ARTICLES {
        if let Some(head) = name.get(..article.len()) {
            if head.eq_ignore_ascii_case(article) {
                name = name[article.len()..].trim_start();
            }
        }
    }
    name
}

fn strip_trailing_articles(mut name: &str) -> &str {
    for article in TRAILING_ARTICLES {
        if name.len() < article.len() {
            continue;
        }
        let cut = name.len() - article.len();
        if let Some(tail) = name.get(cut..) {
            if tail.eq_ignore_ascii_case(article) {
                name = name[..cut].trim_end();
            }
        }
    }
    name
}

fn tokenize(name: &str) -> Option<Vec<&str>> {
    let mut fragments = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    let mut found = false;
    while pos < name.len() {
        let rest = &name[pos..];
        let word_start = name[..pos]
            .chars()
            .next_back()
            .map_or(true, |prev| !prev.is_alphanumeric());
        let separator = SEPARATORS
            .iter()
            .find(|sep| rest.starts_with(*sep) && (word_start || !starts_with_letter(sep)));
        match separator {
            Some(sep) => {
                fragments.push(&name[start..pos]);
                pos += sep.len();
                start = pos;
                found = true;
            }
            None => {
                pos += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }
    if !found {
        return None;
    }
    fragments.push(&name[start..]);
    Some(fragments)
}

// Word separators such as "feat." only count at the start of a word.
fn starts_with_letter(sep: &str) -> bool {
    sep.chars().next().map_or(false, char::is_alphabetic)
}

pub fn auto_split(name: &str) -> Option<ArtistCredit> {
    let mut names = tokenize(name)?
        .into_iter()
        .map(|fragment| strip_leading_articles(fragment.trim()).to_string())
        .filter(|fragment| !fragment.is_empty());
    let primary = names.next()?;
    Some(ArtistCredit {
        primary,
        collaborators: names.collect(),
    })
}

pub fn split(
    raw: &str,
    registry: &ArtistRegistry,
    log: &mut DecisionLog,
    channel: &mut dyn DecisionChannel,
) -> io::Result<ArtistCredit> {
    let name = normalize(raw);
    if registry.contains(&name) {
        return Ok(ArtistCredit::solo(name));
    }
    if let Some(credit) = log.replay(&name) {
        debug!("Reusing previous split for {:?}", name);
        return Ok(credit.clone());
    }
    let proposal = match auto_split(&name) {
        Some(proposal) => proposal,
        None => return Ok(ArtistCredit::solo(name)),
    };
    if proposal.names().all(|part| registry.contains(part)) {
        return Ok(proposal);
    }

    let credit = if channel.confirm_split(&name, &proposal)? {
        proposal
    } else {
        manual_split(&name, channel)?
    };
    log.record(name, credit.clone());
    Ok(credit)
}

fn manual_split(name: &str, channel: &mut dyn DecisionChannel) -> io::Result<ArtistCredit> {
    let primary = normalize(&channel.enter_primary(name)?);
    let mut collaborators = Vec::new();
    while let Some(collaborator) = channel.enter_collaborator(name, &primary)? {
        let collaborator = normalize(&collaborator);
        if !collaborator.is_empty() {
            collaborators.push(collaborator);
        }
    }
    Ok(ArtistCredit {
        primary,
        collaborators,
    })
}
