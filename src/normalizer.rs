//! Cleanup of raw model output.
//!
//! Everything here is pure and deterministic. `clean` and `parse_topics` are
//! idempotent: feeding their output back in returns it unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound on topics taken from an AI backend.
pub const MAX_AI_TOPICS: usize = 8;

static LEAD_IN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:sure[,!.]?\s*)?here(?:['’]s| is| are)\b[^\n:]*:[ \t]*\n?")
        .expect("lead-in pattern is valid")
});

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Trims the text and unwraps it from a surrounding fenced code block.
///
/// The closing fence is only removed when the text opened with one, so a
/// README that merely ends in a code sample keeps its closing fence.
pub fn clean(text: &str) -> String {
    let mut current = text.trim();

    while let Some(rest) = strip_opening_fence(current) {
        current = strip_closing_fence(rest).trim();
    }

    current.to_string()
}

fn strip_opening_fence(text: &str) -> Option<&str> {
    if !text.starts_with("```") {
        return None;
    }
    Some(match text.find('\n') {
        Some(idx) => &text[idx + 1..],
        None => "",
    })
}

fn strip_closing_fence(text: &str) -> &str {
    let trimmed = text.trim_end();
    match trimmed.rfind('\n') {
        Some(idx) if trimmed[idx + 1..].trim() == "```" => &trimmed[..idx],
        None if trimmed.trim() == "```" => "",
        _ => trimmed,
    }
}

/// Drops a chatty opener such as "Here's a description for your project:".
pub fn strip_lead_in(text: &str) -> String {
    let trimmed = text.trim();
    LEAD_IN.replace(trimmed, "").trim().to_string()
}

/// Cleanup for backends that like to announce their answer first.
pub fn clean_local(text: &str) -> String {
    clean(&strip_lead_in(&clean(text)))
}

/// Splits a comma-separated topic list into unique, lowercase,
/// hyphenated topics, keeping first-seen order and at most `max` entries.
pub fn parse_topics(text: &str, max: usize) -> Vec<String> {
    dedup_topics(text.split(','), max)
}

/// Normalises and deduplicates already-split topic candidates.
pub fn dedup_topics<'a, I>(candidates: I, max: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut topics: Vec<String> = Vec::new();
    for candidate in candidates {
        let topic = WHITESPACE
            .replace_all(candidate.trim(), "-")
            .to_lowercase();
        if topic.is_empty() || topics.contains(&topic) {
            continue;
        }
        if topics.len() == max {
            break;
        }
        topics.push(topic);
    }
    topics
}
