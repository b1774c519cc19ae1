//! Title cleanup and casing.

use crate::config::ParserConfig;

const SEPARATORS: &[char] = &['.', '_', '-', '[', ']', '(', ')', '{', '}', '·'];
const KEEP_MARK: char = '\u{1}';

/// Remove the first matching configured prefix (longest first, case-insensitive).
pub fn strip_prefix<'a>(name: &'a str, prefixes: &[String]) -> &'a str {
    let mut sorted: Vec<&String> = prefixes.iter().collect();
    sorted.sort_by_key(|p| std::cmp::Reverse(p.len()));

    for prefix in sorted {
        if prefix.is_empty() || prefix.len() > name.len() {
            continue;
        }
        if let Some(head) = name.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                return &name[prefix.len()..];
            }
        }
    }
    name
}

/// Turn separators into spaces and collapse whitespace.
pub fn clean_separators(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if SEPARATORS.contains(&c) { ' ' } else { c })
        .collect();
    collapse_whitespace(&replaced)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `Matrix, The` becomes `The Matrix`.
fn move_trailing_article(title: &str) -> String {
    let lower = title.to_lowercase();
    for article in [", the", ", a", ", an"] {
        if lower.ends_with(article) {
            let cut = title.len() - article.len();
            let word = &title[cut + 2..];
            return format!("{} {}", word, title[..cut].trim_end());
        }
    }
    title.to_string()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

fn is_single_case(word: &str) -> bool {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    letters.iter().all(|c| c.is_lowercase()) || letters.iter().all(|c| c.is_uppercase())
}

/// Apply title case to a cleaned title.
///
/// Words written in a single case are re-cased; mixed-case words (`McQueen`,
/// `iRobot`) are left alone. `always_lower` words are lowercased except in
/// first position and `always_upper` words are uppercased anywhere.
pub fn title_case(title: &str, config: &ParserConfig) -> String {
    title
        .split(' ')
        .enumerate()
        .map(|(idx, word)| {
            if word.contains(KEEP_MARK) {
                return word.to_string();
            }
            if let Some(upper) = config
                .always_upper
                .iter()
                .find(|u| u.eq_ignore_ascii_case(word))
            {
                return upper.clone();
            }
            if idx > 0
                && config
                    .always_lower
                    .iter()
                    .any(|l| l.eq_ignore_ascii_case(word))
            {
                return word.to_lowercase();
            }
            if is_single_case(word) {
                capitalize(word)
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Swap `keep_period` tokens for placeholders so separator cleanup leaves
/// them intact. Returns the protected text and the tokens in placeholder order.
fn protect_keep_period(text: &str, keep: &[String]) -> (String, Vec<String>) {
    let mut result = text.to_string();
    let mut kept = Vec::new();

    for token in keep {
        if token.is_empty() {
            continue;
        }
        let lower = result.to_lowercase();
        let needle = token.to_lowercase();
        if let Some(pos) = lower.find(&needle) {
            let before_ok = result[..pos]
                .chars()
                .last()
                .map_or(true, |c| !c.is_alphanumeric());
            if before_ok && result.is_char_boundary(pos + needle.len()) {
                let placeholder = format!(" {}{}{} ", KEEP_MARK, kept.len(), KEEP_MARK);
                result.replace_range(pos..pos + needle.len(), &placeholder);
                kept.push(token.clone());
            }
        }
    }
    (result, kept)
}

fn restore_keep_period(text: &str, kept: &[String]) -> String {
    let mut result = text.to_string();
    for (idx, token) in kept.iter().enumerate() {
        let placeholder = format!("{}{}{}", KEEP_MARK, idx, KEEP_MARK);
        result = result.replace(&placeholder, token);
    }
    result
}

/// Produce a display title from the raw title region of a name.
///
/// `edition` is the matched edition text, removed before cleanup.
pub fn clean_title(raw: &str, edition: Option<&str>, config: &ParserConfig) -> String {
    let mut text = raw.to_string();
    if let Some(edition_text) = edition {
        if let Some(pos) = text.find(edition_text) {
            text.replace_range(pos..pos + edition_text.len(), " ");
        }
    }

    let (protected, kept) = protect_keep_period(&text, &config.keep_period);
    let cleaned = clean_separators(&protected);
    let cleaned = cleaned
        .trim_end_matches(|c: char| !c.is_alphanumeric() && c != KEEP_MARK)
        .trim()
        .to_string();
    let cleaned = move_trailing_article(&cleaned);
    let cased = title_case(&cleaned, config);
    collapse_whitespace(&restore_keep_period(&cased, &kept))
}
