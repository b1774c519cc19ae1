//! Title comparison.

/// Calculate Levenshtein edit distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    // two rows are enough
    let mut previous: Vec<usize> = (0..=b_len).collect();
    let mut current = vec![0usize; b_len + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_len]
}

/// Remove a leading `the`/`a`/`an` or a trailing `, the`.
pub fn strip_articles(title: &str) -> String {
    let trimmed = title.trim();
    let lower = trimmed.to_lowercase();
    for article in ["the ", "a ", "an "] {
        if lower.starts_with(article) && trimmed.len() > article.len() {
            return trimmed[article.len()..].trim().to_string();
        }
    }
    if lower.ends_with(", the") {
        return trimmed[..trimmed.len() - 5].trim().to_string();
    }
    trimmed.to_string()
}

/// Lowercase words of a title without articles or punctuation, sorted.
pub fn comparison_key(title: &str) -> String {
    let stripped = strip_articles(title).to_lowercase();
    let mut words: Vec<String> = stripped
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    words.sort();
    words.join(" ")
}

/// Case- and punctuation-insensitive similarity in 0.0-1.0, word order ignored.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = comparison_key(a);
    let b = comparison_key(b);
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(&a, &b) as f64 / longest as f64
}

/// Normalized identity used to find duplicates: lowercase alphanumeric words.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
