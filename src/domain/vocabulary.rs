//! Tag-word extraction feeding the word → post search index.

use std::collections::HashSet;

/// Shortest word kept in the index, in characters.
pub const WORD_MIN_CHARS: usize = 3;
/// Longest word kept in the index, in characters.
pub const WORD_MAX_CHARS: usize = 255;

const EDGE_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '"', '\'', '(', ')', '[', ']', '{', '}',
];

/// Replaces every markup tag with a space. A `<` followed by whitespace or
/// the end of input is plain text; any other unterminated tag swallows the
/// rest of the input.
fn strip_tags(content: &str) -> String {
    let mut text = String::with_capacity(content.len());
    let mut in_tag = false;
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match (in_tag, c) {
            (false, '<') if chars.peek().is_some_and(|next| !next.is_whitespace()) => {
                in_tag = true
            }
            (false, c) => text.push(c),
            (true, '>') => {
                in_tag = false;
                text.push(' ');
            }
            (true, _) => {}
        }
    }
    text
}

/// Extracts the distinct index words of a post body.
///
/// Markup and line breaks are removed, entities are decoded, the text is split on whitespace,
/// sentence punctuation is trimmed from both ends of each token, and only
/// tokens of 3 to 255 characters survive. Case is preserved and the first
/// occurrence order is kept.
pub fn tokenize(content: &str) -> Vec<String> {
    let stripped = strip_tags(content);
    let text = html_escape::decode_html_entities(&stripped);
    let mut seen = HashSet::new();
    let mut words = Vec::new();
    for raw in text.split_whitespace() {
        let word = raw.trim_matches(EDGE_PUNCTUATION);
        let chars = word.chars().count();
        if !(WORD_MIN_CHARS..=WORD_MAX_CHARS).contains(&chars) {
            continue;
        }
        if seen.insert(word) {
            words.push(word.to_string());
        }
    }
    words
}
