/*!
 * Splitting text into provider-sized chunks.
 *
 * Text is cut after sentence-ending punctuation followed by whitespace, and
 * whole sentences are packed greedily into chunks. A sentence longer than the
 * limit is sliced at the limit. Lengths are counted in characters, and the
 * chunks concatenated reproduce the input exactly.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentence-ending punctuation followed by whitespace
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?。！？]\s+").expect("valid sentence boundary pattern"));

/// Split `text` into chunks of at most `limit` characters.
///
/// Returns no chunks for empty text. A `limit` of zero is treated as one.
pub fn split_into_chunks(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);

    if text.is_empty() {
        return Vec::new();
    }
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in sentences(text) {
        let sentence_len = sentence.chars().count();

        if current_len + sentence_len <= limit {
            current.push_str(sentence);
            current_len += sentence_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if sentence_len <= limit {
            current.push_str(sentence);
            current_len = sentence_len;
        } else {
            let mut pieces = hard_slice(sentence, limit);
            // the last piece may still share a chunk with the next sentence
            if let Some(last) = pieces.pop() {
                chunks.extend(pieces);
                current_len = last.chars().count();
                current = last;
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Sentences of `text`, each keeping its trailing whitespace
fn sentences(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        result.push(&text[start..boundary.end()]);
        start = boundary.end();
    }
    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Cut `text` into pieces of exactly `limit` characters, the last one shorter
fn hard_slice(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(limit).map(|piece| piece.iter().collect()).collect()
}
