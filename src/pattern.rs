//! Pattern helpers shared by the tokenizer and the state machine.

use regex::{Captures, Regex};

use crate::error::LexResult;
use crate::iter::{Chunk, Decoded};

/// Longest excerpt of input quoted in a no-match error, in characters.
const EXCERPT_CHARS: usize = 24;

/// Compile `pattern` so it only matches at the start of the window.
pub(crate) fn anchored(pattern: &str) -> LexResult<Regex> {
    Ok(Regex::new(&format!(r"\A(?:{pattern})"))?)
}

/// The decodable text of a chunk, and the absolute position of the bytes
/// after it that will never decode, if any.
///
/// `at_end` says the chunk runs to the end of the input, so a character cut
/// off at its end will never be completed.
pub(crate) fn window_text<C: Chunk>(
    chunk: &C,
    base: usize,
    at_end: bool,
) -> (&str, Option<usize>) {
    let (text, decoded) = chunk.as_text();
    let stop = match decoded {
        Decoded::Complete => None,
        Decoded::Split if !at_end => None,
        Decoded::Split => Some(text.len()),
        Decoded::Invalid(offset) => Some(offset),
    };
    (text, stop.map(|offset| base + offset))
}

/// The first of `patterns` to match `text`, by index.
pub(crate) fn first_match<'p, 't>(
    patterns: impl IntoIterator<Item = &'p Regex>,
    text: &'t str,
) -> Option<(usize, Captures<'t>)> {
    patterns
        .into_iter()
        .enumerate()
        .find_map(|(index, pattern)| pattern.captures(text).map(|captures| (index, captures)))
}

/// The full text of a match.
pub(crate) fn matched<'t>(captures: &Captures<'t>) -> &'t str {
    captures.get(0).map_or("", |m| m.as_str())
}

/// A short, display-ready piece of the window.
pub(crate) fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let mut out: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        out.push_str("...");
    }
    out
}
