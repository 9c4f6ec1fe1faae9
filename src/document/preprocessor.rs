//! Text cleaning and splitting
//!
//! Splitting happens before documents are created, so each segment becomes
//! its own [`super::Document`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::OnceLock;

/// How a file's text is divided into documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// One document per file
    None,
    /// One document per blank-line separated paragraph
    Paragraph,
    /// Windows of `split_length` words
    Word,
}

impl SplitMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "paragraph" => Some(Self::Paragraph),
            "word" => Some(Self::Word),
            _ => None,
        }
    }
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

fn blank_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t\r]*\n").expect("valid blank line regex"))
}

/// Collapse every run of whitespace into a single space and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    whitespace_run().replace_all(text.trim(), " ").into_owned()
}

/// Split on blank lines, dropping empty paragraphs
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let text = text.replace("\r\n", "\n");
    blank_line()
        .split(&text)
        .map(normalize_whitespace)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Byte ranges of the sentences in `text`, trimmed of surrounding whitespace
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace (or the end of
/// the text), or at a newline.
pub fn split_sentences(text: &str) -> Vec<Range<usize>> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        let is_newline = c == '\n';
        if !is_newline && !matches!(c, '.' | '!' | '?') {
            continue;
        }

        let mut end = idx + c.len_utf8();
        if !is_newline {
            while let Some(&(next_idx, next)) = chars.peek() {
                if matches!(next, '.' | '!' | '?') {
                    end = next_idx + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
        }

        let at_boundary = is_newline || chars.peek().map_or(true, |&(_, n)| n.is_whitespace());
        if at_boundary {
            push_trimmed(text, start, end, &mut sentences);
            start = end;
        }
    }

    push_trimmed(text, start, text.len(), &mut sentences);
    sentences
}

fn push_trimmed(text: &str, start: usize, end: usize, out: &mut Vec<Range<usize>>) {
    let slice = &text[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    if leading + trailing < slice.len() {
        out.push(start + leading..end - trailing);
    }
}

/// Split into windows of at most `split_length` words
///
/// With `respect_sentence_boundary`, whole sentences are packed into each
/// window; a single sentence longer than the limit becomes its own window.
pub fn split_words(text: &str, split_length: usize, respect_sentence_boundary: bool) -> Vec<String> {
    let split_length = split_length.max(1);
    let text = normalize_whitespace(text);
    if text.is_empty() {
        return Vec::new();
    }

    if !respect_sentence_boundary {
        let words: Vec<&str> = text.split(' ').collect();
        return words.chunks(split_length).map(|w| w.join(" ")).collect();
    }

    let mut windows = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for range in split_sentences(&text) {
        let sentence = &text[range];
        let words = sentence.split(' ').count();

        if !current.is_empty() && current_word_count(&current) + words > split_length {
            windows.push(current.join(" "));
            current.clear();
        }

        if words > split_length {
            tracing::debug!(
                "Sentence of {} words exceeds split length {}, keeping it whole",
                words,
                split_length
            );
        }

        current.push(sentence);
    }

    if !current.is_empty() {
        windows.push(current.join(" "));
    }

    windows
}

fn current_word_count(sentences: &[&str]) -> usize {
    sentences.iter().map(|s| s.split(' ').count()).sum()
}
