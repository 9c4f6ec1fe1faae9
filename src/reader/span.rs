//! Answer span extraction shared by every reader
//!
//! A sentence is tokenised into alphanumeric runs. Tokens that appear in the
//! question are anchors; the answer is the contiguous run of non-anchor,
//! non-stopword tokens nearest to an anchor.

use crate::document::{Answer, Document, Span};
use ahash::AHashSet;

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "before", "being", "but", "by", "can", "could", "did", "do", "does", "during", "for", "from",
    "had", "has", "have", "he", "her", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "many", "much", "of", "on", "or", "our", "she", "should", "so", "some", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "those", "to", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "whose", "why", "will",
    "with", "would", "you", "your", "s", "t",
];

/// Word token with byte offsets into the document content
#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub start: usize,
    pub end: usize,
    pub norm: String,
}

/// Tokenise `text`; offsets are shifted by `base`
pub(crate) fn tokenize(text: &str, base: usize) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices() {
        if c.is_alphanumeric() {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            tokens.push(token(text, s, i, base));
        }
    }
    if let Some(s) = start {
        tokens.push(token(text, s, text.len(), base));
    }

    tokens
}

fn token(text: &str, start: usize, end: usize, base: usize) -> Token {
    Token {
        start: base + start,
        end: base + end,
        norm: text[start..end].to_lowercase(),
    }
}

pub(crate) fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Lowercased question words, stopwords removed
pub(crate) fn question_terms(question: &str) -> AHashSet<String> {
    tokenize(question, 0)
        .into_iter()
        .map(|t| t.norm)
        .filter(|w| !is_stopword(w))
        .collect()
}

/// Fraction of question terms present in `tokens`
pub(crate) fn term_overlap(tokens: &[Token], terms: &AHashSet<String>) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let present: AHashSet<&str> = tokens
        .iter()
        .filter(|t| terms.contains(&t.norm))
        .map(|t| t.norm.as_str())
        .collect();
    present.len() as f32 / terms.len() as f32
}

/// Candidate answer within one sentence
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub start: usize,
    pub end: usize,
    /// 1 / (1 + token distance to the nearest anchor); 0.5 without anchors
    pub proximity: f32,
}

impl Candidate {
    /// Combine with sentence relevance into a confidence in (0, 1]
    pub fn confidence(&self, relevance: f32) -> f32 {
        (relevance * (0.5 + 0.5 * self.proximity)).clamp(f32::EPSILON, 1.0)
    }
}

/// Best answer span among `tokens`, at most `max_len` tokens long
pub(crate) fn best_span(
    tokens: &[Token],
    terms: &AHashSet<String>,
    max_len: usize,
) -> Option<Candidate> {
    let anchors: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| terms.contains(&t.norm))
        .map(|(i, _)| i)
        .collect();
    let is_candidate = |t: &Token| !terms.contains(&t.norm) && !is_stopword(&t.norm);

    let mut best: Option<(Candidate, usize)> = None;
    let mut i = 0;
    while i < tokens.len() {
        if !is_candidate(&tokens[i]) {
            i += 1;
            continue;
        }

        let run_start = i;
        while i < tokens.len() && is_candidate(&tokens[i]) {
            i += 1;
        }
        let (from, to) = clip_run(run_start, i, &anchors, max_len.max(1));

        let proximity = anchors
            .iter()
            .map(|&a| if a < from { from - a } else { a + 1 - to })
            .min()
            .map(|d| 1.0 / (1.0 + d as f32))
            .unwrap_or(0.5);
        let candidate = Candidate {
            start: tokens[from].start,
            end: tokens[to - 1].end,
            proximity,
        };
        let len = to - from;

        let better = match &best {
            None => true,
            Some((current, current_len)) => {
                candidate.proximity > current.proximity
                    || (candidate.proximity == current.proximity && len > *current_len)
            }
        };
        if better {
            best = Some((candidate, len));
        }
    }

    best.map(|(candidate, _)| candidate)
}

/// Shorten a run to `max_len` tokens, keeping the end nearest an anchor
fn clip_run(from: usize, to: usize, anchors: &[usize], max_len: usize) -> (usize, usize) {
    if to - from <= max_len {
        return (from, to);
    }
    let anchor_after = anchors.iter().any(|&a| a >= to);
    let anchor_before = anchors.iter().any(|&a| a < from);
    if anchor_after && !anchor_before {
        (to - max_len, to)
    } else {
        (from, from + max_len)
    }
}

/// Build an [`Answer`] for the byte span `[start, end)` of `document`
///
/// The context is a window of `context_window` characters centred on the
/// answer, never shorter than the answer itself.
pub(crate) fn make_answer(
    document: &Document,
    start: usize,
    end: usize,
    score: f32,
    context_window: usize,
) -> Answer {
    let content = &document.content;
    let char_start = content[..start].chars().count();
    let answer_chars = content[start..end].chars().count();
    let char_end = char_start + answer_chars;
    let total_chars = char_start + content[start..].chars().count();

    let width = context_window.max(answer_chars);
    let pad = (width - answer_chars) / 2;
    let mut ctx_start = char_start.saturating_sub(pad);
    let ctx_end = (ctx_start + width).min(total_chars);
    ctx_start = ctx_start.min(ctx_end.saturating_sub(width));

    let byte_at = |n: usize| {
        content
            .char_indices()
            .nth(n)
            .map(|(i, _)| i)
            .unwrap_or(content.len())
    };

    Answer {
        answer: content[start..end].to_string(),
        score,
        context: content[byte_at(ctx_start)..byte_at(ctx_end)].to_string(),
        offsets_in_document: Span {
            start: char_start,
            end: char_end,
        },
        offsets_in_context: Span {
            start: char_start - ctx_start,
            end: char_end - ctx_start,
        },
        document_id: document.id.clone(),
        meta: document.meta.clone(),
    }
}

/// Order answers by confidence (stable, so document order breaks ties)
pub(crate) fn rank(mut answers: Vec<Answer>, top_k: usize) -> Vec<Answer> {
    answers.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    answers.truncate(top_k);
    answers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_text<'a>(text: &'a str, question: &str, max_len: usize) -> Option<&'a str> {
        let tokens = tokenize(text, 0);
        best_span(&tokens, &question_terms(question), max_len).map(|c| &text[c.start..c.end])
    }

    fn char_slice(text: &str, span: Span) -> String {
        text.chars().skip(span.start).take(span.end - span.start).collect()
    }

    #[test]
    fn test_tokenize_offsets() {
        let tokens = tokenize("Hi, Jon's sword!", 10);
        let norms: Vec<&str> = tokens.iter().map(|t| t.norm.as_str()).collect();
        assert_eq!(norms, vec!["hi", "jon", "s", "sword"]);
        assert_eq!(tokens[0].start, 10);
        assert_eq!(tokens[3].end, 25);
    }

    #[test]
    fn test_question_terms_drop_stopwords() {
        let terms = question_terms("What color is the sky?");
        assert_eq!(terms.len(), 2);
        assert!(terms.contains("color"));
        assert!(terms.contains("sky"));
    }

    #[test]
    fn test_best_span() {
        assert_eq!(span_text("The sky is blue.", "What color is the sky?", 15), Some("blue"));
        assert_eq!(
            span_text("Jon Snow is the son of Ned Stark", "Who is the father of Jon Snow?", 15),
            Some("son")
        );
        assert_eq!(
            span_text(
                "The lord of Winterfell is Eddard Stark",
                "Who is the lord of Winterfell?",
                15
            ),
            Some("Eddard Stark")
        );
        assert_eq!(span_text("The sky.", "sky", 15), None);
    }

    #[test]
    fn test_span_is_clipped() {
        let text = "Arya lives far beyond the narrow sea";
        assert_eq!(span_text(text, "Arya", 2), Some("lives far"));
    }

    #[test]
    fn test_overlap() {
        let tokens = tokenize("The sky is blue", 0);
        let overlap = term_overlap(&tokens, &question_terms("What color is the sky?"));
        assert!((overlap - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_answer_offsets() {
        let doc = Document::from_text("Ünïcode first. The sky is blue. Then more text follows.");
        let start = doc.content.find("blue").unwrap();
        let answer = make_answer(&doc, start, start + 4, 0.5, 12);

        assert_eq!(answer.answer, "blue");
        assert_eq!(char_slice(&doc.content, answer.offsets_in_document), "blue");
        assert_eq!(char_slice(&answer.context, answer.offsets_in_context), "blue");
        assert_eq!(answer.context.chars().count(), 12);
    }

    #[test]
    fn test_context_window_at_edges() {
        let doc = Document::from_text("blue sky");
        let answer = make_answer(&doc, 0, 4, 0.5, 150);
        assert_eq!(answer.context, "blue sky");
        assert_eq!(answer.offsets_in_context, Span { start: 0, end: 4 });

        let doc = Document::from_text("a very long sentence that ends in blue");
        let start = doc.content.find("blue").unwrap();
        let answer = make_answer(&doc, start, start + 4, 0.5, 10);
        assert_eq!(answer.context.chars().count(), 10);
        assert!(answer.context.ends_with("blue"));
        assert_eq!(char_slice(&answer.context, answer.offsets_in_context), "blue");
    }
}
