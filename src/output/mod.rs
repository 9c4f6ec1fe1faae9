//! Printing predictions to a writer
//!
//! Results go to the writer (stdout in the binary); logs go to stderr.

use crate::error::{QaError, Result};
use crate::pipeline::Prediction;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// How much of each answer to print
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Details {
    /// Answer text and its context
    #[default]
    #[serde(alias = "minimal")]
    Minimum,
    /// Adds the score
    Medium,
    /// Every answer field, as JSON
    All,
}

impl Details {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "minimum" | "minimal" => Some(Self::Minimum),
            "medium" => Some(Self::Medium),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Print the answers of a prediction
pub fn print_answers(prediction: &Prediction, details: Details, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Query: {}", prediction.query).map_err(write_error)?;

    if prediction.answers.is_empty() {
        writeln!(out, "No answers found.").map_err(write_error)?;
        return Ok(());
    }

    writeln!(out, "Answers:").map_err(write_error)?;
    for answer in &prediction.answers {
        match details {
            Details::Minimum => {
                writeln!(out, "  - answer: {}", answer.answer).map_err(write_error)?;
                writeln!(out, "    context: {}", answer.context).map_err(write_error)?;
            }
            Details::Medium => {
                writeln!(out, "  - answer: {}", answer.answer).map_err(write_error)?;
                writeln!(out, "    context: {}", answer.context).map_err(write_error)?;
                writeln!(out, "    score: {:.4}", answer.score).map_err(write_error)?;
            }
            Details::All => {
                let json = serde_json::to_string_pretty(answer).map_err(|e| QaError::Json {
                    source: e,
                    context: "Failed to serialize answer".to_string(),
                })?;
                writeln!(out, "{}", json).map_err(write_error)?;
            }
        }
    }

    Ok(())
}

/// Print retrieved documents as `<index> <preview>` lines, index starting at 0
///
/// `medium` adds each document's id and score; `all` also adds its metadata.
pub fn print_documents(
    prediction: &Prediction,
    preview_chars: usize,
    details: Details,
    out: &mut impl Write,
) -> Result<()> {
    for (i, scored) in prediction.documents.iter().enumerate() {
        writeln!(out, "{} {}", i, scored.document.preview(preview_chars)).map_err(write_error)?;
        if details == Details::Minimum {
            continue;
        }

        writeln!(out, "    id: {}", scored.document.id).map_err(write_error)?;
        writeln!(out, "    score: {:.4}", scored.score).map_err(write_error)?;
        if details == Details::All {
            let meta = serde_json::to_string(&scored.document.meta).map_err(|e| QaError::Json {
                source: e,
                context: "Failed to serialize document metadata".to_string(),
            })?;
            writeln!(out, "    meta: {}", meta).map_err(write_error)?;
        }
    }
    Ok(())
}

/// Print the query with answer and document counts
pub fn print_prediction_summary(prediction: &Prediction, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "Query: {} ({} answers, {} documents)",
        prediction.query,
        prediction.answers.len(),
        prediction.documents.len()
    )
    .map_err(write_error)
}

fn write_error(e: std::io::Error) -> QaError {
    QaError::io(e, "Failed to write results")
}
