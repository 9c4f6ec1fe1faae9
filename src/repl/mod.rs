//! Interactive question loop
//!
//! States: `AwaitingQuery` → `Retrieving` → `Printing` → `AwaitingQuery`,
//! until end of input or the quit command moves to `Terminated`. Reading
//! answers happens inside the pipeline run, so it has no state of its own.

use crate::error::{QaError, Result};
use crate::pipeline::{Pipeline, Prediction};
use std::io::{BufRead, Write};

/// Loop settings
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Printed before every read
    pub prompt: String,
    /// Input that ends the loop; `None` means only end of input does
    pub quit_command: Option<String>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            prompt: "Q: ".to_string(),
            quit_command: None,
        }
    }
}

/// Where the loop currently is
#[derive(Debug)]
pub enum LoopState {
    AwaitingQuery,
    Retrieving(String),
    Printing(Prediction),
    Terminated,
}

/// Counters reported when the loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Queries sent to the pipeline
    pub queries: usize,
}

/// Run `pipeline` on every line read from `input` until end of input or quit
///
/// The quit command must match the whole line exactly; surrounding spaces
/// make it an ordinary query. Blank lines re-prompt without running the
/// pipeline. Any pipeline or I/O error ends the loop and is returned.
pub fn run_loop<P, I, O, F>(
    pipeline: &P,
    input: &mut I,
    output: &mut O,
    config: &LoopConfig,
    mut print: F,
) -> Result<LoopStats>
where
    P: Pipeline + ?Sized,
    I: BufRead,
    O: Write,
    F: FnMut(&Prediction, &mut O) -> Result<()>,
{
    let mut stats = LoopStats::default();
    let mut state = LoopState::AwaitingQuery;

    loop {
        state = match state {
            LoopState::AwaitingQuery => {
                write!(output, "{}", config.prompt).map_err(io_error)?;
                output.flush().map_err(io_error)?;

                let mut line = String::new();
                let read = input.read_line(&mut line).map_err(io_error)?;
                let raw = line.trim_end_matches(|c| c == '\n' || c == '\r');
                let query = raw.trim();

                if read == 0 {
                    // Keep the shell prompt on its own line
                    writeln!(output).map_err(io_error)?;
                    LoopState::Terminated
                } else if config.quit_command.as_deref() == Some(raw) {
                    LoopState::Terminated
                } else if query.is_empty() {
                    LoopState::AwaitingQuery
                } else {
                    LoopState::Retrieving(query.to_string())
                }
            }
            LoopState::Retrieving(query) => {
                stats.queries += 1;
                tracing::debug!("Running pipeline for query {}", stats.queries);
                LoopState::Printing(pipeline.run(&query)?)
            }
            LoopState::Printing(prediction) => {
                print(&prediction, output)?;
                LoopState::AwaitingQuery
            }
            LoopState::Terminated => break,
        };
    }

    tracing::info!("Session ended after {} queries", stats.queries);
    Ok(stats)
}

fn io_error(e: std::io::Error) -> QaError {
    QaError::io(e, "Interactive loop I/O failed")
}
