//! docqa - question answering and semantic search over a directory of text
//!
//! Text files are split into documents and indexed into a document store.
//! Questions are then answered interactively: a retriever narrows the store
//! down to candidate documents and a reader extracts answer spans from them,
//! or the retrieved documents are shown directly.

pub mod app;
pub mod cli;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod reader;
pub mod repl;
pub mod retrieval;
pub mod store;

pub use error::{QaError, Result};
