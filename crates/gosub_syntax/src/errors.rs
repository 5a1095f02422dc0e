//! Error results that can be returned from the syntax module
use crate::syntax::GrammarNode;
use gosub_shared::span::Span;
use thiserror::Error;

/// Grammar source could not be compiled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error: {message} at offset {offset}")]
pub struct SyntaxError {
    pub message: String,
    /// Byte offset into the grammar source
    pub offset: usize,
}

impl SyntaxError {
    pub fn new(message: &str, offset: usize) -> Self {
        SyntaxError {
            message: message.to_string(),
            offset,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("css: compilation error in '{name}': {source}")]
    CssCompile {
        name: String,
        #[source]
        source: SyntaxError,
    },

    #[error("css: definitions file error: {0}")]
    Definitions(#[from] serde_json::Error),
}

/// Reasons a value did not match a grammar
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError<'a> {
    /// The value at the span (empty at the end of the input) did not match the node
    #[error("expected {node} at {span}")]
    Mismatch { node: &'a GrammarNode, span: Span },

    /// The grammar matched, but values were left over
    #[error("unexpected values at {span}")]
    ValueOverflow { span: Span },

    #[error("matching stopped after {budget} steps")]
    BudgetExceeded { budget: usize },

    /// Reference to a data type or property without a definition
    #[error("unknown reference {node}")]
    Unresolved { node: &'a GrammarNode },
}
