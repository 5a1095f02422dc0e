//! Error results that can be returned from the css crates

use crate::span::Span;
use std::fmt::{Display, Formatter};

/// Parser error that defines an error (message) on the given position
#[derive(Clone, Debug, PartialEq)]
pub struct CssError {
    /// Error message
    pub message: String,
    /// Source range of the error, if available (during tokenizing mostly)
    pub span: Option<Span>,
}

impl CssError {
    #[must_use]
    pub fn new(message: &str) -> Self {
        CssError {
            message: message.to_string(),
            span: None,
        }
    }

    #[must_use]
    pub fn with_span(message: &str, span: Span) -> Self {
        CssError {
            message: message.to_string(),
            span: Some(span),
        }
    }
}

impl Display for CssError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.span {
            Some(span) => write!(f, "{} at {}", self.message, span),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for CssError {}

pub type CssResult<T> = Result<T, CssError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(CssError::new("oops").to_string(), "oops");
        assert_eq!(
            CssError::with_span("unterminated string", Span::new(3, 9)).to_string(),
            "unterminated string at 3..9"
        );
    }
}
