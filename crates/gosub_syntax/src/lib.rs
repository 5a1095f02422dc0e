//! CSS value definition syntax
//!
//! This crate compiles the value definition grammars used by the css specifications
//! (`<length>{1,4} | auto`, `[ <bg-layer> , ]* <final-bg-layer>`) and matches css values
//! against them.
//!
//! ```text
//! let grammar = parse("<line-width> || <line-style> || <color>")?;
//! let values = gosub_css3::parse_value("1px solid red")?;
//! let result = match_values(&values, &grammar, &MatchOptions::default());
//! ```

pub mod builtin;
pub mod combination;
pub mod definitions;
pub mod errors;
pub mod matcher;
pub mod parser;
pub mod syntax;

pub use definitions::{get_css_definitions, CssDefinitions, PropertyDefinition, SyntaxDefinition};
pub use errors::{MatchError, SyntaxError};
pub use matcher::{match_values, MatchOptions, MatchRecord, MatchResult, MatchType};
pub use parser::parse;
pub use syntax::GrammarNode;
