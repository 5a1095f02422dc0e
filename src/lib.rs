//! Gosub css value syntax tooling
//!
//! Thin layer over the workspace crates that is shared by the `syntax-matcher` binary, the
//! integration tests and the benchmarks.

use anyhow::{anyhow, Context};
use gosub_shared::types::{Error, Result};
use gosub_syntax::{get_css_definitions, parse, CssDefinitions, GrammarNode, MatchResult};
use std::fmt::Write;
use std::path::PathBuf;

pub use gosub_css3 as css3;
pub use gosub_shared as shared;
pub use gosub_syntax as syntax;

/// Returns the built-in definitions extended with the given definition files
pub fn load_definitions(files: &[PathBuf]) -> Result<CssDefinitions> {
    let mut definitions = get_css_definitions().clone();
    for file in files {
        definitions.load_file(file)?;
    }
    Ok(definitions)
}

/// Compiles a grammar, or returns the syntax of the property when `property` is set
pub fn compile_grammar(definitions: &CssDefinitions, source: &str, property: bool) -> Result<GrammarNode> {
    if property {
        return definitions
            .find_property(source)
            .map(|p| p.syntax().clone())
            .ok_or_else(|| anyhow!(Error::Config(format!("unknown property '{source}'"))));
    }

    parse(source)
        .map_err(|e| Error::Parse(e.to_string()))
        .with_context(|| format!("could not compile grammar '{source}'"))
}

/// Human readable outcome of a match
pub fn report(result: &MatchResult<'_>) -> String {
    let mut out = String::new();

    let verdict = match (result.valid, result.ambiguous) {
        (true, true) => "valid (ambiguous)",
        (true, false) => "valid",
        (false, _) => "invalid",
    };
    let _ = writeln!(out, "{} after {} steps", verdict, result.steps);

    for record in &result.matches {
        let _ = writeln!(out, "  {:<40} {}", record.to_string(), record.span);
    }
    for error in &result.errors {
        let _ = writeln!(out, "  error: {}", error);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gosub_css3::parse_value;
    use gosub_syntax::{match_values, MatchOptions};

    #[test]
    fn compile_property_grammar() {
        let definitions = load_definitions(&[]).unwrap();
        let grammar = compile_grammar(&definitions, "border", true).unwrap();
        assert_eq!(grammar.to_string(), "<line-width> || <line-style> || <color>");

        assert!(compile_grammar(&definitions, "no-such-property", true).is_err());
        assert!(compile_grammar(&definitions, "a ||", false).is_err());
    }

    #[test]
    fn report_lists_records_and_errors() {
        let grammar = parse("<length> solid").unwrap();

        let values = parse_value("1px solid").unwrap();
        let result = match_values(&values, &grammar, &MatchOptions::default());
        let text = report(&result);
        assert!(text.starts_with("valid after"));
        assert!(text.contains("<length> => 1px"));
        assert!(text.contains("solid => solid"));

        let values = parse_value("1px dashed").unwrap();
        let result = match_values(&values, &grammar, &MatchOptions::default());
        let text = report(&result);
        assert!(text.starts_with("invalid"));
        assert!(text.contains("error: expected solid"));
    }

    #[test]
    fn missing_definition_file() {
        let err = load_definitions(&[PathBuf::from("/does/not/exist.json")]).unwrap_err();
        assert!(err.to_string().contains("could not read definitions file"));
    }
}
