//! Css value model and value tokenizer
//!
//! The value syntax matcher works on streams of [`value::ValueNode`]s. This crate produces
//! them from the text of a css value.

use crate::value::ValueNode;
use gosub_shared::errors::CssResult;

pub mod tokenizer;
pub mod value;

/// Tokenizes the text of a css value (the part after the colon of a declaration)
pub fn parse_value(source: &str) -> CssResult<Vec<ValueNode>> {
    let values = tokenizer::tokenize(source)?;
    log::debug!("tokenized '{}' into {} value nodes", source, values.len());
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    #[test]
    fn parse_value_skips_nothing() {
        let values = parse_value("1px /* c */ solid").unwrap();
        assert_eq!(values.len(), 5);
        assert!(values[1].is_trivia());
        assert!(matches!(values[2].kind, ValueKind::Comment(_)));
        assert_eq!(values[4].ident(), Some("solid"));
    }
}
