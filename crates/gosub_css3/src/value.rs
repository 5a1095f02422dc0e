use gosub_shared::span::Span;
use std::fmt::{Display, Formatter};

pub type Number = f32;

/// Keywords that are valid for every property
pub const CSS_WIDE_KEYWORDS: [&str; 5] = ["inherit", "initial", "unset", "revert", "revert-layer"];

/// Category of a dimension, derived from its unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    Length,
    Angle,
    Time,
    Frequency,
    Resolution,
    Flex,
    /// A unit we do not know about
    Unknown,
}

const LENGTH_UNITS: &[&str] = &[
    "px", "cm", "mm", "q", "in", "pc", "pt", "em", "rem", "ex", "rex", "cap", "rcap", "ch", "rch", "ic", "ric", "lh",
    "rlh", "vw", "vh", "vi", "vb", "vmin", "vmax", "svw", "svh", "svi", "svb", "svmin", "svmax", "lvw", "lvh", "lvi",
    "lvb", "lvmin", "lvmax", "dvw", "dvh", "dvi", "dvb", "dvmin", "dvmax", "cqw", "cqh", "cqi", "cqb", "cqmin", "cqmax",
];

impl DimensionKind {
    /// Classifies a unit (case-insensitive)
    pub fn from_unit(unit: &str) -> DimensionKind {
        let unit = unit.to_ascii_lowercase();
        match unit.as_str() {
            "deg" | "grad" | "rad" | "turn" => DimensionKind::Angle,
            "s" | "ms" => DimensionKind::Time,
            "hz" | "khz" => DimensionKind::Frequency,
            "dpi" | "dpcm" | "dppx" | "x" => DimensionKind::Resolution,
            "fr" => DimensionKind::Flex,
            u if LENGTH_UNITS.contains(&u) => DimensionKind::Length,
            _ => DimensionKind::Unknown,
        }
    }

    /// Name of the css data type this dimension belongs to
    pub fn type_name(&self) -> &'static str {
        match self {
            DimensionKind::Length => "length",
            DimensionKind::Angle => "angle",
            DimensionKind::Time => "time",
            DimensionKind::Frequency => "frequency",
            DimensionKind::Resolution => "resolution",
            DimensionKind::Flex => "flex",
            DimensionKind::Unknown => "dimension",
        }
    }
}

/// The typed payload of a value node
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// A plain identifier (`auto`, `red`, `ease-in`)
    Ident(String),
    /// An identifier starting with two dashes (`--main-color`)
    DashedIdent(String),
    /// One of the css-wide keywords (`inherit`, `initial`, ...)
    CssWideKeyword(String),
    /// Quoted string, without the quotes
    String(String),
    /// Unquoted `url(...)` contents
    Url(String),
    Number(Number),
    Integer(i32),
    Percentage(Number),
    Dimension {
        value: Number,
        unit: String,
        kind: DimensionKind,
    },
    /// Function call with its (raw) arguments, including whitespace and comments
    Function {
        name: String,
        arguments: Vec<ValueNode>,
    },
    /// Hash color, without the `#`
    Color(String),
    /// Single character punctuation (`,`, `/`, `+`, ...)
    Literal(char),
    Whitespace,
    Comment(String),
    /// Anything we could not make sense of
    Invalid(String),
}

/// A single value token with its source range
#[derive(Debug, Clone, PartialEq)]
pub struct ValueNode {
    pub kind: ValueKind,
    pub span: Span,
}

impl ValueNode {
    pub fn new(kind: ValueKind, span: Span) -> Self {
        ValueNode { kind, span }
    }

    /// Whitespace and comments carry no meaning for matching
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, ValueKind::Whitespace | ValueKind::Comment(_))
    }

    pub fn is_comma(&self) -> bool {
        self.is_literal(',')
    }

    pub fn is_literal(&self, c: char) -> bool {
        matches!(self.kind, ValueKind::Literal(l) if l == c)
    }

    /// Returns the identifier text for ident-like values
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::Ident(s) | ValueKind::DashedIdent(s) | ValueKind::CssWideKeyword(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the function name when this value is a function call
    pub fn function_name(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::Function { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the numeric value for numbers, integers, percentages and dimensions
    pub fn numeric_value(&self) -> Option<f64> {
        match &self.kind {
            ValueKind::Number(n) | ValueKind::Percentage(n) => Some(f64::from(*n)),
            ValueKind::Integer(i) => Some(f64::from(*i)),
            ValueKind::Dimension { value, .. } => Some(f64::from(*value)),
            _ => None,
        }
    }

    /// True for a unitless zero
    pub fn is_zero(&self) -> bool {
        match self.kind {
            ValueKind::Integer(i) => i == 0,
            ValueKind::Number(n) => n == 0.0,
            _ => false,
        }
    }

    /// Name of the value category as used in data type names (`length`, `integer`, ...)
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ValueKind::Ident(_) => "custom-ident",
            ValueKind::DashedIdent(_) => "dashed-ident",
            ValueKind::CssWideKeyword(_) => "css-wide-keyword",
            ValueKind::String(_) => "string",
            ValueKind::Url(_) => "url",
            ValueKind::Number(_) => "number",
            ValueKind::Integer(_) => "integer",
            ValueKind::Percentage(_) => "percentage",
            ValueKind::Dimension { kind, .. } => kind.type_name(),
            ValueKind::Function { .. } => "function",
            ValueKind::Color(_) => "hex-color",
            ValueKind::Literal(_) => "literal",
            ValueKind::Whitespace => "whitespace",
            ValueKind::Comment(_) => "comment",
            ValueKind::Invalid(_) => "invalid",
        }
    }
}

impl Display for ValueNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ValueKind::Ident(s) | ValueKind::DashedIdent(s) | ValueKind::CssWideKeyword(s) => write!(f, "{}", s),
            ValueKind::String(s) => write!(f, "\"{}\"", s),
            ValueKind::Url(s) => write!(f, "url({})", s),
            ValueKind::Number(n) => write!(f, "{}", n),
            ValueKind::Integer(i) => write!(f, "{}", i),
            ValueKind::Percentage(n) => write!(f, "{}%", n),
            ValueKind::Dimension { value, unit, .. } => write!(f, "{}{}", value, unit),
            ValueKind::Function { name, arguments } => {
                write!(f, "{}(", name)?;
                for argument in arguments {
                    write!(f, "{}", argument)?;
                }
                write!(f, ")")
            }
            ValueKind::Color(c) => write!(f, "#{}", c),
            ValueKind::Literal(c) => write!(f, "{}", c),
            ValueKind::Whitespace => write!(f, " "),
            ValueKind::Comment(c) => write!(f, "/*{}*/", c),
            ValueKind::Invalid(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units() {
        assert_eq!(DimensionKind::from_unit("PX"), DimensionKind::Length);
        assert_eq!(DimensionKind::from_unit("cqmax"), DimensionKind::Length);
        assert_eq!(DimensionKind::from_unit("turn"), DimensionKind::Angle);
        assert_eq!(DimensionKind::from_unit("ms"), DimensionKind::Time);
        assert_eq!(DimensionKind::from_unit("kHz"), DimensionKind::Frequency);
        assert_eq!(DimensionKind::from_unit("dppx"), DimensionKind::Resolution);
        assert_eq!(DimensionKind::from_unit("fr"), DimensionKind::Flex);
        assert_eq!(DimensionKind::from_unit("furlong"), DimensionKind::Unknown);
    }

    #[test]
    fn display() {
        let node = ValueNode::new(
            ValueKind::Function {
                name: "rgb".into(),
                arguments: vec![
                    ValueNode::new(ValueKind::Integer(1), Span::new(4, 5)),
                    ValueNode::new(ValueKind::Whitespace, Span::new(5, 6)),
                    ValueNode::new(ValueKind::Percentage(50.0), Span::new(6, 9)),
                ],
            },
            Span::new(0, 10),
        );
        assert_eq!(node.to_string(), "rgb(1 50%)");
        assert_eq!(node.function_name(), Some("rgb"));
        assert_eq!(node.type_name(), "function");
    }
}
