use std::fmt::{Display, Formatter};

/// Represent either a finite number or infinity
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum NumberOrInfinity {
    Finite(f64),
    /// ∞
    Infinity,
    /// -∞
    NegativeInfinity,
}

impl NumberOrInfinity {
    pub fn as_f64(&self) -> f64 {
        match self {
            NumberOrInfinity::Finite(n) => *n,
            NumberOrInfinity::Infinity => f64::INFINITY,
            NumberOrInfinity::NegativeInfinity => f64::NEG_INFINITY,
        }
    }
}

impl Display for NumberOrInfinity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberOrInfinity::Finite(n) => write!(f, "{}", n),
            NumberOrInfinity::Infinity => write!(f, "∞"),
            NumberOrInfinity::NegativeInfinity => write!(f, "-∞"),
        }
    }
}

/// Represents a min and max range for a type definition (`<number [0,∞]>`)
#[derive(Clone, Debug, PartialEq)]
pub struct RangeType {
    /// Minimum value
    pub min: NumberOrInfinity,
    /// Maximum value
    pub max: NumberOrInfinity,
}

impl RangeType {
    pub fn new(min: NumberOrInfinity, max: NumberOrInfinity) -> Self {
        RangeType { min, max }
    }

    /// Returns true when the value lies within the range (bounds included)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min.as_f64() && value <= self.max.as_f64()
    }
}

impl Display for RangeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.min, self.max)
    }
}

/// How a multiplier was written in the grammar source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplierSyntax {
    /// !
    Required,
    /// ?
    Optional,
    /// +
    OneOrMore,
    /// *
    ZeroOrMore,
    /// {m}, {m,n} or {m,}
    Range,
    /// #
    Comma,
    /// #{m}, #{m,n} or #{m,}
    CommaRange,
    /// #?
    OptionalComma,
}

/// Multiplier for a node that defines how many times this node is allowed to appear
#[derive(Debug, Clone, Copy)]
pub struct Multiplier {
    /// Minimum number of repetitions
    pub min: usize,
    /// Maximum number of repetitions, `None` for unbounded
    pub max: Option<usize>,
    /// Repetitions are separated by commas
    pub list: bool,
    /// How the multiplier was written
    pub syntax: MultiplierSyntax,
}

impl PartialEq for Multiplier {
    /// Equality ignores how the multiplier was written
    fn eq(&self, other: &Self) -> bool {
        self.min == other.min && self.max == other.max && self.list == other.list
    }
}

impl Multiplier {
    pub fn new(min: usize, max: Option<usize>, list: bool, syntax: MultiplierSyntax) -> Self {
        Multiplier { min, max, list, syntax }
    }

    pub fn once() -> Self {
        Self::new(1, Some(1), false, MultiplierSyntax::Required)
    }

    pub fn optional() -> Self {
        Self::new(0, Some(1), false, MultiplierSyntax::Optional)
    }

    pub fn one_or_more() -> Self {
        Self::new(1, None, false, MultiplierSyntax::OneOrMore)
    }

    pub fn zero_or_more() -> Self {
        Self::new(0, None, false, MultiplierSyntax::ZeroOrMore)
    }

    pub fn range(min: usize, max: Option<usize>) -> Self {
        Self::new(min, max, false, MultiplierSyntax::Range)
    }

    pub fn comma() -> Self {
        Self::new(1, None, true, MultiplierSyntax::Comma)
    }

    pub fn comma_range(min: usize, max: Option<usize>) -> Self {
        Self::new(min, max, true, MultiplierSyntax::CommaRange)
    }

    pub fn optional_comma() -> Self {
        Self::new(0, None, true, MultiplierSyntax::OptionalComma)
    }

    /// True when the multiplier does not change anything (exactly one, no list)
    pub fn is_once(&self) -> bool {
        self.min == 1 && self.max == Some(1) && !self.list
    }

    /// Returns true when the given number of repetitions is allowed
    pub fn allows(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

fn write_range(f: &mut Formatter<'_>, min: usize, max: Option<usize>) -> std::fmt::Result {
    match max {
        Some(max) if max == min => write!(f, "{{{}}}", min),
        Some(max) => write!(f, "{{{},{}}}", min, max),
        None => write!(f, "{{{},}}", min),
    }
}

impl Display for Multiplier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.syntax {
            MultiplierSyntax::Required => write!(f, "!"),
            MultiplierSyntax::Optional => write!(f, "?"),
            MultiplierSyntax::OneOrMore => write!(f, "+"),
            MultiplierSyntax::ZeroOrMore => write!(f, "*"),
            MultiplierSyntax::Range => write_range(f, self.min, self.max),
            MultiplierSyntax::Comma => write!(f, "#"),
            MultiplierSyntax::CommaRange => {
                write!(f, "#")?;
                write_range(f, self.min, self.max)
            }
            MultiplierSyntax::OptionalComma => write!(f, "#?"),
        }
    }
}

/// The different ways children of a combinator are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinatorKind {
    /// All elements must be matched in order (space delimited)
    Juxtaposition,
    /// && (all elements must be matched in any order)
    AllOf,
    /// || (at least one element must be matched in any order)
    AnyOf,
    /// | (exactly one element must be matched)
    OneOf,
}

impl CombinatorKind {
    /// Binding strength, lower binds tighter
    fn precedence(&self) -> u8 {
        match self {
            CombinatorKind::Juxtaposition => 0,
            CombinatorKind::AllOf => 1,
            CombinatorKind::AnyOf => 2,
            CombinatorKind::OneOf => 3,
        }
    }

    /// Separator used when printing children
    fn separator(&self) -> &'static str {
        match self {
            CombinatorKind::Juxtaposition => " ",
            CombinatorKind::AllOf => " && ",
            CombinatorKind::AnyOf => " || ",
            CombinatorKind::OneOf => " | ",
        }
    }
}

impl Display for CombinatorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CombinatorKind::Juxtaposition => write!(f, "juxtaposition"),
            CombinatorKind::AllOf => write!(f, "&&"),
            CombinatorKind::AnyOf => write!(f, "||"),
            CombinatorKind::OneOf => write!(f, "|"),
        }
    }
}

/// A node of a compiled value definition grammar
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarNode {
    /// Reference to a data type (`<length>`, `<bg-layer>`), optionally with a range
    DataType {
        name: String,
        range: Option<RangeType>,
        multiplier: Option<Multiplier>,
    },
    /// Reference to the syntax of a property (`<'margin-left'>`)
    PropertyRef {
        name: String,
        range: Option<RangeType>,
        multiplier: Option<Multiplier>,
    },
    /// Generic keywords like 'left', 'right', 'ease-in' etc
    Keyword {
        name: String,
        multiplier: Option<Multiplier>,
    },
    /// Punctuation (`,` `/` `(` `)`) or a quoted literal (`'['`)
    Literal {
        text: String,
        enclosed: bool,
        multiplier: Option<Multiplier>,
    },
    /// Bracket group `[ ... ]`
    Group {
        children: Vec<GrammarNode>,
        multiplier: Option<Multiplier>,
    },
    /// `<boolean-expr[ inner ]>`. The expansion is the grammar that is actually matched.
    BooleanExpr {
        inner: Box<GrammarNode>,
        expansion: Box<GrammarNode>,
        multiplier: Option<Multiplier>,
    },
    Juxtaposition {
        children: Vec<GrammarNode>,
    },
    AllOf {
        children: Vec<GrammarNode>,
    },
    AnyOf {
        children: Vec<GrammarNode>,
    },
    OneOf {
        children: Vec<GrammarNode>,
    },
}

impl GrammarNode {
    pub fn keyword(name: &str) -> Self {
        GrammarNode::Keyword {
            name: name.to_string(),
            multiplier: None,
        }
    }

    pub fn data_type(name: &str) -> Self {
        GrammarNode::DataType {
            name: name.to_string(),
            range: None,
            multiplier: None,
        }
    }

    pub fn property(name: &str) -> Self {
        GrammarNode::PropertyRef {
            name: name.to_string(),
            range: None,
            multiplier: None,
        }
    }

    pub fn literal(text: &str) -> Self {
        GrammarNode::Literal {
            text: text.to_string(),
            enclosed: false,
            multiplier: None,
        }
    }

    pub fn group(child: GrammarNode) -> Self {
        GrammarNode::Group {
            children: vec![child],
            multiplier: None,
        }
    }

    /// Creates a combinator node of the given kind
    pub fn combinator(kind: CombinatorKind, children: Vec<GrammarNode>) -> Self {
        match kind {
            CombinatorKind::Juxtaposition => GrammarNode::Juxtaposition { children },
            CombinatorKind::AllOf => GrammarNode::AllOf { children },
            CombinatorKind::AnyOf => GrammarNode::AnyOf { children },
            CombinatorKind::OneOf => GrammarNode::OneOf { children },
        }
    }

    /// Builds the grammar a boolean expression over `inner` expands to:
    /// `not <inner> | <inner> [ [ and <inner> ]* | [ or <inner> ]* ]`
    pub fn boolean_expr(inner: GrammarNode) -> Self {
        let chain = |operator: &str| GrammarNode::Group {
            children: vec![GrammarNode::Juxtaposition {
                children: vec![GrammarNode::keyword(operator), inner.clone()],
            }],
            multiplier: Some(Multiplier::zero_or_more()),
        };

        let expansion = GrammarNode::OneOf {
            children: vec![
                GrammarNode::Juxtaposition {
                    children: vec![GrammarNode::keyword("not"), inner.clone()],
                },
                GrammarNode::Juxtaposition {
                    children: vec![
                        inner.clone(),
                        GrammarNode::group(GrammarNode::OneOf {
                            children: vec![chain("and"), chain("or")],
                        }),
                    ],
                },
            ],
        };

        GrammarNode::BooleanExpr {
            inner: Box::new(inner),
            expansion: Box::new(expansion),
            multiplier: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_multiplier(mut self, multiplier: Multiplier) -> Self {
        if let Err(message) = self.set_multiplier(multiplier) {
            unreachable!("{}: {}", self, message);
        }
        self
    }

    /// Returns the combinator kind when this node is a combinator
    pub fn combinator_kind(&self) -> Option<CombinatorKind> {
        match self {
            GrammarNode::Juxtaposition { .. } => Some(CombinatorKind::Juxtaposition),
            GrammarNode::AllOf { .. } => Some(CombinatorKind::AllOf),
            GrammarNode::AnyOf { .. } => Some(CombinatorKind::AnyOf),
            GrammarNode::OneOf { .. } => Some(CombinatorKind::OneOf),
            _ => None,
        }
    }

    /// Child nodes of groups and combinators
    pub fn children(&self) -> &[GrammarNode] {
        match self {
            GrammarNode::Group { children, .. }
            | GrammarNode::Juxtaposition { children }
            | GrammarNode::AllOf { children }
            | GrammarNode::AnyOf { children }
            | GrammarNode::OneOf { children } => children,
            _ => &[],
        }
    }

    pub fn multiplier(&self) -> Option<&Multiplier> {
        match self {
            GrammarNode::DataType { multiplier, .. }
            | GrammarNode::PropertyRef { multiplier, .. }
            | GrammarNode::Keyword { multiplier, .. }
            | GrammarNode::Literal { multiplier, .. }
            | GrammarNode::Group { multiplier, .. }
            | GrammarNode::BooleanExpr { multiplier, .. } => multiplier.as_ref(),
            _ => None,
        }
    }

    /// Attaches a multiplier. Fails on combinators and on nodes that already have one.
    pub fn set_multiplier(&mut self, new: Multiplier) -> Result<(), String> {
        match self {
            GrammarNode::DataType { multiplier, .. }
            | GrammarNode::PropertyRef { multiplier, .. }
            | GrammarNode::Keyword { multiplier, .. }
            | GrammarNode::Literal { multiplier, .. }
            | GrammarNode::Group { multiplier, .. }
            | GrammarNode::BooleanExpr { multiplier, .. } => {
                if multiplier.is_some() {
                    return Err("multiple multipliers on a single node".to_string());
                }
                *multiplier = Some(new);
                Ok(())
            }
            _ => Err(format!("a {} combinator cannot carry a multiplier", self.kind_name())),
        }
    }

    /// True for an unenclosed `(` literal without multiplier
    pub fn is_open_paren(&self) -> bool {
        matches!(self, GrammarNode::Literal { text, enclosed: false, multiplier: None } if text == "(")
    }

    /// Short name of the node type, used in debug output
    pub fn kind_name(&self) -> &'static str {
        match self {
            GrammarNode::DataType { .. } => "data type",
            GrammarNode::PropertyRef { .. } => "property",
            GrammarNode::Keyword { .. } => "keyword",
            GrammarNode::Literal { .. } => "literal",
            GrammarNode::Group { .. } => "group",
            GrammarNode::BooleanExpr { .. } => "boolean expression",
            GrammarNode::Juxtaposition { .. } => "juxtaposition",
            GrammarNode::AllOf { .. } => "all-of",
            GrammarNode::AnyOf { .. } => "any-of",
            GrammarNode::OneOf { .. } => "one-of",
        }
    }

    /// Writes an indented tree of this node and its children
    pub fn write_tree(&self, f: &mut dyn std::fmt::Write, depth: usize) -> std::fmt::Result {
        let indent = "  ".repeat(depth);
        match self {
            GrammarNode::Group { children, multiplier } => {
                writeln!(f, "{}group{}", indent, multiplier_suffix(multiplier.as_ref()))?;
                for child in children {
                    child.write_tree(f, depth + 1)?;
                }
            }
            GrammarNode::BooleanExpr { inner, multiplier, .. } => {
                writeln!(f, "{}boolean-expr{}", indent, multiplier_suffix(multiplier.as_ref()))?;
                inner.write_tree(f, depth + 1)?;
            }
            GrammarNode::Juxtaposition { children }
            | GrammarNode::AllOf { children }
            | GrammarNode::AnyOf { children }
            | GrammarNode::OneOf { children } => {
                writeln!(f, "{}{}", indent, self.kind_name())?;
                for child in children {
                    child.write_tree(f, depth + 1)?;
                }
            }
            _ => writeln!(f, "{}{} {}", indent, self.kind_name(), self)?,
        }
        Ok(())
    }

    /// Writes a child of a combinator, wrapping it in brackets when it would otherwise bind
    /// differently after re-parsing.
    fn fmt_child(&self, parent: CombinatorKind, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.combinator_kind() {
            Some(kind) if kind.precedence() >= parent.precedence() => write!(f, "[ {} ]", self),
            _ => write!(f, "{}", self),
        }
    }
}

/// Writes the children of a combinator. A function name is glued to its opening parenthesis.
fn write_children(f: &mut Formatter<'_>, children: &[GrammarNode], kind: CombinatorKind) -> std::fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            let glued = kind == CombinatorKind::Juxtaposition
                && child.is_open_paren()
                && matches!(children[i - 1], GrammarNode::Keyword { multiplier: None, .. });
            if !glued {
                write!(f, "{}", kind.separator())?;
            }
        }
        child.fmt_child(kind, f)?;
    }
    Ok(())
}

fn multiplier_suffix(multiplier: Option<&Multiplier>) -> String {
    multiplier.map(|m| m.to_string()).unwrap_or_default()
}

impl Display for GrammarNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarNode::DataType {
                name,
                range,
                multiplier,
            } => {
                write!(f, "<{}", name)?;
                if let Some(range) = range {
                    write!(f, " {}", range)?;
                }
                write!(f, ">{}", multiplier_suffix(multiplier.as_ref()))
            }
            GrammarNode::PropertyRef {
                name,
                range,
                multiplier,
            } => {
                write!(f, "<'{}'", name)?;
                if let Some(range) = range {
                    write!(f, " {}", range)?;
                }
                write!(f, ">{}", multiplier_suffix(multiplier.as_ref()))
            }
            GrammarNode::Keyword { name, multiplier } => {
                write!(f, "{}{}", name, multiplier_suffix(multiplier.as_ref()))
            }
            GrammarNode::Literal {
                text,
                enclosed,
                multiplier,
            } => {
                if *enclosed {
                    write!(f, "'{}'", text)?;
                } else {
                    write!(f, "{}", text)?;
                }
                write!(f, "{}", multiplier_suffix(multiplier.as_ref()))
            }
            GrammarNode::Group { children, multiplier } => {
                write!(f, "[ ")?;
                match children.as_slice() {
                    [child] => write!(f, "{}", child)?,
                    _ => write_children(f, children, CombinatorKind::Juxtaposition)?,
                }
                write!(f, " ]{}", multiplier_suffix(multiplier.as_ref()))
            }
            GrammarNode::BooleanExpr { inner, multiplier, .. } => {
                write!(f, "<boolean-expr[ {} ]>{}", inner, multiplier_suffix(multiplier.as_ref()))
            }
            GrammarNode::Juxtaposition { children }
            | GrammarNode::AllOf { children }
            | GrammarNode::AnyOf { children }
            | GrammarNode::OneOf { children } => {
                let kind = self.combinator_kind().unwrap_or(CombinatorKind::Juxtaposition);
                write_children(f, children, kind)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_equality_ignores_syntax() {
        assert_eq!(Multiplier::once(), Multiplier::range(1, Some(1)));
        assert_eq!(Multiplier::comma(), Multiplier::comma_range(1, None));
        assert_ne!(Multiplier::comma(), Multiplier::one_or_more());
        assert!(Multiplier::once().is_once());
        assert!(!Multiplier::comma_range(1, Some(1)).is_once());
    }

    #[test]
    fn multiplier_allows() {
        let m = Multiplier::range(2, Some(4));
        assert!(!m.allows(1));
        assert!(m.allows(2));
        assert!(m.allows(4));
        assert!(!m.allows(5));
        assert!(Multiplier::zero_or_more().allows(1000));
    }

    #[test]
    fn display_multipliers() {
        let node = |m: Multiplier| GrammarNode::data_type("length").with_multiplier(m).to_string();
        assert_eq!(node(Multiplier::once()), "<length>!");
        assert_eq!(node(Multiplier::optional()), "<length>?");
        assert_eq!(node(Multiplier::range(1, Some(4))), "<length>{1,4}");
        assert_eq!(node(Multiplier::range(2, Some(2))), "<length>{2}");
        assert_eq!(node(Multiplier::range(2, None)), "<length>{2,}");
        assert_eq!(node(Multiplier::comma()), "<length>#");
        assert_eq!(node(Multiplier::comma_range(1, Some(3))), "<length>#{1,3}");
        assert_eq!(node(Multiplier::optional_comma()), "<length>#?");
    }

    #[test]
    fn display_nodes() {
        let range = RangeType::new(NumberOrInfinity::Finite(0.0), NumberOrInfinity::Infinity);
        let node = GrammarNode::DataType {
            name: "number".into(),
            range: Some(range),
            multiplier: None,
        };
        assert_eq!(node.to_string(), "<number [0,∞]>");

        let node = GrammarNode::OneOf {
            children: vec![
                GrammarNode::Juxtaposition {
                    children: vec![GrammarNode::keyword("a"), GrammarNode::keyword("b")],
                },
                GrammarNode::AnyOf {
                    children: vec![GrammarNode::property("color"), GrammarNode::literal(",")],
                },
            ],
        };
        assert_eq!(node.to_string(), "a b | <'color'> || ,");
    }

    #[test]
    fn display_wraps_looser_children() {
        let node = GrammarNode::Juxtaposition {
            children: vec![
                GrammarNode::keyword("a"),
                GrammarNode::OneOf {
                    children: vec![GrammarNode::keyword("b"), GrammarNode::keyword("c")],
                },
            ],
        };
        assert_eq!(node.to_string(), "a [ b | c ]");
    }

    #[test]
    fn set_multiplier_rules() {
        let mut node = GrammarNode::keyword("a");
        assert!(node.set_multiplier(Multiplier::optional()).is_ok());
        assert!(node.set_multiplier(Multiplier::optional()).is_err());

        let mut node = GrammarNode::AnyOf {
            children: vec![GrammarNode::keyword("a"), GrammarNode::keyword("b")],
        };
        assert!(node.set_multiplier(Multiplier::optional()).is_err());
    }

    #[test]
    fn range_contains() {
        let range = RangeType::new(NumberOrInfinity::Finite(0.0), NumberOrInfinity::Finite(100.0));
        assert!(range.contains(0.0));
        assert!(range.contains(100.0));
        assert!(!range.contains(-0.5));
        let open = RangeType::new(NumberOrInfinity::NegativeInfinity, NumberOrInfinity::Infinity);
        assert!(open.contains(-1e300));
    }
}
