use crate::errors::SyntaxError;
use crate::syntax::{CombinatorKind, GrammarNode, Multiplier, NumberOrInfinity, RangeType};
use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case};
use nom::character::complete::{digit1, multispace0};
use nom::combinator::{map, map_res, opt};
use nom::number::complete::double;
use nom::sequence::{delimited, separated_pair};
use nom::IResult;
use std::str::FromStr;

/// Compiles a value definition grammar (`<length>{1,4} | auto`) into a grammar tree
pub fn parse(source: &str) -> Result<GrammarNode, SyntaxError> {
    let node = SyntaxParser::new(source).parse_grammar()?;
    log::debug!("compiled grammar '{}'", node);
    Ok(node)
}

impl FromStr for GrammarNode {
    type Err = SyntaxError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        parse(source)
    }
}

/// Flat list entries produced by the scan, before combinator precedence is applied
#[derive(Debug)]
enum Item {
    Node(GrammarNode),
    /// Combinator and its offset in the source
    Combinator(CombinatorKind, usize),
}

/// Characters that end a keyword
fn is_delimiter(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '<' | '>' | '[' | ']' | ',' | '/' | '|' | '&' | '#' | '(' | ')' | '{' | '}' | '!' | '?' | '*' | '+' | '\''
        )
}

struct SyntaxParser<'src> {
    source: &'src str,
    /// Byte offset of the current character
    position: usize,
}

impl<'src> SyntaxParser<'src> {
    fn new(source: &'src str) -> Self {
        SyntaxParser { source, position: 0 }
    }

    fn parse_grammar(&mut self) -> Result<GrammarNode, SyntaxError> {
        self.parse_sequence(None)
    }

    /// Scans items up to the end of the source, or up to the `]` matching the `[` at `open`
    fn parse_sequence(&mut self, open: Option<usize>) -> Result<GrammarNode, SyntaxError> {
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            let offset = self.position;

            let Some(c) = self.current_char() else {
                if let Some(open) = open {
                    return Err(SyntaxError::new("unbalanced brackets: missing ']'", open));
                }
                break;
            };

            match c {
                ']' => {
                    if open.is_none() {
                        return Err(SyntaxError::new("unbalanced brackets: unexpected ']'", offset));
                    }
                    self.next_char();
                    break;
                }
                '[' => {
                    self.next_char();
                    let inner = self.parse_sequence(Some(offset))?;
                    items.push(Item::Node(GrammarNode::group(inner)));
                }
                '<' => items.push(Item::Node(self.parse_reference()?)),
                '\'' => items.push(Item::Node(self.parse_quoted_literal()?)),
                ',' | '/' | '(' | ')' => {
                    self.next_char();
                    items.push(Item::Node(GrammarNode::literal(&c.to_string())));
                }
                '&' => {
                    self.next_char();
                    if self.current_char() == Some('&') {
                        self.next_char();
                    }
                    items.push(Item::Combinator(CombinatorKind::AllOf, offset));
                }
                '|' => {
                    self.next_char();
                    if self.current_char() == Some('|') {
                        self.next_char();
                        items.push(Item::Combinator(CombinatorKind::AnyOf, offset));
                    } else {
                        items.push(Item::Combinator(CombinatorKind::OneOf, offset));
                    }
                }
                '!' | '?' | '+' | '*' | '{' | '#' => self.parse_multiplier(&mut items)?,
                '>' | '}' => return Err(SyntaxError::new(&format!("unexpected '{}'", c), offset)),
                _ => {
                    let name = self.consume_while(|c| !is_delimiter(c));
                    items.push(Item::Node(GrammarNode::keyword(name)));
                }
            }
        }

        match fold(items)? {
            Some(node) => Ok(node),
            None => match open {
                Some(open) => Err(SyntaxError::new("empty group", open)),
                None => Err(SyntaxError::new("empty grammar", 0)),
            },
        }
    }

    /// Parses `<name>`, `<name [min,max]>`, `<'name'>` and `<boolean-expr[ ... ]>`
    fn parse_reference(&mut self) -> Result<GrammarNode, SyntaxError> {
        let start = self.position;
        // consume '<'
        self.next_char();
        self.skip_whitespace();

        let (name, property) = if self.current_char() == Some('\'') {
            self.next_char();
            let name = self.consume_while(|c| c != '\'' && c != '>');
            if self.current_char() != Some('\'') {
                return Err(SyntaxError::new("unterminated property name", start));
            }
            self.next_char();
            (name.to_string(), true)
        } else {
            let name = self.consume_while(|c| !c.is_whitespace() && !matches!(c, '<' | '>' | '[' | ']' | '\''));
            (name.to_string(), false)
        };

        if name.is_empty() {
            return Err(SyntaxError::new("missing data type name", start));
        }

        if !property && name == "boolean-expr" {
            return self.parse_boolean_expr(start);
        }

        self.skip_whitespace();
        let range = if self.current_char() == Some('[') {
            Some(self.run(typedef_range, "invalid range")?)
        } else {
            None
        };

        self.skip_whitespace();
        if self.current_char() != Some('>') {
            return Err(SyntaxError::new("unterminated data type", start));
        }
        self.next_char();

        Ok(if property {
            GrammarNode::PropertyRef {
                name,
                range,
                multiplier: None,
            }
        } else {
            GrammarNode::DataType {
                name,
                range,
                multiplier: None,
            }
        })
    }

    /// Parses the `[ inner ]>` part of `<boolean-expr[ inner ]>`
    fn parse_boolean_expr(&mut self, start: usize) -> Result<GrammarNode, SyntaxError> {
        self.skip_whitespace();
        if self.current_char() != Some('[') {
            return Err(SyntaxError::new("missing boolean expression", start));
        }
        let open = self.position;
        self.next_char();

        self.skip_whitespace();
        if self.current_char() == Some(']') {
            return Err(SyntaxError::new("missing boolean expression", start));
        }

        let inner = self.parse_sequence(Some(open))?;

        self.skip_whitespace();
        if self.current_char() != Some('>') {
            return Err(SyntaxError::new("unterminated data type", start));
        }
        self.next_char();

        Ok(GrammarNode::boolean_expr(inner))
    }

    fn parse_quoted_literal(&mut self) -> Result<GrammarNode, SyntaxError> {
        let start = self.position;
        // consume opening quote
        self.next_char();

        let text = self.consume_while(|c| c != '\'');
        if self.current_char() != Some('\'') {
            return Err(SyntaxError::new("unterminated literal", start));
        }
        self.next_char();

        Ok(GrammarNode::Literal {
            text: text.to_string(),
            enclosed: true,
            multiplier: None,
        })
    }

    /// Parses a multiplier and attaches it to the preceding node
    fn parse_multiplier(&mut self, items: &mut [Item]) -> Result<(), SyntaxError> {
        let offset = self.position;

        let multiplier = match self.next_char() {
            Some('!') => Multiplier::once(),
            Some('?') => Multiplier::optional(),
            Some('+') => Multiplier::one_or_more(),
            Some('*') => Multiplier::zero_or_more(),
            Some('{') => {
                self.position = offset;
                let (min, max) = self.run(curly_range, "invalid multiplier range")?;
                Multiplier::range(min, max)
            }
            Some('#') => match self.current_char() {
                Some('{') => {
                    let (min, max) = self.run(curly_range, "invalid multiplier range")?;
                    Multiplier::comma_range(min, max)
                }
                Some('?') => {
                    self.next_char();
                    Multiplier::optional_comma()
                }
                _ => Multiplier::comma(),
            },
            _ => return Err(SyntaxError::new("invalid multiplier", offset)),
        };

        if multiplier.max.is_some_and(|max| max < multiplier.min) {
            return Err(SyntaxError::new("invalid multiplier range: max is smaller than min", offset));
        }

        match items.last_mut() {
            Some(Item::Node(node)) => node
                .set_multiplier(multiplier)
                .map_err(|reason| SyntaxError::new(&reason, offset)),
            _ => Err(SyntaxError::new("multiplier without a preceding node", offset)),
        }
    }

    /// Runs a nom parser on the remaining source and advances past what it consumed
    fn run<O>(
        &mut self,
        mut parser: impl FnMut(&'src str) -> IResult<&'src str, O>,
        message: &str,
    ) -> Result<O, SyntaxError> {
        let start = self.position;
        let rest = self.rest();

        match parser(rest) {
            Ok((remaining, output)) => {
                self.position += rest.len() - remaining.len();
                Ok(output)
            }
            Err(_) => Err(SyntaxError::new(message, start)),
        }
    }

    fn consume_while(&mut self, predicate: impl Fn(char) -> bool) -> &'src str {
        let start = self.position;
        while let Some(c) = self.current_char().filter(|c| predicate(*c)) {
            self.position += c.len_utf8();
        }
        self.source.get(start..self.position).unwrap_or_default()
    }

    fn skip_whitespace(&mut self) {
        self.consume_while(char::is_whitespace);
    }

    fn rest(&self) -> &'src str {
        self.source.get(self.position..).unwrap_or_default()
    }

    fn current_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.current_char()?;
        self.position += c.len_utf8();
        Some(c)
    }
}

/// Resolves combinator precedence over the scanned items. Returns `None` when there are no items.
///
/// Adjacent nodes are folded into juxtapositions first, then `&&`, `||` and `|` are folded in
/// that order.
fn fold(items: Vec<Item>) -> Result<Option<GrammarNode>, SyntaxError> {
    let mut list = Vec::with_capacity(items.len());
    let mut run = Vec::new();

    for item in items {
        match item {
            Item::Node(node) => run.push(node),
            combinator @ Item::Combinator(..) => {
                flush_juxtaposition(&mut run, &mut list);
                list.push(combinator);
            }
        }
    }
    flush_juxtaposition(&mut run, &mut list);

    for kind in [CombinatorKind::AllOf, CombinatorKind::AnyOf, CombinatorKind::OneOf] {
        list = fold_combinator(list, kind)?;
    }

    let mut list = list.into_iter();
    match (list.next(), list.next()) {
        (None, _) => Ok(None),
        (Some(Item::Node(node)), None) => Ok(Some(node)),
        (Some(Item::Combinator(kind, offset)), _) | (_, Some(Item::Combinator(kind, offset))) => Err(
            SyntaxError::new(&format!("combinator '{}' is missing an operand", kind), offset),
        ),
        (Some(Item::Node(_)), Some(Item::Node(_))) => unreachable!("adjacent nodes are joined into a juxtaposition"),
    }
}

/// Moves the collected adjacent nodes into the list, as a juxtaposition when there are several
fn flush_juxtaposition(run: &mut Vec<GrammarNode>, list: &mut Vec<Item>) {
    match run.len() {
        0 => {}
        1 => list.extend(run.drain(..).map(Item::Node)),
        _ => list.push(Item::Node(GrammarNode::Juxtaposition {
            children: std::mem::take(run),
        })),
    }
}

/// Folds all operators of the given kind with their left and right operands
fn fold_combinator(list: Vec<Item>, kind: CombinatorKind) -> Result<Vec<Item>, SyntaxError> {
    let mut out = Vec::with_capacity(list.len());
    let mut iter = list.into_iter();

    while let Some(item) = iter.next() {
        let offset = match item {
            Item::Combinator(k, offset) if k == kind => offset,
            other => {
                out.push(other);
                continue;
            }
        };

        let Some(Item::Node(left)) = out.pop() else {
            return Err(SyntaxError::new(
                &format!("combinator '{}' is missing its left operand", kind),
                offset,
            ));
        };
        let Some(Item::Node(right)) = iter.next() else {
            return Err(SyntaxError::new(
                &format!("combinator '{}' is missing its right operand", kind),
                offset,
            ));
        };

        // Only nodes created by this fold can have the same kind, so extend them
        let node = match left {
            GrammarNode::AllOf { mut children } if kind == CombinatorKind::AllOf => {
                children.push(right);
                GrammarNode::AllOf { children }
            }
            GrammarNode::AnyOf { mut children } if kind == CombinatorKind::AnyOf => {
                children.push(right);
                GrammarNode::AnyOf { children }
            }
            GrammarNode::OneOf { mut children } if kind == CombinatorKind::OneOf => {
                children.push(right);
                GrammarNode::OneOf { children }
            }
            left => GrammarNode::combinator(kind, vec![left, right]),
        };
        out.push(Item::Node(node));
    }

    Ok(out)
}

/// Removes surrounding whitespace from a parser
fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse an unsigned integer
fn integer(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |s: &str| s.parse::<usize>())(input)
}

/// Upper bound of a repetition range, `None` for ∞
fn upper_bound(input: &str) -> IResult<&str, Option<usize>> {
    alt((map(tag("∞"), |_| None), map(integer, Some)))(input)
}

/// Parses the curly braces part of a multiplier: `{2}`, `{1,4}` or `{1,}`
fn curly_range(input: &str) -> IResult<&str, (usize, Option<usize>)> {
    let bounded = map(
        separated_pair(ws(integer), tag(","), opt(ws(upper_bound))),
        |(min, max)| (min, max.flatten()),
    );
    let exact = map(ws(integer), |n| (n, Some(n)));

    delimited(tag("{"), alt((bounded, exact)), tag("}"))(input)
}

/// Parses a bound of a type range: a number, `∞`, `-∞`, `inf` or `-inf`
fn range_bound(input: &str) -> IResult<&str, NumberOrInfinity> {
    alt((
        map(tag("∞"), |_| NumberOrInfinity::Infinity),
        map(tag("-∞"), |_| NumberOrInfinity::NegativeInfinity),
        map(tag_no_case("-inf"), |_| NumberOrInfinity::NegativeInfinity),
        map(tag_no_case("inf"), |_| NumberOrInfinity::Infinity),
        map(double, NumberOrInfinity::Finite),
    ))(input)
}

/// Parses a range for a type definition (ie: the square bracket part of: `<number [1,10]>`).
/// A missing bound is unbounded.
fn typedef_range(input: &str) -> IResult<&str, RangeType> {
    let range = separated_pair(opt(ws(range_bound)), tag(","), opt(ws(range_bound)));

    map(delimited(ws(tag("[")), range, ws(tag("]"))), |(min, max)| {
        RangeType::new(
            min.unwrap_or(NumberOrInfinity::NegativeInfinity),
            max.unwrap_or(NumberOrInfinity::Infinity),
        )
    })(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(name: &str) -> GrammarNode {
        GrammarNode::keyword(name)
    }

    fn juxt(children: Vec<GrammarNode>) -> GrammarNode {
        GrammarNode::Juxtaposition { children }
    }

    #[test]
    fn test_generic() {
        assert_eq!(parse("ease-in").unwrap(), kw("ease-in"));
        assert_eq!(parse("  color ").unwrap(), kw("color"));
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse("").unwrap_err().message, "empty grammar");
        assert_eq!(parse("a [ ]").unwrap_err().message, "empty group");
    }

    #[test]
    fn test_precedence() {
        let node = parse("a b | c || d && e f").unwrap();
        assert_eq!(
            node,
            GrammarNode::OneOf {
                children: vec![
                    juxt(vec![kw("a"), kw("b")]),
                    GrammarNode::AnyOf {
                        children: vec![
                            kw("c"),
                            GrammarNode::AllOf {
                                children: vec![kw("d"), juxt(vec![kw("e"), kw("f")])],
                            },
                        ],
                    },
                ],
            }
        );
    }

    #[test]
    fn test_specific_precedence_configurations() {
        assert_eq!(
            parse("left | right && top").unwrap(),
            GrammarNode::OneOf {
                children: vec![
                    kw("left"),
                    GrammarNode::AllOf {
                        children: vec![kw("right"), kw("top")],
                    },
                ],
            }
        );

        // same kind operators extend a single node
        assert_eq!(
            parse("a | b | c").unwrap(),
            GrammarNode::OneOf {
                children: vec![kw("a"), kw("b"), kw("c")],
            }
        );

        // brackets keep their contents together
        assert_eq!(
            parse("[ a | b ] c").unwrap(),
            juxt(vec![
                GrammarNode::group(GrammarNode::OneOf {
                    children: vec![kw("a"), kw("b")],
                }),
                kw("c"),
            ])
        );

        // single & is the same as &&
        assert_eq!(
            parse("a & b").unwrap(),
            GrammarNode::AllOf {
                children: vec![kw("a"), kw("b")],
            }
        );
    }

    #[test]
    fn test_references() {
        assert_eq!(parse("<length>").unwrap(), GrammarNode::data_type("length"));
        assert_eq!(parse("<'margin-left'>").unwrap(), GrammarNode::property("margin-left"));
        assert_eq!(parse("<calc()>").unwrap(), GrammarNode::data_type("calc()"));
        assert_eq!(
            parse("<number [0,∞]>").unwrap(),
            GrammarNode::DataType {
                name: "number".into(),
                range: Some(RangeType::new(NumberOrInfinity::Finite(0.0), NumberOrInfinity::Infinity)),
                multiplier: None,
            }
        );
        assert_eq!(
            parse("<'flex-grow' [-inf, 1.5]>").unwrap(),
            GrammarNode::PropertyRef {
                name: "flex-grow".into(),
                range: Some(RangeType::new(
                    NumberOrInfinity::NegativeInfinity,
                    NumberOrInfinity::Finite(1.5)
                )),
                multiplier: None,
            }
        );
        assert_eq!(
            parse("<integer [1,]>").unwrap(),
            GrammarNode::DataType {
                name: "integer".into(),
                range: Some(RangeType::new(NumberOrInfinity::Finite(1.0), NumberOrInfinity::Infinity)),
                multiplier: None,
            }
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            parse("a , b / c").unwrap(),
            juxt(vec![kw("a"), GrammarNode::literal(","), kw("b"), GrammarNode::literal("/"), kw("c")])
        );
        assert_eq!(
            parse("'<' | '['").unwrap(),
            GrammarNode::OneOf {
                children: vec![
                    GrammarNode::Literal {
                        text: "<".into(),
                        enclosed: true,
                        multiplier: None
                    },
                    GrammarNode::Literal {
                        text: "[".into(),
                        enclosed: true,
                        multiplier: None
                    },
                ],
            }
        );
        assert_eq!(
            parse("rgb( <number>{3} )").unwrap(),
            juxt(vec![
                kw("rgb"),
                GrammarNode::literal("("),
                GrammarNode::data_type("number").with_multiplier(Multiplier::range(3, Some(3))),
                GrammarNode::literal(")"),
            ])
        );
    }

    #[test]
    fn test_multipliers() {
        let length = |m: Multiplier| GrammarNode::data_type("length").with_multiplier(m);

        assert_eq!(parse("<length>*").unwrap(), length(Multiplier::zero_or_more()));
        assert_eq!(parse("<length>+").unwrap(), length(Multiplier::one_or_more()));
        assert_eq!(parse("<length>?").unwrap(), length(Multiplier::optional()));
        assert_eq!(parse("<length>{1,4}").unwrap(), length(Multiplier::range(1, Some(4))));
        assert_eq!(parse("<length>{ 2 , }").unwrap(), length(Multiplier::range(2, None)));
        assert_eq!(parse("<length>#").unwrap(), length(Multiplier::comma()));
        assert_eq!(parse("<length>#{1,3}").unwrap(), length(Multiplier::comma_range(1, Some(3))));
        assert_eq!(parse("<length>#?").unwrap(), length(Multiplier::comma_range(0, None)));
        assert_eq!(
            parse("[ a b ]!").unwrap(),
            GrammarNode::group(juxt(vec![kw("a"), kw("b")])).with_multiplier(Multiplier::once())
        );
    }

    #[test]
    fn test_multiplier_equivalence() {
        let plain = parse("<name>").unwrap();
        let bang = parse("<name>!").unwrap();
        let explicit = parse("<name>{1,1}").unwrap();

        assert_eq!(bang, explicit);
        assert!(bang.multiplier().is_some_and(Multiplier::is_once));
        assert!(plain.multiplier().map_or(true, Multiplier::is_once));
    }

    #[test]
    fn test_boolean_expr() {
        let node = parse("<boolean-expr[ <media-feature> ]>?").unwrap();
        let GrammarNode::BooleanExpr { inner, multiplier, .. } = &node else {
            unreachable!("expected a boolean expression, got {:?}", node);
        };
        assert_eq!(**inner, GrammarNode::data_type("media-feature"));
        assert_eq!(*multiplier, Some(Multiplier::optional()));
        assert_eq!(node.to_string(), "<boolean-expr[ <media-feature> ]>?");
    }

    #[test]
    fn test_errors() {
        let error = |source: &str| parse(source).unwrap_err();

        assert_eq!(error("<length").message, "unterminated data type");
        assert_eq!(error("'abc").message, "unterminated literal");
        assert_eq!(error("a | b ||").message, "combinator '||' is missing its right operand");
        assert_eq!(error("&& a").message, "combinator '&&' is missing its left operand");
        assert_eq!(error("a | | b").message, "combinator '|' is missing its right operand");
        assert_eq!(error("a || && b").message, "combinator '&&' is missing its left operand");
        assert_eq!(error("[ a b").message, "unbalanced brackets: missing ']'");
        assert_eq!(error("a b ]").message, "unbalanced brackets: unexpected ']'");
        assert_eq!(error("<length>+#").message, "multiple multipliers on a single node");
        assert_eq!(error("<length>{2}?").message, "multiple multipliers on a single node");
        assert_eq!(error("* a").message, "multiplier without a preceding node");
        assert_eq!(error("<length>{4,2}").message, "invalid multiplier range: max is smaller than min");
        assert_eq!(error("<length>{a}").message, "invalid multiplier range");
        assert_eq!(error("<boolean-expr[ ]>").message, "missing boolean expression");
        assert_eq!(error("<boolean-expr>").message, "missing boolean expression");
        assert_eq!(error("<>").message, "missing data type name");

        let err = error("a || ");
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_adjacent_nodes_join_before_folding() {
        assert_eq!(
            parse("[ a ] [ b ]? c").unwrap(),
            juxt(vec![
                GrammarNode::group(kw("a")),
                GrammarNode::group(kw("b")).with_multiplier(Multiplier::optional()),
                kw("c"),
            ])
        );
        assert_eq!(
            parse("a b && c | d e").unwrap(),
            GrammarNode::OneOf {
                children: vec![
                    GrammarNode::AllOf {
                        children: vec![juxt(vec![kw("a"), kw("b")]), kw("c")],
                    },
                    juxt(vec![kw("d"), kw("e")]),
                ],
            }
        );
        assert_eq!(parse("a b ||").unwrap_err().offset, 4);
    }

    #[test]
    fn test_combinator_multiplier_is_rejected() {
        // a multiplier after a combinator attaches to the last operand, never to the combinator
        let node = parse("a | b*").unwrap();
        assert_eq!(
            node,
            GrammarNode::OneOf {
                children: vec![kw("a"), kw("b").with_multiplier(Multiplier::zero_or_more())],
            }
        );

        let mut combinator = parse("a | b").unwrap();
        assert!(combinator.set_multiplier(Multiplier::optional()).is_err());
    }

    #[test]
    fn test_round_trip() {
        let sources = [
            "a b | c || d && e f",
            "[ <bg-layer> , ]* <final-bg-layer>",
            "<length>{1,4}",
            "<length-percentage [0,∞]>{1,2} | auto",
            "rgb( <percentage>{3} [ / <alpha-value> ]? )",
            "<'color'>#? && [ a | b ]!",
            "'<' <integer>#{2,} '>'",
            "<boolean-expr[ [ <feature> | x ] ]>",
            "[ [ a b ] | c ]+",
            "none | <custom-ident>{1,}",
        ];

        for source in sources {
            let node = parse(source).unwrap();
            let printed = node.to_string();
            assert_eq!(printed, source, "printing {:?}", node);
            assert_eq!(parse(&printed).unwrap(), node);
        }
    }
}
