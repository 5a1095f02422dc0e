//! Matching of css values against compiled grammars
//!
//! ```text
//! grammar source -> parse() -> GrammarNode
//!                                   |
//! css value -> tokenize() -> [ValueNode] -> match_values() -> MatchResult
//! ```
//!
//! The matcher builds one state machine per grammar node and searches depth first through
//! the interpretations they produce until one consumes all values. `||` combinators are
//! driven by a [`crate::combination::CombinationIterator`].

use crate::definitions::{get_css_definitions, CssDefinitions};
use crate::errors::MatchError;
use crate::matcher::context::Context;
use crate::matcher::node::{Matcher, Record};
use crate::matcher::slots::{Slot, SlotKind};
use crate::syntax::GrammarNode;
use gosub_css3::value::{ValueKind, ValueNode};
use gosub_shared::span::Span;
use log::debug;
use std::fmt::{Display, Formatter};

mod context;
mod node;
mod slots;

/// Default maximum number of leaf tests for a single match
pub const DEFAULT_STEP_BUDGET: usize = 250_000;

/// Default maximum nesting of references to named syntaxes
pub const DEFAULT_MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchType {
    /// Stop at the first interpretation that matches all values
    #[default]
    Valid,
    /// Keep searching for a second, different interpretation
    Ambiguous,
}

/// Options for a single match
#[derive(Debug, Clone)]
pub struct MatchOptions<'a> {
    pub match_type: MatchType,
    /// Data types that never match
    pub exclude: Vec<String>,
    /// Table used to resolve `<name>` and `<'name'>` references
    pub definitions: Option<&'a CssDefinitions>,
    pub step_budget: usize,
    pub max_depth: usize,
    /// A lone css-wide keyword (`inherit`, `unset`, ...) matches any grammar
    pub allow_css_wide_keywords: bool,
}

impl Default for MatchOptions<'static> {
    fn default() -> Self {
        Self {
            match_type: MatchType::Valid,
            exclude: Vec::new(),
            definitions: Some(get_css_definitions()),
            step_budget: DEFAULT_STEP_BUDGET,
            max_depth: DEFAULT_MAX_DEPTH,
            allow_css_wide_keywords: true,
        }
    }
}

impl<'a> MatchOptions<'a> {
    /// Default options that resolve references against the given table
    pub fn with_definitions(definitions: &'a CssDefinitions) -> Self {
        Self {
            definitions: Some(definitions),
            ..MatchOptions::default()
        }
    }
}

/// Values consumed by a single grammar node.
///
/// A function call is listed as one value only by the record that covers the complete call.
/// When a grammar matches the call piece by piece (`rgb( <number>{3} )`), the records for the
/// name and the parentheses carry no values and the arguments are listed by their own records.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord<'a> {
    pub node: &'a GrammarNode,
    pub values: Vec<&'a ValueNode>,
    pub span: Span,
}

impl Display for MatchRecord<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} =>", self.node)?;
        for value in &self.values {
            write!(f, " {}", value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<'a> {
    pub valid: bool,
    /// More than one interpretation matches (only detected with [`MatchType::Ambiguous`])
    pub ambiguous: bool,
    /// Number of leaf tests performed
    pub steps: usize,
    pub errors: Vec<MatchError<'a>>,
    /// Records of the matching interpretation, in value order
    pub matches: Vec<MatchRecord<'a>>,
}

impl MatchResult<'_> {
    fn new() -> Self {
        MatchResult {
            valid: false,
            ambiguous: false,
            steps: 0,
            errors: Vec::new(),
            matches: Vec::new(),
        }
    }
}

/// Matches the values against the grammar
pub fn match_values<'a>(values: &'a [ValueNode], grammar: &'a GrammarNode, options: &MatchOptions<'a>) -> MatchResult<'a> {
    let slots = slots::flatten(values);
    let mut result = MatchResult::new();

    if options.allow_css_wide_keywords {
        if let [slot] = slots.as_slice() {
            if matches!(slot.node.kind, ValueKind::CssWideKeyword(_)) {
                result.valid = true;
                result.matches.push(MatchRecord {
                    node: grammar,
                    values: vec![slot.node],
                    span: slot.span,
                });
                return result;
            }
        }
    }

    let mut ctx = Context::new(&slots, options);
    let mut root = Matcher::new(grammar, 0, &ctx);

    let mut found: Option<Vec<Record<'a>>> = None;
    let mut longest_prefix: Option<usize> = None;

    while root.step(&mut ctx) {
        if root.end() < slots.len() {
            longest_prefix = longest_prefix.max(Some(root.end()));
            continue;
        }

        let mut records = Vec::new();
        root.collect_records(&mut records);

        match &found {
            None => {
                found = Some(records);
                if options.match_type == MatchType::Valid {
                    break;
                }
            }
            Some(first) if !same_records(first, &records) => {
                result.ambiguous = true;
                break;
            }
            Some(_) => {}
        }
    }

    result.steps = ctx.steps;

    match found {
        Some(records) => {
            result.valid = true;
            result.matches = records.iter().map(|r| match_record(r, &slots)).collect();
        }
        None if !ctx.aborted => {
            if let Some(end) = longest_prefix {
                result.errors.push(MatchError::ValueOverflow {
                    span: trailing_span(&slots, end),
                });
            }

            let (position, nodes) = ctx.mismatches();
            let span = slots.get(position).map_or_else(|| end_span(&slots), |slot| slot.span);
            for node in nodes {
                result.errors.push(MatchError::Mismatch { node: *node, span });
            }
        }
        None => {}
    }

    if ctx.aborted {
        result.errors.push(MatchError::BudgetExceeded {
            budget: options.step_budget,
        });
    }

    for node in &ctx.unresolved {
        result.errors.push(MatchError::Unresolved { node: *node });
    }

    debug!(
        "matched {} slots against '{}': valid={} ambiguous={} steps={} exhausted={}",
        slots.len(),
        grammar,
        result.valid,
        result.ambiguous,
        result.steps,
        root.is_exhausted()
    );

    result
}

fn same_records(a: &[Record<'_>], b: &[Record<'_>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.same_as(b))
}

/// Converts slot positions back to the values they came from
fn match_record<'a>(record: &Record<'a>, slots: &[Slot<'a>]) -> MatchRecord<'a> {
    let mut values = Vec::new();
    let mut span: Option<Span> = None;

    let mut index = record.start;
    while let Some(slot) = slots.get(index).filter(|_| index < record.end) {
        let mut slot_span = slot.span;
        index += 1;

        match slot.kind {
            SlotKind::Value => values.push(slot.node),
            // the call belongs to this record only when the record covers all of it, otherwise
            // its arguments are reported by their own records
            SlotKind::FunctionName if slot.end <= record.end => {
                values.push(slot.node);
                slot_span = slot.node.span;
                index = slot.end;
            }
            SlotKind::FunctionName => {}
            SlotKind::OpenParen | SlotKind::CloseParen => {}
        }

        span = Some(span.map_or(slot_span, |s| s.merge(slot_span)));
    }

    MatchRecord {
        node: record.node,
        values,
        span: span.unwrap_or_else(|| end_span(slots)),
    }
}

/// Span covering all slots from `start` to the end
fn trailing_span(slots: &[Slot<'_>], start: usize) -> Span {
    match (slots.get(start), slots.last()) {
        (Some(first), Some(last)) => first.span.merge(last.span),
        _ => end_span(slots),
    }
}

/// Empty span just after the last value
fn end_span(slots: &[Slot<'_>]) -> Span {
    Span::empty_at(slots.last().map_or(0, |slot| slot.span.end))
}
