//! Matchers for the individual grammar nodes.
//!
//! Every matcher enumerates the interpretations of its node at a fixed start position, one
//! per [`Matcher::step`]. An interpretation is a number of consumed slots plus the records
//! that say which leaf consumed what. Composite matchers are depth-first searches over the
//! matchers of their children; they backtrack by asking a child for its next interpretation.

use crate::builtin;
use crate::combination::{Combination, CombinationIterator};
use crate::matcher::context::Context;
use crate::matcher::slots::SlotKind;
use crate::syntax::{GrammarNode, Multiplier};
use gosub_css3::value::ValueNode;
use log::trace;
use std::ptr;

/// Slots `[start, end)` consumed by a grammar node
#[derive(Debug, Clone, Copy)]
pub(crate) struct Record<'a> {
    pub node: &'a GrammarNode,
    pub start: usize,
    pub end: usize,
}

impl Record<'_> {
    /// Records are the same when they point to the very same grammar node
    pub fn same_as(&self, other: &Record<'_>) -> bool {
        ptr::eq(self.node, other.node) && self.start == other.start && self.end == other.end
    }
}

/// Appends a record, merging it into the previous one when both belong to the same node
fn push_record<'a>(records: &mut Vec<Record<'a>>, record: Record<'a>) {
    if let Some(last) = records.last_mut() {
        if ptr::eq(last.node, record.node) && last.end == record.start {
            last.end = record.end;
            return;
        }
    }
    records.push(record);
}

pub(crate) struct Matcher<'a> {
    node: &'a GrammarNode,
    start: usize,
    end: usize,
    /// No further interpretations are available
    exhausted: bool,
    /// The current interpretation is a match
    valid: bool,
    state: State<'a>,
}

enum State<'a> {
    /// Keywords, literals and built-in data types have a single interpretation
    Leaf { pending: bool },
    /// Named syntaxes, property syntaxes and boolean expressions
    Reference(ReferenceState<'a>),
    /// Juxtapositions and groups
    Sequence(SequenceState<'a>),
    OneOf(OneOfState<'a>),
    AllOf(AllOfState<'a>),
    AnyOf(AnyOfState<'a>),
    /// A node with a multiplier
    Repeat(RepeatState<'a>),
}

impl<'a> Matcher<'a> {
    /// Creates a matcher for the node at the given slot position
    pub fn new(node: &'a GrammarNode, start: usize, ctx: &Context<'_, 'a>) -> Self {
        match node.multiplier() {
            Some(multiplier) if !multiplier.is_once() => {
                Self::with_state(node, start, State::Repeat(RepeatState::new(node, *multiplier)))
            }
            _ => Self::new_plain(node, start, ctx),
        }
    }

    /// Creates a matcher for the node, ignoring its multiplier
    fn new_plain(node: &'a GrammarNode, start: usize, ctx: &Context<'_, 'a>) -> Self {
        let definitions = ctx.definitions;

        let state = match node {
            GrammarNode::DataType { name, .. } => match definitions.and_then(|d| d.find_syntax(name)) {
                Some(definition) if !ctx.is_excluded(name) => {
                    State::Reference(ReferenceState::new(&definition.syntax))
                }
                _ => State::Leaf { pending: false },
            },
            GrammarNode::PropertyRef { name, .. } => match definitions.and_then(|d| d.find_property(name)) {
                Some(property) => State::Reference(ReferenceState::new(&property.syntax)),
                None => State::Leaf { pending: false },
            },
            GrammarNode::BooleanExpr { expansion, .. } => State::Reference(ReferenceState::new(expansion)),
            GrammarNode::Keyword { .. } | GrammarNode::Literal { .. } => State::Leaf { pending: false },
            GrammarNode::Group { children, .. } | GrammarNode::Juxtaposition { children } => {
                State::Sequence(SequenceState::new(children))
            }
            GrammarNode::AllOf { children } => State::AllOf(AllOfState::new(children)),
            GrammarNode::AnyOf { children } => State::AnyOf(AnyOfState::new(children)),
            GrammarNode::OneOf { children } => State::OneOf(OneOfState::new(children)),
        };

        Self::with_state(node, start, state)
    }

    fn with_state(node: &'a GrammarNode, start: usize, state: State<'a>) -> Self {
        Matcher {
            node,
            start,
            end: start,
            exhausted: false,
            valid: false,
            state,
        }
    }

    /// Moves to the next interpretation
    pub fn forward(&mut self, ctx: &mut Context<'_, 'a>) {
        if self.exhausted {
            self.valid = false;
            return;
        }

        let start = self.start;
        let found = match &mut self.state {
            State::Leaf { pending } => {
                if *pending {
                    // forwarded twice without a test
                    *pending = false;
                    self.exhausted = true;
                    self.valid = false;
                } else {
                    *pending = true;
                }
                return;
            }
            State::Reference(state) => state.search(start, ctx),
            State::Sequence(state) => state.search(start, ctx),
            State::OneOf(state) => state.search(start, ctx),
            State::AllOf(state) => state.search(start, ctx),
            State::AnyOf(state) => state.search(start, ctx),
            State::Repeat(state) => state.search(start, ctx),
        };

        match found {
            Some(end) => {
                self.end = end;
                self.valid = true;
            }
            None => {
                self.end = self.start;
                self.valid = false;
                self.exhausted = true;
            }
        }
    }

    /// Returns true when the current interpretation matches
    pub fn test(&mut self, ctx: &mut Context<'_, 'a>) -> bool {
        if let State::Leaf { pending } = &mut self.state {
            if *pending {
                *pending = false;
                // a leaf only has one interpretation
                self.exhausted = true;
                match self.test_leaf(ctx) {
                    Some(end) => {
                        self.end = end;
                        self.valid = true;
                    }
                    None => self.valid = false,
                }
            }
        }

        self.valid
    }

    /// Moves to the next interpretation that matches. Returns false when there is none.
    pub fn step(&mut self, ctx: &mut Context<'_, 'a>) -> bool {
        self.forward(ctx);
        self.test(ctx)
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of slots consumed by the current interpretation
    pub fn matched_size(&self) -> usize {
        self.end - self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Appends the records of the current interpretation
    pub fn collect_records(&self, records: &mut Vec<Record<'a>>) {
        match &self.state {
            State::Leaf { .. } | State::Reference(_) => {
                if self.valid && self.end > self.start {
                    push_record(
                        records,
                        Record {
                            node: self.node,
                            start: self.start,
                            end: self.end,
                        },
                    );
                }
            }
            State::Sequence(state) => state.frames.iter().for_each(|m| m.collect_records(records)),
            State::OneOf(state) => {
                if let Some(current) = &state.current {
                    current.collect_records(records);
                }
            }
            State::AllOf(state) => state.frames.iter().for_each(|(_, m)| m.collect_records(records)),
            State::AnyOf(state) => state.frames.iter().for_each(|(_, m)| m.collect_records(records)),
            State::Repeat(state) => {
                for repetition in &state.frames {
                    if let Some(comma) = repetition.comma {
                        push_record(
                            records,
                            Record {
                                node: self.node,
                                start: comma,
                                end: comma + 1,
                            },
                        );
                    }
                    repetition.matcher.collect_records(records);
                }
            }
        }
    }

    fn test_leaf(&self, ctx: &mut Context<'_, 'a>) -> Option<usize> {
        if !ctx.count_step() {
            return None;
        }

        let end = match_leaf(self.node, self.start, ctx);
        trace!(
            "{} '{}' at slot {}: {}",
            self.node.kind_name(),
            self.node,
            self.start,
            if end.is_some() { "match" } else { "no match" }
        );

        if end.is_none() {
            ctx.mismatch(self.node, self.start);
        }
        end
    }
}

/// Checks a leaf node against the slot at the given position, returns the end of the match
fn match_leaf<'a>(node: &'a GrammarNode, position: usize, ctx: &mut Context<'_, 'a>) -> Option<usize> {
    match node {
        GrammarNode::DataType { name, range, .. } => {
            if ctx.is_excluded(name) {
                return None;
            }
            if !builtin::is_builtin(name) {
                ctx.unresolved(node);
                return None;
            }

            let slot = ctx.slot(position)?;
            match slot.kind {
                SlotKind::Value if builtin::matches_value(name, range.as_ref(), slot.node) => Some(position + 1),
                SlotKind::FunctionName
                    if slot
                        .node
                        .function_name()
                        .is_some_and(|function| builtin::matches_function(name, function)) =>
                {
                    Some(slot.end)
                }
                _ => None,
            }
        }
        GrammarNode::Keyword { name, .. } => {
            let slot = ctx.slot(position)?;
            let text = match slot.kind {
                SlotKind::Value => slot.node.ident(),
                SlotKind::FunctionName => slot.node.function_name(),
                SlotKind::OpenParen | SlotKind::CloseParen => None,
            };
            text.is_some_and(|text| text.eq_ignore_ascii_case(name))
                .then_some(position + 1)
        }
        GrammarNode::Literal { text, .. } => {
            let slot = ctx.slot(position)?;
            let matched = match slot.kind {
                SlotKind::OpenParen => text == "(",
                SlotKind::CloseParen => text == ")",
                SlotKind::FunctionName => false,
                SlotKind::Value => literal_matches(text, slot.node),
            };
            matched.then_some(position + 1)
        }
        // unknown property, anything else is never a leaf
        _ => {
            ctx.unresolved(node);
            None
        }
    }
}

fn literal_matches(text: &str, value: &ValueNode) -> bool {
    let mut chars = text.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if value.is_literal(c) {
            return true;
        }
    }

    value.ident().is_some_and(|ident| ident.eq_ignore_ascii_case(text))
}

/// Steps the matcher to its next interpretation that consumes at least one slot, or to any
/// interpretation when `allow_empty` is set
fn step_repetition<'a>(matcher: &mut Matcher<'a>, ctx: &mut Context<'_, 'a>, allow_empty: bool) -> bool {
    while matcher.step(ctx) {
        if allow_empty || matcher.matched_size() > 0 {
            return true;
        }
    }
    false
}

struct ReferenceState<'a> {
    target: &'a GrammarNode,
    inner: Option<Box<Matcher<'a>>>,
}

impl<'a> ReferenceState<'a> {
    fn new(target: &'a GrammarNode) -> Self {
        ReferenceState { target, inner: None }
    }

    fn search(&mut self, start: usize, ctx: &mut Context<'_, 'a>) -> Option<usize> {
        if !ctx.enter_reference() {
            return None;
        }

        let inner = self
            .inner
            .get_or_insert_with(|| Box::new(Matcher::new(self.target, start, ctx)));
        let found = inner.step(ctx);

        ctx.leave_reference();
        found.then(|| inner.end())
    }
}

struct SequenceState<'a> {
    children: &'a [GrammarNode],
    frames: Vec<Matcher<'a>>,
    started: bool,
}

impl<'a> SequenceState<'a> {
    fn new(children: &'a [GrammarNode]) -> Self {
        SequenceState {
            children,
            frames: Vec::with_capacity(children.len()),
            started: false,
        }
    }

    fn search(&mut self, start: usize, ctx: &mut Context<'_, 'a>) -> Option<usize> {
        let mut backtrack = self.started;
        self.started = true;

        loop {
            if ctx.aborted {
                return None;
            }

            if backtrack {
                let top = self.frames.last_mut()?;
                if top.step(ctx) {
                    backtrack = false;
                } else {
                    self.frames.pop();
                }
                continue;
            }

            let position = self.frames.last().map_or(start, Matcher::end);
            let Some(child) = self.children.get(self.frames.len()) else {
                return Some(position);
            };

            let mut matcher = Matcher::new(child, position, ctx);
            if matcher.step(ctx) {
                self.frames.push(matcher);
            } else {
                backtrack = true;
            }
        }
    }
}

struct OneOfState<'a> {
    children: &'a [GrammarNode],
    /// Next alternative to try
    index: usize,
    current: Option<Box<Matcher<'a>>>,
}

impl<'a> OneOfState<'a> {
    fn new(children: &'a [GrammarNode]) -> Self {
        OneOfState {
            children,
            index: 0,
            current: None,
        }
    }

    fn search(&mut self, start: usize, ctx: &mut Context<'_, 'a>) -> Option<usize> {
        loop {
            if ctx.aborted {
                return None;
            }

            if let Some(current) = self.current.as_mut() {
                if current.step(ctx) {
                    return Some(current.end());
                }
            }

            let Some(child) = self.children.get(self.index) else {
                self.current = None;
                return None;
            };
            self.index += 1;
            self.current = Some(Box::new(Matcher::new(child, start, ctx)));
        }
    }
}

/// Permutation search: every child exactly once, in any order
struct AllOfState<'a> {
    children: &'a [GrammarNode],
    frames: Vec<(usize, Matcher<'a>)>,
    used: Vec<bool>,
    /// First child to try at the current depth
    next_candidate: usize,
    started: bool,
}

impl<'a> AllOfState<'a> {
    fn new(children: &'a [GrammarNode]) -> Self {
        AllOfState {
            children,
            frames: Vec::with_capacity(children.len()),
            used: vec![false; children.len()],
            next_candidate: 0,
            started: false,
        }
    }

    fn search(&mut self, start: usize, ctx: &mut Context<'_, 'a>) -> Option<usize> {
        let mut backtrack = self.started;
        self.started = true;

        loop {
            if ctx.aborted {
                return None;
            }

            if backtrack {
                backtrack = false;

                let (index, top) = self.frames.last_mut()?;
                if top.step(ctx) {
                    self.next_candidate = 0;
                    continue;
                }

                let index = *index;
                self.frames.pop();
                self.used[index] = false;
                self.next_candidate = index + 1;
                continue;
            }

            let position = self.frames.last().map_or(start, |(_, m)| m.end());
            if self.frames.len() == self.children.len() {
                return Some(position);
            }

            let Some(index) = (self.next_candidate..self.children.len()).find(|i| !self.used[*i]) else {
                backtrack = true;
                continue;
            };
            self.next_candidate = index + 1;

            let mut matcher = Matcher::new(&self.children[index], position, ctx);
            if matcher.step(ctx) {
                self.used[index] = true;
                self.frames.push((index, matcher));
                self.next_candidate = 0;
            }
        }
    }
}

/// One combination iterator of an any-of search. Levels are stacked: a new level explores
/// the unused children after an accepted child switched to another interpretation.
struct Level {
    combinations: CombinationIterator<usize>,
    /// Number of frames that belong to outer levels
    base: usize,
    /// The last proposal did not match
    rejected: bool,
    /// Proposal whose take back was interrupted by an alternative interpretation
    pending: Option<TakeBack>,
}

struct TakeBack {
    /// `None` when the iterator is exhausted
    proposal: Option<Combination<usize>>,
    /// Frames that still have to be taken back before the proposal can be tried
    remaining: usize,
}

impl Level {
    fn new(children: Vec<usize>, base: usize) -> Self {
        Level {
            combinations: CombinationIterator::new(children),
            base,
            rejected: false,
            pending: None,
        }
    }
}

/// Any non-empty subset of the children in any order
struct AnyOfState<'a> {
    children: &'a [GrammarNode],
    frames: Vec<(usize, Matcher<'a>)>,
    levels: Vec<Level>,
}

impl<'a> AnyOfState<'a> {
    fn new(children: &'a [GrammarNode]) -> Self {
        AnyOfState {
            children,
            frames: Vec::with_capacity(children.len()),
            levels: vec![Level::new((0..children.len()).collect(), 0)],
        }
    }

    fn search(&mut self, start: usize, ctx: &mut Context<'_, 'a>) -> Option<usize> {
        loop {
            if ctx.aborted {
                return None;
            }

            let level = self.levels.last_mut()?;
            let mut take_back = match level.pending.take() {
                Some(take_back) => take_back,
                None => {
                    let proposal = if level.rejected {
                        level.combinations.advance_and_cancel_last()
                    } else {
                        level.combinations.advance()
                    };
                    let remaining = match &proposal {
                        Some(combination) => combination.take_back.len(),
                        None => self.frames.len().saturating_sub(level.base),
                    };
                    TakeBack { proposal, remaining }
                }
            };

            // Children that are taken back get to try their other interpretations first
            let mut alternative = false;
            while take_back.remaining > 0 {
                let Some((_, top)) = self.frames.last_mut() else {
                    break;
                };
                if top.step(ctx) {
                    alternative = true;
                    break;
                }
                self.frames.pop();
                take_back.remaining -= 1;
            }

            if alternative {
                level.pending = Some(take_back);

                let unused: Vec<usize> = (0..self.children.len())
                    .filter(|i| !self.frames.iter().any(|(used, _)| used == i))
                    .collect();
                if !unused.is_empty() {
                    self.levels.push(Level::new(unused, self.frames.len()));
                }

                return self.frames.last().map(|(_, m)| m.end());
            }

            let Some(proposal) = take_back.proposal else {
                self.levels.pop();
                continue;
            };

            let index = proposal.last;
            let position = self.frames.last().map_or(start, |(_, m)| m.end());
            let Some(child) = self.children.get(index) else {
                level.rejected = true;
                continue;
            };

            let mut matcher = Matcher::new(child, position, ctx);
            let accepted = matcher.step(ctx);
            if let Some(level) = self.levels.last_mut() {
                level.rejected = !accepted;
            }

            if accepted {
                let end = matcher.end();
                self.frames.push((index, matcher));
                return Some(end);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Try to add another repetition
    Extend,
    /// Report the current repetitions
    Yield,
    /// Try the next interpretation of the last repetition
    Backtrack,
}

struct Repetition<'a> {
    /// Slot of the comma in front of this repetition, for comma separated lists
    comma: Option<usize>,
    matcher: Matcher<'a>,
}

/// Greedy repetition: longer configurations are reported before shorter ones
struct RepeatState<'a> {
    node: &'a GrammarNode,
    multiplier: Multiplier,
    frames: Vec<Repetition<'a>>,
    phase: Phase,
}

impl<'a> RepeatState<'a> {
    fn new(node: &'a GrammarNode, multiplier: Multiplier) -> Self {
        RepeatState {
            node,
            multiplier,
            frames: Vec::new(),
            phase: Phase::Extend,
        }
    }

    fn search(&mut self, start: usize, ctx: &mut Context<'_, 'a>) -> Option<usize> {
        loop {
            if ctx.aborted {
                return None;
            }

            let end = self.frames.last().map_or(start, |r| r.matcher.end());

            match self.phase {
                Phase::Extend => {
                    self.phase = Phase::Yield;

                    if self.multiplier.max.is_some_and(|max| self.frames.len() >= max) {
                        continue;
                    }
                    let Some((comma, position)) = self.separator(end, ctx) else {
                        continue;
                    };

                    // empty repetitions only fill up the minimum, otherwise they would repeat forever
                    let allow_empty = self.frames.len() < self.multiplier.min;
                    let mut matcher = Matcher::new_plain(self.node, position, ctx);
                    if step_repetition(&mut matcher, ctx, allow_empty) {
                        self.frames.push(Repetition { comma, matcher });
                        self.phase = Phase::Extend;
                    }
                }
                Phase::Yield => {
                    self.phase = Phase::Backtrack;
                    if self.multiplier.allows(self.frames.len()) {
                        return Some(end);
                    }
                }
                Phase::Backtrack => {
                    let allow_empty = self.frames.len() <= self.multiplier.min;
                    let top = self.frames.last_mut()?;
                    if step_repetition(&mut top.matcher, ctx, allow_empty) {
                        self.phase = Phase::Extend;
                    } else {
                        self.frames.pop();
                        self.phase = Phase::Yield;
                    }
                }
            }
        }
    }

    /// Returns the comma slot and the start of the next repetition
    fn separator(&self, end: usize, ctx: &Context<'_, 'a>) -> Option<(Option<usize>, usize)> {
        if !self.multiplier.list || self.frames.is_empty() {
            return Some((None, end));
        }

        let slot = ctx.slot(end)?;
        (slot.kind == SlotKind::Value && slot.node.is_comma()).then_some((Some(end), end + 1))
    }
}
