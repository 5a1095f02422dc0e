use crate::definitions::CssDefinitions;
use crate::matcher::slots::Slot;
use crate::matcher::MatchOptions;
use crate::syntax::GrammarNode;
use log::warn;
use std::ptr;

/// Shared state of a single match run
pub(crate) struct Context<'s, 'a> {
    pub slots: &'s [Slot<'a>],
    pub definitions: Option<&'a CssDefinitions>,
    exclude: &'s [String],
    step_budget: usize,
    max_depth: usize,

    /// Number of leaf tests performed
    pub steps: usize,
    /// Current reference nesting
    pub depth: usize,
    /// Set when the step budget ran out, all matchers stop searching
    pub aborted: bool,
    depth_warned: bool,

    /// Deepest slot position at which a leaf failed, and the leaves that failed there
    furthest: usize,
    mismatches: Vec<&'a GrammarNode>,
    /// References that could not be resolved
    pub unresolved: Vec<&'a GrammarNode>,
}

impl<'s, 'a> Context<'s, 'a> {
    pub fn new(slots: &'s [Slot<'a>], options: &'s MatchOptions<'a>) -> Self {
        Context {
            slots,
            definitions: options.definitions,
            exclude: &options.exclude,
            step_budget: options.step_budget,
            max_depth: options.max_depth,
            steps: 0,
            depth: 0,
            aborted: false,
            depth_warned: false,
            furthest: 0,
            mismatches: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    pub fn slot(&self, index: usize) -> Option<&'s Slot<'a>> {
        self.slots.get(index)
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|e| e.eq_ignore_ascii_case(name))
    }

    /// Counts a leaf test. Returns false when the budget is exhausted.
    pub fn count_step(&mut self) -> bool {
        if self.aborted {
            return false;
        }

        self.steps += 1;
        if self.steps > self.step_budget {
            warn!("value matching aborted after {} steps", self.step_budget);
            self.aborted = true;
            return false;
        }

        true
    }

    /// Returns false when resolving another reference would exceed the maximum depth
    pub fn enter_reference(&mut self) -> bool {
        if self.depth >= self.max_depth {
            if !self.depth_warned {
                warn!("reference nesting deeper than {} levels", self.max_depth);
                self.depth_warned = true;
            }
            return false;
        }

        self.depth += 1;
        true
    }

    pub fn leave_reference(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Remembers a failed leaf. Only the failures at the deepest position are kept.
    pub fn mismatch(&mut self, node: &'a GrammarNode, position: usize) {
        if position > self.furthest || self.mismatches.is_empty() {
            self.furthest = position;
            self.mismatches.clear();
        } else if position < self.furthest {
            return;
        }

        if !self.mismatches.iter().any(|n| ptr::eq(*n, node)) {
            self.mismatches.push(node);
        }
    }

    pub fn unresolved(&mut self, node: &'a GrammarNode) {
        if !self.unresolved.iter().any(|n| ptr::eq(*n, node)) {
            self.unresolved.push(node);
        }
    }

    /// Position and nodes of the deepest failures
    pub fn mismatches(&self) -> (usize, &[&'a GrammarNode]) {
        (self.furthest, &self.mismatches)
    }
}
