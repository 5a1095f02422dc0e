//! Enumeration of ordered, non-empty subsets for the `||` combinator.
//!
//! The iterator proposes combinations one element at a time, in depth-first pre-order: after
//! `[a]` comes `[a, b]`, then `[a, b, c]` and so on. Every proposal extends a prefix of the
//! previous one, and `take_back` lists the elements of the previous combination that are not
//! part of that prefix any more. When an extension turns out to be useless, the caller can
//! cancel it so no combination starting with it is proposed.

/// A single proposal of the iterator
#[derive(Debug, Clone, PartialEq)]
pub struct Combination<T> {
    /// The complete combination, in order
    pub combination: Vec<T>,
    /// The element that was added to the prefix (always the last element of `combination`)
    pub last: T,
    /// Elements of the previous combination that are no longer part of this one, in order
    pub take_back: Vec<T>,
}

#[derive(Debug, Clone)]
struct Frame<T> {
    /// Elements that can extend the prefix at this depth
    options: Vec<T>,
    /// Length of the prefix this frame extends
    prefix_len: usize,
    /// Next option to try
    index: usize,
}

/// Depth-first iterator over all permutations of all non-empty subsets of a set of elements
#[derive(Debug, Clone)]
pub struct CombinationIterator<T> {
    stack: Vec<Frame<T>>,
    /// Combination as last proposed
    combination: Vec<T>,
}

impl<T: Clone> CombinationIterator<T> {
    pub fn new(items: Vec<T>) -> Self {
        CombinationIterator {
            stack: vec![Frame {
                options: items,
                prefix_len: 0,
                index: 0,
            }],
            combination: Vec::new(),
        }
    }

    /// Proposes the next combination, accepting the last proposal as a prefix to extend
    pub fn advance(&mut self) -> Option<Combination<T>> {
        loop {
            let frame = self.stack.last_mut()?;
            if frame.index >= frame.options.len() {
                self.stack.pop();
                continue;
            }

            let index = frame.index;
            frame.index += 1;

            let last = frame.options[index].clone();
            let remaining: Vec<T> = frame
                .options
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, item)| item.clone())
                .collect();
            let prefix_len = frame.prefix_len;

            let take_back = self.combination.split_off(prefix_len);
            self.combination.push(last.clone());
            self.stack.push(Frame {
                options: remaining,
                prefix_len: prefix_len + 1,
                index: 0,
            });

            return Some(Combination {
                combination: self.combination.clone(),
                last,
                take_back,
            });
        }
    }

    /// Rejects the last proposal: no combination that extends it is proposed, and it is not
    /// reported in `take_back` of the next proposal.
    pub fn advance_and_cancel_last(&mut self) -> Option<Combination<T>> {
        if !self.combination.is_empty() {
            self.stack.pop();
            self.combination.pop();
        }
        self.advance()
    }
}

impl<T: Clone> Iterator for CombinationIterator<T> {
    type Item = Combination<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}
