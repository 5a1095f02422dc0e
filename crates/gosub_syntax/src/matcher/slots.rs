//! Flattening of value streams into the positions the matcher walks over

use gosub_css3::value::{ValueKind, ValueNode};
use gosub_shared::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotKind {
    /// A plain value
    Value,
    /// The name of a function call
    FunctionName,
    OpenParen,
    CloseParen,
}

/// A single position in the flattened value stream.
///
/// A function call `name( args )` is flattened into its name, an opening parenthesis, the
/// (flattened) arguments and a closing parenthesis, so grammars like `rgb( <number>{3} )` can
/// match the call structurally.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slot<'a> {
    pub node: &'a ValueNode,
    pub kind: SlotKind,
    /// For a function name, the slot index just past the closing parenthesis. Otherwise the
    /// index of the next slot.
    pub end: usize,
    pub span: Span,
}

/// Flattens the values, skipping whitespace and comments
pub(crate) fn flatten(values: &[ValueNode]) -> Vec<Slot<'_>> {
    let mut slots = Vec::with_capacity(values.len());
    flatten_into(values, &mut slots);
    slots
}

fn flatten_into<'a>(values: &'a [ValueNode], slots: &mut Vec<Slot<'a>>) {
    for node in values.iter().filter(|v| !v.is_trivia()) {
        let ValueKind::Function { name, arguments } = &node.kind else {
            slots.push(Slot {
                node,
                kind: SlotKind::Value,
                end: slots.len() + 1,
                span: node.span,
            });
            continue;
        };

        let name_end = node.span.start + name.len();
        let index = slots.len();
        slots.push(Slot {
            node,
            kind: SlotKind::FunctionName,
            end: index + 1,
            span: Span::new(node.span.start, name_end),
        });
        slots.push(Slot {
            node,
            kind: SlotKind::OpenParen,
            end: index + 2,
            span: Span::new(name_end, name_end + 1),
        });

        flatten_into(arguments, slots);

        slots.push(Slot {
            node,
            kind: SlotKind::CloseParen,
            end: slots.len() + 1,
            span: Span::new(node.span.end.saturating_sub(1), node.span.end),
        });

        let end = slots.len();
        if let Some(slot) = slots.get_mut(index) {
            slot.end = end;
        }
    }
}
