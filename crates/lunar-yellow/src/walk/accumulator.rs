use std::collections::VecDeque;
use std::iter::FusedIterator;

use lunar_errors::Diagnostic;
use text_size::TextSize;

use crate::green::{GreenElement, GreenNode, GreenToken, GreenTrivia, NodeFlags};
use crate::NodeOrToken;

/// Flattens a green subtree into a sequence of items.
///
/// Hooks push into `out`; offsets are relative to the start of the root
/// passed to [`Accumulator::accumulate`]. The traversal is driven by the
/// returned iterator, so nothing is visited before it is polled.
pub trait Accumulator {
    type Item;

    /// When `false`, structured trivia contributes only its own
    /// [`Accumulator::on_trivia`] call.
    fn visit_into_structured_trivia(&self) -> bool {
        false
    }

    /// Whether to enter the children of `node`.
    fn descend(&mut self, _node: &GreenNode) -> bool {
        true
    }

    fn on_node(&mut self, _node: &GreenNode, _offset: TextSize, _out: &mut VecDeque<Self::Item>) {}

    fn on_token(&mut self, _token: &GreenToken, _offset: TextSize, _out: &mut VecDeque<Self::Item>) {}

    fn on_trivia(&mut self, _trivia: &GreenTrivia, _offset: TextSize, _out: &mut VecDeque<Self::Item>) {}

    fn accumulate(self, root: &GreenNode) -> Accumulate<Self>
    where
        Self: Sized,
    {
        Accumulate::new(self, root.clone())
    }
}

enum Frame {
    Node { node: GreenNode, slot: usize, offset: TextSize },
    Token { token: GreenToken, phase: TokenPhase, offset: TextSize },
}

#[derive(Clone, Copy)]
enum TokenPhase {
    Leading(usize),
    Trailing(usize),
}

/// Lazy, single-pass iterator returned by [`Accumulator::accumulate`].
pub struct Accumulate<A: Accumulator> {
    accumulator: A,
    stack: Vec<Frame>,
    out: VecDeque<A::Item>,
    root: Option<GreenNode>,
}

impl<A: Accumulator> Accumulate<A> {
    fn new(accumulator: A, root: GreenNode) -> Self {
        Self { accumulator, stack: Vec::new(), out: VecDeque::new(), root: Some(root) }
    }

    /// The accumulator, with whatever state it kept.
    pub fn into_inner(self) -> A {
        self.accumulator
    }

    fn enter_node(&mut self, node: GreenNode, offset: TextSize) {
        self.accumulator.on_node(&node, offset, &mut self.out);
        if self.accumulator.descend(&node) {
            self.stack.push(Frame::Node { node, slot: 0, offset });
        }
    }

    fn enter_token(&mut self, token: GreenToken, offset: TextSize) {
        self.accumulator.on_token(&token, offset, &mut self.out);
        self.stack.push(Frame::Token { token, phase: TokenPhase::Leading(0), offset });
    }

    fn enter_trivia(&mut self, trivia: GreenTrivia, offset: TextSize) {
        self.accumulator.on_trivia(&trivia, offset, &mut self.out);
        if !self.accumulator.visit_into_structured_trivia() {
            return;
        }
        if let Some(structure) = trivia.structure() {
            self.enter_node(structure.clone(), offset);
        }
    }

    /// Advances the traversal by one element. Returns `false` once done.
    fn step(&mut self) -> bool {
        if let Some(root) = self.root.take() {
            self.enter_node(root, TextSize::new(0));
            return true;
        }

        let Some(frame) = self.stack.last_mut() else {
            return false;
        };
        match frame {
            Frame::Node { node, slot, offset } => {
                let next = node.slots().skip(*slot).position(|child| child.is_some());
                let Some(skipped) = next else {
                    self.stack.pop();
                    return true;
                };
                *slot += skipped;
                let child: Option<GreenElement> = node.slot(*slot).cloned();
                let at = *offset;
                *slot += 1;
                match child {
                    Some(NodeOrToken::Node(child)) => {
                        *offset += child.width();
                        self.enter_node(child, at);
                    }
                    Some(NodeOrToken::Token(child)) => {
                        *offset += child.width();
                        self.enter_token(child, at);
                    }
                    None => {}
                }
            }
            Frame::Token { token, phase, offset } => {
                let next = match *phase {
                    TokenPhase::Leading(index) => match token.leading_trivia().pieces().get(index) {
                        Some(piece) => {
                            *phase = TokenPhase::Leading(index + 1);
                            Some(piece.clone())
                        }
                        None => {
                            *offset += token.text_width();
                            *phase = TokenPhase::Trailing(0);
                            return true;
                        }
                    },
                    TokenPhase::Trailing(index) => {
                        *phase = TokenPhase::Trailing(index + 1);
                        token.trailing_trivia().pieces().get(index).cloned()
                    }
                };
                match next {
                    Some(piece) => {
                        let at = *offset;
                        *offset += piece.width();
                        self.enter_trivia(piece, at);
                    }
                    None => {
                        self.stack.pop();
                    }
                }
            }
        }
        true
    }
}

impl<A: Accumulator> Iterator for Accumulate<A> {
    type Item = A::Item;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.out.pop_front() {
                return Some(item);
            }
            if !self.step() {
                return None;
            }
        }
    }
}

impl<A: Accumulator> FusedIterator for Accumulate<A> {}

/// Every token with its offset, leaving structured trivia closed.
pub fn tokens(root: &GreenNode) -> Accumulate<Tokens> {
    Tokens { structured: false }.accumulate(root)
}

/// Every trivia piece with its offset.
pub fn trivia(root: &GreenNode, visit_into_structured_trivia: bool) -> Accumulate<Trivia> {
    Trivia { structured: visit_into_structured_trivia }.accumulate(root)
}

/// Every diagnostic in the tree, with offsets relative to `root`.
pub fn diagnostics(root: &GreenNode) -> Accumulate<Diagnostics> {
    Diagnostics.accumulate(root)
}

pub struct Tokens {
    structured: bool,
}

impl Tokens {
    pub fn new(visit_into_structured_trivia: bool) -> Self {
        Self { structured: visit_into_structured_trivia }
    }
}

impl Accumulator for Tokens {
    type Item = (TextSize, GreenToken);

    fn visit_into_structured_trivia(&self) -> bool {
        self.structured
    }

    fn on_token(&mut self, token: &GreenToken, offset: TextSize, out: &mut VecDeque<Self::Item>) {
        out.push_back((offset, token.clone()));
    }
}

pub struct Trivia {
    structured: bool,
}

impl Accumulator for Trivia {
    type Item = (TextSize, GreenTrivia);

    fn visit_into_structured_trivia(&self) -> bool {
        self.structured
    }

    fn on_trivia(&mut self, trivia: &GreenTrivia, offset: TextSize, out: &mut VecDeque<Self::Item>) {
        out.push_back((offset, trivia.clone()));
    }
}

pub struct Diagnostics;

impl Diagnostics {
    fn push_own(
        flags: NodeFlags,
        own: impl FnOnce() -> std::sync::Arc<[Diagnostic]>,
        offset: TextSize,
        out: &mut VecDeque<Diagnostic>,
    ) {
        if flags.contains(NodeFlags::HAS_OWN_DIAGNOSTICS) {
            out.extend(own().iter().map(|diagnostic| diagnostic.shifted(offset)));
        }
    }
}

impl Accumulator for Diagnostics {
    type Item = Diagnostic;

    fn visit_into_structured_trivia(&self) -> bool {
        true
    }

    fn descend(&mut self, node: &GreenNode) -> bool {
        node.contains_diagnostics()
    }

    fn on_node(&mut self, node: &GreenNode, offset: TextSize, out: &mut VecDeque<Diagnostic>) {
        Self::push_own(node.flags(), || node.diagnostics(), offset, out);
    }

    fn on_token(&mut self, token: &GreenToken, offset: TextSize, out: &mut VecDeque<Diagnostic>) {
        Self::push_own(token.flags(), || token.diagnostics(), offset, out);
    }

    fn on_trivia(&mut self, trivia: &GreenTrivia, offset: TextSize, out: &mut VecDeque<Diagnostic>) {
        Self::push_own(trivia.flags(), || trivia.diagnostics(), offset, out);
    }
}
