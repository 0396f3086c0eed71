use std::iter::FusedIterator;

use text_size::TextSize;

use super::{SyntaxElement, SyntaxNode, SyntaxToken};
use crate::{NodeOrToken, SyntaxKind};

/// Present children of a node in slot order, lists not flattened.
#[derive(Clone)]
pub struct SlotChildren {
    parent: SyntaxNode,
    front: usize,
    back: usize,
    front_offset: TextSize,
    back_offset: TextSize,
}

impl SlotChildren {
    pub(super) fn new(parent: SyntaxNode) -> Self {
        let range = parent.text_range();
        let back = parent.green().slot_count();
        Self { parent, front: 0, back, front_offset: range.start(), back_offset: range.end() }
    }

    /// Slots after `slot`; the first of them starts at `offset`.
    pub(super) fn after(parent: SyntaxNode, slot: usize, offset: TextSize) -> Self {
        let mut children = Self::new(parent);
        children.front = slot + 1;
        children.front_offset = offset;
        children
    }

    /// Slots before `slot`; the last of them ends at `offset`.
    pub(super) fn before(parent: SyntaxNode, slot: usize, offset: TextSize) -> Self {
        let mut children = Self::new(parent);
        children.back = slot;
        children.back_offset = offset;
        children
    }
}

impl Iterator for SlotChildren {
    type Item = SyntaxElement;

    fn next(&mut self) -> Option<SyntaxElement> {
        while self.front < self.back {
            let index = self.front;
            self.front += 1;
            if let Some(green) = self.parent.green().slot(index).cloned() {
                let offset = self.front_offset;
                self.front_offset += green.width();
                return Some(self.parent.element(index, green, offset));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.back - self.front))
    }
}

impl DoubleEndedIterator for SlotChildren {
    fn next_back(&mut self) -> Option<SyntaxElement> {
        while self.back > self.front {
            self.back -= 1;
            if let Some(green) = self.parent.green().slot(self.back).cloned() {
                self.back_offset -= green.width();
                return Some(self.parent.element(self.back, green, self.back_offset));
            }
        }
        None
    }
}

impl FusedIterator for SlotChildren {}

/// Children including tokens, flattening list nodes.
#[derive(Clone)]
pub struct ChildrenWithTokens {
    list: Option<SlotChildren>,
    slots: SlotChildren,
}

impl ChildrenWithTokens {
    pub(super) fn new(slots: SlotChildren) -> Self {
        Self { list: None, slots }
    }
}

impl Iterator for ChildrenWithTokens {
    type Item = SyntaxElement;

    fn next(&mut self) -> Option<SyntaxElement> {
        loop {
            if let Some(list) = &mut self.list {
                match list.next() {
                    Some(item) => return Some(item),
                    None => self.list = None,
                }
            }

            match self.slots.next()? {
                NodeOrToken::Node(node) if node.kind() == SyntaxKind::LIST => self.list = Some(node.slots()),
                element => return Some(element),
            }
        }
    }
}

impl FusedIterator for ChildrenWithTokens {}

/// Child nodes only.
#[derive(Clone)]
pub struct Children {
    inner: ChildrenWithTokens,
}

impl Children {
    pub(super) fn new(inner: ChildrenWithTokens) -> Self {
        Self { inner }
    }
}

impl Iterator for Children {
    type Item = SyntaxNode;

    fn next(&mut self) -> Option<SyntaxNode> {
        self.inner.find_map(NodeOrToken::into_node)
    }
}

impl FusedIterator for Children {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalkEvent {
    Enter(SyntaxNode),
    Leave(SyntaxNode),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalkEventWithTokens {
    EnterNode(SyntaxNode),
    LeaveNode(SyntaxNode),
    Token(SyntaxToken),
}

/// Preorder traversal over nodes.
#[derive(Clone)]
pub struct Preorder {
    inner: PreorderWithTokens,
}

impl Preorder {
    pub(super) fn new(start: SyntaxNode) -> Self {
        Self { inner: PreorderWithTokens::new(start) }
    }

    /// Skips the subtree of the node just entered.
    pub fn skip_subtree(&mut self) {
        self.inner.skip_subtree();
    }
}

impl Iterator for Preorder {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        self.inner.find_map(|event| match event {
            WalkEventWithTokens::EnterNode(node) => Some(WalkEvent::Enter(node)),
            WalkEventWithTokens::LeaveNode(node) => Some(WalkEvent::Leave(node)),
            WalkEventWithTokens::Token(_) => None,
        })
    }
}

/// Preorder traversal over nodes and tokens.
#[derive(Clone)]
pub struct PreorderWithTokens {
    stack: Vec<(SyntaxNode, ChildrenWithTokens)>,
    root: Option<SyntaxNode>,
}

impl PreorderWithTokens {
    pub(super) fn new(start: SyntaxNode) -> Self {
        Self { stack: Vec::new(), root: Some(start) }
    }

    /// Skips the subtree of the node just entered.
    #[track_caller]
    pub fn skip_subtree(&mut self) {
        assert!(self.stack.pop().is_some(), "must have a subtree to skip");
    }
}

impl Iterator for PreorderWithTokens {
    type Item = WalkEventWithTokens;

    fn next(&mut self) -> Option<WalkEventWithTokens> {
        if let Some(root) = self.root.take() {
            self.stack.push((root.clone(), root.children_with_tokens()));
            return Some(WalkEventWithTokens::EnterNode(root));
        }

        let (_, children) = self.stack.last_mut()?;
        match children.next() {
            Some(NodeOrToken::Node(child)) => {
                self.stack.push((child.clone(), child.children_with_tokens()));
                Some(WalkEventWithTokens::EnterNode(child))
            }
            Some(NodeOrToken::Token(token)) => Some(WalkEventWithTokens::Token(token)),
            None => {
                let (node, _) = self.stack.pop()?;
                Some(WalkEventWithTokens::LeaveNode(node))
            }
        }
    }
}

impl FusedIterator for PreorderWithTokens {}
