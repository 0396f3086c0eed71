//! Conditional-compilation state threaded through a parse.
//!
//! The stack is an immutable cons list: [`DirectiveStack::add`] returns a new
//! stack sharing its tail with the old one, so snapshots taken at any point
//! stay valid and cheap.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::green::{GreenNode, GreenToken, GreenTrivia, NodeFlags};
use crate::{NodeOrToken, SyntaxKind};

/// Slot of the symbol in `$if`, `$elseif`, `$define` and `$undef` nodes.
const NAME_SLOT: usize = 2;

/// One directive as seen by the stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive {
    node: GreenNode,
    name: Option<SmolStr>,
    is_active: bool,
    branch_taken: bool,
}

impl Directive {
    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.node.kind()
    }

    #[inline]
    pub fn node(&self) -> &GreenNode {
        &self.node
    }

    /// Symbol named by the directive, if its kind takes one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the directive itself sits in active text.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// For conditional directives, whether the branch it opens is taken.
    #[inline]
    pub fn branch_taken(&self) -> bool {
        self.branch_taken
    }

    fn is_conditional(&self) -> bool {
        matches!(
            self.kind(),
            SyntaxKind::IF_DIRECTIVE_TRIVIA
                | SyntaxKind::ELSEIF_DIRECTIVE_TRIVIA
                | SyntaxKind::ELSE_DIRECTIVE_TRIVIA
        )
    }
}

fn directive_name(node: &GreenNode) -> Option<SmolStr> {
    if node.slot_count() <= NAME_SLOT {
        return None;
    }
    match node.slot(NAME_SLOT)? {
        NodeOrToken::Token(token) if token.kind() == SyntaxKind::IDENTIFIER && !token.is_missing() => {
            Some(token.text().into())
        }
        _ => None,
    }
}

#[derive(Debug)]
struct Cell {
    head: Directive,
    tail: Option<Arc<Cell>>,
}

/// Immutable stack of the directives seen so far.
#[derive(Clone, Debug, Default)]
pub struct DirectiveStack {
    top: Option<Arc<Cell>>,
    symbols: Arc<[SmolStr]>,
}

impl DirectiveStack {
    /// Empty stack; `symbols` count as defined until `$undef`'d.
    pub fn new(symbols: impl IntoIterator<Item = SmolStr>) -> Self {
        Self { top: None, symbols: symbols.into_iter().collect() }
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn top(&self) -> Option<&Directive> {
        self.top.as_deref().map(|cell| &cell.head)
    }

    /// Directives from the most recent to the oldest.
    pub fn iter(&self) -> impl Iterator<Item = &Directive> + '_ {
        std::iter::successors(self.top.as_deref(), |cell| cell.tail.as_deref()).map(|cell| &cell.head)
    }

    /// Whether text at this point is compiled.
    pub fn is_active(&self) -> bool {
        self.iter().find(|directive| directive.is_conditional()).is_none_or(Directive::branch_taken)
    }

    /// Whether `name` is defined at this point.
    pub fn is_defined(&self, name: &str) -> bool {
        let mut cells = std::iter::successors(self.top.as_deref(), |cell| cell.tail.as_deref());
        while let Some(cell) = cells.next() {
            let directive = &cell.head;
            match directive.kind() {
                SyntaxKind::DEFINE_DIRECTIVE_TRIVIA if directive.is_active && directive.name() == Some(name) => {
                    return true;
                }
                SyntaxKind::UNDEF_DIRECTIVE_TRIVIA if directive.is_active && directive.name() == Some(name) => {
                    return false;
                }
                SyntaxKind::ELSEIF_DIRECTIVE_TRIVIA | SyntaxKind::ELSE_DIRECTIVE_TRIVIA => {
                    // Skip the earlier branches of the same `$if`.
                    for skipped in cells.by_ref() {
                        if skipped.head.kind() == SyntaxKind::IF_DIRECTIVE_TRIVIA {
                            break;
                        }
                    }
                }
                _ => {}
            }
        }
        self.symbols.iter().any(|symbol| symbol == name)
    }

    /// Whether an `$if` is open.
    pub fn has_unfinished_if(&self) -> bool {
        self.iter().any(Directive::is_conditional)
    }

    /// Whether the innermost open conditional can still take `$elseif`/`$else`.
    pub fn has_previous_if_or_elseif(&self) -> bool {
        self.iter().find(|directive| directive.is_conditional()).is_some_and(|directive| {
            matches!(directive.kind(), SyntaxKind::IF_DIRECTIVE_TRIVIA | SyntaxKind::ELSEIF_DIRECTIVE_TRIVIA)
        })
    }

    /// Whether some earlier branch of the innermost `$if` was taken.
    pub fn previous_branch_taken(&self) -> bool {
        for directive in self.iter() {
            if directive.branch_taken {
                return true;
            }
            if directive.kind() == SyntaxKind::IF_DIRECTIVE_TRIVIA {
                return false;
            }
        }
        false
    }

    /// Returns the stack after `node`, which must be directive trivia.
    #[track_caller]
    pub fn add(&self, node: &GreenNode) -> Self {
        let kind = node.kind();
        assert!(kind.is_directive_trivia(), "{kind:?} is not directive trivia");

        let enclosing_active = self.is_active();
        let name = directive_name(node);
        let defined = |stack: &Self| name.as_deref().is_some_and(|name| stack.is_defined(name));

        let (is_active, branch_taken) = match kind {
            SyntaxKind::IF_DIRECTIVE_TRIVIA => (enclosing_active, enclosing_active && defined(self)),
            SyntaxKind::ELSEIF_DIRECTIVE_TRIVIA | SyntaxKind::ELSE_DIRECTIVE_TRIVIA => {
                let outer_active = self.outer_active();
                let available = outer_active && !self.previous_branch_taken();
                let taken = if kind == SyntaxKind::ELSE_DIRECTIVE_TRIVIA {
                    available
                } else {
                    available && defined(self)
                };
                (outer_active, taken)
            }
            SyntaxKind::END_DIRECTIVE_TRIVIA => {
                let (popped, _) = Self::complete_if(self.top.as_ref());
                tracing::trace!(depth = self.len(), "closing conditional directive");
                return Self { top: popped, symbols: Arc::clone(&self.symbols) };
            }
            _ => (enclosing_active, false),
        };

        tracing::trace!(?kind, is_active, branch_taken, "directive");
        self.push(Directive { node: node.clone(), name, is_active, branch_taken })
    }

    fn push(&self, head: Directive) -> Self {
        Self {
            top: Some(Arc::new(Cell { head, tail: self.top.clone() })),
            symbols: Arc::clone(&self.symbols),
        }
    }

    /// Activity of the text around the innermost open `$if`.
    fn outer_active(&self) -> bool {
        self.iter()
            .find(|directive| directive.kind() == SyntaxKind::IF_DIRECTIVE_TRIVIA)
            .is_none_or(Directive::is_active)
    }

    /// Unwinds to just below the innermost `$if`, keeping the defines made
    /// in taken branches. Returns the new top and whether the content after
    /// the last unwound conditional was included.
    fn complete_if(cell: Option<&Arc<Cell>>) -> (Option<Arc<Cell>>, bool) {
        let Some(cell) = cell else {
            return (None, true);
        };
        if cell.head.kind() == SyntaxKind::IF_DIRECTIVE_TRIVIA {
            return (cell.tail.clone(), cell.head.branch_taken);
        }

        let (rest, include) = Self::complete_if(cell.tail.as_ref());
        match cell.head.kind() {
            SyntaxKind::ELSEIF_DIRECTIVE_TRIVIA | SyntaxKind::ELSE_DIRECTIVE_TRIVIA => {
                (rest, cell.head.branch_taken)
            }
            _ if include => {
                (Some(Arc::new(Cell { head: cell.head.clone(), tail: rest })), include)
            }
            _ => (rest, include),
        }
    }
}

impl PartialEq for DirectiveStack {
    fn eq(&self, other: &Self) -> bool {
        self.symbols == other.symbols && self.iter().eq(other.iter())
    }
}

impl Eq for DirectiveStack {}

impl GreenNode {
    /// Folds every directive below this node into `stack`, left to right.
    pub fn apply_directives(&self, stack: DirectiveStack) -> DirectiveStack {
        if !self.contains_directives() {
            return stack;
        }
        if self.kind().is_directive_trivia() {
            return stack.add(self);
        }
        self.children().fold(stack, |stack, child| match child {
            NodeOrToken::Node(node) => node.apply_directives(stack),
            NodeOrToken::Token(token) => token.apply_directives(stack),
        })
    }
}

impl GreenToken {
    pub fn apply_directives(&self, stack: DirectiveStack) -> DirectiveStack {
        if !self.flags().contains(NodeFlags::CONTAINS_DIRECTIVES) {
            return stack;
        }
        self.leading_trivia()
            .iter()
            .chain(self.trailing_trivia())
            .fold(stack, |stack, trivia| trivia.apply_directives(stack))
    }
}

impl GreenTrivia {
    pub fn apply_directives(&self, stack: DirectiveStack) -> DirectiveStack {
        match self.structure() {
            Some(node) => node.apply_directives(stack),
            None => stack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::green::GreenTriviaList;

    fn directive(kind: SyntaxKind, keyword: SyntaxKind, name: Option<&str>) -> GreenNode {
        let keyword = if keyword.is_keyword() {
            GreenToken::new(keyword)
        } else {
            GreenToken::contextual_identifier(
                GreenTriviaList::empty(),
                keyword,
                crate::facts::kind_to_text(keyword),
                GreenTriviaList::empty(),
            )
        };
        let name = name.map(|name| {
            GreenToken::identifier(GreenTriviaList::empty(), name, GreenTriviaList::empty()).into()
        });
        let mut slots = vec![Some(GreenToken::new(SyntaxKind::DOLLAR).into()), Some(keyword.into())];
        if matches!(
            kind,
            SyntaxKind::IF_DIRECTIVE_TRIVIA
                | SyntaxKind::ELSEIF_DIRECTIVE_TRIVIA
                | SyntaxKind::DEFINE_DIRECTIVE_TRIVIA
                | SyntaxKind::UNDEF_DIRECTIVE_TRIVIA
        ) {
            slots.push(name);
        }
        slots.push(Some(GreenToken::new(SyntaxKind::END_OF_DIRECTIVE).into()));
        GreenNode::new(kind, slots)
    }

    fn if_(name: &str) -> GreenNode {
        directive(SyntaxKind::IF_DIRECTIVE_TRIVIA, SyntaxKind::IF_KW, Some(name))
    }

    fn elseif(name: &str) -> GreenNode {
        directive(SyntaxKind::ELSEIF_DIRECTIVE_TRIVIA, SyntaxKind::ELSEIF_KW, Some(name))
    }

    fn else_() -> GreenNode {
        directive(SyntaxKind::ELSE_DIRECTIVE_TRIVIA, SyntaxKind::ELSE_KW, None)
    }

    fn end() -> GreenNode {
        directive(SyntaxKind::END_DIRECTIVE_TRIVIA, SyntaxKind::END_KW, None)
    }

    fn define(name: &str) -> GreenNode {
        directive(SyntaxKind::DEFINE_DIRECTIVE_TRIVIA, SyntaxKind::DEFINE_KW, Some(name))
    }

    fn undef(name: &str) -> GreenNode {
        directive(SyntaxKind::UNDEF_DIRECTIVE_TRIVIA, SyntaxKind::UNDEF_KW, Some(name))
    }

    #[test]
    fn add_shares_the_tail() {
        let empty = DirectiveStack::default();
        let one = empty.add(&define("A"));
        let two = one.add(&define("B"));

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(two.len(), 2);
        let shared = two.top.as_ref().and_then(|cell| cell.tail.as_ref()).unwrap();
        assert!(Arc::ptr_eq(shared, one.top.as_ref().unwrap()));
    }

    #[test]
    fn end_pops_back_to_the_size_before_if() {
        let base = DirectiveStack::new(["A".into()]).add(&define("B"));
        let stack = base.add(&if_("A")).add(&else_()).add(&end());
        assert_eq!(stack.len(), base.len());
        assert_eq!(stack, base);
        assert!(stack.is_active());
    }

    #[test]
    fn nested_conditionals_unwind_one_level_at_a_time() {
        let stack = DirectiveStack::new(["OUTER".into()]);
        let outer = stack.add(&if_("OUTER"));
        assert!(outer.is_active());

        let inner = outer.add(&if_("INNER"));
        assert!(!inner.is_active());
        let inner_else = inner.add(&else_());
        assert!(inner_else.is_active());
        assert!(inner_else.has_unfinished_if());

        let closed_inner = inner_else.add(&end());
        assert_eq!(closed_inner.len(), outer.len());
        assert!(closed_inner.is_active());
        assert!(closed_inner.has_unfinished_if());

        let closed_outer = closed_inner.add(&end());
        assert_eq!(closed_outer.len(), stack.len());
        assert!(!closed_outer.has_unfinished_if());
    }

    #[test]
    fn only_one_branch_is_taken() {
        let stack = DirectiveStack::new(["B".into(), "C".into()]);
        let first = stack.add(&if_("A"));
        assert!(!first.top().unwrap().branch_taken());
        assert!(!first.previous_branch_taken());

        let second = first.add(&elseif("B"));
        assert!(second.top().unwrap().branch_taken());
        assert!(second.previous_branch_taken());

        let third = second.add(&elseif("C"));
        assert!(!third.top().unwrap().branch_taken());

        let last = third.add(&else_());
        assert!(!last.is_active());
        assert!(!last.has_previous_if_or_elseif());
    }

    #[test]
    fn inactive_regions_stay_inactive() {
        let stack = DirectiveStack::default().add(&if_("NOPE"));
        let nested = stack.add(&if_("NOPE")).add(&else_());
        assert!(!nested.is_active());
        assert!(!nested.top().unwrap().is_active());
    }

    #[test]
    fn defines_follow_taken_branches() {
        let stack = DirectiveStack::default().add(&define("X"));
        assert!(stack.is_defined("X"));

        let stack = stack.add(&if_("X")).add(&undef("X"));
        assert!(!stack.is_defined("X"));

        let stack = stack.add(&end());
        assert!(!stack.is_defined("X"));

        let skipped = DirectiveStack::default().add(&if_("MISSING")).add(&define("Y")).add(&end());
        assert!(!skipped.is_defined("Y"));
    }

    #[test]
    fn unexpected_end_is_harmless() {
        let stack = DirectiveStack::default().add(&end());
        assert!(stack.is_empty());
        assert!(stack.is_active());
    }

    #[test]
    fn apply_directives_folds_left_to_right() {
        let trivia = |node: GreenNode| GreenTrivia::structured(node);
        let token = GreenToken::with_trivia(
            GreenTriviaList::new([trivia(if_("A")), trivia(else_())]),
            SyntaxKind::NIL_KW,
            GreenTriviaList::empty(),
        );
        let tail = GreenToken::with_trivia(
            GreenTriviaList::new([trivia(end())]),
            SyntaxKind::EOF,
            GreenTriviaList::empty(),
        );
        let plain = GreenNode::new(SyntaxKind::NIL_LITERAL_EXPR, [Some(GreenToken::new(SyntaxKind::NIL_KW).into())]);
        let root = GreenNode::new(
            SyntaxKind::LIST,
            [Some(plain.into()), Some(token.clone().into()), Some(tail.into())],
        );

        assert!(root.contains_directives());
        let after_token = token.apply_directives(DirectiveStack::default());
        assert_eq!(after_token.len(), 2);
        assert!(after_token.is_active());

        let after_root = root.apply_directives(DirectiveStack::default());
        assert!(after_root.is_empty());
    }
}
