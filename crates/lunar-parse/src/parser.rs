use drop_bomb::DropBomb;
use lunar_errors::{Diagnostic, DiagnosticCode};
use lunar_tokenizer::Tokenizer;
use lunar_yellow::facts::{self, Feature};
use lunar_yellow::{
    GreenElement, GreenNode, GreenNodeCache, GreenToken, GreenTrivia, LuaVersion, SyntaxKind, SyntaxSet,
};
use text_size::TextSize;

pub(crate) struct Parser<'t> {
    tokenizer: Tokenizer<'t>,
    events: Vec<Event>,
    /// Tokens dropped during recovery, waiting to become leading trivia of
    /// the next token that makes it into the tree.
    skipped: Vec<GreenToken>,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(tokenizer: Tokenizer<'t>) -> Self {
        Self { tokenizer, events: Vec::new(), skipped: Vec::new() }
    }

    pub(crate) fn peek_kind(&self) -> SyntaxKind {
        self.tokenizer.peek().kind()
    }

    pub(crate) fn peek_text(&self) -> &str {
        self.tokenizer.peek().text()
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn at_any(&self, kinds: SyntaxSet) -> bool {
        kinds.contains(self.peek_kind())
    }

    pub(crate) fn version(&self) -> LuaVersion {
        self.tokenizer.version()
    }

    pub(crate) fn advance(&mut self) {
        let token = self.take_token();
        self.events.push(Event::Token(token));
    }

    /// Advances an identifier, giving it the contextual keyword `kind`.
    pub(crate) fn advance_contextual(&mut self, kind: SyntaxKind) {
        let token = self.take_token();
        let contextual = GreenToken::contextual_identifier(
            token.leading_trivia().clone(),
            kind,
            token.text(),
            token.trailing_trivia().clone(),
        );
        let diagnostics = token.diagnostics();
        let contextual = if diagnostics.is_empty() { contextual } else { contextual.with_diagnostics(diagnostics) };
        self.events.push(Event::Token(contextual));
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if !self.at(kind) {
            return false;
        }
        self.advance();
        true
    }

    /// Eats `kind` or inserts it as a missing token.
    pub(crate) fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.missing(kind, DiagnosticCode::ExpectedToken, &[describe(kind)]);
        false
    }

    /// Eats `kind` or leaves its slot empty.
    pub(crate) fn optional(&mut self, kind: SyntaxKind) {
        if !self.eat(kind) {
            self.absent();
        }
    }

    pub(crate) fn absent(&mut self) {
        self.events.push(Event::Absent);
    }

    pub(crate) fn missing(&mut self, kind: SyntaxKind, code: DiagnosticCode, args: &[&str]) {
        tracing::trace!(?kind, found = ?self.peek_kind(), "inserting missing token");
        let diagnostic = Diagnostic::at_start(code, TextSize::new(0)).with_args(args.iter().copied());
        self.events.push(Event::Token(GreenToken::missing(kind).with_diagnostics(vec![diagnostic])));
    }

    /// Drops the lookahead token. It resurfaces as skipped-tokens trivia in
    /// front of the next token added to the tree.
    pub(crate) fn skip(&mut self) {
        debug_assert!(!self.at(SyntaxKind::EOF), "end of file cannot be skipped");
        let token = self.tokenizer.next_token().green;
        tracing::trace!(kind = ?token.kind(), "skipping token");
        if token.kind() == SyntaxKind::BAD_TOKEN {
            self.skipped.push(token);
            return;
        }

        let unexpected =
            Diagnostic::new(DiagnosticCode::UnexpectedToken, token.leading_trivia().width(), token.text_width())
                .with_args([token.text()]);
        let mut diagnostics = token.diagnostics().to_vec();
        diagnostics.push(unexpected);
        self.skipped.push(token.with_diagnostics(diagnostics));
    }

    /// Reports an error spanning the node currently being built.
    pub(crate) fn error(&mut self, code: DiagnosticCode, args: &[&str]) {
        let args = args.iter().map(|&arg| arg.to_owned()).collect();
        self.events.push(Event::Error { code, args });
    }

    /// Reports the node currently being built if `feature` is missing from
    /// the dialect.
    pub(crate) fn require(&mut self, feature: Feature) {
        let version = self.version();
        if !facts::is_feature_available(feature, version) {
            self.error(DiagnosticCode::FeatureNotAvailable, &[feature.description(), version.name()]);
        }
    }

    pub(crate) fn start(&mut self) -> Marker {
        let pos = self.events.len() as u32;
        self.events.push(Event::TOMBSTONE);
        Marker::new(pos)
    }

    fn take_token(&mut self) -> GreenToken {
        let token = self.tokenizer.next_token().green;
        if self.skipped.is_empty() { token } else { self.attach_skipped(token) }
    }

    fn attach_skipped(&mut self, token: GreenToken) -> GreenToken {
        let skipped = std::mem::take(&mut self.skipped);
        tracing::trace!(count = skipped.len(), "attaching skipped tokens");
        let cache = self.tokenizer.cache_mut();

        let slots = skipped.into_iter().map(|token| Some(token.into())).collect();
        let structure = GreenTrivia::structured(cache.node(SyntaxKind::SKIPPED_TOKENS_TRIVIA, slots));
        let shift = structure.width();
        let pieces = std::iter::once(structure).chain(token.leading_trivia().iter().cloned()).collect();
        let leading = cache.trivia_list(pieces);

        let diagnostics = token.diagnostics();
        let token = token.with_leading_trivia(leading);
        if diagnostics.is_empty() {
            return token;
        }
        let shifted: Vec<Diagnostic> = diagnostics.iter().map(|diagnostic| diagnostic.shifted(shift)).collect();
        token.with_diagnostics(shifted)
    }

    pub(crate) fn build_tree(self) -> GreenNode {
        let Self { mut tokenizer, mut events, .. } = self;
        let mut builder = Builder::new(tokenizer.cache_mut());
        let mut forward_parents = Vec::new();

        for i in 0..events.len() {
            match std::mem::replace(&mut events[i], Event::TOMBSTONE) {
                Event::Start { kind, forward_parent } => {
                    if kind == SyntaxKind::NONE {
                        continue;
                    }

                    forward_parents.push(kind);
                    let mut idx = i;
                    let mut fp = forward_parent;
                    while let Some(fwd) = fp {
                        idx += fwd as usize;

                        fp = match std::mem::replace(&mut events[idx], Event::TOMBSTONE) {
                            Event::Start { kind, forward_parent } => {
                                if kind != SyntaxKind::NONE {
                                    forward_parents.push(kind);
                                }
                                forward_parent
                            }
                            _ => unreachable!(),
                        };
                    }

                    for kind in forward_parents.drain(..).rev() {
                        builder.start_node(kind);
                    }
                }
                Event::Token(token) => builder.push(Some(token.into())),
                Event::Absent => builder.push(None),
                Event::Error { code, args } => builder.error(code, args),
                Event::Finish => builder.finish_node(),
            }
        }

        builder.finish()
    }
}

/// How a kind is spelled in "expected" diagnostics.
fn describe(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::IDENTIFIER => "<name>",
        SyntaxKind::EOF => "<eof>",
        _ if kind.is_well_known() && !kind.is_structureless_token() => facts::kind_to_text(kind),
        _ => "<token>",
    }
}

enum Event {
    Start { kind: SyntaxKind, forward_parent: Option<u32> },
    Token(GreenToken),
    /// An optional slot left empty.
    Absent,
    Error { code: DiagnosticCode, args: Vec<String> },
    Finish,
}

impl Event {
    const TOMBSTONE: Self = Self::Start { kind: SyntaxKind::NONE, forward_parent: None };
}

pub(crate) struct Marker {
    position: u32,
    bomb: DropBomb,
}

impl Marker {
    fn new(pos: u32) -> Self {
        Self { position: pos, bomb: DropBomb::new("Marker must be completed") }
    }

    pub(crate) fn complete(mut self, p: &mut Parser<'_>, kind: SyntaxKind) -> CompletedMarker {
        self.bomb.defuse();

        match &mut p.events[self.position as usize] {
            Event::Start { kind: slot, .. } => {
                *slot = kind;
            }
            _ => unreachable!(),
        }

        p.events.push(Event::Finish);
        CompletedMarker::new(self.position, kind)
    }
}

pub(crate) struct CompletedMarker {
    pos: u32,
    kind: SyntaxKind,
}

impl CompletedMarker {
    fn new(pos: u32, kind: SyntaxKind) -> Self {
        Self { pos, kind }
    }

    pub(crate) fn kind(&self) -> SyntaxKind {
        self.kind
    }

    /// Starts a node that will wrap this one.
    pub(crate) fn precede(self, p: &mut Parser<'_>) -> Marker {
        let new_pos = p.start();

        match &mut p.events[self.pos as usize] {
            Event::Start { forward_parent, .. } => {
                *forward_parent = Some(new_pos.position - self.pos);
            }
            _ => unreachable!(),
        }

        new_pos
    }
}

struct Frame {
    kind: SyntaxKind,
    slots: Vec<Option<GreenElement>>,
    errors: Vec<(DiagnosticCode, Vec<String>)>,
}

struct Builder<'c> {
    cache: &'c mut GreenNodeCache,
    stack: Vec<Frame>,
    root: Option<GreenNode>,
}

impl<'c> Builder<'c> {
    fn new(cache: &'c mut GreenNodeCache) -> Self {
        Self { cache, stack: Vec::new(), root: None }
    }

    fn start_node(&mut self, kind: SyntaxKind) {
        self.stack.push(Frame { kind, slots: Vec::new(), errors: Vec::new() });
    }

    fn push(&mut self, element: Option<GreenElement>) {
        match self.stack.last_mut() {
            Some(frame) => frame.slots.push(element),
            None => unreachable!("token outside of any node"),
        }
    }

    fn error(&mut self, code: DiagnosticCode, args: Vec<String>) {
        match self.stack.last_mut() {
            Some(frame) => frame.errors.push((code, args)),
            None => unreachable!("error outside of any node"),
        }
    }

    fn finish_node(&mut self) {
        let Some(Frame { kind, slots, errors }) = self.stack.pop() else {
            unreachable!("unbalanced finish event");
        };

        // Empty lists leave their slot empty.
        let node = if kind == SyntaxKind::LIST && slots.is_empty() {
            None
        } else {
            Some(self.cache.node(kind, slots))
        };
        let node = match node {
            Some(node) if !errors.is_empty() => Some(with_errors(node, errors)),
            node => node,
        };

        match self.stack.last_mut() {
            Some(parent) => parent.slots.push(node.map(Into::into)),
            None => self.root = node,
        }
    }

    fn finish(self) -> GreenNode {
        match self.root {
            Some(root) => root,
            None => unreachable!("no root node was built"),
        }
    }
}

/// Attaches errors covering `node` without its outer trivia.
fn with_errors(node: GreenNode, errors: Vec<(DiagnosticCode, Vec<String>)>) -> GreenNode {
    let start = node.leading_trivia_width();
    let end = (node.width() - node.trailing_trivia_width()).max(start);
    let diagnostics: Vec<Diagnostic> = errors
        .into_iter()
        .map(|(code, args)| Diagnostic::new(code, start, end - start).with_args(args))
        .collect();
    node.with_diagnostics(diagnostics)
}
