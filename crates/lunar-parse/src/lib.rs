//! Recursive-descent parser for every supported Lua dialect.
//!
//! Parsing never fails: missing tokens are inserted with a diagnostic and
//! tokens that fit nowhere become skipped-tokens trivia, so the tree always
//! reproduces the source text exactly.

use lunar_errors::Diagnostic;
use lunar_tokenizer::Tokenizer;
use lunar_yellow::ast::{self, AstNode as _};
use lunar_yellow::{GreenNode, GreenNodeCache, SyntaxNode, SyntaxOptions, walk};

mod grammar;
mod parser;

/// Result of parsing one source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parse {
    green: GreenNode,
}

impl Parse {
    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn tree(&self) -> ast::CompilationUnit {
        match ast::CompilationUnit::cast(self.syntax()) {
            Some(unit) => unit,
            None => unreachable!("the root is always a compilation unit"),
        }
    }

    /// Every diagnostic in the tree, offsets relative to the start of the text.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        walk::diagnostics(&self.green).collect()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics().iter().any(Diagnostic::is_error)
    }
}

pub fn parse(text: &str, options: &SyntaxOptions) -> Parse {
    let mut cache = GreenNodeCache::new();
    parse_with_cache(text, options, &mut cache)
}

/// Parses `text`, sharing structurally equal nodes and tokens through
/// `cache`. Reusing a cache across edits of the same file keeps unchanged
/// subtrees pointer-equal.
pub fn parse_with_cache(text: &str, options: &SyntaxOptions, cache: &mut GreenNodeCache) -> Parse {
    let mut parser = parser::Parser::new(Tokenizer::new(text, options, cache));
    grammar::compilation_unit(&mut parser);
    let green = parser.build_tree();
    tracing::debug!(version = %options.version.name(), width = ?green.width(), "parsed");
    Parse { green }
}
