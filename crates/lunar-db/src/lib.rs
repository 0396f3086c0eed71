use camino::Utf8PathBuf;
pub use line_index::LineIndex;
pub use lunar_errors::Diagnostic;
use lunar_parse::Parse;
use lunar_yellow::SyntaxOptions;

#[salsa::db]
#[derive(Default, Clone)]
pub struct RootDatabase {
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl salsa::Database for RootDatabase {}

#[salsa::input(debug)]
pub struct File {
    #[returns(ref)]
    pub path: Utf8PathBuf,
    #[returns(deref)]
    pub text: String,
    #[returns(ref)]
    pub options: SyntaxOptions,
}

#[salsa::tracked]
impl File {
    /// The syntax tree of the file. Re-parsed only when the text or the
    /// options change.
    #[salsa::tracked(returns(ref))]
    pub fn parse(self, db: &dyn salsa::Database) -> Parse {
        tracing::debug!(path = %self.path(db), "parsing file");
        lunar_parse::parse(self.text(db), self.options(db))
    }

    #[salsa::tracked(returns(ref))]
    pub fn diagnostics(self, db: &dyn salsa::Database) -> Vec<Diagnostic> {
        let mut diagnostics = self.parse(db).diagnostics();
        diagnostics.sort_by_key(|diagnostic| diagnostic.range().start());
        diagnostics
    }

    #[salsa::tracked(returns(ref), no_eq)]
    pub fn line_index(self, db: &dyn salsa::Database) -> LineIndex {
        LineIndex::new(self.text(db))
    }
}
