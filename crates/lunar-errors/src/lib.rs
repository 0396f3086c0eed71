//! Diagnostic records produced while lexing and parsing.
//!
//! A diagnostic never carries an absolute position. It is stored next to the
//! syntax element it describes and its `offset` is relative to the start of
//! that element's full span (leading trivia included).

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
pub use text_size::{TextRange, TextSize};

/// How bad a diagnostic is. Ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Hidden,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hidden => "hidden",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Stable identifier of a diagnostic.
///
/// Message templates use `{0}`, `{1}`, ... for positional arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    BadCharacter,
    UnterminatedString,
    UnterminatedLongString,
    UnterminatedLongComment,
    InvalidNumber,
    InvalidEscape,
    FeatureNotAvailable,
    ExpectedToken,
    ExpectedExpression,
    InvalidStatement,
    UnexpectedToken,
    BadDirective,
    UnexpectedDirective,
    EndDirectiveExpected,
    InvalidAttribute,
}

impl DiagnosticCode {
    const ALL: [Self; 15] = [
        Self::BadCharacter,
        Self::UnterminatedString,
        Self::UnterminatedLongString,
        Self::UnterminatedLongComment,
        Self::InvalidNumber,
        Self::InvalidEscape,
        Self::FeatureNotAvailable,
        Self::ExpectedToken,
        Self::ExpectedExpression,
        Self::InvalidStatement,
        Self::UnexpectedToken,
        Self::BadDirective,
        Self::UnexpectedDirective,
        Self::EndDirectiveExpected,
        Self::InvalidAttribute,
    ];

    /// Returns the `LUAxxxx` identifier.
    pub fn id(self) -> String {
        let index = Self::ALL.iter().position(|&code| code == self).unwrap_or_default();
        format!("LUA{:04}", index + 1)
    }

    pub fn default_severity(self) -> Severity {
        match self {
            Self::InvalidEscape => Severity::Warning,
            _ => Severity::Error,
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::BadCharacter => "unexpected character `{0}`",
            Self::UnterminatedString => "unfinished string",
            Self::UnterminatedLongString => "unfinished long string",
            Self::UnterminatedLongComment => "unfinished long comment",
            Self::InvalidNumber => "malformed number `{0}`",
            Self::InvalidEscape => "invalid escape sequence `{0}`",
            Self::FeatureNotAvailable => "{0} is not available in {1}",
            Self::ExpectedToken => "expected `{0}`",
            Self::ExpectedExpression => "expected an expression",
            Self::InvalidStatement => "only function calls can be used as statements",
            Self::UnexpectedToken => "unexpected `{0}`",
            Self::BadDirective => "malformed directive",
            Self::UnexpectedDirective => "`${0}` without a matching `$if`",
            Self::EndDirectiveExpected => "`$end` expected",
            Self::InvalidAttribute => "unknown attribute `{0}`",
        }
    }
}

/// A structured error or warning record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    code: DiagnosticCode,
    severity: Severity,
    offset: TextSize,
    width: TextSize,
    args: Box<[SmolStr]>,
}

impl Diagnostic {
    /// Creates a diagnostic with the code's default severity.
    pub fn new(code: DiagnosticCode, offset: TextSize, width: TextSize) -> Self {
        Self { code, severity: code.default_severity(), offset, width, args: Box::default() }
    }

    /// Shorthand for a zero-offset diagnostic spanning `width`.
    pub fn at_start(code: DiagnosticCode, width: TextSize) -> Self {
        Self::new(code, TextSize::new(0), width)
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn code(&self) -> DiagnosticCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn offset(&self) -> TextSize {
        self.offset
    }

    pub fn width(&self) -> TextSize {
        self.width
    }

    pub fn args(&self) -> &[SmolStr] {
        &self.args
    }

    /// Range relative to the start of the owning element.
    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, self.width)
    }

    /// Range once the owning element is known to start at `base`.
    pub fn range_at(&self, base: TextSize) -> TextRange {
        TextRange::at(base + self.offset, self.width)
    }

    /// Returns a copy whose offset is moved forward by `delta`.
    pub fn shifted(&self, delta: TextSize) -> Self {
        Self { offset: self.offset + delta, ..self.clone() }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Renders the message template with the positional arguments.
    pub fn message(&self) -> String {
        let mut message = self.code.template().to_owned();
        for (index, arg) in self.args.iter().enumerate() {
            message = message.replace(&format!("{{{index}}}"), arg);
        }
        message
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.severity, self.code.id(), self.message())
    }
}

/// Adds `candidate` to `diagnostics`, keeping only the worst diagnostic per location.
///
/// A candidate that shares offset and width with an existing entry replaces it
/// only when it is strictly more severe.
pub fn merge_worst(diagnostics: &mut Vec<Diagnostic>, candidate: Diagnostic) {
    match diagnostics
        .iter_mut()
        .find(|existing| existing.offset == candidate.offset && existing.width == candidate.width)
    {
        Some(existing) => {
            if candidate.severity > existing.severity {
                *existing = candidate;
            }
        }
        None => diagnostics.push(candidate),
    }
}

/// Returns the highest severity among `diagnostics`.
pub fn worst_severity<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) -> Option<Severity> {
    diagnostics.into_iter().map(Diagnostic::severity).max()
}
