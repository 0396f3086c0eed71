//! Dialect versions and the options that select one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::facts::{self, Feature};

/// A supported dialect.
///
/// The historical versions form a chain where each one extends the previous.
/// [`LuaVersion::GLua`] branches off 5.1 and is not ordered against the
/// later historical versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LuaVersion {
    Lua51,
    Lua52,
    Lua53,
    Lua54,
    GLua,
}

impl LuaVersion {
    pub const ALL: [Self; 5] = [Self::Lua51, Self::Lua52, Self::Lua53, Self::Lua54, Self::GLua];

    /// The historical chain, oldest first.
    pub const HISTORICAL: [Self; 4] = [Self::Lua51, Self::Lua52, Self::Lua53, Self::Lua54];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human readable name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lua51 => "Lua 5.1",
            Self::Lua52 => "Lua 5.2",
            Self::Lua53 => "Lua 5.3",
            Self::Lua54 => "Lua 5.4",
            Self::GLua => "GLua",
        }
    }

    /// The version this dialect was derived from, if any.
    pub const fn base(self) -> Option<Self> {
        match self {
            Self::Lua51 => None,
            Self::Lua52 => Some(Self::Lua51),
            Self::Lua53 => Some(Self::Lua52),
            Self::Lua54 => Some(Self::Lua53),
            Self::GLua => Some(Self::Lua51),
        }
    }
}

impl fmt::Display for LuaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown Lua version `{0}`")]
pub struct UnknownVersion(pub String);

impl FromStr for LuaVersion {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let normalized = normalized.strip_prefix("lua").unwrap_or(&normalized).trim();
        Ok(match normalized {
            "5.1" | "51" => Self::Lua51,
            "5.2" | "52" => Self::Lua52,
            "5.3" | "53" => Self::Lua53,
            "5.4" | "54" => Self::Lua54,
            "glua" | "gmod" => Self::GLua,
            _ => return Err(UnknownVersion(s.to_owned())),
        })
    }
}

/// A set of dialect versions, buildable in `const` context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct VersionSet(u8);

impl VersionSet {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b1_1111);

    pub const fn only(version: LuaVersion) -> Self {
        Self(1 << version.index())
    }

    /// `version` and every later historical version. Never includes GLua.
    pub const fn since(version: LuaVersion) -> Self {
        let mut bits = 0;
        let mut i = 0;
        let mut found = false;
        while i < LuaVersion::HISTORICAL.len() {
            let candidate = LuaVersion::HISTORICAL[i];
            if candidate.index() == version.index() {
                found = true;
            }
            if found {
                bits |= 1 << candidate.index();
            }
            i += 1;
        }
        Self(bits)
    }

    pub const fn with(self, version: LuaVersion) -> Self {
        Self(self.0 | Self::only(version).0)
    }

    pub const fn without(self, version: LuaVersion) -> Self {
        Self(self.0 & !Self::only(version).0)
    }

    #[inline]
    pub const fn contains(self, version: LuaVersion) -> bool {
        self.0 & Self::only(version).0 != 0
    }

    pub fn iter(self) -> impl Iterator<Item = LuaVersion> {
        LuaVersion::ALL.into_iter().filter(move |&version| self.contains(version))
    }
}

/// Parser configuration.
///
/// The switches left as `None` follow the chosen version's defaults.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SyntaxOptions {
    pub version: LuaVersion,
    pub directives: Option<bool>,
    pub c_comments: Option<bool>,
    pub shebang: Option<bool>,
    /// Symbols treated as defined by `$if` before any `$define`.
    pub defined_symbols: Vec<SmolStr>,
}

impl Default for SyntaxOptions {
    fn default() -> Self {
        Self::for_version(LuaVersion::Lua54)
    }
}

impl SyntaxOptions {
    pub const fn for_version(version: LuaVersion) -> Self {
        Self {
            version,
            directives: None,
            c_comments: None,
            shebang: None,
            defined_symbols: Vec::new(),
        }
    }

    pub const fn lua51() -> Self {
        Self::for_version(LuaVersion::Lua51)
    }

    pub const fn lua52() -> Self {
        Self::for_version(LuaVersion::Lua52)
    }

    pub const fn lua53() -> Self {
        Self::for_version(LuaVersion::Lua53)
    }

    pub const fn lua54() -> Self {
        Self::for_version(LuaVersion::Lua54)
    }

    pub const fn glua() -> Self {
        Self::for_version(LuaVersion::GLua)
    }

    pub fn with_defined_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.defined_symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    pub fn accepts_directives(&self) -> bool {
        self.directives.unwrap_or_else(|| facts::is_feature_available(Feature::Directives, self.version))
    }

    pub fn accepts_c_comments(&self) -> bool {
        self.c_comments.unwrap_or_else(|| facts::is_feature_available(Feature::CComments, self.version))
    }

    pub fn accepts_shebang(&self) -> bool {
        self.shebang.unwrap_or(true)
    }
}
