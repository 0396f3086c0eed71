use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Summary bits frozen into every green element at construction.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NodeFlags(u16);

impl NodeFlags {
    pub const NONE: Self = Self(0);
    pub const IS_MISSING: Self = Self(1 << 0);
    pub const CONTAINS_DIAGNOSTICS: Self = Self(1 << 1);
    pub const CONTAINS_ANNOTATIONS: Self = Self(1 << 2);
    pub const CONTAINS_DIRECTIVES: Self = Self(1 << 3);
    pub const CONTAINS_SKIPPED_TEXT: Self = Self(1 << 4);
    pub const IS_STRUCTURED_TRIVIA: Self = Self(1 << 5);
    pub const HAS_OWN_DIAGNOSTICS: Self = Self(1 << 6);
    pub const HAS_OWN_ANNOTATIONS: Self = Self(1 << 7);
    pub const IS_ELASTIC: Self = Self(1 << 8);

    /// Bits a parent takes over from its children.
    pub const INHERITED: Self = Self(
        Self::CONTAINS_DIAGNOSTICS.0
            | Self::CONTAINS_ANNOTATIONS.0
            | Self::CONTAINS_DIRECTIVES.0
            | Self::CONTAINS_SKIPPED_TEXT.0,
    );

    /// Bits describing what the element itself owns in the side tables.
    pub const OWN: Self = Self(Self::HAS_OWN_DIAGNOSTICS.0 | Self::HAS_OWN_ANNOTATIONS.0);

    const NAMES: [(Self, &'static str); 9] = [
        (Self::IS_MISSING, "IS_MISSING"),
        (Self::CONTAINS_DIAGNOSTICS, "CONTAINS_DIAGNOSTICS"),
        (Self::CONTAINS_ANNOTATIONS, "CONTAINS_ANNOTATIONS"),
        (Self::CONTAINS_DIRECTIVES, "CONTAINS_DIRECTIVES"),
        (Self::CONTAINS_SKIPPED_TEXT, "CONTAINS_SKIPPED_TEXT"),
        (Self::IS_STRUCTURED_TRIVIA, "IS_STRUCTURED_TRIVIA"),
        (Self::HAS_OWN_DIAGNOSTICS, "HAS_OWN_DIAGNOSTICS"),
        (Self::HAS_OWN_ANNOTATIONS, "HAS_OWN_ANNOTATIONS"),
        (Self::IS_ELASTIC, "IS_ELASTIC"),
    ];

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Rebuilds flags from raw bits, rejecting unknown ones.
    pub const fn from_bits(bits: u16) -> Option<Self> {
        if bits >> Self::NAMES.len() == 0 { Some(Self(bits)) } else { None }
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[inline]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    #[inline]
    pub const fn inherited(self) -> Self {
        Self(self.0 & Self::INHERITED.0)
    }

    /// Combines an element's intrinsic bits, the flags of its children and
    /// what it owns in the side tables.
    pub(crate) const fn compose(intrinsic: Self, children: Self, own: Self) -> Self {
        let mut flags = intrinsic.union(children.inherited()).union(Self(own.0 & Self::OWN.0));
        if own.contains(Self::HAS_OWN_DIAGNOSTICS) {
            flags = flags.union(Self::CONTAINS_DIAGNOSTICS);
        }
        if own.contains(Self::HAS_OWN_ANNOTATIONS) {
            flags = flags.union(Self::CONTAINS_ANNOTATIONS);
        }
        flags
    }
}

impl BitOr for NodeFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for NodeFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl fmt::Debug for NodeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}
