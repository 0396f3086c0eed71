//! Out-of-band storage for diagnostics and annotations.
//!
//! Entries are keyed by the address of the owning element's shared data and
//! exist only while the owner has the matching `HAS_OWN_*` flag. Owners
//! remove their entries when dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use lunar_errors::Diagnostic;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::NodeFlags;

type Table<T> = DashMap<usize, Arc<[T]>, FxBuildHasher>;

static DIAGNOSTICS: LazyLock<Table<Diagnostic>> =
    LazyLock::new(|| DashMap::with_hasher(FxBuildHasher::default()));
static ANNOTATIONS: LazyLock<Table<SyntaxAnnotation>> =
    LazyLock::new(|| DashMap::with_hasher(FxBuildHasher::default()));

/// Opaque marker attached to green elements by tools.
///
/// Annotations compare by identity: two annotations created separately are
/// never equal, clones are.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyntaxAnnotation {
    id: u64,
    kind: Option<SmolStr>,
    data: Option<SmolStr>,
}

static NEXT_ANNOTATION: AtomicU64 = AtomicU64::new(1);

impl SyntaxAnnotation {
    pub fn new() -> Self {
        Self { id: NEXT_ANNOTATION.fetch_add(1, Ordering::Relaxed), kind: None, data: None }
    }

    pub fn with_kind(kind: impl Into<SmolStr>) -> Self {
        Self { kind: Some(kind.into()), ..Self::new() }
    }

    pub fn with_data(mut self, data: impl Into<SmolStr>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

impl Default for SyntaxAnnotation {
    fn default() -> Self {
        Self::new()
    }
}

/// Diagnostics and annotations an element is about to own.
#[derive(Clone, Default)]
pub(crate) struct SideData {
    pub(crate) diagnostics: Arc<[Diagnostic]>,
    pub(crate) annotations: Arc<[SyntaxAnnotation]>,
}

impl SideData {
    pub(crate) fn own_flags(&self) -> NodeFlags {
        let mut flags = NodeFlags::NONE;
        if !self.diagnostics.is_empty() {
            flags |= NodeFlags::HAS_OWN_DIAGNOSTICS;
        }
        if !self.annotations.is_empty() {
            flags |= NodeFlags::HAS_OWN_ANNOTATIONS;
        }
        flags
    }

    /// Records the data for a freshly allocated element at `key`.
    pub(crate) fn store(self, key: usize) {
        if !self.diagnostics.is_empty() {
            DIAGNOSTICS.insert(key, self.diagnostics);
        }
        if !self.annotations.is_empty() {
            ANNOTATIONS.insert(key, self.annotations);
        }
    }
}

pub(crate) fn side_data(key: usize, flags: NodeFlags) -> SideData {
    SideData { diagnostics: diagnostics(key, flags), annotations: annotations(key, flags) }
}

pub(crate) fn diagnostics(key: usize, flags: NodeFlags) -> Arc<[Diagnostic]> {
    if !flags.contains(NodeFlags::HAS_OWN_DIAGNOSTICS) {
        return Arc::default();
    }
    DIAGNOSTICS.get(&key).map(|entry| Arc::clone(entry.value())).unwrap_or_default()
}

pub(crate) fn annotations(key: usize, flags: NodeFlags) -> Arc<[SyntaxAnnotation]> {
    if !flags.contains(NodeFlags::HAS_OWN_ANNOTATIONS) {
        return Arc::default();
    }
    ANNOTATIONS.get(&key).map(|entry| Arc::clone(entry.value())).unwrap_or_default()
}

/// Drops whatever `key` owns. Called from the owner's destructor.
pub(crate) fn release(key: usize, flags: NodeFlags) {
    if flags.contains(NodeFlags::HAS_OWN_DIAGNOSTICS) {
        DIAGNOSTICS.remove(&key);
    }
    if flags.contains(NodeFlags::HAS_OWN_ANNOTATIONS) {
        ANNOTATIONS.remove(&key);
    }
}

#[cfg(test)]
pub(crate) fn has_diagnostics_entry(key: usize) -> bool {
    DIAGNOSTICS.contains_key(&key)
}
