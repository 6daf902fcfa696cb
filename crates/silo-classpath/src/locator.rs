use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Process-unique identity of one classpath.
///
/// Two classpaths built from identical archives still get distinct ids, so
/// locators can never be resolved against a classpath that did not issue
/// them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClasspathId(u64);

impl ClasspathId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Classpath-scoped address of one entry in a duplicate chain.
///
/// Ordinal 0 is the chain head (the most recently ingested entry for the
/// path); higher ordinals address older entries. A locator stays valid as
/// long as the issuing classpath is alive and no longer mutated, and is
/// resolved by walking the chain rather than through a stored pointer, so it
/// survives representation changes that keep path and ordinal intact.
///
/// Ids are process-scoped; a persisted locator is only meaningful within the
/// process that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceLocator {
    classpath: ClasspathId,
    path: String,
    ordinal: u32,
}

impl ResourceLocator {
    pub(crate) fn new(classpath: ClasspathId, path: String, ordinal: u32) -> Self {
        Self {
            classpath,
            path,
            ordinal,
        }
    }

    pub fn classpath(&self) -> ClasspathId {
        self.classpath
    }

    /// Normalized path the locator addresses.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }
}
