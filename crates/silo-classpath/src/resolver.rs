use serde::{Deserialize, Serialize};

use crate::classpath::Classpath;
use crate::entry::ResourceStream;
use crate::error::{ClasspathError, Result};
use crate::locator::ResourceLocator;

/// Lookup side of a classpath or an upstream fallback.
///
/// A miss is `Ok(None)`/`None`; errors mean the lookup itself failed and are
/// never used to signal absence.
pub trait ResourceProvider {
    /// Full payload bytes for a name.
    fn find_bytes(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Locator for the most recent entry behind a name.
    fn find_locator(&self, name: &str) -> Option<ResourceLocator>;

    /// Payload stream for a name.
    fn find_stream(&self, name: &str) -> Result<Option<ResourceStream<'_>>>;
}

impl<T: ResourceProvider + ?Sized> ResourceProvider for &T {
    fn find_bytes(&self, name: &str) -> Result<Option<Vec<u8>>> {
        (**self).find_bytes(name)
    }

    fn find_locator(&self, name: &str) -> Option<ResourceLocator> {
        (**self).find_locator(name)
    }

    fn find_stream(&self, name: &str) -> Result<Option<ResourceStream<'_>>> {
        (**self).find_stream(name)
    }
}

impl ResourceProvider for Classpath {
    fn find_bytes(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.bytes(name) {
            Ok(bytes) => Ok(Some(bytes.into_owned())),
            Err(ClasspathError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn find_locator(&self, name: &str) -> Option<ResourceLocator> {
        self.locator(name)
    }

    fn find_stream(&self, name: &str) -> Result<Option<ResourceStream<'_>>> {
        match self.stream(name) {
            Ok(stream) => Ok(Some(stream)),
            Err(ClasspathError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Fixed lookup order applied by a [`Resolver`] to all of its operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delegation {
    SelfFirst,
    ParentFirst,
}

/// Two-tier lookup: a local provider composed with an upstream fallback.
///
/// The first provider in the configured order is always consulted; the
/// second only on a miss. An error from the first provider propagates
/// without consulting the second; only a genuine miss falls through.
/// Resolvers implement [`ResourceProvider`] themselves, so the parent can be
/// another resolver.
pub struct Resolver<S, P> {
    order: Delegation,
    local: S,
    parent: P,
}

impl<S: ResourceProvider, P: ResourceProvider> Resolver<S, P> {
    pub fn new(order: Delegation, local: S, parent: P) -> Self {
        Self {
            order,
            local,
            parent,
        }
    }

    pub fn order(&self) -> Delegation {
        self.order
    }

    /// Like [`ResourceProvider::find_bytes`], but a miss from both providers
    /// is [`ClasspathError::NotFound`].
    pub fn bytes(&self, name: &str) -> Result<Vec<u8>> {
        self.find_bytes(name)?
            .ok_or_else(|| ClasspathError::NotFound {
                path: name.to_owned(),
            })
    }

    /// Like [`ResourceProvider::find_stream`], but a miss from both
    /// providers is [`ClasspathError::NotFound`].
    pub fn stream(&self, name: &str) -> Result<ResourceStream<'_>> {
        self.find_stream(name)?
            .ok_or_else(|| ClasspathError::NotFound {
                path: name.to_owned(),
            })
    }

    fn ordered(&self) -> [&dyn ResourceProvider; 2] {
        match self.order {
            Delegation::SelfFirst => [&self.local, &self.parent],
            Delegation::ParentFirst => [&self.parent, &self.local],
        }
    }
}

impl<S: ResourceProvider, P: ResourceProvider> ResourceProvider for Resolver<S, P> {
    fn find_bytes(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let [first, second] = self.ordered();
        if let Some(found) = first.find_bytes(name)? {
            return Ok(Some(found));
        }
        second.find_bytes(name)
    }

    fn find_locator(&self, name: &str) -> Option<ResourceLocator> {
        let [first, second] = self.ordered();
        first
            .find_locator(name)
            .or_else(|| second.find_locator(name))
    }

    fn find_stream(&self, name: &str) -> Result<Option<ResourceStream<'_>>> {
        let [first, second] = self.ordered();
        if let Some(found) = first.find_stream(name)? {
            return Ok(Some(found));
        }
        second.find_stream(name)
    }
}
