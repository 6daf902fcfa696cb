//! In-memory virtual classpath over archive containers.
//!
//! A [`Classpath`] ingests zip-like archives and serves their payloads
//! through a uniform lookup API without touching the filesystem again:
//! - Every payload is stored in one of three tiers chosen by size at
//!   ingestion: raw bytes, gzip with an exact recorded size, or a
//!   re-scan-on-access reference back to the source archive. Tier selection
//!   never changes observable bytes.
//! - Ingesting the same path from several archives keeps the full history as
//!   a chain; direct lookups answer from the most recent entry, and
//!   [`Classpath::enumerate`] addresses every historical entry through
//!   [`ResourceLocator`]s.
//! - [`Resolver`] composes a classpath with an upstream fallback provider
//!   under a fixed self-first or parent-first order.
//!
//! Ingestion (`&mut self`) must finish before lookups begin; a built
//! classpath is immutable and safe for unsynchronized concurrent reads.

mod classpath;
mod entry;
mod error;
mod locator;
mod resolver;

pub use classpath::{ChainEntry, Classpath, TieringPolicy};
pub use entry::{ResourceStream, Tier};
pub use error::{ClasspathError, Result};
pub use locator::{ClasspathId, ResourceLocator};
pub use resolver::{Delegation, Resolver, ResourceProvider};
