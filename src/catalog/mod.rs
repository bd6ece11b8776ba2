//! Action catalog indexer.
//!
//! Turns the engine's legal priority choices into a deterministic, 0-based
//! list of actions that external actors select by index.

pub mod entry;
pub mod index;

pub use entry::{ActionKind, CatalogEntry};
pub use index::ActionCatalog;
