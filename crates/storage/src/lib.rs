//! Durable key-value storage for Taleshelf
//!
//! Implementations of the core `KeyValueStore` seam and typed access to the
//! listener preferences kept in it.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use taleshelf_core::{KeyValueStore, PlayerDisplayMode};
//! use taleshelf_storage::{MemoryStore, Preferences};
//!
//! let store = Arc::new(MemoryStore::new());
//! let prefs = Preferences::new(store.clone());
//! prefs.set_display_mode(PlayerDisplayMode::Mini).unwrap();
//! assert_eq!(store.get("playerMode").as_deref(), Some("mini"));
//! ```

mod error;
mod file;
pub mod keys;
mod memory;
mod preferences;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use preferences::Preferences;
