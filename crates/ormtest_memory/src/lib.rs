//! # ormtest Memory
//!
//! A reference in-memory [`Session`](ormtest_core::Session) implementation.
//!
//! [`MemorySession`] stores committed rows in ordered maps, buffers pending
//! work, and supports savepoints that capture and restore committed state.
//! It exists so the helpers in `ormtest_kit` can be exercised without a real
//! persistence backend, and doubles as a backend for tests of code written
//! against the `Session` trait.
//!
//! # Example
//!
//! ```rust
//! use ormtest_core::{EntityRecord, EntityType, Session};
//! use ormtest_memory::MemorySession;
//!
//! let session = MemorySession::new();
//! let users = EntityType::new("users");
//! session.add(EntityRecord::transient(users.clone(), vec![1, 2, 3])).unwrap();
//! let refs = session.commit().unwrap();
//! assert_eq!(refs.len(), 1);
//! assert!(session.get(&users, &refs[0].key).unwrap().is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod session;
mod state;

pub use config::MemoryConfig;
pub use session::MemorySession;
