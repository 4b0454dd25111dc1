//! # ormtest Kit
//!
//! Test helpers for code written against a session-based persistence layer.
//!
//! This crate provides three independent, composable helpers, all generic
//! over [`Session`](ormtest_core::Session):
//! - [`ScopedRollback`]: roll a session back to a savepoint when the scope
//!   ends, restoring prior persisted state on every exit path
//! - [`FixtureSet`]: named fixture producers, created in declaration order
//!   with a single trailing commit
//! - [`ChangeTracker`]: record which identities were created, updated, or
//!   deleted during a tracked block
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ormtest_kit::prelude::*;
//!
//! #[test]
//! fn nothing_leaks_out_of_the_scope() {
//!     let session = open_session();
//!     let guard = ScopedRollback::new(&session)?;
//!     session.add_entity(&User { name: "john".into() })?;
//!     session.commit()?;
//!     guard.rollback()?;
//!     // the session is back to its pre-scope state here
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod rollback;
pub mod tracker;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::fixtures::FixtureSet;
    pub use crate::rollback::{with_rollback, ScopedRollback};
    pub use crate::tracker::{track, ChangeSet, ChangeTracker};
    pub use ormtest_core::{Entity, EntityKey, EntityRef, EntityType, Session};
}

pub use fixtures::FixtureSet;
pub use rollback::{with_rollback, ScopedRollback};
pub use tracker::{track, ChangeSet, ChangeTracker};
