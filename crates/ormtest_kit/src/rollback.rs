//! Scoped rollback of a session to a savepoint.

use ormtest_core::{Savepoint, Session, SessionResult};
use tracing::{debug, error};

/// Rolls a session back to a savepoint when the scope ends.
///
/// On construction, opens a savepoint on the session. Everything done through
/// the session afterwards, including commits, is undone when the guard exits.
/// Prefer the explicit [`rollback`](Self::rollback) so rollback failures
/// reach the caller; if the guard is dropped instead (early return, panic),
/// the rollback still runs, and a failure on that path is logged at error
/// level because `Drop` cannot report it.
///
/// Guards nest: each holds its own savepoint, and inner guards must exit
/// before outer ones.
///
/// # Example
///
/// ```rust
/// use ormtest_core::{EntityRecord, EntityType, Session};
/// use ormtest_kit::ScopedRollback;
/// use ormtest_memory::MemorySession;
///
/// let session = MemorySession::new();
/// let users = EntityType::new("users");
///
/// let guard = ScopedRollback::new(&session).unwrap();
/// session.add(EntityRecord::transient(users.clone(), vec![1])).unwrap();
/// session.commit().unwrap();
/// guard.rollback().unwrap();
///
/// assert!(session.snapshot(&users).unwrap().is_empty());
/// ```
#[must_use = "dropping the guard immediately rolls the scope back"]
pub struct ScopedRollback<'a, S: Session> {
    session: &'a S,
    savepoint: Savepoint,
    armed: bool,
}

impl<'a, S: Session> ScopedRollback<'a, S> {
    /// Opens a savepoint and arms the guard.
    pub fn new(session: &'a S) -> SessionResult<Self> {
        let savepoint = session.begin()?;
        debug!(%savepoint, "opened rollback scope");
        Ok(Self {
            session,
            savepoint,
            armed: true,
        })
    }

    /// Returns the savepoint held by this guard.
    #[must_use]
    pub fn savepoint(&self) -> Savepoint {
        self.savepoint
    }

    /// Returns the guarded session.
    #[must_use]
    pub fn session(&self) -> &'a S {
        self.session
    }

    /// Rolls back explicitly, surfacing any rollback failure.
    pub fn rollback(mut self) -> SessionResult<()> {
        self.armed = false;
        debug!(savepoint = %self.savepoint, "closing rollback scope");
        self.session.rollback_to(self.savepoint)
    }
}

impl<S: Session> Drop for ScopedRollback<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.session.rollback_to(self.savepoint) {
                error!(savepoint = %self.savepoint, error = %e, "rollback on scope exit failed");
            }
        }
    }
}

/// Runs `f` inside a rollback scope.
///
/// The scope is rolled back whether `f` succeeds or fails. A rollback
/// failure is returned even when `f` also failed; otherwise `f`'s result is
/// returned unchanged.
pub fn with_rollback<S, F, T>(session: &S, f: F) -> SessionResult<T>
where
    S: Session,
    F: FnOnce(&S) -> SessionResult<T>,
{
    let guard = ScopedRollback::new(session)?;
    let result = f(session);
    guard.rollback()?;
    result
}
