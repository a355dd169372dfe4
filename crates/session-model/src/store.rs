//! Owned session container with change subscriptions.
//!
//! Updates run against a private copy of the session and are published
//! only if they succeed, so subscribers never observe a half-applied edit
//! and a failed edit leaves the stored session untouched. Updates are
//! serialized, so concurrent edits never overwrite each other.

use std::sync::Mutex;

use tokio::sync::watch;

use photoglow_common::error::PhotoglowResult;

use crate::session::EditSession;

/// A committed session state and its revision number.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Incremented on every committed update.
    pub revision: u64,
    pub session: EditSession,
}

/// The single owner of the edit session.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<SessionSnapshot>,
    commit: Mutex<()>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self {
            tx,
            commit: Mutex::new(()),
        }
    }

    /// Current committed state. Cheap: image data is shared.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn revision(&self) -> u64 {
        self.tx.borrow().revision
    }

    /// Receive every committed state from now on.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Apply `edit` atomically. On error the stored session is unchanged and
    /// subscribers are not notified.
    pub fn update<T>(
        &self,
        edit: impl FnOnce(&mut EditSession) -> PhotoglowResult<T>,
    ) -> PhotoglowResult<T> {
        // A panicking edit never reaches `send_replace`, so a poisoned lock
        // still guards a consistent snapshot.
        let _commit = self.commit.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = self.tx.borrow().clone();
        let output = edit(&mut next.session)?;
        next.revision += 1;
        tracing::trace!(revision = next.revision, "Session updated");
        self.tx.send_replace(next);
        Ok(output)
    }

    /// Read the committed session without cloning it.
    pub fn read<T>(&self, f: impl FnOnce(&EditSession) -> T) -> T {
        f(&self.tx.borrow().session)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
