use super::connection::Session;
use crate::core::database_types::IsolationLevel;
use crate::core::driver::Transaction;
use crate::core::error::{DatabaseError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct TransactionInner {
    id: u64,
    level: IsolationLevel,
    session: Arc<Session>,
    completed: AtomicBool,
}

impl Drop for TransactionInner {
    fn drop(&mut self) {
        // Best-effort rollback of a transaction nobody finished
        if !self.completed.load(Ordering::SeqCst) && self.session.is_open() {
            let _ = self.session.complete_transaction(self.id, "ROLLBACK");
        }
    }
}

/// A transaction on a [`SqliteConnection`](super::SqliteConnection)
///
/// Clones are handles to the same transaction. It completes exactly once; when the
/// last handle is dropped while still pending it is rolled back.
#[derive(Clone)]
pub struct SqliteTransaction {
    inner: Arc<TransactionInner>,
}

impl SqliteTransaction {
    pub(crate) fn new(id: u64, level: IsolationLevel, session: Arc<Session>) -> Self {
        Self {
            inner: Arc::new(TransactionInner {
                id,
                level,
                session,
                completed: AtomicBool::new(false),
            }),
        }
    }

    /// Whether commit or rollback already ran
    pub fn is_completed(&self) -> bool {
        self.inner.completed.load(Ordering::SeqCst)
    }

    /// Whether this transaction is the one pending on `session`
    pub(crate) fn is_pending_on(&self, session: &Arc<Session>) -> bool {
        Arc::ptr_eq(&self.inner.session, session)
            && session.pending_transaction() == Some(self.inner.id)
    }

    fn complete(&self, sql: &str) -> Result<()> {
        if self.inner.completed.swap(true, Ordering::SeqCst) {
            return Err(DatabaseError::transaction(
                "This transaction has already completed",
            ));
        }
        let result = self.inner.session.complete_transaction(self.inner.id, sql);
        if result.is_err() {
            self.inner.completed.store(false, Ordering::SeqCst);
        }
        result
    }
}

impl std::fmt::Debug for SqliteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTransaction")
            .field("id", &self.inner.id)
            .field("level", &self.inner.level)
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl Transaction for SqliteTransaction {
    type Error = DatabaseError;

    fn isolation_level(&self) -> IsolationLevel {
        self.inner.level
    }

    fn commit(&mut self) -> Result<()> {
        self.complete("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.complete("ROLLBACK")
    }
}
