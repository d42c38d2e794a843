//! txn
//!
//! Transaction envelopes: batching of change notifications per connection.
//!
//! # Architecture
//!
//! A connection opens an envelope with [`TransactionManager::begin`] and
//! closes it with [`TransactionManager::end`]. Envelopes nest; only the
//! outermost `end` flushes the notifications queued while it was open.
//! Outside any envelope, notifications are delivered immediately.
//!
//! Envelopes batch, they do not roll back: every archive operation inside
//! commits on its own, and a failed operation leaves the envelope open for
//! the next one.
//!
//! # Example
//!
//! ```
//! use branchvault::txn::{ConnectionId, MemorySink, TransactionManager};
//!
//! let sink = MemorySink::default();
//! let txns = TransactionManager::new();
//! let conn = ConnectionId::new();
//! let id = txns.begin(conn);
//! txns.end(conn, id, &sink);
//! assert!(sink.take().is_empty());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::types::{ArchiveLocation, BranchName, FileId, RevisionId, UserName, UtcTimestamp};

/// First transaction id handed out.
pub const FIRST_TRANSACTION_ID: u64 = 100_000_000;

/// Errors from transaction bookkeeping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TxnError {
    #[error("connection {0} has no open transaction")]
    NoOpenTransaction(ConnectionId),
}

/// Identity of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Monotonic transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller identity attached to every operation.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub connection: ConnectionId,
    pub transaction: TransactionId,
    pub user: UserName,
    pub timestamp: UtcTimestamp,
}

/// A change other clients may want to hear about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Created {
        file_id: FileId,
        branch: BranchName,
        location: ArchiveLocation,
    },
    CheckedIn {
        file_id: FileId,
        branch: BranchName,
        revision: RevisionId,
    },
    Locked {
        file_id: FileId,
        revision: RevisionId,
        holder: UserName,
    },
    Unlocked {
        file_id: FileId,
        revision: RevisionId,
    },
    Labeled {
        file_id: FileId,
        label: String,
        revision: RevisionId,
    },
    Unlabeled {
        file_id: FileId,
        label: String,
    },
    Renamed {
        file_id: FileId,
        branch: BranchName,
        from: ArchiveLocation,
        to: ArchiveLocation,
    },
    Deleted {
        file_id: FileId,
        branch: BranchName,
    },
    Undeleted {
        file_id: FileId,
        branch: BranchName,
    },
    Promoted {
        file_id: FileId,
        from: BranchName,
        into: BranchName,
    },
    AttributesChanged {
        file_id: FileId,
    },
}

/// Receives notifications when they are released.
pub trait NotificationSink {
    fn deliver(&self, notifications: Vec<Notification>);
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn deliver(&self, _notifications: Vec<Notification>) {}
}

/// Collects delivered notifications in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<Notification>>,
}

impl MemorySink {
    /// Drain everything delivered so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.delivered.lock())
    }
}

impl NotificationSink for MemorySink {
    fn deliver(&self, notifications: Vec<Notification>) {
        self.delivered.lock().extend(notifications);
    }
}

#[derive(Debug)]
struct Envelope {
    depth: usize,
    ids: Vec<TransactionId>,
    started_at: UtcTimestamp,
    pending: Vec<Notification>,
}

/// Per-project transaction bookkeeping.
#[derive(Debug)]
pub struct TransactionManager {
    next_id: AtomicU64,
    open: Mutex<HashMap<ConnectionId, Envelope>>,
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionManager {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(FIRST_TRANSACTION_ID),
            open: Mutex::new(HashMap::new()),
        }
    }

    /// A fresh id without opening an envelope.
    pub fn next_id(&self) -> TransactionId {
        TransactionId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Open (or nest) an envelope for `connection`.
    pub fn begin(&self, connection: ConnectionId) -> TransactionId {
        let id = self.next_id();
        let mut open = self.open.lock();
        let envelope = open.entry(connection).or_insert_with(|| Envelope {
            depth: 0,
            ids: Vec::new(),
            started_at: UtcTimestamp::now(),
            pending: Vec::new(),
        });
        envelope.depth += 1;
        envelope.ids.push(id);
        tracing::debug!(%connection, transaction = %id, depth = envelope.depth, "transaction begun");
        id
    }

    /// Close one level of `connection`'s envelope.
    ///
    /// The outermost close delivers queued notifications to `sink`. An
    /// unknown connection or id is logged and ignored.
    pub fn end(&self, connection: ConnectionId, id: TransactionId, sink: &dyn NotificationSink) {
        let flushed = {
            let mut open = self.open.lock();
            let Some(envelope) = open.get_mut(&connection) else {
                tracing::warn!(%connection, transaction = %id, "end of unknown transaction ignored");
                return;
            };
            let Some(position) = envelope.ids.iter().rposition(|t| *t == id) else {
                tracing::warn!(%connection, transaction = %id, "end of unknown transaction ignored");
                return;
            };
            envelope.ids.remove(position);
            envelope.depth -= 1;
            if envelope.depth > 0 {
                return;
            }
            open.remove(&connection).map(|e| e.pending)
        };

        if let Some(pending) = flushed {
            tracing::debug!(%connection, transaction = %id, count = pending.len(), "transaction closed");
            if !pending.is_empty() {
                sink.deliver(pending);
            }
        }
    }

    /// Queue `notification` on the connection's envelope, or deliver it now
    /// when no envelope is open.
    pub fn notify(
        &self,
        connection: ConnectionId,
        notification: Notification,
        sink: &dyn NotificationSink,
    ) {
        {
            let mut open = self.open.lock();
            if let Some(envelope) = open.get_mut(&connection) {
                envelope.pending.push(notification);
                return;
            }
        }
        sink.deliver(vec![notification]);
    }

    /// Whether `connection` has an open envelope.
    pub fn is_open(&self, connection: ConnectionId) -> bool {
        self.open.lock().contains_key(&connection)
    }

    /// Innermost open transaction of `connection`.
    pub fn current(&self, connection: ConnectionId) -> Result<TransactionId, TxnError> {
        self.open
            .lock()
            .get(&connection)
            .and_then(|e| e.ids.last().copied())
            .ok_or(TxnError::NoOpenTransaction(connection))
    }

    /// When the connection's outermost envelope opened.
    pub fn transaction_timestamp(&self, connection: ConnectionId) -> Result<UtcTimestamp, TxnError> {
        self.open
            .lock()
            .get(&connection)
            .map(|e| e.started_at.clone())
            .ok_or(TxnError::NoOpenTransaction(connection))
    }
}
