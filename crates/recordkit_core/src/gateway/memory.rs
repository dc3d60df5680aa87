//! In-process reference gateway over JSON documents.
//!
//! # Responsibility
//! - Back sessions for tests, demos and prototyping without a database.
//! - Evaluate `QueryFilter` trees and ordering in process.
//!
//! # Invariants
//! - Writes inside a transaction are staged per session and replayed on
//!   commit; other sessions never observe them before that.
//! - Commit replays atomically: either every staged write applies or none.
//! - Identities come from a shared per-collection sequence and are never
//!   reused, even when the allocating transaction rolls back.

use super::{
    Document, GatewayError, GatewayResult, GatewaySession, PersistenceGateway, RecordQuery,
};
use crate::config::SessionConfig;
use crate::filter::compare_documents;
use crate::model::entity::RecordId;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Session setting that rejects every write when enabled.
pub const READ_ONLY_KEY: &str = "read_only";

type Collections = BTreeMap<String, BTreeMap<RecordId, Document>>;

#[derive(Debug, Default)]
struct MemoryStore {
    collections: Collections,
    sequences: BTreeMap<String, RecordId>,
}

/// Shared in-memory store acting as the session factory.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    store: Arc<Mutex<MemoryStore>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed documents in `collection`.
    pub fn document_count(&self, collection: &str) -> GatewayResult<usize> {
        let store = lock_store(&self.store)?;
        Ok(store.collections.get(collection).map_or(0, BTreeMap::len))
    }
}

impl PersistenceGateway for MemoryGateway {
    type Session = MemorySession;

    fn open_session(&self, config: &SessionConfig) -> GatewayResult<MemorySession> {
        Ok(MemorySession {
            store: Arc::clone(&self.store),
            read_only: config.flag(READ_ONLY_KEY),
            transaction: None,
            closed: false,
        })
    }
}

#[derive(Debug, Clone)]
enum StagedWrite {
    Insert {
        collection: String,
        id: RecordId,
        document: Document,
    },
    Update {
        collection: String,
        id: RecordId,
        document: Document,
    },
    Delete {
        collection: String,
        id: RecordId,
    },
}

impl StagedWrite {
    fn key(&self) -> (String, RecordId) {
        match self {
            Self::Insert { collection, id, .. }
            | Self::Update { collection, id, .. }
            | Self::Delete { collection, id } => (collection.clone(), *id),
        }
    }

    fn resulting_document(&self) -> Option<Document> {
        match self {
            Self::Insert { document, .. } | Self::Update { document, .. } => {
                Some(document.clone())
            }
            Self::Delete { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
struct StagedTransaction {
    // Latest state per row as seen by this session; `None` marks a delete.
    overlay: BTreeMap<(String, RecordId), Option<Document>>,
    writes: Vec<StagedWrite>,
}

/// One session over a [`MemoryGateway`].
#[derive(Debug)]
pub struct MemorySession {
    store: Arc<Mutex<MemoryStore>>,
    read_only: bool,
    transaction: Option<StagedTransaction>,
    closed: bool,
}

impl MemorySession {
    /// Returns whether a transaction is currently staged.
    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    fn ensure_open(&self) -> GatewayResult<()> {
        if self.closed {
            return Err(GatewayError::Closed);
        }
        Ok(())
    }

    fn ensure_writable(&self) -> GatewayResult<()> {
        self.ensure_open()?;
        if self.read_only {
            return Err(GatewayError::ReadOnly);
        }
        Ok(())
    }

    fn current(&self, collection: &str, id: RecordId) -> GatewayResult<Option<Document>> {
        if let Some(state) = self
            .transaction
            .as_ref()
            .and_then(|tx| tx.overlay.get(&(collection.to_string(), id)))
        {
            return Ok(state.clone());
        }
        let store = lock_store(&self.store)?;
        Ok(store
            .collections
            .get(collection)
            .and_then(|rows| rows.get(&id))
            .cloned())
    }

    fn stage_or_apply(&mut self, write: StagedWrite) -> GatewayResult<()> {
        if let Some(tx) = self.transaction.as_mut() {
            tx.overlay.insert(write.key(), write.resulting_document());
            tx.writes.push(write);
            return Ok(());
        }
        let mut store = lock_store(&self.store)?;
        apply_write(&mut store.collections, write)
    }
}

impl GatewaySession for MemorySession {
    fn begin(&mut self) -> GatewayResult<()> {
        self.ensure_open()?;
        if self.transaction.is_some() {
            return Err(GatewayError::TransactionState("transaction already active"));
        }
        self.transaction = Some(StagedTransaction::default());
        Ok(())
    }

    fn commit(&mut self) -> GatewayResult<()> {
        self.ensure_open()?;
        let tx = self
            .transaction
            .take()
            .ok_or(GatewayError::TransactionState("no active transaction"))?;

        let mut store = lock_store(&self.store)?;
        let mut next = store.collections.clone();
        for write in tx.writes {
            apply_write(&mut next, write)?;
        }
        store.collections = next;
        Ok(())
    }

    fn rollback(&mut self) -> GatewayResult<()> {
        self.ensure_open()?;
        self.transaction
            .take()
            .map(|_| ())
            .ok_or(GatewayError::TransactionState("no active transaction"))
    }

    fn close(&mut self) -> GatewayResult<()> {
        self.ensure_open()?;
        self.transaction = None;
        self.closed = true;
        Ok(())
    }

    fn allocate_id(&mut self, collection: &str) -> GatewayResult<RecordId> {
        self.ensure_writable()?;
        let mut store = lock_store(&self.store)?;
        let sequence = store.sequences.entry(collection.to_string()).or_insert(0);
        *sequence += 1;
        Ok(*sequence)
    }

    fn insert(
        &mut self,
        collection: &str,
        id: RecordId,
        document: Document,
    ) -> GatewayResult<()> {
        self.ensure_writable()?;
        ensure_object(&document)?;
        if self.current(collection, id)?.is_some() {
            return Err(GatewayError::Constraint(format!(
                "duplicate id {id} in `{collection}`"
            )));
        }
        self.stage_or_apply(StagedWrite::Insert {
            collection: collection.to_string(),
            id,
            document,
        })
    }

    fn update(
        &mut self,
        collection: &str,
        id: RecordId,
        document: Document,
    ) -> GatewayResult<bool> {
        self.ensure_writable()?;
        ensure_object(&document)?;
        if self.current(collection, id)?.is_none() {
            return Ok(false);
        }
        self.stage_or_apply(StagedWrite::Update {
            collection: collection.to_string(),
            id,
            document,
        })?;
        Ok(true)
    }

    fn delete(&mut self, collection: &str, id: RecordId) -> GatewayResult<bool> {
        self.ensure_writable()?;
        if self.current(collection, id)?.is_none() {
            return Ok(false);
        }
        self.stage_or_apply(StagedWrite::Delete {
            collection: collection.to_string(),
            id,
        })?;
        Ok(true)
    }

    fn find(&self, collection: &str, id: RecordId) -> GatewayResult<Option<Document>> {
        self.ensure_open()?;
        self.current(collection, id)
    }

    fn query(&self, collection: &str, query: &RecordQuery<'_>) -> GatewayResult<Vec<Document>> {
        self.ensure_open()?;
        let mut rows = {
            let store = lock_store(&self.store)?;
            store.collections.get(collection).cloned().unwrap_or_default()
        };
        if let Some(tx) = &self.transaction {
            for ((name, id), state) in &tx.overlay {
                if name != collection {
                    continue;
                }
                match state {
                    Some(document) => {
                        rows.insert(*id, document.clone());
                    }
                    None => {
                        rows.remove(id);
                    }
                }
            }
        }

        let mut matched = rows
            .into_values()
            .filter(|document| query.filter.matches(document))
            .collect::<Vec<_>>();
        if let Some(property) = query.order_by {
            matched.sort_by(|left, right| {
                let ordering = compare_documents(left, right, property);
                if query.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        Ok(matched)
    }
}

fn lock_store(store: &Mutex<MemoryStore>) -> GatewayResult<MutexGuard<'_, MemoryStore>> {
    store
        .lock()
        .map_err(|_| GatewayError::Unavailable("memory store lock poisoned".to_string()))
}

fn ensure_object(document: &Document) -> GatewayResult<()> {
    if document.is_object() {
        Ok(())
    } else {
        Err(GatewayError::InvalidDocument(
            "records must serialize to JSON objects".to_string(),
        ))
    }
}

fn apply_write(collections: &mut Collections, write: StagedWrite) -> GatewayResult<()> {
    match write {
        StagedWrite::Insert {
            collection,
            id,
            document,
        } => {
            let rows = collections.entry(collection.clone()).or_default();
            if rows.contains_key(&id) {
                return Err(GatewayError::Constraint(format!(
                    "duplicate id {id} in `{collection}`"
                )));
            }
            rows.insert(id, document);
        }
        StagedWrite::Update {
            collection,
            id,
            document,
        } => match collections.get_mut(&collection).and_then(|rows| rows.get_mut(&id)) {
            Some(slot) => *slot = document,
            None => {
                return Err(GatewayError::Constraint(format!(
                    "row {id} in `{collection}` no longer exists"
                )));
            }
        },
        StagedWrite::Delete { collection, id } => {
            let removed = collections
                .get_mut(&collection)
                .and_then(|rows| rows.remove(&id));
            if removed.is_none() {
                return Err(GatewayError::Constraint(format!(
                    "row {id} in `{collection}` no longer exists"
                )));
            }
        }
    }
    Ok(())
}
