use crate::audit::AuditRecord;
use crate::error::DataError;
use crate::record::EntityRecord;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Storage for one entity type and its audit history.
///
/// Uses RPITIT (return-position `impl Trait` in traits), no `async-trait` needed.
///
/// Both write methods persist the record and its audit entry as a single
/// unit: either both are stored or neither is.
pub trait EntityStore: Send + Sync {
    /// Current record, deleted or not.
    fn load(&self, id: &str) -> impl Future<Output = Result<Option<EntityRecord>, DataError>> + Send;

    /// Store a new record. Returns `false` if the id is already taken.
    fn insert(
        &self,
        record: &EntityRecord,
        audit: &AuditRecord,
    ) -> impl Future<Output = Result<bool, DataError>> + Send;

    /// Replace the record only if it is still at `expected` version.
    /// Returns `false` when the condition failed and nothing was written.
    fn compare_and_swap(
        &self,
        expected: u64,
        record: &EntityRecord,
        audit: &AuditRecord,
    ) -> impl Future<Output = Result<bool, DataError>> + Send;

    /// Audit records for `id`, ordered by version.
    fn history(&self, id: &str) -> impl Future<Output = Result<Vec<AuditRecord>, DataError>> + Send;
}

/// In-memory [`EntityStore`].
///
/// Clones share storage. [`fail_writes`](Self::fail_writes) makes every
/// write fail before touching anything, for exercising error paths.
#[derive(Clone, Default)]
pub struct MemoryEntityStore {
    records: Arc<DashMap<String, EntityRecord>>,
    history: Arc<DashMap<String, Vec<AuditRecord>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn check_writable(&self) -> Result<(), DataError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DataError::Other("memory store rejected write".into()))
        } else {
            Ok(())
        }
    }
}

impl EntityStore for MemoryEntityStore {
    async fn load(&self, id: &str) -> Result<Option<EntityRecord>, DataError> {
        Ok(self.records.get(id).map(|r| r.clone()))
    }

    async fn insert(&self, record: &EntityRecord, audit: &AuditRecord) -> Result<bool, DataError> {
        self.check_writable()?;
        match self.records.entry(record.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                // The record slot stays locked until the audit entry is in.
                let _record = slot.insert(record.clone());
                self.history
                    .entry(record.id.clone())
                    .or_default()
                    .push(audit.clone());
                Ok(true)
            }
        }
    }

    async fn compare_and_swap(
        &self,
        expected: u64,
        record: &EntityRecord,
        audit: &AuditRecord,
    ) -> Result<bool, DataError> {
        self.check_writable()?;
        let Some(mut current) = self.records.get_mut(&record.id) else {
            return Ok(false);
        };
        if current.version != expected {
            return Ok(false);
        }
        *current = record.clone();
        self.history
            .entry(record.id.clone())
            .or_default()
            .push(audit.clone());
        Ok(true)
    }

    async fn history(&self, id: &str) -> Result<Vec<AuditRecord>, DataError> {
        let mut records = self
            .history
            .get(id)
            .map(|h| h.clone())
            .unwrap_or_default();
        records.sort_by_key(|r| r.version);
        Ok(records)
    }
}
