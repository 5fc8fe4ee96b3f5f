//! In-memory record store
//!
//! Holds records and the unique-key index behind one `RwLock`. A commit stages
//! every operation against a scratch view first and only touches shared state
//! once the whole batch has passed, so a failed batch leaves nothing behind.

use crate::domain::{LedgerRecord, UniqueKey};
use crate::ports::outbound::{RecordFilter, RecordStore, StoreError, WriteOp};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::RecordId;
use std::collections::{HashMap, HashSet};
use tracing::trace;

#[derive(Default)]
struct Inner {
    records: HashMap<RecordId, LedgerRecord>,
    unique: HashMap<UniqueKey, RecordId>,
    /// Insertion order, for stable `find` results.
    order: Vec<RecordId>,
}

impl Inner {
    fn owner_of(&self, key: &UniqueKey, staged: &Staged) -> Option<RecordId> {
        if let Some(id) = staged.claimed.get(key) {
            return Some(*id);
        }
        if staged.released.contains(key) {
            return None;
        }
        self.unique.get(key).copied()
    }

    fn current(&self, id: &RecordId, staged: &Staged) -> Option<LedgerRecord> {
        staged
            .records
            .get(id)
            .or_else(|| self.records.get(id))
            .cloned()
    }
}

#[derive(Default)]
struct Staged {
    records: HashMap<RecordId, LedgerRecord>,
    inserted: Vec<RecordId>,
    claimed: HashMap<UniqueKey, RecordId>,
    released: HashSet<UniqueKey>,
}

impl Staged {
    fn claim(&mut self, inner: &Inner, key: UniqueKey, id: RecordId) -> Result<(), StoreError> {
        match inner.owner_of(&key, self) {
            Some(owner) if owner != id => Err(StoreError::UniqueViolation(key)),
            _ => {
                self.released.remove(&key);
                self.claimed.insert(key, id);
                Ok(())
            }
        }
    }

    fn release(&mut self, key: UniqueKey) {
        self.claimed.remove(&key);
        self.released.insert(key);
    }
}

/// In-memory `RecordStore` for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryRecordStore {
    inner: RwLock<Inner>,
    #[cfg(any(test, feature = "test-utils"))]
    offline: std::sync::atomic::AtomicBool,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stage(inner: &Inner, ops: Vec<WriteOp>) -> Result<Staged, StoreError> {
        let mut staged = Staged::default();

        for op in ops {
            match op {
                WriteOp::Insert(record) => {
                    let id = record.id();
                    if inner.current(&id, &staged).is_some() {
                        return Err(StoreError::UniqueViolation(UniqueKey::Id(id)));
                    }
                    for key in record.unique_keys() {
                        staged.claim(inner, key, id)?;
                    }
                    staged.inserted.push(id);
                    staged.records.insert(id, record);
                }
                WriteOp::Update(update) => {
                    let id = update.id();
                    let current = inner
                        .current(&id, &staged)
                        .ok_or(StoreError::Missing(id))?;
                    let updated = update.apply_to(&current)?;

                    let before: HashSet<UniqueKey> = current.unique_keys().into_iter().collect();
                    let after: HashSet<UniqueKey> = updated.unique_keys().into_iter().collect();
                    for key in before.difference(&after) {
                        staged.release(key.clone());
                    }
                    for key in after.difference(&before) {
                        staged.claim(inner, key.clone(), id)?;
                    }
                    staged.records.insert(id, updated);
                }
            }
        }

        Ok(staged)
    }

    #[cfg(any(test, feature = "test-utils"))]
    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        Ok(())
    }

    #[cfg(not(any(test, feature = "test-utils")))]
    fn check_online(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(&self, id: RecordId) -> Result<Option<LedgerRecord>, StoreError> {
        self.check_online()?;
        Ok(self.inner.read().records.get(&id).cloned())
    }

    async fn find(&self, filter: &RecordFilter) -> Result<Vec<LedgerRecord>, StoreError> {
        self.check_online()?;
        let inner = self.inner.read();

        // Indexed keys resolve without a scan. The index reflects committed
        // writes only, so a miss falls back to scanning stored content.
        let indexed = match filter {
            RecordFilter::BatchNumber(batch) => Some(UniqueKey::BatchNumber(batch.clone())),
            RecordFilter::Fingerprint(fp) => Some(UniqueKey::Fingerprint(*fp)),
            _ => None,
        };
        let hit = indexed
            .and_then(|key| inner.unique.get(&key))
            .and_then(|id| inner.records.get(id))
            .filter(|record| filter.matches(record));
        if let Some(record) = hit {
            return Ok(vec![record.clone()]);
        }

        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id))
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        self.check_online()?;
        let op_count = ops.len();
        let mut inner = self.inner.write();

        let staged = Self::stage(&inner, ops)?;

        for key in &staged.released {
            inner.unique.remove(key);
        }
        inner.unique.extend(staged.claimed);
        inner.order.extend(staged.inserted);
        inner.records.extend(staged.records);

        trace!(ops = op_count, records = inner.records.len(), "Committed batch");
        Ok(())
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl InMemoryRecordStore {
    /// Mutate a stored record in place, bypassing seals and indexes.
    ///
    /// Simulates an out-of-band edit to the backing database.
    pub fn tamper<F: FnOnce(&mut LedgerRecord)>(&self, id: RecordId, edit: F) -> bool {
        match self.inner.write().records.get_mut(&id) {
            Some(record) => {
                edit(record);
                true
            }
            None => false,
        }
    }

    /// Make every call fail with `StoreError::Unavailable` until reset.
    pub fn set_offline(&self, offline: bool) {
        self.offline
            .store(offline, std::sync::atomic::Ordering::SeqCst);
    }
}
