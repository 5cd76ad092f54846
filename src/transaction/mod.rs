use crate::errors::storage_error::StorageError;
use crate::types::record_types::Rid;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A running transaction. Only the identity and start timestamp matter to
/// the storage core; commit/abort bookkeeping lives elsewhere.
#[derive(Debug)]
pub struct Transaction {
    id: u32,
    start_ts: u64,
}

impl Transaction {
    pub fn new(id: u32, start_ts: u64) -> Self {
        Self { id, start_ts }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn start_ts(&self) -> u64 {
        self.start_ts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LockTarget {
    Record { fd: i32, rid: Rid },
    Table { fd: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockMode {
    Shared,
    Exclusive,
}

struct LockEntry {
    mode: LockMode,
    owners: HashSet<u32>,
}

/// No-wait lock table.
///
/// Shared locks are compatible with each other; anything else conflicts.
/// A conflicting request from another transaction aborts immediately
/// instead of blocking; re-acquisition by a holder (including a
/// shared-to-exclusive upgrade by a sole holder) succeeds.
pub struct LockManager {
    table: Mutex<HashMap<LockTarget, LockEntry>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
        }
    }

    pub fn lock_shared_on_record(
        &self,
        txn: &Transaction,
        rid: Rid,
        fd: i32,
    ) -> Result<(), StorageError> {
        self.acquire(LockTarget::Record { fd, rid }, LockMode::Shared, txn.id())
    }

    pub fn lock_exclusive_on_record(
        &self,
        txn: &Transaction,
        rid: Rid,
        fd: i32,
    ) -> Result<(), StorageError> {
        self.acquire(LockTarget::Record { fd, rid }, LockMode::Exclusive, txn.id())
    }

    pub fn lock_exclusive_on_table(&self, txn: &Transaction, fd: i32) -> Result<(), StorageError> {
        self.acquire(LockTarget::Table { fd }, LockMode::Exclusive, txn.id())
    }

    /// Release everything a transaction holds (commit or abort).
    pub fn release_all(&self, txn: &Transaction) {
        let mut table = self.table.lock().unwrap();
        table.retain(|_, entry| {
            entry.owners.remove(&txn.id());
            !entry.owners.is_empty()
        });
    }

    fn acquire(&self, target: LockTarget, mode: LockMode, owner: u32) -> Result<(), StorageError> {
        let mut table = self.table.lock().unwrap();
        match table.get_mut(&target) {
            None => {
                table.insert(
                    target,
                    LockEntry {
                        mode,
                        owners: HashSet::from([owner]),
                    },
                );
                Ok(())
            }
            Some(entry) => {
                let sole_owner = entry.owners.len() == 1 && entry.owners.contains(&owner);
                match mode {
                    LockMode::Shared if entry.mode == LockMode::Shared => {
                        entry.owners.insert(owner);
                        Ok(())
                    }
                    LockMode::Shared if entry.owners.contains(&owner) => Ok(()),
                    LockMode::Exclusive if sole_owner => {
                        entry.mode = LockMode::Exclusive;
                        Ok(())
                    }
                    _ => Err(StorageError::TransactionAborted),
                }
            }
        }
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-operation bundle threaded through record and executor operations.
pub struct Context<'a> {
    pub lock_mgr: &'a LockManager,
    pub txn: &'a Transaction,
}

impl<'a> Context<'a> {
    pub fn new(lock_mgr: &'a LockManager, txn: &'a Transaction) -> Self {
        Self { lock_mgr, txn }
    }
}
