//! Fixed-capacity snapshot history.
//!
//! One writer ([`HistoryBuffer`]) owned by the controller, any number of
//! cloneable readers ([`HistoryReader`]). Both sides share a single
//! `RwLock`, so readers always observe whole snapshots.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use contracts::{Snapshot, SourceId};
use ringbuf::{traits::*, HeapRb};
use tracing::{debug, trace};

use crate::error::{HistoryError, Result};
use crate::series::Series;

struct Retained {
    ring: HeapRb<Arc<Snapshot>>,
    newest: Option<Arc<Snapshot>>,
}

impl Retained {
    fn view(&self) -> Vec<Arc<Snapshot>> {
        self.ring.iter().cloned().collect()
    }
}

/// Writer side of the history
pub struct HistoryBuffer {
    shared: Arc<RwLock<Retained>>,
    capacity: usize,
    appended: u64,
    evicted: u64,
}

impl fmt::Debug for HistoryBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryBuffer")
            .field("capacity", &self.capacity)
            .field("appended", &self.appended)
            .field("evicted", &self.evicted)
            .finish()
    }
}

impl HistoryBuffer {
    /// Create an empty history holding at most `capacity` snapshots
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(HistoryError::ZeroCapacity);
        }

        debug!(capacity, "history buffer created");

        Ok(Self {
            shared: Arc::new(RwLock::new(Retained {
                ring: HeapRb::new(capacity),
                newest: None,
            })),
            capacity,
            appended: 0,
            evicted: 0,
        })
    }

    /// Append a snapshot, evicting the oldest one at capacity.
    ///
    /// Returns the evicted snapshot, if any. Fails if the snapshot is older
    /// than the newest retained one or the lock is poisoned.
    pub fn append(&mut self, snapshot: impl Into<Arc<Snapshot>>) -> Result<Option<Arc<Snapshot>>> {
        let snapshot = snapshot.into();
        let mut retained = self.shared.write().map_err(|_| HistoryError::Poisoned)?;

        if let Some(newest) = &retained.newest {
            if snapshot.timestamp() < newest.timestamp() {
                return Err(HistoryError::OutOfOrder {
                    tick: snapshot.tick(),
                    timestamp: snapshot.timestamp(),
                    newest: newest.timestamp(),
                });
            }
        }

        let evicted = if retained.ring.is_full() {
            retained.ring.try_pop()
        } else {
            None
        };
        // Cannot fail: a slot was freed above if the ring was full
        let _ = retained.ring.try_push(Arc::clone(&snapshot));
        retained.newest = Some(snapshot);
        drop(retained);

        self.appended += 1;
        if let Some(old) = &evicted {
            self.evicted += 1;
            trace!(tick = old.tick(), "evicted oldest snapshot");
        }

        Ok(evicted)
    }

    /// Create a read-only handle
    pub fn reader(&self) -> HistoryReader {
        HistoryReader {
            shared: Arc::clone(&self.shared),
            capacity: self.capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshots currently retained
    pub fn len(&self) -> usize {
        self.reader().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total snapshots appended since creation
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Total snapshots evicted since creation
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

/// Read-only history handle.
///
/// Reads never fail: a poisoned lock still holds whole `Arc<Snapshot>`
/// values, so readers keep serving them and the writer reports the poison.
#[derive(Clone)]
pub struct HistoryReader {
    shared: Arc<RwLock<Retained>>,
    capacity: usize,
}

impl fmt::Debug for HistoryReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryReader")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl HistoryReader {
    fn read(&self) -> RwLockReadGuard<'_, Retained> {
        self.shared
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Most recently appended snapshot
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.read().newest.clone()
    }

    /// Time series of one source over the retained window
    pub fn series(&self, source_id: impl Into<SourceId>) -> Series {
        Series::new(source_id.into(), self.read().view())
    }

    /// Point-in-time view of all retained snapshots, oldest first
    pub fn snapshots(&self) -> Vec<Arc<Snapshot>> {
        self.read().view()
    }

    pub fn len(&self) -> usize {
        self.read().ring.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
