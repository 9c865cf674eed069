use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::drill_engine::models::LineKey;

/// Attempt counters for one line. `successes <= attempts` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempts: u32,
    pub successes: u32,
}

impl AttemptRecord {
    /// Fraction of attempts that succeeded; 0.0 before any attempt.
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        f64::from(self.successes) / f64::from(self.attempts)
    }
}

/// In-memory attempt/success counts keyed by line.
///
/// Records are created lazily on the first result and only ever grow.
/// Reads never create records.
#[derive(Debug, Clone, Default)]
pub struct AttemptLedger {
    records: HashMap<LineKey, AttemptRecord>,
}

impl AttemptLedger {
    pub fn new() -> Self {
        AttemptLedger::default()
    }

    pub fn record_result(&mut self, key: &LineKey, success: bool) {
        let record = self.records.entry(key.clone()).or_default();
        record.attempts += 1;
        if success {
            record.successes += 1;
        }
    }

    pub fn stats(&self, key: &LineKey) -> AttemptRecord {
        self.records.get(key).copied().unwrap_or_default()
    }

    pub fn play_count(&self, key: &LineKey) -> u32 {
        self.stats(key).attempts
    }

    pub fn success_rate(&self, key: &LineKey) -> f64 {
        self.stats(key).success_rate()
    }

    /// Number of lines with at least one recorded result.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ordered copy of every record, for handing to an external store.
    pub fn snapshot(&self) -> BTreeMap<LineKey, AttemptRecord> {
        self.records.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}

/// [`AttemptLedger`] behind one mutex, for hosts that drill on several
/// threads.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<AttemptLedger>>,
}

impl SharedLedger {
    pub fn new() -> Self {
        SharedLedger::default()
    }

    // A panic elsewhere cannot leave a record half-written, so a poisoned
    // lock still guards consistent counts.
    fn lock(&self) -> MutexGuard<'_, AttemptLedger> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_result(&self, key: &LineKey, success: bool) {
        self.lock().record_result(key, success);
    }

    pub fn stats(&self, key: &LineKey) -> AttemptRecord {
        self.lock().stats(key)
    }

    pub fn snapshot(&self) -> BTreeMap<LineKey, AttemptRecord> {
        self.lock().snapshot()
    }
}
