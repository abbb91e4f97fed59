use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type SlotKey = (Uuid, NaiveDate);

/// Per-doctor, per-date serialization point for booking.
///
/// The guard must be held across the working-hours check, the capacity count
/// and the insert so two bookings against one doctor's day cannot both
/// observe spare capacity. Only covers this process. Entries are dropped as
/// soon as nobody holds or waits for them.
#[derive(Debug, Default)]
pub struct SlotLocks {
    slots: StdMutex<HashMap<SlotKey, Arc<Mutex<()>>>>,
}

/// Holds a doctor's day exclusively until dropped.
pub struct SlotGuard<'a> {
    locks: &'a SlotLocks,
    key: SlotKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, doctor_id: Uuid, date: NaiveDate) -> SlotGuard<'_> {
        let key = (doctor_id, date);
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        SlotGuard {
            locks: self,
            key,
            guard: Some(slot.lock_owned().await),
        }
    }

    pub fn tracked_slots(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn release(&self, key: &SlotKey) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        // the map's own reference is the only one left
        if slots.get(key).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(key);
        }
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.key);
    }
}
