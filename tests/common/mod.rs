#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use devlogify::backends::RemoteStore;
use devlogify::clock::ManualClock;
use devlogify::store::models::{NewTimeEntry, OfflineQueueItem};
use devlogify::{Error, Result};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap())
}

/// Remote double that records every call and fails on request
#[derive(Default)]
pub struct RecordingRemote {
    pub entries: Mutex<Vec<NewTimeEntry>>,
    pub applied: Mutex<Vec<String>>,
    pub attempts: Mutex<Vec<String>>,
    fail_ids: Mutex<HashSet<String>>,
    fail_entries: AtomicBool,
    offline: AtomicBool,
}

impl RecordingRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_time_entries(&self, fail: bool) {
        self.fail_entries.store(fail, Ordering::SeqCst);
    }

    pub fn fail_item(&self, id: &str) {
        self.fail_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn heal_item(&self, id: &str) {
        self.fail_ids.lock().unwrap().remove(id);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn attempts_for(&self, id: &str) -> usize {
        self.attempts.lock().unwrap().iter().filter(|a| *a == id).count()
    }

    pub fn applied(&self) -> Vec<String> {
        self.applied.lock().unwrap().clone()
    }

    pub fn entries(&self) -> Vec<NewTimeEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStore for RecordingRemote {
    async fn insert_time_entry(&self, entry: &NewTimeEntry) -> Result<()> {
        if self.fail_entries.load(Ordering::SeqCst) {
            return Err(Error::RemoteStatus {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn apply(&self, item: &OfflineQueueItem) -> Result<()> {
        self.attempts.lock().unwrap().push(item.id.clone());
        if self.offline.load(Ordering::SeqCst) || self.fail_ids.lock().unwrap().contains(&item.id) {
            return Err(Error::Remote {
                message: "connection refused".to_string(),
            });
        }
        self.applied.lock().unwrap().push(item.id.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Remote {
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

/// Remote whose time-entry insert waits until the test releases it
#[derive(Default)]
pub struct GatedRemote {
    pub entered: tokio::sync::Notify,
    pub release: tokio::sync::Notify,
}

#[async_trait]
impl RemoteStore for GatedRemote {
    async fn insert_time_entry(&self, _entry: &NewTimeEntry) -> Result<()> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }

    async fn apply(&self, _item: &OfflineQueueItem) -> Result<()> {
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
