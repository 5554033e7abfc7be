use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::FeedVersion;
use crate::registry::TransitRegistry;

/// a persisted note that a region's plan must be recomputed once some future
/// date has passed, because a feed becomes valid beyond the current window.
/// records are cleared and fully regenerated on every build for a region,
/// never patched incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledRebuild {
    pub region_id: i64,
    pub rebuild_after: DateTime<Utc>,
}

#[derive(thiserror::Error, Debug)]
pub enum RebuildStoreError {
    #[error("failure reading rebuild store '{0}': {1}")]
    ReadError(String, String),
    #[error("failure writing rebuild store '{0}': {1}")]
    WriteError(String, String),
    #[error("rebuild store lock poisoned")]
    LockPoisoned,
}

/// durable store of [`ScheduledRebuild`] records, partitioned by region.
/// distinct regions may be cleared and repopulated concurrently; within one
/// region the caller sequences clear before insert.
pub trait RebuildStore: Send + Sync {
    /// delete every record for the region. idempotent.
    fn clear(&self, region_id: i64) -> Result<(), RebuildStoreError>;
    fn insert(&self, region_id: i64, rebuild_after: DateTime<Utc>) -> Result<(), RebuildStoreError>;
    fn records_for(&self, region_id: i64) -> Result<Vec<DateTime<Utc>>, RebuildStoreError>;
    /// every distinct region with at least one record due on or before `now`.
    fn due_regions(&self, now: DateTime<Utc>) -> Result<BTreeSet<i64>, RebuildStoreError>;
}

#[derive(Default)]
pub struct MemoryRebuildStore {
    records: Mutex<Vec<ScheduledRebuild>>,
}

impl MemoryRebuildStore {
    pub fn new() -> MemoryRebuildStore {
        MemoryRebuildStore::default()
    }
}

impl RebuildStore for MemoryRebuildStore {
    fn clear(&self, region_id: i64) -> Result<(), RebuildStoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| RebuildStoreError::LockPoisoned)?;
        records.retain(|r| r.region_id != region_id);
        Ok(())
    }

    fn insert(&self, region_id: i64, rebuild_after: DateTime<Utc>) -> Result<(), RebuildStoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| RebuildStoreError::LockPoisoned)?;
        records.push(ScheduledRebuild {
            region_id,
            rebuild_after,
        });
        Ok(())
    }

    fn records_for(&self, region_id: i64) -> Result<Vec<DateTime<Utc>>, RebuildStoreError> {
        let records = self
            .records
            .lock()
            .map_err(|_| RebuildStoreError::LockPoisoned)?;
        Ok(records
            .iter()
            .filter(|r| r.region_id == region_id)
            .map(|r| r.rebuild_after)
            .collect())
    }

    fn due_regions(&self, now: DateTime<Utc>) -> Result<BTreeSet<i64>, RebuildStoreError> {
        let records = self
            .records
            .lock()
            .map_err(|_| RebuildStoreError::LockPoisoned)?;
        Ok(records
            .iter()
            .filter(|r| r.rebuild_after <= now)
            .map(|r| r.region_id)
            .collect())
    }
}

/// rebuild store persisted as a single JSON file, rewritten on every
/// mutation. record volumes are a handful per region, so whole-file rewrites
/// are fine.
pub struct JsonRebuildStore {
    path: PathBuf,
    records: Mutex<Vec<ScheduledRebuild>>,
}

impl JsonRebuildStore {
    /// opens the store, loading existing records if the file is present.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<JsonRebuildStore, RebuildStoreError> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let filename = path.to_str().unwrap_or_default().to_string();
            let file = File::open(&path)
                .map_err(|e| RebuildStoreError::ReadError(filename.clone(), format!("{e}")))?;
            serde_json::from_reader(file)
                .map_err(|e| RebuildStoreError::ReadError(filename, format!("{e}")))?
        } else {
            vec![]
        };
        Ok(JsonRebuildStore {
            path,
            records: Mutex::new(records),
        })
    }

    fn persist(&self, records: &[ScheduledRebuild]) -> Result<(), RebuildStoreError> {
        let filename = self.path.to_str().unwrap_or_default().to_string();
        let file = File::create(&self.path)
            .map_err(|e| RebuildStoreError::WriteError(filename.clone(), format!("{e}")))?;
        serde_json::to_writer_pretty(file, records)
            .map_err(|e| RebuildStoreError::WriteError(filename, format!("{e}")))
    }
}

impl RebuildStore for JsonRebuildStore {
    fn clear(&self, region_id: i64) -> Result<(), RebuildStoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| RebuildStoreError::LockPoisoned)?;
        records.retain(|r| r.region_id != region_id);
        self.persist(records.as_slice())
    }

    fn insert(&self, region_id: i64, rebuild_after: DateTime<Utc>) -> Result<(), RebuildStoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| RebuildStoreError::LockPoisoned)?;
        records.push(ScheduledRebuild {
            region_id,
            rebuild_after,
        });
        self.persist(records.as_slice())
    }

    fn records_for(&self, region_id: i64) -> Result<Vec<DateTime<Utc>>, RebuildStoreError> {
        let records = self
            .records
            .lock()
            .map_err(|_| RebuildStoreError::LockPoisoned)?;
        Ok(records
            .iter()
            .filter(|r| r.region_id == region_id)
            .map(|r| r.rebuild_after)
            .collect())
    }

    fn due_regions(&self, now: DateTime<Utc>) -> Result<BTreeSet<i64>, RebuildStoreError> {
        let records = self
            .records
            .lock()
            .map_err(|_| RebuildStoreError::LockPoisoned)?;
        Ok(records
            .iter()
            .filter(|r| r.rebuild_after <= now)
            .map(|r| r.region_id)
            .collect())
    }
}

/// resolves rebuild side effects against the store: a feed maps to its owning
/// agencies, each agency to its containing regions, and one record is written
/// per region. duplicates across feeds in the same build are acceptable.
pub struct RebuildScheduler<'a> {
    registry: &'a TransitRegistry,
    store: &'a dyn RebuildStore,
}

impl<'a> RebuildScheduler<'a> {
    pub fn new(registry: &'a TransitRegistry, store: &'a dyn RebuildStore) -> RebuildScheduler<'a> {
        RebuildScheduler { registry, store }
    }

    pub fn clear(&self, region_id: i64) -> Result<(), RebuildStoreError> {
        self.store.clear(region_id)
    }

    pub fn schedule(
        &self,
        feed: &FeedVersion,
        rebuild_after: DateTime<Utc>,
    ) -> Result<(), RebuildStoreError> {
        for agency_id in self.registry.agency_ids_for_feed(&feed.stored_id) {
            for region_id in self.registry.region_ids_for_agency(agency_id) {
                log::debug!(
                    "scheduling rebuild of region {} after {} for feed '{}'",
                    region_id,
                    rebuild_after,
                    feed.stored_id
                );
                self.store.insert(*region_id, rebuild_after)?;
            }
        }
        Ok(())
    }

    pub fn records_for(&self, region_id: i64) -> Result<Vec<DateTime<Utc>>, RebuildStoreError> {
        self.store.records_for(region_id)
    }

    pub fn due_regions(&self, now: DateTime<Utc>) -> Result<BTreeSet<i64>, RebuildStoreError> {
        self.store.due_regions(now)
    }
}
