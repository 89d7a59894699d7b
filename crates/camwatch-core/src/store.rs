use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::record::{now_ms, CameraRecord, CameraStatus};

pub const ROSTER_FILE: &str = "cameras.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed roster document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// File-backed owner of the camera collection.
///
/// All writes go through [`crate::gateway::Gateway`]; the store itself only
/// loads, snapshots and persists. First open with no document on disk seeds a
/// small example roster so the dashboard has something to show.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    records: Vec<CameraRecord>,
}

impl RecordStore {
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(ROSTER_FILE);

        let records = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            info!(path = %path.display(), "no roster found, seeding example records");
            let seeded = seed_records();
            write_roster(&path, &seeded)?;
            seeded
        };

        Ok(Self { path, records })
    }

    /// Read-only snapshot of the whole collection, tombstones included.
    pub fn snapshot(&self) -> Vec<CameraRecord> {
        self.records.clone()
    }

    pub fn records(&self) -> &[CameraRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut Vec<CameraRecord> {
        &mut self.records
    }

    /// Write the current collection to disk. The transient checking flag is
    /// `#[serde(skip)]` on the record, so it can never survive a reload.
    pub fn persist(&self) -> Result<(), StoreError> {
        write_roster(&self.path, &self.records)
    }

    pub fn replace(&mut self, records: Vec<CameraRecord>) -> Result<(), StoreError> {
        self.records = records;
        self.persist()
    }
}

fn write_roster(path: &Path, records: &[CameraRecord]) -> Result<(), StoreError> {
    let body = serde_json::to_vec_pretty(records)?;
    fs::write(path, body)?;
    Ok(())
}

fn seed_records() -> Vec<CameraRecord> {
    let now = now_ms();
    vec![
        CameraRecord {
            id: "cam-seed-1".to_string(),
            name: "Central crossroads".to_string(),
            ip: "192.168.1.10".to_string(),
            address: "99 Main St, ward 9".to_string(),
            lat: 11.9472,
            lng: 108.4593,
            status: CameraStatus::Online,
            video_url: None,
            updated_at: now,
            last_check_at: Some(now),
            is_checking: false,
            deleted: false,
            uptime_history: Vec::new(),
        },
        CameraRecord {
            id: "cam-seed-2".to_string(),
            name: "Ward office gate".to_string(),
            ip: "192.168.1.11".to_string(),
            address: "Ward office, district center".to_string(),
            lat: 11.9412,
            lng: 108.4583,
            status: CameraStatus::Offline,
            video_url: None,
            updated_at: now,
            last_check_at: Some(now),
            is_checking: false,
            deleted: false,
            uptime_history: Vec::new(),
        },
    ]
}
