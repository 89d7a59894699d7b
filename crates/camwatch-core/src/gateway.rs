use std::path::Path;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::projection;
use crate::record::{now_ms, CameraRecord, CameraStatus, HistorySample};
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("camera name is required")]
    MissingName,
    #[error("no camera with id {0}")]
    UnknownRecord(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Draft for a gateway-created record; the gateway assigns the id and stamps
/// the timestamps.
#[derive(Debug, Clone)]
pub struct NewCamera {
    pub name: String,
    pub ip: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub status: CameraStatus,
    pub video_url: Option<String>,
}

/// The single write path over the record store.
///
/// Every create/update/soft-delete stamps a strictly increasing `updated_at`
/// and persists before returning, so no in-memory state is observable without
/// its persisted counterpart. Liveness checks go through `mark_checking` /
/// `record_check`, which touch only the observation fields.
pub struct Gateway {
    store: RecordStore,
}

impl Gateway {
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, GatewayError> {
        Ok(Self {
            store: RecordStore::open(data_dir)?,
        })
    }

    pub fn snapshot(&self) -> Vec<CameraRecord> {
        self.store.snapshot()
    }

    pub fn find(&self, id: &str) -> Option<CameraRecord> {
        self.store.records().iter().find(|r| r.id == id).cloned()
    }

    pub fn create(&mut self, draft: NewCamera) -> Result<CameraRecord, GatewayError> {
        if draft.name.trim().is_empty() {
            return Err(GatewayError::MissingName);
        }

        let now = now_ms();
        let record = CameraRecord {
            id: format!("cam-{}", Uuid::new_v4()),
            name: draft.name,
            ip: draft.ip,
            address: draft.address,
            lat: draft.lat,
            lng: draft.lng,
            status: draft.status,
            video_url: draft.video_url,
            updated_at: now,
            last_check_at: Some(now),
            is_checking: false,
            deleted: false,
            uptime_history: Vec::new(),
        };

        debug!(id = %record.id, name = %record.name, "creating camera");
        self.store.records_mut().push(record.clone());
        self.store.persist()?;
        Ok(record)
    }

    /// Pin-mode creation: a map click hands over coordinates, everything else
    /// is defaulted for the user to edit afterwards.
    pub fn pin(&mut self, lat: f64, lng: f64) -> Result<CameraRecord, GatewayError> {
        let seq = projection::active(self.store.records()).count() + 1;
        self.create(NewCamera {
            name: format!("New camera #{seq}"),
            ip: "192.168.1.xxx".to_string(),
            address: format!("Installed at (lat: {lat:.5}, lng: {lng:.5})"),
            lat,
            lng,
            status: CameraStatus::Online,
            video_url: None,
        })
    }

    /// Whole-record replacement keyed by `edited.id`, the way a submitted edit
    /// form applies. Identity and history are preserved; `updated_at` is
    /// re-stamped.
    pub fn update(&mut self, edited: CameraRecord) -> Result<CameraRecord, GatewayError> {
        if edited.name.trim().is_empty() {
            return Err(GatewayError::MissingName);
        }

        let slot = self
            .store
            .records_mut()
            .iter_mut()
            .find(|r| r.id == edited.id)
            .ok_or_else(|| GatewayError::UnknownRecord(edited.id.clone()))?;

        let stamp = next_stamp(slot.updated_at);
        *slot = CameraRecord {
            id: slot.id.clone(),
            updated_at: stamp,
            uptime_history: slot.uptime_history.clone(),
            is_checking: false,
            ..edited
        };
        let updated = slot.clone();

        self.store.persist()?;
        Ok(updated)
    }

    /// Flip the tombstone flag. The record stays in the store so the deletion
    /// can propagate through sync; deleting twice only moves `updated_at`.
    pub fn soft_delete(&mut self, id: &str) -> Result<CameraRecord, GatewayError> {
        let slot = self
            .store
            .records_mut()
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| GatewayError::UnknownRecord(id.to_string()))?;

        slot.deleted = true;
        slot.updated_at = next_stamp(slot.updated_at);
        let removed = slot.clone();

        debug!(id, "soft-deleted camera");
        self.store.persist()?;
        Ok(removed)
    }

    /// Transient cycle-start marker. Visible to any live view, not a mutation:
    /// nothing is stamped and nothing is persisted.
    pub fn mark_checking(&mut self, ids: &[String]) {
        for rec in self.store.records_mut() {
            if ids.iter().any(|id| *id == rec.id) {
                rec.is_checking = true;
            }
        }
    }

    /// Apply one finished liveness check: new status, fresh `last_check_at`,
    /// one more history sample (trimmed to `history_cap`), checking flag
    /// cleared. `updated_at` is left alone so a simulated flip can never beat
    /// a real edit during merge.
    pub fn record_check(
        &mut self,
        id: &str,
        status: CameraStatus,
        history_cap: usize,
    ) -> Result<CameraRecord, GatewayError> {
        let slot = self
            .store
            .records_mut()
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| GatewayError::UnknownRecord(id.to_string()))?;

        let now = now_ms();
        slot.status = status;
        slot.last_check_at = Some(now);
        slot.is_checking = false;
        slot.push_sample(
            HistorySample {
                timestamp: now,
                status,
            },
            history_cap,
        );
        let checked = slot.clone();

        self.store.persist()?;
        Ok(checked)
    }

    /// Sync write-back: swap in the merged collection and persist it.
    pub fn replace_all(&mut self, records: Vec<CameraRecord>) -> Result<(), StoreError> {
        self.store.replace(records)
    }
}

/// Strictly-increasing stamp even when two mutations land within the same
/// millisecond.
fn next_stamp(prev: i64) -> i64 {
    now_ms().max(prev + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn make_temp_dir(name: &str) -> PathBuf {
        let mut path = env::temp_dir();
        let uniq = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("unix epoch")
            .as_nanos();
        path.push(format!("camwatch-gw-{name}-{uniq}"));
        path
    }

    fn draft(name: &str) -> NewCamera {
        NewCamera {
            name: name.to_string(),
            ip: "10.0.0.1".to_string(),
            address: "Test street".to_string(),
            lat: 11.0,
            lng: 108.0,
            status: CameraStatus::Online,
            video_url: None,
        }
    }

    #[test]
    fn create_stamps_both_clocks() {
        let dir = make_temp_dir("create");
        let mut gw = Gateway::open(&dir).expect("open");

        let before = now_ms();
        let rec = gw.create(draft("Alley cam")).expect("create");
        let after = now_ms();

        assert!(rec.updated_at >= before && rec.updated_at <= after);
        assert_eq!(rec.last_check_at, Some(rec.updated_at));
        assert!(rec.uptime_history.is_empty());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn blank_name_is_rejected_before_the_store() {
        let dir = make_temp_dir("blank");
        let mut gw = Gateway::open(&dir).expect("open");
        let count = gw.snapshot().len();

        let err = gw.create(draft("   ")).expect_err("should reject");
        assert!(matches!(err, GatewayError::MissingName));
        assert_eq!(gw.snapshot().len(), count);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn edit_strictly_increases_updated_at() {
        let dir = make_temp_dir("edit");
        let mut gw = Gateway::open(&dir).expect("open");

        let rec = gw.create(draft("Gate cam")).expect("create");
        let mut edited = rec.clone();
        edited.name = "Gate cam (renamed)".to_string();

        // Immediate re-save: the stamp must still move forward even inside
        // the same millisecond.
        let saved = gw.update(edited).expect("update");
        assert!(saved.updated_at > rec.updated_at);

        let mut twice = saved.clone();
        twice.address = "Moved".to_string();
        let saved2 = gw.update(twice).expect("update again");
        assert!(saved2.updated_at > saved.updated_at);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn update_cannot_change_identity() {
        let dir = make_temp_dir("identity");
        let mut gw = Gateway::open(&dir).expect("open");

        let rec = gw.create(draft("Fixed")).expect("create");
        let mut edited = rec.clone();
        edited.name = "Renamed".to_string();
        let saved = gw.update(edited).expect("update");

        assert_eq!(saved.id, rec.id);
        assert_eq!(gw.snapshot().iter().filter(|r| r.id == rec.id).count(), 1);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn soft_delete_is_idempotent_and_keeps_the_record() {
        let dir = make_temp_dir("delete");
        let mut gw = Gateway::open(&dir).expect("open");

        let rec = gw.create(draft("Doomed")).expect("create");
        let total = gw.snapshot().len();

        let first = gw.soft_delete(&rec.id).expect("delete");
        assert!(first.deleted);
        assert_eq!(gw.snapshot().len(), total, "tombstone stays in the store");

        let second = gw.soft_delete(&rec.id).expect("delete again");
        assert!(second.deleted);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(gw.snapshot().len(), total);

        let snapshot = gw.snapshot();
        assert!(projection::active(&snapshot).all(|r| r.id != rec.id));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn pin_uses_exact_coordinates_and_defaults_online() {
        let dir = make_temp_dir("pin");
        let mut gw = Gateway::open(&dir).expect("open");

        let rec = gw.pin(11.9, 108.4).expect("pin");
        assert_eq!(rec.lat, 11.9);
        assert_eq!(rec.lng, 108.4);
        assert_eq!(rec.status, CameraStatus::Online);
        assert!(rec.name.starts_with("New camera #"));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn mark_checking_is_transient_only() {
        let dir = make_temp_dir("checking");
        let mut gw = Gateway::open(&dir).expect("open");

        let ids: Vec<String> = gw.snapshot().iter().map(|r| r.id.clone()).collect();
        gw.mark_checking(&ids);
        assert!(gw.snapshot().iter().all(|r| r.is_checking));

        // Nothing was persisted and nothing was stamped: a fresh open sees
        // clean flags.
        let reopened = Gateway::open(&dir).expect("reopen");
        assert!(reopened.snapshot().iter().all(|r| !r.is_checking));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn record_check_touches_only_observation_fields() {
        let dir = make_temp_dir("check");
        let mut gw = Gateway::open(&dir).expect("open");

        let rec = gw.create(draft("Watched")).expect("create");
        let checked = gw
            .record_check(&rec.id, CameraStatus::Offline, 8)
            .expect("check");

        assert_eq!(checked.status, CameraStatus::Offline);
        assert_eq!(checked.updated_at, rec.updated_at, "edit clock untouched");
        assert!(checked.last_check_at.expect("stamped") >= rec.last_check_at.expect("init"));
        assert_eq!(checked.uptime_history.len(), 1);

        let _ = fs::remove_dir_all(dir);
    }
}
