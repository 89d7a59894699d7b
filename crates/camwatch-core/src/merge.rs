use std::collections::HashMap;

use crate::record::CameraRecord;

/// Reconcile the local collection with a remote snapshot, last-write-wins per
/// record id.
///
/// Records unique to either side are kept as-is (unsynced local creation /
/// creation on another device). For a shared id the copy with the greater
/// `updated_at` wins; on an exact tie the remote copy is taken, since the
/// remote snapshot is treated as authoritative right after a fetch.
/// Tombstones are ordinary records here, so a deletion with a fresh stamp
/// beats a stale edit and a fresher edit beats a stale deletion.
///
/// Output order: local order first (with winners swapped in place), then
/// remote-only records in remote order, so the roster does not reshuffle on
/// every sync.
pub fn merge(local: &[CameraRecord], remote: &[CameraRecord]) -> Vec<CameraRecord> {
    let remote_by_id: HashMap<&str, &CameraRecord> =
        remote.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut merged: Vec<CameraRecord> = local
        .iter()
        .map(|l| match remote_by_id.get(l.id.as_str()) {
            Some(r) if r.updated_at >= l.updated_at => (*r).clone(),
            _ => l.clone(),
        })
        .collect();

    for r in remote {
        if !local.iter().any(|l| l.id == r.id) {
            merged.push(r.clone());
        }
    }

    merged
}
