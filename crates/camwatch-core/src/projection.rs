use serde::Serialize;

use crate::record::{CameraRecord, CameraStatus};

/// Active view: everything that is not a tombstone.
pub fn active(records: &[CameraRecord]) -> impl Iterator<Item = &CameraRecord> {
    records.iter().filter(|r| r.is_active())
}

/// Search + status filter over the active view.
///
/// A record matches when the term appears in the name or address
/// (case-insensitive) or verbatim in the ip, and the status filter (if any)
/// matches exactly. An empty term matches everything.
pub fn filter<'a>(
    records: &'a [CameraRecord],
    term: &str,
    status: Option<CameraStatus>,
) -> Vec<&'a CameraRecord> {
    let needle = term.to_lowercase();
    active(records)
        .filter(|r| {
            let matches_term = needle.is_empty()
                || r.name.to_lowercase().contains(&needle)
                || r.address.to_lowercase().contains(&needle)
                || r.ip.contains(term);
            let matches_status = status.map_or(true, |s| r.status == s);
            matches_term && matches_status
        })
        .collect()
}

/// Aggregate counts over the active view. Always recomputed, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RosterStats {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
}

pub fn stats(records: &[CameraRecord]) -> RosterStats {
    let mut out = RosterStats {
        total: 0,
        online: 0,
        offline: 0,
    };
    for rec in active(records) {
        out.total += 1;
        match rec.status {
            CameraStatus::Online => out.online += 1,
            CameraStatus::Offline => out.offline += 1,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, address: &str, status: CameraStatus) -> CameraRecord {
        CameraRecord {
            id: id.to_string(),
            name: name.to_string(),
            ip: "192.168.1.20".to_string(),
            address: address.to_string(),
            lat: 0.0,
            lng: 0.0,
            status,
            video_url: None,
            updated_at: 1,
            last_check_at: None,
            is_checking: false,
            deleted: false,
            uptime_history: Vec::new(),
        }
    }

    fn roster() -> Vec<CameraRecord> {
        let mut lam_off = record("2", "Lam Vien gate", "ward center", CameraStatus::Offline);
        lam_off.status = CameraStatus::Offline;
        let mut gone = record("4", "Lam market", "old quarter", CameraStatus::Online);
        gone.deleted = true;
        vec![
            record("1", "Central square", "12 Lam Son street", CameraStatus::Online),
            lam_off,
            record("3", "River bridge", "east bank", CameraStatus::Online),
            gone,
        ]
    }

    #[test]
    fn filter_is_case_insensitive_and_honors_status() {
        let records = roster();

        let hits = filter(&records, "lam", Some(CameraStatus::Online));
        let ids: Vec<&str> = hits.iter().map(|r| r.id.as_str()).collect();

        // "Lam Vien gate" is offline, "Lam market" is deleted; only the
        // address match on record 1 survives both conditions.
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn filter_matches_ip_verbatim() {
        let records = roster();
        let hits = filter(&records, "192.168.1.2", None);
        assert_eq!(hits.len(), 3, "every active record shares the ip prefix");
    }

    #[test]
    fn empty_term_returns_the_whole_active_view() {
        let records = roster();
        assert_eq!(filter(&records, "", None).len(), 3);
    }

    #[test]
    fn tombstones_never_reach_any_projection() {
        let records = roster();
        assert!(active(&records).all(|r| r.id != "4"));
        assert!(filter(&records, "market", None).is_empty());
    }

    #[test]
    fn stats_count_only_active_records() {
        let records = roster();
        let s = stats(&records);
        assert_eq!(
            s,
            RosterStats {
                total: 3,
                online: 2,
                offline: 1
            }
        );
    }
}
