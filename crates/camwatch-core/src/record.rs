use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Connectivity state of a monitored camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraStatus {
    Online,
    Offline,
}

impl CameraStatus {
    pub fn toggled(self) -> Self {
        match self {
            Self::Online => Self::Offline,
            Self::Offline => Self::Online,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

/// One point of the per-record status trail. Immutable once appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySample {
    pub timestamp: i64,
    pub status: CameraStatus,
}

/// A monitored camera. Field names on the wire stay camelCase so the
/// persisted document and the remote snapshot share one format.
///
/// `updated_at` is the edit clock (stamped by the gateway on every
/// create/update/soft-delete, merge tie-breaker); `last_check_at` is the
/// observation clock (stamped by the liveness loop). `is_checking` is a
/// presentation-only flag and never reaches disk or the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraRecord {
    pub id: String,
    pub name: String,
    pub ip: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub status: CameraStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_at: Option<i64>,
    #[serde(skip)]
    pub is_checking: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uptime_history: Vec<HistorySample>,
}

impl CameraRecord {
    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    /// Append a status sample, evicting the oldest entries beyond `cap`.
    pub fn push_sample(&mut self, sample: HistorySample, cap: usize) {
        self.uptime_history.push(sample);
        if self.uptime_history.len() > cap {
            let excess = self.uptime_history.len() - cap;
            self.uptime_history.drain(0..excess);
        }
    }

    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.updated_at).single()
    }

    pub fn last_check_at_utc(&self) -> Option<DateTime<Utc>> {
        self.last_check_at
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

/// Current wall-clock time in epoch milliseconds, the unit every record
/// timestamp uses.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CameraRecord {
        CameraRecord {
            id: "cam-1".to_string(),
            name: "Gate".to_string(),
            ip: "192.168.1.10".to_string(),
            address: "North gate".to_string(),
            lat: 11.94,
            lng: 108.45,
            status: CameraStatus::Online,
            video_url: None,
            updated_at: 1_000,
            last_check_at: None,
            is_checking: false,
            deleted: false,
            uptime_history: Vec::new(),
        }
    }

    #[test]
    fn checking_flag_never_serializes() {
        let mut rec = record();
        rec.is_checking = true;

        let json = serde_json::to_string(&rec).expect("serialize");
        assert!(!json.contains("isChecking"));

        let back: CameraRecord = serde_json::from_str(&json).expect("deserialize");
        assert!(!back.is_checking);
    }

    #[test]
    fn wire_format_is_camel_case() {
        let mut rec = record();
        rec.last_check_at = Some(2_000);
        rec.video_url = Some("rtsp://example/1".to_string());

        let json = serde_json::to_string(&rec).expect("serialize");
        assert!(json.contains("\"updatedAt\":1000"));
        assert!(json.contains("\"lastCheckAt\":2000"));
        assert!(json.contains("\"videoUrl\""));
        assert!(json.contains("\"status\":\"online\""));
        // Absent tombstone and empty history stay off the wire.
        assert!(!json.contains("deleted"));
        assert!(!json.contains("uptimeHistory"));
    }

    #[test]
    fn history_trims_oldest_first() {
        let mut rec = record();
        for i in 0..10 {
            rec.push_sample(
                HistorySample {
                    timestamp: i,
                    status: CameraStatus::Online,
                },
                4,
            );
        }

        assert_eq!(rec.uptime_history.len(), 4);
        let stamps: Vec<i64> = rec.uptime_history.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![6, 7, 8, 9]);
    }
}
