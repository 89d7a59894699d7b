use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time::sleep;

use crate::config::SimulatorConfig;
use crate::record::{CameraRecord, CameraStatus};

/// Seam between the liveness scheduler and whatever decides a camera's
/// status. The shipped implementation simulates the check; a real
/// reachability prober slots in here without touching scheduler or store.
#[async_trait]
pub trait StatusProbe: Send {
    async fn check_one(&mut self, record: &CameraRecord) -> CameraStatus;
}

/// Randomized stand-in for a network probe: waits a jittered latency, then
/// flips the status with a small probability, otherwise keeps it.
pub struct SimulatedProbe {
    delay_min: Duration,
    delay_max: Duration,
    toggle_probability: f64,
}

impl SimulatedProbe {
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            delay_min: config.delay_min,
            delay_max: config.delay_max,
            toggle_probability: config.toggle_probability.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl StatusProbe for SimulatedProbe {
    async fn check_one(&mut self, record: &CameraRecord) -> CameraStatus {
        let min_ms = self.delay_min.as_millis() as u64;
        let max_ms = self.delay_max.as_millis() as u64;
        let (delay_ms, toggle) = {
            let mut rng = rand::thread_rng();
            let delay_ms = if max_ms > min_ms {
                rng.gen_range(min_ms..=max_ms)
            } else {
                min_ms
            };
            (delay_ms, rng.gen_bool(self.toggle_probability))
        };

        sleep(Duration::from_millis(delay_ms)).await;

        if toggle {
            record.status.toggled()
        } else {
            record.status
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: CameraStatus) -> CameraRecord {
        CameraRecord {
            id: "p".to_string(),
            name: "probe target".to_string(),
            ip: String::new(),
            address: String::new(),
            lat: 0.0,
            lng: 0.0,
            status,
            video_url: None,
            updated_at: 0,
            last_check_at: None,
            is_checking: false,
            deleted: false,
            uptime_history: Vec::new(),
        }
    }

    fn instant_probe(probability: f64) -> SimulatedProbe {
        SimulatedProbe {
            delay_min: Duration::ZERO,
            delay_max: Duration::ZERO,
            toggle_probability: probability,
        }
    }

    #[tokio::test]
    async fn zero_probability_never_toggles() {
        let mut probe = instant_probe(0.0);
        let rec = record(CameraStatus::Online);
        for _ in 0..50 {
            assert_eq!(probe.check_one(&rec).await, CameraStatus::Online);
        }
    }

    #[tokio::test]
    async fn certain_probability_always_toggles() {
        let mut probe = instant_probe(1.0);
        let rec = record(CameraStatus::Offline);
        assert_eq!(probe.check_one(&rec).await, CameraStatus::Online);
    }
}
