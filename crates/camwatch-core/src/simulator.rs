use tracing::{debug, info};

use crate::config::SimulatorConfig;
use crate::gateway::{Gateway, GatewayError};
use crate::probe::StatusProbe;
use crate::record::CameraStatus;

/// What one liveness cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    pub checked: usize,
    pub toggled: usize,
    pub skipped: usize,
}

/// Walks the active roster once per invocation, probing each record in turn
/// and writing the result back through the gateway.
///
/// The walk is deliberately sequential so per-record completions spread out
/// over the cycle instead of landing in one burst. Each record is re-read
/// from the gateway immediately before its probe: an edit or delete issued
/// mid-cycle applies against the next record, never a stale copy captured at
/// cycle start.
pub struct Simulator<P: StatusProbe> {
    probe: P,
    config: SimulatorConfig,
}

impl<P: StatusProbe> Simulator<P> {
    pub fn new(probe: P, config: SimulatorConfig) -> Self {
        Self { probe, config }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Open a cycle: mark every active record as checking and hand back the
    /// worklist of ids. An empty active roster yields an empty worklist and
    /// marks nothing.
    pub fn start_cycle(&self, gateway: &mut Gateway) -> Vec<String> {
        let active_ids: Vec<String> = gateway
            .snapshot()
            .iter()
            .filter(|r| r.is_active())
            .map(|r| r.id.clone())
            .collect();

        if active_ids.is_empty() {
            debug!("no active cameras, skipping liveness cycle");
            return active_ids;
        }

        gateway.mark_checking(&active_ids);
        active_ids
    }

    /// Probe one worklist entry against its latest state and write the result
    /// back. Returns whether the status toggled, or `None` when the record
    /// vanished or was tombstoned since the cycle started. Callers stepping a
    /// cycle (the dashboard) see each record's completion land before the
    /// next probe begins.
    pub async fn check_one(
        &mut self,
        gateway: &mut Gateway,
        id: &str,
    ) -> Result<Option<bool>, GatewayError> {
        // Latest state, not the cycle-start snapshot.
        let Some(current) = gateway.find(id) else {
            return Ok(None);
        };
        if current.deleted {
            return Ok(None);
        }

        let before = current.status;
        let status = self.probe.check_one(&current).await;
        gateway.record_check(id, status, self.config.history_cap)?;

        let toggled = status != before;
        if toggled {
            info!(%id, from = before.as_str(), to = status.as_str(), "camera status changed");
        }
        Ok(Some(toggled))
    }

    pub async fn run_cycle(&mut self, gateway: &mut Gateway) -> Result<CycleOutcome, GatewayError> {
        let active_ids = self.start_cycle(gateway);
        if active_ids.is_empty() {
            return Ok(CycleOutcome::default());
        }

        let mut outcome = CycleOutcome::default();
        for id in &active_ids {
            match self.check_one(gateway, id).await? {
                Some(toggled) => {
                    outcome.checked += 1;
                    if toggled {
                        outcome.toggled += 1;
                    }
                }
                None => outcome.skipped += 1,
            }
        }

        debug!(
            checked = outcome.checked,
            toggled = outcome.toggled,
            skipped = outcome.skipped,
            "liveness cycle complete"
        );
        Ok(outcome)
    }
}

/// Always-resolving probe with a fixed answer, for wiring tests.
#[cfg(test)]
pub(crate) struct FixedProbe(pub CameraStatus);

#[cfg(test)]
#[async_trait::async_trait]
impl StatusProbe for FixedProbe {
    async fn check_one(&mut self, _record: &crate::record::CameraRecord) -> CameraStatus {
        self.0
    }
}
