use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Per-record simulated probe latency, drawn uniformly from this range.
    pub delay_min: Duration,
    pub delay_max: Duration,
    /// Chance that one check flips the record's status.
    pub toggle_probability: f64,
    /// Most recent samples kept in each record's uptime trail.
    pub history_cap: usize,
    /// Recurring cycle schedule.
    pub check_interval: Duration,
    /// One-shot delay before the first cycle after startup.
    pub first_check_delay: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            delay_min: Duration::from_millis(300),
            delay_max: Duration::from_millis(600),
            toggle_probability: 0.01,
            history_cap: 24,
            check_interval: Duration::from_secs(60),
            first_check_delay: Duration::from_millis(3500),
        }
    }
}
