pub mod analysis;
pub mod config;
pub mod gateway;
pub mod geo;
pub mod merge;
pub mod probe;
pub mod projection;
pub mod record;
pub mod simulator;
pub mod store;
pub mod sync;

pub use config::SimulatorConfig;
pub use gateway::{Gateway, GatewayError, NewCamera};
pub use merge::merge;
pub use probe::{SimulatedProbe, StatusProbe};
pub use projection::{filter, stats, RosterStats};
pub use record::{CameraRecord, CameraStatus, HistorySample};
pub use simulator::{CycleOutcome, Simulator};
pub use store::{RecordStore, StoreError};
pub use sync::{sync_once, GistStore, RemoteStore, SyncError, SyncReport, SyncSettings};
