//! Simulation driver: the outer run FSM, the fixed-step clock, the
//! per-step timing ledger, and the two queues (`StagingBuffer` for inbound
//! trigger JSON, `DriverControl` for outbound run-control signals) that
//! let triggers and out-of-band callers reach into a run already in
//! progress.

pub mod clock;
pub mod control;
pub mod driver;
pub mod staging;
pub mod timing;

pub use clock::Clock;
pub use control::{DriverControl, DriverSignal};
pub use driver::{DriverState, SimulationDriver};
pub use staging::StagingBuffer;
pub use timing::{SimulationPerformance, TimingSamples};
