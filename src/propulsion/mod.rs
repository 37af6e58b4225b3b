pub mod engine;
pub mod rcs;

pub use engine::{EngineConfig, EngineEvent, EngineStatus, EngineTelemetry, MainEngine, PropellantDraw};
pub use rcs::{RcsCluster, RcsConfig, RcsEvent, RcsGroup, RcsTelemetry, Thruster};
