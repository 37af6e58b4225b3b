pub mod dynamics;
pub mod gnc;
pub mod io;
pub mod logger;
pub mod physics;
pub mod propulsion;
pub mod sim;
pub mod vehicle;

// Flat re-exports of the types most callers need
pub mod types {
    pub use crate::dynamics::state::{RigidBodyState, G0};
    pub use crate::gnc::{AutopilotMode, FlightCommand, SasMode, ThrottleReason};
    pub use crate::physics::gravity::CelestialBody;
    pub use crate::propulsion::{EngineStatus, RcsGroup};
    pub use crate::sim::{SimConfig, Spacecraft, TickInput, TickOutput};
    pub use crate::vehicle::{ConfigError, SpacecraftConfig};
}
