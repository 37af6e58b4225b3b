pub mod event;
pub mod resources;
pub mod runner;
pub mod spacecraft;
pub mod tick;

pub use event::{EventDetector, EventKind, EventLog, SimEvent};
pub use resources::{FixedPowerBudget, FuelTank, HeatLedger, PowerBudget, SimpleTank, ThermalSink};
pub use runner::{simulate, simulate_with, SimConfig};
pub use spacecraft::Spacecraft;
pub use tick::{TickInput, TickOutput};
