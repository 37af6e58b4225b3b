use super::flight_control::FlightCommand;
use crate::sim::tick::TickInput;

/// Trait for flight controllers.
///
/// Implement this to plug a custom controller into the spacecraft master
/// loop in place of the built-in flight control system.
pub trait Controller {
    /// Compute RCS/throttle/gimbal commands from the previous tick's state.
    fn control(&mut self, input: &TickInput, dt: f64) -> FlightCommand;

    /// Reset controller internal state (e.g., PID integrators).
    fn reset(&mut self) {}

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}
