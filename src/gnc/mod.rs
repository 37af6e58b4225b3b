pub mod autopilot;
pub mod controller;
pub mod flight_control;
pub mod gimbal;
pub mod pid;
pub mod sas;

pub use autopilot::{suicide_burn_plan, Autopilot, AutopilotConfig, AutopilotMode, SuicideBurnPlan, ThrottleCommand, ThrottleReason};
pub use controller::Controller;
pub use flight_control::{FlightCommand, FlightControlConfig, FlightControlSystem, ATTITUDE_GROUPS, DEFAULT_RCS_THRESHOLD};
pub use gimbal::{GimbalAutopilot, GimbalAutopilotConfig, GimbalCommand};
pub use pid::{Pid, PidGains};
pub use sas::{SasConfig, SasMode, StabilityAugmentation};
