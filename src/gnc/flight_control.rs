use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::autopilot::{Autopilot, AutopilotConfig, AutopilotMode, ThrottleCommand};
use super::gimbal::{GimbalAutopilot, GimbalAutopilotConfig, GimbalCommand};
use super::sas::{SasConfig, SasMode, StabilityAugmentation};
use super::Controller;
use crate::propulsion::RcsGroup;
use crate::sim::tick::TickInput;

/// Axis command magnitude above which the matching RCS group fires.
pub const DEFAULT_RCS_THRESHOLD: f64 = 0.1;

// ---------------------------------------------------------------------------
// Flight command: recomputed every tick, never stored
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightCommand {
    pub sas_mode: SasMode,
    pub autopilot_mode: AutopilotMode,
    /// Normalized axis commands: pitch (X), yaw (Y), roll (Z).
    pub rcs: Vector3<f64>,
    pub throttle: Option<ThrottleCommand>,
    pub gimbal: Option<GimbalCommand>,
}

impl Default for FlightCommand {
    fn default() -> Self {
        Self {
            sas_mode: SasMode::Off,
            autopilot_mode: AutopilotMode::Off,
            rcs: Vector3::zeros(),
            throttle: None,
            gimbal: None,
        }
    }
}

impl FlightCommand {
    /// Bang-bang mapping of axis commands onto attitude groups.
    pub fn rcs_groups(&self, threshold: f64) -> Vec<RcsGroup> {
        let axes = [
            (RcsGroup::PitchUp, RcsGroup::PitchDown),
            (RcsGroup::YawLeft, RcsGroup::YawRight),
            (RcsGroup::RollCcw, RcsGroup::RollCw),
        ];
        axes.iter()
            .enumerate()
            .filter_map(|(axis, &(positive, negative))| {
                let c = self.rcs[axis];
                if c > threshold {
                    Some(positive)
                } else if c < -threshold {
                    Some(negative)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Whether the command drives the RCS at all (SAS engaged).
    pub fn controls_rcs(&self) -> bool {
        self.sas_mode != SasMode::Off
    }
}

/// Attitude groups the SAS owns; translation groups are left to the operator.
pub const ATTITUDE_GROUPS: [RcsGroup; 6] = [
    RcsGroup::PitchUp,
    RcsGroup::PitchDown,
    RcsGroup::YawLeft,
    RcsGroup::YawRight,
    RcsGroup::RollCw,
    RcsGroup::RollCcw,
];

// ---------------------------------------------------------------------------
// Flight Control System: SAS + autopilot + gimbal autopilot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightControlConfig {
    pub sas: SasConfig,
    pub autopilot: AutopilotConfig,
    pub gimbal: GimbalAutopilotConfig,
}

#[derive(Debug, Clone, Default)]
pub struct FlightControlSystem {
    pub sas: StabilityAugmentation,
    pub autopilot: Autopilot,
    pub gimbal: GimbalAutopilot,
}

impl FlightControlSystem {
    pub fn new(config: FlightControlConfig) -> Self {
        Self {
            sas: StabilityAugmentation::new(config.sas),
            autopilot: Autopilot::new(config.autopilot),
            gimbal: GimbalAutopilot::new(config.gimbal),
        }
    }

    pub fn set_sas_mode(&mut self, mode: SasMode) {
        self.sas.set_mode(mode);
    }

    pub fn set_autopilot_mode(&mut self, mode: AutopilotMode) {
        self.autopilot.set_mode(mode);
    }

    pub fn set_target_altitude(&mut self, altitude: f64) {
        self.autopilot.set_target_altitude(altitude);
    }

    pub fn set_target_vertical_speed(&mut self, speed: f64) {
        self.autopilot.set_target_vertical_speed(speed);
    }

    pub fn set_gimbal_autopilot(&mut self, enabled: bool) {
        self.gimbal.set_enabled(enabled);
    }

    pub fn sas_mode(&self) -> SasMode {
        self.sas.mode()
    }

    pub fn autopilot_mode(&self) -> AutopilotMode {
        self.autopilot.mode()
    }

    pub fn update(&mut self, input: &TickInput, dt: f64) -> FlightCommand {
        let rcs = self.sas.update(input, dt);
        let autopilot_mode = self.autopilot.mode();
        let throttle = match autopilot_mode {
            AutopilotMode::Off => None,
            _ => Some(self.autopilot.update(input, dt)),
        };
        FlightCommand {
            sas_mode: self.sas.mode(),
            autopilot_mode,
            rcs,
            throttle,
            gimbal: self.gimbal.update(input),
        }
    }
}

impl Controller for FlightControlSystem {
    fn control(&mut self, input: &TickInput, dt: f64) -> FlightCommand {
        self.update(input, dt)
    }

    fn reset(&mut self) {
        self.sas.reset();
        self.autopilot.reset();
    }

    fn name(&self) -> &str {
        "FlightControlSystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_system_commands_nothing() {
        let mut fcs = FlightControlSystem::default();
        let cmd = fcs.update(&TickInput::default(), 0.1);
        assert_eq!(cmd, FlightCommand::default());
        assert!(!cmd.controls_rcs());
    }

    #[test]
    fn rcs_groups_follow_axis_signs() {
        let cmd = FlightCommand { rcs: Vector3::new(0.5, -0.5, 0.05), ..FlightCommand::default() };
        assert_eq!(cmd.rcs_groups(0.1), vec![RcsGroup::PitchUp, RcsGroup::YawRight]);

        let cmd = FlightCommand { rcs: Vector3::new(-0.2, 0.2, -0.9), ..FlightCommand::default() };
        assert_eq!(
            cmd.rcs_groups(0.1),
            vec![RcsGroup::PitchDown, RcsGroup::YawLeft, RcsGroup::RollCw]
        );
    }

    #[test]
    fn composes_all_three_controllers() {
        let mut fcs = FlightControlSystem::default();
        fcs.set_sas_mode(SasMode::Stability);
        fcs.set_autopilot_mode(AutopilotMode::Hover);
        fcs.set_gimbal_autopilot(true);

        let input = TickInput {
            velocity: Vector3::new(2.0, 0.0, 0.0),
            angular_velocity: Vector3::new(0.0, 0.0, 0.4),
            mass: 1000.0,
            gravity: 1.62,
            thrust: 5_000.0,
            max_thrust: 15_000.0,
            max_gimbal_deg: 6.0,
            ..TickInput::default()
        };
        let cmd = fcs.update(&input, 0.1);
        assert_eq!(cmd.sas_mode, SasMode::Stability);
        assert!(cmd.rcs.z < 0.0);
        assert!(cmd.throttle.is_some_and(|t| t.throttle > 0.0));
        assert!(cmd.gimbal.is_some_and(|g| g.yaw_deg < 0.0));
        assert!(cmd.rcs_groups(DEFAULT_RCS_THRESHOLD).contains(&RcsGroup::RollCw));
    }

    #[test]
    fn target_setters_reach_autopilot() {
        let mut fcs = FlightControlSystem::default();
        fcs.set_target_altitude(250.0);
        fcs.set_target_vertical_speed(-1.5);
        assert_eq!(fcs.autopilot.target_altitude(), 250.0);
        assert_eq!(fcs.autopilot.target_vertical_speed(), -1.5);
    }

    #[test]
    fn works_through_controller_trait() {
        let mut fcs = FlightControlSystem::default();
        fcs.set_autopilot_mode(AutopilotMode::SuicideBurn);
        let controller: &mut dyn Controller = &mut fcs;
        assert_eq!(controller.name(), "FlightControlSystem");
        let cmd = controller.control(&TickInput::default(), 0.1);
        assert_eq!(cmd.autopilot_mode, AutopilotMode::SuicideBurn);
        controller.reset();
    }
}
