use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::sim::tick::TickInput;

// ---------------------------------------------------------------------------
// Gimbal autopilot: thrust vectoring against horizontal drift
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GimbalCommand {
    pub pitch_deg: f64,
    pub yaw_deg: f64,
}

impl GimbalCommand {
    pub fn centered() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GimbalAutopilotConfig {
    /// Below this thrust (N) the engine cannot correct drift; gimbal is centred.
    pub min_thrust: f64,
    /// Horizontal speeds below this (m/s) are treated as zero drift.
    pub min_horizontal_speed: f64,
}

impl Default for GimbalAutopilotConfig {
    fn default() -> Self {
        Self { min_thrust: 100.0, min_horizontal_speed: 0.01 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GimbalAutopilot {
    pub config: GimbalAutopilotConfig,
    enabled: bool,
}

impl GimbalAutopilot {
    pub fn new(config: GimbalAutopilotConfig) -> Self {
        Self { config, enabled: false }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// None while disabled: the engine keeps whatever gimbal it was given.
    pub fn update(&self, input: &TickInput) -> Option<GimbalCommand> {
        if !self.enabled {
            return None;
        }
        if input.thrust < self.config.min_thrust || input.mass <= 0.0 {
            return Some(GimbalCommand::centered());
        }

        let drift = input.horizontal_velocity_body();
        let lateral = Vector2::new(drift.x, drift.y);
        let speed = lateral.norm();
        if speed < self.config.min_horizontal_speed {
            return Some(GimbalCommand::centered());
        }

        let thrust_accel = input.thrust / input.mass;
        let max = input.max_gimbal_deg;
        let angle = speed.atan2(thrust_accel).to_degrees().clamp(0.0, max);

        // Deflect so the lateral thrust component opposes the drift
        Some(GimbalCommand {
            pitch_deg: -angle * lateral.y / speed,
            yaw_deg: -angle * lateral.x / speed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn input(vx: f64, vy: f64, thrust: f64) -> TickInput {
        TickInput {
            velocity: Vector3::new(vx, vy, -5.0),
            mass: 1000.0,
            thrust,
            max_thrust: 15_000.0,
            max_gimbal_deg: 6.0,
            ..TickInput::default()
        }
    }

    #[test]
    fn disabled_issues_no_command() {
        let gimbal = GimbalAutopilot::default();
        assert!(gimbal.update(&input(3.0, 0.0, 10_000.0)).is_none());
    }

    #[test]
    fn low_thrust_centres_gimbal() {
        let mut gimbal = GimbalAutopilot::default();
        gimbal.set_enabled(true);
        assert_eq!(gimbal.update(&input(3.0, 0.0, 10.0)), Some(GimbalCommand::centered()));
    }

    #[test]
    fn no_drift_centres_gimbal() {
        let mut gimbal = GimbalAutopilot::default();
        gimbal.set_enabled(true);
        assert_eq!(gimbal.update(&input(0.0, 0.0, 10_000.0)), Some(GimbalCommand::centered()));
    }

    #[test]
    fn deflection_opposes_drift() {
        let mut gimbal = GimbalAutopilot::default();
        gimbal.set_enabled(true);
        // 1 m/s drift against 10 m/s^2 thrust accel -> atan2(1, 10) ~= 5.71 deg
        let cmd = gimbal.update(&input(1.0, 0.0, 10_000.0)).unwrap();
        assert!((cmd.yaw_deg + 1.0_f64.atan2(10.0).to_degrees()).abs() < 1e-9);
        assert!(cmd.pitch_deg.abs() < 1e-12);

        let cmd = gimbal.update(&input(0.0, -1.0, 10_000.0)).unwrap();
        assert!(cmd.pitch_deg > 0.0);
        assert!(cmd.yaw_deg.abs() < 1e-12);
    }

    #[test]
    fn deflection_clamped_to_engine_limit() {
        let mut gimbal = GimbalAutopilot::default();
        gimbal.set_enabled(true);
        let cmd = gimbal.update(&input(-30.0, 40.0, 2_000.0)).unwrap();
        let total = cmd.pitch_deg.hypot(cmd.yaw_deg);
        assert!((total - 6.0).abs() < 1e-9);
        assert!(cmd.yaw_deg > 0.0 && cmd.pitch_deg < 0.0);
    }
}
