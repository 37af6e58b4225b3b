use std::f64::consts::PI;

use log::info;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::pid::{Pid, PidGains};
use crate::sim::tick::TickInput;

// ---------------------------------------------------------------------------
// Stability Augmentation System
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SasMode {
    #[default]
    Off,
    Stability,
    AttitudeHold,
    Prograde,
    Retrograde,
    RadialIn,
    RadialOut,
    Normal,
    AntiNormal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SasConfig {
    pub attitude_gains: PidGains,
    pub rate_gains: PidGains,
    pub deadband_rad: f64,
    pub max_authority: f64,
    /// Below this speed/radius a direction-tracking target is undefined.
    pub min_reference: f64,
}

impl Default for SasConfig {
    fn default() -> Self {
        Self {
            attitude_gains: PidGains::new(2.0, 0.05, 0.4, 0.5),
            rate_gains: PidGains::new(3.0, 0.0, 0.1, 0.5),
            deadband_rad: 0.5_f64.to_radians(),
            max_authority: 1.0,
            min_reference: 0.5,
        }
    }
}

/// Per-axis attitude + rate PID pairs. Axis order: pitch (X), yaw (Y), roll (Z).
#[derive(Debug, Clone)]
pub struct StabilityAugmentation {
    pub config: SasConfig,
    mode: SasMode,
    attitude_pids: [Pid; 3],
    rate_pids: [Pid; 3],
    hold_target: Option<UnitQuaternion<f64>>,
}

impl StabilityAugmentation {
    pub fn new(config: SasConfig) -> Self {
        let att = config.attitude_gains;
        let rate = config.rate_gains;
        Self {
            config,
            mode: SasMode::Off,
            attitude_pids: std::array::from_fn(|_| Pid::from_gains(att)),
            rate_pids: std::array::from_fn(|_| Pid::from_gains(rate)),
            hold_target: None,
        }
    }

    pub fn mode(&self) -> SasMode {
        self.mode
    }

    /// Switching modes resets every internal PID.
    pub fn set_mode(&mut self, mode: SasMode) {
        if mode != self.mode {
            info!("SAS mode {} -> {}", self.mode, mode);
        }
        self.mode = mode;
        self.hold_target = None;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.attitude_pids.iter_mut().for_each(Pid::reset);
        self.rate_pids.iter_mut().for_each(Pid::reset);
    }

    /// Attitude the current mode is steering toward, if any.
    pub fn target_attitude(&mut self, input: &TickInput) -> Option<UnitQuaternion<f64>> {
        let min = self.config.min_reference;
        let radial = input.radius_vector();
        let direction = match self.mode {
            SasMode::Off | SasMode::Stability => return None,
            SasMode::AttitudeHold => {
                return Some(*self.hold_target.get_or_insert(input.attitude));
            }
            SasMode::Prograde => reference(input.velocity, min),
            SasMode::Retrograde => reference(-input.velocity, min),
            SasMode::RadialOut => reference(radial, min),
            SasMode::RadialIn => reference(-radial, min),
            SasMode::Normal => orbit_normal(radial, input.velocity, min),
            SasMode::AntiNormal => orbit_normal(radial, input.velocity, min).map(|n| -n),
        }?;
        Some(align_thrust_axis(&direction))
    }

    /// Axis commands in [-max_authority, max_authority].
    pub fn update(&mut self, input: &TickInput, dt: f64) -> Vector3<f64> {
        if self.mode == SasMode::Off {
            return Vector3::zeros();
        }

        let mut command: Vector3<f64> = Vector3::zeros();
        if let Some(target) = self.target_attitude(input) {
            let error = attitude_error(&input.attitude, &target);
            for axis in 0..3 {
                if error[axis].abs() > self.config.deadband_rad {
                    command[axis] += self.attitude_pids[axis].update(0.0, error[axis], dt);
                } else {
                    // Restart cleanly on leaving the deadband: no stale derivative
                    self.attitude_pids[axis].reset();
                }
            }
        }

        // Rate damping toward zero body rate is always on
        for axis in 0..3 {
            command[axis] += self.rate_pids[axis].update(input.angular_velocity[axis], 0.0, dt);
        }

        let max = self.config.max_authority;
        command.map(|c| c.clamp(-max, max))
    }
}

impl Default for StabilityAugmentation {
    fn default() -> Self {
        Self::new(SasConfig::default())
    }
}

fn reference(v: Vector3<f64>, min: f64) -> Option<Vector3<f64>> {
    let n = v.norm();
    (n > min).then(|| v / n)
}

fn orbit_normal(radial: Vector3<f64>, velocity: Vector3<f64>, min: f64) -> Option<Vector3<f64>> {
    if velocity.norm() <= min {
        return None;
    }
    let h = radial.cross(&velocity);
    let n = h.norm();
    (n > 1e-9).then(|| h / n)
}

/// Rotation taking body +Z onto `direction`.
pub fn align_thrust_axis(direction: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::rotation_between(&Vector3::z(), direction)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI))
}

/// Body-frame Euler error angles (about X, Y, Z) from `current` to `target`.
pub fn attitude_error(current: &UnitQuaternion<f64>, target: &UnitQuaternion<f64>) -> Vector3<f64> {
    let q_err = current.inverse() * target;
    let (rx, ry, rz) = q_err.euler_angles();
    Vector3::new(rx, ry, rz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnc::pid::PidGains;

    fn input() -> TickInput {
        TickInput {
            position: Vector3::new(0.0, 0.0, 500.0),
            body_center: Vector3::new(0.0, 0.0, -1_737_400.0),
            ..TickInput::default()
        }
    }

    #[test]
    fn off_mode_commands_nothing() {
        let mut sas = StabilityAugmentation::default();
        let mut i = input();
        i.angular_velocity = Vector3::new(0.3, 0.0, 0.0);
        assert_eq!(sas.update(&i, 0.1), Vector3::zeros());
    }

    #[test]
    fn stability_mode_opposes_rotation() {
        let mut sas = StabilityAugmentation::default();
        sas.set_mode(SasMode::Stability);
        let mut i = input();
        i.angular_velocity = Vector3::new(0.1, -0.05, 0.02);
        let cmd = sas.update(&i, 0.1);
        assert!(cmd.x < 0.0 && cmd.y > 0.0 && cmd.z < 0.0);
    }

    #[test]
    fn output_clamped_to_authority() {
        let config = SasConfig { max_authority: 0.3, ..SasConfig::default() };
        let mut sas = StabilityAugmentation::new(config);
        sas.set_mode(SasMode::Stability);
        let mut i = input();
        i.angular_velocity = Vector3::new(50.0, 0.0, 0.0);
        let cmd = sas.update(&i, 0.1);
        assert!((cmd.x + 0.3).abs() < 1e-12);
    }

    #[test]
    fn radial_out_rights_a_tilted_body() {
        let mut sas = StabilityAugmentation::default();
        sas.set_mode(SasMode::RadialOut);
        let mut i = input();
        // Nose pitched +10 degrees about X; correction must be negative about X
        i.attitude = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 10.0_f64.to_radians());
        let cmd = sas.update(&i, 0.1);
        assert!(cmd.x < 0.0, "Expected negative pitch command, got {cmd}");
        assert!(cmd.y.abs() < 1e-9);
    }

    #[test]
    fn deadband_suppresses_small_errors() {
        let mut sas = StabilityAugmentation::default();
        sas.set_mode(SasMode::RadialOut);
        let mut i = input();
        i.attitude = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.1_f64.to_radians());
        let cmd = sas.update(&i, 0.1);
        assert!(cmd.norm() < 1e-12);
    }

    #[test]
    fn leaving_deadband_has_no_derivative_kick() {
        let config = SasConfig {
            attitude_gains: PidGains::new(0.0, 0.0, 1.0, 1.0),
            rate_gains: PidGains::new(0.0, 0.0, 0.0, 1.0),
            max_authority: 1e9,
            ..SasConfig::default()
        };
        let mut sas = StabilityAugmentation::new(config);
        sas.set_mode(SasMode::RadialOut);
        let mut i = input();
        let tilt = |deg: f64| UnitQuaternion::from_axis_angle(&Vector3::x_axis(), deg.to_radians());

        i.attitude = tilt(10.0);
        sas.update(&i, 0.1);
        i.attitude = tilt(0.1);
        assert!(sas.update(&i, 0.1).norm() < 1e-12);
        // Derivative-only loop re-entering from the deadband starts fresh
        i.attitude = tilt(5.0);
        assert!(sas.update(&i, 0.1).norm() < 1e-12);
    }

    #[test]
    fn attitude_hold_captures_current_attitude() {
        let mut sas = StabilityAugmentation::default();
        sas.set_mode(SasMode::AttitudeHold);
        let mut i = input();
        let start = UnitQuaternion::from_euler_angles(0.2, -0.1, 0.4);
        i.attitude = start;
        assert!(sas.update(&i, 0.1).norm() < 1e-12);

        i.attitude = UnitQuaternion::from_euler_angles(0.2, -0.1, 0.6);
        let cmd = sas.update(&i, 0.1);
        assert!(cmd.z < 0.0, "Should roll back toward held attitude, got {cmd}");
    }

    #[test]
    fn retrograde_target_points_thrust_against_velocity() {
        let mut sas = StabilityAugmentation::default();
        sas.set_mode(SasMode::Retrograde);
        let mut i = input();
        i.velocity = Vector3::new(30.0, 0.0, -40.0);
        let target = sas.target_attitude(&i).unwrap();
        let thrust_axis = target * Vector3::z();
        assert!((thrust_axis - Vector3::new(-0.6, 0.0, 0.8)).norm() < 1e-9);
    }

    #[test]
    fn prograde_without_velocity_has_no_target() {
        let mut sas = StabilityAugmentation::default();
        sas.set_mode(SasMode::Prograde);
        assert!(sas.target_attitude(&input()).is_none());
    }

    #[test]
    fn normal_modes_are_opposite() {
        let mut sas = StabilityAugmentation::default();
        let mut i = input();
        i.velocity = Vector3::new(1600.0, 0.0, 0.0);
        sas.set_mode(SasMode::Normal);
        let n = sas.target_attitude(&i).unwrap() * Vector3::z();
        sas.set_mode(SasMode::AntiNormal);
        let a = sas.target_attitude(&i).unwrap() * Vector3::z();
        assert!((n + a).norm() < 1e-9);
        assert!((n - Vector3::y()).norm() < 1e-9);
    }

    #[test]
    fn mode_switch_resets_pids() {
        let config = SasConfig {
            rate_gains: PidGains::new(0.0, 0.0, 1.0, 1.0),
            max_authority: 1e9,
            ..SasConfig::default()
        };
        let mut sas = StabilityAugmentation::new(config);
        sas.set_mode(SasMode::Stability);
        let mut i = input();
        i.angular_velocity = Vector3::new(0.5, 0.0, 0.0);
        sas.update(&i, 0.1);
        sas.set_mode(SasMode::Stability);
        i.angular_velocity = Vector3::new(5.0, 0.0, 0.0);
        // Derivative-only rate loop: first sample after reset outputs nothing
        assert_eq!(sas.update(&i, 0.1), Vector3::zeros());
    }
}
