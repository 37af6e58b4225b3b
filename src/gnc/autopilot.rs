use log::info;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::pid::{Pid, PidGains};
use crate::sim::tick::TickInput;

// ---------------------------------------------------------------------------
// Throttle autopilot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AutopilotMode {
    #[default]
    Off,
    AltitudeHold,
    VerticalSpeedHold,
    SuicideBurn,
    Hover,
}

/// Diagnostic reason attached to every throttle command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ThrottleReason {
    AutopilotOff,
    AltitudeHoldStable,
    AltitudeHoldClimb,
    AltitudeHoldDescend,
    VerticalSpeedHoldStable,
    VerticalSpeedHoldAdjust,
    SuicideBurnWaiting,
    SuicideBurnActive,
    SuicideBurnTerminal,
    SuicideBurnCoast,
    Hover,
    HoverNoThrust,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrottleCommand {
    pub throttle: f64,
    pub reason: ThrottleReason,
}

impl ThrottleCommand {
    fn new(throttle: f64, reason: ThrottleReason) -> Self {
        Self { throttle: throttle.clamp(0.0, 1.0), reason }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutopilotConfig {
    pub altitude_gains: PidGains,
    pub vertical_speed_gains: PidGains,
    pub altitude_deadband: f64,        // m
    pub vertical_speed_deadband: f64,  // m/s
    pub safety_factor: f64,
    pub terminal_speed: f64,           // m/s, "near zero" descent rate
    pub hover_margin: f64,             // throttle fraction above weight
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            altitude_gains: PidGains::new(0.05, 0.005, 0.3, 20.0),
            vertical_speed_gains: PidGains::new(0.25, 0.05, 0.02, 5.0),
            altitude_deadband: 1.0,
            vertical_speed_deadband: 0.2,
            safety_factor: 1.15,
            terminal_speed: 1.0,
            hover_margin: 0.02,
        }
    }
}

/// Result of the suicide-burn timing computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuicideBurnPlan {
    pub stop_distance: f64,
    pub burn_altitude: f64,
    pub should_burn: bool,
}

/// `net_deceleration` is the thrust acceleration already reduced by gravity.
/// Without any deceleration margin the plan is to burn immediately.
pub fn suicide_burn_plan(altitude: f64, vertical_speed: f64, net_deceleration: f64, safety_factor: f64) -> SuicideBurnPlan {
    let descending = vertical_speed < 0.0;
    if net_deceleration <= 0.0 {
        return SuicideBurnPlan {
            stop_distance: f64::INFINITY,
            burn_altitude: f64::INFINITY,
            should_burn: descending,
        };
    }
    let stop_distance = vertical_speed * vertical_speed / (2.0 * net_deceleration);
    let burn_altitude = stop_distance * safety_factor;
    SuicideBurnPlan {
        stop_distance,
        burn_altitude,
        should_burn: descending && altitude <= burn_altitude,
    }
}

#[derive(Debug, Clone)]
pub struct Autopilot {
    pub config: AutopilotConfig,
    mode: AutopilotMode,
    target_altitude: f64,
    target_vertical_speed: f64,
    altitude_pid: Pid,
    vertical_speed_pid: Pid,
    burn_started: bool,
    coasting: bool,
}

impl Autopilot {
    pub fn new(config: AutopilotConfig) -> Self {
        let altitude_pid = Pid::from_gains(config.altitude_gains);
        let vertical_speed_pid = Pid::from_gains(config.vertical_speed_gains);
        Self {
            config,
            mode: AutopilotMode::Off,
            target_altitude: 0.0,
            target_vertical_speed: 0.0,
            altitude_pid,
            vertical_speed_pid,
            burn_started: false,
            coasting: false,
        }
    }

    pub fn mode(&self) -> AutopilotMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AutopilotMode) {
        if mode != self.mode {
            info!("Autopilot mode {} -> {}", self.mode, mode);
        }
        self.mode = mode;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.altitude_pid.reset();
        self.vertical_speed_pid.reset();
        self.burn_started = false;
        self.coasting = false;
    }

    pub fn set_target_altitude(&mut self, altitude: f64) {
        self.target_altitude = altitude;
    }

    pub fn set_target_vertical_speed(&mut self, speed: f64) {
        self.target_vertical_speed = speed;
    }

    pub fn target_altitude(&self) -> f64 {
        self.target_altitude
    }

    pub fn target_vertical_speed(&self) -> f64 {
        self.target_vertical_speed
    }

    pub fn burn_started(&self) -> bool {
        self.burn_started
    }

    pub fn update(&mut self, input: &TickInput, dt: f64) -> ThrottleCommand {
        let altitude = input.altitude;
        let vs = input.vertical_speed();
        match self.mode {
            AutopilotMode::Off => ThrottleCommand::new(0.0, ThrottleReason::AutopilotOff),
            AutopilotMode::AltitudeHold => {
                let error = self.target_altitude - altitude;
                if error.abs() < self.config.altitude_deadband {
                    return ThrottleCommand::new(0.0, ThrottleReason::AltitudeHoldStable);
                }
                let out = self.altitude_pid.update(altitude, self.target_altitude, dt);
                let reason = if error > 0.0 {
                    ThrottleReason::AltitudeHoldClimb
                } else {
                    ThrottleReason::AltitudeHoldDescend
                };
                ThrottleCommand::new(out, reason)
            }
            AutopilotMode::VerticalSpeedHold => {
                let error = self.target_vertical_speed - vs;
                if error.abs() < self.config.vertical_speed_deadband {
                    return ThrottleCommand::new(0.0, ThrottleReason::VerticalSpeedHoldStable);
                }
                let out = self.vertical_speed_pid.update(vs, self.target_vertical_speed, dt);
                ThrottleCommand::new(out, ThrottleReason::VerticalSpeedHoldAdjust)
            }
            AutopilotMode::SuicideBurn => self.suicide_burn(input),
            AutopilotMode::Hover => {
                if input.max_thrust <= 0.0 {
                    return ThrottleCommand::new(1.0, ThrottleReason::HoverNoThrust);
                }
                let weight_fraction = input.mass * input.gravity / input.max_thrust;
                ThrottleCommand::new(weight_fraction + self.config.hover_margin, ThrottleReason::Hover)
            }
        }
    }

    fn suicide_burn(&mut self, input: &TickInput) -> ThrottleCommand {
        let vs = input.vertical_speed();
        if !self.burn_started {
            let thrust_accel = if input.mass > 0.0 { input.max_thrust / input.mass } else { 0.0 };
            let plan = suicide_burn_plan(
                input.altitude,
                vs,
                thrust_accel - input.gravity,
                self.config.safety_factor,
            );
            if !plan.should_burn {
                return ThrottleCommand::new(0.0, ThrottleReason::SuicideBurnWaiting);
            }
            info!(
                "Suicide burn start at {:.1} m, {:.1} m/s (burn altitude {:.1} m)",
                input.altitude, vs, plan.burn_altitude
            );
            self.burn_started = true;
        }

        // Near zero vertical speed: half throttle, except after a climb starts,
        // when the engine coasts until the sink rate passes half the terminal speed
        let terminal = self.config.terminal_speed;
        if vs > 0.0 {
            self.coasting = true;
        } else if vs < -0.5 * terminal {
            self.coasting = false;
        }
        if vs < -terminal {
            ThrottleCommand::new(1.0, ThrottleReason::SuicideBurnActive)
        } else if self.coasting {
            ThrottleCommand::new(0.0, ThrottleReason::SuicideBurnCoast)
        } else {
            ThrottleCommand::new(0.5, ThrottleReason::SuicideBurnTerminal)
        }
    }
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new(AutopilotConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(altitude: f64, vertical_speed: f64) -> TickInput {
        TickInput {
            altitude,
            velocity: nalgebra::Vector3::new(0.0, 0.0, vertical_speed),
            mass: 1000.0,
            gravity: 1.62,
            max_thrust: 20_000.0,
            ..TickInput::default()
        }
    }

    #[test]
    fn suicide_burn_formula() {
        let plan = suicide_burn_plan(500.0, -50.0, 20.0 - 1.62, 1.15);
        assert!((plan.stop_distance - 68.01).abs() < 0.01, "stop {}", plan.stop_distance);
        assert!((plan.burn_altitude - 78.21).abs() < 0.01, "burn {}", plan.burn_altitude);
        assert!(!plan.should_burn);

        assert!(suicide_burn_plan(78.0, -50.0, 18.38, 1.15).should_burn);
        assert!(!suicide_burn_plan(78.0, 50.0, 18.38, 1.15).should_burn);
    }

    #[test]
    fn no_deceleration_means_burn_now() {
        let plan = suicide_burn_plan(10_000.0, -1.0, 0.0, 1.15);
        assert!(plan.should_burn);
        assert!(plan.burn_altitude.is_infinite());
    }

    #[test]
    fn suicide_burn_waits_then_latches() {
        let mut ap = Autopilot::default();
        ap.set_mode(AutopilotMode::SuicideBurn);

        let cmd = ap.update(&input(500.0, -50.0), 0.1);
        assert_eq!(cmd.throttle, 0.0);
        assert_eq!(cmd.reason, ThrottleReason::SuicideBurnWaiting);

        let cmd = ap.update(&input(75.0, -50.0), 0.1);
        assert_eq!(cmd.throttle, 1.0);
        assert_eq!(cmd.reason, ThrottleReason::SuicideBurnActive);
        assert!(ap.burn_started());

        // Latched: still burning even though the plan alone would not fire here
        let cmd = ap.update(&input(60.0, -5.0), 0.1);
        assert_eq!(cmd.throttle, 1.0);

        let cmd = ap.update(&input(5.0, -0.8), 0.1);
        assert_eq!(cmd.throttle, 0.5);
        assert_eq!(cmd.reason.to_string(), "suicide_burn_terminal");

        let cmd = ap.update(&input(5.0, 0.1), 0.1);
        assert_eq!(cmd.reason, ThrottleReason::SuicideBurnCoast);
    }

    #[test]
    fn suicide_burn_holds_half_throttle_near_zero_speed() {
        let mut ap = Autopilot::default();
        ap.set_mode(AutopilotMode::SuicideBurn);
        assert_eq!(ap.update(&input(70.0, -50.0), 0.1).throttle, 1.0);

        for vs in [-0.4, -0.1, 0.0] {
            let cmd = ap.update(&input(3.0, vs), 0.1);
            assert_eq!(cmd.throttle, 0.5, "vs {vs}");
            assert_eq!(cmd.reason, ThrottleReason::SuicideBurnTerminal);
        }

        // Climbing: coast, and keep coasting while the sink rate stays small
        assert_eq!(ap.update(&input(3.0, 0.2), 0.1).throttle, 0.0);
        assert_eq!(ap.update(&input(3.0, -0.3), 0.1).reason, ThrottleReason::SuicideBurnCoast);
        assert_eq!(ap.update(&input(3.0, -0.7), 0.1).throttle, 0.5);
        assert_eq!(ap.update(&input(3.0, -3.0), 0.1).throttle, 1.0);
    }

    #[test]
    fn mode_change_clears_burn_latch() {
        let mut ap = Autopilot::default();
        ap.set_mode(AutopilotMode::SuicideBurn);
        ap.update(&input(10.0, -50.0), 0.1);
        assert!(ap.burn_started());
        ap.set_mode(AutopilotMode::SuicideBurn);
        assert!(!ap.burn_started());
    }

    #[test]
    fn hover_throttle_balances_weight() {
        let mut ap = Autopilot::default();
        ap.set_mode(AutopilotMode::Hover);
        let cmd = ap.update(&input(100.0, 0.0), 0.1);
        let expected = 1000.0 * 1.62 / 20_000.0 + 0.02;
        assert!((cmd.throttle - expected).abs() < 1e-12);
        assert_eq!(cmd.reason, ThrottleReason::Hover);
    }

    #[test]
    fn hover_clamps_when_underpowered() {
        let mut ap = Autopilot::default();
        ap.set_mode(AutopilotMode::Hover);
        let mut i = input(100.0, 0.0);
        i.max_thrust = 500.0;
        assert_eq!(ap.update(&i, 0.1).throttle, 1.0);
        i.max_thrust = 0.0;
        assert_eq!(ap.update(&i, 0.1).reason, ThrottleReason::HoverNoThrust);
    }

    #[test]
    fn altitude_hold_deadband_and_climb() {
        let mut ap = Autopilot::default();
        ap.set_mode(AutopilotMode::AltitudeHold);
        ap.set_target_altitude(100.0);

        let cmd = ap.update(&input(99.5, 0.0), 0.1);
        assert_eq!(cmd.throttle, 0.0);
        assert_eq!(cmd.reason.to_string(), "altitude_hold_stable");

        let cmd = ap.update(&input(50.0, 0.0), 0.1);
        assert!(cmd.throttle > 0.0 && cmd.throttle <= 1.0);
        assert_eq!(cmd.reason, ThrottleReason::AltitudeHoldClimb);

        let cmd = ap.update(&input(300.0, 0.0), 0.1);
        assert_eq!(cmd.throttle, 0.0);
        assert_eq!(cmd.reason, ThrottleReason::AltitudeHoldDescend);
    }

    #[test]
    fn vertical_speed_hold_tracks_target() {
        let mut ap = Autopilot::default();
        ap.set_mode(AutopilotMode::VerticalSpeedHold);
        ap.set_target_vertical_speed(-2.0);

        assert_eq!(ap.update(&input(100.0, -2.1), 0.1).reason, ThrottleReason::VerticalSpeedHoldStable);
        let cmd = ap.update(&input(100.0, -6.0), 0.1);
        assert!(cmd.throttle > 0.0);
        assert_eq!(cmd.reason, ThrottleReason::VerticalSpeedHoldAdjust);
    }

    #[test]
    fn off_reports_reason() {
        let mut ap = Autopilot::default();
        let cmd = ap.update(&input(100.0, 0.0), 0.1);
        assert_eq!(cmd.throttle, 0.0);
        assert_eq!(cmd.reason.to_string(), "autopilot_off");
    }
}
