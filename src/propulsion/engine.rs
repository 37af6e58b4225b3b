use log::{info, warn};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::dynamics::state::G0;
use crate::sim::event::EventLog;

/// Health below which ignition is refused.
pub const MIN_IGNITION_HEALTH: f64 = 10.0;
/// Health below which a one-shot `HealthCritical` event is raised.
pub const CRITICAL_HEALTH: f64 = 25.0;
/// Deliverable/desired propellant ratio below which a running engine flames out.
pub const FLAMEOUT_RATIO: f64 = 0.9;

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub max_thrust: f64,             // N
    pub isp: f64,                    // s
    pub mixture_ratio: f64,          // oxidizer / fuel by mass
    pub min_throttle: f64,           // lowest sustained nonzero throttle
    pub max_gimbal_deg: f64,
    pub ignition_time: f64,          // s
    pub shutdown_time: f64,          // s
    pub restart_cooldown: f64,       // s, armed on every ignition
    pub nozzle_offset: f64,          // m, CG to gimbal pivot along -Z
    pub max_chamber_pressure: f64,   // Pa at full throttle
    pub nominal_chamber_temp: f64,   // K at full throttle, healthy engine
    pub overheat_temp: f64,          // K
    pub ambient_temp: f64,           // K
    pub cooldown_rate: f64,          // K/s once the chamber is unpressurised
    pub wear_rate: f64,              // health %/s at full throttle
    pub heat_fraction: f64,          // share of jet power rejected as heat
    pub nominal_feed_pressure: f64,  // Pa, tank pressure for full thrust
    pub pump_power: f64,             // W, 0 for pressure-fed engines
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_thrust: 15_000.0,
            isp: 311.0,
            mixture_ratio: 1.6,
            min_throttle: 0.4,
            max_gimbal_deg: 6.0,
            ignition_time: 2.0,
            shutdown_time: 1.0,
            restart_cooldown: 5.0,
            nozzle_offset: 1.2,
            max_chamber_pressure: 0.9e6,
            nominal_chamber_temp: 2_800.0,
            overheat_temp: 3_000.0,
            ambient_temp: 290.0,
            cooldown_rate: 60.0,
            wear_rate: 0.01,
            heat_fraction: 0.02,
            nominal_feed_pressure: 1.2e6,
            pump_power: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EngineStatus {
    Off,
    Igniting,
    Running,
    Shutdown,
}

/// Stimuli that can move the engine between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineInput {
    Ignite,
    IgnitionComplete,
    Shutdown,
    Flameout,
    Failure,
    ShutdownComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    Ignition,
    Running,
    Shutdown,
    Flameout,
    Failure,
    Off,
    IgnitionRejected,
    Overheat,
    HealthCritical,
}

impl EngineStatus {
    /// Legal transition table. `None` means the input is not accepted in this state.
    pub fn transition(self, input: EngineInput) -> Option<(EngineStatus, EngineEvent)> {
        use EngineInput as I;
        use EngineStatus as S;
        match (self, input) {
            (S::Off, I::Ignite) => Some((S::Igniting, EngineEvent::Ignition)),
            (S::Igniting, I::IgnitionComplete) => Some((S::Running, EngineEvent::Running)),
            (S::Running, I::Shutdown) => Some((S::Shutdown, EngineEvent::Shutdown)),
            (S::Running, I::Flameout) => Some((S::Shutdown, EngineEvent::Flameout)),
            (S::Running, I::Failure) => Some((S::Shutdown, EngineEvent::Failure)),
            (S::Shutdown, I::ShutdownComplete) => Some((S::Off, EngineEvent::Off)),
            _ => None,
        }
    }

    pub fn is_firing(self) -> bool {
        matches!(self, EngineStatus::Igniting | EngineStatus::Running | EngineStatus::Shutdown)
    }
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Actual vs requested propellant for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PropellantDraw {
    pub fuel: f64,
    pub oxidizer: f64,
    pub desired_fuel: f64,
    pub desired_oxidizer: f64,
}

impl PropellantDraw {
    pub fn total(&self) -> f64 {
        self.fuel + self.oxidizer
    }

    /// Limiting ratio of deliverable to desired propellant (1 when nothing was asked).
    pub fn supply_ratio(&self) -> f64 {
        let fuel_ratio = if self.desired_fuel > 0.0 { self.fuel / self.desired_fuel } else { 1.0 };
        let ox_ratio = if self.desired_oxidizer > 0.0 {
            self.oxidizer / self.desired_oxidizer
        } else {
            1.0
        };
        fuel_ratio.min(ox_ratio)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineTelemetry {
    pub status: EngineStatus,
    pub throttle: f64,
    pub thrust: f64,
    pub gimbal_pitch_deg: f64,
    pub gimbal_yaw_deg: f64,
    pub ignition_progress: f64,
    pub shutdown_progress: f64,
    pub chamber_pressure: f64,
    pub chamber_temp: f64,
    pub health: f64,
    pub restart_cooldown: f64,
    pub mass_flow: f64,
    pub fuel_consumed: f64,
    pub oxidizer_consumed: f64,
    pub burn_time: f64,
    pub ignition_count: u32,
    pub heat_generation: f64,
}

// ---------------------------------------------------------------------------
// Main engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MainEngine {
    pub config: EngineConfig,
    status: EngineStatus,
    throttle: f64,
    gimbal_pitch_deg: f64,
    gimbal_yaw_deg: f64,
    ignition_progress: f64,
    shutdown_progress: f64,
    health: f64,
    restart_cooldown: f64,
    chamber_pressure: f64,
    chamber_temp: f64,
    feed_pressure_factor: f64,
    pump_powered: bool,
    supply_factor: f64,
    overheated: bool,
    health_critical: bool,
    fuel_consumed: f64,
    oxidizer_consumed: f64,
    burn_time: f64,
    ignition_count: u32,
    events: EventLog<EngineEvent>,
}

impl MainEngine {
    pub fn new(config: EngineConfig) -> Self {
        let ambient = config.ambient_temp;
        Self {
            config,
            status: EngineStatus::Off,
            throttle: 0.0,
            gimbal_pitch_deg: 0.0,
            gimbal_yaw_deg: 0.0,
            ignition_progress: 0.0,
            shutdown_progress: 0.0,
            health: 100.0,
            restart_cooldown: 0.0,
            chamber_pressure: 0.0,
            chamber_temp: ambient,
            feed_pressure_factor: 1.0,
            pump_powered: true,
            supply_factor: 1.0,
            overheated: false,
            health_critical: false,
            fuel_consumed: 0.0,
            oxidizer_consumed: 0.0,
            burn_time: 0.0,
            ignition_count: 0,
            events: EventLog::new(),
        }
    }

    // --- Commands ---------------------------------------------------------

    /// Start the ignition sequence. Returns false when the engine cannot light.
    pub fn ignite(&mut self) -> bool {
        let reason = if self.status != EngineStatus::Off {
            Some("engine not off")
        } else if self.restart_cooldown > 0.0 {
            Some("restart cooldown active")
        } else if self.health < MIN_IGNITION_HEALTH {
            Some("health below ignition limit")
        } else if !self.pump_powered {
            Some("turbopump unpowered")
        } else {
            None
        };
        if let Some(reason) = reason {
            warn!("Ignition rejected: {reason}");
            self.events.push(EngineEvent::IgnitionRejected);
            return false;
        }

        if !self.apply(EngineInput::Ignite) {
            return false;
        }
        self.ignition_progress = 0.0;
        self.shutdown_progress = 0.0;
        self.supply_factor = 1.0;
        self.restart_cooldown = self.config.restart_cooldown;
        self.ignition_count += 1;
        true
    }

    /// Begin the shutdown ramp. Only a running engine can be shut down.
    pub fn shutdown(&mut self) -> bool {
        self.begin_shutdown(EngineInput::Shutdown)
    }

    /// Clamp to [0, 1]; nonzero values below the minimum throttle snap up to it.
    pub fn set_throttle(&mut self, throttle: f64) {
        let t = if throttle.is_nan() { 0.0 } else { throttle.clamp(0.0, 1.0) };
        self.throttle = if t > 0.0 && t < self.config.min_throttle {
            self.config.min_throttle
        } else {
            t
        };
    }

    /// Clamp each axis independently to ±max_gimbal_deg.
    pub fn set_gimbal(&mut self, pitch_deg: f64, yaw_deg: f64) {
        let max = self.config.max_gimbal_deg;
        self.gimbal_pitch_deg = pitch_deg.clamp(-max, max);
        self.gimbal_yaw_deg = yaw_deg.clamp(-max, max);
    }

    /// Propellant feed conditions reported by the tank and power collaborators.
    pub fn set_feed_conditions(&mut self, pressure: f64, pump_powered: bool) {
        self.feed_pressure_factor = if self.config.nominal_feed_pressure > 0.0 {
            (pressure / self.config.nominal_feed_pressure).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.pump_powered = pump_powered || self.config.pump_power <= 0.0;
    }

    // --- Tick -------------------------------------------------------------

    pub fn update(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        self.restart_cooldown = (self.restart_cooldown - dt).max(0.0);

        match self.status {
            EngineStatus::Off => {
                self.chamber_pressure = 0.0;
                self.cool_down(dt);
            }
            EngineStatus::Igniting => {
                self.ignition_progress = (self.ignition_progress + dt / self.config.ignition_time.max(1e-9)).min(1.0);
                let level = self.ignition_progress * self.throttle;
                self.chamber_pressure = self.config.max_chamber_pressure * level;
                self.chamber_temp = self.config.ambient_temp
                    + (self.config.nominal_chamber_temp - self.config.ambient_temp) * level;
                self.wear(dt);
                self.burn_time += dt;
                if self.ignition_progress >= 1.0 && self.apply(EngineInput::IgnitionComplete) && self.starved() {
                    warn!("Flameout at end of ignition: propellant supply at {:.0}%", self.supply_factor * 100.0);
                    self.begin_shutdown(EngineInput::Flameout);
                }
            }
            EngineStatus::Running => {
                self.chamber_pressure = self.config.max_chamber_pressure * self.throttle * self.health_factor();
                self.chamber_temp = self.running_temperature();
                self.check_overheat();
                self.wear(dt);
                self.burn_time += dt;
                if self.health <= 0.0 {
                    self.health = 0.0;
                    warn!("Main engine failed, forcing shutdown");
                    self.begin_shutdown(EngineInput::Failure);
                }
            }
            EngineStatus::Shutdown => {
                self.shutdown_progress = (self.shutdown_progress + dt / self.config.shutdown_time.max(1e-9)).min(1.0);
                self.chamber_pressure = self.config.max_chamber_pressure
                    * self.throttle
                    * self.health_factor()
                    * (1.0 - self.shutdown_progress);
                self.cool_down(dt);
                if self.shutdown_progress >= 1.0 {
                    self.chamber_pressure = 0.0;
                    self.apply(EngineInput::ShutdownComplete);
                }
            }
        }
    }

    /// Draw propellant for this tick, never more than available.
    /// A running engine starved below the flameout ratio shuts down on this call;
    /// lost feed pressure or pump power counts as no supply at all. Thrust for the
    /// rest of the tick is scaled by the supplied fraction.
    pub fn consume_propellant(&mut self, dt: f64, available_fuel: f64, available_oxidizer: f64) -> PropellantDraw {
        let desired = self.feed_limited_thrust() * self.flow_per_newton() * dt.max(0.0);
        let mr = self.config.mixture_ratio;
        let desired_fuel = desired / (1.0 + mr);
        let desired_oxidizer = desired * mr / (1.0 + mr);

        let draw = PropellantDraw {
            fuel: desired_fuel.min(available_fuel.max(0.0)),
            oxidizer: desired_oxidizer.min(available_oxidizer.max(0.0)),
            desired_fuel,
            desired_oxidizer,
        };
        self.fuel_consumed += draw.fuel;
        self.oxidizer_consumed += draw.oxidizer;

        self.supply_factor = if self.nominal_thrust() <= 0.0 {
            1.0
        } else if self.feed_factor() <= 0.0 {
            0.0
        } else {
            draw.supply_ratio().clamp(0.0, 1.0)
        };

        if self.status == EngineStatus::Running && self.starved() {
            warn!("Flameout: propellant supply at {:.0}% of demand", self.supply_factor * 100.0);
            self.begin_shutdown(EngineInput::Flameout);
        }
        draw
    }

    // --- Outputs ----------------------------------------------------------

    /// Delivered thrust magnitude (N).
    pub fn thrust(&self) -> f64 {
        self.feed_limited_thrust() * self.supply_factor
    }

    /// Full-throttle thrust the engine could deliver under current health and
    /// feed conditions (N).
    pub fn available_thrust(&self) -> f64 {
        self.config.max_thrust * self.health_factor() * self.feed_factor()
    }

    /// Thrust deflected from body +Z by the gimbal (body frame). Yaw swings
    /// the nozzle axis toward +X, then pitch toward +Y; magnitude is `thrust()`.
    pub fn thrust_vector(&self) -> Vector3<f64> {
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.gimbal_yaw_deg.to_radians());
        let pitch = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -self.gimbal_pitch_deg.to_radians());
        (pitch * yaw * Vector3::z()) * self.thrust()
    }

    /// Gimbal torque about the CG (body frame), nozzle pivot at -Z.
    pub fn torque(&self) -> Vector3<f64> {
        let arm = Vector3::new(0.0, 0.0, -self.config.nozzle_offset);
        arm.cross(&self.thrust_vector())
    }

    /// mdot = F / (Isp * g0)
    pub fn mass_flow(&self) -> f64 {
        self.thrust() * self.flow_per_newton()
    }

    /// Heat rejected into the engine structure (W).
    pub fn heat_generation_w(&self) -> f64 {
        let exhaust_velocity = self.config.isp * G0;
        0.5 * self.thrust() * exhaust_velocity * self.config.heat_fraction
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    pub fn gimbal(&self) -> (f64, f64) {
        (self.gimbal_pitch_deg, self.gimbal_yaw_deg)
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn restart_cooldown(&self) -> f64 {
        self.restart_cooldown
    }

    pub fn chamber_temp(&self) -> f64 {
        self.chamber_temp
    }

    pub fn events(&self) -> &EventLog<EngineEvent> {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn telemetry(&self) -> EngineTelemetry {
        EngineTelemetry {
            status: self.status,
            throttle: self.throttle,
            thrust: self.thrust(),
            gimbal_pitch_deg: self.gimbal_pitch_deg,
            gimbal_yaw_deg: self.gimbal_yaw_deg,
            ignition_progress: self.ignition_progress,
            shutdown_progress: self.shutdown_progress,
            chamber_pressure: self.chamber_pressure,
            chamber_temp: self.chamber_temp,
            health: self.health,
            restart_cooldown: self.restart_cooldown,
            mass_flow: self.mass_flow(),
            fuel_consumed: self.fuel_consumed,
            oxidizer_consumed: self.oxidizer_consumed,
            burn_time: self.burn_time,
            ignition_count: self.ignition_count,
            heat_generation: self.heat_generation_w(),
        }
    }

    // --- Internals --------------------------------------------------------

    fn apply(&mut self, input: EngineInput) -> bool {
        match self.status.transition(input) {
            Some((next, event)) => {
                info!("Main engine {} -> {} ({event:?})", self.status, next);
                self.status = next;
                self.events.push(event);
                true
            }
            None => false,
        }
    }

    fn begin_shutdown(&mut self, input: EngineInput) -> bool {
        if self.apply(input) {
            self.shutdown_progress = 0.0;
            true
        } else {
            false
        }
    }

    fn throttle_factor(&self) -> f64 {
        match self.status {
            EngineStatus::Off => 0.0,
            EngineStatus::Igniting => self.throttle * self.ignition_progress,
            EngineStatus::Running => self.throttle,
            EngineStatus::Shutdown => self.throttle * (1.0 - self.shutdown_progress),
        }
    }

    fn health_factor(&self) -> f64 {
        (self.health / 100.0).clamp(0.0, 1.0)
    }

    /// Thrust the throttle, ramp and health ask for, before any feed limits.
    fn nominal_thrust(&self) -> f64 {
        self.config.max_thrust * self.throttle_factor() * self.health_factor()
    }

    fn feed_factor(&self) -> f64 {
        if self.pump_powered { self.feed_pressure_factor } else { 0.0 }
    }

    fn feed_limited_thrust(&self) -> f64 {
        self.nominal_thrust() * self.feed_factor()
    }

    fn flow_per_newton(&self) -> f64 {
        if self.config.isp <= 0.0 { 0.0 } else { 1.0 / (self.config.isp * G0) }
    }

    fn starved(&self) -> bool {
        self.supply_factor < FLAMEOUT_RATIO
    }

    /// Degraded engines run hotter for the same throttle.
    fn running_temperature(&self) -> f64 {
        let degradation = 1.0 + (1.0 - self.health_factor()) * 0.5;
        self.config.ambient_temp
            + (self.config.nominal_chamber_temp - self.config.ambient_temp) * self.throttle * degradation
    }

    fn check_overheat(&mut self) {
        let hot = self.chamber_temp > self.config.overheat_temp;
        if hot && !self.overheated {
            warn!("Main engine overheat: {:.0} K", self.chamber_temp);
            self.events.push(EngineEvent::Overheat);
        }
        self.overheated = hot;
    }

    fn wear(&mut self, dt: f64) {
        let multiplier = if self.overheated { 3.0 } else { 1.0 };
        self.health = (self.health - self.config.wear_rate * self.throttle_factor() * multiplier * dt).max(0.0);
        if self.health < CRITICAL_HEALTH && !self.health_critical {
            self.health_critical = true;
            warn!("Main engine health critical: {:.1}%", self.health);
            self.events.push(EngineEvent::HealthCritical);
        }
    }

    fn cool_down(&mut self, dt: f64) {
        self.overheated = false;
        self.chamber_temp = (self.chamber_temp - self.config.cooldown_rate * dt).max(self.config.ambient_temp);
    }

    #[cfg(test)]
    pub(crate) fn set_health(&mut self, health: f64) {
        self.health = health.clamp(0.0, 100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MainEngine {
        MainEngine::new(EngineConfig { ignition_time: 2.0, ..EngineConfig::default() })
    }

    fn running_engine() -> MainEngine {
        let mut e = engine();
        e.set_throttle(1.0);
        assert!(e.ignite());
        e.update(1.0);
        e.update(1.0);
        assert_eq!(e.status(), EngineStatus::Running);
        e
    }

    #[test]
    fn transition_table_rejects_illegal_moves() {
        assert!(EngineStatus::Off.transition(EngineInput::Shutdown).is_none());
        assert!(EngineStatus::Igniting.transition(EngineInput::Ignite).is_none());
        assert!(EngineStatus::Shutdown.transition(EngineInput::IgnitionComplete).is_none());
        assert_eq!(
            EngineStatus::Running.transition(EngineInput::Flameout),
            Some((EngineStatus::Shutdown, EngineEvent::Flameout))
        );
    }

    #[test]
    fn ignition_ramp_reaches_full_thrust() {
        let mut e = engine();
        e.set_throttle(1.0);
        assert!(e.ignite());

        e.update(1.0);
        assert_eq!(e.status(), EngineStatus::Igniting);
        let t1 = e.thrust();
        assert!(t1 > 0.0 && t1 < e.config.max_thrust, "Ramp thrust {t1}");

        e.update(1.0);
        assert_eq!(e.status(), EngineStatus::Running);
        let expected = e.config.max_thrust * e.health() / 100.0;
        assert!((e.thrust() - expected).abs() < 1e-6);
        assert!(e.events().contains(&EngineEvent::Running));
    }

    #[test]
    fn flameout_on_empty_tanks() {
        let mut e = running_engine();
        let draw = e.consume_propellant(0.1, 0.0, 10.0);
        assert_eq!(draw.fuel, 0.0);
        assert!(draw.desired_fuel > 0.0);
        assert_eq!(e.status(), EngineStatus::Shutdown);
        assert_eq!(e.events().last(), Some(&EngineEvent::Flameout));
    }

    #[test]
    fn lost_feed_pressure_flames_out() {
        let mut e = running_engine();
        e.set_feed_conditions(0.0, true);
        assert_eq!(e.thrust(), 0.0);
        let draw = e.consume_propellant(0.1, 10.0, 10.0);
        assert_eq!(draw.total(), 0.0);
        assert_eq!(e.status(), EngineStatus::Shutdown);
        assert_eq!(e.events().last(), Some(&EngineEvent::Flameout));
    }

    #[test]
    fn starved_ignition_flames_out_on_handover() {
        let mut e = engine();
        e.set_throttle(1.0);
        assert!(e.ignite());
        e.update(1.0);
        e.consume_propellant(0.1, 0.0, 0.0);
        assert_eq!(e.status(), EngineStatus::Igniting);
        assert_eq!(e.thrust(), 0.0);

        e.update(1.0);
        assert_eq!(e.status(), EngineStatus::Shutdown);
        assert!(e.events().contains(&EngineEvent::Running));
        assert_eq!(e.events().last(), Some(&EngineEvent::Flameout));
    }

    #[test]
    fn available_thrust_follows_feed_and_pump() {
        let mut e = MainEngine::new(EngineConfig { pump_power: 400.0, ..EngineConfig::default() });
        assert_eq!(e.available_thrust(), e.config.max_thrust);
        e.set_feed_conditions(e.config.nominal_feed_pressure * 0.5, true);
        assert!((e.available_thrust() - 0.5 * e.config.max_thrust).abs() < 1e-9);
        e.set_feed_conditions(e.config.nominal_feed_pressure, false);
        assert_eq!(e.available_thrust(), 0.0);
    }

    #[test]
    fn partial_supply_above_threshold_keeps_running() {
        let mut e = running_engine();
        let demand = e.mass_flow() * 1.0;
        let mr = e.config.mixture_ratio;
        let fuel = demand / (1.0 + mr) * 0.95;
        let ox = demand * mr / (1.0 + mr);
        let draw = e.consume_propellant(1.0, fuel, ox);
        assert!((draw.fuel - fuel).abs() < 1e-12);
        assert_eq!(e.status(), EngineStatus::Running);
    }

    #[test]
    fn mixture_ratio_split() {
        let mut e = running_engine();
        let draw = e.consume_propellant(1.0, 1e6, 1e6);
        assert!((draw.oxidizer / draw.fuel - e.config.mixture_ratio).abs() < 1e-9);
        assert!((draw.total() - e.mass_flow()).abs() < 1e-9);
    }

    #[test]
    fn throttle_floor_snaps_up() {
        let mut e = MainEngine::new(EngineConfig { min_throttle: 0.4, ..EngineConfig::default() });
        e.set_throttle(0.1);
        assert!((e.throttle() - 0.4).abs() < 1e-12);
        e.set_throttle(0.0);
        assert_eq!(e.throttle(), 0.0);
        e.set_throttle(1.7);
        assert_eq!(e.throttle(), 1.0);
    }

    #[test]
    fn gimbal_clamps_each_axis() {
        let mut e = engine();
        e.set_gimbal(20.0, -2.0);
        assert_eq!(e.gimbal(), (6.0, -2.0));
    }

    #[test]
    fn gimbal_pitch_makes_pitch_torque() {
        let mut e = running_engine();
        e.set_gimbal(3.0, 0.0);
        let torque = e.torque();
        assert!(torque.x > 0.0);
        assert!(torque.y.abs() < 1e-9 && torque.z.abs() < 1e-9);
    }

    #[test]
    fn deflected_thrust_keeps_its_magnitude() {
        let mut e = MainEngine::new(EngineConfig { max_gimbal_deg: 30.0, ..EngineConfig::default() });
        e.set_throttle(1.0);
        e.ignite();
        e.update(1.0);
        e.update(1.0);
        e.set_gimbal(30.0, 30.0);
        let v = e.thrust_vector();
        assert!((v.norm() - e.thrust()).abs() < 1e-6, "|F| {} vs {}", v.norm(), e.thrust());
        assert!(v.x > 0.0 && v.y > 0.0 && v.z > 0.0);

        e.set_gimbal(0.0, -10.0);
        let v = e.thrust_vector();
        assert!((v.x / e.thrust() + 10.0_f64.to_radians().sin()).abs() < 1e-9);
        assert!(v.y.abs() < 1e-9);
    }

    #[test]
    fn restart_blocked_during_cooldown() {
        let mut e = running_engine();
        assert!(e.shutdown());
        e.update(1.0);
        assert_eq!(e.status(), EngineStatus::Off);
        // 3 s elapsed of a 5 s cooldown
        assert!(!e.ignite());
        e.update(2.0);
        assert!(e.ignite());
    }

    #[test]
    fn shutdown_ramps_thrust_down() {
        let mut e = running_engine();
        let full = e.thrust();
        e.shutdown();
        e.update(0.5);
        assert_eq!(e.status(), EngineStatus::Shutdown);
        assert!(e.thrust() < full && e.thrust() > 0.0);
        e.update(0.5);
        assert_eq!(e.status(), EngineStatus::Off);
        assert_eq!(e.thrust(), 0.0);
    }

    #[test]
    fn shutdown_rejected_unless_running() {
        let mut e = engine();
        assert!(!e.shutdown());
        e.ignite();
        assert!(!e.shutdown());
    }

    #[test]
    fn damaged_engine_refuses_ignition() {
        let mut e = engine();
        e.set_health(5.0);
        assert!(!e.ignite());
        assert_eq!(e.events().last(), Some(&EngineEvent::IgnitionRejected));
    }

    #[test]
    fn health_zero_forces_shutdown() {
        let mut e = running_engine();
        e.set_health(0.001);
        e.update(1.0);
        assert_eq!(e.health(), 0.0);
        assert_eq!(e.status(), EngineStatus::Shutdown);
        assert!(e.events().contains(&EngineEvent::Failure));
    }

    #[test]
    fn health_only_decreases_while_firing() {
        let mut e = running_engine();
        let mut last = e.health();
        for _ in 0..10 {
            e.update(1.0);
            assert!(e.health() <= last);
            last = e.health();
        }
        assert!(last < 100.0);
    }

    #[test]
    fn degraded_engine_overheats() {
        let mut e = running_engine();
        e.set_health(60.0);
        e.update(0.1);
        assert!(e.chamber_temp() > e.config.overheat_temp);
        assert!(e.events().contains(&EngineEvent::Overheat));
    }

    #[test]
    fn low_feed_pressure_derates_thrust() {
        let mut e = running_engine();
        let full = e.thrust();
        e.set_feed_conditions(e.config.nominal_feed_pressure * 0.5, true);
        assert!((e.thrust() - 0.5 * full).abs() < 1e-6);
    }

    #[test]
    fn unpowered_pump_fed_engine_makes_no_thrust() {
        let mut e = MainEngine::new(EngineConfig { pump_power: 400.0, ..EngineConfig::default() });
        e.set_feed_conditions(e.config.nominal_feed_pressure, false);
        assert!(!e.ignite());
        assert_eq!(e.thrust(), 0.0);
    }

    #[test]
    fn chamber_cools_toward_ambient_when_off() {
        let mut e = running_engine();
        e.shutdown();
        for _ in 0..200 {
            e.update(1.0);
        }
        assert_eq!(e.status(), EngineStatus::Off);
        assert!((e.chamber_temp() - e.config.ambient_temp).abs() < 1e-9);
        assert_eq!(e.telemetry().chamber_pressure, 0.0);
    }
}
