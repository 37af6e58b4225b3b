use std::fmt;

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::gnc::{AutopilotMode, FlightControlConfig, SasMode, DEFAULT_RCS_THRESHOLD};
use crate::physics::gravity::CelestialBody;
use crate::propulsion::{EngineConfig, RcsConfig};

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A quantity that must be strictly positive was not.
    NonPositive { field: &'static str, value: f64 },
    /// A quantity that must be non-negative was negative.
    Negative { field: &'static str, value: f64 },
    /// A value fell outside its closed range.
    OutOfRange { field: &'static str, value: f64, min: f64, max: f64 },
    /// The initial state contains NaN or infinite components.
    NonFinite { field: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPositive { field, value } => {
                write!(f, "{field} must be positive, got {value}")
            }
            ConfigError::Negative { field, value } => {
                write!(f, "{field} must not be negative, got {value}")
            }
            ConfigError::OutOfRange { field, value, min, max } => {
                write!(f, "{field} = {value} outside [{min}, {max}]")
            }
            ConfigError::NonFinite { field } => write!(f, "{field} is not finite"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Spacecraft configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacecraftConfig {
    pub name: String,
    pub planet: CelestialBody,
    pub dry_mass: f64,                 // kg, structure + payload
    pub inertia: Vector3<f64>,         // [Ixx, Iyy, Izz], kg·m^2
    pub engine: EngineConfig,
    pub rcs: RcsConfig,
    pub flight_control: FlightControlConfig,
    pub fuel_mass: f64,                // kg
    pub oxidizer_mass: f64,            // kg
    pub rcs_propellant_mass: f64,      // kg
    pub tank_pressure: f64,            // Pa, main tanks when full
    pub rcs_tank_pressure: f64,        // Pa, regulated
    pub power_capacity: f64,           // W, electrical bus
    pub rcs_threshold: f64,            // axis command that fires a group
    pub initial_position: Vector3<f64>,
    pub initial_velocity: Vector3<f64>,
    pub initial_attitude: UnitQuaternion<f64>,
    pub surface_elevation: f64,
    pub sas_mode: SasMode,
    pub autopilot_mode: AutopilotMode,
    pub gimbal_autopilot: bool,
    pub ignite_on_start: bool,
}

impl SpacecraftConfig {
    pub fn propellant_mass(&self) -> f64 {
        self.fuel_mass + self.oxidizer_mass + self.rcs_propellant_mass
    }

    pub fn total_mass(&self) -> f64 {
        self.dry_mass + self.propellant_mass()
    }

    /// Thrust-to-weight ratio at the surface with full tanks.
    pub fn twr(&self) -> f64 {
        self.engine.max_thrust / (self.total_mass() * self.planet.surface_gravity)
    }

    /// Ideal main-engine delta-v (RCS propellant counted as payload).
    pub fn delta_v(&self) -> f64 {
        let m0 = self.total_mass();
        let mf = m0 - self.fuel_mass - self.oxidizer_mass;
        self.engine.isp * crate::dynamics::state::G0 * (m0 / mf).ln()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("dry_mass", self.dry_mass)?;
        positive("planet.radius", self.planet.radius)?;
        non_negative("planet.surface_gravity", self.planet.surface_gravity)?;
        for (field, value) in [
            ("inertia.x", self.inertia.x),
            ("inertia.y", self.inertia.y),
            ("inertia.z", self.inertia.z),
        ] {
            positive(field, value)?;
        }

        let e = &self.engine;
        non_negative("engine.max_thrust", e.max_thrust)?;
        positive("engine.isp", e.isp)?;
        positive("engine.mixture_ratio", e.mixture_ratio)?;
        in_range("engine.min_throttle", e.min_throttle, 0.0, 1.0)?;
        in_range("engine.max_gimbal_deg", e.max_gimbal_deg, 0.0, 90.0)?;
        positive("engine.ignition_time", e.ignition_time)?;
        positive("engine.shutdown_time", e.shutdown_time)?;
        non_negative("engine.restart_cooldown", e.restart_cooldown)?;
        non_negative("engine.pump_power", e.pump_power)?;

        let r = &self.rcs;
        non_negative("rcs.thrust_per_thruster", r.thrust_per_thruster)?;
        positive("rcs.isp", r.isp)?;
        positive("rcs.arm", r.arm)?;
        in_range("rcs.max_duty_cycle", r.max_duty_cycle, 0.0, 1.0)?;

        non_negative("fuel_mass", self.fuel_mass)?;
        non_negative("oxidizer_mass", self.oxidizer_mass)?;
        non_negative("rcs_propellant_mass", self.rcs_propellant_mass)?;
        non_negative("tank_pressure", self.tank_pressure)?;
        non_negative("rcs_tank_pressure", self.rcs_tank_pressure)?;
        non_negative("power_capacity", self.power_capacity)?;
        in_range("rcs_threshold", self.rcs_threshold, 0.0, 1.0)?;

        for (field, v) in [
            ("initial_position", self.initial_position),
            ("initial_velocity", self.initial_velocity),
        ] {
            if !v.iter().all(|c| c.is_finite()) {
                return Err(ConfigError::NonFinite { field });
            }
        }
        Ok(())
    }
}

impl Default for SpacecraftConfig {
    fn default() -> Self {
        Self {
            name: "Spacecraft".into(),
            planet: CelestialBody::moon(),
            dry_mass: 1_300.0,
            inertia: Vector3::new(2_500.0, 2_500.0, 2_000.0),
            engine: EngineConfig::default(),
            rcs: RcsConfig::default(),
            flight_control: FlightControlConfig::default(),
            fuel_mass: 230.0,
            oxidizer_mass: 368.0,
            rcs_propellant_mass: 40.0,
            tank_pressure: 2.4e6,
            rcs_tank_pressure: 1.5e6,
            power_capacity: 2_000.0,
            rcs_threshold: DEFAULT_RCS_THRESHOLD,
            initial_position: Vector3::zeros(),
            initial_velocity: Vector3::zeros(),
            initial_attitude: UnitQuaternion::identity(),
            surface_elevation: 0.0,
            sas_mode: SasMode::Off,
            autopilot_mode: AutopilotMode::Off,
            gimbal_autopilot: false,
            ignite_on_start: false,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, min, max })
    }
}

// ---------------------------------------------------------------------------
// Spacecraft builder
// ---------------------------------------------------------------------------

pub struct SpacecraftBuilder {
    config: SpacecraftConfig,
}

impl SpacecraftBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { config: SpacecraftConfig { name: name.into(), ..SpacecraftConfig::default() } }
    }

    pub fn planet(mut self, v: CelestialBody) -> Self { self.config.planet = v; self }
    pub fn dry_mass(mut self, v: f64) -> Self { self.config.dry_mass = v; self }
    pub fn inertia(mut self, v: Vector3<f64>) -> Self { self.config.inertia = v; self }
    pub fn engine(mut self, v: EngineConfig) -> Self { self.config.engine = v; self }
    pub fn rcs(mut self, v: RcsConfig) -> Self { self.config.rcs = v; self }
    pub fn flight_control(mut self, v: FlightControlConfig) -> Self { self.config.flight_control = v; self }
    pub fn fuel_mass(mut self, v: f64) -> Self { self.config.fuel_mass = v; self }
    pub fn oxidizer_mass(mut self, v: f64) -> Self { self.config.oxidizer_mass = v; self }
    pub fn rcs_propellant_mass(mut self, v: f64) -> Self { self.config.rcs_propellant_mass = v; self }
    pub fn tank_pressure(mut self, v: f64) -> Self { self.config.tank_pressure = v; self }
    pub fn power_capacity(mut self, v: f64) -> Self { self.config.power_capacity = v; self }
    pub fn rcs_threshold(mut self, v: f64) -> Self { self.config.rcs_threshold = v; self }
    pub fn position(mut self, v: Vector3<f64>) -> Self { self.config.initial_position = v; self }
    pub fn velocity(mut self, v: Vector3<f64>) -> Self { self.config.initial_velocity = v; self }
    pub fn attitude(mut self, v: UnitQuaternion<f64>) -> Self { self.config.initial_attitude = v; self }
    pub fn surface_elevation(mut self, v: f64) -> Self { self.config.surface_elevation = v; self }
    pub fn sas_mode(mut self, v: SasMode) -> Self { self.config.sas_mode = v; self }
    pub fn autopilot_mode(mut self, v: AutopilotMode) -> Self { self.config.autopilot_mode = v; self }
    pub fn gimbal_autopilot(mut self, v: bool) -> Self { self.config.gimbal_autopilot = v; self }
    pub fn ignite_on_start(mut self, v: bool) -> Self { self.config.ignite_on_start = v; self }

    /// Split a total main-engine propellant load by the engine mixture ratio.
    pub fn main_propellant(mut self, total: f64) -> Self {
        let mr = self.config.engine.mixture_ratio;
        self.config.fuel_mass = total / (1.0 + mr);
        self.config.oxidizer_mass = total * mr / (1.0 + mr);
        self
    }

    pub fn build(self) -> Result<SpacecraftConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ---------------------------------------------------------------------------
// Preset vehicles
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;

    /// Single-engine lunar lander descending from 1 km with a suicide burn.
    pub fn lunar_lander() -> SpacecraftConfig {
        SpacecraftConfig {
            name: "Lunar Lander".into(),
            planet: CelestialBody::moon(),
            dry_mass: 1_300.0,
            inertia: Vector3::new(2_500.0, 2_500.0, 2_000.0),
            engine: EngineConfig::default(),
            rcs: RcsConfig::default(),
            flight_control: FlightControlConfig::default(),
            fuel_mass: 230.0,
            oxidizer_mass: 368.0,
            rcs_propellant_mass: 40.0,
            tank_pressure: 2.4e6,
            rcs_tank_pressure: 1.5e6,
            power_capacity: 2_000.0,
            rcs_threshold: DEFAULT_RCS_THRESHOLD,
            initial_position: Vector3::new(0.0, 0.0, 1_000.0),
            initial_velocity: Vector3::new(0.0, 0.0, -30.0),
            initial_attitude: UnitQuaternion::identity(),
            surface_elevation: 0.0,
            sas_mode: SasMode::RadialOut,
            autopilot_mode: AutopilotMode::SuicideBurn,
            gimbal_autopilot: false,
            ignite_on_start: true,
        }
    }

    /// Lander hovering at 100 m over Mars under the hover autopilot.
    pub fn mars_hopper() -> SpacecraftConfig {
        SpacecraftConfig {
            name: "Mars Hopper".into(),
            planet: CelestialBody::mars(),
            initial_position: Vector3::new(0.0, 0.0, 100.0),
            sas_mode: SasMode::Stability,
            autopilot_mode: AutopilotMode::Hover,
            ignite_on_start: true,
            ..SpacecraftConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        assert!(presets::lunar_lander().validate().is_ok());
        assert!(presets::mars_hopper().validate().is_ok());
    }

    #[test]
    fn lander_can_land() {
        let c = presets::lunar_lander();
        assert!(c.twr() > 1.5, "TWR {:.2}", c.twr());
        assert!(c.delta_v() > 500.0, "dv {:.0}", c.delta_v());
    }

    #[test]
    fn builder_splits_propellant_by_mixture_ratio() {
        let c = SpacecraftBuilder::new("Test").main_propellant(520.0).build().unwrap();
        assert!((c.fuel_mass - 200.0).abs() < 1e-9);
        assert!((c.oxidizer_mass - 320.0).abs() < 1e-9);
        assert_eq!(c.name, "Test");
    }

    #[test]
    fn validation_rejects_bad_values() {
        let err = SpacecraftBuilder::new("Bad").dry_mass(0.0).build().unwrap_err();
        assert_eq!(err, ConfigError::NonPositive { field: "dry_mass", value: 0.0 });
        assert!(err.to_string().contains("dry_mass"));

        let err = SpacecraftBuilder::new("Bad")
            .inertia(Vector3::new(1.0, -1.0, 1.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NonPositive { field: "inertia.y", .. }));

        let err = SpacecraftBuilder::new("Bad").rcs_threshold(1.5).build().unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));

        let err = SpacecraftBuilder::new("Bad")
            .velocity(Vector3::new(f64::NAN, 0.0, 0.0))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::NonFinite { field: "initial_velocity" });
    }

    #[test]
    fn config_survives_binary_transport() {
        let config = presets::lunar_lander();
        let bytes = bincode::serde::encode_to_vec(&config, bincode::config::standard()).unwrap();
        let (decoded, _): (SpacecraftConfig, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(decoded, config);
    }
}
