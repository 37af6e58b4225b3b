use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::dynamics::state::RigidBodyState;
use crate::gnc::{AutopilotMode, SasMode, ThrottleReason};
use crate::physics::gravity::CelestialBody;
use crate::propulsion::{EngineStatus, MainEngine};

// ---------------------------------------------------------------------------
// Tick input: immutable snapshot of the previous tick, read by flight control
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickInput {
    pub time: f64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub attitude: UnitQuaternion<f64>,
    pub angular_velocity: Vector3<f64>,
    pub altitude: f64,
    pub mass: f64,
    pub gravity: f64,                 // m/s^2, local magnitude
    pub body_center: Vector3<f64>,    // gravitating body centre, ENU
    pub thrust: f64,                  // N, current main engine thrust
    pub max_thrust: f64,              // N, full throttle under current health and feed
    pub max_gimbal_deg: f64,
}

impl TickInput {
    pub fn capture(body: &RigidBodyState, engine: &MainEngine, planet: &CelestialBody) -> Self {
        let altitude = body.altitude();
        Self {
            time: body.simulation_time,
            position: body.position,
            velocity: body.velocity,
            attitude: body.attitude,
            angular_velocity: body.angular_velocity,
            altitude,
            mass: body.total_mass(),
            gravity: planet.gravity_at(body.position.z),
            body_center: planet.center(),
            thrust: engine.thrust(),
            max_thrust: engine.available_thrust(),
            max_gimbal_deg: engine.config.max_gimbal_deg,
        }
    }

    pub fn vertical_speed(&self) -> f64 {
        self.velocity.z
    }

    /// Position relative to the centre of the gravitating body.
    pub fn radius_vector(&self) -> Vector3<f64> {
        self.position - self.body_center
    }

    /// Horizontal inertial velocity expressed in the body frame.
    pub fn horizontal_velocity_body(&self) -> Vector3<f64> {
        let horizontal = Vector3::new(self.velocity.x, self.velocity.y, 0.0);
        self.attitude.inverse() * horizontal
    }
}

impl Default for TickInput {
    fn default() -> Self {
        Self {
            time: 0.0,
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            attitude: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
            altitude: 0.0,
            mass: 1.0,
            gravity: 0.0,
            body_center: Vector3::zeros(),
            thrust: 0.0,
            max_thrust: 0.0,
            max_gimbal_deg: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tick output: record produced by the master loop for one tick
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickOutput {
    pub tick: u64,
    pub time: f64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub attitude: UnitQuaternion<f64>,
    pub angular_velocity: Vector3<f64>,
    pub altitude: f64,
    pub vertical_speed: f64,
    pub horizontal_speed: f64,
    pub mass: f64,
    pub propellant_mass: f64,
    pub rcs_propellant_mass: f64,
    pub engine_status: EngineStatus,
    pub throttle: f64,
    pub thrust: f64,
    pub gimbal_pitch_deg: f64,
    pub gimbal_yaw_deg: f64,
    pub engine_health: f64,
    pub chamber_temp: f64,
    pub sas_mode: SasMode,
    pub autopilot_mode: AutopilotMode,
    pub throttle_reason: Option<ThrottleReason>,
    pub rcs_command: Vector3<f64>,
    pub active_thrusters: usize,
    pub heat_generation: f64,
    pub surface_contact: bool,
}

impl Default for TickOutput {
    fn default() -> Self {
        Self {
            tick: 0,
            time: 0.0,
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            attitude: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
            altitude: 0.0,
            vertical_speed: 0.0,
            horizontal_speed: 0.0,
            mass: 0.0,
            propellant_mass: 0.0,
            rcs_propellant_mass: 0.0,
            engine_status: EngineStatus::Off,
            throttle: 0.0,
            thrust: 0.0,
            gimbal_pitch_deg: 0.0,
            gimbal_yaw_deg: 0.0,
            engine_health: 100.0,
            chamber_temp: 0.0,
            sas_mode: SasMode::Off,
            autopilot_mode: AutopilotMode::Off,
            throttle_reason: None,
            rcs_command: Vector3::zeros(),
            active_thrusters: 0,
            heat_generation: 0.0,
            surface_contact: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propulsion::EngineConfig;

    #[test]
    fn capture_reads_previous_body_state() {
        let mut body = RigidBodyState::new(1000.0, 200.0, Vector3::new(1.0, 1.0, 1.0));
        body.position = Vector3::new(5.0, 0.0, 300.0);
        body.velocity = Vector3::new(2.0, 0.0, -10.0);
        body.surface_elevation = 100.0;
        let engine = MainEngine::new(EngineConfig::default());
        let moon = CelestialBody::moon();

        let input = TickInput::capture(&body, &engine, &moon);
        assert!((input.altitude - 200.0).abs() < 1e-12);
        assert!((input.mass - 1200.0).abs() < 1e-12);
        assert!((input.vertical_speed() + 10.0).abs() < 1e-12);
        assert!(input.radius_vector().z > moon.radius);
        assert!((input.horizontal_velocity_body() - Vector3::new(2.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn capture_derates_max_thrust_for_feed_pressure() {
        let body = RigidBodyState::new(1000.0, 200.0, Vector3::new(1.0, 1.0, 1.0));
        let mut engine = MainEngine::new(EngineConfig::default());
        let moon = CelestialBody::moon();
        assert_eq!(TickInput::capture(&body, &engine, &moon).max_thrust, engine.config.max_thrust);

        engine.set_feed_conditions(engine.config.nominal_feed_pressure * 0.6, true);
        let input = TickInput::capture(&body, &engine, &moon);
        assert!((input.max_thrust - 0.6 * engine.config.max_thrust).abs() < 1e-9);
    }
}
