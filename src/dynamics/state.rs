use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::sim::event::EventLog;

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

pub const G0: f64 = 9.80665; // standard gravity, m/s^2, used for Isp

// ---------------------------------------------------------------------------
// Rigid-body events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyEvent {
    /// Altitude above terrain crossed zero.
    SurfaceContact { time: f64, vertical_speed: f64 },
    PropellantDepleted { time: f64 },
    Refueled { time: f64, added_kg: f64 },
    /// Update skipped translational integration because total mass was not positive.
    InvalidMass { time: f64, mass: f64 },
}

// ---------------------------------------------------------------------------
// Rigid-body state: position, velocity, attitude, angular rate, mass
// ---------------------------------------------------------------------------

/// Frame: local East-North-Up over a flat surface, +Z up.
/// Body frame: +Z is the main engine thrust axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBodyState {
    pub position: Vector3<f64>,           // m, inertial ENU
    pub velocity: Vector3<f64>,           // m/s, inertial
    pub attitude: UnitQuaternion<f64>,    // body→inertial rotation
    pub angular_velocity: Vector3<f64>,   // rad/s, body frame
    pub dry_mass: f64,                    // kg
    pub propellant_mass: f64,             // kg
    pub inertia: Vector3<f64>,            // [Ixx, Iyy, Izz], kg·m^2
    pub surface_elevation: f64,           // m, terrain height under the craft
    pub simulation_time: f64,             // s
    pub events: EventLog<BodyEvent>,
}

impl RigidBodyState {
    pub fn new(dry_mass: f64, propellant_mass: f64, inertia: Vector3<f64>) -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            attitude: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
            dry_mass,
            propellant_mass,
            inertia,
            surface_elevation: 0.0,
            simulation_time: 0.0,
            events: EventLog::new(),
        }
    }

    pub fn total_mass(&self) -> f64 {
        self.dry_mass + self.propellant_mass
    }

    /// Height above the terrain directly below.
    pub fn altitude(&self) -> f64 {
        self.position.z - self.surface_elevation
    }

    pub fn vertical_speed(&self) -> f64 {
        self.velocity.z
    }

    /// Inertial velocity with the vertical component removed.
    pub fn horizontal_velocity(&self) -> Vector3<f64> {
        Vector3::new(self.velocity.x, self.velocity.y, 0.0)
    }

    /// Body Z-axis (thrust direction) in inertial frame.
    pub fn body_z(&self) -> Vector3<f64> {
        self.attitude * Vector3::z()
    }

    /// Tilt of the thrust axis from local vertical (rad).
    pub fn tilt(&self) -> f64 {
        self.body_z().z.clamp(-1.0, 1.0).acos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn altitude_is_relative_to_terrain() {
        let mut s = RigidBodyState::new(1000.0, 500.0, Vector3::new(1.0, 1.0, 1.0));
        s.position.z = 120.0;
        s.surface_elevation = 20.0;
        assert!((s.altitude() - 100.0).abs() < 1e-12);
        assert!((s.total_mass() - 1500.0).abs() < 1e-12);
    }

    #[test]
    fn upright_body_has_zero_tilt() {
        let s = RigidBodyState::new(1.0, 0.0, Vector3::new(1.0, 1.0, 1.0));
        assert!(s.tilt().abs() < 1e-12);
        assert!((s.body_z() - Vector3::z()).norm() < 1e-12);
    }
}
