use log::warn;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::dynamics::state::{BodyEvent, RigidBodyState};

// ---------------------------------------------------------------------------
// Per-tick physics input
// ---------------------------------------------------------------------------

/// Everything the integrator needs for one step, assembled by the master loop.
#[derive(Debug, Clone)]
pub struct PhysicsInput {
    pub force_body: Vector3<f64>,      // N, engine + RCS, body frame
    pub torque_body: Vector3<f64>,     // N·m, body frame
    pub gravity: Vector3<f64>,         // m/s^2, inertial
    pub propellant_mass: f64,          // kg remaining after this tick's consumption
}

impl Default for PhysicsInput {
    fn default() -> Self {
        Self {
            force_body: Vector3::zeros(),
            torque_body: Vector3::zeros(),
            gravity: Vector3::zeros(),
            propellant_mass: 0.0,
        }
    }
}

/// State derivative evaluated at the start of a step.
#[derive(Debug, Clone)]
pub struct Deriv {
    pub dvel: Vector3<f64>,       // inertial acceleration
    pub domega: Vector3<f64>,     // angular acceleration, body frame
}

// ---------------------------------------------------------------------------
// Rigid body: explicit Euler translation + Euler's equation + quaternion kinematics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RigidBody {
    state: RigidBodyState,
}

impl RigidBody {
    pub fn new(state: RigidBodyState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &RigidBodyState {
        &self.state
    }

    pub fn clear_events(&mut self) {
        self.state.events.clear();
    }

    /// Terrain height is owned by the outer world; the body only reports against it.
    pub fn set_surface_elevation(&mut self, elevation: f64) {
        self.state.surface_elevation = elevation;
    }

    /// Advance the body by `dt`.
    pub fn update(&mut self, input: &PhysicsInput, dt: f64) {
        let time = self.state.simulation_time;
        let prev_altitude = self.state.altitude();

        self.apply_propellant(input.propellant_mass, time);

        let d = derivatives(&self.state, input);
        let mass = self.state.total_mass();
        if mass <= 0.0 {
            warn!("Non-positive total mass {mass:.3} kg, skipping translation");
            self.state.events.push(BodyEvent::InvalidMass { time, mass });
        }

        // Translation: v += a dt, then r += v dt
        self.state.velocity += d.dvel * dt;
        self.state.position += self.state.velocity * dt;

        // Rotation: ω += ω̇ dt, then q += ½ q ⊗ ω dt, renormalize
        self.state.angular_velocity += d.domega * dt;
        self.state.attitude = integrate_attitude(&self.state.attitude, &self.state.angular_velocity, dt);

        self.state.simulation_time += dt;

        let altitude = self.state.altitude();
        if prev_altitude > 0.0 && altitude <= 0.0 {
            self.state.events.push(BodyEvent::SurfaceContact {
                time: self.state.simulation_time,
                vertical_speed: self.state.velocity.z,
            });
        }
    }

    fn apply_propellant(&mut self, propellant_mass: f64, time: f64) {
        let new_mass = propellant_mass.max(0.0);
        let old_mass = self.state.propellant_mass;
        if new_mass > old_mass {
            self.state.events.push(BodyEvent::Refueled { time, added_kg: new_mass - old_mass });
        } else if old_mass > 0.0 && new_mass <= 0.0 {
            self.state.events.push(BodyEvent::PropellantDepleted { time });
        }
        self.state.propellant_mass = new_mass;
    }
}

/// Accelerations for the current state under the given input.
///
/// Forces: thrust (body → inertial) plus gravity.
/// Torques: Euler's equation I·ω̇ = τ − ω × (I·ω) with diagonal I.
pub fn derivatives(state: &RigidBodyState, input: &PhysicsInput) -> Deriv {
    let mass = state.total_mass();
    let dvel = if mass > 0.0 {
        let f_inertial = state.attitude * input.force_body;
        f_inertial / mass + input.gravity
    } else {
        Vector3::zeros()
    };

    let omega = state.angular_velocity;
    let i_omega = state.inertia.component_mul(&omega);
    let net = input.torque_body - omega.cross(&i_omega);
    let domega = Vector3::new(
        axis_accel(net.x, state.inertia.x),
        axis_accel(net.y, state.inertia.y),
        axis_accel(net.z, state.inertia.z),
    );

    Deriv { dvel, domega }
}

fn axis_accel(torque: f64, inertia: f64) -> f64 {
    if inertia > 0.0 {
        torque / inertia
    } else {
        0.0
    }
}

/// q̇ = ½ q ⊗ (0, ω), one Euler step, renormalized.
pub fn integrate_attitude(q: &UnitQuaternion<f64>, omega: &Vector3<f64>, dt: f64) -> UnitQuaternion<f64> {
    let omega_quat = Quaternion::new(0.0, omega.x, omega.y, omega.z);
    let dquat = q.quaternion() * omega_quat * 0.5;
    let q_raw = q.quaternion() + dquat * dt;
    UnitQuaternion::new_normalize(q_raw)
}
