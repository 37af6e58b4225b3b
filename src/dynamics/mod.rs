pub mod state;
pub mod rigid_body;

pub use state::{BodyEvent, RigidBodyState, G0};
pub use rigid_body::{derivatives, integrate_attitude, PhysicsInput, RigidBody};
