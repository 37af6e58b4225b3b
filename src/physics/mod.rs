pub mod gravity;

pub use gravity::CelestialBody;
