use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Local gravity of the body the craft is flying over
// ---------------------------------------------------------------------------

/// Single gravitating body. Only the local field is modelled; no N-body terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialBody {
    pub name: String,
    pub surface_gravity: f64, // m/s^2
    pub radius: f64,          // m, mean radius
}

impl CelestialBody {
    pub fn moon() -> Self {
        Self { name: "Moon".into(), surface_gravity: 1.62, radius: 1_737_400.0 }
    }

    pub fn mars() -> Self {
        Self { name: "Mars".into(), surface_gravity: 3.721, radius: 3_389_500.0 }
    }

    pub fn earth() -> Self {
        Self { name: "Earth".into(), surface_gravity: 9.80665, radius: 6_371_000.0 }
    }

    /// Gravity magnitude at a given height above the datum (inverse-square).
    pub fn gravity_at(&self, altitude: f64) -> f64 {
        let alt = altitude.max(0.0);
        self.surface_gravity * (self.radius / (self.radius + alt)).powi(2)
    }

    /// Gravitational acceleration vector (ENU, pointing down).
    pub fn gravity_accel(&self, altitude: f64) -> Vector3<f64> {
        Vector3::new(0.0, 0.0, -self.gravity_at(altitude))
    }

    /// Position of the body centre in the local ENU frame.
    pub fn center(&self) -> Vector3<f64> {
        Vector3::new(0.0, 0.0, -self.radius)
    }
}

impl Default for CelestialBody {
    fn default() -> Self {
        Self::moon()
    }
}
