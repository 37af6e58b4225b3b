use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// External collaborators of the master loop
// ---------------------------------------------------------------------------

/// A propellant tank owned outside the flight-dynamics core.
pub trait FuelTank {
    /// Propellant currently held (kg).
    fn current_mass(&self) -> f64;

    /// Remove `amount` kg. Returns false, leaving the tank untouched, when
    /// the tank holds less than requested.
    fn consume(&mut self, amount: f64) -> bool;

    /// Feed pressure (Pa).
    fn pressure(&self) -> f64;
}

/// Electrical bus arbitration.
pub trait PowerBudget {
    /// Ask for `watts` on behalf of `consumer`; returns the power granted.
    fn request_power(&mut self, consumer: &str, watts: f64) -> f64;
}

/// Receives per-component heat loads.
pub trait ThermalSink {
    fn set_heat_load(&mut self, component: &str, watts: f64);
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// Blowdown tank: pressure falls linearly from `initial_pressure` to
/// `residual_pressure` as the tank empties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleTank {
    pub name: String,
    pub capacity: f64,
    pub mass: f64,
    pub initial_pressure: f64,
    pub residual_pressure: f64,
}

impl SimpleTank {
    pub fn new(name: impl Into<String>, mass: f64, pressure: f64) -> Self {
        let mass = mass.max(0.0);
        Self {
            name: name.into(),
            capacity: mass,
            mass,
            initial_pressure: pressure,
            residual_pressure: 0.5 * pressure,
        }
    }

    /// A tank whose pressure stays fixed regardless of fill level.
    pub fn regulated(name: impl Into<String>, mass: f64, pressure: f64) -> Self {
        Self { residual_pressure: pressure, ..Self::new(name, mass, pressure) }
    }

    pub fn fill_fraction(&self) -> f64 {
        if self.capacity > 0.0 {
            (self.mass / self.capacity).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Add propellant up to capacity; returns the amount accepted.
    pub fn refill(&mut self, amount: f64) -> f64 {
        let accepted = amount.max(0.0).min(self.capacity - self.mass);
        self.mass += accepted;
        accepted
    }
}

impl FuelTank for SimpleTank {
    fn current_mass(&self) -> f64 {
        self.mass
    }

    fn consume(&mut self, amount: f64) -> bool {
        if amount < 0.0 || amount > self.mass + 1e-12 {
            debug!("Tank {} refused {:.4} kg ({:.4} kg left)", self.name, amount, self.mass);
            return false;
        }
        self.mass = (self.mass - amount).max(0.0);
        true
    }

    fn pressure(&self) -> f64 {
        if self.mass <= 0.0 {
            return 0.0;
        }
        let f = self.fill_fraction();
        self.residual_pressure + (self.initial_pressure - self.residual_pressure) * f
    }
}

/// Bus with a fixed capacity, allocated first-come each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedPowerBudget {
    pub capacity: f64,
    allocations: HashMap<String, f64>,
}

impl FixedPowerBudget {
    pub fn new(capacity: f64) -> Self {
        Self { capacity: capacity.max(0.0), allocations: HashMap::new() }
    }

    pub fn allocated(&self) -> f64 {
        self.allocations.values().sum()
    }

    pub fn allocation(&self, consumer: &str) -> f64 {
        self.allocations.get(consumer).copied().unwrap_or(0.0)
    }
}

impl PowerBudget for FixedPowerBudget {
    fn request_power(&mut self, consumer: &str, watts: f64) -> f64 {
        // A repeated request replaces the consumer's previous allocation
        let previous = self.allocations.remove(consumer).unwrap_or(0.0);
        let free = (self.capacity - self.allocated()).max(0.0);
        let granted = watts.max(0.0).min(free);
        if granted < watts {
            debug!("Power request from {consumer} cut to {granted:.0} of {watts:.0} W (had {previous:.0} W)");
        }
        self.allocations.insert(consumer.to_string(), granted);
        granted
    }
}

/// Records the latest heat load reported by each component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatLedger {
    loads: HashMap<String, f64>,
}

impl HeatLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, component: &str) -> f64 {
        self.loads.get(component).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.loads.values().sum()
    }
}

impl ThermalSink for HeatLedger {
    fn set_heat_load(&mut self, component: &str, watts: f64) {
        self.loads.insert(component.to_string(), watts);
    }
}
