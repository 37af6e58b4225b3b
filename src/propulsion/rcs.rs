use std::str::FromStr;

use log::{debug, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::dynamics::state::G0;
use crate::sim::event::EventLog;

pub const THRUSTER_COUNT: usize = 12;

// ---------------------------------------------------------------------------
// RCS configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RcsConfig {
    pub thrust_per_thruster: f64, // N
    pub isp: f64,                 // s, cold gas
    pub arm: f64,                 // m, radial distance of each quad from the roll axis
    pub min_pulse: f64,           // s, advisory only
    pub max_duty_cycle: f64,      // advisory only
}

impl Default for RcsConfig {
    fn default() -> Self {
        Self {
            thrust_per_thruster: 440.0,
            isp: 70.0,
            arm: 1.5,
            min_pulse: 0.05,
            max_duty_cycle: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Thrusters and groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thruster {
    pub id: usize,
    pub position: Vector3<f64>,  // body frame, m
    pub direction: Vector3<f64>, // unit force direction, body frame
    pub thrust: f64,             // N
    pub active: bool,
    pub fired_seconds: f64,
    pub pulse_count: u64,
    current_pulse: f64,
}

impl Thruster {
    fn new(id: usize, position: Vector3<f64>, direction: Vector3<f64>, thrust: f64) -> Self {
        Self {
            id,
            position,
            direction: direction.normalize(),
            thrust,
            active: false,
            fired_seconds: 0.0,
            pulse_count: 0,
            current_pulse: 0.0,
        }
    }

    pub fn force(&self) -> Vector3<f64> {
        if self.active {
            self.direction * self.thrust
        } else {
            Vector3::zeros()
        }
    }
}

/// Logical control groups; each maps to a fixed set of thruster indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RcsGroup {
    PitchUp,
    PitchDown,
    YawLeft,
    YawRight,
    RollCw,
    RollCcw,
    TranslateForward,
    TranslateAft,
}

// Quad layout (index = 3 * quad + slot), quads at +X, +Y, -X, -Y on the CG plane.
// Slot 0 and 1 fire tangentially (0: +Z torque, 1: -Z torque), slot 2 fires along +Z.
const GROUP_TABLE: [(RcsGroup, &[usize]); 8] = [
    (RcsGroup::PitchUp, &[5]),
    (RcsGroup::PitchDown, &[11]),
    (RcsGroup::YawLeft, &[8]),
    (RcsGroup::YawRight, &[2]),
    (RcsGroup::RollCw, &[1, 4, 7, 10]),
    (RcsGroup::RollCcw, &[0, 3, 6, 9]),
    (RcsGroup::TranslateForward, &[4, 9]),
    (RcsGroup::TranslateAft, &[3, 10]),
];

impl RcsGroup {
    pub fn thrusters(self) -> &'static [usize] {
        GROUP_TABLE
            .iter()
            .find(|(group, _)| *group == self)
            .map(|(_, ids)| *ids)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RcsEvent {
    GroupActivated(RcsGroup),
    GroupDeactivated(RcsGroup),
    FuelStarved { supplied_fraction: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RcsTelemetry {
    pub active_thrusters: Vec<usize>,
    pub net_force: Vector3<f64>,
    pub net_torque: Vector3<f64>,
    pub mass_flow: f64,
    pub fuel_consumed: f64,
    pub supply_fraction: f64,
    pub total_pulses: u64,
}

// ---------------------------------------------------------------------------
// RCS cluster
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RcsCluster {
    pub config: RcsConfig,
    thrusters: [Thruster; THRUSTER_COUNT],
    supply_fraction: f64,
    fuel_consumed: f64,
    events: EventLog<RcsEvent>,
}

impl RcsCluster {
    pub fn new(config: RcsConfig) -> Self {
        let r = config.arm;
        let f = config.thrust_per_thruster;
        let quads = [
            Vector3::new(r, 0.0, 0.0),
            Vector3::new(0.0, r, 0.0),
            Vector3::new(-r, 0.0, 0.0),
            Vector3::new(0.0, -r, 0.0),
        ];
        let thrusters = std::array::from_fn(|id| {
            let position = quads[id / 3];
            // +Z cross radial gives the counter-clockwise tangent
            let ccw = Vector3::z().cross(&position.normalize());
            let direction = match id % 3 {
                0 => ccw,
                1 => -ccw,
                _ => Vector3::z(),
            };
            Thruster::new(id, position, direction, f)
        });
        Self {
            config,
            thrusters,
            supply_fraction: 1.0,
            fuel_consumed: 0.0,
            events: EventLog::new(),
        }
    }

    // --- Commands ---------------------------------------------------------

    pub fn activate(&mut self, group: RcsGroup) {
        let mut changed = false;
        for &id in group.thrusters() {
            changed |= self.fire(id);
        }
        if changed {
            debug!("RCS group {group} on");
            self.events.push(RcsEvent::GroupActivated(group));
        }
    }

    pub fn deactivate(&mut self, group: RcsGroup) {
        let mut changed = false;
        for &id in group.thrusters() {
            changed |= self.cut(id);
        }
        if changed {
            debug!("RCS group {group} off");
            self.events.push(RcsEvent::GroupDeactivated(group));
        }
    }

    /// Activate a group by its snake_case name. Unknown names are rejected.
    pub fn activate_group(&mut self, name: &str) -> bool {
        match RcsGroup::from_str(name) {
            Ok(group) => {
                self.activate(group);
                true
            }
            Err(_) => {
                warn!("Unknown RCS group '{name}'");
                false
            }
        }
    }

    pub fn deactivate_group(&mut self, name: &str) -> bool {
        match RcsGroup::from_str(name) {
            Ok(group) => {
                self.deactivate(group);
                true
            }
            Err(_) => {
                warn!("Unknown RCS group '{name}'");
                false
            }
        }
    }

    pub fn activate_thruster(&mut self, id: usize) -> bool {
        if id >= THRUSTER_COUNT {
            return false;
        }
        self.fire(id);
        true
    }

    pub fn deactivate_thruster(&mut self, id: usize) -> bool {
        if id >= THRUSTER_COUNT {
            return false;
        }
        self.cut(id);
        true
    }

    pub fn deactivate_all(&mut self) {
        for id in 0..THRUSTER_COUNT {
            self.cut(id);
        }
    }

    // --- Tick -------------------------------------------------------------

    pub fn update(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        for t in self.thrusters.iter_mut().filter(|t| t.active) {
            t.fired_seconds += dt;
            t.current_pulse += dt;
        }
    }

    /// Consume up to `available` kg for this tick and return the amount taken.
    pub fn consume_fuel(&mut self, dt: f64, available: f64) -> f64 {
        let desired = self.nominal_mass_flow() * dt.max(0.0);
        if desired <= 0.0 {
            self.supply_fraction = 1.0;
            return 0.0;
        }
        let consumed = desired.min(available.max(0.0));
        let fraction = consumed / desired;
        if fraction < 1.0 && self.supply_fraction >= 1.0 {
            warn!("RCS propellant starved: {:.0}% of demand", fraction * 100.0);
            self.events.push(RcsEvent::FuelStarved { supplied_fraction: fraction });
        }
        self.supply_fraction = fraction;
        self.fuel_consumed += consumed;
        consumed
    }

    // --- Outputs ----------------------------------------------------------

    /// Σ active thrust · direction, scaled by the propellant supply fraction.
    pub fn net_force(&self) -> Vector3<f64> {
        self.thrusters.iter().map(Thruster::force).sum::<Vector3<f64>>() * self.supply_fraction
    }

    /// Σ position × force over active thrusters.
    pub fn net_torque(&self) -> Vector3<f64> {
        self.thrusters
            .iter()
            .map(|t| t.position.cross(&t.force()))
            .sum::<Vector3<f64>>()
            * self.supply_fraction
    }

    pub fn mass_flow(&self) -> f64 {
        self.nominal_mass_flow() * self.supply_fraction
    }

    pub fn thrusters(&self) -> &[Thruster] {
        &self.thrusters
    }

    pub fn thruster(&self, id: usize) -> Option<&Thruster> {
        self.thrusters.get(id)
    }

    pub fn active_thrusters(&self) -> Vec<usize> {
        self.thrusters.iter().filter(|t| t.active).map(|t| t.id).collect()
    }

    pub fn fuel_consumed(&self) -> f64 {
        self.fuel_consumed
    }

    pub fn events(&self) -> &EventLog<RcsEvent> {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn telemetry(&self) -> RcsTelemetry {
        RcsTelemetry {
            active_thrusters: self.active_thrusters(),
            net_force: self.net_force(),
            net_torque: self.net_torque(),
            mass_flow: self.mass_flow(),
            fuel_consumed: self.fuel_consumed,
            supply_fraction: self.supply_fraction,
            total_pulses: self.thrusters.iter().map(|t| t.pulse_count).sum(),
        }
    }

    // --- Internals --------------------------------------------------------

    fn nominal_mass_flow(&self) -> f64 {
        if self.config.isp <= 0.0 {
            return 0.0;
        }
        let thrust: f64 = self.thrusters.iter().filter(|t| t.active).map(|t| t.thrust).sum();
        thrust / (self.config.isp * G0)
    }

    /// Rising edge only counts a pulse.
    fn fire(&mut self, id: usize) -> bool {
        let t = &mut self.thrusters[id];
        if t.active {
            return false;
        }
        t.active = true;
        t.pulse_count += 1;
        t.current_pulse = 0.0;
        true
    }

    fn cut(&mut self, id: usize) -> bool {
        let min_pulse = self.config.min_pulse;
        let t = &mut self.thrusters[id];
        if !t.active {
            return false;
        }
        t.active = false;
        if t.current_pulse < min_pulse {
            debug!("Thruster {id} pulse {:.3}s shorter than minimum {:.3}s", t.current_pulse, min_pulse);
        }
        true
    }
}

impl Default for RcsCluster {
    fn default() -> Self {
        Self::new(RcsConfig::default())
    }
}
