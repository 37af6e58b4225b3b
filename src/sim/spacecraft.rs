use log::{info, warn};

use super::event::{EventKind, SimEvent};
use super::resources::{FixedPowerBudget, FuelTank, HeatLedger, PowerBudget, SimpleTank, ThermalSink};
use super::tick::{TickInput, TickOutput};
use crate::dynamics::rigid_body::{PhysicsInput, RigidBody};
use crate::dynamics::state::{BodyEvent, RigidBodyState};
use crate::gnc::{Controller, FlightCommand, FlightControlSystem, ATTITUDE_GROUPS};
use crate::propulsion::{EngineEvent, MainEngine, RcsCluster};
use crate::vehicle::{ConfigError, SpacecraftConfig};

/// Power bus consumer id of the main engine turbopump.
pub const PUMP_CONSUMER: &str = "main_engine_pump";
/// Thermal component id of the main engine.
pub const ENGINE_HEAT_COMPONENT: &str = "main_engine";

// ---------------------------------------------------------------------------
// Master integration loop
// ---------------------------------------------------------------------------

/// One spacecraft: propulsion, flight control and rigid body, advanced in a
/// fixed phase order each tick. Tanks, power and thermal are collaborators
/// owned behind traits so an outer simulation can substitute its own.
pub struct Spacecraft<C: Controller = FlightControlSystem> {
    pub config: SpacecraftConfig,
    pub engine: MainEngine,
    pub rcs: RcsCluster,
    pub controller: C,
    body: RigidBody,
    fuel_tank: Box<dyn FuelTank>,
    oxidizer_tank: Box<dyn FuelTank>,
    rcs_tank: Box<dyn FuelTank>,
    power: Box<dyn PowerBudget>,
    thermal: Box<dyn ThermalSink>,
    tick: u64,
}

impl Spacecraft<FlightControlSystem> {
    /// Build a spacecraft flown by the built-in flight control system, with
    /// modes taken from the configuration.
    pub fn new(config: SpacecraftConfig) -> Result<Self, ConfigError> {
        let mut fcs = FlightControlSystem::new(config.flight_control.clone());
        fcs.set_sas_mode(config.sas_mode);
        fcs.set_autopilot_mode(config.autopilot_mode);
        fcs.set_gimbal_autopilot(config.gimbal_autopilot);
        Self::with_controller(config, fcs)
    }
}

impl<C: Controller> Spacecraft<C> {
    pub fn with_controller(config: SpacecraftConfig, controller: C) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut state = RigidBodyState::new(config.dry_mass, config.propellant_mass(), config.inertia);
        state.position = config.initial_position;
        state.velocity = config.initial_velocity;
        state.attitude = config.initial_attitude;
        state.surface_elevation = config.surface_elevation;

        let fuel_tank = SimpleTank::new("fuel", config.fuel_mass, config.tank_pressure);
        let oxidizer_tank = SimpleTank::new("oxidizer", config.oxidizer_mass, config.tank_pressure);
        let rcs_tank = SimpleTank::regulated("rcs", config.rcs_propellant_mass, config.rcs_tank_pressure);

        let mut craft = Self {
            engine: MainEngine::new(config.engine.clone()),
            rcs: RcsCluster::new(config.rcs.clone()),
            controller,
            body: RigidBody::new(state),
            fuel_tank: Box::new(fuel_tank),
            oxidizer_tank: Box::new(oxidizer_tank),
            rcs_tank: Box::new(rcs_tank),
            power: Box::new(FixedPowerBudget::new(config.power_capacity)),
            thermal: Box::new(HeatLedger::new()),
            tick: 0,
            config,
        };
        info!(
            "{} ready: {:.0} kg, TWR {:.2}, controller {}",
            craft.config.name,
            craft.config.total_mass(),
            craft.config.twr(),
            craft.controller.name()
        );
        if craft.config.ignite_on_start && !craft.engine.ignite() {
            warn!("Start-up ignition refused");
        }
        Ok(craft)
    }

    // --- Collaborators ------------------------------------------------------

    pub fn set_tanks(&mut self, fuel: Box<dyn FuelTank>, oxidizer: Box<dyn FuelTank>, rcs: Box<dyn FuelTank>) {
        self.fuel_tank = fuel;
        self.oxidizer_tank = oxidizer;
        self.rcs_tank = rcs;
    }

    pub fn set_power_budget(&mut self, power: Box<dyn PowerBudget>) {
        self.power = power;
    }

    pub fn set_thermal_sink(&mut self, thermal: Box<dyn ThermalSink>) {
        self.thermal = thermal;
    }

    pub fn set_surface_elevation(&mut self, elevation: f64) {
        self.body.set_surface_elevation(elevation);
    }

    // --- Accessors ----------------------------------------------------------

    pub fn state(&self) -> &RigidBodyState {
        self.body.state()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn main_propellant(&self) -> f64 {
        self.fuel_tank.current_mass() + self.oxidizer_tank.current_mass()
    }

    pub fn rcs_propellant(&self) -> f64 {
        self.rcs_tank.current_mass()
    }

    pub fn propellant_remaining(&self) -> f64 {
        self.main_propellant() + self.rcs_propellant()
    }

    /// Snapshot flight control reads at the start of the next tick.
    pub fn tick_input(&self) -> TickInput {
        TickInput::capture(self.body.state(), &self.engine, &self.config.planet)
    }

    // --- Tick ---------------------------------------------------------------

    pub fn update(&mut self, dt: f64) -> TickOutput {
        // 1. Electrical: turbopump power
        let required = self.engine.config.pump_power;
        let granted = self.power.request_power(PUMP_CONSUMER, required);
        let pump_powered = granted >= required;

        // 2. Main engine state machine
        let feed_pressure = self.fuel_tank.pressure().min(self.oxidizer_tank.pressure());
        self.engine.set_feed_conditions(feed_pressure, pump_powered);
        self.engine.update(dt);

        // 3. RCS pulse bookkeeping
        self.rcs.update(dt);

        // 4. Flight control, from the previous tick's physics state
        let input = self.tick_input();
        let command = self.controller.control(&input, dt);
        self.apply_command(&command);

        // 5. Propellant
        let draw = self.engine.consume_propellant(
            dt,
            self.fuel_tank.current_mass(),
            self.oxidizer_tank.current_mass(),
        );
        withdraw(self.fuel_tank.as_mut(), draw.fuel, "fuel");
        withdraw(self.oxidizer_tank.as_mut(), draw.oxidizer, "oxidizer");
        let rcs_used = self.rcs.consume_fuel(dt, self.rcs_tank.current_mass());
        withdraw(self.rcs_tank.as_mut(), rcs_used, "rcs");

        // 6. Physics
        let altitude_datum = self.body.state().position.z;
        let physics = PhysicsInput {
            force_body: self.engine.thrust_vector() + self.rcs.net_force(),
            torque_body: self.engine.torque() + self.rcs.net_torque(),
            gravity: self.config.planet.gravity_accel(altitude_datum),
            propellant_mass: self.propellant_remaining(),
        };
        self.body.update(&physics, dt);

        // 7. Thermal
        self.thermal.set_heat_load(ENGINE_HEAT_COMPONENT, self.engine.heat_generation_w());

        // 8. Bookkeeping
        let output = self.record(&command);

        // 9. Tick counter
        self.tick += 1;
        output
    }

    fn apply_command(&mut self, command: &FlightCommand) {
        if let Some(throttle) = command.throttle {
            self.engine.set_throttle(throttle.throttle);
        }
        if let Some(gimbal) = command.gimbal {
            self.engine.set_gimbal(gimbal.pitch_deg, gimbal.yaw_deg);
        }
        if command.controls_rcs() {
            let groups = command.rcs_groups(self.config.rcs_threshold);
            for group in ATTITUDE_GROUPS {
                if groups.contains(&group) {
                    self.rcs.activate(group);
                } else {
                    self.rcs.deactivate(group);
                }
            }
        }
    }

    fn record(&self, command: &FlightCommand) -> TickOutput {
        let s = self.body.state();
        let (gimbal_pitch_deg, gimbal_yaw_deg) = self.engine.gimbal();
        let altitude = s.altitude();
        TickOutput {
            tick: self.tick,
            time: s.simulation_time,
            position: s.position,
            velocity: s.velocity,
            attitude: s.attitude,
            angular_velocity: s.angular_velocity,
            altitude,
            vertical_speed: s.vertical_speed(),
            horizontal_speed: s.horizontal_velocity().norm(),
            mass: s.total_mass(),
            propellant_mass: self.main_propellant(),
            rcs_propellant_mass: self.rcs_propellant(),
            engine_status: self.engine.status(),
            throttle: self.engine.throttle(),
            thrust: self.engine.thrust(),
            gimbal_pitch_deg,
            gimbal_yaw_deg,
            engine_health: self.engine.health(),
            chamber_temp: self.engine.chamber_temp(),
            sas_mode: command.sas_mode,
            autopilot_mode: command.autopilot_mode,
            throttle_reason: command.throttle.map(|t| t.reason),
            rcs_command: command.rcs,
            active_thrusters: self.rcs.active_thrusters().len(),
            heat_generation: self.engine.heat_generation_w(),
            surface_contact: altitude <= 0.0,
        }
    }

    /// Convert and clear the component event logs accumulated since the last call.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        let time = self.body.state().simulation_time;
        let mut events: Vec<SimEvent> = self
            .engine
            .events()
            .iter()
            .filter_map(|e| {
                let kind = match e {
                    EngineEvent::Ignition => EventKind::Ignition,
                    EngineEvent::Flameout => EventKind::Flameout,
                    EngineEvent::Failure => EventKind::EngineFailure,
                    EngineEvent::Overheat => EventKind::Custom("Engine overheat".into()),
                    _ => return None,
                };
                Some(SimEvent { time, kind })
            })
            .collect();

        events.extend(self.body.state().events.iter().filter_map(|e| match e {
            BodyEvent::SurfaceContact { time, vertical_speed } => Some(SimEvent {
                time: *time,
                kind: EventKind::Touchdown { vertical_speed: *vertical_speed },
            }),
            BodyEvent::PropellantDepleted { time } => Some(SimEvent {
                time: *time,
                kind: EventKind::Custom("Propellant depleted".into()),
            }),
            _ => None,
        }));

        self.engine.clear_events();
        self.rcs.clear_events();
        self.body.clear_events();
        events
    }
}

fn withdraw(tank: &mut dyn FuelTank, amount: f64, name: &str) {
    if amount > 0.0 && !tank.consume(amount) {
        warn!("{name} tank refused {amount:.4} kg");
    }
}
