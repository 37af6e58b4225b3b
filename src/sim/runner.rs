use log::info;
use serde::{Deserialize, Serialize};

use super::event::{ApogeeDetector, EventDetector, EventKind, SimEvent, SuicideBurnDetector};
use super::spacecraft::Spacecraft;
use super::tick::TickOutput;
use crate::gnc::Controller;
use crate::vehicle::{ConfigError, SpacecraftConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub dt: f64,       // s
    pub max_time: f64, // s
}

impl Default for SimConfig {
    fn default() -> Self {
        Self { dt: 0.05, max_time: 600.0 }
    }
}

// ---------------------------------------------------------------------------
// Multi-tick simulation driver
// ---------------------------------------------------------------------------

/// Run an existing spacecraft until surface contact or `max_time`.
/// Returns one record per tick and every event raised along the way.
pub fn simulate_with<C: Controller>(
    craft: &mut Spacecraft<C>,
    config: &SimConfig,
    detectors: &mut [Box<dyn EventDetector>],
) -> (Vec<TickOutput>, Vec<SimEvent>) {
    let capacity = (config.max_time / config.dt.max(1e-9)) as usize + 1;
    let mut records: Vec<TickOutput> = Vec::with_capacity(capacity.min(200_000));
    let mut events = Vec::new();

    if config.dt <= 0.0 {
        return (records, events);
    }

    let start = craft.state().simulation_time;
    while craft.state().simulation_time - start < config.max_time {
        let out = craft.update(config.dt);

        if let Some(prev) = records.last() {
            for detector in detectors.iter_mut() {
                if let Some(kind) = detector.check(prev, &out) {
                    events.push(SimEvent { time: out.time, kind });
                }
            }
        }

        let drained = craft.drain_events();
        let touchdown = drained.iter().any(|e| matches!(e.kind, EventKind::Touchdown { .. }));
        events.extend(drained);
        records.push(out);

        if touchdown {
            info!("Touchdown at t={:.2}s", craft.state().simulation_time);
            break;
        }
    }

    (records, events)
}

/// Build the configured spacecraft and fly it with the standard detectors.
pub fn simulate(
    spacecraft: SpacecraftConfig,
    config: &SimConfig,
) -> Result<(Vec<TickOutput>, Vec<SimEvent>), ConfigError> {
    let mut craft = Spacecraft::new(spacecraft)?;
    let mut detectors: Vec<Box<dyn EventDetector>> = vec![Box::new(SuicideBurnDetector), Box::new(ApogeeDetector)];
    Ok(simulate_with(&mut craft, config, &mut detectors))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
