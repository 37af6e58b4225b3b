use std::io::{self, Write};

use crate::sim::event::{EventKind, SimEvent};
use crate::sim::tick::TickOutput;
use crate::vehicle::SpacecraftConfig;

/// Summary statistics computed from a descent's tick records.
#[derive(Debug, Clone, PartialEq)]
pub struct LandingSummary {
    pub landed: bool,
    pub flight_time: f64,
    pub touchdown_speed: f64,
    pub touchdown_horizontal_speed: f64,
    pub max_descent_rate: f64,
    pub max_tilt_deg: f64,
    pub burn_start_altitude: Option<f64>,
    pub propellant_used: f64,
    pub rcs_propellant_used: f64,
    pub final_engine_health: f64,
}

impl LandingSummary {
    /// Compute summary from tick records and the events raised alongside them.
    /// Returns None when there are no records.
    pub fn from_records(records: &[TickOutput], events: &[SimEvent]) -> Option<Self> {
        let first = records.first()?;
        let last = records.last()?;

        let max_descent_rate = records.iter().map(|r| -r.vertical_speed).fold(0.0_f64, f64::max);
        let max_tilt_deg = records
            .iter()
            .map(|r| {
                let z = r.attitude * nalgebra::Vector3::z();
                z.z.clamp(-1.0, 1.0).acos().to_degrees()
            })
            .fold(0.0_f64, f64::max);

        let burn_start_altitude = events
            .iter()
            .find(|e| e.kind == EventKind::SuicideBurnStart)
            .and_then(|e| records.iter().find(|r| r.time >= e.time))
            .map(|r| r.altitude);

        Some(LandingSummary {
            landed: last.surface_contact,
            flight_time: last.time,
            touchdown_speed: last.vertical_speed.abs(),
            touchdown_horizontal_speed: last.horizontal_speed,
            max_descent_rate,
            max_tilt_deg,
            burn_start_altitude,
            propellant_used: first.propellant_mass - last.propellant_mass,
            rcs_propellant_used: first.rcs_propellant_mass - last.rcs_propellant_mass,
            final_engine_health: last.engine_health,
        })
    }
}

/// JSON string body: quotes, backslashes and control characters escaped.
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Write landing summary as JSON to a writer.
pub fn write_summary<W: Write>(
    writer: &mut W,
    config: &SpacecraftConfig,
    summary: &LandingSummary,
) -> io::Result<()> {
    writeln!(writer, "{{")?;
    writeln!(writer, "  \"spacecraft\": {{")?;
    writeln!(writer, "    \"name\": \"{}\",", escape(&config.name))?;
    writeln!(writer, "    \"planet\": \"{}\",", escape(&config.planet.name))?;
    writeln!(writer, "    \"wet_mass_kg\": {:.1},", config.total_mass())?;
    writeln!(writer, "    \"twr\": {:.3}", config.twr())?;
    writeln!(writer, "  }},")?;
    writeln!(writer, "  \"landing\": {{")?;
    writeln!(writer, "    \"landed\": {},", summary.landed)?;
    writeln!(writer, "    \"flight_time_s\": {:.2},", summary.flight_time)?;
    writeln!(writer, "    \"touchdown_speed_ms\": {:.3},", summary.touchdown_speed)?;
    writeln!(writer, "    \"touchdown_horizontal_speed_ms\": {:.3},", summary.touchdown_horizontal_speed)?;
    writeln!(writer, "    \"max_descent_rate_ms\": {:.2},", summary.max_descent_rate)?;
    writeln!(writer, "    \"max_tilt_deg\": {:.2},", summary.max_tilt_deg)?;
    match summary.burn_start_altitude {
        Some(alt) => writeln!(writer, "    \"burn_start_altitude_m\": {alt:.2},")?,
        None => writeln!(writer, "    \"burn_start_altitude_m\": null,")?,
    }
    writeln!(writer, "    \"propellant_used_kg\": {:.3},", summary.propellant_used)?;
    writeln!(writer, "    \"rcs_propellant_used_kg\": {:.3},", summary.rcs_propellant_used)?;
    writeln!(writer, "    \"final_engine_health\": {:.3}", summary.final_engine_health)?;
    writeln!(writer, "  }}")?;
    writeln!(writer, "}}")?;
    Ok(())
}

/// Write landing summary JSON to a file.
pub fn write_summary_file(
    path: &str,
    config: &SpacecraftConfig,
    summary: &LandingSummary,
) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, config, summary)
}
