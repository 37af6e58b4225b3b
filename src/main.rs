use std::process::ExitCode;

use log::{error, info};

use spacecraft_sim::io::{csv, json};
use spacecraft_sim::logger;
use spacecraft_sim::sim::{simulate, EventKind, SimConfig};
use spacecraft_sim::vehicle::{presets, SpacecraftConfig};

struct Args {
    preset: String,
    csv: Option<String>,
    json: Option<String>,
    dt: f64,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args { preset: "lunar".into(), csv: None, json: None, dt: 0.05 };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        let mut value = |name: &str| it.next().ok_or_else(|| format!("{name} needs a value"));
        match arg.as_str() {
            "--csv" => args.csv = Some(value("--csv")?),
            "--json" => args.json = Some(value("--json")?),
            "--preset" => args.preset = value("--preset")?,
            "--dt" => {
                let raw = value("--dt")?;
                args.dt = raw.parse().map_err(|_| format!("bad --dt '{raw}'"))?;
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(args)
}

fn preset(name: &str) -> Option<SpacecraftConfig> {
    match name {
        "lunar" => Some(presets::lunar_lander()),
        "mars" => Some(presets::mars_hopper()),
        _ => None,
    }
}

fn main() -> ExitCode {
    // Another logger may already be installed when embedded; that is fine
    let _ = logger::init();

    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{e}\nusage: spacecraft-sim [--preset lunar|mars] [--dt S] [--csv PATH] [--json PATH]");
            return ExitCode::FAILURE;
        }
    };
    let Some(vehicle) = preset(&args.preset) else {
        error!("Unknown preset '{}'", args.preset);
        return ExitCode::FAILURE;
    };

    // -----------------------------------------------------------------------
    // Run simulation
    // -----------------------------------------------------------------------
    let config = SimConfig { dt: args.dt, max_time: 600.0 };
    let (records, events) = match simulate(vehicle.clone(), &config) {
        Ok(r) => r,
        Err(e) => {
            error!("Invalid spacecraft configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    let Some(summary) = json::LandingSummary::from_records(&records, &events) else {
        error!("Simulation produced no records");
        return ExitCode::FAILURE;
    };

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  POWERED DESCENT — {} ({})", vehicle.name, vehicle.planet.name);
    println!("====================================================================");
    println!();
    println!("  Vehicle Parameters");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Dry mass:      {:>8.1} kg    Propellant:   {:>8.1} kg",
        vehicle.dry_mass,
        vehicle.propellant_mass()
    );
    println!(
        "  Total mass:    {:>8.1} kg    TWR:          {:>8.2}",
        vehicle.total_mass(),
        vehicle.twr()
    );
    println!(
        "  Thrust:        {:>8.0} N     Isp:          {:>8.0} s",
        vehicle.engine.max_thrust, vehicle.engine.isp
    );
    println!(
        "  Delta-v:       {:>8.0} m/s   Modes:        {} / {}",
        vehicle.delta_v(),
        vehicle.sas_mode,
        vehicle.autopilot_mode
    );
    println!();

    println!("  Flight Events");
    println!("  ──────────────────────────────────────────────────────────────────");
    for e in &events {
        let label = match &e.kind {
            EventKind::Ignition => "Main engine ignition".to_string(),
            EventKind::Flameout => "Flameout".to_string(),
            EventKind::EngineFailure => "Engine failure".to_string(),
            EventKind::SuicideBurnStart => "Suicide burn start".to_string(),
            EventKind::Apogee => "Apogee".to_string(),
            EventKind::Touchdown { vertical_speed } => format!("Touchdown at {vertical_speed:.2} m/s"),
            EventKind::Custom(s) => s.clone(),
        };
        println!("  {:>8.2} s  {}", e.time, label);
    }
    println!();

    println!("  Landing");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Landed:          {}", if summary.landed { "yes" } else { "no" });
    println!("  Touchdown speed: {:>8.2} m/s", summary.touchdown_speed);
    println!("  Max descent:     {:>8.2} m/s", summary.max_descent_rate);
    println!("  Max tilt:        {:>8.2} deg", summary.max_tilt_deg);
    if let Some(alt) = summary.burn_start_altitude {
        println!("  Burn start:      {alt:>8.1} m");
    }
    println!(
        "  Propellant used: {:>8.1} kg main, {:.2} kg RCS",
        summary.propellant_used, summary.rcs_propellant_used
    );
    println!("  Flight time:     {:>8.1} s", summary.flight_time);
    println!();

    // -----------------------------------------------------------------------
    // Telemetry table (sampled)
    // -----------------------------------------------------------------------
    println!("  Telemetry");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>9}  {:>8}  {:>8}  {:>9}  {:<22}",
        "t (s)", "alt (m)", "vs (m/s)", "throttle", "mass(kg)", "reason"
    );
    println!("  {}", "─".repeat(72));

    let sample_interval = (records.len() / 30).max(1);
    for (i, r) in records.iter().enumerate() {
        if i % sample_interval != 0 && i != records.len() - 1 {
            continue;
        }
        let reason = r.throttle_reason.map_or_else(|| "-".to_string(), |t| t.to_string());
        println!(
            "  {:>7.2}  {:>9.1}  {:>8.2}  {:>8.2}  {:>9.1}  {:<22}",
            r.time, r.altitude, r.vertical_speed, r.throttle, r.mass, reason
        );
    }
    println!();
    println!("  Simulation: {} ticks, dt={} s", records.len(), config.dt);
    println!("====================================================================");
    println!();

    if let Some(path) = &args.csv {
        match csv::write_telemetry_file(path, &records) {
            Ok(()) => info!("Telemetry written to {path}"),
            Err(e) => {
                error!("Could not write {path}: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
    if let Some(path) = &args.json {
        match json::write_summary_file(path, &vehicle, &summary) {
            Ok(()) => info!("Summary written to {path}"),
            Err(e) => {
                error!("Could not write {path}: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
