use std::io::{self, Write};

use crate::sim::tick::TickOutput;

/// Write per-tick telemetry to CSV format.
///
/// Columns: tick, time, pos_x, pos_y, pos_z, vel_x, vel_y, vel_z,
///          quat_w, quat_x, quat_y, quat_z, omega_x, omega_y, omega_z,
///          altitude, vertical_speed, mass, propellant, rcs_propellant,
///          engine_status, throttle, thrust, gimbal_pitch_deg, gimbal_yaw_deg,
///          engine_health, chamber_temp, sas_mode, autopilot_mode, throttle_reason,
///          rcs_x, rcs_y, rcs_z, active_thrusters
pub fn write_telemetry<W: Write>(writer: &mut W, records: &[TickOutput]) -> io::Result<()> {
    writeln!(
        writer,
        "tick,time,pos_x,pos_y,pos_z,vel_x,vel_y,vel_z,\
         quat_w,quat_x,quat_y,quat_z,omega_x,omega_y,omega_z,\
         altitude,vertical_speed,mass,propellant,rcs_propellant,\
         engine_status,throttle,thrust,gimbal_pitch_deg,gimbal_yaw_deg,\
         engine_health,chamber_temp,sas_mode,autopilot_mode,throttle_reason,\
         rcs_x,rcs_y,rcs_z,active_thrusters"
    )?;

    for r in records {
        let q = r.attitude.quaternion();
        let reason = r.throttle_reason.map(<&'static str>::from).unwrap_or("");
        writeln!(
            writer,
            "{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},\
             {:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},\
             {:.3},{:.3},{:.3},{:.3},{:.3},\
             {},{:.3},{:.1},{:.3},{:.3},\
             {:.3},{:.1},{},{},{},\
             {:.3},{:.3},{:.3},{}",
            r.tick, r.time,
            r.position.x, r.position.y, r.position.z,
            r.velocity.x, r.velocity.y, r.velocity.z,
            q.w, q.i, q.j, q.k,
            r.angular_velocity.x, r.angular_velocity.y, r.angular_velocity.z,
            r.altitude, r.vertical_speed, r.mass, r.propellant_mass, r.rcs_propellant_mass,
            r.engine_status, r.throttle, r.thrust, r.gimbal_pitch_deg, r.gimbal_yaw_deg,
            r.engine_health, r.chamber_temp, r.sas_mode, r.autopilot_mode, reason,
            r.rcs_command.x, r.rcs_command.y, r.rcs_command.z, r.active_thrusters,
        )?;
    }

    Ok(())
}

/// Write telemetry to a CSV file at the given path.
pub fn write_telemetry_file(path: &str, records: &[TickOutput]) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_telemetry(&mut file, records)
}
