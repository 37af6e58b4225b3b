use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PID Controller (single axis)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub integral_limit: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64, integral_limit: f64) -> Self {
        Self { kp, ki, kd, integral_limit }
    }
}

#[derive(Debug, Clone)]
pub struct Pid {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub integral_limit: f64,
    integral: f64,
    prev_error: f64,
    first_update: bool,
}

impl Pid {
    pub fn new(kp: f64, ki: f64, kd: f64, integral_limit: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral_limit: integral_limit.abs(),
            integral: 0.0,
            prev_error: 0.0,
            first_update: true,
        }
    }

    pub fn from_gains(gains: PidGains) -> Self {
        Self::new(gains.kp, gains.ki, gains.kd, gains.integral_limit)
    }

    /// Error = target - current. The first sample after construction or reset
    /// contributes no derivative term.
    pub fn update(&mut self, current: f64, target: f64, dt: f64) -> f64 {
        let error = target - current;
        let derivative = if dt > 0.0 {
            // Anti-windup: clamp integral to the configured limit
            self.integral = (self.integral + error * dt).clamp(-self.integral_limit, self.integral_limit);
            if self.first_update { 0.0 } else { (error - self.prev_error) / dt }
        } else {
            0.0
        };
        self.prev_error = error;
        self.first_update = false;
        self.kp * error + self.ki * self.integral + self.kd * derivative
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.first_update = true;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_proportional() {
        let mut pid = Pid::new(1.0, 0.0, 0.0, 1.0);
        let out = pid.update(0.0, 0.5, 0.01);
        assert!((out - 0.5).abs() < 1e-10, "Pure P should output Kp * error");
    }

    #[test]
    fn pid_integral_accumulates() {
        let mut pid = Pid::new(0.0, 1.0, 0.0, 10.0);
        pid.update(0.0, 1.0, 0.1);
        let out = pid.update(0.0, 1.0, 0.1);
        assert!((out - 0.2).abs() < 1e-10, "Integral should accumulate");
    }

    #[test]
    fn integral_clamped_to_limit() {
        let mut pid = Pid::new(0.0, 1.0, 0.0, 0.5);
        for _ in 0..100 {
            pid.update(0.0, 10.0, 1.0);
        }
        assert!((pid.integral() - 0.5).abs() < 1e-12);
        for _ in 0..100 {
            pid.update(10.0, 0.0, 1.0);
        }
        assert!((pid.integral() + 0.5).abs() < 1e-12);
    }

    #[test]
    fn first_sample_has_no_derivative_kick() {
        let mut pid = Pid::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(pid.update(0.0, 100.0, 0.01), 0.0);
        let out = pid.update(0.0, 101.0, 0.01);
        assert!((out - 100.0).abs() < 1e-9);
    }

    #[test]
    fn reset_suppresses_derivative_again() {
        let mut pid = Pid::new(1.0, 0.0, 5.0, 1.0);
        pid.update(0.0, 3.0, 0.1);
        pid.update(0.0, -7.0, 0.1);
        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        let out = pid.update(0.0, 2.0, 0.1);
        assert!((out - 2.0).abs() < 1e-12, "Only the P term should remain, got {out}");
    }

    #[test]
    fn zero_dt_is_proportional_only() {
        let mut pid = Pid::new(2.0, 1.0, 1.0, 1.0);
        pid.update(0.0, 1.0, 0.1);
        let out = pid.update(0.0, 4.0, 0.0);
        assert!((out - (8.0 + 0.1)).abs() < 1e-12);
    }
}
