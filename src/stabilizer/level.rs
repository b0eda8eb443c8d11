// src/stabilizer/level.rs

//! # Level-Hold PID Stabilizer
//!
//! Three-axis PID controller that drives roll and pitch toward level flight.
//! The yaw-rate axis is carried through the same law, but its error is always
//! zero because no yaw-rate measurement feeds this controller.
//!
//! Per axis, each cycle:
//!
//! - `error = 0 - measurement`
//! - `error_sum += error` (no leak, no clamp)
//! - `u = Kp * error + Ki * (dt * error_sum) + Kd * (error - previous_error) / dt`
//!
//! The derivative term is omitted on the first cycle after construction or
//! [`reset`](FlightStabilizer::reset), and on any cycle with `dt <= 0`.

use crate::estimator::EulerState;
use crate::pid::{compute_level, LevelControlData};
use crate::{FlightStabilizer, Number, StabilizerGains};
use piddiy::PidController;

/// Snapshot of the accumulated controller state, per `(roll, pitch, yaw)` axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidState<T> {
    /// Accumulated error, never decayed or clamped.
    pub error_sum: (T, T, T),
    /// Error from the previous cycle.
    pub previous_error: (T, T, T),
    /// `true` until the first cycle after a reset has run.
    pub first_iteration: bool,
}

/// Struct representing the level-hold PID stabilizer.
pub struct LevelStabilizer<T: Number> {
    roll_pid: PidController<T, LevelControlData<T>>,
    pitch_pid: PidController<T, LevelControlData<T>>,
    yaw_pid: PidController<T, LevelControlData<T>>,
    gains: StabilizerGains<T>,
    first_iteration: bool,
}

impl<T: Number> LevelStabilizer<T> {
    /// Creates a new controller using the provided gains.
    pub fn with_gains(gains: StabilizerGains<T>) -> Self {
        LevelStabilizer {
            roll_pid: Self::axis_pid(gains.kp_roll, gains.kd_roll),
            pitch_pid: Self::axis_pid(gains.kp_pitch, gains.kd_pitch),
            yaw_pid: Self::axis_pid(gains.kp_yaw, gains.kd_yaw),
            gains,
            first_iteration: true,
        }
    }

    /// Creates a new controller with all gains at zero.
    pub fn new() -> Self {
        Self::with_gains(StabilizerGains::new())
    }

    /// The gains this controller was built with.
    pub fn gains(&self) -> &StabilizerGains<T> {
        &self.gains
    }

    /// Current accumulated state of all three axes.
    pub fn state(&self) -> PidState<T> {
        PidState {
            error_sum: (
                self.roll_pid.integral,
                self.pitch_pid.integral,
                self.yaw_pid.integral,
            ),
            previous_error: (self.roll_pid.error, self.pitch_pid.error, self.yaw_pid.error),
            first_iteration: self.first_iteration,
        }
    }

    // Set point is always zero: level attitude and zero yaw rate.
    fn axis_pid(kp: T, kd: T) -> PidController<T, LevelControlData<T>> {
        let mut pid = PidController::new();
        pid.compute_fn(compute_level)
            .set_point(T::zero())
            .kp(kp)
            .ki(T::zero())
            .kd(kd);
        pid
    }
}

impl<T: Number> Default for LevelStabilizer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Number> FlightStabilizer<T> for LevelStabilizer<T> {
    fn control(&mut self, attitude: EulerState<T>, dt: T) -> (T, T, T) {
        // Integral gain scaled by dt so `integral` stays the raw error sum.
        self.roll_pid.ki(self.gains.ki_roll * dt);
        self.pitch_pid.ki(self.gains.ki_pitch * dt);
        self.yaw_pid.ki(self.gains.ki_yaw * dt);

        let first_iteration = self.first_iteration;
        let roll_data = LevelControlData {
            measurement: attitude.roll,
            dt,
            first_iteration,
        };
        let pitch_data = LevelControlData {
            measurement: attitude.pitch,
            dt,
            first_iteration,
        };
        let yaw_data = LevelControlData {
            measurement: T::zero(),
            dt,
            first_iteration,
        };

        let roll_output = self.roll_pid.compute(roll_data);
        let pitch_output = self.pitch_pid.compute(pitch_data);
        let yaw_output = self.yaw_pid.compute(yaw_data);
        self.first_iteration = false;

        (roll_output, pitch_output, yaw_output)
    }

    fn reset(&mut self) {
        *self = Self::with_gains(self.gains);
    }
}
