// src/pid/level.rs

//! # Level-Hold PID Control Module
//!
//! This module provides a compute function and control data structure
//! to hold one axis at its set point (level attitude, or zero yaw rate).
//!
//! The callback returns the raw error sum as the integral term. The owning
//! stabilizer rescales the integral gain by `dt` every cycle, which yields the
//! `Ki * (dt * error_sum)` law while `pid.integral` keeps the unscaled sum.

use crate::Number;
use piddiy::PidController;

/// Control data for the level-hold PID compute callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LevelControlData<T> {
    /// The current measurement for the axis, in degrees.
    pub measurement: T,
    /// The time delta since the last computation, in seconds.
    pub dt: T,
    /// Set on the first cycle after a reset, when no previous error exists.
    pub first_iteration: bool,
}

/// Level-hold PID compute callback.
///
/// Returns `(error, error_sum, derivative)`. The derivative is omitted on the
/// first iteration and whenever `dt <= 0`.
pub fn compute_level<T: Number>(
    pid: &mut PidController<T, LevelControlData<T>>,
    data: LevelControlData<T>,
) -> (T, T, T) {
    let error = pid.set_point - data.measurement;
    let error_sum = pid.integral + error;
    let derivative = if data.first_iteration || data.dt <= T::zero() {
        T::zero()
    } else {
        (error - pid.error) / data.dt
    };

    (error, error_sum, derivative)
}
