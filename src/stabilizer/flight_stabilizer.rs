// src/stabilizer/flight_stabilizer.rs

//! A module specifying the shared interface for PID-based attitude stabilizers.
//! It includes the numeric traits used across the crate, a configuration
//! structure for PID gains and a trait defining the stabilization functionality.

use core::fmt::Debug;

use num_traits::{Float, NumCast};
use piddiy::Number as PiddiyNumber;

use crate::estimator::EulerState;

/// Custom trait to encapsulate base number requirements.
pub trait Number: PiddiyNumber {
    /// Clamps generic PartialOrd values within a given range.
    fn clamp(self, min: Self, max: Self) -> Self {
        if self < min {
            min
        } else if max < self {
            max
        } else {
            self
        }
    }
}

impl<T: PiddiyNumber> Number for T {}

/// Numbers that additionally support trigonometry and conversion from
/// integer timer ticks. Required by the estimator and the flight loop.
pub trait Real: Number + Float + Debug {
    /// Converts an `f64` constant into this type.
    fn constant(value: f64) -> Self {
        <Self as NumCast>::from(value).unwrap_or_else(Self::nan)
    }
}

impl<T: Number + Float + Debug> Real for T {}

/// PID gains for the roll, pitch and yaw-rate axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerGains<T: Number> {
    /// Proportional gain for roll control.
    pub kp_roll: T,
    /// Integral gain for roll control.
    pub ki_roll: T,
    /// Derivative gain for roll control.
    pub kd_roll: T,
    /// Proportional gain for pitch control.
    pub kp_pitch: T,
    /// Integral gain for pitch control.
    pub ki_pitch: T,
    /// Derivative gain for pitch control.
    pub kd_pitch: T,
    /// Proportional gain for yaw-rate control.
    pub kp_yaw: T,
    /// Integral gain for yaw-rate control.
    pub ki_yaw: T,
    /// Derivative gain for yaw-rate control.
    pub kd_yaw: T,
}

impl<T: Number> StabilizerGains<T> {
    /// Creates a gain set with every gain at zero. The stabilizer then
    /// produces no correction at all, which is the safe bench default.
    /// These should be replaced with values tuned for the airframe.
    ///
    /// Example Usage
    /// ```
    /// use quadrotor_stabilization::StabilizerGains;
    ///
    /// let mut gains = StabilizerGains::<f32>::new();
    /// gains.kp_roll = 1.2;
    /// gains.ki_roll = 0.05;
    /// gains.kd_roll = 0.3;
    /// gains.kp_pitch = gains.kp_roll;
    /// gains.ki_pitch = gains.ki_roll;
    /// gains.kd_pitch = gains.kd_roll;
    /// ```
    pub fn new() -> Self {
        Self {
            kp_roll: T::zero(),
            ki_roll: T::zero(),
            kd_roll: T::zero(),
            kp_pitch: T::zero(),
            ki_pitch: T::zero(),
            kd_pitch: T::zero(),
            kp_yaw: T::zero(),
            ki_yaw: T::zero(),
            kd_yaw: T::zero(),
        }
    }

    /// Builds gains from `(roll, pitch, yaw)` vectors for each term.
    pub fn from_vectors(kp: (T, T, T), ki: (T, T, T), kd: (T, T, T)) -> Self {
        Self {
            kp_roll: kp.0,
            ki_roll: ki.0,
            kd_roll: kd.0,
            kp_pitch: kp.1,
            ki_pitch: ki.1,
            kd_pitch: kd.1,
            kp_yaw: kp.2,
            ki_yaw: ki.2,
            kd_yaw: kd.2,
        }
    }

    /// Proportional gains as a `(roll, pitch, yaw)` vector.
    pub fn kp(&self) -> (T, T, T) {
        (self.kp_roll, self.kp_pitch, self.kp_yaw)
    }

    /// Integral gains as a `(roll, pitch, yaw)` vector.
    pub fn ki(&self) -> (T, T, T) {
        (self.ki_roll, self.ki_pitch, self.ki_yaw)
    }

    /// Derivative gains as a `(roll, pitch, yaw)` vector.
    pub fn kd(&self) -> (T, T, T) {
        (self.kd_roll, self.kd_pitch, self.kd_yaw)
    }
}

impl<T: Number> Default for StabilizerGains<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A trait for PID-based stabilizers that hold the vehicle level based on
/// the estimated attitude and dt.
pub trait FlightStabilizer<T: Number> {
    /// Takes the current attitude estimate and the time since the previous
    /// cycle, then computes the control outputs.
    ///
    /// - `attitude`: Current roll and pitch estimate in degrees.
    /// - `dt`: Time delta since the last update, in seconds.
    ///
    /// Returns a tuple of (roll control, pitch control, yaw-rate control).
    fn control(&mut self, attitude: EulerState<T>, dt: T) -> (T, T, T);

    /// Clears all accumulated controller state.
    fn reset(&mut self);
}
