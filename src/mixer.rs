// src/mixer.rs

//! # Motor Mixing Module
//!
//! Maps throttle and the three correction axes onto four rotors of an X
//! quadrotor, then saturates each rotor to the output pulse range.
//!
//! ```text
//! m1 = throttle - roll + pitch - yaw
//! m2 = throttle - roll - pitch + yaw
//! m3 = throttle + roll - pitch - yaw
//! m4 = throttle + roll + pitch + yaw
//! ```
//!
//! Clamping is per rotor. When one rotor saturates the others are not
//! rescaled, so the relative mix across rotors is lost at the limits.

use crate::Number;

/// Pulse widths for the four rotors, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorCommand<T> {
    /// Pulse per rotor, motors 1 through 4.
    pub pulses: [T; 4],
}

impl<T: Copy> MotorCommand<T> {
    /// The same pulse on every rotor.
    pub fn uniform(pulse: T) -> Self {
        MotorCommand { pulses: [pulse; 4] }
    }
}

/// X-quad mixer with saturating output bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorMixer<T> {
    low: T,
    high: T,
}

impl<T: Number> MotorMixer<T> {
    /// Creates a mixer clamping to `[low, high]`.
    pub fn new(low: T, high: T) -> Self {
        MotorMixer { low, high }
    }

    /// Lower pulse bound.
    pub fn low(&self) -> T {
        self.low
    }

    /// Upper pulse bound.
    pub fn high(&self) -> T {
        self.high
    }

    /// Mixes throttle with `(roll, pitch, yaw)` corrections.
    pub fn mix(&self, throttle: T, correction: (T, T, T)) -> MotorCommand<T> {
        let (roll, pitch, yaw) = correction;
        let mixed = [
            throttle - roll + pitch - yaw,
            throttle - roll - pitch + yaw,
            throttle + roll - pitch - yaw,
            throttle + roll + pitch + yaw,
        ];
        MotorCommand {
            pulses: mixed.map(|pulse| pulse.clamp(self.low, self.high)),
        }
    }

    /// Every rotor at the lower bound.
    pub fn idle(&self) -> MotorCommand<T> {
        MotorCommand::uniform(self.low)
    }
}

/// Converts a pulse width into a PWM duty value for an output with
/// `range` steps per `period_ms`.
pub fn pulse_to_duty<T: Number>(pulse_ms: T, period_ms: T, range: T) -> T {
    pulse_ms / period_ms * range
}
