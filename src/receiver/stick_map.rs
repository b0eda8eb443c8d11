// src/receiver/stick_map.rs

//! Mapping of receiver pulse widths onto stick commands.

use crate::receiver::pulse_decoder::{Channel, PulseDecoder};
use crate::{Number, Real};

/// Linearly maps `value` from `[in_min, in_max]` onto `[out_min, out_max]`.
/// Values outside the input range extrapolate.
pub fn map_range<T: Number>(value: T, in_min: T, in_max: T, out_min: T, out_max: T) -> T {
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Raw pulse range and the angle limits each stick maps onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickMapping<T> {
    /// Pulse width at full low stick, in milliseconds.
    pub pulse_min: T,
    /// Pulse width at full high stick, in milliseconds.
    pub pulse_max: T,
    /// Roll command at full deflection, in degrees.
    pub roll_limit: T,
    /// Pitch command at full deflection, in degrees.
    pub pitch_limit: T,
    /// Yaw command at full deflection, in degrees.
    pub yaw_limit: T,
}

impl<T: Real> StickMapping<T> {
    /// Pulses of 1 to 2 ms, +/-30 degrees roll and pitch, +/-10 degrees yaw.
    pub fn new() -> Self {
        StickMapping {
            pulse_min: T::one(),
            pulse_max: T::constant(2.0),
            roll_limit: T::constant(30.0),
            pitch_limit: T::constant(30.0),
            yaw_limit: T::constant(10.0),
        }
    }

    fn symmetric(&self, pulse: T, limit: T) -> T {
        map_range(pulse, self.pulse_min, self.pulse_max, -limit, limit)
    }
}

impl<T: Real> Default for StickMapping<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pilot commands sampled once per control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StickInput<T> {
    /// Roll command in degrees.
    pub roll: T,
    /// Pitch command in degrees.
    pub pitch: T,
    /// Yaw command in degrees.
    pub yaw: T,
    /// Throttle pulse width in milliseconds, passed through unmapped.
    pub throttle: T,
    /// Arm switch pulse width in milliseconds.
    pub arm: T,
}

impl<T: Real> StickInput<T> {
    /// Reads the latest widths from the decoder and maps them.
    pub fn read(decoder: &PulseDecoder, mapping: &StickMapping<T>) -> Self {
        StickInput {
            roll: mapping.symmetric(decoder.pulse_width_ms(Channel::Roll), mapping.roll_limit),
            pitch: mapping.symmetric(decoder.pulse_width_ms(Channel::Pitch), mapping.pitch_limit),
            yaw: mapping.symmetric(decoder.pulse_width_ms(Channel::Yaw), mapping.yaw_limit),
            throttle: decoder.pulse_width_ms(Channel::Throttle),
            arm: decoder.pulse_width_ms(Channel::Arm),
        }
    }
}
