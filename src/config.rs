// src/config.rs

//! # Flight Controller Configuration
//!
//! All tunables of the control pipeline in one plain struct. Fields are public
//! and start from the defaults below; [`FlightControllerConfig::validate`] is
//! run once when the flight loop is built.
//!
//! | Field                     | Default          |
//! |---------------------------|------------------|
//! | `alpha`                   | `0.98`           |
//! | `motor_low`, `motor_high` | `1.0`, `2.0` ms  |
//! | `arm_throttle_limit`      | `1.0` ms         |
//! | `arm_switch_threshold_us` | `1400` us        |
//! | `calibration_samples`     | `100`            |

use crate::error::ConfigError;
use crate::estimator::{DEFAULT_ALPHA, DEFAULT_CALIBRATION_SAMPLES};
use crate::mixer::MotorMixer;
use crate::receiver::{PulseDecoder, StickMapping, DEFAULT_ARM_THRESHOLD_US};
use crate::{Real, StabilizerGains};

/// Configuration of the whole stabilization pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightControllerConfig<T: Real> {
    /// PID gains per axis.
    pub gains: StabilizerGains<T>,
    /// Complementary filter coefficient, weight of the gyro path.
    pub alpha: T,
    /// Receiver pulse range and stick angle limits.
    pub sticks: StickMapping<T>,
    /// Lowest motor pulse in milliseconds, also the idle pulse.
    pub motor_low: T,
    /// Highest motor pulse in milliseconds.
    pub motor_high: T,
    /// Highest throttle pulse at which arming is accepted, in milliseconds.
    pub arm_throttle_limit: T,
    /// Arm switch pulse width above which arming is requested.
    pub arm_switch_threshold_us: u32,
    /// Number of stationary samples averaged for sensor offsets.
    pub calibration_samples: usize,
}

impl<T: Real> FlightControllerConfig<T> {
    /// Default configuration with every PID gain at zero.
    pub fn new() -> Self {
        FlightControllerConfig {
            gains: StabilizerGains::new(),
            alpha: T::constant(DEFAULT_ALPHA),
            sticks: StickMapping::new(),
            motor_low: T::one(),
            motor_high: T::constant(2.0),
            arm_throttle_limit: T::one(),
            arm_switch_threshold_us: DEFAULT_ARM_THRESHOLD_US,
            calibration_samples: DEFAULT_CALIBRATION_SAMPLES,
        }
    }

    /// Default configuration with the given gains.
    pub fn with_gains(gains: StabilizerGains<T>) -> Self {
        FlightControllerConfig {
            gains,
            ..Self::new()
        }
    }

    /// Checks the configuration for values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite_bounds = self.motor_low.is_finite() && self.motor_high.is_finite();
        if !finite_bounds || self.motor_low >= self.motor_high {
            return Err(ConfigError::MotorBounds);
        }
        if !(self.motor_low..=self.motor_high).contains(&self.arm_throttle_limit) {
            return Err(ConfigError::ArmThrottle);
        }
        if !(T::zero()..=T::one()).contains(&self.alpha) {
            return Err(ConfigError::FilterCoefficient);
        }
        let sticks = &self.sticks;
        if !(sticks.pulse_min.is_finite() && sticks.pulse_max.is_finite())
            || sticks.pulse_min >= sticks.pulse_max
        {
            return Err(ConfigError::StickRange);
        }
        if self.calibration_samples == 0 {
            return Err(ConfigError::CalibrationSamples);
        }
        let (kp, ki, kd) = (self.gains.kp(), self.gains.ki(), self.gains.kd());
        let all_finite = [kp.0, kp.1, kp.2, ki.0, ki.1, ki.2, kd.0, kd.1, kd.2]
            .iter()
            .all(|gain| gain.is_finite());
        if !all_finite {
            return Err(ConfigError::NonFiniteGain);
        }
        Ok(())
    }

    /// Mixer clamping to the configured motor bounds.
    pub fn mixer(&self) -> MotorMixer<T> {
        MotorMixer::new(self.motor_low, self.motor_high)
    }

    /// Pulse decoder using the configured arm switch threshold.
    pub fn pulse_decoder(&self) -> PulseDecoder {
        PulseDecoder::new(self.arm_switch_threshold_us)
    }
}

impl<T: Real> Default for FlightControllerConfig<T> {
    fn default() -> Self {
        Self::new()
    }
}
