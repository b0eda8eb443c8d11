// src/error.rs

//! Error types for the stabilization pipeline.
//!
//! Anomalies that are corrected in place (16-bit register wrap, timer rollover,
//! a zero `dt` in the derivative term) never show up here.

use thiserror::Error;

/// Errors reported by implementations of the [`crate::hardware`] traits.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    /// The inertial sample could not be read.
    #[error("inertial sensor read failed")]
    SensorRead,

    /// A motor pulse could not be written.
    #[error("motor output write failed")]
    MotorWrite,
}

/// Reasons an arm request is refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmingError {
    /// Throttle was above the idle limit when arming was requested.
    #[error("preflight check failed: throttle not at idle")]
    ThrottleNotIdle,
}

/// Invalid values in a [`crate::FlightControllerConfig`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Motor pulse bounds are empty or inverted.
    #[error("motor pulse low bound must be below the high bound")]
    MotorBounds,

    /// Complementary filter coefficient is outside `[0, 1]`.
    #[error("complementary filter coefficient must lie in [0, 1]")]
    FilterCoefficient,

    /// Stick pulse range is empty or inverted.
    #[error("stick pulse range must have a minimum below its maximum")]
    StickRange,

    /// Arming throttle limit lies outside the motor pulse bounds.
    #[error("arming throttle limit must lie within the motor pulse bounds")]
    ArmThrottle,

    /// The pulse decoder uses a different arm switch threshold than configured.
    #[error("pulse decoder arm threshold does not match the configuration")]
    ArmSwitchThreshold,

    /// Calibration sample count is zero.
    #[error("calibration sample count must be positive")]
    CalibrationSamples,

    /// A PID gain is NaN or infinite.
    #[error("PID gains must be finite")]
    NonFiniteGain,
}

/// Sensor offset calibration errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// Zero samples were requested.
    #[error("calibration requires at least one sample")]
    NoSamples,
}

/// Main error type that encompasses all subsystem errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightError {
    /// Hardware access failed.
    #[error("hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// Arming was refused.
    #[error("arming error: {0}")]
    Arming(#[from] ArmingError),

    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Sensor calibration failed.
    #[error("calibration error: {0}")]
    Calibration(#[from] CalibrationError),
}

/// Result alias used throughout the crate.
pub type FlightResult<T> = Result<T, FlightError>;
