// src/lib.rs

//! # Quadrotor Attitude Stabilization
//!
//! This crate provides a `no_std`, no-alloc attitude-hold pipeline for an X
//! quadrotor. Radio pulses decoded from edge timestamps and inertial samples
//! polled once per cycle are merged by a [`FlightLoop`] into:
//!
//! - a complementary filter roll/pitch estimate ([`estimator`]),
//! - a three-axis PID correction toward level flight ([`stabilizer`]),
//! - an X-quad motor mix saturated to the pulse range ([`mixer`]),
//!
//! all gated by an arm/disarm state machine ([`arming`]) that keeps the
//! motors at idle until the pilot arms with throttle down.
//!
//! Bus access, PWM generation and edge subscription are left to the caller
//! through the traits in [`hardware`].

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub mod arming;
pub mod config;
pub mod error;
pub mod estimator;
pub mod flight_loop;
pub mod hardware;
pub mod mixer;
pub mod pid;
pub mod receiver;
pub mod stabilizer;

#[doc(inline)]
pub use stabilizer::*;

pub use arming::{ArmState, ArmStateMachine, ArmTransition};
pub use config::FlightControllerConfig;
pub use error::{FlightError, FlightResult};
pub use estimator::{AttitudeEstimator, EulerState, SensorOffsets};
pub use flight_loop::{CycleReport, FlightLoop};
pub use mixer::{MotorCommand, MotorMixer};
pub use receiver::{Channel, EdgeLevel, PulseDecoder, StickInput};

#[cfg(test)]
mod test_utils;
