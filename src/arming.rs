// src/arming.rs

//! # Arming Module
//!
//! Two-state safety gate between the pilot's arm switch and the motors. The
//! vehicle starts disarmed and arms only when the switch is up and throttle
//! passes the preflight check.

use crate::error::ArmingError;
use crate::Number;

/// Whether motor commands may reach the motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArmState {
    /// Motors held at idle.
    #[default]
    Disarmed,
    /// Motors follow the mixer.
    Armed,
}

/// Outcome of one [`ArmStateMachine::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmTransition {
    /// State unchanged.
    None,
    /// Disarmed to armed.
    Armed,
    /// Armed to disarmed.
    Disarmed,
    /// Arm requested but the preflight check failed.
    Refused,
}

/// Arm/disarm state machine with a throttle-at-idle preflight check.
#[derive(Debug, Clone, Copy)]
pub struct ArmStateMachine<T> {
    state: ArmState,
    throttle_limit: T,
    refusal_reported: bool,
}

impl<T: Number> ArmStateMachine<T> {
    /// Creates a disarmed machine that refuses to arm above `throttle_limit`
    /// milliseconds of throttle pulse.
    pub fn new(throttle_limit: T) -> Self {
        ArmStateMachine {
            state: ArmState::Disarmed,
            throttle_limit,
            refusal_reported: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> ArmState {
        self.state
    }

    /// `true` when armed.
    pub fn is_armed(&self) -> bool {
        self.state == ArmState::Armed
    }

    /// Highest throttle pulse accepted when arming.
    pub fn throttle_limit(&self) -> T {
        self.throttle_limit
    }

    /// Attempts to arm, checking throttle first. Arming an armed machine is a
    /// no-op.
    pub fn try_arm(&mut self, throttle: T) -> Result<(), ArmingError> {
        if self.state == ArmState::Armed {
            return Ok(());
        }
        if throttle > self.throttle_limit {
            return Err(ArmingError::ThrottleNotIdle);
        }
        self.state = ArmState::Armed;
        Ok(())
    }

    /// Disarms unconditionally.
    pub fn disarm(&mut self) {
        self.state = ArmState::Disarmed;
    }

    /// Advances the machine from the arm switch and current throttle.
    ///
    /// A refusal is reported once per request: holding the switch up with
    /// throttle high returns [`ArmTransition::Refused`] every cycle but logs
    /// only the first.
    pub fn update(&mut self, arm_requested: bool, throttle: T) -> ArmTransition {
        match (self.state, arm_requested) {
            (ArmState::Disarmed, true) => match self.try_arm(throttle) {
                Ok(()) => {
                    self.refusal_reported = false;
                    log::info!("Armed");
                    ArmTransition::Armed
                }
                Err(error) => {
                    if !self.refusal_reported {
                        log::warn!("{}", error);
                        self.refusal_reported = true;
                    }
                    ArmTransition::Refused
                }
            },
            (ArmState::Disarmed, false) => {
                self.refusal_reported = false;
                ArmTransition::None
            }
            (ArmState::Armed, false) => {
                self.disarm();
                log::info!("Disarmed");
                ArmTransition::Disarmed
            }
            (ArmState::Armed, true) => ArmTransition::None,
        }
    }
}
