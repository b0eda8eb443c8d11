// src/estimator.rs

//! # Attitude Estimation Module
//!
//! First-order complementary filter fusing accelerometer tilt with integrated
//! gyro rate into a persistent roll/pitch estimate in degrees.
//!
//! ```text
//! new = alpha * (previous + dt * gyro) + (1 - alpha) * accel_angles
//! ```
//!
//! Gyro integration is accurate short-term but drifts. Accelerometer tilt is
//! noisy short-term but has no bias. With `alpha = 0.98` the gyro dominates
//! each step and the accelerometer slowly pulls the estimate back.

pub mod calibration;
pub use calibration::*;
pub mod raw;
pub use raw::*;

use crate::hardware::Vector3;
use crate::{Number, Real};

/// Default complementary filter coefficient.
pub const DEFAULT_ALPHA: f64 = 0.98;

/// Roll and pitch estimate in degrees. Yaw is not estimated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerState<T> {
    /// Roll angle in degrees.
    pub roll: T,
    /// Pitch angle in degrees.
    pub pitch: T,
}

impl<T: Number> EulerState<T> {
    /// Zero roll and pitch.
    pub fn level() -> Self {
        EulerState {
            roll: T::zero(),
            pitch: T::zero(),
        }
    }
}

/// Computes roll and pitch in degrees from the accelerometer alone.
///
/// Both angles lie in `[-90, 90]` degrees, so an inverted airframe reads as
/// upright.
pub fn accel_angles<T: Real>(accel: Vector3<T>) -> EulerState<T> {
    let roll = accel
        .y
        .atan2((accel.x * accel.x + accel.z * accel.z).sqrt());
    let pitch = (-accel.x).atan2((accel.y * accel.y + accel.z * accel.z).sqrt());

    EulerState {
        roll: roll.to_degrees(),
        pitch: pitch.to_degrees(),
    }
}

/// Complementary filter attitude estimator.
#[derive(Debug, Clone, Copy)]
pub struct AttitudeEstimator<T: Real> {
    alpha: T,
    state: EulerState<T>,
}

impl<T: Real> AttitudeEstimator<T> {
    /// Creates an estimator starting level, with filter coefficient `alpha`.
    pub fn new(alpha: T) -> Self {
        Self::with_state(alpha, EulerState::level())
    }

    /// Creates an estimator starting from a known attitude.
    pub fn with_state(alpha: T, state: EulerState<T>) -> Self {
        AttitudeEstimator { alpha, state }
    }

    /// Filter coefficient.
    pub fn alpha(&self) -> T {
        self.alpha
    }

    /// Latest estimate.
    pub fn state(&self) -> EulerState<T> {
        self.state
    }

    /// Folds one offset-corrected sample into the estimate.
    ///
    /// `accel` is in g, `gyro` in degrees per second and `dt` in seconds.
    /// A negative `dt` is treated as zero elapsed time, which skips the gyro
    /// integration but still applies the accelerometer blend.
    pub fn update(&mut self, accel: Vector3<T>, gyro: Vector3<T>, dt: T) -> EulerState<T> {
        let dt = if dt < T::zero() { T::zero() } else { dt };
        let measured = accel_angles(accel);
        let complement = T::one() - self.alpha;

        self.state = EulerState {
            roll: self.alpha * (self.state.roll + dt * gyro.x) + complement * measured.roll,
            pitch: self.alpha * (self.state.pitch + dt * gyro.y) + complement * measured.pitch,
        };
        self.state
    }
}

impl<T: Real> Default for AttitudeEstimator<T> {
    fn default() -> Self {
        Self::new(T::constant(DEFAULT_ALPHA))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn tilt(degrees: f32) -> Vector3<f32> {
        let radians = degrees.to_radians();
        Vector3::new(0.0, radians.sin(), -radians.cos())
    }

    #[test]
    fn test_accel_angles_level() {
        let angles = accel_angles(Vector3::new(0.0_f32, 0.0, 1.0));
        assert!(value_close(0.0, angles.roll));
        assert!(value_close(0.0, angles.pitch));

        let angles = accel_angles(Vector3::new(0.0_f32, 0.0, -1.0));
        assert!(value_close(0.0, angles.roll));
        assert!(value_close(0.0, angles.pitch));
    }

    #[test]
    fn test_accel_angles_tilt() {
        let angles = accel_angles(tilt(30.0));
        assert!(value_close_within(30.0, angles.roll, 1e-3));
        assert!(value_close(0.0, angles.pitch));

        let angles = accel_angles(Vector3::new(-1.0_f32, 0.0, 0.0));
        assert!(value_close_within(90.0, angles.pitch, 1e-3));
    }

    /// With no gyro input a small alpha converges onto the accelerometer angle.
    #[test]
    fn test_estimator_converges_to_accel_angle() {
        let mut estimator = AttitudeEstimator::new(0.5_f32);
        let accel = tilt(20.0);
        let gyro = Vector3::default();

        for _ in 0..60 {
            let _ = estimator.update(accel, gyro, 0.01);
        }

        assert!(value_close_within(20.0, estimator.state().roll, 1e-3));
        assert!(value_close_within(0.0, estimator.state().pitch, 1e-3));
    }

    /// Convergence is faster as alpha approaches zero.
    #[test]
    fn test_estimator_smaller_alpha_converges_faster() {
        let accel = tilt(10.0);
        let gyro = Vector3::default();
        let mut slow = AttitudeEstimator::new(0.98_f32);
        let mut fast = AttitudeEstimator::new(0.2_f32);

        for _ in 0..10 {
            let _ = slow.update(accel, gyro, 0.01);
            let _ = fast.update(accel, gyro, 0.01);
        }

        let slow_gap = 10.0 - slow.state().roll;
        let fast_gap = 10.0 - fast.state().roll;
        assert!(fast_gap < slow_gap);
        assert!(value_close_within(10.0, fast.state().roll, 1e-3));
    }

    /// An estimate that already agrees with the accelerometer holds for any alpha.
    #[test]
    fn test_estimator_holds_under_accel_agreement() {
        let accel = tilt(15.0);
        let agreed = accel_angles(accel);

        for alpha in [0.0_f32, 0.3, 0.98, 1.0] {
            let mut estimator = AttitudeEstimator::with_state(alpha, agreed);
            for _ in 0..20 {
                let _ = estimator.update(accel, Vector3::default(), 0.0);
            }
            assert!(value_close_within(agreed.roll, estimator.state().roll, 1e-4));
            assert!(value_close_within(agreed.pitch, estimator.state().pitch, 1e-4));
        }
    }

    /// Gyro rate is integrated over dt.
    #[test]
    fn test_estimator_integrates_gyro() {
        let mut estimator = AttitudeEstimator::new(1.0_f32);
        let gyro = Vector3::new(10.0, -5.0, 100.0);

        let state = estimator.update(Vector3::new(0.0, 0.0, 1.0), gyro, 0.1);

        assert!(value_close(1.0, state.roll));
        assert!(value_close(-0.5, state.pitch));
    }

    /// A negative dt from timer rollover behaves as zero elapsed time.
    #[test]
    fn test_estimator_negative_dt_clamped() {
        let accel = tilt(5.0);
        let gyro = Vector3::new(50.0, 50.0, 0.0);
        let mut rolled_over = AttitudeEstimator::new(0.98_f32);
        let mut stalled = AttitudeEstimator::new(0.98_f32);

        let a = rolled_over.update(accel, gyro, -4294.0);
        let b = stalled.update(accel, gyro, 0.0);

        assert_eq!(a, b);
    }

    #[test]
    fn test_estimator_default_alpha() {
        let estimator = AttitudeEstimator::<f32>::default();
        assert!(value_close(0.98, estimator.alpha()));
        assert_eq!(estimator.state(), EulerState::default());
    }

    fn start_state<T: Real>(alpha: f64) -> EulerState<T> {
        AttitudeEstimator::<T>::new(T::constant(alpha)).state()
    }

    /// Construction works for any real type, not only those with `Default`.
    #[test]
    fn test_estimator_new_starts_level() {
        assert_eq!(start_state::<f64>(0.98), EulerState { roll: 0.0, pitch: 0.0 });
        assert_eq!(start_state::<f32>(0.5), EulerState::level());
    }

    /// Upside down still reads as level: each angle stays within +/-90 degrees.
    #[test]
    fn test_accel_angles_bounded() {
        for accel in [
            Vector3::new(0.0_f32, 0.9, 0.2),
            Vector3::new(0.0, -0.9, 0.2),
            Vector3::new(0.7, 0.7, 0.1),
            Vector3::new(0.0, 0.01, 1.0),
        ] {
            let angles = accel_angles(accel);
            assert!((-90.0..=90.0).contains(&angles.roll));
            assert!((-90.0..=90.0).contains(&angles.pitch));
        }
    }
}
