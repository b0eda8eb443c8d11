// src/estimator/calibration.rs

//! Stationary sensor offset calibration.
//!
//! The vehicle must sit level and still while samples are taken. Accelerometer
//! offsets keep one g of gravity on the negative Z axis so that corrected
//! readings at rest are `(0, 0, -1)`.

use crate::error::{CalibrationError, FlightResult};
use crate::hardware::{InertialSample, InertialSensor, Vector3};
use crate::Real;

/// Default number of samples averaged during calibration.
pub const DEFAULT_CALIBRATION_SAMPLES: usize = 100;

/// Bias removed from every inertial sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorOffsets<T> {
    /// Accelerometer offset in g.
    pub accel: Vector3<T>,
    /// Gyroscope offset in degrees per second.
    pub gyro: Vector3<T>,
}

impl<T: Real> SensorOffsets<T> {
    /// Offsets that leave samples unchanged.
    pub fn zero() -> Self {
        let zero = Vector3::new(T::zero(), T::zero(), T::zero());
        SensorOffsets {
            accel: zero,
            gyro: zero,
        }
    }

    /// Subtracts the offsets from a sample.
    pub fn apply(&self, sample: InertialSample<T>) -> InertialSample<T> {
        InertialSample {
            accel: sample.accel - self.accel,
            gyro: sample.gyro - self.gyro,
        }
    }
}

/// Averages `samples` readings from a stationary sensor into offsets.
pub fn calibrate<T, S>(sensor: &mut S, samples: usize) -> FlightResult<SensorOffsets<T>>
where
    T: Real,
    S: InertialSensor<T>,
{
    if samples == 0 {
        return Err(CalibrationError::NoSamples.into());
    }
    log::info!("Calibrating sensor offsets over {} samples", samples);

    let zero = Vector3::new(T::zero(), T::zero(), T::zero());
    let mut accel_sum = zero;
    let mut gyro_sum = zero;
    for _ in 0..samples {
        let sample = sensor.read_sample()?;
        accel_sum = accel_sum + sample.accel;
        gyro_sum = gyro_sum + sample.gyro;
    }

    let count = T::constant(samples as f64);
    let gravity = Vector3::new(T::zero(), T::zero(), -T::one());
    let offsets = SensorOffsets {
        accel: mean(accel_sum, count) - gravity,
        gyro: mean(gyro_sum, count),
    };
    log::info!(
        "Sensor offsets: accel {:?} gyro {:?}",
        offsets.accel,
        offsets.gyro
    );

    Ok(offsets)
}

fn mean<T: Real>(sum: Vector3<T>, count: T) -> Vector3<T> {
    Vector3::new(sum.x / count, sum.y / count, sum.z / count)
}
