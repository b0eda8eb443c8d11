// src/estimator/raw.rs

//! Conversion of raw IMU register words into physical units.

use crate::hardware::{InertialSample, Vector3};
use crate::Real;

/// Combines a big-endian register pair into a signed 16-bit reading.
///
/// Values past `0x7FFF` wrap to negative through two's complement.
pub fn decode_word(high: u8, low: u8) -> i16 {
    i16::from_be_bytes([high, low])
}

/// Sensitivity of the accelerometer and gyroscope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuScale<T> {
    /// Accelerometer counts per g.
    pub accel_lsb_per_g: T,
    /// Gyroscope counts per degree per second.
    pub gyro_lsb_per_dps: T,
}

impl<T: Real> ImuScale<T> {
    /// Full-scale ranges of +/-2 g and +/-500 deg/s.
    pub fn new() -> Self {
        ImuScale {
            accel_lsb_per_g: T::constant(16384.0),
            gyro_lsb_per_dps: T::constant(65.5),
        }
    }
}

impl<T: Real> Default for ImuScale<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Signed register readings for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawInertialSample {
    /// Accelerometer X, Y, Z counts.
    pub accel: [i16; 3],
    /// Gyroscope X, Y, Z counts.
    pub gyro: [i16; 3],
}

impl RawInertialSample {
    /// Unpacks a 14-byte burst read starting at the accelerometer X high
    /// register: six accelerometer bytes, two temperature bytes, six gyro bytes.
    pub fn from_registers(bytes: &[u8; 14]) -> Self {
        let word = |index: usize| decode_word(bytes[index], bytes[index + 1]);
        RawInertialSample {
            accel: [word(0), word(2), word(4)],
            gyro: [word(8), word(10), word(12)],
        }
    }

    /// Converts counts into g and degrees per second.
    pub fn scale<T: Real>(&self, scale: &ImuScale<T>) -> InertialSample<T> {
        let accel = |axis: usize| T::constant(f64::from(self.accel[axis])) / scale.accel_lsb_per_g;
        let gyro = |axis: usize| T::constant(f64::from(self.gyro[axis])) / scale.gyro_lsb_per_dps;
        InertialSample {
            accel: Vector3::new(accel(0), accel(1), accel(2)),
            gyro: Vector3::new(gyro(0), gyro(1), gyro(2)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_decode_word_two_complement() {
        assert_eq!(decode_word(0x00, 0x01), 1);
        assert_eq!(decode_word(0x7F, 0xFF), i16::MAX);
        assert_eq!(decode_word(0x80, 0x00), i16::MIN);
        assert_eq!(decode_word(0xFF, 0xFF), -1);
    }

    #[test]
    fn test_from_registers_skips_temperature() {
        let bytes = [
            0x40, 0x00, // accel x = 16384
            0xC0, 0x00, // accel y = -16384
            0x00, 0x00, // accel z
            0x12, 0x34, // temperature
            0x00, 0x83, // gyro x = 131
            0xFF, 0x7D, // gyro y = -131
            0x00, 0x00, // gyro z
        ];
        let raw = RawInertialSample::from_registers(&bytes);

        assert_eq!(raw.accel, [16384, -16384, 0]);
        assert_eq!(raw.gyro, [131, -131, 0]);
    }

    #[test]
    fn test_scale_to_physical_units() {
        let raw = RawInertialSample {
            accel: [16384, -8192, 0],
            gyro: [131, -655, 0],
        };
        let sample = raw.scale(&ImuScale::<f32>::new());

        assert!(vector_close(
            (1.0, -0.5, 0.0),
            (sample.accel.x, sample.accel.y, sample.accel.z)
        ));
        assert!(vector_close(
            (2.0, -10.0, 0.0),
            (sample.gyro.x, sample.gyro.y, sample.gyro.z)
        ));
    }
}
