// src/hardware.rs

//! # Hardware Seams
//!
//! Traits implemented by the hardware access layer (I2C sensor reads, PWM
//! output, the microsecond tick source) and the plain data passed across them.
//! Every call is synchronous. A stalled implementation stalls the whole
//! control cycle, since the loop has no timeout of its own.

use core::ops::{Add, Sub};

use crate::error::HardwareError;

/// A three-axis vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3<T> {
    /// X axis.
    pub x: T,
    /// Y axis.
    pub y: T,
    /// Z axis.
    pub z: T,
}

impl<T> Vector3<T> {
    /// Creates a vector from its components.
    pub const fn new(x: T, y: T, z: T) -> Self {
        Vector3 { x, y, z }
    }
}

impl<T: Add<Output = T>> Add for Vector3<T> {
    type Output = Vector3<T>;

    fn add(self, other: Self) -> Self::Output {
        Vector3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl<T: Sub<Output = T>> Sub for Vector3<T> {
    type Output = Vector3<T>;

    fn sub(self, other: Self) -> Self::Output {
        Vector3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

/// One reading of the inertial measurement unit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InertialSample<T> {
    /// Acceleration in g.
    pub accel: Vector3<T>,
    /// Angular rate in degrees per second.
    pub gyro: Vector3<T>,
}

/// Source of inertial samples.
pub trait InertialSensor<T> {
    /// Reads one accelerometer and gyroscope sample.
    fn read_sample(&mut self) -> Result<InertialSample<T>, HardwareError>;
}

/// Motor pulse output, one pulse width per rotor.
pub trait MotorOutput<T> {
    /// Writes a pulse width in milliseconds to `motor` (`0..4`).
    fn write_pulse(&mut self, motor: usize, pulse_ms: T) -> Result<(), HardwareError>;
}

/// Wrapping microsecond tick source.
pub trait MonotonicClock {
    /// Current tick in microseconds. Wraps at `u32::MAX`.
    fn ticks_us(&mut self) -> u32;
}

/// Pin and bus assignments handed to the hardware layer at bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareLayout {
    /// GPIO pins for receiver channels 1 through 5.
    pub receiver_pins: [u8; 5],
    /// GPIO pins for motors 1 through 4.
    pub motor_pins: [u8; 4],
    /// PWM frequency for the motor outputs.
    pub pwm_frequency_hz: u32,
    /// I2C bus the IMU sits on.
    pub imu_bus: u8,
    /// I2C address of the IMU.
    pub imu_address: u8,
}

impl HardwareLayout {
    /// Layout of the reference Raspberry Pi build with an MPU-6050.
    pub const fn new() -> Self {
        HardwareLayout {
            receiver_pins: [17, 27, 22, 18, 23],
            motor_pins: [10, 9, 25, 8],
            pwm_frequency_hz: 400,
            imu_bus: 1,
            imu_address: 0x68,
        }
    }

    /// PWM period in milliseconds.
    pub fn pwm_period_ms(&self) -> f32 {
        1000.0 / self.pwm_frequency_hz as f32
    }
}

impl Default for HardwareLayout {
    fn default() -> Self {
        Self::new()
    }
}
