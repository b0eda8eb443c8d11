// src/flight_loop.rs

//! # Flight Loop
//!
//! The control cycle. Each [`FlightLoop::step`] runs, in this order:
//!
//! 1. elapsed time since the previous cycle from the microsecond clock
//! 2. stick mapping of the latest receiver pulse widths
//! 3. inertial sample read and offset correction
//! 4. attitude estimate update
//! 5. arm state update from the arm switch and throttle
//! 6. PID correction and motor mixing when armed, idle otherwise
//! 7. motor output write
//!
//! The estimator runs in both arm states so the attitude is settled by the
//! time the vehicle arms. The PID controller only runs while armed and is
//! reset on every arming, so no error accumulated on the ground carries into
//! flight. The arming cycle itself still writes idle.

use core::convert::Infallible;

use crate::arming::{ArmState, ArmStateMachine, ArmTransition};
use crate::config::FlightControllerConfig;
use crate::error::{ConfigError, FlightResult};
use crate::estimator::{calibrate, AttitudeEstimator, EulerState, SensorOffsets};
use crate::hardware::{InertialSensor, MonotonicClock, MotorOutput};
use crate::mixer::{MotorCommand, MotorMixer};
use crate::receiver::{PulseDecoder, StickInput};
use crate::stabilizer::LevelStabilizer;
use crate::{FlightStabilizer, Real};

/// What one control cycle observed and commanded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport<T> {
    /// Seconds since the previous cycle.
    pub dt: T,
    /// Mapped pilot input.
    pub stick: StickInput<T>,
    /// Attitude estimate after this cycle.
    pub attitude: EulerState<T>,
    /// PID output `(roll, pitch, yaw)`, `None` when the controller did not run.
    pub correction: Option<(T, T, T)>,
    /// Pulses written to the motors.
    pub command: MotorCommand<T>,
    /// Arm state after this cycle.
    pub arm_state: ArmState,
    /// Arm state change during this cycle.
    pub transition: ArmTransition,
}

/// The stabilization pipeline bound to its hardware.
pub struct FlightLoop<'a, T, S, M, C>
where
    T: Real,
{
    decoder: &'a PulseDecoder,
    sensor: S,
    motors: M,
    clock: C,
    config: FlightControllerConfig<T>,
    offsets: SensorOffsets<T>,
    estimator: AttitudeEstimator<T>,
    stabilizer: LevelStabilizer<T>,
    mixer: MotorMixer<T>,
    arming: ArmStateMachine<T>,
    last_tick: u32,
}

impl<'a, T, S, M, C> FlightLoop<'a, T, S, M, C>
where
    T: Real,
    S: InertialSensor<T>,
    M: MotorOutput<T>,
    C: MonotonicClock,
{
    /// Builds a disarmed loop with zero sensor offsets.
    ///
    /// `decoder` must use the configured arm switch threshold, as built by
    /// [`FlightControllerConfig::pulse_decoder`].
    pub fn new(
        config: FlightControllerConfig<T>,
        decoder: &'a PulseDecoder,
        sensor: S,
        motors: M,
        mut clock: C,
    ) -> FlightResult<Self> {
        config.validate()?;
        if decoder.arm_threshold_us() != config.arm_switch_threshold_us {
            return Err(ConfigError::ArmSwitchThreshold.into());
        }
        let last_tick = clock.ticks_us();

        Ok(FlightLoop {
            decoder,
            sensor,
            motors,
            clock,
            offsets: SensorOffsets::zero(),
            estimator: AttitudeEstimator::new(config.alpha),
            stabilizer: LevelStabilizer::with_gains(config.gains),
            mixer: config.mixer(),
            arming: ArmStateMachine::new(config.arm_throttle_limit),
            config,
            last_tick,
        })
    }

    /// Builds a disarmed loop and calibrates sensor offsets first. The
    /// vehicle must be level and still.
    pub fn with_calibration(
        config: FlightControllerConfig<T>,
        decoder: &'a PulseDecoder,
        sensor: S,
        motors: M,
        clock: C,
    ) -> FlightResult<Self> {
        let mut flight = Self::new(config, decoder, sensor, motors, clock)?;
        flight.offsets = calibrate(&mut flight.sensor, flight.config.calibration_samples)?;
        // Calibration time is not part of the first cycle.
        flight.last_tick = flight.clock.ticks_us();
        Ok(flight)
    }

    /// Runs one control cycle.
    pub fn step(&mut self) -> FlightResult<CycleReport<T>> {
        let dt = self.elapsed();
        let stick = StickInput::read(self.decoder, &self.config.sticks);
        let sample = self.offsets.apply(self.sensor.read_sample()?);
        let attitude = self.estimator.update(sample.accel, sample.gyro, dt);

        let transition = self
            .arming
            .update(self.decoder.arm_requested(), stick.throttle);
        if transition == ArmTransition::Armed {
            self.stabilizer.reset();
        }

        let (correction, command) =
            if self.arming.is_armed() && transition != ArmTransition::Armed {
                let correction = self.stabilizer.control(attitude, dt);
                (Some(correction), self.mixer.mix(stick.throttle, correction))
            } else {
                (None, self.mixer.idle())
            };
        self.write(&command)?;
        log::trace!("Motor command {:?}", command.pulses);

        Ok(CycleReport {
            dt,
            stick,
            attitude,
            correction,
            command,
            arm_state: self.arming.state(),
            transition,
        })
    }

    /// Runs cycles back to back until a hardware error stops the loop.
    pub fn run(&mut self) -> FlightResult<Infallible> {
        loop {
            self.step()
                .inspect_err(|error| log::error!("Flight loop stopped: {}", error))?;
        }
    }

    /// Current arm state.
    pub fn arm_state(&self) -> ArmState {
        self.arming.state()
    }

    /// Latest attitude estimate.
    pub fn attitude(&self) -> EulerState<T> {
        self.estimator.state()
    }

    /// Offsets subtracted from each inertial sample.
    pub fn offsets(&self) -> &SensorOffsets<T> {
        &self.offsets
    }

    /// The PID stabilizer.
    pub fn stabilizer(&self) -> &LevelStabilizer<T> {
        &self.stabilizer
    }

    /// Configuration the loop was built with.
    pub fn config(&self) -> &FlightControllerConfig<T> {
        &self.config
    }

    /// Inertial sensor.
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Motor output.
    pub fn motors(&self) -> &M {
        &self.motors
    }

    /// Tick source.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    // A wrapped or backwards tick reads as zero elapsed time.
    fn elapsed(&mut self) -> T {
        let now = self.clock.ticks_us();
        let elapsed_us = (i64::from(now) - i64::from(self.last_tick)).max(0);
        self.last_tick = now;
        T::constant(elapsed_us as f64 / 1_000_000.0)
    }

    fn write(&mut self, command: &MotorCommand<T>) -> FlightResult<()> {
        for (motor, pulse) in command.pulses.iter().enumerate() {
            self.motors.write_pulse(motor, *pulse)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FlightError, HardwareError};
    use crate::hardware::{InertialSample, Vector3};
    use crate::receiver::{Channel, EdgeLevel};
    use crate::test_utils::*;
    use crate::StabilizerGains;

    struct StaticSensor {
        sample: InertialSample<f32>,
        reads: usize,
        fail: bool,
    }

    impl StaticSensor {
        fn level() -> Self {
            StaticSensor {
                sample: InertialSample {
                    accel: Vector3::new(0.0, 0.0, 1.0),
                    gyro: Vector3::default(),
                },
                reads: 0,
                fail: false,
            }
        }
    }

    impl InertialSensor<f32> for StaticSensor {
        fn read_sample(&mut self) -> Result<InertialSample<f32>, HardwareError> {
            if self.fail {
                return Err(HardwareError::SensorRead);
            }
            self.reads += 1;
            Ok(self.sample)
        }
    }

    #[derive(Default)]
    struct RecordingMotors {
        pulses: [f32; 4],
        writes: usize,
        fail: bool,
    }

    impl MotorOutput<f32> for RecordingMotors {
        fn write_pulse(&mut self, motor: usize, pulse_ms: f32) -> Result<(), HardwareError> {
            if self.fail {
                return Err(HardwareError::MotorWrite);
            }
            self.pulses[motor] = pulse_ms;
            self.writes += 1;
            Ok(())
        }
    }

    struct StepClock {
        now: u32,
        step: u32,
    }

    impl MonotonicClock for StepClock {
        fn ticks_us(&mut self) -> u32 {
            let now = self.now;
            self.now = self.now.wrapping_add(self.step);
            now
        }
    }

    type TestLoop<'a> = FlightLoop<'a, f32, StaticSensor, RecordingMotors, StepClock>;

    fn pulse(decoder: &PulseDecoder, channel: Channel, width: u32) {
        decoder.on_edge(channel, EdgeLevel::Rising, 100_000);
        decoder.on_edge(channel, EdgeLevel::Falling, 100_000 + width);
    }

    fn centered_sticks(decoder: &PulseDecoder, throttle: u32, arm: u32) {
        pulse(decoder, Channel::Yaw, 1_500);
        pulse(decoder, Channel::Roll, 1_500);
        pulse(decoder, Channel::Pitch, 1_500);
        pulse(decoder, Channel::Throttle, throttle);
        pulse(decoder, Channel::Arm, arm);
    }

    fn flight_loop(decoder: &PulseDecoder, gains: StabilizerGains<f32>) -> TestLoop<'_> {
        FlightLoop::new(
            FlightControllerConfig::with_gains(gains),
            decoder,
            StaticSensor::level(),
            RecordingMotors::default(),
            StepClock {
                now: 0,
                step: 10_000,
            },
        )
        .unwrap()
    }

    fn level_gains() -> StabilizerGains<f32> {
        StabilizerGains::from_vectors((1.0, 1.0, 0.0), (0.0, 0.0, 0.0), (0.0, 0.0, 0.0))
    }

    /// Level accelerometer and zero error leave every motor at throttle.
    #[test]
    fn test_level_hover_motors_follow_throttle() {
        let decoder = PulseDecoder::default();
        centered_sticks(&decoder, 1_000, 1_900);
        let mut flight = flight_loop(&decoder, level_gains());

        let report = flight.step().unwrap();
        assert_eq!(report.transition, ArmTransition::Armed);
        assert_eq!(report.correction, None);
        assert_eq!(report.command, MotorCommand::uniform(1.0));

        pulse(&decoder, Channel::Throttle, 1_500);
        for _ in 0..200 {
            let report = flight.step().unwrap();
            assert!(value_close(0.01, report.dt));
            assert!(value_close(0.0, report.attitude.roll));
            assert!(value_close(0.0, report.attitude.pitch));

            let correction = report.correction.unwrap();
            assert!(vector_close((0.0, 0.0, 0.0), correction));
        }
        for pulse in flight.motors().pulses {
            assert!(value_close(1.5, pulse));
        }
        assert_eq!(flight.arm_state(), ArmState::Armed);
    }

    /// Motors stay at idle whatever the sticks do while disarmed.
    #[test]
    fn test_disarmed_holds_idle() {
        let decoder = PulseDecoder::default();
        centered_sticks(&decoder, 1_800, 1_000);
        let mut flight = flight_loop(&decoder, level_gains());
        flight.sensor_mut().sample.accel = Vector3::new(0.0, 0.5, 0.8);

        for _ in 0..20 {
            let report = flight.step().unwrap();
            assert_eq!(report.arm_state, ArmState::Disarmed);
            assert_eq!(report.correction, None);
            assert_eq!(report.command, MotorCommand::uniform(1.0));
        }
        assert_eq!(flight.motors().writes, 80);
        assert_eq!(flight.stabilizer().state().error_sum, (0.0, 0.0, 0.0));

        // The estimator still tracks attitude on the ground.
        assert!(flight.attitude().roll > 1.0);
    }

    #[test]
    fn test_refused_arm_then_idle_throttle() {
        let decoder = PulseDecoder::default();
        centered_sticks(&decoder, 1_200, 1_900);
        let mut flight = flight_loop(&decoder, level_gains());

        let report = flight.step().unwrap();
        assert_eq!(report.transition, ArmTransition::Refused);
        assert_eq!(report.command, MotorCommand::uniform(1.0));

        pulse(&decoder, Channel::Throttle, 900);
        let report = flight.step().unwrap();
        assert_eq!(report.transition, ArmTransition::Armed);
    }

    #[test]
    fn test_pid_reset_on_rearm() {
        let decoder = PulseDecoder::default();
        centered_sticks(&decoder, 1_000, 1_900);
        let gains = StabilizerGains::from_vectors((1.0, 1.0, 0.0), (1.0, 1.0, 0.0), (0.0, 0.0, 0.0));
        let mut flight = flight_loop(&decoder, gains);
        flight.sensor_mut().sample.accel = Vector3::new(0.0, 0.5, 0.8);

        for _ in 0..10 {
            let _ = flight.step().unwrap();
        }
        assert!(flight.stabilizer().state().error_sum.0 < 0.0);

        pulse(&decoder, Channel::Arm, 1_000);
        let report = flight.step().unwrap();
        assert_eq!(report.transition, ArmTransition::Disarmed);

        pulse(&decoder, Channel::Arm, 1_900);
        let report = flight.step().unwrap();
        assert_eq!(report.transition, ArmTransition::Armed);

        let state = flight.stabilizer().state();
        assert_eq!(state.error_sum, (0.0, 0.0, 0.0));
        assert!(state.first_iteration);
    }

    #[test]
    fn test_backwards_clock_gives_zero_dt() {
        let decoder = PulseDecoder::default();
        let mut flight = flight_loop(&decoder, level_gains());
        let _ = flight.step().unwrap();

        flight.clock_mut().now = 5;
        let report = flight.step().unwrap();
        assert_eq!(report.dt, 0.0);

        let report = flight.step().unwrap();
        assert!(value_close(0.01, report.dt));
    }

    #[test]
    fn test_sensor_failure_propagates() {
        let decoder = PulseDecoder::default();
        let mut flight = flight_loop(&decoder, level_gains());
        flight.sensor_mut().fail = true;

        assert_eq!(
            flight.step(),
            Err(FlightError::Hardware(HardwareError::SensorRead))
        );
        assert_eq!(
            flight.run().unwrap_err(),
            FlightError::Hardware(HardwareError::SensorRead)
        );
        assert_eq!(flight.motors().writes, 0);
    }

    #[test]
    fn test_motor_failure_stops_run() {
        let decoder = PulseDecoder::default();
        let mut flight = FlightLoop::new(
            FlightControllerConfig::new(),
            &decoder,
            StaticSensor::level(),
            RecordingMotors {
                fail: true,
                ..Default::default()
            },
            StepClock { now: 0, step: 1 },
        )
        .unwrap();

        assert_eq!(
            flight.run().unwrap_err(),
            FlightError::Hardware(HardwareError::MotorWrite)
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let decoder = PulseDecoder::default();
        let mut config = FlightControllerConfig::new();
        config.motor_high = 0.5;

        let result: FlightResult<TestLoop<'_>> = FlightLoop::new(
            config,
            &decoder,
            StaticSensor::level(),
            RecordingMotors::default(),
            StepClock { now: 0, step: 1 },
        );
        assert!(matches!(result, Err(FlightError::Config(_))));
    }

    #[test]
    fn test_decoder_threshold_must_match_config() {
        let decoder = PulseDecoder::new(1_600);
        let result: FlightResult<TestLoop<'_>> = FlightLoop::new(
            FlightControllerConfig::new(),
            &decoder,
            StaticSensor::level(),
            RecordingMotors::default(),
            StepClock { now: 0, step: 1 },
        );
        assert!(matches!(
            result,
            Err(FlightError::Config(ConfigError::ArmSwitchThreshold))
        ));

        let mut config = FlightControllerConfig::new();
        config.arm_switch_threshold_us = 1_600;
        let decoder = config.pulse_decoder();
        let result: FlightResult<TestLoop<'_>> = FlightLoop::new(
            config,
            &decoder,
            StaticSensor::level(),
            RecordingMotors::default(),
            StepClock { now: 0, step: 1 },
        );
        assert!(result.is_ok());
    }

    /// A stray arm channel edge with the switch low leaves the motors at idle.
    #[test]
    fn test_lone_arm_edge_does_not_arm() {
        let decoder = PulseDecoder::default();
        pulse(&decoder, Channel::Throttle, 1_000);
        decoder.on_edge(Channel::Arm, EdgeLevel::Falling, 3_005_000);
        let mut flight = flight_loop(&decoder, level_gains());
        flight.sensor_mut().sample.accel = Vector3::new(0.0, 0.5, 0.8);

        for _ in 0..5 {
            let report = flight.step().unwrap();
            assert_eq!(report.arm_state, ArmState::Disarmed);
            assert_eq!(report.command, MotorCommand::uniform(1.0));
        }
    }

    /// Calibration removes a constant bias before the estimator sees it.
    #[test]
    fn test_with_calibration_removes_bias() {
        let decoder = PulseDecoder::default();
        let mut sensor = StaticSensor::level();
        sensor.sample = InertialSample {
            accel: Vector3::new(0.1, 0.0, -1.0),
            gyro: Vector3::new(2.0, -1.0, 0.5),
        };
        let mut flight = FlightLoop::with_calibration(
            FlightControllerConfig::new(),
            &decoder,
            sensor,
            RecordingMotors::default(),
            StepClock {
                now: 0,
                step: 10_000,
            },
        )
        .unwrap();

        assert!(vector_close(
            (0.1, 0.0, 0.0),
            (flight.offsets().accel.x, flight.offsets().accel.y, flight.offsets().accel.z)
        ));

        let report = flight.step().unwrap();
        assert!(value_close(0.01, report.dt));
        assert!(value_close(0.0, report.attitude.roll));
        assert!(value_close(0.0, report.attitude.pitch));
        assert_eq!(flight.sensor_mut().reads, 101);
    }
}
