// demos/hover.rs

use std::cell::RefCell;
use std::rc::Rc;

use quadrotor_stabilization::error::HardwareError;
use quadrotor_stabilization::hardware::{
    InertialSample, InertialSensor, MonotonicClock, MotorOutput, Vector3,
};
use quadrotor_stabilization::{
    Channel, EdgeLevel, FlightControllerConfig, FlightLoop, PulseDecoder, StabilizerGains,
};

// Angular acceleration in deg/s^2 per millisecond of differential pulse.
const TORQUE_GAIN: f32 = 40.0;
const CYCLE_US: u32 = 5_000;

// Rigid body tilting under differential thrust.
struct Airframe {
    roll: f32,
    pitch: f32,
    roll_rate: f32,
    pitch_rate: f32,
    pulses: [f32; 4],
}

impl Airframe {
    fn advance(&mut self, dt: f32) {
        let [m1, m2, m3, m4] = self.pulses;
        self.roll_rate += TORQUE_GAIN * ((m3 + m4) - (m1 + m2)) * dt;
        self.pitch_rate += TORQUE_GAIN * ((m1 + m4) - (m2 + m3)) * dt;
        self.roll += self.roll_rate * dt;
        self.pitch += self.pitch_rate * dt;
    }
}

struct SimulatedImu(Rc<RefCell<Airframe>>);

impl InertialSensor<f32> for SimulatedImu {
    fn read_sample(&mut self) -> Result<InertialSample<f32>, HardwareError> {
        let airframe = self.0.borrow();
        let (roll, pitch) = (airframe.roll.to_radians(), airframe.pitch.to_radians());
        Ok(InertialSample {
            accel: Vector3::new(
                -pitch.sin(),
                roll.sin() * pitch.cos(),
                -roll.cos() * pitch.cos(),
            ),
            gyro: Vector3::new(airframe.roll_rate, airframe.pitch_rate, 0.0),
        })
    }
}

struct SimulatedMotors(Rc<RefCell<Airframe>>);

impl MotorOutput<f32> for SimulatedMotors {
    fn write_pulse(&mut self, motor: usize, pulse_ms: f32) -> Result<(), HardwareError> {
        let mut airframe = self.0.borrow_mut();
        let slot = airframe
            .pulses
            .get_mut(motor)
            .ok_or(HardwareError::MotorWrite)?;
        *slot = pulse_ms;
        Ok(())
    }
}

// Each tick advances the simulation by one cycle.
struct SimulatedClock {
    now: u32,
    airframe: Rc<RefCell<Airframe>>,
}

impl MonotonicClock for SimulatedClock {
    fn ticks_us(&mut self) -> u32 {
        self.airframe
            .borrow_mut()
            .advance(CYCLE_US as f32 / 1_000_000.0);
        self.now = self.now.wrapping_add(CYCLE_US);
        self.now
    }
}

fn pulse(decoder: &PulseDecoder, channel: Channel, width_us: u32) {
    decoder.on_edge(channel, EdgeLevel::Rising, 0);
    decoder.on_edge(channel, EdgeLevel::Falling, width_us);
}

fn main() {
    let gains = StabilizerGains::from_vectors(
        (0.01, 0.01, 0.0),   // kp roll, pitch, yaw
        (0.002, 0.002, 0.0), // ki
        (0.003, 0.003, 0.0), // kd
    );
    let config = FlightControllerConfig::with_gains(gains);
    let decoder = config.pulse_decoder();

    // Sticks centered, throttle down, arm switch up.
    pulse(&decoder, Channel::Yaw, 1_500);
    pulse(&decoder, Channel::Roll, 1_500);
    pulse(&decoder, Channel::Pitch, 1_500);
    pulse(&decoder, Channel::Throttle, 1_000);
    pulse(&decoder, Channel::Arm, 1_900);

    let airframe = Rc::new(RefCell::new(Airframe {
        roll: 15.0,
        pitch: -10.0,
        roll_rate: 0.0,
        pitch_rate: 0.0,
        pulses: [1.0; 4],
    }));
    let mut flight = FlightLoop::new(
        config,
        &decoder,
        SimulatedImu(Rc::clone(&airframe)),
        SimulatedMotors(Rc::clone(&airframe)),
        SimulatedClock {
            now: 0,
            airframe: Rc::clone(&airframe),
        },
    )
    .expect("default configuration is valid");

    println!("   cycle   state      est roll  est pitch   true roll true pitch   motors");
    for cycle in 0..=400 {
        if cycle == 1 {
            pulse(&decoder, Channel::Throttle, 1_500);
        }
        let report = flight.step().expect("simulated hardware does not fail");

        if cycle % 25 == 0 {
            let airframe = airframe.borrow();
            let [m1, m2, m3, m4] = report.command.pulses;
            println!(
                "{:8} {:9} {:-10.3} {:-10.3} {:-10.3} {:-10.3}   {:.3} {:.3} {:.3} {:.3}",
                cycle,
                format!("{:?}", report.arm_state),
                report.attitude.roll,
                report.attitude.pitch,
                airframe.roll,
                airframe.pitch,
                m1,
                m2,
                m3,
                m4
            );
        }
    }
}
