// src/receiver/pulse_decoder.rs

//! # Radio Pulse Decoder
//!
//! Recovers receiver pulse widths from edge timestamps. Each channel has one
//! writer (its edge handler) and one reader (the flight loop), so every value
//! is a single atomic word and no lock is taken on either side.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::Real;

/// Default arm switch threshold in microseconds.
pub const DEFAULT_ARM_THRESHOLD_US: u32 = 1400;

/// Receiver channels, in receiver order `CH1..=CH5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// CH1, yaw stick.
    Yaw = 0,
    /// CH2, roll stick.
    Roll = 1,
    /// CH3, throttle stick.
    Throttle = 2,
    /// CH4, pitch stick.
    Pitch = 3,
    /// CH5, arm switch.
    Arm = 4,
}

impl Channel {
    /// All channels in receiver order.
    pub const ALL: [Channel; 5] = [
        Channel::Yaw,
        Channel::Roll,
        Channel::Throttle,
        Channel::Pitch,
        Channel::Arm,
    ];

    /// Zero-based index into per-channel tables.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Signal level reported with an edge event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLevel {
    /// Low to high transition.
    Rising,
    /// High to low transition.
    Falling,
}

impl EdgeLevel {
    /// Maps a GPIO callback level, `1` rising and `0` falling. Other values
    /// such as a watchdog timeout report carry no edge.
    pub fn from_gpio_level(level: u32) -> Option<Self> {
        match level {
            1 => Some(EdgeLevel::Rising),
            0 => Some(EdgeLevel::Falling),
            _ => None,
        }
    }
}

/// Edge timing for one channel.
#[derive(Debug, Default)]
pub struct ChannelState {
    rising_edge_tick: AtomicU32,
    rising_pending: AtomicBool,
    pulse_width_us: AtomicU32,
}

impl ChannelState {
    /// Creates a channel with no pulse seen yet.
    pub const fn new() -> Self {
        ChannelState {
            rising_edge_tick: AtomicU32::new(0),
            rising_pending: AtomicBool::new(false),
            pulse_width_us: AtomicU32::new(0),
        }
    }

    /// Last accepted pulse width in microseconds, zero before the first pulse.
    pub fn pulse_width_us(&self) -> u32 {
        self.pulse_width_us.load(Ordering::Acquire)
    }

    // Returns the new width when the falling edge was accepted. Each rising
    // edge pairs with at most one falling edge.
    fn on_edge(&self, level: EdgeLevel, tick: u32) -> Option<u32> {
        match level {
            EdgeLevel::Rising => {
                self.rising_edge_tick.store(tick, Ordering::Relaxed);
                self.rising_pending.store(true, Ordering::Release);
                None
            }
            EdgeLevel::Falling => {
                // No unpaired rising edge: first edge seen, or a repeated fall.
                if !self.rising_pending.swap(false, Ordering::Acquire) {
                    return None;
                }
                let rising = self.rising_edge_tick.load(Ordering::Relaxed);
                let width = i64::from(tick) - i64::from(rising);
                // Wraparound or a doubled edge keeps the previous width.
                if width <= 0 {
                    return None;
                }
                let width = u32::try_from(width).ok()?;
                self.pulse_width_us.store(width, Ordering::Release);
                Some(width)
            }
        }
    }
}

/// Pulse widths for all five receiver channels plus the derived arm request.
#[derive(Debug)]
pub struct PulseDecoder {
    channels: [ChannelState; 5],
    arm_requested: AtomicBool,
    arm_threshold_us: u32,
}

impl PulseDecoder {
    /// Creates a decoder with the arm request asserted above `arm_threshold_us`.
    pub const fn new(arm_threshold_us: u32) -> Self {
        PulseDecoder {
            channels: [
                ChannelState::new(),
                ChannelState::new(),
                ChannelState::new(),
                ChannelState::new(),
                ChannelState::new(),
            ],
            arm_requested: AtomicBool::new(false),
            arm_threshold_us,
        }
    }

    /// Handles one edge event for `channel`. Safe to call from an interrupt
    /// or callback context concurrently with readers.
    pub fn on_edge(&self, channel: Channel, level: EdgeLevel, tick: u32) {
        let accepted = self.channels[channel.index()].on_edge(level, tick);
        if let (Channel::Arm, Some(width)) = (channel, accepted) {
            let requested = width > self.arm_threshold_us;
            self.arm_requested.store(requested, Ordering::Release);
            log::trace!("Arm switch pulse {} us, requested {}", width, requested);
        }
    }

    /// Returns an edge handler bound to one channel, for registration with
    /// an edge-subscription mechanism.
    pub fn handler(&self, channel: Channel) -> impl Fn(EdgeLevel, u32) + '_ {
        move |level, tick| self.on_edge(channel, level, tick)
    }

    /// Latest pulse width of `channel` in microseconds.
    pub fn pulse_width_us(&self, channel: Channel) -> u32 {
        self.channels[channel.index()].pulse_width_us()
    }

    /// Latest pulse width of `channel` in milliseconds.
    pub fn pulse_width_ms<T: Real>(&self, channel: Channel) -> T {
        T::constant(f64::from(self.pulse_width_us(channel)) / 1000.0)
    }

    /// Whether the arm switch was above threshold on its last pulse.
    pub fn arm_requested(&self) -> bool {
        self.arm_requested.load(Ordering::Acquire)
    }

    /// Arm switch threshold in microseconds.
    pub fn arm_threshold_us(&self) -> u32 {
        self.arm_threshold_us
    }
}

impl Default for PulseDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_ARM_THRESHOLD_US)
    }
}
