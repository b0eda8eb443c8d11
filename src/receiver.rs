// src/receiver.rs

//! # Radio Receiver Module
//!
//! Edge-timed pulse decoding for the five receiver channels and the mapping
//! of their widths onto stick commands.

pub mod pulse_decoder;
pub use pulse_decoder::*;
pub mod stick_map;
pub use stick_map::*;
