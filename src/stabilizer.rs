// src/stabilizer.rs

//! # Stabilizer Module
//!
//! PID-based stabilizers built from the compute functions in [`crate::pid`].

pub mod flight_stabilizer;
pub use flight_stabilizer::*;
pub mod level;
pub use level::*;
