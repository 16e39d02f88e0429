#![cfg_attr(not(test), no_std)]

//! txpulse - real-time pulse generation core for RC transmitters
//!
//! This library provides the time-critical core of an RC transmitter: the
//! mixer pacing scheduler, the per-module interrupt-driven pulse output
//! state machines (PPM, synchronous and frame-based protocols), trainer
//! input capture, and the cooperative task structure that keeps pulse
//! output on time while lower-priority UI work runs alongside.
//!
//! Mixing math, protocol frame encoding, UI rendering and model storage are
//! external collaborators reached through traits.

// Platform abstraction layer (hardware timers, serial, power)
pub mod platform;

// Core systems (mixer scheduler, tasks, logging, shared state)
pub mod core;

// Protocol data model and module output state machines
pub mod pulses;
