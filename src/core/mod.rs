//! Core real-time logic
//!
//! Contains the mixer trigger scheduler, the cooperative task bodies
//! (mixer, menus) and their supervisor, the shared-state synchronization
//! abstraction, and the logging macros. Everything here is hardware-free
//! and drives the platform only through the traits in
//! [`crate::platform::traits`].

pub mod logging;
pub mod scheduler;
pub mod tasks;
pub mod traits;
