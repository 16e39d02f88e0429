//! Core trait abstractions

pub mod sync;

pub use sync::SharedState;
