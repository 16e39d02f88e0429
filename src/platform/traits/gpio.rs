//! Output pin interface
//!
//! Used for the module power switches (internal/external RF module supply
//! rails). Input sampling for buttons goes through the power interface
//! instead.

/// Push-pull output pin
///
/// # Safety Invariants
///
/// - Only one owner per pin instance
/// - No concurrent access to the same pin from multiple contexts
pub trait OutputPin {
    /// Drive the pin high
    fn set_high(&mut self);

    /// Drive the pin low
    fn set_low(&mut self);

    /// Read back the currently driven level
    fn read(&self) -> bool;
}
