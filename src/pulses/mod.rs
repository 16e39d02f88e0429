//! Pulse generation data model
//!
//! Protocol classification, per-module state and the fixed-capacity pulse
//! buffers exchanged between the pulse producer (mixer side) and the
//! interrupt-driven module output state machine in [`driver`].

pub mod driver;
pub mod trainer;

use crate::platform::Polarity;

/// Number of module slots (internal RF + external bay)
pub const NUM_MODULES: usize = 2;

/// Internal RF module slot
pub const INTERNAL_MODULE: usize = 0;

/// External bay module slot
pub const EXTERNAL_MODULE: usize = 1;

/// Mixer output channel count
pub const NUM_CHANNELS: usize = 16;

/// Pulse width slots per PPM buffer, including the zero sentinel
pub const MAX_PULSE_SLOTS: usize = 20;

/// Byte capacity of a frame-protocol buffer
pub const MAX_FRAME_BYTES: usize = 64;

/// Synchronous protocols: the mixer cycle transmits the frame directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncProtocol {
    Crossfire,
}

/// Frame-based protocols: refilled from the mixer, drained by their own driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameProtocol {
    Pxx,
    Dsm2,
    Sbus,
}

/// Active pulse protocol of a module slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Slot disabled
    None,
    /// Slot not yet configured; forces re-validation in the interrupt handler
    Uninitialized,
    /// Classic PPM pulse train stepped edge by edge from the interrupt
    Ppm,
    /// Serial protocol transmitted synchronously with the mixer cycle
    Synchronous(SyncProtocol),
    /// Byte-frame protocol with its own transmit cadence
    Frame(FrameProtocol),
    /// Multi-protocol module
    MultiModule,
}

impl Protocol {
    /// Whether frames are transmitted from the mixer cycle
    pub fn is_synchronous(&self) -> bool {
        matches!(self, Protocol::Synchronous(_))
    }

    /// Whether the mixer cycle refills a byte-frame buffer
    pub fn is_frame_based(&self) -> bool {
        matches!(self, Protocol::Frame(_) | Protocol::MultiModule)
    }

    /// Whether this protocol is legal on the given module hardware type
    ///
    /// A disagreement means configuration changed under a live interrupt
    /// stream and the pulses must be re-validated before use.
    pub fn matches_module_type(&self, module_type: ModuleType) -> bool {
        match self {
            Protocol::None | Protocol::Uninitialized => false,
            Protocol::Ppm => module_type == ModuleType::Ppm,
            Protocol::Synchronous(SyncProtocol::Crossfire) => {
                module_type == ModuleType::Crossfire
            }
            Protocol::Frame(FrameProtocol::Pxx) => module_type == ModuleType::Pxx,
            Protocol::Frame(FrameProtocol::Dsm2) => module_type == ModuleType::Dsm2,
            Protocol::Frame(FrameProtocol::Sbus) => module_type == ModuleType::Sbus,
            Protocol::MultiModule => module_type == ModuleType::Multi,
        }
    }
}

/// Configured hardware personality of a module slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
    None,
    Ppm,
    Crossfire,
    Pxx,
    Dsm2,
    Sbus,
    Multi,
}

/// Module operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleMode {
    Normal,
    RangeCheck,
    Bind,
}

/// Live protocol state of one module slot
///
/// Written by configuration and bind logic, read by the scheduler and the
/// interrupt handler.
#[derive(Debug, Clone, Copy)]
pub struct ModuleState {
    pub protocol: Protocol,
    pub mode: ModuleMode,
}

impl ModuleState {
    pub const fn new() -> Self {
        Self {
            protocol: Protocol::Uninitialized,
            mode: ModuleMode::Normal,
        }
    }
}

impl Default for ModuleState {
    fn default() -> Self {
        Self::new()
    }
}

/// PPM framing parameters
#[derive(Debug, Clone, Copy)]
pub struct PpmSettings {
    /// Fixed low/high separator width in 0.5 µs ticks
    pub pre_delay_halfus: u16,
    /// Output line polarity, re-applied at every frame restart
    pub polarity: Polarity,
}

impl Default for PpmSettings {
    fn default() -> Self {
        Self {
            pre_delay_halfus: 600,
            polarity: Polarity::Positive,
        }
    }
}

/// Static configuration of one module slot, resolved once at startup
#[derive(Debug, Clone, Copy)]
pub struct ModuleConfig {
    pub module_type: ModuleType,
    pub ppm: PpmSettings,
}

impl ModuleConfig {
    pub const fn disabled() -> Self {
        Self {
            module_type: ModuleType::None,
            ppm: PpmSettings {
                pre_delay_halfus: 600,
                polarity: Polarity::Positive,
            },
        }
    }
}

/// PPM pulse width buffer in 0.5 µs ticks, always zero-terminated
///
/// The producer fills it under the mixer mutex; the interrupt handler
/// consumes it cursor by cursor. The trailing zero sentinel marks the frame
/// restart point, so a width of zero is never a legal entry.
#[derive(Debug, Clone)]
pub struct PulseBuffer {
    widths: [u16; MAX_PULSE_SLOTS],
    len: usize,
}

impl PulseBuffer {
    /// Empty buffer; reads as an immediate sentinel
    pub const fn new() -> Self {
        Self {
            widths: [0; MAX_PULSE_SLOTS],
            len: 0,
        }
    }

    /// Discard all widths
    pub fn clear(&mut self) {
        self.widths = [0; MAX_PULSE_SLOTS];
        self.len = 0;
    }

    /// Append one channel width
    ///
    /// Zero widths are a producer bug (they would read as a premature
    /// sentinel) and fail loudly in debug builds. Returns `false` when the
    /// buffer is full; one slot is always reserved for the sentinel.
    pub fn push(&mut self, width_halfus: u16) -> bool {
        debug_assert_ne!(width_halfus, 0, "zero width would read as the frame sentinel");
        if width_halfus == 0 || self.len >= MAX_PULSE_SLOTS - 1 {
            return false;
        }
        self.widths[self.len] = width_halfus;
        self.len += 1;
        true
    }

    /// Number of widths before the sentinel
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Width at the interrupt cursor; zero is the sentinel
    ///
    /// A cursor past the storage means the producer broke the termination
    /// contract; reads degrade to the sentinel so the state machine
    /// restarts the frame instead of running off the buffer.
    pub fn width_at(&self, cursor: usize) -> u16 {
        debug_assert!(cursor < MAX_PULSE_SLOTS, "cursor ran past the pulse buffer");
        if cursor < MAX_PULSE_SLOTS {
            self.widths[cursor]
        } else {
            0
        }
    }
}

impl Default for PulseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte buffer for frame-based and synchronous protocols
pub type FrameBuffer = heapless::Vec<u8, MAX_FRAME_BYTES>;

/// Per-module pulse storage, one flavor per protocol family
#[derive(Debug, Clone, Default)]
pub struct ModulePulsesData {
    pub ppm: PulseBuffer,
    pub frame: FrameBuffer,
}

/// Mixer-computed channel outputs, guarded by the mixer shared state
#[derive(Debug, Clone, Copy)]
pub struct ChannelOutputs {
    pub channels: [i16; NUM_CHANNELS],
}

impl ChannelOutputs {
    pub const fn new() -> Self {
        Self {
            channels: [0; NUM_CHANNELS],
        }
    }
}

impl Default for ChannelOutputs {
    fn default() -> Self {
        Self::new()
    }
}

/// Pulse producer: regenerates a module's pulses from current channel state
///
/// Called by the interrupt handler at frame boundaries and by the mixer
/// cycle for synchronous and frame-based protocols. Returns `true` when the
/// produced data is ready to transmit; a synchronous transmit is gated on
/// this.
pub trait PulseProducer {
    fn setup_pulses(&mut self, module: usize, pulses: &mut ModulePulsesData) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_classification() {
        assert!(Protocol::Synchronous(SyncProtocol::Crossfire).is_synchronous());
        assert!(!Protocol::Ppm.is_synchronous());
        assert!(Protocol::Frame(FrameProtocol::Sbus).is_frame_based());
        assert!(Protocol::MultiModule.is_frame_based());
        assert!(!Protocol::Ppm.is_frame_based());
    }

    #[test]
    fn protocol_module_type_agreement() {
        assert!(Protocol::Ppm.matches_module_type(ModuleType::Ppm));
        assert!(!Protocol::Ppm.matches_module_type(ModuleType::Crossfire));
        assert!(Protocol::Synchronous(SyncProtocol::Crossfire)
            .matches_module_type(ModuleType::Crossfire));
        // Unconfigured protocols never agree with any hardware type.
        assert!(!Protocol::Uninitialized.matches_module_type(ModuleType::Ppm));
        assert!(!Protocol::None.matches_module_type(ModuleType::None));
    }

    #[test]
    fn pulse_buffer_always_terminated() {
        let mut buf = PulseBuffer::new();
        assert_eq!(buf.width_at(0), 0);

        assert!(buf.push(2000));
        assert!(buf.push(3000));
        assert_eq!(buf.width_at(0), 2000);
        assert_eq!(buf.width_at(1), 3000);
        assert_eq!(buf.width_at(2), 0);
    }

    #[test]
    fn pulse_buffer_reserves_sentinel_slot() {
        let mut buf = PulseBuffer::new();
        for _ in 0..MAX_PULSE_SLOTS - 1 {
            buf.push(1000);
        }
        assert_eq!(buf.len(), MAX_PULSE_SLOTS - 1);
        assert!(!buf.push(1000));
        assert_eq!(buf.width_at(MAX_PULSE_SLOTS - 1), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "zero width")]
    fn pulse_buffer_rejects_zero_width() {
        let mut buf = PulseBuffer::new();
        buf.push(0);
    }

    #[test]
    fn pulse_buffer_clear_restores_sentinel() {
        let mut buf = PulseBuffer::new();
        buf.push(2000);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.width_at(0), 0);
    }
}
