#![no_std]
//! Driver for graphics LCD modules driven by an Epson SED1335 (S1D13305)
//! controller wired to a write-only 8-bit parallel bus. The bus is bit-banged
//! through [`embedded_hal::digital::OutputPin`] control lines plus one
//! byte-wide bank of data lines, with a latch-enable line selecting the
//! command or data register and a write strobe committing each byte.
//!
//! The driver keeps no software copy of controller state: every operation is
//! encoded from its arguments alone and the controller's memory, cursor and
//! blink state live only in the hardware. A single owning [`bus::ParallelBus`]
//! handle serializes all bus traffic.
//!
//! Usage:
//! ```ignore
//! use lcd_sed1335_parallel::{bus::{ParallelBus, PortPins}, sync_lcd::Lcd};
//!
//! // Pins come from your board HAL; d0..d7 share the bus with the latch.
//! let port = PortPins::new(d0, d1, d2, d3, d4, d5, d6, d7);
//! let mut bus = ParallelBus::new(port, le, wr, rd, rst, delay);
//!
//! let mut lcd = Lcd::new(&mut bus);
//! lcd.hard_reset()?;
//! lcd.system_set(39, 57)?; // 40 chars per line, 57 total with blanking
//! lcd.init()?;
//! lcd.draw_str(0x0000, "Hello")?;
//! ```
//!
//! The `async` feature enables [`async_lcd::Lcd`], which is identical except
//! that the settle and setup delays await an async delay provider.

pub mod bus;
pub mod sync_lcd;

#[cfg(feature = "async")]
pub mod async_lcd;

/// SED1335 command opcodes.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Configure panel geometry and character generator.
    SystemSet = 0x40,
    /// Stream bytes into display memory at the cursor.
    Mwrite = 0x42,
    /// Set layer start addresses and heights.
    Scroll = 0x44,
    /// Set the cursor address.
    Csrw = 0x46,
    /// Set the cursor increment direction (low two bits of the opcode).
    CsrDir = 0x4C,
    /// Turn the display off, with a layer/cursor status parameter.
    DispOff = 0x58,
    /// Turn the display on, with a layer/cursor status parameter.
    DispOn = 0x59,
    /// Horizontal scroll position in pixels.
    HdotScr = 0x5A,
    /// Layer overlay / composition format.
    Ovlay = 0x5B,
    /// Cursor width, height and shape.
    CsrForm = 0x5D,
}

// Flags for the SYSTEM SET P1 parameter.
pub const EXTERNAL_CG_ROM: u8 = 0x01;
pub const D6_CORRECTION: u8 = 0x02;
pub const DUAL_PANEL: u8 = 0x08;
pub const PIXEL_CHARS8: u8 = 0x10;
pub const PIXEL_CHARS16: u8 = 0x14;
pub const INVERSE_COMPENSATION: u8 = 0x20;

// Flags for the SYSTEM SET P2 parameter.
pub const WIDE_CHARS8: u8 = 0x07;
pub const TWO_FRAME_AC_DRIVE: u8 = 0x80;

// Flags for the SYSTEM SET P3 parameter.
pub const HIGH_CHARS8: u8 = 0x07;

/// How the overlay composes the first two layers (OVLAY bits 0-1).
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ComposeMode {
    Or = 0x00,
    Xor = 0x01,
    And = 0x02,
    PriorityOr = 0x03,
}

// Remaining OVLAY flags, OR'd with a `ComposeMode`.
pub const LAYER1_GRAPHICS: u8 = 0x04;
pub const LAYER3_GRAPHICS: u8 = 0x08;
pub const THREE_LAYER_COM: u8 = 0x10;

/// Cursor visibility, bits 0-1 of the DISP ON/OFF status byte.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CursorState {
    Off = 0x00,
    Steady = 0x01,
    Blink2Hz = 0x02,
    Blink1Hz = 0x03,
}

/// Visibility of one display layer, two bits per layer in the status byte.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LayerState {
    Off = 0x00,
    Steady = 0x01,
    Blink2Hz = 0x02,
    Blink16Hz = 0x03,
}

/// Cursor shape, OR'd into the second CSRFORM parameter.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CursorShape {
    Underscore = 0x00,
    Block = 0x80,
}

/// Cursor auto-increment direction, encoded in the CSRDIR opcode itself.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CursorDirection {
    Right = 0x00,
    Left = 0x01,
    Up = 0x02,
    Down = 0x03,
}

// Fixed geometry of the target panel: 40 characters x 30 lines of text at
// SAD 0x0000, with the graphics layer following at SAD 0x04B0. The clear
// fill counts follow from that geometry and must stay exact.
pub const TEXT_LAYER_ADDR: u16 = 0x0000;
pub const GRAPHICS_LAYER_ADDR: u16 = 0x04B0;
pub const TEXT_LAYER_BYTES: usize = 1200;
pub const GRAPHICS_LAYER_BYTES: usize = 9600;

/// L/F system-set parameter: 239 lines per frame.
pub const LINES_PER_FRAME: u8 = 0xEF;
/// APL system-set parameter: 40 virtual addresses per line.
pub const ADDRESSES_PER_LINE: u8 = 0x28;
