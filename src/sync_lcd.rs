use ufmt_write::uWrite;

use crate::bus::{Error, LcdBus, SETUP_DELAY_US};
use crate::{
    Command, CursorDirection, CursorShape, CursorState, LayerState, ADDRESSES_PER_LINE,
    GRAPHICS_LAYER_ADDR, GRAPHICS_LAYER_BYTES, HIGH_CHARS8, LINES_PER_FRAME, PIXEL_CHARS8,
    TEXT_LAYER_ADDR, TEXT_LAYER_BYTES, TWO_FRAME_AC_DRIVE, WIDE_CHARS8,
};

/// API to drive the SED1335 over an exclusive bus handle.
///
/// The driver is stateless: nothing about the controller (cursor position,
/// layer modes, power state) is cached on this side, so operations can never
/// fall out of sync with the hardware after an external reset.
pub struct Lcd<'a, B>
where
    B: LcdBus,
{
    bus: &'a mut B,
}

impl<'a, B> Lcd<'a, B>
where
    B: LcdBus,
{
    /// Create a new instance on an exclusively borrowed bus.
    pub fn new(bus: &'a mut B) -> Self {
        Self { bus }
    }

    fn command(&mut self, cmd: Command) -> Result<(), Error> {
        self.bus.write_command(cmd as u8)
    }

    /// Set the start address and height of the first two layers. The
    /// controller expects all four SAD/height pairs; the unused third and
    /// fourth pairs are always sent as zero.
    pub fn set_scroll(
        &mut self,
        text_addr: u16,
        text_height: u8,
        pic_addr: u16,
        pic_height: u8,
    ) -> Result<(), Error> {
        self.command(Command::Scroll)?;
        self.bus.write_data_slice(&[
            text_addr as u8,
            (text_addr >> 8) as u8,
            text_height,
            pic_addr as u8,
            (pic_addr >> 8) as u8,
            pic_height,
            0x00,
            0x00,
            0x00,
            0x00,
        ])
    }

    /// Set the horizontal scroll position in pixels.
    pub fn set_hscroll(&mut self, position: u8) -> Result<(), Error> {
        self.command(Command::HdotScr)?;
        self.bus.write_data(position)
    }

    /// Set the overlay format: a [`crate::ComposeMode`] OR'd with the
    /// `LAYER*_GRAPHICS` / `THREE_LAYER_COM` flags.
    pub fn set_overlay(&mut self, overlay: u8) -> Result<(), Error> {
        self.command(Command::Ovlay)?;
        self.bus.write_data(overlay)
    }

    /// Point the cursor at an address in display memory, low byte first.
    pub fn set_cursor_pointer(&mut self, addr: u16) -> Result<(), Error> {
        self.command(Command::Csrw)?;
        self.bus.write_data(addr as u8)?;
        self.bus.write_data((addr >> 8) as u8)
    }

    /// Write `bytes` verbatim into display memory starting at `addr`.
    pub fn draw_bytes(&mut self, addr: u16, bytes: &[u8]) -> Result<(), Error> {
        self.set_cursor_pointer(addr)?;
        self.command(Command::Mwrite)?;
        self.bus.write_data_slice(bytes)
    }

    /// Draw a string starting at `addr`. Only meaningful for the text layer
    /// with the internal character generator.
    pub fn draw_str(&mut self, addr: u16, s: &str) -> Result<(), Error> {
        self.draw_bytes(addr, s.as_bytes())
    }

    /// Stream bytes at the controller's current cursor, which advances in
    /// the direction set by [`set_cursor_direction`](Self::set_cursor_direction).
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.command(Command::Mwrite)?;
        self.bus.write_data_slice(bytes)
    }

    /// Clear the panel: fill the text layer with space glyphs and the
    /// graphics layer with zeroes. Addresses and counts are fixed by the
    /// panel geometry.
    pub fn clear_screen(&mut self) -> Result<(), Error> {
        self.set_cursor_pointer(TEXT_LAYER_ADDR)?;
        self.command(Command::Mwrite)?;
        self.bus.fill(0x20, TEXT_LAYER_BYTES)?;

        self.set_cursor_pointer(GRAPHICS_LAYER_ADDR)?;
        self.command(Command::Mwrite)?;
        self.bus.fill(0x00, GRAPHICS_LAYER_BYTES)
    }

    /// Configure the controller for this panel: 8x8 characters from the
    /// internal generator, two-frame AC drive, 239 lines per frame and 40
    /// virtual addresses per line. `cr` is characters per display line,
    /// `tcr` total characters per line including blanking.
    pub fn system_set(&mut self, cr: u8, tcr: u8) -> Result<(), Error> {
        self.command(Command::SystemSet)?;
        self.bus.delay_us(SETUP_DELAY_US);
        self.bus.write_data_slice(&[
            PIXEL_CHARS8,
            TWO_FRAME_AC_DRIVE | WIDE_CHARS8,
            HIGH_CHARS8,
            cr,
            tcr,
            LINES_PER_FRAME,
            ADDRESSES_PER_LINE,
            0x00,
        ])
    }

    /// Switch the display on or off and set the cursor and per-layer
    /// visibility, packed as `FP5..FP0 FC1 FC0`.
    pub fn set_display_state(
        &mut self,
        on: bool,
        cursor: CursorState,
        sad1: LayerState,
        sad2: LayerState,
        sad3: LayerState,
    ) -> Result<(), Error> {
        self.command(if on { Command::DispOn } else { Command::DispOff })?;
        self.bus.delay_us(SETUP_DELAY_US);
        self.bus
            .write_data(cursor as u8 | (sad1 as u8) << 2 | (sad2 as u8) << 4 | (sad3 as u8) << 6)
    }

    /// Set the cursor form. Width is 1 to 16 pixels, height 2 to 16.
    pub fn set_cursor_form(
        &mut self,
        width: u8,
        height: u8,
        shape: CursorShape,
    ) -> Result<(), Error> {
        self.command(Command::CsrForm)?;
        self.bus.write_data(width.wrapping_sub(1) & 0x0F)?;
        self.bus
            .write_data(shape as u8 | (height.wrapping_sub(1) & 0x0F))
    }

    /// Set the cursor auto-increment direction. The direction rides in the
    /// low two bits of the opcode; there are no parameter bytes.
    pub fn set_cursor_direction(&mut self, direction: CursorDirection) -> Result<(), Error> {
        self.bus
            .write_command(Command::CsrDir as u8 | direction as u8 & 0x03)
    }

    /// Pulse the controller's reset line, returning it to power-on defaults.
    pub fn hard_reset(&mut self) -> Result<(), Error> {
        self.bus.hard_reset()
    }

    /// Run the fixed initialization script: scroll window, horizontal
    /// scroll, overlay, cursor form and direction, then display on with
    /// layers 1 and 2 steady and layer 3 off.
    ///
    /// This does not reset the controller or send SYSTEM SET; the caller
    /// sequences [`hard_reset`](Self::hard_reset), then
    /// [`system_set`](Self::system_set), then `init`.
    pub fn init(&mut self) -> Result<(), Error> {
        self.set_scroll(
            TEXT_LAYER_ADDR,
            LINES_PER_FRAME,
            GRAPHICS_LAYER_ADDR,
            LINES_PER_FRAME,
        )?;
        self.set_hscroll(0x00)?;
        self.set_overlay(0x00)?;
        // Display off while the cursor is shaped, all layers steady.
        self.set_display_state(
            false,
            CursorState::Blink2Hz,
            LayerState::Steady,
            LayerState::Steady,
            LayerState::Steady,
        )?;
        self.set_cursor_form(5, 7, CursorShape::Block)?;
        self.set_cursor_direction(CursorDirection::Right)?;
        self.set_display_state(
            true,
            CursorState::Blink2Hz,
            LayerState::Steady,
            LayerState::Steady,
            LayerState::Off,
        )
    }
}

impl<'a, B> uWrite for Lcd<'a, B>
where
    B: LcdBus,
{
    type Error = Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.write_bytes(s.as_bytes())
    }
}
