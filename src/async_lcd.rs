//! Async twin of [`crate::sync_lcd`]. Pin writes stay synchronous (they are
//! register pokes); only the settle, setup and reset delays await an
//! [`embedded_hal_async::delay::DelayNs`] provider.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

use crate::bus::{
    Error, OutputPort, COMMAND_REGISTER, DATA_REGISTER, RESET_HOLD_US, SETUP_DELAY_US,
    STROBE_SETTLE_US,
};
use crate::{
    Command, CursorDirection, CursorShape, CursorState, LayerState, ADDRESSES_PER_LINE,
    GRAPHICS_LAYER_ADDR, GRAPHICS_LAYER_BYTES, HIGH_CHARS8, LINES_PER_FRAME, PIXEL_CHARS8,
    TEXT_LAYER_ADDR, TEXT_LAYER_BYTES, TWO_FRAME_AC_DRIVE, WIDE_CHARS8,
};

/// Async counterpart of [`crate::bus::LcdBus`].
#[allow(async_fn_in_trait)]
pub trait AsyncLcdBus {
    /// Frame `cmd` as a command-register write.
    async fn write_command(&mut self, cmd: u8) -> Result<(), Error>;

    /// Frame `byte` as a data-register write.
    async fn write_data(&mut self, byte: u8) -> Result<(), Error>;

    /// Yield to the delay provider.
    async fn delay_us(&mut self, us: u32);

    /// Pulse the controller's reset line with the bus idled.
    async fn hard_reset(&mut self) -> Result<(), Error>;
}

/// [`crate::bus::ParallelBus`] with an async delay provider.
pub struct ParallelBus<PORT, LE, WR, RD, RST, D> {
    port: PORT,
    le: LE,
    wr: WR,
    rd: RD,
    rst: RST,
    delay: D,
}

impl<PORT, LE, WR, RD, RST, D> ParallelBus<PORT, LE, WR, RD, RST, D>
where
    PORT: OutputPort,
    LE: OutputPin,
    WR: OutputPin,
    RD: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    pub fn new(port: PORT, le: LE, wr: WR, rd: RD, rst: RST, delay: D) -> Self {
        Self {
            port,
            le,
            wr,
            rd,
            rst,
            delay,
        }
    }

    /// Consume the bus and hand back the port, pins and delay provider.
    pub fn release(self) -> (PORT, LE, WR, RD, RST, D) {
        (self.port, self.le, self.wr, self.rd, self.rst, self.delay)
    }

    fn latch_register(&mut self, select: u8) -> Result<(), Error> {
        self.le.set_high().map_err(|_| Error::LatchEnable)?;
        self.port.write_byte(select)?;
        self.le.set_low().map_err(|_| Error::LatchEnable)
    }

    async fn strobe_out(&mut self, byte: u8) -> Result<(), Error> {
        self.port.write_byte(byte)?;
        self.wr.set_low().map_err(|_| Error::WriteStrobe)?;
        self.delay.delay_us(STROBE_SETTLE_US).await;
        self.wr.set_high().map_err(|_| Error::WriteStrobe)?;
        self.delay.delay_us(STROBE_SETTLE_US).await;
        Ok(())
    }
}

impl<PORT, LE, WR, RD, RST, D> AsyncLcdBus for ParallelBus<PORT, LE, WR, RD, RST, D>
where
    PORT: OutputPort,
    LE: OutputPin,
    WR: OutputPin,
    RD: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    async fn write_command(&mut self, cmd: u8) -> Result<(), Error> {
        self.latch_register(COMMAND_REGISTER)?;
        self.strobe_out(cmd).await
    }

    async fn write_data(&mut self, byte: u8) -> Result<(), Error> {
        self.latch_register(DATA_REGISTER)?;
        self.strobe_out(byte).await
    }

    async fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us).await;
    }

    async fn hard_reset(&mut self) -> Result<(), Error> {
        self.le.set_high().map_err(|_| Error::LatchEnable)?;
        self.rd.set_high().map_err(|_| Error::ReadStrobe)?;
        self.wr.set_high().map_err(|_| Error::WriteStrobe)?;

        self.rst.set_low().map_err(|_| Error::Reset)?;
        self.delay.delay_us(RESET_HOLD_US).await;
        self.rst.set_high().map_err(|_| Error::Reset)?;
        self.delay.delay_us(RESET_HOLD_US).await;
        Ok(())
    }
}

/// API to drive the SED1335 over an exclusive async bus handle. Stateless,
/// like the blocking driver.
pub struct Lcd<'a, B>
where
    B: AsyncLcdBus,
{
    bus: &'a mut B,
}

impl<'a, B> Lcd<'a, B>
where
    B: AsyncLcdBus,
{
    /// Create a new instance on an exclusively borrowed bus.
    pub fn new(bus: &'a mut B) -> Self {
        Self { bus }
    }

    async fn command(&mut self, cmd: Command) -> Result<(), Error> {
        self.bus.write_command(cmd as u8).await
    }

    async fn write_slice(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &b in bytes {
            self.bus.write_data(b).await?;
        }
        Ok(())
    }

    /// Set the start address and height of the first two layers.
    pub async fn set_scroll(
        &mut self,
        text_addr: u16,
        text_height: u8,
        pic_addr: u16,
        pic_height: u8,
    ) -> Result<(), Error> {
        self.command(Command::Scroll).await?;
        self.write_slice(&[
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
        .await
    }

    /// Set the horizontal scroll position in pixels.
    pub async fn set_hscroll(&mut self, position: u8) -> Result<(), Error> {
        self.command(Command::HdotScr).await?;
        self.bus.write_data(position).await
    }

    /// Set the overlay format.
    pub async fn set_overlay(&mut self, overlay: u8) -> Result<(), Error> {
        self.command(Command::Ovlay).await?;
        self.bus.write_data(overlay).await
    }

    /// Point the cursor at an address in display memory, low byte first.
    pub async fn set_cursor_pointer(&mut self, addr: u16) -> Result<(), Error> {
        self.command(Command::Csrw).await?;
        self.bus.write_data(addr as u8).await?;
        self.bus.write_data((addr >> 8) as u8).await
    }

    /// Write `bytes` verbatim into display memory starting at `addr`.
    pub async fn draw_bytes(&mut self, addr: u16, bytes: &[u8]) -> Result<(), Error> {
        self.set_cursor_pointer(addr).await?;
        self.command(Command::Mwrite).await?;
        self.write_slice(bytes).await
    }

    /// Draw a string starting at `addr`.
    pub async fn draw_str(&mut self, addr: u16, s: &str) -> Result<(), Error> {
        self.draw_bytes(addr, s.as_bytes()).await
    }

    /// Stream bytes at the controller's current cursor.
    pub async fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.command(Command::Mwrite).await?;
        self.write_slice(bytes).await
    }

    /// Clear both layers with their fixed fill values and counts.
    pub async fn clear_screen(&mut self) -> Result<(), Error> {
        self.set_cursor_pointer(TEXT_LAYER_ADDR).await?;
        self.command(Command::Mwrite).await?;
        for _ in 0..TEXT_LAYER_BYTES {
            self.bus.write_data(0x20).await?;
        }

        self.set_cursor_pointer(GRAPHICS_LAYER_ADDR).await?;
        self.command(Command::Mwrite).await?;
        for _ in 0..GRAPHICS_LAYER_BYTES {
            self.bus.write_data(0x00).await?;
        }
        Ok(())
    }

    /// Configure the controller for this panel geometry.
    pub async fn system_set(&mut self, cr: u8, tcr: u8) -> Result<(), Error> {
        self.command(Command::SystemSet).await?;
        self.bus.delay_us(SETUP_DELAY_US).await;
        self.write_slice(&[
            PIXEL_CHARS8,
            TWO_FRAME_AC_DRIVE | WIDE_CHARS8,
            HIGH_CHARS8,
            cr,
            tcr,
            LINES_PER_FRAME,
            ADDRESSES_PER_LINE,
            0x00,
        ])
        .await
    }

    /// Switch the display on or off and set cursor and layer visibility.
    pub async fn set_display_state(
        &mut self,
        on: bool,
        cursor: CursorState,
        sad1: LayerState,
        sad2: LayerState,
        sad3: LayerState,
    ) -> Result<(), Error> {
        self.command(if on { Command::DispOn } else { Command::DispOff })
            .await?;
        self.bus.delay_us(SETUP_DELAY_US).await;
        self.bus
            .write_data(cursor as u8 | (sad1 as u8) << 2 | (sad2 as u8) << 4 | (sad3 as u8) << 6)
            .await
    }

    /// Set the cursor form. Width is 1 to 16 pixels, height 2 to 16.
    pub async fn set_cursor_form(
        &mut self,
        width: u8,
        height: u8,
        shape: CursorShape,
    ) -> Result<(), Error> {
        self.command(Command::CsrForm).await?;
        self.bus.write_data(width.wrapping_sub(1) & 0x0F).await?;
        self.bus
            .write_data(shape as u8 | (height.wrapping_sub(1) & 0x0F))
            .await
    }

    /// Set the cursor auto-increment direction.
    pub async fn set_cursor_direction(&mut self, direction: CursorDirection) -> Result<(), Error> {
        self.bus
            .write_command(Command::CsrDir as u8 | direction as u8 & 0x03)
            .await
    }

    /// Pulse the controller's reset line.
    pub async fn hard_reset(&mut self) -> Result<(), Error> {
        self.bus.hard_reset().await
    }

    /// Run the fixed initialization script. Does not reset the controller
    /// or send SYSTEM SET; the caller sequences reset, system_set, init.
    pub async fn init(&mut self) -> Result<(), Error> {
        self.set_scroll(
            TEXT_LAYER_ADDR,
            LINES_PER_FRAME,
            GRAPHICS_LAYER_ADDR,
            LINES_PER_FRAME,
        )
        .await?;
        self.set_hscroll(0x00).await?;
        self.set_overlay(0x00).await?;
        self.set_display_state(
            false,
            CursorState::Blink2Hz,
            LayerState::Steady,
            LayerState::Steady,
            LayerState::Steady,
        )
        .await?;
        self.set_cursor_form(5, 7, CursorShape::Block).await?;
        self.set_cursor_direction(CursorDirection::Right).await?;
        self.set_display_state(
            true,
            CursorState::Blink2Hz,
            LayerState::Steady,
            LayerState::Steady,
            LayerState::Off,
        )
        .await
    }
}
