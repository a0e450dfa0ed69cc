//! Write-only parallel bus transport for the SED1335.
//!
//! The controller shares one byte-wide bank of data lines between the
//! register-select latch and the actual command/data byte: the latch-enable
//! line is raised while the select byte (0x01 command, 0x00 data) sits on the
//! bank, lowered to latch it, and the payload byte is then committed with a
//! low pulse on the write strobe. Settling delays bracket every strobe edge.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// Transport failure, naming the control line that refused the write.
///
/// A failed write aborts the operation in flight; it is never retried here,
/// since re-sending mid-command would put a parameter byte where the
/// controller expects an opcode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The 8-line data bank rejected a byte write.
    BusWrite,
    /// The latch-enable / command-select line failed.
    LatchEnable,
    /// The write-strobe line failed.
    WriteStrobe,
    /// The read-strobe line failed (only driven while idling for reset).
    ReadStrobe,
    /// The reset line failed.
    Reset,
}

/// Select byte latched before a command write.
pub const COMMAND_REGISTER: u8 = 0x01;
/// Select byte latched before a data write.
pub const DATA_REGISTER: u8 = 0x00;

/// Settling time around each write-strobe edge.
pub const STROBE_SETTLE_US: u32 = 1;
/// Pause between an opcode and its parameters for the slow commands
/// (SYSTEM SET, DISP ON/OFF).
pub const SETUP_DELAY_US: u32 = 5;
/// Hold time on either side of the reset edge.
pub const RESET_HOLD_US: u32 = 1000;

/// A byte-wide bank of output lines written in one call, bit 0 first.
///
/// Boards with a real GPIO port register can implement this directly; others
/// use [`PortPins`] over eight discrete pins.
pub trait OutputPort {
    fn write_byte(&mut self, word: u8) -> Result<(), Error>;
}

/// [`OutputPort`] over eight discrete [`OutputPin`]s, `d0` = bit 0.
pub struct PortPins<D0, D1, D2, D3, D4, D5, D6, D7> {
    d0: D0,
    d1: D1,
    d2: D2,
    d3: D3,
    d4: D4,
    d5: D5,
    d6: D6,
    d7: D7,
}

impl<D0, D1, D2, D3, D4, D5, D6, D7> PortPins<D0, D1, D2, D3, D4, D5, D6, D7>
where
    D0: OutputPin,
    D1: OutputPin,
    D2: OutputPin,
    D3: OutputPin,
    D4: OutputPin,
    D5: OutputPin,
    D6: OutputPin,
    D7: OutputPin,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(d0: D0, d1: D1, d2: D2, d3: D3, d4: D4, d5: D5, d6: D6, d7: D7) -> Self {
        Self {
            d0,
            d1,
            d2,
            d3,
            d4,
            d5,
            d6,
            d7,
        }
    }
}

impl<D0, D1, D2, D3, D4, D5, D6, D7> OutputPort for PortPins<D0, D1, D2, D3, D4, D5, D6, D7>
where
    D0: OutputPin,
    D1: OutputPin,
    D2: OutputPin,
    D3: OutputPin,
    D4: OutputPin,
    D5: OutputPin,
    D6: OutputPin,
    D7: OutputPin,
{
    fn write_byte(&mut self, word: u8) -> Result<(), Error> {
        fn bit<P: OutputPin>(pin: &mut P, set: bool) -> Result<(), Error> {
            pin.set_state(set.into()).map_err(|_| Error::BusWrite)
        }
        bit(&mut self.d0, word & 0x01 != 0)?;
        bit(&mut self.d1, word & 0x02 != 0)?;
        bit(&mut self.d2, word & 0x04 != 0)?;
        bit(&mut self.d3, word & 0x08 != 0)?;
        bit(&mut self.d4, word & 0x10 != 0)?;
        bit(&mut self.d5, word & 0x20 != 0)?;
        bit(&mut self.d6, word & 0x40 != 0)?;
        bit(&mut self.d7, word & 0x80 != 0)
    }
}

/// Trait implemented by bus transports the driver can run on.
///
/// The two write methods commit exactly one framed byte and block until the
/// full strobe cycle is done; there are no partial writes. Implementations
/// are exclusive handles, so holding one `&mut` serializes all traffic.
pub trait LcdBus {
    /// Frame `cmd` as a command-register write.
    fn write_command(&mut self, cmd: u8) -> Result<(), Error>;

    /// Frame `byte` as a data-register write.
    fn write_data(&mut self, byte: u8) -> Result<(), Error>;

    /// Write a slice of parameter bytes in order.
    fn write_data_slice(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &b in bytes {
            self.write_data(b)?;
        }
        Ok(())
    }

    /// Write `count` copies of `byte`.
    fn fill(&mut self, byte: u8, count: usize) -> Result<(), Error> {
        for _ in 0..count {
            self.write_data(byte)?;
        }
        Ok(())
    }

    /// Busy-wait on the bus's delay provider.
    fn delay_us(&mut self, us: u32);

    /// Pulse the controller's reset line with the bus idled.
    fn hard_reset(&mut self) -> Result<(), Error>;
}

/// The bit-banged bus: one data bank, latch-enable, write strobe, read
/// strobe, reset line and a delay provider. Owning this struct is owning the
/// bus.
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

    /// Latch the register-select byte into the bus multiplexer.
    fn latch_register(&mut self, select: u8) -> Result<(), Error> {
        self.le.set_high().map_err(|_| Error::LatchEnable)?;
        self.port.write_byte(select)?;
        self.le.set_low().map_err(|_| Error::LatchEnable)
    }

    /// Put `byte` on the bank and commit it with a write-strobe pulse.
    fn strobe_out(&mut self, byte: u8) -> Result<(), Error> {
        self.port.write_byte(byte)?;
        self.wr.set_low().map_err(|_| Error::WriteStrobe)?;
        self.delay.delay_us(STROBE_SETTLE_US);
        self.wr.set_high().map_err(|_| Error::WriteStrobe)?;
        self.delay.delay_us(STROBE_SETTLE_US);
        Ok(())
    }
}

impl<PORT, LE, WR, RD, RST, D> LcdBus for ParallelBus<PORT, LE, WR, RD, RST, D>
where
    PORT: OutputPort,
    LE: OutputPin,
    WR: OutputPin,
    RD: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    fn write_command(&mut self, cmd: u8) -> Result<(), Error> {
        self.latch_register(COMMAND_REGISTER)?;
        self.strobe_out(cmd)
    }

    fn write_data(&mut self, byte: u8) -> Result<(), Error> {
        self.latch_register(DATA_REGISTER)?;
        self.strobe_out(byte)
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn hard_reset(&mut self) -> Result<(), Error> {
        // Idle the bus before touching reset: select latched, both strobes
        // released.
        self.le.set_high().map_err(|_| Error::LatchEnable)?;
        self.rd.set_high().map_err(|_| Error::ReadStrobe)?;
        self.wr.set_high().map_err(|_| Error::WriteStrobe)?;

        self.rst.set_low().map_err(|_| Error::Reset)?;
        self.delay.delay_us(RESET_HOLD_US);
        self.rst.set_high().map_err(|_| Error::Reset)?;
        self.delay.delay_us(RESET_HOLD_US);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::RefCell;
    use core::convert::Infallible;
    use std::rc::Rc;
    use std::vec::Vec;

    use embedded_hal::digital::ErrorType;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    /// One observable edge on the bus, in global order.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    enum Event {
        Le(bool),
        Wr(bool),
        Rd(bool),
        Rst(bool),
        Port(u8),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct LogPin {
        log: Log,
        tag: fn(bool) -> Event,
    }

    impl ErrorType for LogPin {
        type Error = Infallible;
    }

    impl OutputPin for LogPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            let e = (self.tag)(false);
            self.log.borrow_mut().push(e);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            let e = (self.tag)(true);
            self.log.borrow_mut().push(e);
            Ok(())
        }
    }

    struct LogPort {
        log: Log,
    }

    impl OutputPort for LogPort {
        fn write_byte(&mut self, word: u8) -> Result<(), Error> {
            self.log.borrow_mut().push(Event::Port(word));
            Ok(())
        }
    }

    fn logged_bus(
        log: &Log,
    ) -> ParallelBus<LogPort, LogPin, LogPin, LogPin, LogPin, NoopDelay> {
        let pin = |tag| LogPin {
            log: Rc::clone(log),
            tag,
        };
        ParallelBus::new(
            LogPort {
                log: Rc::clone(log),
            },
            pin(Event::Le),
            pin(Event::Wr),
            pin(Event::Rd),
            pin(Event::Rst),
            NoopDelay::new(),
        )
    }

    #[test]
    fn command_write_frames_byte_with_command_select() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = logged_bus(&log);

        bus.write_command(0xAB).unwrap();

        assert_eq!(
            log.borrow().as_slice(),
            &[
                Event::Le(true),
                Event::Port(COMMAND_REGISTER),
                Event::Le(false),
                Event::Port(0xAB),
                Event::Wr(false),
                Event::Wr(true),
            ]
        );
    }

    #[test]
    fn data_write_frames_byte_with_data_select() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = logged_bus(&log);

        bus.write_data(0x5A).unwrap();

        assert_eq!(
            log.borrow().as_slice(),
            &[
                Event::Le(true),
                Event::Port(DATA_REGISTER),
                Event::Le(false),
                Event::Port(0x5A),
                Event::Wr(false),
                Event::Wr(true),
            ]
        );
    }

    #[test]
    fn hard_reset_idles_bus_then_pulses_reset() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = logged_bus(&log);

        bus.hard_reset().unwrap();

        assert_eq!(
            log.borrow().as_slice(),
            &[
                Event::Le(true),
                Event::Rd(true),
                Event::Wr(true),
                Event::Rst(false),
                Event::Rst(true),
            ]
        );
    }

    #[test]
    fn port_pins_spread_bits_low_to_high() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        // Reuse the event log, tagging each data pin by its bit weight.
        struct BitPin {
            log: Log,
            weight: u8,
        }
        impl ErrorType for BitPin {
            type Error = Infallible;
        }
        impl OutputPin for BitPin {
            fn set_low(&mut self) -> Result<(), Infallible> {
                self.log.borrow_mut().push(Event::Port(0));
                Ok(())
            }
            fn set_high(&mut self) -> Result<(), Infallible> {
                let w = self.weight;
                self.log.borrow_mut().push(Event::Port(w));
                Ok(())
            }
        }
        let bit = |weight| BitPin {
            log: Rc::clone(&log),
            weight,
        };
        let mut port = PortPins::new(
            bit(0x01),
            bit(0x02),
            bit(0x04),
            bit(0x08),
            bit(0x10),
            bit(0x20),
            bit(0x40),
            bit(0x80),
        );

        port.write_byte(0xA5).unwrap();

        let written: u8 = log
            .borrow()
            .iter()
            .map(|e| match e {
                Event::Port(w) => *w,
                _ => 0,
            })
            .sum();
        assert_eq!(written, 0xA5);
        assert_eq!(log.borrow().len(), 8);
    }

    #[test]
    fn control_pin_transitions_match_mock_expectations() {
        // Same discipline checked per-pin through the shared eh1 mocks.
        let le = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);
        let wr = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let rd = PinMock::new(&[]);
        let rst = PinMock::new(&[]);

        struct NullPort;
        impl OutputPort for NullPort {
            fn write_byte(&mut self, _word: u8) -> Result<(), Error> {
                Ok(())
            }
        }

        let mut bus = ParallelBus::new(NullPort, le, wr, rd, rst, NoopDelay::new());
        bus.write_command(0x40).unwrap();

        let (_, mut le, mut wr, mut rd, mut rst, _) = bus.release();
        le.done();
        wr.done();
        rd.done();
        rst.done();
    }

    #[test]
    fn fill_repeats_exactly_count_bytes() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = logged_bus(&log);

        bus.fill(0x20, 3).unwrap();

        let data_bytes: Vec<u8> = log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Port(b) if *b != DATA_REGISTER => Some(*b),
                _ => None,
            })
            .collect();
        assert_eq!(data_bytes, [0x20, 0x20, 0x20]);
    }
}
