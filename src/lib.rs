//! DS1302 real time clock-calendar platform agnostic driver
//!
//! # About
//!
//!The DS1302 trickle-charge timekeeping chip contains a real-time clock/calendar and 31 bytes of static RAM. It
//!communicates with a microprocessor over a simple three-wire serial interface (chip-enable, clock and one
//!bidirectional data line). The real-time clock/calendar provides seconds, minutes, hours, day, date, month, and
//!year information. The end of the month date is automatically adjusted for months with fewer than 31 days,
//!including corrections for leap year. The chip-enable and clock lines are plain [`embedded-hal`] output pins;
//!the shared data line is abstracted by the [`IoPin`] trait so the driver works against any GPIO backend,
//!including a simulated one on the host.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal
//!
//!Datasheet: [DS1302](https://datasheets.maximintegrated.com/en/ds/DS1302.pdf)
//!
//! ## Driver features:
//! - Reading/setting the whole clock/calendar in one burst transaction
//! - Clock-halt and write-protect control
//! - Programmable trickle charger configuration
//! - 31 x 8 battery-backed general-purpose RAM, single byte and burst
//!
//! Time is always returned in 24-hour format; a chip left in 12-hour mode by
//! other firmware is decoded transparently, and every write puts the hour
//! register back into 24-hour mode.

#![no_std]

#[cfg(all(feature = "rp2040", feature = "rp2350"))]
compile_error!("You must not enable both the `rp2040` and `rp2350` Cargo features.");

mod bcd;
mod io;
mod registers;

use crate::bcd::{bcd_to_decimal, decimal_to_bcd, hour_from_register};
use crate::registers::{
    TrickleCharger, CLOCK_BURST_READ, CLOCK_BURST_WRITE, CLOCK_HALT, RAM_BURST_READ,
    RAM_BURST_WRITE, RAM_REGISTER_OFFSET, RAM_SIZE, TRICKLE_CHARGER_REG, WRITE_PROTECT,
};

pub use crate::io::{Direction, IoPin};
pub use crate::registers::{Ds, Register, Rs};

#[cfg(any(feature = "rp2040", feature = "rp2350"))]
pub use crate::io::SioIoPin;

use embedded_hal::digital::OutputPin;
use fugit::ExtU32;

/// DS1302 error
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ds1302Error {
    ChipSelectError,
    ClockError,
    ReadError,
    WriteError,
}

/// For timing `ds1302-bitbang` uses the [fugit](https://lib.rs/crates/fugit) crate which only provides `Duration` and `Instant` types.
/// It does not provide any clock or timer traits.
/// Therefore `ds1302-bitbang` has its own `Delay` trait that provides all timing capabilities that are needed for the library.
/// User must implement this trait for the timer by itself.
pub trait Delay<const TIMER_HZ: u32> {
    /// An error that might happen during waiting
    type Error;

    /// Return current time `Instant`
    fn now(&mut self) -> fugit::TimerInstantU32<TIMER_HZ>;

    /// Start countdown with a `duration`
    fn start(&mut self, duration: fugit::TimerDurationU32<TIMER_HZ>) -> Result<(), Self::Error>;

    /// Wait until countdown `duration` has expired.
    /// Must return `nb::Error::WouldBlock` if countdown `duration` is not yet over.
    /// Must return `OK(())` as soon as countdown `duration` has expired.
    fn wait(&mut self) -> nb::Result<(), Self::Error>;
}

/// Day of the week as stored by the chip, 1 through 7.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Weekday {
    Sunday = 1,
    Monday = 2,
    Tuesday = 3,
    Wednesday = 4,
    Thursday = 5,
    Friday = 6,
    Saturday = 7,
}

impl Weekday {
    /// An uninitialized chip can hold any value in the day register;
    /// everything outside 1..=7 decodes to Sunday.
    fn from_register(value: u8) -> Self {
        match value {
            2 => Weekday::Monday,
            3 => Weekday::Tuesday,
            4 => Weekday::Wednesday,
            5 => Weekday::Thursday,
            6 => Weekday::Friday,
            7 => Weekday::Saturday,
            _ => Weekday::Sunday,
        }
    }
}

/// A full clock/calendar snapshot.
///
/// Field ranges are not validated by the driver: the chip has no error
/// channel and a noisy or uninitialized register file decodes to
/// out-of-range values. Callers needing validation must range-check after
/// [`DS1302::get_time`] and before [`DS1302::set_time`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// Full year, 2000..=2099. The chip stores an offset from 2000 and has
    /// no century bit.
    pub year: u16,
    /// 1..=12
    pub month: u8,
    /// Day of the month, 1..=31
    pub day: u8,
    /// 0..=23, always 24-hour form
    pub hour: u8,
    /// 0..=59
    pub minute: u8,
    /// 0..=59
    pub second: u8,
    pub weekday: Weekday,
}

///DS1302 RTCC driver.
///
///Owns the three bus lines for its whole lifetime: CE and SCLK as plain
///outputs, the data line through [`IoPin`] because the protocol switches it
///between output (command/write phases) and input (read phases). All
///operations are synchronous and blocking; one register transfer or burst is
///a single CE session and the driver never leaves a session open between
///calls. The chip bus has no arbitration, so a multi-threaded host must
///serialize access to the whole driver externally.
pub struct DS1302<CE, IO, CLK, D, const TIMER_HZ: u32> {
    ce: CE,
    io: IO,
    sclk: CLK,
    delay: D,
    dir: Direction,
}

impl<CE, IO, CLK, D, const TIMER_HZ: u32> DS1302<CE, IO, CLK, D, TIMER_HZ>
where
    CE: OutputPin,
    IO: IoPin,
    CLK: OutputPin,
    D: Delay<TIMER_HZ>,
{
    /// Create the driver from the three bus lines and a timer.
    ///
    /// Does not touch the chip: the oscillator and write-protect state are
    /// left exactly as found, so a battery-backed clock keeps running
    /// across firmware restarts.
    pub fn new(ce: CE, io: IO, sclk: CLK, delay: D) -> Self {
        DS1302 {
            ce,
            io,
            sclk,
            delay,
            // Unknown on entry, the first command byte forces a real switch.
            dir: Direction::Input,
        }
    }

    /// Release the bus lines and the timer.
    pub fn free(self) -> (CE, IO, CLK, D) {
        (self.ce, self.io, self.sclk, self.delay)
    }

    fn hold(&mut self, duration: fugit::TimerDurationU32<TIMER_HZ>) {
        self.delay.start(duration).ok();
        nb::block!(self.delay.wait()).ok();
    }

    /// All direction changes of the data line go through here, so the
    /// line is reconfigured only on an actual change.
    fn set_dir(&mut self, dir: Direction) -> Result<(), Ds1302Error> {
        if self.dir != dir {
            self.io.set_direction(dir).map_err(|_| match dir {
                Direction::Output => Ds1302Error::WriteError,
                Direction::Input => Ds1302Error::ReadError,
            })?;
            self.dir = dir;
        }
        Ok(())
    }

    fn open_session(&mut self) -> Result<(), Ds1302Error> {
        self.sclk.set_low().map_err(|_| Ds1302Error::ClockError)?;
        self.ce
            .set_high()
            .map_err(|_| Ds1302Error::ChipSelectError)?;
        self.hold(4.micros()); // tCC = 4us for 2V
        Ok(())
    }

    fn close_session(&mut self) -> Result<(), Ds1302Error> {
        self.hold(300.nanos()); // tCCH = 240ns for 2V
        self.ce.set_low().map_err(|_| Ds1302Error::ChipSelectError)?;
        self.hold(4.micros()); // tCWH = 4us for 2V
        Ok(())
    }

    /// Shift one byte out, LSB first.
    ///
    /// With `read_follows` set the data line is released to the chip before
    /// the final falling clock edge: the chip starts driving its first
    /// output bit on that edge, and switching any later would corrupt it.
    fn write_byte(&mut self, byte: u8, read_follows: bool) -> Result<(), Ds1302Error> {
        self.set_dir(Direction::Output)?;
        for i in 0..8 {
            self.io
                .write((byte >> i) & 1 == 1)
                .map_err(|_| Ds1302Error::WriteError)?;
            self.hold(350.nanos()); // tDC = 200ns for 2V
            self.sclk.set_high().map_err(|_| Ds1302Error::ClockError)?;
            self.hold(2000.nanos()); // tCH = 1000ns for 2V
            if read_follows && i == 7 {
                self.set_dir(Direction::Input)?;
            }
            self.sclk.set_low().map_err(|_| Ds1302Error::ClockError)?;
            self.hold(1700.nanos()); // tCL = 1000ns for 2V
        }
        Ok(())
    }

    /// Shift one byte in, LSB first. The chip updates the line on falling
    /// edges, so each bit is sampled during the following high phase.
    fn read_byte(&mut self) -> Result<u8, Ds1302Error> {
        self.set_dir(Direction::Input)?;
        let mut data = 0;
        for i in 0..8 {
            self.hold(300.nanos()); // tCCZ = 280ns for 2V
            self.sclk.set_high().map_err(|_| Ds1302Error::ClockError)?;
            if self.io.read().map_err(|_| Ds1302Error::ReadError)? {
                data |= 1 << i;
            }
            self.hold(2000.nanos()); // tCH = 1000ns for 2V
            self.sclk.set_low().map_err(|_| Ds1302Error::ClockError)?;
            self.hold(1700.nanos()); // tCL = 1000ns for 2V
        }
        Ok(data)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, Ds1302Error> {
        self.open_session()?;
        self.write_byte(registers::read_command(reg), true)?;
        let data = self.read_byte()?;
        self.close_session()?;
        Ok(data)
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Ds1302Error> {
        self.open_session()?;
        self.write_byte(registers::write_command(reg), false)?;
        self.write_byte(value, false)?;
        self.close_session()
    }

    /// Read a single clock/control register, raw.
    pub fn read_register(&mut self, register: Register) -> Result<u8, Ds1302Error> {
        self.read_reg(register as u8)
    }

    /// Write a single clock/control register, raw.
    ///
    /// Single-register writes can tear against a running clock (e.g. the
    /// minute register rolling over between two writes); prefer
    /// [`Self::set_time`], which updates the whole register file in one
    /// burst.
    pub fn write_register(&mut self, register: Register, value: u8) -> Result<(), Ds1302Error> {
        self.write_reg(register as u8, value)
    }

    /// Enable or disable write protection.
    ///
    /// While enabled the chip silently ignores every register write except
    /// clearing this flag again. The driver cannot detect ignored writes;
    /// call `write_protect(false)` before any write sequence that must
    /// take effect.
    pub fn write_protect(&mut self, enable: bool) -> Result<(), Ds1302Error> {
        let value = if enable { WRITE_PROTECT } else { 0 };
        self.write_reg(Register::WriteProtect as u8, value)
    }

    /// Whether the write-protect flag is currently set.
    pub fn is_write_protected(&mut self) -> Result<bool, Ds1302Error> {
        let wp = self.read_reg(Register::WriteProtect as u8)?;
        Ok(wp & WRITE_PROTECT != 0)
    }

    /// Stop or restart the oscillator, preserving the stored seconds.
    pub fn set_halt(&mut self, enable: bool) -> Result<(), Ds1302Error> {
        // Read-modify-write, the seconds value must not be perturbed.
        let mut seconds = self.read_reg(Register::Seconds as u8)?;
        seconds &= !CLOCK_HALT;
        if enable {
            seconds |= CLOCK_HALT;
        }
        self.write_reg(Register::Seconds as u8, seconds)
    }

    /// Whether the clock-halt flag is currently set.
    pub fn is_halted(&mut self) -> Result<bool, Ds1302Error> {
        let seconds = self.read_reg(Register::Seconds as u8)?;
        Ok(seconds & CLOCK_HALT != 0)
    }

    /// Read the whole clock/calendar in one clock-burst session.
    ///
    /// Burst mode makes the snapshot consistent: reading the registers one
    /// at a time risks observing a partially rolled-over time.
    pub fn get_time(&mut self) -> Result<DateTime, Ds1302Error> {
        let mut regs = [0u8; 8];
        self.open_session()?;
        self.write_byte(CLOCK_BURST_READ, true)?;
        for byte in regs.iter_mut() {
            *byte = self.read_byte()?;
        }
        self.close_session()?;

        // regs[7] is the write-protect slot, not part of the time.
        Ok(DateTime {
            second: bcd_to_decimal(regs[0] & !CLOCK_HALT),
            minute: bcd_to_decimal(regs[1]),
            hour: hour_from_register(regs[2]),
            day: bcd_to_decimal(regs[3]),
            month: bcd_to_decimal(regs[4]),
            weekday: Weekday::from_register(bcd_to_decimal(regs[5])),
            year: 2000 + bcd_to_decimal(regs[6]) as u16,
        })
    }

    /// Set the whole clock/calendar in one clock-burst session.
    ///
    /// The clock-halt flag is carried over unchanged, so setting the time
    /// never starts or stops the oscillator. The hour is written in
    /// 24-hour form with the mode bits cleared. The burst always covers
    /// all eight registers, so the write-protect slot is written as zero;
    /// years outside 2000..=2099 are clamped.
    pub fn set_time(&mut self, t: DateTime) -> Result<(), Ds1302Error> {
        let halt = self.read_reg(Register::Seconds as u8)? & CLOCK_HALT;
        let year = t.year.clamp(2000, 2099) - 2000;

        self.open_session()?;
        self.write_byte(CLOCK_BURST_WRITE, false)?;
        self.write_byte(halt | decimal_to_bcd(t.second), false)?;
        self.write_byte(decimal_to_bcd(t.minute), false)?;
        self.write_byte(decimal_to_bcd(t.hour), false)?;
        self.write_byte(decimal_to_bcd(t.day), false)?;
        self.write_byte(decimal_to_bcd(t.month), false)?;
        self.write_byte(decimal_to_bcd(t.weekday as u8), false)?;
        self.write_byte(decimal_to_bcd(year as u8), false)?;
        self.write_byte(0, false)?; // write-protect slot
        self.close_session()
    }

    /// Read one byte of the battery-backed RAM. The static RAM is
    /// 31 x 8 bytes, index 0..=30; like the chip itself, out-of-range
    /// addresses report no error and read as zero.
    pub fn read_ram(&mut self, address: u8) -> Result<u8, Ds1302Error> {
        if address >= RAM_SIZE {
            return Ok(0);
        }
        self.read_reg(RAM_REGISTER_OFFSET + address)
    }

    /// Write one byte of the battery-backed RAM. Out-of-range addresses
    /// are silently dropped, matching the chip's lack of address error
    /// signaling.
    pub fn write_ram(&mut self, address: u8, value: u8) -> Result<(), Ds1302Error> {
        if address >= RAM_SIZE {
            return Ok(());
        }
        self.write_reg(RAM_REGISTER_OFFSET + address, value)
    }

    /// Read consecutive RAM bytes starting at address 0 in one burst
    /// session. Reads `buf.len()` bytes clamped to the RAM size and
    /// returns the number actually read; an empty buffer is a no-op.
    pub fn read_ram_burst(&mut self, buf: &mut [u8]) -> Result<usize, Ds1302Error> {
        let len = buf.len().min(RAM_SIZE as usize);
        if len == 0 {
            return Ok(0);
        }
        self.open_session()?;
        self.write_byte(RAM_BURST_READ, true)?;
        for byte in buf[..len].iter_mut() {
            *byte = self.read_byte()?;
        }
        self.close_session()?;
        Ok(len)
    }

    /// Write consecutive RAM bytes starting at address 0 in one burst
    /// session. Writes `buf.len()` bytes clamped to the RAM size and
    /// returns the number actually written; an empty buffer is a no-op.
    pub fn write_ram_burst(&mut self, buf: &[u8]) -> Result<usize, Ds1302Error> {
        let len = buf.len().min(RAM_SIZE as usize);
        if len == 0 {
            return Ok(0);
        }
        self.open_session()?;
        self.write_byte(RAM_BURST_WRITE, false)?;
        for &byte in &buf[..len] {
            self.write_byte(byte, false)?;
        }
        self.close_session()?;
        Ok(len)
    }

    /// Enable trickle-charge.
    /// Ds (diode drop voltage 0.7 or 1.4)
    /// Rs (2k or 4k or 8k)
    /// The maximum current = (Vcc - Ds) / Rs.
    pub fn tc_enable(&mut self, ds: Ds, rs: Rs) -> Result<(), Ds1302Error> {
        self.write_reg(TRICKLE_CHARGER_REG, TrickleCharger::enable(ds, rs))
    }

    /// Disable trickle-charge.
    pub fn tc_disable(&mut self) -> Result<(), Ds1302Error> {
        self.write_reg(TRICKLE_CHARGER_REG, TrickleCharger::disable())
    }

    /// Get the configuration of the trickle-charge register.
    pub fn tc_get(&mut self) -> Result<(bool, Option<Ds>, Option<Rs>), Ds1302Error> {
        let v = self.read_reg(TRICKLE_CHARGER_REG)?;
        Ok(TrickleCharger::from(v).get())
    }

    /// Whether trickle-charging is enabled.
    pub fn tc_is_enabled(&mut self) -> Result<bool, Ds1302Error> {
        let v = self.read_reg(TRICKLE_CHARGER_REG)?;
        Ok(TrickleCharger::from(v).is_enabled())
    }
}
