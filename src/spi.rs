//!# SPI master transport
//!
//! Blocking byte exchange on the host SPI peripheral. Every transfer busy-waits for the
//! transfer complete flag, there is no queuing and no interrupt usage.
//!
//! [SpiMaster] implements [Transfer] and [SelectPin] implements [OutputPin], so both can be
//! handed to the [Controller](crate::can::Controller) directly.
//!
//!```
//!# use mcp2515::example::ExampleRegisters;
//!# use mcp2515::spi::{SpiConfiguration, SpiMaster};
//!#
//! let registers = ExampleRegisters::default();
//!
//! let mut spi = SpiMaster::new(&registers, SpiConfiguration::default());
//! spi.initialize();
//!
//! spi.select_low();
//! let _response = spi.exchange(0xA0).unwrap();
//! spi.select_high();
//!```
use crate::io::atmega162::{
    CPHA, CPOL, DDRB, MSTR, PB4, PB5, PB6, PB7, PORTB, SPCR, SPDR, SPE, SPIF, SPR0, SPSR,
};
use crate::io::RegisterInterface;
use crate::wait::{block_until, Timeout};
use core::convert::Infallible;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use serde::{Deserialize, Serialize};

/// SPI transport errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// Transfer complete flag not set within the configured number of polls
    Timeout,
}

impl From<Timeout> for TransportError {
    fn from(_: Timeout) -> Self {
        TransportError::Timeout
    }
}

/// Host SPI settings
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpiConfiguration {
    /// Clock polarity/phase
    pub mode: SpiMode,

    /// SCK frequency relative to the MCU clock
    pub clock_rate: ClockRateDivisor,

    /// Max. polls of the transfer complete flag per byte, `None` waits forever
    pub transfer_timeout: Option<u32>,
}

impl Default for SpiConfiguration {
    fn default() -> Self {
        Self {
            mode: SpiMode::Mode3,
            clock_rate: ClockRateDivisor::DivideBy16,
            transfer_timeout: None,
        }
    }
}

impl SpiConfiguration {
    /// Encodes the control register (SPCR). Enabled, master, MSB first, interrupt disabled
    pub(crate) fn as_control_register(&self) -> u8 {
        let mut register = (1 << SPE) | (1 << MSTR);

        register |= (self.mode as u8) << CPHA;
        register |= (self.clock_rate as u8) << SPR0;

        register
    }
}

/// Clock polarity (bit 1) and phase (bit 0)
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SpiMode {
    /// Idle low, sample on leading edge
    Mode0 = 0b00,
    /// Idle low, sample on trailing edge
    Mode1 = 0b01,
    /// Idle high, sample on leading edge
    Mode2 = 0b10,
    /// Idle high, sample on trailing edge
    Mode3 = 0b11,
}

impl SpiMode {
    /// Maps SPCR values to mode
    pub(crate) fn from_register(register: u8) -> Self {
        let cpol = register & (1 << CPOL) != 0;
        let cpha = register & (1 << CPHA) != 0;

        match (cpol, cpha) {
            (false, false) => Self::Mode0,
            (false, true) => Self::Mode1,
            (true, false) => Self::Mode2,
            (true, true) => Self::Mode3,
        }
    }
}

/// SCK divisor (SPR1:SPR0)
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClockRateDivisor {
    DivideBy4 = 0b00,
    DivideBy16 = 0b01,
    DivideBy64 = 0b10,
    DivideBy128 = 0b11,
}

/// Blocking SPI master on the host peripheral
pub struct SpiMaster<R: RegisterInterface> {
    registers: R,

    config: SpiConfiguration,
}

impl<R: RegisterInterface> SpiMaster<R> {
    pub fn new(registers: R, config: SpiConfiguration) -> Self {
        Self { registers, config }
    }

    /// Configures pin directions and enables the peripheral as master
    pub fn initialize(&mut self) {
        self.registers.set_bits(DDRB, (1 << PB4) | (1 << PB5) | (1 << PB7));
        self.registers.clear_bits(DDRB, 1 << PB6);

        self.registers.write(SPCR, self.config.as_control_register());
    }

    /// Reads back the clock mode the peripheral currently runs with
    pub fn read_mode(&self) -> SpiMode {
        SpiMode::from_register(self.registers.read(SPCR))
    }

    /// Asserts the chip select line
    pub fn select_low(&mut self) {
        SelectPin::new(&self.registers).select();
    }

    /// Releases the chip select line
    pub fn select_high(&mut self) {
        SelectPin::new(&self.registers).deselect();
    }

    /// Shifts out one byte and returns the byte shifted in during the same transfer
    pub fn exchange(&mut self, data: u8) -> Result<u8, TransportError> {
        self.registers.write(SPDR, data);

        let registers = &self.registers;
        block_until(|| registers.read(SPSR) & (1 << SPIF) != 0, self.config.transfer_timeout)?;

        Ok(self.registers.read(SPDR))
    }

    /// Chip select pin sharing the register interface of this transport
    pub fn select_pin(&self) -> SelectPin<R>
    where
        R: Clone,
    {
        SelectPin::new(self.registers.clone())
    }
}

impl<R: RegisterInterface> Transfer<u8> for SpiMaster<R> {
    type Error = TransportError;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
        for word in words.iter_mut() {
            *word = self.exchange(*word)?;
        }

        Ok(words)
    }
}

/// Chip select line of the CAN controller (PB4)
pub struct SelectPin<R: RegisterInterface> {
    registers: R,
}

impl<R: RegisterInterface> SelectPin<R> {
    pub fn new(registers: R) -> Self {
        Self { registers }
    }

    fn select(&self) {
        self.registers.clear_bits(PORTB, 1 << PB4);
    }

    fn deselect(&self) {
        self.registers.set_bits(PORTB, 1 << PB4);
    }
}

impl<R: RegisterInterface> OutputPin for SelectPin<R> {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.select();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.deselect();
        Ok(())
    }
}
