//! # Mock dummy structure for doc examples
//!
//! Simulated SPI bus, CS pin, clock and host register file. Not meant for production use.
use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::convert::Infallible;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use embedded_time::clock::Error;
use embedded_time::duration::{Duration, Fraction};
use embedded_time::fixed_point::FixedPoint;
use embedded_time::timer::param::{Armed, OneShot};
use embedded_time::{Clock, Instant, Timer};

use crate::io::atmega162::{PIND, SPIF, SPSR};
use crate::io::RegisterInterface;

/// Minimal MCP2515 register model, one transfer equals one CS frame
#[derive(Debug)]
pub struct ExampleSPIBus {
    registers: [u8; 128],
}

impl Default for ExampleSPIBus {
    fn default() -> Self {
        let mut bus = Self { registers: [0; 128] };
        bus.reset();
        bus
    }
}

impl ExampleSPIBus {
    fn reset(&mut self) {
        self.registers = [0; 128];
        // CANSTAT: configuration mode
        self.registers[0x0E] = 0x80;
        // CANCTRL: configuration mode requested, CLKOUT enabled
        self.registers[0x0F] = 0x87;
    }

    fn store(&mut self, address: u8, value: u8) {
        self.registers[address as usize & 0x7F] = value;

        // Mode requests take effect immediately
        if address == 0x0F {
            self.registers[0x0E] = (self.registers[0x0E] & 0x1F) | (value & 0xE0);
        }
    }
}

impl Transfer<u8> for ExampleSPIBus {
    type Error = Infallible;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
        match &mut words[..] {
            [0xC0] => self.reset(),
            [0x03, address, value] => *value = self.registers[*address as usize & 0x7F],
            [0x02, address, value] => self.store(*address, *value),
            [0x05, address, mask, value] => {
                let current = self.registers[*address as usize & 0x7F];
                self.store(*address, (current & !*mask) | (*value & *mask));
            }
            [0xA0, status] => *status = self.registers[0x2C] & 0x03,
            [command, value] if *command & 0xF9 == 0x90 => {
                let base = if *command & 0x04 != 0 { 0x71 } else { 0x61 };
                let offset = if *command & 0x02 != 0 { 5 } else { 0 };
                *value = self.registers[base + offset];
            }
            _ => {}
        }

        Ok(words)
    }
}

/// Chip select pin doing nothing
#[derive(Default, Debug)]
pub struct ExampleCSPin {}

impl OutputPin for ExampleCSPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Host register file: SPI transfers complete immediately and echo the sent byte,
/// ADC conversions are always finished
#[derive(Default, Debug)]
pub struct ExampleRegisters {
    values: RefCell<BTreeMap<u16, u8>>,
}

impl RegisterInterface for ExampleRegisters {
    fn read(&self, address: u16) -> u8 {
        match address {
            SPSR => 1 << SPIF,
            PIND => 0,
            _ => self.values.borrow().get(&address).copied().unwrap_or_default(),
        }
    }

    fn write(&self, address: u16, value: u8) {
        self.values.borrow_mut().insert(address, value);
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ExampleClock {
    pub next_instants: RefCell<Vec<u64>>,
}

impl ExampleClock {
    pub fn new(next_instants: Vec<u64>) -> Self {
        Self {
            next_instants: RefCell::new(next_instants),
        }
    }
}

impl Default for ExampleClock {
    fn default() -> Self {
        Self::new(vec![
            100,    // Config mode: Timer start,
            200,    // Config mode: First expiration check
            10_000, // Request mode: Timer start
            10_100, // Request mode: First expiration check
        ])
    }
}

impl Clock for ExampleClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, Error> {
        if self.next_instants.borrow().len() == 0 {
            return Err(Error::Unspecified);
        }

        Ok(Instant::new(self.next_instants.borrow_mut().remove(0)))
    }

    fn new_timer<Dur: Duration + FixedPoint>(&self, duration: Dur) -> Timer<OneShot, Armed, Self, Dur> {
        Timer::new(self, duration)
    }
}
