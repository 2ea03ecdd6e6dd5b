//!# External ADC
//!
//! Blocking single-ended conversions on the external ADC mapped at [ADC_ADDRESS].
//! A conversion is started on request only, the end of conversion is signaled on PD2.
//!
//!```
//!# use mcp2515::adc::{Adc, Channel};
//!# use mcp2515::example::ExampleRegisters;
//!#
//! let registers = ExampleRegisters::default();
//!
//! let mut adc = Adc::new(&registers);
//! adc.initialize();
//!
//! let _value = adc.read_channel(Channel::Ch2).unwrap();
//!```
use crate::io::atmega162::{DDRD, PD2, PIND};
use crate::io::RegisterInterface;
use crate::wait::{block_until, Timeout};

/// External memory address of the ADC
pub const ADC_ADDRESS: u16 = 0x1100;

/// Single-ended, unipolar conversion
const SINGLE_ENDED: u8 = 0x04;

/// Analog input channel
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Channel {
    Ch0 = 0,
    Ch1 = 1,
    Ch2 = 2,
    Ch3 = 3,
}

/// External ADC helper
pub struct Adc<R: RegisterInterface> {
    registers: R,

    /// Max. polls of the busy pin, `None` waits forever
    timeout: Option<u32>,
}

impl<R: RegisterInterface> Adc<R> {
    pub fn new(registers: R) -> Self {
        Self {
            registers,
            timeout: None,
        }
    }

    /// Limits the number of polls for the end of conversion
    pub fn with_timeout(mut self, polls: u32) -> Self {
        self.timeout = Some(polls);
        self
    }

    /// Configures the end-of-conversion pin as input
    pub fn initialize(&mut self) {
        self.registers.clear_bits(DDRD, 1 << PD2);
    }

    /// Starts a conversion on the given channel and blocks until the result is available
    pub fn read_channel(&mut self, channel: Channel) -> Result<u8, Timeout> {
        self.registers.write(ADC_ADDRESS, SINGLE_ENDED | channel as u8);

        let registers = &self.registers;
        block_until(|| registers.read(PIND) & (1 << PD2) == 0, self.timeout)?;

        Ok(self.registers.read(ADC_ADDRESS))
    }
}
