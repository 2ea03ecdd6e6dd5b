//! # Host register access
//!
//! Peripherals of the host MCU are driven through a [RegisterInterface] object instead of
//! ambient global state. [MemoryMapped] performs volatile accesses on the real data space,
//! tests substitute a mock register file.
//!
//! ```
//!# use mcp2515::example::ExampleRegisters;
//!# use mcp2515::io::{atmega162, RegisterInterface};
//!#
//! let registers = ExampleRegisters::default();
//!
//! registers.set_bits(atmega162::DDRB, 1 << atmega162::PB4);
//! registers.clear_bits(atmega162::DDRB, 1 << atmega162::PB6);
//!
//! assert_eq!(1 << atmega162::PB4, registers.read(atmega162::DDRB));
//! ```

/// Byte wide access to a fixed register address space
pub trait RegisterInterface {
    /// Reads the register at the given data space address
    fn read(&self, address: u16) -> u8;

    /// Writes the register at the given data space address
    fn write(&self, address: u16, value: u8);

    /// Sets all bits of `mask`, leaving the others untouched
    fn set_bits(&self, address: u16, mask: u8) {
        self.write(address, self.read(address) | mask);
    }

    /// Clears all bits of `mask`, leaving the others untouched
    fn clear_bits(&self, address: u16, mask: u8) {
        self.write(address, self.read(address) & !mask);
    }
}

impl<T: RegisterInterface + ?Sized> RegisterInterface for &T {
    fn read(&self, address: u16) -> u8 {
        (**self).read(address)
    }

    fn write(&self, address: u16, value: u8) {
        (**self).write(address, value)
    }

    fn set_bits(&self, address: u16, mask: u8) {
        (**self).set_bits(address, mask)
    }

    fn clear_bits(&self, address: u16, mask: u8) {
        (**self).clear_bits(address, mask)
    }
}

/// Volatile access to the memory mapped registers of the running MCU
#[derive(Copy, Clone, Debug)]
pub struct MemoryMapped {
    _private: (),
}

impl MemoryMapped {
    /// # Safety
    ///
    /// Caller must run on a target where every address passed to this object is a valid
    /// byte register (or external memory location) of the data space.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterInterface for MemoryMapped {
    fn read(&self, address: u16) -> u8 {
        // SAFETY: address validity is guaranteed by the contract of MemoryMapped::new()
        unsafe { core::ptr::read_volatile(address as usize as *const u8) }
    }

    fn write(&self, address: u16, value: u8) {
        // SAFETY: address validity is guaranteed by the contract of MemoryMapped::new()
        unsafe { core::ptr::write_volatile(address as usize as *mut u8, value) }
    }
}

/// Data space addresses and bit positions of the ATmega162 peripherals in use
pub mod atmega162 {
    /// Port D input pins
    pub const PIND: u16 = 0x30;
    /// Port D data direction
    pub const DDRD: u16 = 0x31;
    /// Port D output
    pub const PORTD: u16 = 0x32;

    /// Port B input pins
    pub const PINB: u16 = 0x36;
    /// Port B data direction
    pub const DDRB: u16 = 0x37;
    /// Port B output
    pub const PORTB: u16 = 0x38;

    /// SPI control register
    pub const SPCR: u16 = 0x2D;
    /// SPI status register
    pub const SPSR: u16 = 0x2E;
    /// SPI data register
    pub const SPDR: u16 = 0x2F;

    /// Slave select
    pub const PB4: u8 = 4;
    /// MOSI
    pub const PB5: u8 = 5;
    /// MISO
    pub const PB6: u8 = 6;
    /// SCK
    pub const PB7: u8 = 7;

    /// External ADC end-of-conversion (INTR, active low)
    pub const PD2: u8 = 2;

    pub const SPIE: u8 = 7;
    pub const SPE: u8 = 6;
    pub const DORD: u8 = 5;
    pub const MSTR: u8 = 4;
    pub const CPOL: u8 = 3;
    pub const CPHA: u8 = 2;
    pub const SPR1: u8 = 1;
    pub const SPR0: u8 = 0;

    /// SPI transfer complete flag
    pub const SPIF: u8 = 7;
}
