use crate::adc::ADC_ADDRESS;
use crate::io::atmega162::{PD2, PIND, SPDR, SPIF, SPSR};
use crate::io::RegisterInterface;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use embedded_time::clock::Error;
use embedded_time::duration::Duration;
use embedded_time::fixed_point::FixedPoint;
use embedded_time::fraction::Fraction;
use embedded_time::timer::param::{Armed, OneShot};
use embedded_time::{Clock, Instant, Timer};
use mockall::mock;

#[derive(Debug, PartialEq, Eq)]
pub struct TestClock {
    pub next_instants: RefCell<Vec<u64>>,
}

impl TestClock {
    pub fn new(next_instants: Vec<u64>) -> Self {
        Self {
            next_instants: RefCell::new(next_instants),
        }
    }
}

impl Clock for TestClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, Error> {
        if self.next_instants.borrow().len() == 0 {
            return Err(Error::Unspecified);
        }

        Ok(Instant::new(self.next_instants.borrow_mut().remove(0)))
    }

    fn new_timer<Dur>(&self, duration: Dur) -> Timer<OneShot, Armed, Self, Dur>
    where
        Dur: Duration + FixedPoint,
    {
        Timer::new(self, duration)
    }
}

mock! {
    pub SPIBus {}

    impl Transfer<u8> for SPIBus{
        type Error = u32;

        fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'static [u8], u32>;
    }
}

mock! {
    pub Pin {}

    impl OutputPin for Pin {
        type Error = u32;

        fn set_low(&mut self) -> Result<(), u32>;
        fn set_high(&mut self) -> Result<(), u32>;
    }
}

pub const CANSTAT: u8 = 0x0E;
pub const CANCTRL: u8 = 0x0F;
pub const CANINTF: u8 = 0x2C;
pub const RXB0SIDH: u8 = 0x61;
pub const RXB0D0: u8 = 0x66;
pub const RXB1SIDH: u8 = 0x71;
pub const RXB1D0: u8 = 0x76;

/// Chip select transition or byte seen by the simulated device
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusEvent {
    Select,
    Deselect,
    Byte(u8),
}

/// Register level MCP2515 model. Bytes are processed one by one within CS frames
#[derive(Debug)]
pub struct DeviceState {
    pub registers: [u8; 128],
    pub events: Vec<BusEvent>,
    selected: bool,
    frame: Vec<u8>,
}

impl DeviceState {
    fn new() -> Self {
        let mut state = Self {
            registers: [0; 128],
            events: Vec::new(),
            selected: false,
            frame: Vec::new(),
        };
        state.reset();
        state
    }

    fn reset(&mut self) {
        self.registers = [0; 128];
        self.registers[CANSTAT as usize] = 0x80;
        self.registers[CANCTRL as usize] = 0x87;
    }

    fn store(&mut self, address: u8, value: u8) {
        self.registers[address as usize & 0x7F] = value;

        if address == CANCTRL {
            let canstat = &mut self.registers[CANSTAT as usize];
            *canstat = (*canstat & 0x1F) | (value & 0xE0);
        }
    }

    fn load(&self, address: u8) -> u8 {
        self.registers[address as usize & 0x7F]
    }

    /// READ STATUS bit layout
    fn status(&self) -> u8 {
        let intf = self.load(CANINTF);
        let mut status = intf & 0x03;

        for (index, base) in [0x30u8, 0x40, 0x50].iter().enumerate() {
            let ctrl = self.load(*base);
            status |= ((ctrl >> 3) & 1) << (2 + 2 * index);
            status |= ((intf >> (2 + index)) & 1) << (3 + 2 * index);
        }

        status
    }

    /// Shifts one byte in and returns the byte shifted out
    fn exchange(&mut self, byte: u8) -> u8 {
        self.events.push(BusEvent::Byte(byte));
        assert!(self.selected, "byte {byte:#04x} transferred without chip select");

        self.frame.push(byte);
        let index = self.frame.len() - 1;
        let command = self.frame[0];

        match command {
            0xC0 if index == 0 => {
                self.reset();
                0
            }
            0x03 if index >= 2 => {
                let address = self.frame[1].wrapping_add(index as u8 - 2);
                self.load(address)
            }
            0x02 if index >= 2 => {
                let address = self.frame[1].wrapping_add(index as u8 - 2);
                self.store(address, byte);
                0
            }
            0x05 if index == 3 => {
                let (address, mask) = (self.frame[1], self.frame[2]);
                let current = self.load(address);
                self.store(address, (current & !mask) | (byte & mask));
                0
            }
            0x80..=0x87 if index == 0 => {
                for (buffer, base) in [0x30u8, 0x40, 0x50].iter().enumerate() {
                    if command & (1 << buffer) != 0 {
                        let ctrl = self.load(*base);
                        self.store(*base, ctrl | (1 << 3));
                    }
                }
                0
            }
            0xA0 if index >= 1 => self.status(),
            0x90 | 0x92 | 0x94 | 0x96 if index >= 1 => {
                let start = match command {
                    0x90 => RXB0SIDH,
                    0x92 => RXB0D0,
                    0x94 => RXB1SIDH,
                    _ => RXB1D0,
                };
                self.load(start.wrapping_add(index as u8 - 1))
            }
            _ => 0,
        }
    }
}

/// SPI bus and CS pin sharing one simulated device
pub struct SimulatedDevice {
    pub state: Rc<RefCell<DeviceState>>,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(DeviceState::new())),
        }
    }

    pub fn bus(&self) -> SimulatedBus {
        SimulatedBus {
            state: self.state.clone(),
        }
    }

    pub fn pin(&self) -> SimulatedPin {
        SimulatedPin {
            state: self.state.clone(),
        }
    }

    pub fn register(&self, address: u8) -> u8 {
        self.state.borrow().load(address)
    }

    pub fn set_register(&self, address: u8, value: u8) {
        self.state.borrow_mut().registers[address as usize] = value;
    }

    pub fn events(&self) -> Vec<BusEvent> {
        self.state.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }
}

pub struct SimulatedBus {
    state: Rc<RefCell<DeviceState>>,
}

impl Transfer<u8> for SimulatedBus {
    type Error = u32;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], u32> {
        let mut state = self.state.borrow_mut();

        for word in words.iter_mut() {
            *word = state.exchange(*word);
        }

        Ok(words)
    }
}

pub struct SimulatedPin {
    state: Rc<RefCell<DeviceState>>,
}

impl OutputPin for SimulatedPin {
    type Error = u32;

    fn set_low(&mut self) -> Result<(), u32> {
        let mut state = self.state.borrow_mut();
        state.events.push(BusEvent::Select);
        state.selected = true;
        state.frame.clear();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), u32> {
        let mut state = self.state.borrow_mut();
        state.events.push(BusEvent::Deselect);
        state.selected = false;
        Ok(())
    }
}

/// Host register file with SPI and ADC peripheral behaviour.
///
/// Writing SPDR records the byte and loads the next queued response, SPIF is set after
/// `spi_delay` polls of SPSR. Writing the ADC starts a conversion, PD2 of PIND is driven low
/// after `adc_delay` polls and the ADC address returns `adc_result`.
#[derive(Default)]
pub struct RegisterFile {
    values: RefCell<Vec<(u16, u8)>>,
    pub writes: RefCell<Vec<(u16, u8)>>,
    pub spi_sent: RefCell<Vec<u8>>,
    pub spi_responses: RefCell<Vec<u8>>,
    pub spi_delay: Cell<u32>,
    spi_polls: Cell<u32>,
    pub adc_delay: Cell<u32>,
    adc_polls: Cell<u32>,
    pub adc_result: Cell<u8>,
    pub spi_stuck: Cell<bool>,
}

impl RegisterFile {
    pub fn value(&self, address: u16) -> u8 {
        self.values
            .borrow()
            .iter()
            .rev()
            .find(|(addr, _)| *addr == address)
            .map(|(_, value)| *value)
            .unwrap_or_default()
    }

    fn store(&self, address: u16, value: u8) {
        let mut values = self.values.borrow_mut();
        values.retain(|(addr, _)| *addr != address);
        values.push((address, value));
    }

    /// Values written to the given address in order
    pub fn writes_to(&self, address: u16) -> Vec<u8> {
        self.writes
            .borrow()
            .iter()
            .filter(|(addr, _)| *addr == address)
            .map(|(_, value)| *value)
            .collect()
    }
}

impl RegisterInterface for RegisterFile {
    fn read(&self, address: u16) -> u8 {
        match address {
            SPSR => {
                if self.spi_stuck.get() {
                    return 0;
                }

                let polls = self.spi_polls.get() + 1;
                self.spi_polls.set(polls);

                if polls > self.spi_delay.get() {
                    1 << SPIF
                } else {
                    0
                }
            }
            PIND => {
                let polls = self.adc_polls.get() + 1;
                self.adc_polls.set(polls);

                if polls > self.adc_delay.get() {
                    self.value(PIND) & !(1 << PD2)
                } else {
                    self.value(PIND) | (1 << PD2)
                }
            }
            ADC_ADDRESS => self.adc_result.get(),
            _ => self.value(address),
        }
    }

    fn write(&self, address: u16, value: u8) {
        self.writes.borrow_mut().push((address, value));

        if address == SPDR {
            self.spi_sent.borrow_mut().push(value);
            self.spi_polls.set(0);

            let mut responses = self.spi_responses.borrow_mut();
            let response = if responses.is_empty() { 0 } else { responses.remove(0) };
            self.store(SPDR, response);
            return;
        }

        if address == ADC_ADDRESS {
            self.adc_polls.set(0);
        }

        self.store(address, value);
    }
}
