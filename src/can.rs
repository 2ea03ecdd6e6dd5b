//!# CAN Controller device
//!
//! Every operation is one chip select framed SPI transfer. No register state is cached,
//! each read goes to the device.
//!
//!```
//!# use mcp2515::can::Controller;
//!# use mcp2515::config::Configuration;
//!# use mcp2515::example::*;
//!# use mcp2515::status::OperationMode;
//!#
//! let sys_clk = ExampleClock::default();
//! let spi_bus = ExampleSPIBus::default();
//! let cs_pin = ExampleCSPin {};
//!
//! // Initialize controller object
//! let mut can_controller = Controller::new(spi_bus, cs_pin);
//!
//! // Use default configuration settings
//! let can_config = Configuration::default();
//!
//! // Configure CAN controller
//! can_controller.configure(&can_config, &sys_clk).unwrap();
//!
//! assert_eq!(OperationMode::Normal, can_controller.read_operation_status().unwrap().mode);
//! ```

use crate::config::{Configuration, ReceiveBufferMode};
use crate::diagnostics::{DiagnosticSink, Event, NoDiagnostics};
use crate::registers::CanCtrl;
use crate::status::{InterruptFlags, OperationMode, OperationStatus, Status};
use crate::wait::spin;
use core::marker::PhantomData;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use embedded_time::duration::Milliseconds;
use embedded_time::Clock;
use log::debug;

const REGISTER_CANSTAT: u8 = 0x0E;

const REGISTER_CANCTRL: u8 = 0x0F;

const REGISTER_CNF3: u8 = 0x28;

const REGISTER_CNF2: u8 = 0x29;

const REGISTER_CNF1: u8 = 0x2A;

const REGISTER_CANINTF: u8 = 0x2C;

const REGISTER_RXB0CTRL: u8 = 0x60;

const REGISTER_RXB1CTRL: u8 = 0x70;

/// Spin iterations after reset until the oscillator is stable again
const RESET_SETTLE_CYCLES: u32 = 128;

#[derive(Debug, PartialEq)]
pub enum BusError<B, CS> {
    /// SPI transfer failed
    TransferError(B),
    /// Chip select pin could not be driven
    CSError(CS),
}

/// Possible errors during configuration and mode switching
#[derive(Debug, PartialEq)]
pub enum CanError<B, CS> {
    /// SPI bus or CS pin error
    BusError(BusError<B, CS>),
    /// Internal clock error
    ClockError,
    /// No configuration mode within timeout of 2 ms
    ConfigurationModeTimeout,
    /// Device did not enter given request mode within timeout of 2 ms
    RequestModeTimeout,
    /// Mode read back from CANSTAT differs from the requested mode
    ModeVerification {
        expected: OperationMode,
        actual: OperationMode,
    },
}

impl<B, CS> From<BusError<B, CS>> for CanError<B, CS> {
    fn from(value: BusError<B, CS>) -> Self {
        CanError::BusError(value)
    }
}

impl<B, CS> From<embedded_time::clock::Error> for CanError<B, CS> {
    fn from(_error: embedded_time::clock::Error) -> Self {
        CanError::ClockError
    }
}

/// Transmit buffer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TxBuffer {
    TXB0 = 0,
    TXB1 = 1,
    TXB2 = 2,
}

/// Receive buffer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RxBuffer {
    RXB0 = 0,
    RXB1 = 1,
}

impl RxBuffer {
    /// Receive interrupt flag of this buffer in CANINTF
    fn interrupt_flag(self) -> u8 {
        1 << (self as u8)
    }
}

/// Start location of the READ RX BUFFER instruction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RxBufferLocation {
    /// Standard identifier high (RXBnSIDH)
    Header = 0,
    /// First data byte (RXBnD0)
    Data = 1,
}

/// Main MCP2515 CAN controller device
pub struct Controller<B: Transfer<u8>, CS: OutputPin, CLK: Clock, D: DiagnosticSink = NoDiagnostics> {
    /// SPI bus
    bus: B,

    /// CS pin
    pin_cs: CS,

    /// Receiver of command events
    diagnostics: D,

    /// System clock
    clock: PhantomData<CLK>,
}

impl<B, CS, CLK> Controller<B, CS, CLK>
where
    B: Transfer<u8>,
    CS: OutputPin,
    CLK: Clock,
{
    pub fn new(bus: B, pin_cs: CS) -> Self {
        Self::with_diagnostics(bus, pin_cs, NoDiagnostics)
    }
}

impl<B, CS, CLK, D> Controller<B, CS, CLK, D>
where
    B: Transfer<u8>,
    CS: OutputPin,
    CLK: Clock,
    D: DiagnosticSink,
{
    pub fn with_diagnostics(bus: B, pin_cs: CS, diagnostics: D) -> Self {
        Self {
            bus,
            pin_cs,
            diagnostics,
            clock: Default::default(),
        }
    }

    /// Resets the device and runs the fixed setup sequence without verification.
    /// Device is left in normal mode.
    pub fn initialize(&mut self, config: &Configuration) -> Result<(), BusError<B::Error, CS::Error>> {
        self.reset()?;
        self.write_configuration(config)?;

        self.request_mode(OperationMode::Normal)
    }

    /// Resets the device, applies the given configuration and switches to the configured mode.
    /// Each mode transition is awaited for max. 2 ms.
    pub fn configure(&mut self, config: &Configuration, clock: &CLK) -> Result<(), CanError<B::Error, CS::Error>> {
        self.reset()?;
        self.await_mode(OperationMode::Configuration, clock, CanError::ConfigurationModeTimeout)?;

        self.write_configuration(config)?;

        let mode = config.mode.to_operation_mode();
        self.request_mode(mode)?;
        self.await_mode(mode, clock, CanError::RequestModeTimeout)?;

        Ok(())
    }

    /// Switches to loopback mode via configuration mode and verifies the result
    pub fn set_loopback(&mut self) -> Result<(), CanError<B::Error, CS::Error>> {
        self.write(REGISTER_CANCTRL, Self::mode_request(OperationMode::Configuration))?;
        self.write(REGISTER_CANCTRL, Self::mode_request(OperationMode::Loopback))?;

        self.verify_mode(OperationMode::Loopback)
    }

    /// Requests the given mode, other CANCTRL bits are kept
    pub fn request_mode(&mut self, mode: OperationMode) -> Result<(), BusError<B::Error, CS::Error>> {
        let mask = CanCtrl::new().with_reqop(0b111).into();

        self.bit_modify(REGISTER_CANCTRL, mask, Self::mode_request(mode))
    }

    /// Reads CANSTAT once and compares the current mode with the expected one
    pub fn verify_mode(&mut self, expected: OperationMode) -> Result<(), CanError<B::Error, CS::Error>> {
        let canstat = self.read(REGISTER_CANSTAT)?;
        let actual = OperationMode::from_register(canstat);

        if actual != expected {
            self.diagnostics.log(Event::ModeVerificationFailed { expected, canstat });
            return Err(CanError::ModeVerification { expected, actual });
        }

        Ok(())
    }

    /// Reads and returns the operation status
    pub fn read_operation_status(&mut self) -> Result<OperationStatus, BusError<B::Error, CS::Error>> {
        let data = self.read(REGISTER_CANSTAT)?;

        Ok(OperationStatus::from_register(data))
    }

    /// Reads and returns the interrupt flags
    pub fn read_interrupt_flags(&mut self) -> Result<InterruptFlags, BusError<B::Error, CS::Error>> {
        let data = self.read(REGISTER_CANINTF)?;

        Ok(InterruptFlags::from_register(data))
    }

    /// Reset internal register to default and switch to Configuration mode
    pub fn reset(&mut self) -> Result<(), BusError<B::Error, CS::Error>> {
        self.transfer(&mut [Instruction::Reset as u8])?;
        spin(RESET_SETTLE_CYCLES);

        self.diagnostics.log(Event::Reset);
        Ok(())
    }

    /// Reads a single register byte
    pub fn read(&mut self, address: u8) -> Result<u8, BusError<B::Error, CS::Error>> {
        let value = self.transfer(&mut [Instruction::Read as u8, address, 0x0])?;

        self.diagnostics.log(Event::Read { address, value });
        Ok(value)
    }

    /// Writes a single register byte
    pub fn write(&mut self, address: u8, value: u8) -> Result<(), BusError<B::Error, CS::Error>> {
        self.transfer(&mut [Instruction::Write as u8, address, value])?;

        self.diagnostics.log(Event::Write { address, value });
        Ok(())
    }

    /// Sets the register bits selected by `mask` to the corresponding bits of `value`.
    /// Only valid for registers supporting the bit modify instruction.
    pub fn bit_modify(&mut self, address: u8, mask: u8, value: u8) -> Result<(), BusError<B::Error, CS::Error>> {
        self.transfer(&mut [Instruction::BitModify as u8, address, mask, value])?;

        self.diagnostics.log(Event::BitModify { address, mask, value });
        Ok(())
    }

    /// Requests transmission of the given buffer
    pub fn request_to_send(&mut self, buffer: TxBuffer) -> Result<(), BusError<B::Error, CS::Error>> {
        self.transfer(&mut [Instruction::RequestToSend as u8 | (1 << buffer as u8)])?;

        self.diagnostics.log(Event::RequestToSend { buffer });
        Ok(())
    }

    /// Reads the quick status of receive and transmit buffers
    pub fn read_status(&mut self) -> Result<Status, BusError<B::Error, CS::Error>> {
        let status = self.transfer(&mut [Instruction::ReadStatus as u8, 0x0])?;

        self.diagnostics.log(Event::ReadStatus { status });
        Ok(Status::from_register(status))
    }

    /// Reads one byte at the given location of a receive buffer.
    /// The receive interrupt flag of the buffer is cleared afterwards, so the buffer accepts the next message.
    pub fn read_receive_buffer(
        &mut self,
        buffer: RxBuffer,
        location: RxBufferLocation,
    ) -> Result<u8, BusError<B::Error, CS::Error>> {
        let command = Instruction::ReadRxBuffer as u8 | ((buffer as u8) << 2) | ((location as u8) << 1);
        let value = self.transfer(&mut [command, 0x0])?;

        self.bit_modify(REGISTER_CANINTF, buffer.interrupt_flag(), 0x0)?;

        self.diagnostics.log(Event::ReadReceiveBuffer {
            buffer,
            location,
            value,
        });
        Ok(value)
    }

    /// Writes bit timing and receive buffer configuration. Device must be in configuration mode
    fn write_configuration(&mut self, config: &Configuration) -> Result<(), BusError<B::Error, CS::Error>> {
        self.write(REGISTER_CNF1, config.bit_timing.as_cnf1())?;
        self.write(REGISTER_CNF2, config.bit_timing.as_cnf2())?;
        self.write(REGISTER_CNF3, config.bit_timing.as_cnf3())?;

        let mask = ReceiveBufferMode::register_mask();
        let value = config.receive_mode.as_register();

        self.bit_modify(REGISTER_RXB0CTRL, mask, value)?;
        self.bit_modify(REGISTER_RXB1CTRL, mask, value)?;

        Ok(())
    }

    /// Polls CANSTAT until the given mode is reached or 2 ms have passed
    fn await_mode(
        &mut self,
        mode: OperationMode,
        clock: &CLK,
        timeout_error: CanError<B::Error, CS::Error>,
    ) -> Result<(), CanError<B::Error, CS::Error>> {
        let target = clock.try_now()?.checked_add(Milliseconds::new(2)).ok_or(CanError::ClockError)?;

        loop {
            let current_mode = self.read_operation_status()?.mode;

            if current_mode == mode {
                return Ok(());
            }

            if clock.try_now()? > target {
                debug!("Device did not enter mode {mode:?} within timeout. Current mode: {current_mode:?}");
                return Err(timeout_error);
            }
        }
    }

    /// CANCTRL value requesting the given mode, all other bits cleared
    fn mode_request(mode: OperationMode) -> u8 {
        CanCtrl::new().with_reqop(mode as u8).into()
    }

    /// Executes one chip select framed transfer and returns the last byte received.
    /// CS is released even if the transfer fails.
    fn transfer(&mut self, buffer: &mut [u8]) -> Result<u8, BusError<B::Error, CS::Error>> {
        self.pin_cs.set_low().map_err(BusError::CSError)?;

        let result = self
            .bus
            .transfer(buffer)
            .map(|response| response.last().copied().unwrap_or_default())
            .map_err(BusError::TransferError);

        self.pin_cs.set_high().map_err(BusError::CSError)?;

        result
    }
}

/// SPI instruction set
#[derive(Copy, Clone)]
enum Instruction {
    Write = 0x02,
    Read = 0x03,
    BitModify = 0x05,
    RequestToSend = 0x80,
    ReadRxBuffer = 0x90,
    ReadStatus = 0xA0,
    Reset = 0xC0,
}
