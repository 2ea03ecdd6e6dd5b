#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]
#![allow(dead_code)]
#![allow(clippy::identity_op)]

//! # Library for MCP2515 CAN controller
//!
//! Crate currently offer the following features:
//! * MCP2515 SPI instruction set (reset, read, write, bit modify, request-to-send, read status, read RX buffer)
//! * Bit timing calculation and mode switching (configuration, normal, loopback)
//! * Blocking SPI master transport and external ADC helper for ATmega162 hosts
//! * Injectable diagnostics
//! * no_std support
//!
//! The controller is generic over [embedded_hal] SPI and pin traits, so it can be used with any HAL.
//! [spi::SpiMaster] and [spi::SelectPin] provide both for an ATmega162 host.
//!
//!## Example
//!
//!```
//!use mcp2515::can::{Controller, RxBuffer, RxBufferLocation, TxBuffer};
//!use mcp2515::config::Configuration;
//!use mcp2515::example::{ExampleCSPin, ExampleClock, ExampleSPIBus};
//!use mcp2515::status::OperationMode;
//!
//!let cs_pin = ExampleCSPin {};
//!let spi_bus = ExampleSPIBus::default();
//!
//!let mut controller: Controller<_, _, ExampleClock> = Controller::new(spi_bus, cs_pin);
//!
//!// Reset, 250 ns time quantum at 16 MHz, receive any message, normal mode
//!controller.initialize(&Configuration::default()).unwrap();
//!assert_eq!(OperationMode::Normal, controller.read_operation_status().unwrap().mode);
//!
//!// Self test
//!controller.set_loopback().unwrap();
//!
//!// Register access
//!controller.write(0x36, 0xAB).unwrap();
//!assert_eq!(0xAB, controller.read(0x36).unwrap());
//!
//!controller.request_to_send(TxBuffer::TXB0).unwrap();
//!let status = controller.read_status().unwrap();
//!
//!if status.rx0_full {
//!    let _data = controller.read_receive_buffer(RxBuffer::RXB0, RxBufferLocation::Data).unwrap();
//!}
//!```
//!
//!## Host transport
//!
//!```
//!use mcp2515::can::Controller;
//!use mcp2515::config::Configuration;
//!use mcp2515::example::{ExampleClock, ExampleRegisters};
//!use mcp2515::spi::{SpiConfiguration, SpiMaster};
//!
//!// On target: unsafe { mcp2515::io::MemoryMapped::new() }
//!let registers = ExampleRegisters::default();
//!
//!let mut spi = SpiMaster::new(&registers, SpiConfiguration::default());
//!spi.initialize();
//!let cs_pin = spi.select_pin();
//!
//!let mut controller: Controller<_, _, ExampleClock> = Controller::new(spi, cs_pin);
//!controller.initialize(&Configuration::default()).unwrap();
//!```

extern crate alloc;

pub mod adc;
pub mod can;
pub mod config;
pub mod diagnostics;
pub mod io;
pub mod spi;
pub mod status;
pub mod wait;

pub mod example;
#[cfg(test)]
pub(crate) mod mocks;
mod registers;
#[cfg(test)]
mod tests;
