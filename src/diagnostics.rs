//!# Diagnostics
//!
//! The controller reports every command frame as [Event] to an injected [DiagnosticSink].
//! [NoDiagnostics] discards everything and is used by default, [LogDiagnostics] forwards to
//! the `log` facade.
//!
//!```
//!# use mcp2515::can::Controller;
//!# use mcp2515::diagnostics::LogDiagnostics;
//!# use mcp2515::example::{ExampleCSPin, ExampleClock, ExampleSPIBus};
//!#
//! let mut controller: Controller<_, _, ExampleClock, _> =
//!     Controller::with_diagnostics(ExampleSPIBus::default(), ExampleCSPin {}, LogDiagnostics);
//!
//! controller.write(0x05, 0xAB).unwrap();
//! assert_eq!(0xAB, controller.read(0x05).unwrap());
//!```
use crate::can::{RxBuffer, RxBufferLocation, TxBuffer};
use crate::status::OperationMode;
use log::{debug, warn};

/// Command level event
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Event {
    Reset,
    Read { address: u8, value: u8 },
    Write { address: u8, value: u8 },
    BitModify { address: u8, mask: u8, value: u8 },
    RequestToSend { buffer: TxBuffer },
    ReadStatus { status: u8 },
    ReadReceiveBuffer { buffer: RxBuffer, location: RxBufferLocation, value: u8 },
    /// Mode read back from CANSTAT differs from the requested one
    ModeVerificationFailed { expected: OperationMode, canstat: u8 },
}

/// Receiver of diagnostic events
pub trait DiagnosticSink {
    fn log(&mut self, event: Event);
}

/// Discards all events
#[derive(Copy, Clone, Debug, Default)]
pub struct NoDiagnostics;

impl DiagnosticSink for NoDiagnostics {
    fn log(&mut self, _event: Event) {}
}

/// Writes events to the `log` facade
#[derive(Copy, Clone, Debug, Default)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn log(&mut self, event: Event) {
        match event {
            Event::Reset => debug!("MCP_RESET"),
            Event::Read { address, value } => debug!("MCP_READ {address:#04x} {value:#04x}"),
            Event::Write { address, value } => debug!("MCP_WRITE {address:#04x} {value}"),
            Event::BitModify { address, mask, value } => {
                debug!("MCP_BITMOD {address:#04x} {mask:#04x} {value:#04x}")
            }
            Event::RequestToSend { buffer } => debug!("MCP_RTS {}", buffer as u8),
            Event::ReadStatus { status } => debug!("MCP_READ_STATUS {status:#04x}"),
            Event::ReadReceiveBuffer { buffer, location, value } => {
                debug!("MCP_READ_RX{} {location:?} {value:#04x}", buffer as u8)
            }
            Event::ModeVerificationFailed { expected, canstat } => {
                warn!("Mode {expected:?} set failed, CANSTAT: {canstat:#04x}")
            }
        }
    }
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for &mut T {
    fn log(&mut self, event: Event) {
        (**self).log(event)
    }
}
