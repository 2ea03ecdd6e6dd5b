use crate::registers::CanStat;
use serde::{Deserialize, Serialize};

///  Operation status read from CANSTAT register
#[derive(Copy, Clone, Debug)]
pub struct OperationStatus {
    /// Current operation mode
    pub mode: OperationMode,

    /// Source of the highest priority pending interrupt
    pub interrupt: InterruptCode,
}

impl OperationStatus {
    pub(crate) fn from_register(register: u8) -> Self {
        let canstat = CanStat::from(register);

        Self {
            mode: OperationMode::from_bits(canstat.opmod()),
            interrupt: InterruptCode::from_bits(canstat.icod()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OperationMode {
    /// Normal operation, the only mode transmitting acknowledges and frames on the bus
    Normal = 0b000,
    /// Sleep mode
    Sleep = 0b001,
    /// Internal loopback, transmitted frames are routed to the receive buffers
    Loopback = 0b010,
    /// Listen-only mode
    ListenOnly = 0b011,
    /// Configuration mode, entered after reset
    Configuration = 0b100,
    /// Reserved mode bits, not defined by the device
    Invalid = 0b111,
}

impl OperationMode {
    /// Maps the three most significant bits of CANCTRL/CANSTAT to mode
    pub(crate) fn from_register(register: u8) -> Self {
        Self::from_bits(CanStat::from(register).opmod())
    }

    /// Maps the OPMOD/REQOP field value to mode
    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits {
            0b000 => Self::Normal,
            0b001 => Self::Sleep,
            0b010 => Self::Loopback,
            0b011 => Self::ListenOnly,
            0b100 => Self::Configuration,
            _ => Self::Invalid,
        }
    }
}

/// Interrupt flag code (ICOD) of CANSTAT
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InterruptCode {
    NoInterrupt = 0b000,
    Error = 0b001,
    WakeUp = 0b010,
    TxBuffer0 = 0b011,
    TxBuffer1 = 0b100,
    TxBuffer2 = 0b101,
    RxBuffer0 = 0b110,
    RxBuffer1 = 0b111,
}

impl InterruptCode {
    pub(crate) fn from_register(register: u8) -> Self {
        Self::from_bits(CanStat::from(register).icod())
    }

    /// Maps the ICOD field value to interrupt code
    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits {
            0b000 => Self::NoInterrupt,
            0b001 => Self::Error,
            0b010 => Self::WakeUp,
            0b011 => Self::TxBuffer0,
            0b100 => Self::TxBuffer1,
            0b101 => Self::TxBuffer2,
            0b110 => Self::RxBuffer0,
            _ => Self::RxBuffer1,
        }
    }
}

/// Snapshot returned by the READ STATUS instruction
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Status {
    /// Receive buffer 0 full (RX0IF)
    pub rx0_full: bool,
    /// Receive buffer 1 full (RX1IF)
    pub rx1_full: bool,

    /// Transmission pending for buffer 0..2 (TXREQn)
    pub tx_pending: [bool; 3],

    /// Transmit buffer 0..2 empty interrupt flag (TXnIF)
    pub tx_empty: [bool; 3],

    /// Raw status byte
    pub raw: u8,
}

impl Status {
    pub(crate) fn from_register(register: u8) -> Self {
        Self {
            rx0_full: register & 1 != 0,
            rx1_full: register & (1 << 1) != 0,
            tx_pending: [
                register & (1 << 2) != 0,
                register & (1 << 4) != 0,
                register & (1 << 6) != 0,
            ],
            tx_empty: [
                register & (1 << 3) != 0,
                register & (1 << 5) != 0,
                register & (1 << 7) != 0,
            ],
            raw: register,
        }
    }
}

/// Interrupt flags read from CANINTF register
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InterruptFlags {
    /// Message error
    pub message_error: bool,
    /// Wake-up
    pub wake_up: bool,
    /// Error (EFLG)
    pub error: bool,
    /// Transmit buffer 0..2 empty
    pub tx_empty: [bool; 3],
    /// Receive buffer 0 full
    pub rx0_full: bool,
    /// Receive buffer 1 full
    pub rx1_full: bool,
}

impl InterruptFlags {
    pub(crate) fn from_register(register: u8) -> Self {
        Self {
            message_error: register & (1 << 7) != 0,
            wake_up: register & (1 << 6) != 0,
            error: register & (1 << 5) != 0,
            tx_empty: [
                register & (1 << 2) != 0,
                register & (1 << 3) != 0,
                register & (1 << 4) != 0,
            ],
            rx0_full: register & 1 != 0,
            rx1_full: register & (1 << 1) != 0,
        }
    }
}
