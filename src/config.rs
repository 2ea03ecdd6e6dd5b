//!# Controller configuration
//!
//! Bit timing is derived from the oscillator frequency and the prescaler/segment fields.
//! The time quantum is `TQ = 2 * T_osc * (BRP + 1)`, each segment lasts `field + 1` TQ.
//!
//! Unless [BitTiming::with_programmable_phase_segment2] is set (CNF2.BTLMODE), the device ignores
//! PHSEG2 and uses `PS2 = max(PS1, IPT)` with an information processing time of 2 TQ.
//!
//!```
//!# use mcp2515::config::BitTiming;
//!# use embedded_time::duration::Nanoseconds;
//!# use embedded_time::rate::Hertz;
//!#
//! // 16 MHz oscillator, BRP=1, PRSEG=1, PHSEG1=2, PHSEG2=2
//! let timing = BitTiming::new(Hertz(16_000_000), 1, 1, 2, 2).unwrap();
//!
//! assert_eq!(Nanoseconds(250u32), timing.time_quantum());
//! assert_eq!(9, timing.quanta_per_bit());
//!
//! // 500 kbit/s with PS2 taken from PHSEG2
//! let timing = BitTiming::new(Hertz(16_000_000), 0, 1, 6, 5)
//!     .unwrap()
//!     .with_programmable_phase_segment2(true);
//!
//! assert_eq!(Hertz(500_000u32), timing.bit_rate());
//!```
use crate::registers::{Cnf1, Cnf2, Cnf3, RxbCtrl};
use crate::status::OperationMode;
use embedded_time::duration::Nanoseconds;
use embedded_time::rate::Hertz;
use serde::{Deserialize, Serialize};

/// Max. value of the 6-bit baud rate prescaler
const MAX_PRESCALER: u8 = 0x3F;

/// Max. value of the 3-bit segment fields
const MAX_SEGMENT: u8 = 0x07;

/// Information processing time in TQ, lower limit of PS2 when BTLMODE is clear
const INFORMATION_PROCESSING_TIME: u32 = 2;

/// Entire configuration currently supported
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Configuration {
    pub bit_timing: BitTiming,

    /// Operating mode of both receive buffers
    pub receive_mode: ReceiveBufferMode,

    /// Mode the controller is switched to at the end of configuration
    pub mode: RequestMode,
}

/// Mode entered after configuration
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RequestMode {
    Normal,
    Loopback,
    ListenOnly,
}

impl Default for RequestMode {
    fn default() -> Self {
        Self::Normal
    }
}

impl RequestMode {
    pub fn to_operation_mode(self) -> OperationMode {
        match self {
            RequestMode::Normal => OperationMode::Normal,
            RequestMode::Loopback => OperationMode::Loopback,
            RequestMode::ListenOnly => OperationMode::ListenOnly,
        }
    }
}

/// Bit timing field does not fit its register width
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BitTimingError {
    /// Oscillator frequency of 0 Hz
    ZeroOscillator,
    /// Prescaler exceeds 6 bits
    PrescalerOverflow(u8),
    /// Propagation segment exceeds 3 bits
    PropagationSegmentOverflow(u8),
    /// Phase segment 1 exceeds 3 bits
    PhaseSegment1Overflow(u8),
    /// Phase segment 2 exceeds 3 bits
    PhaseSegment2Overflow(u8),
}

/// Validated bit timing, fields are stored in register encoding (length - 1)
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BitTiming {
    oscillator: u32,
    prescaler: u8,
    propagation_segment: u8,
    phase_segment1: u8,
    phase_segment2: u8,
    programmable_phase_segment2: bool,
}

impl Default for BitTiming {
    /// 16 MHz oscillator, TQ = 250 ns, 9 TQ per bit
    fn default() -> Self {
        Self {
            oscillator: 16_000_000,
            prescaler: 1,
            propagation_segment: 1,
            phase_segment1: 2,
            phase_segment2: 2,
            programmable_phase_segment2: false,
        }
    }
}

impl BitTiming {
    /// Creates a new bit timing from register field values
    pub fn new(
        oscillator: Hertz,
        prescaler: u8,
        propagation_segment: u8,
        phase_segment1: u8,
        phase_segment2: u8,
    ) -> Result<Self, BitTimingError> {
        if oscillator.0 == 0 {
            return Err(BitTimingError::ZeroOscillator);
        }

        if prescaler > MAX_PRESCALER {
            return Err(BitTimingError::PrescalerOverflow(prescaler));
        }

        if propagation_segment > MAX_SEGMENT {
            return Err(BitTimingError::PropagationSegmentOverflow(propagation_segment));
        }

        if phase_segment1 > MAX_SEGMENT {
            return Err(BitTimingError::PhaseSegment1Overflow(phase_segment1));
        }

        if phase_segment2 > MAX_SEGMENT {
            return Err(BitTimingError::PhaseSegment2Overflow(phase_segment2));
        }

        Ok(Self {
            oscillator: oscillator.0,
            prescaler,
            propagation_segment,
            phase_segment1,
            phase_segment2,
            programmable_phase_segment2: false,
        })
    }

    /// Sets CNF2.BTLMODE, so PS2 is determined by PHSEG2 instead of PHSEG1
    pub fn with_programmable_phase_segment2(mut self, enabled: bool) -> Self {
        self.programmable_phase_segment2 = enabled;
        self
    }

    pub fn oscillator(&self) -> Hertz {
        Hertz(self.oscillator)
    }

    /// Duration of one time quantum, saturates at `u32::MAX` ns
    pub fn time_quantum(&self) -> Nanoseconds {
        let nanos = 2 * (self.prescaler as u64 + 1) * 1_000_000_000 / self.oscillator as u64;

        Nanoseconds(u32::try_from(nanos).unwrap_or(u32::MAX))
    }

    /// Length of PS2 in TQ as applied by the device
    pub fn phase_segment2_quanta(&self) -> u32 {
        if self.programmable_phase_segment2 {
            self.phase_segment2 as u32 + 1
        } else {
            (self.phase_segment1 as u32 + 1).max(INFORMATION_PROCESSING_TIME)
        }
    }

    /// Nominal bit time in time quanta: sync segment + PropSeg + PS1 + PS2
    pub fn quanta_per_bit(&self) -> u32 {
        1 + (self.propagation_segment as u32 + 1) + (self.phase_segment1 as u32 + 1) + self.phase_segment2_quanta()
    }

    /// Resulting nominal bus bit rate
    pub fn bit_rate(&self) -> Hertz {
        let divisor = 2 * (self.prescaler as u32 + 1) * self.quanta_per_bit();

        Hertz(self.oscillator / divisor)
    }

    /// Encodes CNF1. SJW = 1 TQ
    pub(crate) fn as_cnf1(&self) -> u8 {
        Cnf1::new().with_brp(self.prescaler).into()
    }

    /// Encodes CNF2, single sample point
    pub(crate) fn as_cnf2(&self) -> u8 {
        Cnf2::new()
            .with_btlmode(self.programmable_phase_segment2)
            .with_phseg1(self.phase_segment1)
            .with_prseg(self.propagation_segment)
            .into()
    }

    /// Encodes CNF3
    pub(crate) fn as_cnf3(&self) -> u8 {
        Cnf3::new().with_phseg2(self.phase_segment2).into()
    }
}

/// Receive buffer operating mode (RXM bits)
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ReceiveBufferMode {
    /// Receives all valid messages matching the filters
    Filtered = 0b00,
    /// Turns masks/filters off, receives any message
    AnyMessage = 0b11,
}

impl Default for ReceiveBufferMode {
    fn default() -> Self {
        Self::AnyMessage
    }
}

impl ReceiveBufferMode {
    /// Bit-modify mask covering the RXM bits of RXBnCTRL
    pub(crate) fn register_mask() -> u8 {
        RxbCtrl::new().with_rxm(0b11).into()
    }

    /// Encodes the RXM bits of RXBnCTRL
    pub(crate) fn as_register(&self) -> u8 {
        RxbCtrl::new().with_rxm(*self as u8).into()
    }
}
