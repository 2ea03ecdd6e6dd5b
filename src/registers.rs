#![allow(unused_braces)]
use modular_bitfield_msb::prelude::*;

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Configuration register 1 (CNF1)
pub struct Cnf1 {
    /// Synchronization jump width length bits
    pub sjw: B2,
    /// Baud rate prescaler bits
    pub brp: B6,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Configuration register 2 (CNF2)
pub struct Cnf2 {
    /// PS2 bit time length bit
    pub btlmode: bool,
    /// Sample point configuration bit
    pub sam: bool,
    /// PS1 length bits
    pub phseg1: B3,
    /// Propagation segment length bits
    pub prseg: B3,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Configuration register 3 (CNF3)
pub struct Cnf3 {
    /// Start-of-frame signal bit
    pub sof: bool,
    /// Wake-up filter bit
    pub wakfil: bool,
    #[skip]
    __: B3,
    /// PS2 length bits
    pub phseg2: B3,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// CAN control register (CANCTRL)
pub struct CanCtrl {
    /// Request operation mode bits
    pub reqop: B3,
    /// Abort all pending transmissions bit
    pub abat: bool,
    /// One-shot mode bit
    pub osm: bool,
    /// CLKOUT pin enable bit
    pub clken: bool,
    /// CLKOUT pin prescaler bits
    pub clkpre: B2,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// CAN status register (CANSTAT)
pub struct CanStat {
    /// Operation mode bits
    pub opmod: B3,
    #[skip]
    __: B1,
    /// Interrupt flag code bits
    pub icod: B3,
    #[skip]
    ___: B1,
}

#[bitfield]
#[derive(Default)]
#[repr(u8)]
/// Receive buffer control register (RXBnCTRL), common bits of both buffers
pub struct RxbCtrl {
    #[skip]
    __: B1,
    /// Receive buffer operating mode bits
    pub rxm: B2,
    #[skip]
    ___: B1,
    /// Received remote transfer request bit
    pub rxrtr: bool,
    /// Buffer specific bits (rollover/filter hit)
    #[skip]
    ____: B3,
}
