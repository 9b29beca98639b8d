//! This module defines the register-level value types used by the driver.
//! These types are meant to be agnostic of the bus implementation.

use core::{
    fmt::{Display, Formatter, Result},
    write,
};

use bitfield_struct::bitfield;

/// The role a transceiver is configured for.
///
/// The role is fixed for the lifetime of a [`Si24`](struct@crate::radio::Si24) handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Primary transmitter (PTX).
    Send,
    /// Primary receiver (PRX).
    Receive,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Mode {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Mode::Send => defmt::write!(fmt, "Send"),
            Mode::Receive => defmt::write!(fmt, "Receive"),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Mode::Send => write!(f, "Send"),
            Mode::Receive => write!(f, "Receive"),
        }
    }
}

/// Transmit power of the SI24R1 power amplifier.
///
/// The SI24R1 uses all 3 `RF_PWR` bits of the RF_SETUP register, giving 8 levels.
/// On a genuine nRF24L01 only the 2 upper bits are significant, so the levels
/// collapse pairwise onto its 4 levels (-18, -12, -6 and 0 dBm).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxPower {
    /// -12 dBm
    Minus12dBm,
    /// -6 dBm
    Minus6dBm,
    /// -4 dBm
    Minus4dBm,
    /// 0 dBm
    ZerodBm,
    /// 1 dBm
    Plus1dBm,
    /// 3 dBm
    Plus3dBm,
    /// 4 dBm
    Plus4dBm,
    /// 7 dBm
    Plus7dBm,
}

impl TxPower {
    pub(crate) const MASK: u8 = 7;

    pub(crate) const fn into_bits(self) -> u8 {
        match self {
            TxPower::Minus12dBm => 0,
            TxPower::Minus6dBm => 1,
            TxPower::Minus4dBm => 2,
            TxPower::ZerodBm => 3,
            TxPower::Plus1dBm => 4,
            TxPower::Plus3dBm => 5,
            TxPower::Plus4dBm => 6,
            TxPower::Plus7dBm => 7,
        }
    }

    pub(crate) const fn from_bits(value: u8) -> Self {
        match value & Self::MASK {
            0 => TxPower::Minus12dBm,
            1 => TxPower::Minus6dBm,
            2 => TxPower::Minus4dBm,
            3 => TxPower::ZerodBm,
            4 => TxPower::Plus1dBm,
            5 => TxPower::Plus3dBm,
            6 => TxPower::Plus4dBm,
            _ => TxPower::Plus7dBm,
        }
    }

    /// The nominal output power in dBm.
    pub const fn dbm(self) -> i8 {
        match self {
            TxPower::Minus12dBm => -12,
            TxPower::Minus6dBm => -6,
            TxPower::Minus4dBm => -4,
            TxPower::ZerodBm => 0,
            TxPower::Plus1dBm => 1,
            TxPower::Plus3dBm => 3,
            TxPower::Plus4dBm => 4,
            TxPower::Plus7dBm => 7,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TxPower {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=i8} dBm", self.dbm())
    }
}

impl Display for TxPower {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{} dBm", self.dbm())
    }
}

/// How fast data moves through the air. Units are in bits per second (bps).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataRate {
    /// represents 1 Mbps
    Mbps1,
    /// represents 2 Mbps
    Mbps2,
    /// represents 250 Kbps
    Kbps250,
}

impl DataRate {
    pub(crate) const MASK: u8 = 0x28;

    pub(crate) const fn into_bits(self) -> u8 {
        match self {
            DataRate::Mbps1 => 0,
            DataRate::Mbps2 => 0x8,
            DataRate::Kbps250 => 0x20,
        }
    }
    pub(crate) const fn from_bits(value: u8) -> Self {
        match value & Self::MASK {
            0x8 => DataRate::Mbps2,
            0x20 => DataRate::Kbps250,
            _ => DataRate::Mbps1,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DataRate {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            DataRate::Mbps1 => defmt::write!(fmt, "1 Mbps"),
            DataRate::Mbps2 => defmt::write!(fmt, "2 Mbps"),
            DataRate::Kbps250 => defmt::write!(fmt, "250 Kbps"),
        }
    }
}

impl Display for DataRate {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            DataRate::Mbps1 => write!(f, "1 Mbps"),
            DataRate::Mbps2 => write!(f, "2 Mbps"),
            DataRate::Kbps250 => write!(f, "250 Kbps"),
        }
    }
}

/// The length of a CRC checksum that is used (if any).
///
/// Cyclical Redundancy Checking (CRC) is commonly used to ensure data integrity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrcLength {
    /// represents no CRC checksum is used
    Disabled,
    /// represents CRC 8 bit checksum is used
    Bit8,
    /// represents CRC 16 bit checksum is used
    Bit16,
}

impl CrcLength {
    /// `EN_CRC | CRCO` in the CONFIG register.
    pub(crate) const MASK: u8 = 0b1100;

    pub(crate) const fn into_bits(self) -> u8 {
        match self {
            CrcLength::Disabled => 0,
            CrcLength::Bit8 => 8,
            CrcLength::Bit16 => 12,
        }
    }
    pub(crate) const fn from_bits(value: u8) -> Self {
        match value & Self::MASK {
            0 | 4 => CrcLength::Disabled,
            8 => CrcLength::Bit8,
            _ => CrcLength::Bit16,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CrcLength {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            CrcLength::Disabled => defmt::write!(fmt, "disabled"),
            CrcLength::Bit8 => defmt::write!(fmt, "8 bit"),
            CrcLength::Bit16 => defmt::write!(fmt, "16 bit"),
        }
    }
}

impl Display for CrcLength {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            CrcLength::Disabled => write!(f, "disabled"),
            CrcLength::Bit8 => write!(f, "8 bit"),
            CrcLength::Bit16 => write!(f, "16 bit"),
        }
    }
}

/// The possible states of a FIFO.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FifoState {
    /// Represent the state of a FIFO when it is full.
    Full,
    /// Represent the state of a FIFO when it is empty.
    Empty,
    /// Represent the state of a FIFO when it is not full but not empty either.
    Occupied,
}

#[cfg(feature = "defmt")]
impl defmt::Format for FifoState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            FifoState::Empty => defmt::write!(fmt, "Empty"),
            FifoState::Full => defmt::write!(fmt, "Full"),
            FifoState::Occupied => defmt::write!(fmt, "Occupied"),
        }
    }
}

impl Display for FifoState {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            FifoState::Empty => write!(f, "Empty"),
            FifoState::Full => write!(f, "Full"),
            FifoState::Occupied => write!(f, "Occupied"),
        }
    }
}

/// The STATUS register, as clocked out in the first byte of every bus transaction.
///
/// Writing a flag back to the STATUS register clears the corresponding latch.
/// Use [`StatusFlags::default`] to instantiate all flags set to false.
/// Use [`StatusFlags::new`] to instantiate all latches set to true.
#[bitfield(u8, new = false, order = Msb)]
#[derive(PartialEq, Eq)]
pub struct StatusFlags {
    #[bits(1)]
    _padding: u8,

    /// "RX Data Ready": at least one frame arrived in the RX FIFO.
    #[bits(1, access = RO)]
    pub rx_dr: bool,

    /// "TX Data Sent": a frame left the TX FIFO (and was acknowledged, if auto-ack is on).
    #[bits(1, access = RO)]
    pub tx_ds: bool,

    /// "Maximum retransmits": the auto-retry counter was exhausted.
    #[bits(1, access = RO)]
    pub max_rt: bool,

    /// The pipe number of the frame at the head of the RX FIFO (7 when empty).
    #[bits(3, access = RO)]
    pub rx_pipe: u8,

    /// The TX FIFO has no free slot left.
    #[bits(1, access = RO)]
    pub tx_full: bool,
}

#[cfg(feature = "defmt")]
impl defmt::Format for StatusFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "StatusFlags rx_dr: {}, tx_ds: {}, max_rt: {}, tx_full: {}",
            self.rx_dr(),
            self.tx_ds(),
            self.max_rt(),
            self.tx_full()
        )
    }
}

impl StatusFlags {
    /// A mask to isolate only the latched flags.
    pub(crate) const IRQ_MASK: u8 = 0x70;

    /// A convenience constructor similar to [`StatusFlags::default`] except
    /// all 3 latches are set to `true`.
    pub fn new() -> Self {
        Self::from_bits(Self::IRQ_MASK)
    }

    /// Set the "RX Data Ready" latch.
    pub fn with_rx_dr(self, flag: bool) -> Self {
        self.with_latch(Self::RX_DR_OFFSET, flag)
    }

    /// Set the "TX Data Sent" latch.
    pub fn with_tx_ds(self, flag: bool) -> Self {
        self.with_latch(Self::TX_DS_OFFSET, flag)
    }

    /// Set the "Maximum retransmits" latch.
    pub fn with_max_rt(self, flag: bool) -> Self {
        self.with_latch(Self::MAX_RT_OFFSET, flag)
    }

    fn with_latch(self, offset: usize, flag: bool) -> Self {
        let new_val = self.into_bits() & !(1 << offset);
        Self::from_bits(new_val | ((flag as u8) << offset))
    }
}

impl Display for StatusFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "StatusFlags rx_dr: {}, tx_ds: {}, max_rt: {}, tx_full: {}",
            self.rx_dr(),
            self.tx_ds(),
            self.max_rt(),
            self.tx_full()
        )
    }
}
