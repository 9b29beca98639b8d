use bitfield_struct::bitfield;

use crate::{CrcLength, DataRate, FifoState, TxPower};

/// The CONFIG register.
///
/// IRQ mask bits are left cleared; the driver polls STATUS and never relies on the IRQ pin.
#[bitfield(u8, order = Msb)]
#[derive(PartialEq, Eq)]
pub(crate) struct Config {
    #[bits(4)]
    _padding: u8,

    #[bits(2, access = None)]
    crc_length: u8,

    /// `PWR_UP`
    pub power: bool,

    /// `PRIM_RX`
    pub is_rx: bool,
}

impl Config {
    pub const fn crc_length(&self) -> CrcLength {
        CrcLength::from_bits(self.into_bits())
    }

    pub const fn with_crc_length(self, length: CrcLength) -> Self {
        Self::from_bits(self.into_bits() & !CrcLength::MASK | length.into_bits())
    }
}

/// The SETUP_RETR register.
#[bitfield(u8, order = Msb)]
#[derive(PartialEq, Eq)]
pub(crate) struct SetupRetry {
    /// The auto-retry delay, in steps of 250 microseconds.
    #[bits(4)]
    pub ard: u8,

    /// The auto-retry count.
    #[bits(4)]
    pub arc: u8,
}

/// The RF_SETUP register.
#[bitfield(u8, order = Msb)]
#[derive(PartialEq, Eq)]
pub(crate) struct RfSetup {
    #[bits(2)]
    _padding: u8,

    /// `RF_DR_LOW`, `PLL_LOCK` and `RF_DR_HIGH`
    #[bits(3, access = None)]
    data_rate: u8,

    /// `RF_PWR`
    #[bits(3, access = None)]
    tx_power: u8,
}

impl RfSetup {
    pub const fn data_rate(&self) -> DataRate {
        DataRate::from_bits(self.into_bits())
    }

    pub const fn with_data_rate(self, data_rate: DataRate) -> Self {
        Self::from_bits(self.into_bits() & !DataRate::MASK | data_rate.into_bits())
    }

    pub const fn tx_power(&self) -> TxPower {
        TxPower::from_bits(self.into_bits())
    }

    pub const fn with_tx_power(self, level: TxPower) -> Self {
        Self::from_bits(self.into_bits() & !TxPower::MASK | level.into_bits())
    }
}

/// The FEATURE register.
#[bitfield(u8, order = Msb)]
#[derive(PartialEq, Eq)]
pub(crate) struct Feature {
    #[bits(5)]
    _padding: u8,

    /// `EN_DPL`
    pub dynamic_payloads: bool,

    /// `EN_ACK_PAY` is never used by this driver.
    #[bits(1)]
    _ack_payloads: u8,

    /// `EN_DYN_ACK`: allows the `W_TX_PAYLOAD_NOACK` command.
    pub ask_no_ack: bool,
}

/// The FIFO_STATUS register.
#[bitfield(u8, order = Msb)]
#[derive(PartialEq, Eq)]
pub(crate) struct FifoStatus {
    #[bits(2)]
    _padding: u8,

    pub tx_full: bool,

    pub tx_empty: bool,

    #[bits(2)]
    _reserved: u8,

    pub rx_full: bool,

    pub rx_empty: bool,
}

impl FifoStatus {
    pub const fn state(&self, about_tx: bool) -> FifoState {
        let (full, empty) = if about_tx {
            (self.tx_full(), self.tx_empty())
        } else {
            (self.rx_full(), self.rx_empty())
        };
        match (full, empty) {
            (_, true) => FifoState::Empty,
            (true, false) => FifoState::Full,
            (false, false) => FifoState::Occupied,
        }
    }
}
