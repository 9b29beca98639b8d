use core::fmt::{Display, Formatter, Result};

use crate::radio::si24::bit_fields::{Config, RfSetup, SetupRetry};
use crate::radio::si24::mnemonics;
use crate::{CrcLength, DataRate, Mode, TxPower};

/// Margin added to the auto-retry budget when deriving the default send deadline.
///
/// It covers PLL settling (130 us), the on-air time of a full frame at
/// 250 Kbps and the ACK wait of the final attempt.
const TX_TIMEOUT_MARGIN_US: u32 = 1000;

/// A reason a [`TransceiverConfig`] was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The hardware address must be 3, 4 or 5 bytes long.
    AddressLength(usize),
    /// The fixed payload length must be in range [1, 32].
    PayloadLength(u8),
    /// The auto-retry delay must be in range [1, 15] (units of 250 us).
    RetryDelay(u8),
    /// The auto-retry count must be in range [1, 15].
    RetryCount(u8),
    /// The channel must be in range [0, 125].
    Channel(u8),
}

impl ConfigError {
    /// The constraint that was violated, without the offending value.
    pub const fn reason(&self) -> &'static str {
        match self {
            ConfigError::AddressLength(_) => "address must be 3 to 5 bytes long",
            ConfigError::PayloadLength(_) => "payload length must be 1 to 32 bytes",
            ConfigError::RetryDelay(_) => "retry delay must be 1 to 15",
            ConfigError::RetryCount(_) => "retry count must be 1 to 15",
            ConfigError::Channel(_) => "channel must be 0 to 125",
        }
    }

    const fn value(&self) -> usize {
        match *self {
            ConfigError::AddressLength(n) => n,
            ConfigError::PayloadLength(n)
            | ConfigError::RetryDelay(n)
            | ConfigError::RetryCount(n)
            | ConfigError::Channel(n) => n as usize,
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}, got {}", self.reason(), self.value())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=str}, got {=usize}", self.reason(), self.value())
    }
}

/// The static configuration of a transceiver, applied once by
/// [`Si24::initialize()`](fn@crate::radio::Si24::initialize).
///
/// This struct follows a builder pattern. Since all fields are private, users should
/// start with the [`TransceiverConfig::default`] constructor, then mutate the object accordingly.
/// ```
/// use si24::{radio::TransceiverConfig, Mode};
///
/// let config = TransceiverConfig::default()
///     .with_mode(Mode::Send)
///     .with_address(&[0xAB, 0xCD, 0xEF]);
/// assert_eq!(config.address(), &[0xAB, 0xCD, 0xEF]);
/// ```
///
/// Ranges are not clamped by the builder; an out-of-range value is reported by
/// [`TransceiverConfig::validate()`] when the radio is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransceiverConfig {
    mode: Mode,
    auto_ack: bool,
    dynamic_payloads: bool,
    pub(crate) config_reg: Config,
    retry_delay: u8,
    retry_count: u8,
    pub(crate) rf_setup: RfSetup,
    payload_length: u8,
    channel: u8,
    address: [u8; 5],
    address_length: usize,
    tx_timeout: Option<u32>,
}

impl Default for TransceiverConfig {
    /// Instantiate a [`TransceiverConfig`] object with library defaults.
    ///
    /// | feature | default value |
    /// |--------:|:--------------|
    /// | [`TransceiverConfig::mode()`] | [`Mode::Receive`] |
    /// | [`TransceiverConfig::auto_ack()`] | `true` |
    /// | [`TransceiverConfig::crc_length()`] | [`CrcLength::Bit16`] |
    /// | [`TransceiverConfig::dynamic_payloads()`] | `false` |
    /// | [`TransceiverConfig::data_rate()`] | [`DataRate::Mbps1`] |
    /// | [`TransceiverConfig::tx_power()`] | [`TxPower::Plus7dBm`] |
    /// | [`TransceiverConfig::payload_length()`] | `32` |
    /// | [`TransceiverConfig::auto_retry_delay()`] | `5` (1500 us) |
    /// | [`TransceiverConfig::auto_retry_count()`] | `15` |
    /// | [`TransceiverConfig::address()`] | `[0xE7; 5]` |
    /// | [`TransceiverConfig::channel()`] | `76` |
    /// | [`TransceiverConfig::tx_timeout()`] | derived from the auto-retry settings |
    fn default() -> Self {
        Self {
            mode: Mode::Receive,
            auto_ack: true,
            dynamic_payloads: false,
            config_reg: Config::new().with_crc_length(CrcLength::Bit16),
            retry_delay: 5,
            retry_count: 15,
            rf_setup: RfSetup::new()
                .with_data_rate(DataRate::Mbps1)
                .with_tx_power(TxPower::Plus7dBm),
            payload_length: mnemonics::MAX_PAYLOAD,
            channel: 76,
            address: [0xE7; 5],
            address_length: 5,
            tx_timeout: None,
        }
    }
}

impl TransceiverConfig {
    /// Returns the value set by [`TransceiverConfig::with_mode()`].
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Configure the radio as a transmitter or a receiver.
    pub fn with_mode(self, mode: Mode) -> Self {
        Self { mode, ..self }
    }

    /// Returns the value set by [`TransceiverConfig::with_auto_ack()`].
    pub const fn auto_ack(&self) -> bool {
        self.auto_ack
    }

    /// Enable or disable the radio's automatic acknowledgement (and retry) feature.
    ///
    /// When disabled, a transmitter sends every frame with the "no ACK" command.
    pub fn with_auto_ack(self, enable: bool) -> Self {
        Self {
            auto_ack: enable,
            ..self
        }
    }

    /// Returns the value set by [`TransceiverConfig::with_crc_length()`].
    pub const fn crc_length(&self) -> CrcLength {
        self.config_reg.crc_length()
    }

    /// The Cyclical Redundancy Checksum (CRC) length.
    pub fn with_crc_length(self, length: CrcLength) -> Self {
        Self {
            config_reg: self.config_reg.with_crc_length(length),
            ..self
        }
    }

    /// Returns the value set by [`TransceiverConfig::with_dynamic_payloads()`].
    pub const fn dynamic_payloads(&self) -> bool {
        self.dynamic_payloads
    }

    /// Enable or disable dynamically sized payloads.
    ///
    /// When enabled, [`TransceiverConfig::payload_length()`] is ignored.
    pub fn with_dynamic_payloads(self, enable: bool) -> Self {
        Self {
            dynamic_payloads: enable,
            ..self
        }
    }

    /// Returns the value set by [`TransceiverConfig::with_data_rate()`].
    pub const fn data_rate(&self) -> DataRate {
        self.rf_setup.data_rate()
    }

    /// The Data Rate (over the air).
    pub fn with_data_rate(self, data_rate: DataRate) -> Self {
        Self {
            rf_setup: self.rf_setup.with_data_rate(data_rate),
            ..self
        }
    }

    /// Returns the value set by [`TransceiverConfig::with_tx_power()`].
    pub const fn tx_power(&self) -> TxPower {
        self.rf_setup.tx_power()
    }

    /// The transmit power level.
    pub fn with_tx_power(self, level: TxPower) -> Self {
        Self {
            rf_setup: self.rf_setup.with_tx_power(level),
            ..self
        }
    }

    /// Returns the value set by [`TransceiverConfig::with_payload_length()`].
    pub const fn payload_length(&self) -> u8 {
        self.payload_length
    }

    /// The static payload length, used only when dynamic payloads are disabled.
    ///
    /// Valid range is [1, 32].
    pub fn with_payload_length(self, length: u8) -> Self {
        Self {
            payload_length: length,
            ..self
        }
    }

    /// The auto-retry feature's `delay` (set via [`TransceiverConfig::with_auto_retries()`])
    pub const fn auto_retry_delay(&self) -> u8 {
        self.retry_delay
    }

    /// The auto-retry feature's `count` (set via [`TransceiverConfig::with_auto_retries()`])
    pub const fn auto_retry_count(&self) -> u8 {
        self.retry_count
    }

    /// Set the auto-retry feature's `delay` and `count` parameters.
    ///
    /// `delay` is written as is to the ARD field: the radio waits
    /// `250 * (delay + 1)` microseconds between attempts.
    /// Both parameters are valid in range [1, 15].
    pub fn with_auto_retries(self, delay: u8, count: u8) -> Self {
        Self {
            retry_delay: delay,
            retry_count: count,
            ..self
        }
    }

    /// The SETUP_RETR register image. Only meaningful for a validated config.
    pub(crate) fn setup_retry(&self) -> SetupRetry {
        SetupRetry::new()
            .with_ard(self.retry_delay & 0xF)
            .with_arc(self.retry_count & 0xF)
    }

    /// Returns the value set by [`TransceiverConfig::with_channel()`].
    pub const fn channel(&self) -> u8 {
        self.channel
    }

    /// Set the channel (over the air frequency).
    ///
    /// Valid range is [0, 125].
    /// The radio's frequency can be determined by the following equation:
    /// ```text
    /// frequency (in MHz) = channel + 2400
    /// ```
    pub fn with_channel(self, value: u8) -> Self {
        Self {
            channel: value,
            ..self
        }
    }

    /// Returns the hardware address set by [`TransceiverConfig::with_address()`].
    ///
    /// The returned slice is truncated to 5 bytes.
    pub fn address(&self) -> &[u8] {
        &self.address[..self.address_length.min(5)]
    }

    /// The hardware address width, in bytes.
    pub const fn address_length(&self) -> usize {
        self.address_length
    }

    /// Set the hardware address used for the TX address (transmitter) or the
    /// pipe 0 RX address (receiver).
    ///
    /// The address width written to the radio is the length of `address`,
    /// which must be 3, 4 or 5 bytes. Bytes are sent LSByte first, so
    /// `address[0]` is the least significant byte.
    pub fn with_address(self, address: &[u8]) -> Self {
        let len = address.len().min(5);
        let mut stored = [0u8; 5];
        stored[..len].copy_from_slice(&address[..len]);
        Self {
            address: stored,
            address_length: address.len(),
            ..self
        }
    }

    /// Returns the deadline for a single frame's transmission, in microseconds.
    ///
    /// Unless set with [`TransceiverConfig::with_tx_timeout()`], this is the
    /// worst case duration of all auto-retry attempts plus a fixed margin.
    pub const fn tx_timeout(&self) -> u32 {
        match self.tx_timeout {
            Some(timeout) => timeout,
            None => {
                if self.auto_ack {
                    let delay = (self.retry_delay as u32 + 1) * 250;
                    let attempts = self.retry_count as u32 + 1;
                    delay * attempts + TX_TIMEOUT_MARGIN_US
                } else {
                    TX_TIMEOUT_MARGIN_US
                }
            }
        }
    }

    /// Override the deadline for a single frame's transmission, in microseconds.
    pub fn with_tx_timeout(self, micros: u32) -> Self {
        Self {
            tx_timeout: Some(micros),
            ..self
        }
    }

    /// The frame size used to fragment an outgoing buffer.
    pub(crate) const fn frame_length(&self) -> u8 {
        if self.dynamic_payloads {
            mnemonics::MAX_PAYLOAD
        } else {
            self.payload_length
        }
    }

    /// Check every range constraint.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if !(3..=5).contains(&self.address_length) {
            return Err(ConfigError::AddressLength(self.address_length));
        }
        if !(1..=mnemonics::MAX_PAYLOAD).contains(&self.payload_length) {
            return Err(ConfigError::PayloadLength(self.payload_length));
        }
        if self.auto_ack {
            if !(1..=15).contains(&self.retry_delay) {
                return Err(ConfigError::RetryDelay(self.retry_delay));
            }
            if !(1..=15).contains(&self.retry_count) {
                return Err(ConfigError::RetryCount(self.retry_count));
            }
        }
        if self.channel > 125 {
            return Err(ConfigError::Channel(self.channel));
        }
        Ok(())
    }
}
