use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{bit_fields::Feature, mnemonics, registers, Si24, Si24Error};
use crate::{
    event::{Event, EventHandler, EventKind},
    radio::TransceiverConfig,
    Mode, StatusFlags,
};

impl<SPI, DO, DELAY, EH> Si24<SPI, DO, DELAY, EH>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
    EH: EventHandler,
{
    /// Assemble a handle without touching the hardware.
    pub(crate) fn from_parts(
        spi: SPI,
        ce_pin: DO,
        delay_impl: DELAY,
        config: TransceiverConfig,
        handler: EH,
    ) -> Self {
        Self {
            _spi: spi,
            _ce_pin: ce_pin,
            _delay_impl: delay_impl,
            _handler: handler,
            _config: config,
            _buf: [0u8; 33],
            _status: StatusFlags::default(),
        }
    }

    /// Instantiate and configure a radio.
    ///
    /// - `spi` is the [`SpiDevice`] wired to the radio (SPI mode 0, at most 10 MHz).
    ///   The device is expected to manage the CSN pin.
    /// - `ce_pin` is the [`OutputPin`] connected to the radio's CE pin.
    /// - `delay_impl` is the [`DelayNs`] used to pace STATUS polls while sending.
    /// - `config` is validated, then written to the radio's registers.
    /// - `handler` is notified of every completion and error event.
    ///
    /// A receiver starts listening (CE active) before this returns.
    /// A transmitter is left in standby until [`send()`](fn@crate::radio::prelude::EsbRadio::send).
    ///
    /// Fails with [`Si24Error::Config`] (before any bus traffic) if `config` is invalid,
    /// or with the first bus error encountered; no registers are written after a failure.
    /// The peripherals are dropped on failure. Call [`TransceiverConfig::validate()`]
    /// beforehand to catch configuration errors while still owning them.
    pub fn initialize(
        spi: SPI,
        ce_pin: DO,
        delay_impl: DELAY,
        config: TransceiverConfig,
        handler: EH,
    ) -> Result<Self, Si24Error<SPI::Error, DO::Error>> {
        let mut radio = Self::from_parts(spi, ce_pin, delay_impl, config, handler);
        if let Err(e) = config.validate() {
            radio.emit(Event::error(EventKind::ConfigError, e.reason()));
            return Err(Si24Error::Config(e));
        }
        radio.configure()?;
        log::debug!(
            "radio configured as {} on channel {}",
            if radio.is_receiver() { "receiver" } else { "transmitter" },
            config.channel()
        );
        Ok(radio)
    }

    fn is_receiver(&self) -> bool {
        self._config.mode() == Mode::Receive
    }

    /// Write the whole configuration to the radio.
    ///
    /// CONFIG is written last so the radio only powers up once every other
    /// register holds its final value.
    fn configure(&mut self) -> Result<(), Si24Error<SPI::Error, DO::Error>> {
        let config = self._config;
        let is_rx = self.is_receiver();
        let mut config_reg = config.config_reg.with_power(true);
        let mut feature = Feature::new();

        if config.auto_ack() {
            self.spi_write_byte(registers::EN_AA, mnemonics::PIPE0)?;
            if !is_rx {
                self.spi_write_byte(registers::SETUP_RETR, config.setup_retry().into_bits())?;
            }
        } else {
            self.spi_write_byte(registers::EN_AA, 0)?;
            if !is_rx {
                feature.set_ask_no_ack(true);
            }
        }

        if config.dynamic_payloads() {
            self.spi_write_byte(registers::DYNPD, mnemonics::PIPE0)?;
            feature.set_dynamic_payloads(true);
        } else if is_rx {
            self.spi_write_byte(registers::RX_PW_P0, config.payload_length())?;
        }
        self.spi_write_byte(registers::FEATURE, feature.into_bits())?;

        self.spi_write_byte(registers::SETUP_AW, config.address_length() as u8 - 2)?;

        // the transmitter expects ACK packets on pipe 0
        if !is_rx && config.auto_ack() {
            self.spi_write_buf(registers::RX_ADDR_P0, config.address())?;
        }

        if is_rx {
            config_reg.set_is_rx(true);
            self.spi_write_byte(registers::EN_RXADDR, mnemonics::PIPE0)?;
            self.spi_write_buf(registers::RX_ADDR_P0, config.address())?;
        } else {
            self.spi_write_buf(registers::TX_ADDR, config.address())?;
        }

        self.spi_write_byte(registers::RF_SETUP, config.rf_setup.into_bits())?;
        self.spi_write_byte(registers::RF_CH, config.channel())?;

        self.spi_write_byte(registers::CONFIG, config_reg.into_bits())?;

        if is_rx {
            self.set_ce(true)?;
        }
        Ok(())
    }
}
