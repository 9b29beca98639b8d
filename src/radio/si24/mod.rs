use core::fmt::{Debug, Display, Formatter};

use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

pub(crate) mod bit_fields;
mod constants;
mod fifo;
mod init;
mod radio;
mod status;
pub use constants::{commands, mnemonics, registers};

use crate::{
    event::{Event, EventHandler, EventKind},
    radio::{ConfigError, TransceiverConfig},
    StatusFlags,
};

/// An collection of error types to describe hardware malfunctions and refused operations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Si24Error<SPI, DO> {
    /// Represents a SPI transaction error.
    Spi(SPI),
    /// Represents a DigitalOutput error (from the CE pin).
    Gpo(DO),
    /// The [`TransceiverConfig`] given to [`Si24::initialize()`] is invalid.
    Config(ConfigError),
    /// The operation does not apply to the configured [`Mode`](enum@crate::Mode),
    /// e.g. sending from a receiver.
    WrongMode,
    /// The TX FIFO is full. Nothing was sent.
    TxFull,
    /// The radio did not report completion of a frame before the configured deadline.
    ///
    /// `sent` counts the bytes of the frames that were transmitted before the failure.
    Timeout { sent: usize },
    /// The radio exhausted its auto-retry counter without receiving an ACK.
    ///
    /// `sent` counts the bytes of the frames that were acknowledged before the failure.
    MaxRetries { sent: usize },
}

impl<SPI, DO> Si24Error<SPI, DO> {
    /// The number of bytes delivered before a failed [`send()`](fn@crate::radio::prelude::EsbRadio::send).
    ///
    /// A caller may resume a transfer from this offset.
    pub const fn bytes_sent(&self) -> usize {
        match self {
            Si24Error::Timeout { sent } | Si24Error::MaxRetries { sent } => *sent,
            _ => 0,
        }
    }
}

impl<SPI: Debug, DO: Debug> Display for Si24Error<SPI, DO> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Si24Error::Spi(e) => write!(f, "SPI transaction failed: {e:?}"),
            Si24Error::Gpo(e) => write!(f, "CE pin failed: {e:?}"),
            Si24Error::Config(e) => write!(f, "invalid configuration: {e}"),
            Si24Error::WrongMode => write!(f, "operation not available in the configured mode"),
            Si24Error::TxFull => write!(f, "TX FIFO is full"),
            Si24Error::Timeout { sent } => write!(f, "timed out after sending {sent} bytes"),
            Si24Error::MaxRetries { sent } => {
                write!(f, "max retries exceeded after sending {sent} bytes")
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl<SPI, DO> defmt::Format for Si24Error<SPI, DO> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Si24Error::Spi(_) => defmt::write!(fmt, "SPI transaction failed"),
            Si24Error::Gpo(_) => defmt::write!(fmt, "CE pin failed"),
            Si24Error::Config(e) => defmt::write!(fmt, "invalid configuration: {}", e),
            Si24Error::WrongMode => {
                defmt::write!(fmt, "operation not available in the configured mode")
            }
            Si24Error::TxFull => defmt::write!(fmt, "TX FIFO is full"),
            Si24Error::Timeout { sent } => {
                defmt::write!(fmt, "timed out after sending {=usize} bytes", sent)
            }
            Si24Error::MaxRetries { sent } => {
                defmt::write!(fmt, "max retries exceeded after sending {=usize} bytes", sent)
            }
        }
    }
}

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
impl<SPI: Debug, DO: Debug> std::error::Error for Si24Error<SPI, DO> {}

/// A handle to one SI24R1 (or nRF24L01) transceiver.
///
/// The handle owns the [`SpiDevice`] it talks through, the CE pin, a [`DelayNs`]
/// time source used to measure send deadlines, and the [`EventHandler`] that is
/// notified of every completion and error.
///
/// The radio's role is fixed by the [`TransceiverConfig`] given to
/// [`Si24::initialize()`]; see the [`EsbRadio`](trait@crate::radio::prelude::EsbRadio)
/// trait for sending and receiving.
///
/// All operations take `&mut self` and block until done. Sharing one handle
/// across threads requires external synchronization.
pub struct Si24<SPI, DO, DELAY, EH> {
    _spi: SPI,
    _ce_pin: DO,
    _delay_impl: DELAY,
    _handler: EH,
    _config: TransceiverConfig,
    _buf: [u8; 33],
    _status: StatusFlags,
}

impl<SPI, DO, DELAY, EH> Si24<SPI, DO, DELAY, EH>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
    EH: EventHandler,
{
    /// The configuration this radio was initialized with.
    pub fn config(&self) -> &TransceiverConfig {
        &self._config
    }

    /// Tear down the handle, giving back the injected peripherals and event handler.
    ///
    /// The radio is left as is; call [`reset()`](fn@crate::radio::prelude::EsbRadio::reset)
    /// first for a clean state.
    pub fn release(self) -> (SPI, DO, DELAY, EH) {
        (self._spi, self._ce_pin, self._delay_impl, self._handler)
    }

    fn emit(&mut self, event: Event) {
        if event.kind.is_error() {
            log::warn!("{}", event);
        } else {
            log::debug!("{}", event);
        }
        self._handler.handle(&event);
    }

    #[track_caller]
    fn spi_transfer(&mut self, len: u8) -> Result<(), Si24Error<SPI::Error, DO::Error>> {
        log::trace!("SPI command {:#04X} ({} bytes)", self._buf[0], len);
        if let Err(e) = self._spi.transfer_in_place(&mut self._buf[..len as usize]) {
            self.emit(Event::error(EventKind::BusError, "SPI transaction failed"));
            return Err(Si24Error::Spi(e));
        }
        self._status = StatusFlags::from_bits(self._buf[0]);
        Ok(())
    }

    /// Clock out `command` followed by `len` zero bytes.
    /// The response (after the STATUS byte) is left in `self._buf[1..=len]`.
    ///
    /// This is also used to write SPI commands that consist of 1 byte:
    /// ```ignore
    /// self.spi_read(0, commands::NOP)?;
    /// // STATUS register is now stored in self._status
    /// ```
    #[track_caller]
    fn spi_read(&mut self, len: u8, command: u8) -> Result<(), Si24Error<SPI::Error, DO::Error>> {
        self._buf[0] = command;
        self._buf[1..(len as usize + 1)].fill(0);
        self.spi_transfer(len + 1)
    }

    #[track_caller]
    fn read_register(&mut self, register: u8) -> Result<u8, Si24Error<SPI::Error, DO::Error>> {
        self.spi_read(1, commands::R_REGISTER | register)?;
        Ok(self._buf[1])
    }

    #[track_caller]
    fn spi_write_byte(
        &mut self,
        register: u8,
        byte: u8,
    ) -> Result<(), Si24Error<SPI::Error, DO::Error>> {
        self._buf[0] = register | commands::W_REGISTER;
        self._buf[1] = byte;
        self.spi_transfer(2)
    }

    #[track_caller]
    fn spi_write_buf(
        &mut self,
        register: u8,
        buf: &[u8],
    ) -> Result<(), Si24Error<SPI::Error, DO::Error>> {
        self._buf[0] = register | commands::W_REGISTER;
        let buf_len = buf.len();
        self._buf[1..(buf_len + 1)].copy_from_slice(buf);
        self.spi_transfer(buf_len as u8 + 1)
    }

    #[track_caller]
    fn set_ce(&mut self, active: bool) -> Result<(), Si24Error<SPI::Error, DO::Error>> {
        let result = if active {
            self._ce_pin.set_high()
        } else {
            self._ce_pin.set_low()
        };
        if let Err(e) = result {
            self.emit(Event::error(EventKind::BusError, "CE pin failed"));
            return Err(Si24Error::Gpo(e));
        }
        Ok(())
    }
}
