use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use crate::{
    event::{Event, EventHandler, EventKind},
    radio::{prelude::EsbFifo, Si24, Si24Error},
    FifoState,
};

use super::{bit_fields::FifoStatus, commands, mnemonics, registers};

impl<SPI, DO, DELAY, EH> EsbFifo for Si24<SPI, DO, DELAY, EH>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
    EH: EventHandler,
{
    type FifoErrorType = Si24Error<SPI::Error, DO::Error>;

    fn available(&mut self) -> Result<bool, Self::FifoErrorType> {
        Ok(!self.fifo_status()?.rx_empty())
    }

    fn flush_rx(&mut self) -> Result<(), Self::FifoErrorType> {
        self.spi_read(0, commands::FLUSH_RX)
    }

    fn flush_tx(&mut self) -> Result<(), Self::FifoErrorType> {
        self.spi_read(0, commands::FLUSH_TX)
    }

    fn get_fifo_state(&mut self, about_tx: bool) -> Result<FifoState, Self::FifoErrorType> {
        Ok(self.fifo_status()?.state(about_tx))
    }
}

impl<SPI, DO, DELAY, EH> Si24<SPI, DO, DELAY, EH>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
    EH: EventHandler,
{
    #[track_caller]
    fn fifo_status(&mut self) -> Result<FifoStatus, Si24Error<SPI::Error, DO::Error>> {
        Ok(FifoStatus::from_bits(
            self.read_register(registers::FIFO_STATUS)?,
        ))
    }

    /// The length of the frame at the head of the RX FIFO.
    ///
    /// Returns `None` if the radio reports an impossible dynamic payload width,
    /// which means the frame is corrupted.
    fn rx_frame_length(&mut self) -> Result<Option<u8>, Si24Error<SPI::Error, DO::Error>> {
        if !self._config.dynamic_payloads() {
            return Ok(Some(self._config.payload_length()));
        }
        self.spi_read(1, commands::R_RX_PL_WID)?;
        let width = self._buf[1];
        if width == 0 || width > mnemonics::MAX_PAYLOAD {
            return Ok(None);
        }
        Ok(Some(width))
    }

    /// Copy frames from the RX FIFO into `buf` until either runs out.
    ///
    /// Returns the number of bytes copied and whether the RX FIFO ended empty.
    /// Every frame is read from the radio in full (which pops it from the FIFO);
    /// only the part that fits in `buf` is kept.
    pub(super) fn drain_rx(
        &mut self,
        buf: &mut [u8],
    ) -> Result<(usize, bool), Si24Error<SPI::Error, DO::Error>> {
        let mut offset = 0;
        let mut fifo = self.fifo_status()?;
        while !fifo.rx_empty() && offset < buf.len() {
            let frame_len = match self.rx_frame_length()? {
                Some(len) => len,
                None => {
                    log::warn!("discarding RX FIFO: invalid dynamic payload width");
                    self.flush_rx()?;
                    self.emit(Event::error(
                        EventKind::CrcError,
                        "invalid dynamic payload width",
                    ));
                    return Ok((offset, true));
                }
            };
            let copy_len = (buf.len() - offset).min(frame_len as usize);
            self.spi_read(frame_len, commands::R_RX_PAYLOAD)?;
            buf[offset..offset + copy_len].copy_from_slice(&self._buf[1..copy_len + 1]);
            offset += copy_len;
            log::trace!("drained a {} byte frame ({} bytes kept)", frame_len, copy_len);
            fifo = self.fifo_status()?;
        }
        Ok((offset, fifo.rx_empty()))
    }
}
