use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use crate::{
    event::EventHandler,
    radio::{prelude::EsbStatus, Si24, Si24Error},
    types::StatusFlags,
};

use super::{commands, registers};

impl<SPI, DO, DELAY, EH> EsbStatus for Si24<SPI, DO, DELAY, EH>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
    EH: EventHandler,
{
    type StatusErrorType = Si24Error<SPI::Error, DO::Error>;

    fn get_status_flags(&self) -> StatusFlags {
        self._status
    }

    fn clear_status_flags(&mut self, flags: StatusFlags) -> Result<(), Self::StatusErrorType> {
        self.spi_write_byte(registers::STATUS, flags.into_bits() & StatusFlags::IRQ_MASK)
    }

    fn update(&mut self) -> Result<(), Self::StatusErrorType> {
        self.spi_read(0, commands::NOP)
    }
}
