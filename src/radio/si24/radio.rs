use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{commands, mnemonics, registers, Si24, Si24Error};
use crate::{
    event::{Event, EventHandler, EventKind},
    radio::prelude::{EsbFifo, EsbRadio},
    Mode, StatusFlags,
};

/// Time between two STATUS polls while waiting for a frame to leave.
const POLL_INTERVAL_US: u32 = 10;

/// How the wait for a transmitted frame ended.
enum TxOutcome {
    Sent,
    MaxRetries,
    TimedOut,
}

impl<SPI, DO, DELAY, EH> EsbRadio for Si24<SPI, DO, DELAY, EH>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
    EH: EventHandler,
{
    type RadioErrorType = Si24Error<SPI::Error, DO::Error>;

    fn is_rx(&self) -> bool {
        self._config.mode() == Mode::Receive
    }

    /// See [`EsbRadio::send()`] for implementation-agnostic detail.
    ///
    /// Each frame is loaded in the TX FIFO and the CE pin is activated, then
    /// STATUS is polled every 10 microseconds until the radio reports the
    /// outcome or [`TransceiverConfig::tx_timeout()`](fn@crate::radio::TransceiverConfig::tx_timeout)
    /// elapses. The CE pin is deactivated once all frames are sent.
    fn send(&mut self, buf: &[u8]) -> Result<usize, Self::RadioErrorType> {
        if self.is_rx() {
            return Err(Si24Error::WrongMode);
        }
        self.spi_read(0, commands::NOP)?;
        if self._status.tx_full() {
            self.emit(Event::new(EventKind::TxFull));
            return Err(Si24Error::TxFull);
        }

        let mut sent = 0;
        for frame in buf.chunks(self._config.frame_length() as usize) {
            self.write_payload(frame)?;
            self.set_ce(true)?;
            match self.wait_for_tx()? {
                TxOutcome::Sent => {
                    self.spi_write_byte(registers::STATUS, mnemonics::MASK_TX_DS)?;
                    sent += frame.len();
                }
                TxOutcome::MaxRetries => {
                    self.emit(Event::error(
                        EventKind::MaxRetriesExceeded,
                        "no ACK received",
                    ));
                    self.reset()?;
                    return Err(Si24Error::MaxRetries { sent });
                }
                TxOutcome::TimedOut => {
                    self.emit(Event::error(
                        EventKind::Timeout,
                        "frame not sent before the deadline",
                    ));
                    self.reset()?;
                    return Err(Si24Error::Timeout { sent });
                }
            }
        }

        self.emit(Event::new(EventKind::TxComplete));
        if !buf.is_empty() {
            self.set_ce(false)?;
        }
        Ok(sent)
    }

    /// See [`EsbRadio::receive()`] for implementation-agnostic detail.
    ///
    /// The CE pin is deactivated while the RX FIFO is drained, then activated again.
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, Self::RadioErrorType> {
        if !self.is_rx() {
            return Err(Si24Error::WrongMode);
        }
        self.spi_read(0, commands::NOP)?;
        if !self._status.rx_dr() {
            self.emit(Event::new(EventKind::RxEmpty));
            return Ok(0);
        }

        self.set_ce(false)?;
        let (received, emptied) = self.drain_rx(buf)?;
        if emptied {
            self.spi_write_byte(registers::STATUS, mnemonics::MASK_RX_DR)?;
            self.emit(Event::new(EventKind::RxComplete));
        }
        self.set_ce(true)?;
        Ok(received)
    }

    fn reset(&mut self) -> Result<(), Self::RadioErrorType> {
        if self.is_rx() {
            self.flush_rx()?;
        } else {
            self.flush_tx()?;
        }
        self.spi_write_byte(registers::STATUS, StatusFlags::IRQ_MASK)?;
        self.set_ce(false)
    }
}

impl<SPI, DO, DELAY, EH> Si24<SPI, DO, DELAY, EH>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
    EH: EventHandler,
{
    /// Load one frame in the TX FIFO.
    ///
    /// With static payloads, a short frame is padded with zeros to the configured length.
    fn write_payload(&mut self, frame: &[u8]) -> Result<(), Si24Error<SPI::Error, DO::Error>> {
        let len = frame.len();
        let padded_len = if self._config.dynamic_payloads() {
            len
        } else {
            self._config.payload_length() as usize
        };
        self._buf[0] = if self._config.auto_ack() {
            commands::W_TX_PAYLOAD
        } else {
            commands::W_TX_PAYLOAD_NO_ACK
        };
        self._buf[1..(len + 1)].copy_from_slice(frame);
        self._buf[(len + 1)..(padded_len + 1)].fill(0);
        self.spi_transfer(padded_len as u8 + 1)
    }

    /// Poll STATUS until the current frame is sent, it runs out of retries
    /// (only with auto-ack) or the send deadline passes.
    fn wait_for_tx(&mut self) -> Result<TxOutcome, Si24Error<SPI::Error, DO::Error>> {
        let deadline = self._config.tx_timeout();
        let mut waited = 0u32;
        loop {
            self.spi_read(0, commands::NOP)?;
            if self._status.tx_ds() {
                log::trace!("frame sent after {} us", waited);
                return Ok(TxOutcome::Sent);
            }
            if self._config.auto_ack() && self._status.max_rt() {
                return Ok(TxOutcome::MaxRetries);
            }
            if waited >= deadline {
                return Ok(TxOutcome::TimedOut);
            }
            self._delay_impl.delay_us(POLL_INTERVAL_US);
            waited = waited.saturating_add(POLL_INTERVAL_US);
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////
/// unit tests
#[cfg(test)]
mod test {
    extern crate std;
    use super::{commands, mnemonics, registers, EsbRadio, Si24Error};
    use crate::{
        event::EventKind, radio::TransceiverConfig, spi_test_expects, test::mk_radio, Mode,
    };
    use embedded_hal_mock::eh1::{
        digital::{State as PinState, Transaction as PinTransaction},
        spi::Transaction as SpiTransaction,
        MockError,
    };
    use std::{io::ErrorKind, vec, vec::Vec};

    const W: u8 = commands::W_REGISTER;

    fn transmitter() -> TransceiverConfig {
        TransceiverConfig::default().with_mode(Mode::Send)
    }

    /// The SPI frame that loads `payload` in the TX FIFO.
    fn tx_payload(command: u8, payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![command];
        frame.extend_from_slice(payload);
        frame
    }

    #[test]
    fn is_rx() {
        let mut mocks = mk_radio(TransceiverConfig::default(), &[], &[]);
        assert!(mocks.radio.is_rx());
        mocks.done();
        let mut mocks = mk_radio(transmitter(), &[], &[]);
        assert!(!mocks.radio.is_rx());
        mocks.done();
    }

    #[test]
    fn send_empty_buffer() {
        let spi_expectations = spi_test_expects![
            // only the status check
            (vec![commands::NOP], vec![0xEu8]),
        ];
        let mut mocks = mk_radio(transmitter(), &[], &spi_expectations);
        assert_eq!(mocks.radio.send(&[]), Ok(0));
        assert_eq!(mocks.events.kinds(), [EventKind::TxComplete]);
        mocks.done();
    }

    #[test]
    fn send_tx_full() {
        let spi_expectations = spi_test_expects![
            // TX_FULL is set
            (vec![commands::NOP], vec![0xFu8]),
        ];
        let mut mocks = mk_radio(transmitter(), &[], &spi_expectations);
        assert_eq!(mocks.radio.send(&[0x55; 8]), Err(Si24Error::TxFull));
        assert_eq!(mocks.events.kinds(), [EventKind::TxFull]);
        mocks.done();
    }

    #[test]
    fn send_in_receive_mode() {
        let mut mocks = mk_radio(TransceiverConfig::default(), &[], &[]);
        assert_eq!(mocks.radio.send(&[0x55; 8]), Err(Si24Error::WrongMode));
        assert!(mocks.events.kinds().is_empty());
        mocks.done();
    }

    #[test]
    fn send_pads_static_payloads() {
        let config = transmitter().with_payload_length(4);
        let ce_expectations = [
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ];
        let spi_expectations = spi_test_expects![
            (vec![commands::NOP], vec![0xEu8]),
            // first frame
            (
                tx_payload(commands::W_TX_PAYLOAD, &[1, 2, 3, 4]),
                vec![0xEu8; 5],
            ),
            (vec![commands::NOP], vec![0xEu8]),
            (vec![commands::NOP], vec![0x2Eu8]),
            (
                vec![registers::STATUS | W, mnemonics::MASK_TX_DS],
                vec![0x2Eu8, 0u8],
            ),
            // last frame is zero padded
            (
                tx_payload(commands::W_TX_PAYLOAD, &[5, 6, 0, 0]),
                vec![0xEu8; 5],
            ),
            (vec![commands::NOP], vec![0x2Eu8]),
            (
                vec![registers::STATUS | W, mnemonics::MASK_TX_DS],
                vec![0x2Eu8, 0u8],
            ),
        ];
        let mut mocks = mk_radio(config, &ce_expectations, &spi_expectations);
        // only real bytes are counted
        assert_eq!(mocks.radio.send(&[1, 2, 3, 4, 5, 6]), Ok(6));
        assert_eq!(mocks.events.kinds(), [EventKind::TxComplete]);
        mocks.done();
    }

    #[test]
    fn send_without_ack() {
        let config = transmitter()
            .with_auto_ack(false)
            .with_dynamic_payloads(true);
        let payload = [0xAAu8; 40];
        let ce_expectations = [
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ];
        let spi_expectations = spi_test_expects![
            (vec![commands::NOP], vec![0xEu8]),
            (
                tx_payload(commands::W_TX_PAYLOAD_NO_ACK, &payload[..32]),
                vec![0xEu8; 33],
            ),
            // MAX_RT cannot happen without auto-ack
            (vec![commands::NOP], vec![0x1Eu8]),
            (vec![commands::NOP], vec![0x2Eu8]),
            (
                vec![registers::STATUS | W, mnemonics::MASK_TX_DS],
                vec![0x2Eu8, 0u8],
            ),
            // dynamic payloads are not padded
            (
                tx_payload(commands::W_TX_PAYLOAD_NO_ACK, &payload[32..]),
                vec![0xEu8; 9],
            ),
            (vec![commands::NOP], vec![0x2Eu8]),
            (
                vec![registers::STATUS | W, mnemonics::MASK_TX_DS],
                vec![0x2Eu8, 0u8],
            ),
        ];
        let mut mocks = mk_radio(config, &ce_expectations, &spi_expectations);
        assert_eq!(mocks.radio.send(&payload), Ok(40));
        mocks.done();
    }

    #[test]
    fn send_fragments_every_length() {
        for frame_len in [1u8, 5, 32] {
            let f = frame_len as usize;
            for len in [f - 1, f, 2 * f, 2 * f + 1] {
                let payload: Vec<u8> = (0..len).map(|i| i as u8 + 1).collect();
                let config = transmitter().with_payload_length(frame_len);
                let mut ce_expectations = Vec::new();
                let mut spi_expectations = Vec::new();
                spi_expectations.extend(spi_test_expects![(vec![commands::NOP], vec![0xEu8]),]);
                let mut frames = 0;
                for chunk in payload.chunks(f) {
                    let mut padded = vec![0u8; f];
                    padded[..chunk.len()].copy_from_slice(chunk);
                    spi_expectations.extend(spi_test_expects![
                        (tx_payload(commands::W_TX_PAYLOAD, &padded), vec![0xEu8; f + 1]),
                        (vec![commands::NOP], vec![0x2Eu8]),
                        (
                            vec![registers::STATUS | W, mnemonics::MASK_TX_DS],
                            vec![0x2Eu8, 0u8],
                        ),
                    ]);
                    ce_expectations.push(PinTransaction::set(PinState::High));
                    frames += 1;
                }
                if len > 0 {
                    ce_expectations.push(PinTransaction::set(PinState::Low));
                }
                assert_eq!(frames, (len + f - 1) / f);
                let mut mocks = mk_radio(config, &ce_expectations, &spi_expectations);
                assert_eq!(mocks.radio.send(&payload), Ok(len));
                assert_eq!(mocks.events.kinds(), [EventKind::TxComplete]);
                mocks.done();
            }
        }
    }

    #[test]
    fn send_timeout() {
        let config = transmitter().with_auto_retries(1, 5);
        let payload = [0x55u8; 4];
        let mut padded = [0u8; 32];
        padded[..4].copy_from_slice(&payload);
        let ce_expectations = [
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ];
        let mut spi_expectations = Vec::new();
        spi_expectations.extend(spi_test_expects![
            (vec![commands::NOP], vec![0xEu8]),
            (tx_payload(commands::W_TX_PAYLOAD, &padded), vec![0xEu8; 33]),
        ]);
        // a 4000 us deadline polled every 10 us, TX_DS never shows up
        for _ in 0..401 {
            spi_expectations.extend(spi_test_expects![(vec![commands::NOP], vec![0xEu8]),]);
        }
        spi_expectations.extend(spi_test_expects![
            (vec![commands::FLUSH_TX], vec![0xEu8]),
            // all latches cleared at once
            (vec![registers::STATUS | W, 0x70u8], vec![0xEu8, 0u8]),
        ]);
        let mut mocks = mk_radio(config, &ce_expectations, &spi_expectations);
        assert_eq!(
            mocks.radio.send(&payload),
            Err(Si24Error::Timeout { sent: 0 })
        );
        assert_eq!(mocks.events.kinds(), [EventKind::Timeout]);
        mocks.done();
    }

    #[test]
    fn send_max_retries() {
        let config = transmitter().with_payload_length(4);
        let ce_expectations = [
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ];
        let spi_expectations = spi_test_expects![
            (vec![commands::NOP], vec![0xEu8]),
            (
                tx_payload(commands::W_TX_PAYLOAD, &[1, 2, 3, 4]),
                vec![0xEu8; 5],
            ),
            (vec![commands::NOP], vec![0x2Eu8]),
            (
                vec![registers::STATUS | W, mnemonics::MASK_TX_DS],
                vec![0x2Eu8, 0u8],
            ),
            (
                tx_payload(commands::W_TX_PAYLOAD, &[5, 6, 7, 8]),
                vec![0xEu8; 5],
            ),
            (vec![commands::NOP], vec![0x1Eu8]),
            // reset()
            (vec![commands::FLUSH_TX], vec![0x1Eu8]),
            (vec![registers::STATUS | W, 0x70u8], vec![0x1Eu8, 0u8]),
        ];
        let mut mocks = mk_radio(config, &ce_expectations, &spi_expectations);
        let result = mocks.radio.send(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(result, Err(Si24Error::MaxRetries { sent: 4 }));
        assert_eq!(result.unwrap_err().bytes_sent(), 4);
        assert_eq!(mocks.events.kinds(), [EventKind::MaxRetriesExceeded]);
        mocks.done();
    }

    #[test]
    fn receive_empty() {
        let spi_expectations = spi_test_expects![
            // RX_DR is clear
            (vec![commands::NOP], vec![0xEu8]),
        ];
        // CE pin is left alone
        let mut mocks = mk_radio(TransceiverConfig::default(), &[], &spi_expectations);
        let mut buf = [0u8; 32];
        assert_eq!(mocks.radio.receive(&mut buf), Ok(0));
        assert_eq!(mocks.events.kinds(), [EventKind::RxEmpty]);
        mocks.done();
    }

    #[test]
    fn receive_in_send_mode() {
        let mut mocks = mk_radio(transmitter(), &[], &[]);
        let mut buf = [0u8; 32];
        assert_eq!(mocks.radio.receive(&mut buf), Err(Si24Error::WrongMode));
        mocks.done();
    }

    #[test]
    fn receive_drains_fifo() {
        let config = TransceiverConfig::default().with_payload_length(4);
        let ce_expectations = [
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ];
        let spi_expectations = spi_test_expects![
            (vec![commands::NOP], vec![0x40u8]),
            (vec![registers::FIFO_STATUS, 0u8], vec![0x40u8, 0u8]),
            (
                vec![commands::R_RX_PAYLOAD, 0u8, 0u8, 0u8, 0u8],
                vec![0x40u8, 1u8, 2u8, 3u8, 4u8],
            ),
            (vec![registers::FIFO_STATUS, 0u8], vec![0x40u8, 0u8]),
            (
                vec![commands::R_RX_PAYLOAD, 0u8, 0u8, 0u8, 0u8],
                vec![0x40u8, 5u8, 6u8, 7u8, 8u8],
            ),
            (vec![registers::FIFO_STATUS, 0u8], vec![0x40u8, 0u8]),
            (
                vec![commands::R_RX_PAYLOAD, 0u8, 0u8, 0u8, 0u8],
                vec![0x40u8, 9u8, 10u8, 11u8, 12u8],
            ),
            (vec![registers::FIFO_STATUS, 0u8], vec![0x4Eu8, 1u8]),
            // RX_DR is cleared once
            (
                vec![registers::STATUS | W, mnemonics::MASK_RX_DR],
                vec![0x4Eu8, 0u8],
            ),
        ];
        let mut mocks = mk_radio(config, &ce_expectations, &spi_expectations);
        let mut buf = [0u8; 32];
        assert_eq!(mocks.radio.receive(&mut buf), Ok(12));
        assert_eq!(buf[..12], [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        assert_eq!(mocks.events.kinds(), [EventKind::RxComplete]);
        mocks.done();
    }

    #[test]
    fn receive_into_small_buffer() {
        let config = TransceiverConfig::default().with_payload_length(4);
        let ce_expectations = [
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ];
        let spi_expectations = spi_test_expects![
            (vec![commands::NOP], vec![0x40u8]),
            (vec![registers::FIFO_STATUS, 0u8], vec![0x40u8, 0u8]),
            (
                vec![commands::R_RX_PAYLOAD, 0u8, 0u8, 0u8, 0u8],
                vec![0x40u8, 1u8, 2u8, 3u8, 4u8],
            ),
            (vec![registers::FIFO_STATUS, 0u8], vec![0x40u8, 0u8]),
            (
                vec![commands::R_RX_PAYLOAD, 0u8, 0u8, 0u8, 0u8],
                vec![0x40u8, 5u8, 6u8, 7u8, 8u8],
            ),
            // buffer is full, a frame is still queued
            (vec![registers::FIFO_STATUS, 0u8], vec![0x40u8, 0u8]),
            // second call picks up the rest
            (vec![commands::NOP], vec![0x40u8]),
            (vec![registers::FIFO_STATUS, 0u8], vec![0x40u8, 0u8]),
            (
                vec![commands::R_RX_PAYLOAD, 0u8, 0u8, 0u8, 0u8],
                vec![0x40u8, 9u8, 10u8, 11u8, 12u8],
            ),
            (vec![registers::FIFO_STATUS, 0u8], vec![0x4Eu8, 1u8]),
            (
                vec![registers::STATUS | W, mnemonics::MASK_RX_DR],
                vec![0x4Eu8, 0u8],
            ),
        ];
        let mut mocks = mk_radio(config, &ce_expectations, &spi_expectations);
        let mut buf = [0u8; 6];
        assert_eq!(mocks.radio.receive(&mut buf), Ok(6));
        assert_eq!(buf, [1, 2, 3, 4, 5, 6]);
        assert!(mocks.events.kinds().is_empty());
        assert_eq!(mocks.radio.receive(&mut buf), Ok(4));
        assert_eq!(buf[..4], [9, 10, 11, 12]);
        assert_eq!(mocks.events.kinds(), [EventKind::RxComplete]);
        mocks.done();
    }

    #[test]
    fn receive_dynamic_payloads() {
        let config = TransceiverConfig::default().with_dynamic_payloads(true);
        let ce_expectations = [
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ];
        let spi_expectations = spi_test_expects![
            (vec![commands::NOP], vec![0x40u8]),
            (vec![registers::FIFO_STATUS, 0u8], vec![0x40u8, 0u8]),
            (vec![commands::R_RX_PL_WID, 0u8], vec![0x40u8, 3u8]),
            (
                vec![commands::R_RX_PAYLOAD, 0u8, 0u8, 0u8],
                vec![0x40u8, 0xAu8, 0xBu8, 0xCu8],
            ),
            (vec![registers::FIFO_STATUS, 0u8], vec![0x40u8, 0u8]),
            // corrupted frame
            (vec![commands::R_RX_PL_WID, 0u8], vec![0x40u8, 0u8]),
            (vec![commands::FLUSH_RX], vec![0x40u8]),
            (
                vec![registers::STATUS | W, mnemonics::MASK_RX_DR],
                vec![0x40u8, 0u8],
            ),
        ];
        let mut mocks = mk_radio(config, &ce_expectations, &spi_expectations);
        let mut buf = [0u8; 32];
        assert_eq!(mocks.radio.receive(&mut buf), Ok(3));
        assert_eq!(buf[..3], [0xA, 0xB, 0xC]);
        assert_eq!(
            mocks.events.kinds(),
            [EventKind::CrcError, EventKind::RxComplete]
        );
        mocks.done();
    }

    #[test]
    fn receive_ce_pin_failure() {
        let ce_expectations = [PinTransaction::set(PinState::Low)
            .with_error(MockError::Io(ErrorKind::NotConnected))];
        let spi_expectations = spi_test_expects![
            // RX_DR is set
            (vec![commands::NOP], vec![0x40u8]),
        ];
        let mut mocks = mk_radio(
            TransceiverConfig::default(),
            &ce_expectations,
            &spi_expectations,
        );
        let mut buf = [0u8; 32];
        assert_eq!(
            mocks.radio.receive(&mut buf),
            Err(Si24Error::Gpo(MockError::Io(ErrorKind::NotConnected)))
        );
        assert_eq!(mocks.events.kinds(), [EventKind::BusError]);
        let diagnostic = mocks.events.last().diagnostic.unwrap();
        assert_eq!(diagnostic.message, "CE pin failed");
        mocks.done();
    }

    #[test]
    fn reset_stops_listening() {
        // CE goes low once and is never raised again
        let ce_expectations = [PinTransaction::set(PinState::Low)];
        let spi_expectations = spi_test_expects![
            (vec![commands::FLUSH_RX], vec![0xEu8]),
            (vec![registers::STATUS | W, 0x70u8], vec![0xEu8, 0u8]),
            (vec![commands::NOP], vec![0xEu8]),
            (vec![commands::NOP], vec![0xEu8]),
        ];
        let mut mocks = mk_radio(
            TransceiverConfig::default(),
            &ce_expectations,
            &spi_expectations,
        );
        mocks.radio.reset().unwrap();
        let mut buf = [0u8; 32];
        assert_eq!(mocks.radio.receive(&mut buf), Ok(0));
        assert_eq!(mocks.radio.receive(&mut buf), Ok(0));
        assert_eq!(
            mocks.events.kinds(),
            [EventKind::RxEmpty, EventKind::RxEmpty]
        );
        mocks.done();
    }

    #[test]
    fn reset() {
        let ce_expectations = [PinTransaction::set(PinState::Low)];
        let spi_expectations = spi_test_expects![
            (vec![commands::FLUSH_RX], vec![0xEu8]),
            (vec![registers::STATUS | W, 0x70u8], vec![0xEu8, 0u8]),
        ];
        let mut mocks = mk_radio(
            TransceiverConfig::default(),
            &ce_expectations,
            &spi_expectations,
        );
        mocks.radio.reset().unwrap();
        assert!(mocks.events.kinds().is_empty());
        mocks.done();
    }
}
