//! This module defines the generic traits that may
//! need to imported to use radio implementations.
//!
//! Since rustc only compiles objects that are used,
//! it is convenient to import these traits with the `*` syntax.
//!
//! ```
//! use si24::radio::prelude::*;
//! ```

use crate::types::{FifoState, StatusFlags};

/// A trait to represent manipulation of [`StatusFlags`]
/// for an ESB capable transceiver.
pub trait EsbStatus {
    type StatusErrorType;

    /// Get the [`StatusFlags`] state that was cached from the latest SPI transaction.
    fn get_status_flags(&self) -> StatusFlags;

    /// Clear the radio's latched status flags.
    ///
    /// Set any latch of [`StatusFlags`] to `true` to clear it. Latches set to
    /// `false` are left untouched. All requested latches are cleared in a
    /// single bus transaction.
    fn clear_status_flags(&mut self, flags: StatusFlags) -> Result<(), Self::StatusErrorType>;

    /// Refresh the internal cache of status byte
    /// (which is also saved from every SPI transaction).
    ///
    /// Use [`EsbStatus::get_status_flags()`] to get the updated status flags.
    fn update(&mut self) -> Result<(), Self::StatusErrorType>;
}

/// A trait to represent manipulation of RX and TX FIFOs
/// for an ESB capable transceiver.
pub trait EsbFifo {
    type FifoErrorType;

    /// Is there a payload available in the radio's RX FIFO?
    fn available(&mut self) -> Result<bool, Self::FifoErrorType>;

    /// Discard all 3 levels of the radio's RX FIFO.
    fn flush_rx(&mut self) -> Result<(), Self::FifoErrorType>;

    /// Discard all 3 levels of the radio's TX FIFO.
    fn flush_tx(&mut self) -> Result<(), Self::FifoErrorType>;

    /// Get the state of the specified FIFO.
    ///
    /// - Pass `true` to `about_tx` parameter to get the state of the TX FIFO.
    /// - Pass `false` to `about_tx` parameter to get the state of the RX FIFO.
    fn get_fifo_state(&mut self, about_tx: bool) -> Result<FifoState, Self::FifoErrorType>;
}

/// A trait to represent the blocking data path of an ESB capable transceiver.
///
/// Every outcome is also reported to the radio's
/// [`EventHandler`](trait@crate::event::EventHandler).
pub trait EsbRadio {
    type RadioErrorType;

    /// Is the radio configured as a receiver?
    fn is_rx(&self) -> bool;

    /// Transmit `buf`, split into as many frames as needed.
    ///
    /// Frames are at most 32 bytes long when dynamic payloads are enabled;
    /// otherwise each frame is the configured static payload length (the
    /// last frame is zero padded on air).
    ///
    /// Returns the number of bytes sent, which is always `buf.len()` on success.
    /// A send interrupted by a timeout or by exhausted auto-retries resets the
    /// radio and returns an error that carries the number of bytes delivered by
    /// the preceding frames.
    ///
    /// A full TX FIFO refuses the whole call before anything is written.
    fn send(&mut self, buf: &[u8]) -> Result<usize, Self::RadioErrorType>;

    /// Drain the RX FIFO into `buf`.
    ///
    /// Returns the number of bytes copied. `Ok(0)` means no data was waiting.
    ///
    /// If `buf` fills up before the RX FIFO is empty, the remaining frames stay
    /// queued (and the "RX Data Ready" flag stays set) for the next call. A frame
    /// that does not fit entirely in the remaining space of `buf` is truncated.
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, Self::RadioErrorType>;

    /// Flush the FIFO used by the configured mode, clear all status latches
    /// and deactivate the CE pin.
    ///
    /// This is always safe to call, e.g. after an error event.
    ///
    /// A receiver stops listening after a reset: [`EsbRadio::receive()`] only
    /// activates the CE pin again once data has arrived, which cannot happen
    /// while the CE pin is inactive. Re-initialize the radio (see
    /// [`Si24::release()`](fn@crate::radio::Si24::release)) to resume listening.
    fn reset(&mut self) -> Result<(), Self::RadioErrorType>;
}
