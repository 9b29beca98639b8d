#![doc = include_str!("../README.md")]
//!
//! ## Basic API
//!
//! - [`Si24::initialize()`](fn@crate::radio::Si24::initialize)
//! - [`Si24::send()`](radio/prelude/trait.EsbRadio.html#tymethod.send)
//! - [`Si24::receive()`](radio/prelude/trait.EsbRadio.html#tymethod.receive)
//! - [`Si24::reset()`](radio/prelude/trait.EsbRadio.html#tymethod.reset)
//! - [`Si24::release()`](fn@crate::radio::Si24::release)
//!
//! ## Advanced API
//!
//! - [`Si24::available()`](radio/prelude/trait.EsbFifo.html#tymethod.available)
//! - [`Si24::get_fifo_state()`](radio/prelude/trait.EsbFifo.html#tymethod.get_fifo_state)
//! - [`Si24::flush_rx()`](radio/prelude/trait.EsbFifo.html#tymethod.flush_rx)
//! - [`Si24::flush_tx()`](radio/prelude/trait.EsbFifo.html#tymethod.flush_tx)
//! - [`Si24::update()`](radio/prelude/trait.EsbStatus.html#tymethod.update)
//! - [`Si24::get_status_flags()`](radio/prelude/trait.EsbStatus.html#tymethod.get_status_flags)
//! - [`Si24::clear_status_flags()`](radio/prelude/trait.EsbStatus.html#tymethod.clear_status_flags)
//!
//! ## Configuration API
//!
//! - [`TransceiverConfig`](struct@crate::radio::TransceiverConfig)
//! - [`EventHandler`](trait@crate::event::EventHandler)
//!
#![no_std]

mod types;
pub use types::{CrcLength, DataRate, FifoState, Mode, StatusFlags, TxPower};
pub mod event;
pub mod radio;
