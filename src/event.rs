//! Synchronous notifications from the driver to the application.
//!
//! Every completion and every error condition observed by a
//! [`Si24`](struct@crate::radio::Si24) is reported twice: once through the
//! returned `Result` and once as an [`Event`] passed to the [`EventHandler`]
//! given at construction. The handler is called in-line, before the driver
//! operation returns.

use core::{
    fmt::{Display, Formatter, Result},
    panic::Location,
    write,
};

/// The kind of an [`Event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// The RX FIFO was drained into the caller's buffer.
    RxComplete,
    /// All frames of a send were transmitted.
    TxComplete,
    /// A send was refused because the TX FIFO is full.
    TxFull,
    /// A receive found no data waiting.
    RxEmpty,
    /// The radio did not report completion before the send deadline.
    Timeout,
    /// A bus transaction (or the CE pin) failed.
    BusError,
    /// The radio exhausted its auto-retry counter without an ACK.
    MaxRetriesExceeded,
    /// A received frame was corrupted.
    CrcError,
    /// The configuration given at construction is invalid.
    ConfigError,
}

impl EventKind {
    /// Is this kind reported for an error condition?
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            EventKind::Timeout
                | EventKind::BusError
                | EventKind::MaxRetriesExceeded
                | EventKind::CrcError
                | EventKind::ConfigError
        )
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            EventKind::RxComplete => write!(f, "RX complete"),
            EventKind::TxComplete => write!(f, "TX complete"),
            EventKind::TxFull => write!(f, "TX FIFO full"),
            EventKind::RxEmpty => write!(f, "RX FIFO empty"),
            EventKind::Timeout => write!(f, "timeout"),
            EventKind::BusError => write!(f, "bus error"),
            EventKind::MaxRetriesExceeded => write!(f, "max retries exceeded"),
            EventKind::CrcError => write!(f, "CRC error"),
            EventKind::ConfigError => write!(f, "config error"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EventKind {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            EventKind::RxComplete => defmt::write!(fmt, "RX complete"),
            EventKind::TxComplete => defmt::write!(fmt, "TX complete"),
            EventKind::TxFull => defmt::write!(fmt, "TX FIFO full"),
            EventKind::RxEmpty => defmt::write!(fmt, "RX FIFO empty"),
            EventKind::Timeout => defmt::write!(fmt, "timeout"),
            EventKind::BusError => defmt::write!(fmt, "bus error"),
            EventKind::MaxRetriesExceeded => defmt::write!(fmt, "max retries exceeded"),
            EventKind::CrcError => defmt::write!(fmt, "CRC error"),
            EventKind::ConfigError => defmt::write!(fmt, "config error"),
        }
    }
}

/// Where (in the driver) an error event was raised, and why.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// The driver source location that raised the event.
    pub location: &'static Location<'static>,
    /// A short human readable explanation.
    pub message: &'static str,
}

impl Diagnostic {
    /// Capture the caller's location.
    #[track_caller]
    pub fn here(message: &'static str) -> Self {
        Self {
            location: Location::caller(),
            message,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "{} ({}:{})",
            self.message,
            self.location.file(),
            self.location.line()
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Diagnostic {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "{=str} ({=str}:{=u32})",
            self.message,
            self.location.file(),
            self.location.line()
        )
    }
}

/// A notification emitted by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// Context for error kinds. Completions never carry one.
    pub diagnostic: Option<Diagnostic>,
}

impl Event {
    /// A plain (non-error) event.
    pub const fn new(kind: EventKind) -> Self {
        Self {
            kind,
            diagnostic: None,
        }
    }

    /// An error event carrying the caller's location and `message`.
    #[track_caller]
    pub fn error(kind: EventKind, message: &'static str) -> Self {
        Self {
            kind,
            diagnostic: Some(Diagnostic::here(message)),
        }
    }
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        Self::new(kind)
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match &self.diagnostic {
            Some(diagnostic) => write!(f, "{}: {}", self.kind, diagnostic),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Event {
    fn format(&self, fmt: defmt::Formatter) {
        match &self.diagnostic {
            Some(diagnostic) => defmt::write!(fmt, "{}: {}", self.kind, diagnostic),
            None => defmt::write!(fmt, "{}", self.kind),
        }
    }
}

/// The receiving end of driver notifications.
///
/// Implemented for any `FnMut(&Event)` closure, and for `()` to discard events.
///
/// The handler only ever sees the [`Event`]; it has no access to the driver
/// and so cannot call back into it while an operation is in progress.
pub trait EventHandler {
    /// Called synchronously for every event, in the order they occur.
    fn handle(&mut self, event: &Event);
}

impl<F> EventHandler for F
where
    F: FnMut(&Event),
{
    fn handle(&mut self, event: &Event) {
        self(event)
    }
}

impl EventHandler for () {
    fn handle(&mut self, _event: &Event) {}
}
