//! Hardware events delivered to the control task
//!
//! Interrupt producers never touch link state directly; they post one of
//! these and the control task applies it to completion before the next.

use serde::{Deserialize, Serialize};

/// Receive endpoint events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiveEvent {
    Connect { connected: bool },
    /// An auxiliary packet is latched; read it with `get_auxiliary_packet`.
    Aux,
    Audio,
    LinkStatus,
    StreamInit,
    StreamUp,
    StreamDown,
}

/// Transmit endpoint events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransmitEvent {
    Connect { connected: bool },
    /// Downstream HPD toggled without a full disconnect.
    Toggle,
    Vsync,
    StreamUp,
    StreamDown,
}

/// Physical transceiver events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransceiverEvent {
    TxRefClockChanged,
    RxRefClockChanged,
    /// Receive PLL locked; the receive stream clock can be programmed.
    RxReady,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Receive(ReceiveEvent),
    Transmit(TransmitEvent),
    Transceiver(TransceiverEvent),
}

impl From<ReceiveEvent> for Event {
    fn from(event: ReceiveEvent) -> Self {
        Event::Receive(event)
    }
}

impl From<TransmitEvent> for Event {
    fn from(event: TransmitEvent) -> Self {
        Event::Transmit(event)
    }
}

impl From<TransceiverEvent> for Event {
    fn from(event: TransceiverEvent) -> Self {
        Event::Transceiver(event)
    }
}
