//! Bounded ring of auxiliary packets awaiting retransmission
//!
//! Filled from receive `Aux` events and drained once per transmit vsync.
//! Both happen on the control task, so the queue needs no locking, only
//! strict ordering.

use tracing::{debug, trace, warn};

use crate::Result;
use crate::types::{AuxPacket, PacketKind};

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub relayed: usize,
    /// Send failed (FIFO full); dropped, never retried in the same pass.
    pub abandoned: usize,
    /// General control packets skipped.
    pub filtered: usize,
}

#[derive(Debug)]
pub struct AuxQueue {
    slots: Box<[AuxPacket]>,
    start: usize,
    end: usize,
    count: usize,
    overflow_count: u64,
    total_overflow_count: u64,
    accepting: bool,
}

impl AuxQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![AuxPacket::default(); capacity.max(1)].into_boxed_slice(),
            start: 0,
            end: 0,
            count: 0,
            overflow_count: 0,
            total_overflow_count: 0,
            accepting: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Packets overwritten since the last reset.
    pub fn overflow_count(&self) -> u64 {
        self.overflow_count
    }

    /// Packets overwritten since the queue was created.
    pub fn total_overflow_count(&self) -> u64 {
        self.total_overflow_count
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Open the queue; called on the first vsync after the transmit stream is up.
    pub fn start_accepting(&mut self) {
        self.accepting = true;
    }

    /// Store a packet. A full queue overwrites its oldest entry.
    pub fn push(&mut self, packet: AuxPacket) {
        let capacity = self.capacity();
        self.slots[self.end] = packet;
        self.end = (self.end + 1) % capacity;
        if self.count == capacity {
            self.start = self.end;
            self.overflow_count += 1;
            self.total_overflow_count += 1;
            trace!(overflow = self.overflow_count, "aux queue full, oldest packet dropped");
        } else {
            self.count += 1;
        }
    }

    /// Drop everything pending and stop accepting until the next vsync.
    /// Only the lifetime overflow total survives.
    pub fn reset(&mut self) {
        self.start = 0;
        self.end = 0;
        self.count = 0;
        self.overflow_count = 0;
        self.accepting = false;
    }

    /// Hand every pending packet, oldest first, to `send`.
    ///
    /// General control packets are skipped. A failed send abandons that
    /// packet and the pass continues with the next.
    pub fn drain_and_relay<F>(&mut self, mut send: F) -> DrainReport
    where
        F: FnMut(PacketKind, &AuxPacket) -> Result<()>,
    {
        let mut report = DrainReport::default();
        let capacity = self.capacity();
        for offset in 0..self.count {
            let packet = &self.slots[(self.start + offset) % capacity];
            let kind = packet.kind();
            if kind == PacketKind::GeneralControl {
                report.filtered += 1;
                continue;
            }
            match send(kind, packet) {
                Ok(()) => report.relayed += 1,
                Err(e) => {
                    warn!("Dropping {:?} packet: {}", kind, e);
                    report.abandoned += 1;
                }
            }
        }
        self.start = self.end;
        self.count = 0;
        if report != DrainReport::default() {
            debug!(
                relayed = report.relayed,
                abandoned = report.abandoned,
                filtered = report.filtered,
                "aux queue drained"
            );
        }
        report
    }
}
