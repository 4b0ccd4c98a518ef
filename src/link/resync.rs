//! Restart the transmitter against the recovered receive clock

use tracing::{debug, error, info};

use super::Link;
use crate::types::Direction;

impl Link {
    /// Runs once per armed restart; the pending flag is cleared before any
    /// hardware is touched so the sequence cannot be re-entered.
    pub(crate) fn start_transmit_after_receive(&mut self) {
        self.state.restart_after_receive_pending = false;
        self.state.restart_in_flight = true;
        self.state.is_stream_up = false;

        if !self.config.transmit_clock_on_channel4 {
            self.hw.phy.set_clock_out_buffer(Direction::Transmit, false);
        }
        self.hw.tx.start_stream();
        self.hw.phy.set_clock_out_buffer(Direction::Receive, true);

        let rx_ref = self.hw.phy.rx_ref_clock_hz();
        let tx_ref = self.hw.phy.tx_ref_clock_hz();
        let (device, result) = if self.hw.phy.is_bonded() {
            ("bonded", self.hw.clock.reinit_bonded())
        } else if rx_ref == 0 {
            debug!("No receive reference clock, free-running at {} Hz", tx_ref);
            ("free-running", self.hw.clock.program_free_running(tx_ref))
        } else {
            ("locked", self.hw.clock.program_locked(rx_ref, tx_ref))
        };

        match result {
            Ok(()) => info!("Transmit restarted, clock generator {} ({} -> {} Hz)", device, rx_ref, tx_ref),
            Err(e) => {
                self.state.clock_fault_count += 1;
                error!("Clock generator programming failed ({}): {}", device, e);
            }
        }
    }
}
