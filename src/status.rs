//! Link status snapshot published by the control task

use serde::Serialize;
use std::fmt;

use crate::sink::{SinkCapabilityRecord, SinkState};
use crate::types::VideoStreamParams;

/// Point-in-time view of the link, as shown by the operator status dump.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkStatus {
    pub is_pass_through: bool,
    pub transmit_busy: bool,
    pub transmit_cable_connected: bool,
    pub receive_cable_connected: bool,
    pub restart_pending: bool,
    pub restart_in_flight: bool,
    pub sink_state: SinkState,
    pub sink: SinkCapabilityRecord,
    pub receive_stream: Option<VideoStreamParams>,
    pub transmit_stream: VideoStreamParams,
    pub transmit_line_rate: u64,
    pub receive_tmds_clock_ratio: u8,
    pub aux_pending: usize,
    pub aux_overflow_count: u64,
    pub aux_overflow_total: u64,
    pub transceiver_error_count: u32,
    pub clock_fault_count: u32,
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---------------------")?;
        writeln!(f, "---   LINK INFO   ---")?;
        writeln!(f, "---------------------")?;
        writeln!(f, "Pass-through    : {}", yes_no(self.is_pass_through))?;
        writeln!(f, "TX busy         : {}", yes_no(self.transmit_busy))?;
        writeln!(f, "TX cable        : {}", yes_no(self.transmit_cable_connected))?;
        writeln!(f, "RX cable        : {}", yes_no(self.receive_cable_connected))?;
        writeln!(
            f,
            "Restart         : pending={} in-flight={}",
            yes_no(self.restart_pending),
            yes_no(self.restart_in_flight)
        )?;
        writeln!(
            f,
            "Sink            : {:?} {:?} hdmi2.0={} (edid retry {}, scdc retry {})",
            self.sink_state,
            self.sink.output_mode,
            yes_no(self.sink.hdmi20_capable),
            self.sink.edid_retry,
            self.sink.scdc_retry
        )?;
        writeln!(f, "Sink warnings   : {}", self.sink.warnings)?;
        match &self.receive_stream {
            Some(stream) => writeln!(f, "RX stream       : {}", stream)?,
            None => writeln!(f, "RX stream       : none")?,
        }
        writeln!(f, "RX TMDS ratio   : {}", self.receive_tmds_clock_ratio)?;
        writeln!(f, "TX stream       : {}", self.transmit_stream)?;
        writeln!(f, "TX line rate    : {} Mbps", self.transmit_line_rate / 1_000_000)?;
        writeln!(
            f,
            "Aux queue       : {} pending, {} overflowed ({} total)",
            self.aux_pending, self.aux_overflow_count, self.aux_overflow_total
        )?;
        write!(
            f,
            "Faults          : {} transceiver, {} clock",
            self.transceiver_error_count, self.clock_fault_count
        )
    }
}
