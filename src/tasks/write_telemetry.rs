use rtic::mutex_prelude::*;
use rtt_target::rprintln;
use telemetry_logger::{RcChannels, Sample};

use crate::app::{write_telemetry, TELEMETRY_PERIOD};

/// sample tags of the logger's own counters
const SAMPLE_CYCLE: u8 = 1;
const SAMPLE_FLUSHES: u8 = 2;
const SAMPLE_STALLS: u8 = 3;
const SAMPLE_DROPPED_BYTES: u8 = 4;

pub(crate) fn write_telemetry(mut context: write_telemetry::Context) {
    /*
        entering critical section
    */
    let rc_channels: RcChannels = context.shared.rc_channels.lock(|guard| *guard);
    /*
        leaving critical section
    */

    let logger = context.local.logger;
    let cycle = context.local.cycle;
    *cycle = cycle.wrapping_add(1);

    // nothing is written until the receiver delivered something
    if let Err(e) = logger.log_rc_channels(&rc_channels) {
        rprintln!("[WARNING] rc channels frame lost: {}", e);
    }

    let stats = logger.stats();
    let samples = [
        Sample::new(SAMPLE_CYCLE, *cycle as i32),
        Sample::new(SAMPLE_FLUSHES, stats.flushes as i32),
        Sample::new(SAMPLE_STALLS, stats.stalls as i32),
        Sample::new(SAMPLE_DROPPED_BYTES, stats.dropped_bytes as i32),
    ];
    if let Err(e) = logger.log_samples(&samples) {
        rprintln!("[WARNING] counters frame lost: {}", e);
    }

    if write_telemetry::spawn_after(TELEMETRY_PERIOD).is_err() {
        rprintln!("[ERROR] failed to reschedule the telemetry task!");
    }
}
