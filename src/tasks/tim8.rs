use rtic::mutex_prelude::*;
use telemetry_logger::MonotonicClock;

use crate::app::{tim8_cc, PwmMonitor};

/// Receiver channel fed by the TIM8 capture.
const CAPTURED_CHANNEL: usize = 0;

pub(crate) fn tim8_cc(mut context: tim8_cc::Context) {
    let monitor: &PwmMonitor = context.local.monitor;

    // observe the pulse width.
    // This is done up here to minimize time in the critical section.
    let pulse_us = match measure_pulse_us(monitor, context.local.clocks) {
        Some(pulse_us) => pulse_us,
        None => return,
    };
    let now = context.local.capture_clock.now_ms();

    // entering critical section
    context.shared.rc_channels.lock(|rc| {
        rc.set_channel(CAPTURED_CHANNEL, pulse_us, now);
    });
    // leaving critical section
}

/// High time of the last captured pulse in µs, `None` until a full period was seen.
/// Reading the captures also clears the CC interrupt flags.
fn measure_pulse_us(
    monitor: &PwmMonitor,
    clocks: &stm32f4xx_hal::rcc::Clocks,
) -> Option<u16> {
    let period_ticks = u64::from(monitor.get_period_clocks());
    let high_ticks = u64::from(monitor.get_duty_cycle_clocks());
    if !monitor.is_valid_capture() || period_ticks == 0 {
        return None;
    }
    let frequency_hz = u64::from(monitor.get_frequency(clocks).ok()?.0);
    // high / period is the duty cycle, 1 / frequency the period in seconds
    let pulse_us = high_ticks * 1_000_000 / (period_ticks * frequency_hz).max(1);
    Some(pulse_us.min(u64::from(u16::MAX)) as u16)
}
