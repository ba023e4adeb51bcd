//! RTIC task handlers, one per submodule, pub(crate) re-exported for the app.

/*
   private interface
*/

/// Task composing one telemetry cycle (RC channels and logger counters) every period.
/// Note: this task requires a monotonic clock with at least 1ms resolution.
mod write_telemetry;

/// Task capturing a receiver pulse using advanced timer TIM8.
mod tim8;

/*
    public(crate) interface
*/
pub(crate) use tim8::tim8_cc;
pub(crate) use write_telemetry::write_telemetry;
