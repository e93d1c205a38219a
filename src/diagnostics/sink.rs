//! Optional forwarding of error records to an external collector.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::ErrorRecord;

pub trait TelemetrySink {
    fn capture(&self, record: &ErrorRecord);
}

impl<F> TelemetrySink for F
where
    F: Fn(&ErrorRecord),
{
    fn capture(&self, record: &ErrorRecord) {
        self(record);
    }
}

/// Hand `record` to `sink`, swallowing any panic from the sink.
pub(crate) fn forward(sink: &dyn TelemetrySink, record: &ErrorRecord) {
    if catch_unwind(AssertUnwindSafe(|| sink.capture(record))).is_err() {
        tracing::warn!(kind = %record.kind, "telemetry sink panicked; record not forwarded");
    }
}
