//! Hand-off of decoded samples to a persistence collaborator.
//!
//! The router calls [`SampleSink::append_sample`] once per decoded telemetry
//! sample, in arrival order.  File format, naming and rotation belong to the
//! implementation.

use log::debug;

use crate::types::SampleKind;

pub trait SampleSink {
    /// `timestamp` is seconds since the Unix epoch at the moment the sample
    /// was routed.
    fn append_sample(&mut self, kind: SampleKind, values: &[u16], timestamp: f64);
}

impl<F> SampleSink for F
where
    F: FnMut(SampleKind, &[u16], f64),
{
    fn append_sample(&mut self, kind: SampleKind, values: &[u16], timestamp: f64) {
        self(kind, values, timestamp)
    }
}

/// Logs every sample at `debug` level and keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl SampleSink for LogSink {
    fn append_sample(&mut self, kind: SampleKind, values: &[u16], timestamp: f64) {
        debug!("{kind} {timestamp:.6} {values:?}");
    }
}
