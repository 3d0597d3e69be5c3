//! Structured progress reporting for scan runs.
//!
//! Every step of a run is reported as a [`LifecycleEvent`] to an
//! [`EventSink`]. The default sink writes each event through `tracing`
//! under the `scanpilot::progress` target, so hosts can route progress
//! lines to their own logs with an ordinary subscriber.

mod progress;

pub use progress::{EventSink, LifecycleEvent, TracingEventSink};
