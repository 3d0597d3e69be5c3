//! Result collection for completed scans.

mod aggregator;

pub use aggregator::{vulnerability_query, ResultAggregator};
