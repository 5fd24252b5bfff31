pub mod coerce;
pub mod compare;
pub mod error;
pub mod http;
pub mod node;
pub mod quote;
pub mod screener;

pub use coerce::{coerce, Coerced};
pub use compare::{ComparisonSet, Matrix};
pub use error::Error;
pub use http::{Fetch, HttpFetcher};
pub use node::{EntityNode, ImportantAttributes, NumericVector, SpiderConfig};
pub use screener::MinVolume;

/// Pretty-print a runtime duration for log lines.
pub(crate) fn time_elapsed(start: std::time::Instant) -> String {
    format!("time elapsed: {:.2}s", start.elapsed().as_secs_f64())
}
