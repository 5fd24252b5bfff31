use thiserror::Error;

/// Error taxonomy for the spider.
///
/// `Fetch` and `Extraction` are fatal to the node under construction and
/// propagate to the caller; `Expansion` is scoped to a single sector link and is
/// recorded rather than propagated; `Dimension` marks a caller bug (a matrix
/// assembled over an uninitialized node).
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure. Distinct from the layout-mismatch variants so callers
    /// can tell a dead connection apart from a changed page.
    #[error("failed to fetch {url}, error({reason})")]
    Fetch { url: String, reason: String },

    /// The quote page no longer carries the snapshot grid where we expect it.
    #[error("quote page layout mismatch, error({reason})")]
    Extraction { reason: String },

    /// One sector's screener page no longer matches the expected scaffold.
    #[error("screener layout mismatch for sector [{sector}], error({reason})")]
    Expansion { sector: String, reason: String },

    /// A comparison matrix was assembled over a node with an empty numeric
    /// vector.
    #[error("comparison matrix assembled over uninitialized node [{ticker}]")]
    Dimension { ticker: String },
}
