//! The fetch capability consumed by the rest of the crate.

use crate::error::Error;
use dotenv::var;
use std::time::Duration;
use tracing::{error, trace};

pub(crate) const BASE_URL: &str = "https://finviz.com";

/// Finviz rejects requests without a browser-looking agent string; overridable
/// through the `USER_AGENT` environment variable.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0";

/// Default per-request timeout; the quote pages are small, anything slower is
/// a stalled connection.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the quote-page URL for an (already uppercased) ticker.
pub(crate) fn quote_url(ticker: &str) -> String {
    format!("{BASE_URL}/quote.ashx?t={ticker}&ty=c&ta=1&p=d")
}

/// `fetch(url) -> document body` capability.
///
/// Implemented by [`HttpFetcher`] in production and by in-memory fixtures in
/// tests; the pipeline is generic over it and never names a transport.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<String, Error>;
}

/// [`reqwest`]-backed fetcher with an explicit per-request timeout.
///
/// [`reqwest`]: https://docs.rs/reqwest/latest/reqwest/
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let user_agent = var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        let client = reqwest::ClientBuilder::new()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .expect("failed to build reqwest client");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, Error> {
        trace!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| {
                error!("failed to fetch {url}, error({err})");
                Error::Fetch {
                    url: url.to_string(),
                    reason: err.to_string(),
                }
            })?;

        response.text().await.map_err(|err| {
            error!("failed to read response body from {url}, error({err})");
            Error::Fetch {
                url: url.to_string(),
                reason: err.to_string(),
            }
        })
    }
}
