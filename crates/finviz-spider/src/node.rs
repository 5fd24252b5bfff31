//! Entity nodes: one ticker's extracted attributes plus the derived numeric
//! vector, optionally expanded with the tickers of its related sectors.

use crate::coerce::{coerce, Coerced};
use crate::error::Error;
use crate::http::{quote_url, Fetch};
use crate::quote::{self, AttributeMap};
use crate::screener::{self, MinVolume, SectorChildren, SectorLink};
use scraper::Html;
use serde::Serialize;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// The caller-chosen subset of attribute names retained for numeric analysis.
///
/// Order is first-seen insertion order (it drives comparison-matrix columns),
/// duplicates are dropped. One instance is shared read-only across a whole
/// expansion tree so every node's vector is comparable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportantAttributes(Vec<String>);

impl ImportantAttributes {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|existing| existing == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ImportantAttributes {
    fn from_iter<I: IntoIterator<Item = S>>(names: I) -> Self {
        let mut list: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !list.contains(&name) {
                list.push(name);
            }
        }
        Self(list)
    }
}

/// Read-only configuration shared by every node of one run.
///
/// Passed down explicitly at construction; the important-attribute set is
/// behind an [`Arc`] so the whole expansion tree reads the same instance.
#[derive(Debug, Clone)]
pub struct SpiderConfig {
    important: Arc<ImportantAttributes>,
    min_volume: Option<MinVolume>,
    concurrency: NonZeroUsize,
}

impl SpiderConfig {
    pub fn new(important: ImportantAttributes) -> Self {
        Self {
            important: Arc::new(important),
            min_volume: None,
            concurrency: NonZeroUsize::MIN,
        }
    }

    /// Screener volume filter appended to every sector link.
    pub fn with_min_volume(mut self, min_volume: Option<MinVolume>) -> Self {
        self.min_volume = min_volume;
        self
    }

    /// How many peer quote pages to fetch in flight during expansion. The
    /// default of 1 keeps fetching strictly sequential; higher values keep
    /// result ordering either way.
    pub fn with_concurrency(mut self, concurrency: NonZeroUsize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn important(&self) -> &Arc<ImportantAttributes> {
        &self.important
    }

    pub(crate) fn min_volume(&self) -> Option<MinVolume> {
        self.min_volume
    }

    pub(crate) fn concurrency(&self) -> NonZeroUsize {
        self.concurrency
    }
}

/// Names and values of the successfully coerced important attributes, kept as
/// parallel lists with identical index alignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NumericVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl NumericVector {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|existing| existing == name)
            .map(|index| self.values[index])
    }
}

/// Derive the numeric vector for one attribute map.
///
/// Iterates `attributes` in document order (NOT in `important` order), keeping
/// entries that coerce; the rest land in the returned diagnostic set. The two
/// parallel lists must come out the same length, always.
pub fn derive_numeric_vector(
    attributes: &AttributeMap,
    important: &ImportantAttributes,
) -> (NumericVector, BTreeSet<String>) {
    let mut vector = NumericVector::default();
    let mut unresolved = BTreeSet::new();

    for (name, raw) in attributes.iter() {
        if !important.contains(name) {
            continue;
        }
        match coerce(raw) {
            Coerced::Numeric(value) => {
                vector.names.push(name.to_string());
                vector.values.push(value);
            }
            Coerced::NonNumeric => {
                unresolved.insert(name.to_string());
            }
        }
    }

    // a length mismatch here is a bookkeeping defect, not bad input
    assert_eq!(
        vector.names.len(),
        vector.values.len(),
        "numeric vector name/value lists out of step"
    );

    (vector, unresolved)
}

/// One ticker's scraped state.
///
/// Immutable once constructed. `children` is `Some` only on a root node built
/// through [`EntityNode::fetch_expanded`]; peer nodes built during expansion
/// are leaves.
#[derive(Debug, Serialize)]
pub struct EntityNode {
    ticker: String,
    attributes: AttributeMap,
    numeric_vector: NumericVector,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    unresolved: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<SectorChildren>,
}

impl EntityNode {
    /// Fetch and build one node, without sector expansion.
    pub async fn fetch<F: Fetch>(
        fetcher: &F,
        ticker: &str,
        config: &SpiderConfig,
    ) -> Result<Self, Error> {
        let (node, _) = Self::fetch_inner(fetcher, ticker, config).await?;
        Ok(node)
    }

    /// Fetch and build one node, then expand it one level: every sector link
    /// on its quote page is followed and each related ticker becomes a leaf
    /// child. Children never expand further, bounding the tree depth at 2.
    pub async fn fetch_expanded<F: Fetch>(
        fetcher: &F,
        ticker: &str,
        config: &SpiderConfig,
        tui: bool,
    ) -> Result<Self, Error> {
        let (mut node, links) = Self::fetch_inner(fetcher, ticker, config).await?;
        debug!(
            "[{}] expanding {} sector link(s) ...",
            node.ticker,
            links.len()
        );
        node.children = Some(screener::expand(fetcher, &links, config, tui).await);
        Ok(node)
    }

    /// Shared construction path: fetch the quote page, extract the snapshot
    /// grid, derive the numeric vector, and collect sector links for a caller
    /// that wants to expand. The parsed document never crosses an await.
    async fn fetch_inner<F: Fetch>(
        fetcher: &F,
        ticker: &str,
        config: &SpiderConfig,
    ) -> Result<(Self, Vec<SectorLink>), Error> {
        let ticker = ticker.trim().to_uppercase();
        trace!("fetching quote page for [{ticker}]");
        let body = fetcher.fetch(&quote_url(&ticker)).await?;

        let doc = Html::parse_document(&body);
        let attributes = quote::extract_attributes(&doc)?;
        let links = screener::sector_links(&doc, config.min_volume());
        drop(doc);

        let (numeric_vector, unresolved) = derive_numeric_vector(&attributes, config.important());
        if !unresolved.is_empty() {
            // one line per node, not per attribute
            warn!("[{ticker}] attributes without numeric values: {unresolved:?}");
        }
        trace!(
            "[{ticker}] extracted {} attribute(s), {} numeric",
            attributes.len(),
            numeric_vector.len()
        );

        Ok((
            Self {
                ticker,
                attributes,
                numeric_vector,
                unresolved,
                children: None,
            },
            links,
        ))
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn numeric_vector(&self) -> &NumericVector {
        &self.numeric_vector
    }

    /// Attribute names that were important but did not coerce to a number.
    pub fn unresolved(&self) -> &BTreeSet<String> {
        &self.unresolved
    }

    /// Sector children, present only when expansion ran on this node.
    pub fn children(&self) -> Option<&SectorChildren> {
        self.children.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn stub(ticker: &str, attributes: AttributeMap, important: &ImportantAttributes) -> Self {
        let (numeric_vector, unresolved) = derive_numeric_vector(&attributes, important);
        Self {
            ticker: ticker.to_uppercase(),
            attributes,
            numeric_vector,
            unresolved,
            children: None,
        }
    }
}
