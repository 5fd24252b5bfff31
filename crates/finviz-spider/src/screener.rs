//! Sector expansion: discover the screener links on a quote page and fetch a
//! leaf [`EntityNode`] for every ticker the screener lists.

use crate::error::Error;
use crate::http::{Fetch, BASE_URL};
use crate::node::{EntityNode, SpiderConfig};
use futures::{stream, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use scraper::{ElementRef, Html, Selector};
use serde::ser::{Serialize, SerializeMap, SerializeStruct, Serializer};
use std::time::Duration;
use tracing::{debug, error, info, trace};

// Layout contract with the external page (finviz screener, current version):
// results live under `div#screener-content`, inside the first table, whose
// direct child node at offset 6 (text nodes counted) wraps the nested results
// table; ticker anchors carry the `screener-link-primary` class. Offset drift
// must surface as `Error::Expansion`, never as wrong data.
pub const RESULTS_ROW_OFFSET: usize = 6;
const RESULTS_CONTAINER: &str = "div#screener-content";
const TICKER_LINK: &str = "a.screener-link-primary";

/// Screener average-volume buckets, in thousands of shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum MinVolume {
    Over50,
    Over100,
    Over200,
    Over300,
    Over400,
    Over500,
    Over750,
    Over1000,
    Over2000,
}

impl MinVolume {
    /// The screener filter token appended to a sector link.
    pub fn query_token(self) -> &'static str {
        match self {
            MinVolume::Over50 => "sh_avgvol_o50",
            MinVolume::Over100 => "sh_avgvol_o100",
            MinVolume::Over200 => "sh_avgvol_o200",
            MinVolume::Over300 => "sh_avgvol_o300",
            MinVolume::Over400 => "sh_avgvol_o400",
            MinVolume::Over500 => "sh_avgvol_o500",
            MinVolume::Over750 => "sh_avgvol_o750",
            MinVolume::Over1000 => "sh_avgvol_o1000",
            MinVolume::Over2000 => "sh_avgvol_o2000",
        }
    }
}

/// One discovered sector-comparison link.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorLink {
    pub label: String,
    pub url: String,
}

/// Discover sector links on a quote document.
///
/// Screener-style navigation links are tagged `tab-link`; among them, a link
/// is a sector link iff its target contains the screener path marker. The
/// link's visible text keys the result; duplicate labels overwrite the URL but
/// keep discovery position. A configured volume filter is appended to every
/// link.
pub fn sector_links(doc: &Html, min_volume: Option<MinVolume>) -> Vec<SectorLink> {
    let link_selector = Selector::parse("a.tab-link").expect("tab-link selector");

    let mut links: Vec<SectorLink> = Vec::new();
    for anchor in doc.select(&link_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains("screener") {
            continue;
        }

        let label = anchor.text().collect::<String>();
        let url = match min_volume {
            Some(volume) => format!("{BASE_URL}/{href},{}", volume.query_token()),
            None => format!("{BASE_URL}/{href}"),
        };

        trace!("sector link found: [{label}] {url}");
        match links.iter_mut().find(|link| link.label == label) {
            Some(existing) => existing.url = url,
            None => links.push(SectorLink { label, url }),
        }
    }

    links
}

/// Children of an expanded node: per-sector peer lists in discovery order,
/// plus the sectors that were skipped and why.
#[derive(Debug, Default)]
pub struct SectorChildren {
    sectors: Vec<(String, Vec<EntityNode>)>,
    failures: Vec<(String, Error)>,
}

impl SectorChildren {
    pub fn sectors(&self) -> impl Iterator<Item = (&str, &[EntityNode])> {
        self.sectors
            .iter()
            .map(|(label, nodes)| (label.as_str(), nodes.as_slice()))
    }

    pub fn get(&self, label: &str) -> Option<&[EntityNode]> {
        self.sectors
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, nodes)| nodes.as_slice())
    }

    /// Sectors that were skipped, with the error that skipped them.
    pub fn failures(&self) -> &[(String, Error)] {
        &self.failures
    }

    /// Every child node across all sectors, in discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = &EntityNode> {
        self.sectors.iter().flat_map(|(_, nodes)| nodes.iter())
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }
}

impl Serialize for SectorChildren {
    // failures carry a non-serializable error; emit their display form
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Sectors<'a>(&'a [(String, Vec<EntityNode>)]);
        impl Serialize for Sectors<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (label, nodes) in self.0 {
                    map.serialize_entry(label, nodes)?;
                }
                map.end()
            }
        }

        struct Failures<'a>(&'a [(String, Error)]);
        impl Serialize for Failures<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (label, err) in self.0 {
                    map.serialize_entry(label, &err.to_string())?;
                }
                map.end()
            }
        }

        let mut state = serializer.serialize_struct("SectorChildren", 2)?;
        state.serialize_field("sectors", &Sectors(&self.sectors))?;
        state.serialize_field("failures", &Failures(&self.failures))?;
        state.end()
    }
}

/// Expand every sector link into a list of leaf nodes.
///
/// Sectors are processed one at a time; a layout mismatch or fetch failure
/// inside one sector skips that sector (recorded in `failures`) and the
/// others proceed. Children are fetched with the configured concurrency;
/// ordering of the results matches the screener's listing either way.
pub(crate) async fn expand<F: Fetch>(
    fetcher: &F,
    links: &[SectorLink],
    config: &SpiderConfig,
    tui: bool,
) -> SectorChildren {
    let time = std::time::Instant::now();
    let mut children = SectorChildren::default();

    for link in links {
        debug!("expanding sector [{}] ...", link.label);
        match expand_sector(fetcher, link, config, tui).await {
            Ok(nodes) => {
                info!("sector [{}] expanded, {} peer(s)", link.label, nodes.len());
                children.sectors.push((link.label.clone(), nodes));
            }
            Err(err) => {
                error!("failed to expand sector [{}], error({err})", link.label);
                children.failures.push((link.label.clone(), err));
            }
        }
    }

    info!(
        "expansion finished: {} sector(s), {} skipped, {}",
        children.sectors.len(),
        children.failures.len(),
        crate::time_elapsed(time)
    );
    children
}

async fn expand_sector<F: Fetch>(
    fetcher: &F,
    link: &SectorLink,
    config: &SpiderConfig,
    tui: bool,
) -> Result<Vec<EntityNode>, Error> {
    let body = fetcher.fetch(&link.url).await?;
    let tickers = {
        let doc = Html::parse_document(&body);
        screener_tickers(&doc, &link.label)?
    };
    trace!("sector [{}] lists {} ticker(s)", link.label, tickers.len());

    let pb = if tui {
        let pb = ProgressBar::new(tickers.len() as u64).with_style(
            ProgressStyle::default_bar()
                .template(
                    "{msg} {spinner:.magenta}\n\
                     [{elapsed_precise:.magenta}] |{bar:40.cyan/blue}| {human_pos}/{human_len}",
                )
                .expect("progress bar template")
                .progress_chars("##-"),
        );
        pb.set_message(format!("fetching [{}] peers ...", link.label));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    } else {
        ProgressBar::hidden()
    };

    // `buffered` keeps output order aligned with the screener listing even
    // when more than one fetch is in flight
    let nodes = stream::iter(tickers)
        .map(|ticker| {
            let pb = pb.clone();
            async move {
                let node = EntityNode::fetch(fetcher, &ticker, config).await;
                pb.inc(1);
                node
            }
        })
        .buffered(config.concurrency().get())
        .try_collect::<Vec<EntityNode>>()
        .await;

    pb.finish_and_clear();
    nodes
}

/// Pull the ticker symbols out of one screener results page.
fn screener_tickers(doc: &Html, sector: &str) -> Result<Vec<String>, Error> {
    let container_selector = Selector::parse(RESULTS_CONTAINER).expect("container selector");
    let table_selector = Selector::parse("table").expect("table selector");
    let ticker_selector = Selector::parse(TICKER_LINK).expect("ticker link selector");

    let expansion_error = |reason: String| Error::Expansion {
        sector: sector.to_string(),
        reason,
    };

    let container = doc
        .select(&container_selector)
        .next()
        .ok_or_else(|| expansion_error(format!("no `{RESULTS_CONTAINER}` in document")))?;
    let scaffold = container
        .select(&table_selector)
        .next()
        .ok_or_else(|| expansion_error("results container holds no table".to_string()))?;
    let results_row = scaffold
        .children()
        .nth(RESULTS_ROW_OFFSET)
        .and_then(ElementRef::wrap)
        .ok_or_else(|| {
            expansion_error(format!(
                "results scaffold has no element at child offset {RESULTS_ROW_OFFSET}"
            ))
        })?;
    let results_table = results_row
        .select(&table_selector)
        .next()
        .ok_or_else(|| expansion_error("no nested results table".to_string()))?;

    Ok(results_table
        .select(&ticker_selector)
        .map(|anchor| anchor.text().collect::<String>())
        .collect())
}
