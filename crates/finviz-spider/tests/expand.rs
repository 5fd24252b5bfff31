//! End-to-end runs of the fetch/extract/expand pipeline over canned pages.

use finviz_spider::{
    ComparisonSet, EntityNode, Error, Fetch, ImportantAttributes, MinVolume, SpiderConfig,
};
use std::collections::HashMap;

const QUOTE_MSFT: &str = include_str!("files/quote_msft.html");
const QUOTE_AAPL: &str = include_str!("files/quote_aapl.html");
const QUOTE_GOOG: &str = include_str!("files/quote_goog.html");
const SCREENER_TECHNOLOGY: &str = include_str!("files/screener_technology.html");
const SCREENER_SOFTWARE: &str = include_str!("files/screener_software.html");

struct FixtureFetcher(HashMap<&'static str, &'static str>);

impl Fetch for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<String, Error> {
        self.0.get(url).map(|body| body.to_string()).ok_or_else(|| Error::Fetch {
            url: url.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

fn fixtures() -> FixtureFetcher {
    FixtureFetcher(HashMap::from([
        ("https://finviz.com/quote.ashx?t=MSFT&ty=c&ta=1&p=d", QUOTE_MSFT),
        ("https://finviz.com/quote.ashx?t=AAPL&ty=c&ta=1&p=d", QUOTE_AAPL),
        ("https://finviz.com/quote.ashx?t=GOOG&ty=c&ta=1&p=d", QUOTE_GOOG),
        ("https://finviz.com/screener.ashx?v=111&f=sec_technology", SCREENER_TECHNOLOGY),
        // the Software sector link resolves, but the page lost its results
        // container
        ("https://finviz.com/screener.ashx?v=111&f=ind_software", SCREENER_SOFTWARE),
    ]))
}

fn config() -> SpiderConfig {
    SpiderConfig::new(ImportantAttributes::new([
        "P/E",
        "PEG",
        "Beta",
        "Price",
        "Earnings",
        "Change",
    ]))
}

#[tokio::test]
async fn leaf_fetch_has_no_children() {
    let node = EntityNode::fetch(&fixtures(), "msft", &config()).await.unwrap();

    assert_eq!(node.ticker(), "MSFT");
    assert!(node.children().is_none());
    assert_eq!(node.attributes().get("P/E"), Some("33.95"));
    assert_eq!(node.numeric_vector().get("Price"), Some(394.04));
    // "Earnings" is a date, recorded as unresolved exactly once
    assert!(node.unresolved().contains("Earnings"));
}

#[tokio::test]
async fn expansion_builds_leaf_children_per_sector() {
    let node = EntityNode::fetch_expanded(&fixtures(), "MSFT", &config(), false)
        .await
        .unwrap();

    let children = node.children().expect("expansion ran");
    let technology = children.get("Technology").expect("technology peers");
    let tickers: Vec<&str> = technology.iter().map(|peer| peer.ticker()).collect();
    assert_eq!(tickers, ["AAPL", "GOOG"]);

    // depth is bounded at 2: no peer carries a children mapping
    for peer in children.nodes() {
        assert!(peer.children().is_none());
    }
}

#[tokio::test]
async fn one_bad_sector_does_not_block_the_others() {
    let node = EntityNode::fetch_expanded(&fixtures(), "MSFT", &config(), false)
        .await
        .unwrap();

    let children = node.children().unwrap();
    assert!(children.get("Technology").is_some());
    assert!(children.get("Software - Infrastructure").is_none());

    let failures = children.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "Software - Infrastructure");
    assert!(matches!(failures[0].1, Error::Expansion { .. }));
}

#[tokio::test]
async fn children_share_the_root_attribute_set() {
    let config = config();
    let node = EntityNode::fetch_expanded(&fixtures(), "MSFT", &config, false)
        .await
        .unwrap();

    let children = node.children().unwrap();
    for peer in children.nodes() {
        // every vector entry comes from the shared important set
        for (name, _) in peer.numeric_vector().iter() {
            assert!(config.important().contains(name));
        }
    }
}

#[tokio::test]
async fn volume_filter_is_part_of_the_sector_fetch() {
    let fetcher = FixtureFetcher(HashMap::from([
        ("https://finviz.com/quote.ashx?t=MSFT&ty=c&ta=1&p=d", QUOTE_MSFT),
        ("https://finviz.com/quote.ashx?t=AAPL&ty=c&ta=1&p=d", QUOTE_AAPL),
        ("https://finviz.com/quote.ashx?t=GOOG&ty=c&ta=1&p=d", QUOTE_GOOG),
        // only the suffixed URLs exist; expansion must request them
        (
            "https://finviz.com/screener.ashx?v=111&f=sec_technology,sh_avgvol_o500",
            SCREENER_TECHNOLOGY,
        ),
        (
            "https://finviz.com/screener.ashx?v=111&f=ind_software,sh_avgvol_o500",
            SCREENER_SOFTWARE,
        ),
    ]));
    let config = config().with_min_volume(Some(MinVolume::Over500));

    let node = EntityNode::fetch_expanded(&fetcher, "MSFT", &config, false)
        .await
        .unwrap();
    assert!(node.children().unwrap().get("Technology").is_some());
}

#[tokio::test]
async fn transport_failure_aborts_the_node() {
    let fetcher = FixtureFetcher(HashMap::new());
    let err = EntityNode::fetch(&fetcher, "MSFT", &config()).await.unwrap_err();
    assert!(matches!(err, Error::Fetch { .. }));
}

#[tokio::test]
async fn unreachable_peers_skip_their_sector() {
    // AAPL's quote page is gone; the Technology sector is recorded as failed
    // while Software's failure is independent of it
    let mut fixtures = fixtures();
    fixtures.0.remove("https://finviz.com/quote.ashx?t=AAPL&ty=c&ta=1&p=d");

    let node = EntityNode::fetch_expanded(&fixtures, "MSFT", &config(), false)
        .await
        .unwrap();

    let children = node.children().unwrap();
    assert!(children.is_empty());
    assert_eq!(children.failures().len(), 2);
    assert!(matches!(children.failures()[0].1, Error::Fetch { .. }));
}

#[tokio::test]
async fn comparison_set_spans_root_and_peers() {
    let config = config();
    let node = EntityNode::fetch_expanded(&fixtures(), "MSFT", &config, false)
        .await
        .unwrap();

    let children = node.children().unwrap();
    let set = ComparisonSet::new(children.nodes().chain(std::iter::once(&node)));
    assert_eq!(set.len(), 3);

    // GOOG's "Earnings" is "-", MSFT's and AAPL's are dates: all excluded
    assert_eq!(set.values_for("Earnings"), [] as [f64; 0]);
    assert_eq!(set.values_for("PEG"), [2.10, 1.45, 2.29]);

    let matrix = set.assemble_matrix(config.important()).unwrap();
    assert_eq!(matrix.shape(), (3, 6));
    // column order follows the important set: P/E, PEG, Beta, Price, Earnings, Change
    assert_eq!(matrix.get(2, 3), Some(394.04));
    assert!(matrix.get(0, 4).unwrap().is_nan());
}

#[tokio::test]
async fn nodes_serialize_for_the_json_dump() {
    let node = EntityNode::fetch(&fixtures(), "AAPL", &config()).await.unwrap();
    let json = serde_json::to_value(&node).unwrap();

    assert_eq!(json["ticker"], "AAPL");
    assert_eq!(json["attributes"]["P/E"], "28.10");
    assert_eq!(json["unresolved"][0], "Earnings");
    assert!(json.get("children").is_none());
}
