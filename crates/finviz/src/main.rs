mod cli;

// remote imports
use clap::Parser;
use cli::{Cli, TraceLevel};
use finviz_spider::{ComparisonSet, EntityNode, HttpFetcher, ImportantAttributes, SpiderConfig};
use std::io::Write;
use std::num::NonZeroUsize;
use std::time::Duration;
use tracing::{error, info, subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

////////////////////////////////////////////////////////////////////////////

/// The attribute names retained for numeric analysis when none are given on
/// the command line. Names that never coerce (52W Range, Earnings dates, ...)
/// are already left out.
const DEFAULT_ATTRIBUTES: &[&str] = &[
    "P/E",
    "EPS (ttm)",
    "Insider Own",
    "Shs Outstand",
    "Perf Week",
    "Market Cap",
    "Forward P/E",
    "EPS next Y",
    "Insider Trans",
    "Shs Float",
    "Perf Month",
    "Income",
    "PEG",
    "EPS next Q",
    "Short Float",
    "Perf Quarter",
    "Sales",
    "P/S",
    "EPS this Y",
    "Inst Trans",
    "Short Ratio",
    "Perf Half Y",
    "Book/sh",
    "P/B",
    "ROA",
    "Target Price",
    "Perf Year",
    "Cash/sh",
    "P/C",
    "EPS next 5Y",
    "ROE",
    "Perf YTD",
    "P/FCF",
    "EPS past 5Y",
    "ROI",
    "52W High",
    "Beta",
    "Quick Ratio",
    "Sales past 5Y",
    "Gross Margin",
    "52W Low",
    "ATR",
    "Employees",
    "Current Ratio",
    "Sales Q/Q",
    "Oper. Margin",
    "RSI (14)",
    "Debt/Eq",
    "EPS Q/Q",
    "Profit Margin",
    "Rel Volume",
    "LT Debt/Eq",
    "Payout",
    "Avg Volume",
    "Price",
    "Recom",
    "SMA20",
    "SMA50",
    "SMA200",
    "Change",
];

////////////////////////////////////////////////////////////////////////////

// preproccess the trace level, and open the .env file
fn preprocess(trace_level: Level) {
    dotenv::dotenv().ok();
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber).expect("Set subscriber");
}

////////////////////////////////////////////////////////////////////////////

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // set the trace level
    if let Some(trace_level) = cli.trace {
        preprocess(match trace_level {
            TraceLevel::DEBUG => Level::DEBUG,
            TraceLevel::ERROR => Level::ERROR,
            TraceLevel::INFO => Level::INFO,
            TraceLevel::TRACE => Level::TRACE,
            TraceLevel::WARN => Level::WARN,
        });
    } else {
        dotenv::dotenv().ok();
    }
    trace!("command line input recorded: {cli:?}");

    // if no trace level provided, use tui
    let tui = cli.trace.is_none();

    // read cli inputs
    use cli::Commands::*;
    match cli.command {
        Quote {
            tickers,
            attribute,
            expand,
            min_volume,
            concurrency,
            timeout,
            save,
            json,
        } => {
            let important = match attribute {
                Some(names) => ImportantAttributes::new(names),
                None => ImportantAttributes::new(DEFAULT_ATTRIBUTES.iter().copied()),
            };
            let config = SpiderConfig::new(important)
                .with_min_volume(min_volume.map(Into::into))
                .with_concurrency(NonZeroUsize::new(concurrency).unwrap_or(NonZeroUsize::MIN));
            let fetcher = HttpFetcher::new(Duration::from_secs(timeout));

            for ticker in &tickers {
                let time = std::time::Instant::now();
                let node = if expand {
                    EntityNode::fetch_expanded(&fetcher, ticker, &config, tui).await?
                } else {
                    EntityNode::fetch(&fetcher, ticker, &config).await?
                };
                info!(
                    "[{}] collected, time elapsed: {:?}",
                    node.ticker(),
                    time.elapsed()
                );

                if save {
                    save_ticker_data(&node)?;
                }
                if json {
                    println!("{}", serde_json::to_string_pretty(&node)?);
                } else {
                    print_summary(&node, &config);
                }
            }
        }
    }

    Ok(())
}

////////////////////////////////////////////////////////////////////////////

/// Write one ticker's raw attributes to `{TICKER}.txt`.
fn save_ticker_data(node: &EntityNode) -> anyhow::Result<()> {
    let path = format!("{}.txt", node.ticker());
    let mut file = std::fs::File::create(&path)?;
    for (key, value) in node.attributes().iter() {
        writeln!(file, " {key}: {value}")?;
    }
    info!("[{}] attributes written to {path}", node.ticker());
    Ok(())
}

fn print_summary(node: &EntityNode, config: &SpiderConfig) {
    println!(
        "{bar}\n{name:^40}\n{bar}",
        bar = "=".repeat(40),
        name = node.ticker()
    );
    for (name, value) in node.numeric_vector().iter() {
        println!("{name:>16}: {value}");
    }
    if !node.unresolved().is_empty() {
        println!("{:>16}: {:?}", "non-numeric", node.unresolved());
    }

    let Some(children) = node.children() else {
        return;
    };
    for (sector, peers) in children.sectors() {
        let set = ComparisonSet::new(peers.iter().chain(std::iter::once(node)));
        println!("\n[{sector}] {} peer(s):", peers.len());
        for peer in peers {
            println!("  {}", peer.ticker());
        }
        match set.assemble_matrix(config.important()) {
            Ok(matrix) => {
                let (rows, cols) = matrix.shape();
                println!("  comparison matrix assembled: {rows} x {cols}");
            }
            Err(err) => {
                error!("failed to assemble comparison matrix for [{sector}], error({err})")
            }
        }
    }
    for (sector, err) in children.failures() {
        println!("\n[{sector}] skipped, error({err})");
    }
}
