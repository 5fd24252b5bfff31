use clap::{Parser, Subcommand, ValueEnum};
use finviz_spider::MinVolume;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing.
    #[arg(short, long, global = true)]
    pub trace: Option<TraceLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scrape the quote-page metrics for each ticker.
    Quote {
        /// Ticker symbols to process.
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Attribute names kept for numeric analysis.
        ///
        /// Repeatable; when absent, the built-in list is used.
        #[arg(short, long)]
        attribute: Option<Vec<String>>,

        /// Follow the related-sector links and fetch every peer ticker in
        /// each sector.
        #[arg(short, long)]
        expand: bool,

        /// Screener minimum-average-volume filter, in thousands of shares.
        #[arg(short, long)]
        min_volume: Option<VolumeArg>,

        /// Peer quote pages fetched in flight during expansion.
        #[arg(short, long, default_value_t = 1)]
        concurrency: usize,

        /// Per-request timeout, in seconds.
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Write each root ticker's attributes to `{TICKER}.txt`.
        #[arg(short, long)]
        save: bool,

        /// Print each root node as JSON instead of the text summary.
        #[arg(short, long)]
        json: bool,
    },
}

#[allow(clippy::upper_case_acronyms)]
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum TraceLevel {
    DEBUG,
    ERROR,
    INFO,
    TRACE,
    WARN,
}

/// Volume buckets exposed on the command line, in thousands of shares.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum VolumeArg {
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

impl From<VolumeArg> for MinVolume {
    fn from(arg: VolumeArg) -> Self {
        match arg {
            VolumeArg::Over50 => MinVolume::Over50,
            VolumeArg::Over100 => MinVolume::Over100,
            VolumeArg::Over200 => MinVolume::Over200,
            VolumeArg::Over300 => MinVolume::Over300,
            VolumeArg::Over400 => MinVolume::Over400,
            VolumeArg::Over500 => MinVolume::Over500,
            VolumeArg::Over750 => MinVolume::Over750,
            VolumeArg::Over1000 => MinVolume::Over1000,
            VolumeArg::Over2000 => MinVolume::Over2000,
        }
    }
}
