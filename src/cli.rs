use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mos-portal")]
#[command(about = "Marketing intelligence batch jobs (price / hero / signal)", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile official prices against shopping-search lowest prices
    Price {
        /// Input price-list CSV (auto-discovered when omitted)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Result CSV path (default: result_MMDD.csv)
        #[arg(long)]
        output_csv: Option<PathBuf>,

        /// Dashboard HTML path
        #[arg(long, default_value = "marketing_portal_final.html")]
        output_html: PathBuf,

        /// Delay between API calls, in seconds
        #[arg(long, default_value = "0.15")]
        delay: f64,

        /// Lowest-price lower bound
        #[arg(long)]
        min_price: Option<i64>,

        /// Lowest-price upper bound
        #[arg(long)]
        max_price: Option<i64>,

        /// Comma-separated seller-name keywords to exclude
        #[arg(long, default_value = "")]
        exclude_malls: String,

        /// Directory holding accumulated result_*.csv snapshots
        #[arg(long, default_value = ".")]
        history_dir: PathBuf,

        /// Search API response cache directory
        #[arg(long, default_value = ".naver_cache")]
        cache_dir: PathBuf,

        /// Cache TTL in hours
        #[arg(long, default_value = "12")]
        cache_ttl_hours: u64,

        /// Process only the first N products
        #[arg(long, default_value = "100")]
        limit: usize,

        /// Official product-image hash CSV
        #[arg(long, default_value = "official_hashes.csv")]
        official_hashes: PathBuf,
    },

    /// Capture competitor hero banners (configured via environment)
    Hero,

    /// Collect forum brand mentions into a VOC report
    Signal {
        /// Collection window in days (today inclusive)
        #[arg(long)]
        days: Option<i64>,

        /// Maximum list pages to walk
        #[arg(long)]
        max_pages: Option<u32>,
    },
}
