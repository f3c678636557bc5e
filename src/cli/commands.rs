//! CLI command definitions and argument parsing

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(name = "shoprank")]
#[command(about = "ShopRank product search: HTTP service and command-line search")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Include error details in responses
        #[arg(long)]
        dev: bool,
    },
    /// Run a search and print one page of results
    Search {
        /// Free-text product query
        query: String,
        /// Category hint (mobile_phones, home_appliances, electronics, computers, all)
        #[arg(long)]
        category: Option<String>,
        /// Price range hint (low, medium, high)
        #[arg(long)]
        price_range: Option<String>,
        /// Sort order (relevance, price_low, price_high, rating)
        #[arg(long, default_value = "relevance")]
        sort_by: String,
        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: usize,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Show how a query is understood and classified, without searching
    Analyze {
        /// Free-text product query
        query: String,
        /// Category hint
        #[arg(long)]
        category: Option<String>,
    },
    /// Show current configuration
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}
