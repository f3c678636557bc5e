use clap::Parser;
use shoprank::cli::handle_analyze;
use shoprank::cli::handle_config;
use shoprank::cli::handle_search;
use shoprank::cli::handle_serve;
use shoprank::cli::Cli;
use shoprank::cli::Commands;
use shoprank::cli::SearchArgs;
use shoprank::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration first
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    if cli.verbose {
        shoprank::logging::init_logging_with_level("debug")?;
    } else {
        shoprank::logging::init_logging_with_config(Some(&config))?;
    }
    if config.logging.backtrace {
        std::env::set_var("RUST_BACKTRACE", "1");
    }

    match cli.command {
        Commands::Serve { host, port, dev } => handle_serve(config, host, port, dev).await,
        Commands::Search {
            query,
            category,
            price_range,
            sort_by,
            page,
            format,
        } => {
            let args = SearchArgs {
                query,
                category,
                price_range,
                sort_by,
                page,
                format,
            };
            handle_search(&config, args).await
        }
        Commands::Analyze { query, category } => handle_analyze(&config, &query, category.as_deref()),
        Commands::Config => handle_config(&config),
    }?;

    Ok(())
}
