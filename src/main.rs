use clap::Parser;
use mos_portal::cli::{Cli, Commands};
use mos_portal::config::Config;
use mos_portal::{hero, pricing, signal};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "mos_portal=debug" } else { "mos_portal=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("❌ config: {}", e);
        }
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Price {
            input,
            output_csv,
            output_html,
            delay,
            min_price,
            max_price,
            exclude_malls,
            history_dir,
            cache_dir,
            cache_ttl_hours,
            limit,
            official_hashes,
        } => {
            let args = pricing::PriceArgs {
                input,
                output_csv,
                output_html,
                delay,
                min_price,
                max_price,
                exclude_malls: exclude_malls
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                history_dir,
                cache_dir,
                cache_ttl_hours,
                limit,
                official_hashes,
            };
            pricing::run(&config, args).await
        }
        Commands::Hero => hero::run(&config).await,
        Commands::Signal { days, max_pages } => {
            signal::run(&config, signal::SignalArgs { days, max_pages }).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}
