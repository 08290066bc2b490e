mod config_commands;
mod countdown_commands;

use {
    clap::{Parser, Subcommand},
    porch_onboarding::LiveOnboardingService,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

/// Tier preselected by the landing page when none is chosen.
const DEFAULT_TIER: &str = "DIRECTORY ANCHOR";

#[derive(Parser)]
#[command(name = "porch", about = "Porch: onboarding for the Legacy Power local network")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides default ~/.config/porch/).
    #[arg(long, global = true, env = "PORCH_CONFIG_DIR")]
    config_dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List tiers and add-ons with their prices.
    Catalog,
    /// Interactive onboarding wizard.
    Onboard {
        /// Tier to onboard onto, e.g. "LEGACY ACCELERATOR".
        #[arg(long, default_value = DEFAULT_TIER)]
        tier: String,
    },
    /// Time left in the stewardship window.
    Countdown {
        /// Keep ticking every second until the window closes.
        #[arg(long)]
        watch: bool,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    if let Some(ref dir) = cli.config_dir {
        porch_config::set_config_dir(dir.clone());
    }
    info!(version = env!("CARGO_PKG_VERSION"), "porch starting");

    match cli.command {
        Commands::Catalog => {
            let config = porch_config::discover_and_load();
            print_catalog(&config.pricing);
            Ok(())
        },
        Commands::Onboard { tier } => {
            let config = porch_config::discover_and_load();
            let service = LiveOnboardingService::from_config(&config);
            porch_onboarding::wizard::run_onboarding(&service, &tier).await?;
            Ok(())
        },
        Commands::Countdown { watch } => countdown_commands::handle_countdown(watch).await,
        Commands::Config { action } => config_commands::handle_config(action),
    }
}

fn print_catalog(pricing: &porch_config::PricingConfig) {
    println!("Tiers:");
    for tier in &pricing.tiers {
        println!("  {:<24} {}", tier.name, tier.price);
    }
    println!("\nAdd-ons:");
    for add_on in &pricing.add_ons {
        println!(
            "  {:<6} {:<28} +{}  {}",
            add_on.id, add_on.name, add_on.price, add_on.description
        );
    }
}
