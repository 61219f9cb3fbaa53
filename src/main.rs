use alerter::{run_alerter_service, DiscordAlerter, Notifier};
use anyhow::Context;
use api_client::{ApiClient, CoinbaseClient};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use configuration::{init_tracing, load_config, Config};
use engine::LiveEngine;
use risk::{size_usd, RiskParameters};
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use std::time::Duration;

/// The main entry point for the trendbot trading application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets may live in a .env file; it is optional.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from '{}'", cli.config))?;
    let _log_guard = init_tracing(&config.logging)?;

    match cli.command {
        Commands::Run(args) => handle_run(config, args).await,
        Commands::Status => handle_status(config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// An adaptive EMA-variance spot trading bot.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file, with or without the .toml extension.
    #[arg(long, global = true, default_value = "config")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the trading loop until Ctrl-C.
    Run(RunArgs),
    /// Print price, balances and the current risk parameters once.
    Status,
}

#[derive(Args)]
struct RunArgs {
    /// Log and announce orders without submitting them.
    #[arg(long, conflicts_with = "live")]
    dry_run: bool,

    /// Submit real orders, overriding `trading.dry_run` in the configuration.
    #[arg(long)]
    live: bool,
}

// ==============================================================================
// Run Command Logic
// ==============================================================================

async fn handle_run(mut config: Config, args: RunArgs) -> anyhow::Result<()> {
    if args.dry_run {
        config.trading.dry_run = true;
    } else if args.live {
        config.trading.dry_run = false;
    }

    if !config.trading.dry_run
        && (config.exchange.api_key.is_empty() || config.exchange.api_secret.is_empty())
    {
        anyhow::bail!("Live trading requires exchange.api_key and exchange.api_secret");
    }

    let api_client: Arc<dyn ApiClient> = Arc::new(CoinbaseClient::new(&config.exchange)?);

    let (notifier, notification_rx) = Notifier::channel();
    let alerter = DiscordAlerter::new(&config.discord);
    let alerter_task = tokio::spawn(run_alerter_service(alerter, notification_rx));

    let mut engine = LiveEngine::new(&config, api_client, notifier)?;
    engine.run(shutdown_signal()).await;

    // Dropping the engine drops the last notifier, which lets the alerter drain and exit.
    drop(engine);
    if tokio::time::timeout(Duration::from_secs(5), alerter_task)
        .await
        .is_err()
    {
        tracing::warn!("Alerter did not finish delivering notifications in time.");
    }

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Ctrl-C received. Finishing the current cycle."),
        Err(e) => {
            tracing::error!(error = %e, "Unable to listen for Ctrl-C. Running until killed.");
            std::future::pending::<()>().await;
        }
    }
}

// ==============================================================================
// Status Command Logic
// ==============================================================================

async fn handle_status(config: Config) -> anyhow::Result<()> {
    let product = config.trading.product_id.as_str();
    let client = CoinbaseClient::new(&config.exchange)?;

    let spot = client.fetch_spot_price(product).await?;
    let account = client.fetch_balances(product).await?;
    let price = spot
        .to_f64()
        .context("Spot price does not fit in a floating point number")?;

    let equity = account.equity(price);
    let params = RiskParameters::for_equity(equity);
    let open_orders = match client.fetch_open_orders(product).await {
        Ok(orders) => orders
            .iter()
            .filter(|o| o.status.is_unresolved())
            .count()
            .to_string(),
        Err(e) => format!("unavailable ({e})"),
    };

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Product".to_string(), product.to_string()]);
    table.add_row(vec!["Spot price".to_string(), spot.to_string()]);
    table.add_row(vec!["Cash".to_string(), format!("${:.2}", account.cash())]);
    table.add_row(vec!["Asset balance".to_string(), account.asset_balance.to_string()]);
    table.add_row(vec!["Equity".to_string(), format!("${equity:.2}")]);
    table.add_row(vec![
        "Exposure".to_string(),
        format!("{:.1}%", account.exposure_fraction(price) * 100.0),
    ]);
    table.add_row(vec!["Exposure cap".to_string(), format!("${:.2}", params.exposure_cap)]);
    table.add_row(vec!["Cash buffer".to_string(), format!("${:.2}", params.cash_buffer)]);
    table.add_row(vec![
        "Cooldown".to_string(),
        format!("{}s", params.cooldown.num_seconds()),
    ]);
    table.add_row(vec![
        "Required drop since last buy".to_string(),
        format!("{:.2}%", params.required_drop * 100.0),
    ]);
    table.add_row(vec![
        "Adaptive buy / sell threshold".to_string(),
        format!(
            "{:.2}% / {:.2}%",
            params.base_buy_threshold * 100.0,
            params.base_sell_threshold * 100.0
        ),
    ]);
    table.add_row(vec![
        "Buy size at zero deviation".to_string(),
        format!("${:.2}", size_usd(equity, 0.0, 0, 0)),
    ]);
    table.add_row(vec!["Unresolved orders".to_string(), open_orders]);

    println!("{table}");
    Ok(())
}
