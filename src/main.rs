use castinspo::{
    chain::Address,
    client::{
        AppSnapshot,
        CliController,
    },
    config::{
        AppConfig,
        expand_path,
    },
    render::CardImage,
    share::ShareOutcome,
};
use clap::{
    Args,
    Parser,
    Subcommand,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    sync::OnceLock,
    time::Duration,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

const RECONCILE_GRACE: Duration = Duration::from_secs(30);

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Parser)]
#[command(
    name = "castinspo",
    about = "Daily quote cards, share-to-claim rewards on Base",
    arg_required_else_help = true
)]
struct Cli {
    /// JSON config file; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<String>,
    /// Overrides the chain read endpoint
    #[arg(long, global = true)]
    rpc_url: Option<String>,
    /// Endpoint of the wallet that signs the claim
    #[arg(long, global = true)]
    wallet_rpc_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct QuoteArgs {
    /// Quote index or a launch link carrying `?q=<index>`
    #[arg(long)]
    quote: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a quote card to a PNG file
    Render {
        #[command(flatten)]
        quote: QuoteArgs,
        #[arg(long, short, default_value = "castinspo.png")]
        out: String,
    },
    /// Show today's claim status for the wallet account or a given address
    Status {
        #[arg(long)]
        address: Option<Address>,
    },
    /// Share a quote card through the composer
    Share {
        #[command(flatten)]
        quote: QuoteArgs,
    },
    /// Share a quote card, then claim today's reward
    Claim {
        #[command(flatten)]
        quote: QuoteArgs,
        /// Share the reward caption once the claim is submitted
        #[arg(long)]
        share_reward: bool,
        /// Return without waiting for the on-chain reconciliation
        #[arg(long)]
        no_wait: bool,
    },
}

fn init_tracing() {
    let appender = rolling::daily("logs", "castinspo.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
}

fn print_snapshot(snapshot: &AppSnapshot) {
    if let Some(quote) = &snapshot.quote {
        println!("#{} \"{}\" - {}", quote.id, quote.text, quote.author);
    }
    if let Some(link) = &snapshot.deep_link {
        println!("link:     {link}");
    }
    match snapshot.address {
        Some(address) => println!("address:  {address}"),
        None => println!("address:  (not connected)"),
    }
    if let Some(day) = snapshot.day {
        println!(
            "day:      {} (last claim {})",
            day.current_day, day.last_claim_day
        );
    }
    println!(
        "claim:    {} (claimed today: {})",
        snapshot.phase, snapshot.has_claimed_today
    );
    println!("status:   {}", snapshot.status);
    for err in &snapshot.errors {
        println!("error:    {err}");
    }
}

fn print_outcome(outcome: &ShareOutcome) {
    match outcome {
        ShareOutcome::NativeShare => println!("shared"),
        ShareOutcome::HostedCompose {
            image_url,
            compose_url,
        } => {
            println!("image:    {image_url}");
            println!("composer: {compose_url}");
        }
        ShareOutcome::TextCompose { compose_url }
        | ShareOutcome::OutboundLink { compose_url }
        | ShareOutcome::Exhausted { compose_url } => println!("composer: {compose_url}"),
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.rpc_url {
        config.chain.rpc_url = url.clone();
    }
    if let Some(url) = &cli.wallet_rpc_url {
        config.chain.wallet_rpc_url = Some(url.clone());
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();
    tracing::info!("starting castinspo");

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let mut app = CliController::from_config(&config)?;

    match cli.command {
        Commands::Render { quote, out } => {
            let card = app.show_quote(quote_index(&quote)).clone();
            let CardImage::Rendered(image) = &card.image else {
                return Err(eyre!("card could not be rendered"));
            };
            let path = expand_path(&out);
            std::fs::write(&path, &image.bytes)
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            println!(
                "#{} written to {} ({}x{}, sha256 {})",
                card.quote.id,
                path.display(),
                image.width_px,
                image.height_px,
                image.fingerprint()
            );
        }
        Commands::Status { address } => {
            match address {
                Some(address) => app.watch(address).await,
                None => app.startup(None).await,
            }
            print_snapshot(&app.snapshot());
        }
        Commands::Share { quote } => {
            app.startup(quote.quote.as_deref()).await;
            let outcome = app.share().await;
            print_outcome(&outcome);
            print_snapshot(&app.snapshot());
        }
        Commands::Claim {
            quote,
            share_reward,
            no_wait,
        } => {
            app.startup(quote.quote.as_deref()).await;
            let outcome = app.share().await;
            print_outcome(&outcome);
            app.claim().await;
            if share_reward {
                if let Some(outcome) = app.share_reward().await {
                    print_outcome(&outcome);
                }
            }
            if !no_wait && app.claim_controller().state().pending_tx.is_some() {
                println!("waiting for the claim to land...");
                let limit = app.claim_controller().policy().reconcile_delay + RECONCILE_GRACE;
                if !app.wait_background(limit).await {
                    println!("no confirmation yet, run `castinspo status` later");
                }
            }
            print_snapshot(&app.snapshot());
        }
    }
    Ok(())
}

fn quote_index(args: &QuoteArgs) -> Option<i64> {
    args.quote
        .as_deref()
        .and_then(castinspo::share::compose::quote_index_from_link)
}
