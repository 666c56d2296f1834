use anyhow::Result;
use clap::{Parser, Subcommand};
use futures_util::future::join_all;
use krypt::{
    config::{ClientArgs, ClientConfig},
    gif::GifLookup,
    render::{render_status, render_transactions},
    Error, FormField, TransactionContext,
};
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Krypt - send ETH with a message and browse the on-chain transfer ledger
#[derive(Parser)]
#[command(name = "krypt")]
#[command(about = "Krypt - wallet-backed transfers recorded on a ledger contract", long_about = None)]
struct Cli {
    #[command(flatten)]
    client: ClientArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the connected account and cached transaction count
    Status,

    /// Request account access from the wallet
    Connect,

    /// Send ETH and record the message and keyword on the ledger
    Send {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Amount in ETH, e.g. 0.01
        #[arg(long)]
        amount: String,

        /// Message stored with the transfer
        #[arg(long, default_value = "")]
        message: String,

        /// Keyword used to pick a GIF
        #[arg(long, default_value = "")]
        keyword: String,
    },

    /// List all transfers recorded on the ledger
    Transactions {
        /// Resolve each keyword to a GIF URL
        #[arg(long)]
        gifs: bool,
    },

    /// Look up the GIF for a keyword
    Gif {
        /// Search keyword; spaces are removed before querying
        keyword: String,
    },
}

/// Surface the provider-absent alert; other startup failures only degrade output.
fn report_init(result: krypt::Result<()>) {
    match result {
        Ok(()) => {}
        Err(Error::ProviderMissing) => println!("{}", Error::ProviderMissing),
        Err(e) => warn!(error = %e, "Startup sync incomplete"),
    }
}

async fn mounted(config: &ClientConfig) -> Result<TransactionContext> {
    let ctx = config.context().await?;
    report_init(ctx.init().await);
    Ok(ctx)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy()
        .add_directive("alloy=warn".parse()?)
        .add_directive("krypt=info".parse()?);

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(true))
        .with(filter)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::load(cli.client)?;

    match cli.command {
        Commands::Status => {
            let ctx = mounted(&config).await?;
            println!("{}", render_status(&ctx.snapshot().await));
        }
        Commands::Connect => {
            let ctx = config.context().await?;
            match ctx.connect_wallet().await {
                Ok(account) => println!("Connected: {account}"),
                Err(Error::ProviderMissing) => println!("{}", Error::ProviderMissing),
                Err(e) => {
                    error!(error = %e, "Failed to connect wallet");
                    return Err(e.into());
                }
            }
            println!("{}", render_status(&ctx.snapshot().await));
        }
        Commands::Send {
            to,
            amount,
            message,
            keyword,
        } => {
            let ctx = mounted(&config).await?;
            ctx.handle_change(FormField::AddressTo, to).await;
            ctx.handle_change(FormField::Amount, amount).await;
            ctx.handle_change(FormField::Message, message).await;
            ctx.handle_change(FormField::Keyword, keyword).await;

            let receipt = ctx.send_transaction().await?;
            println!("Transfer sent!");
            println!("Transfer hash: {:?}", receipt.transfer_hash);
            println!("Ledger hash: {:?}", receipt.ledger_hash);
            println!();
            println!("{}", render_status(&ctx.snapshot().await));
        }
        Commands::Transactions { gifs } => {
            let ctx = mounted(&config).await?;
            let snapshot = ctx.snapshot().await;

            if gifs {
                let client = config.gif_client()?;
                let lookups = snapshot.transactions.iter().map(|tx| {
                    let client = client.clone();
                    async move {
                        if tx.keyword.is_empty() {
                            "-".to_string()
                        } else {
                            client.fetch(&tx.keyword).await
                        }
                    }
                });
                let urls = join_all(lookups).await;
                println!("{}", render_transactions(&snapshot.transactions, Some(&urls)));
            } else {
                println!("{}", render_transactions(&snapshot.transactions, None));
            }
        }
        Commands::Gif { keyword } => {
            let mut lookup = GifLookup::new(config.gif_client()?);
            match lookup.update(&keyword).await {
                Some(url) => println!("{url}"),
                None => println!("Empty keyword, nothing to look up"),
            }
        }
    }

    Ok(())
}
