use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use tronmint_app::{Dashboard, DashboardSettings, setup};
use tronmint_core::{DashboardConfig, logging};
use tronmint_wallet::{
    KeyStore, PageContext, PageMessageListener, TokenArtifact, TronAddress, WalletProvider,
    describe_network, known_networks, validate_url,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Password for the key store. Secrets never go on the command line.
const ENV_KEY_PASSWORD: &str = "TRONMINT_KEY_PASSWORD";

#[derive(Debug, Parser)]
#[command(name = "tronmint", version, about = "Deploy and mint TRC20 tokens on TRON")]
struct Cli {
    /// Full node endpoint; overrides the config file and TRONMINT_RPC_URL.
    #[arg(long, global = true)]
    rpc: Option<String>,

    /// Name of the key store entry to sign with.
    #[arg(long, global = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show known networks, or the one an RPC endpoint belongs to.
    Network { rpc_url: Option<String> },
    /// Look up a transaction.
    Tx {
        id: String,
        /// Wait for the receipt instead of a single lookup.
        #[arg(long)]
        wait: bool,
    },
    /// TRX balance of the signing account, plus a token balance.
    Balance {
        #[arg(long)]
        token: Option<TronAddress>,
    },
    /// Deploy a mintable token and wait for it to be confirmed.
    Deploy(DeployArgs),
    /// Mint tokens to an address.
    Mint {
        #[arg(long)]
        token: TronAddress,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },
    /// Manage the encrypted key store.
    #[command(subcommand)]
    Key(KeyCommand),
}

#[derive(Debug, Args)]
struct DeployArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    symbol: String,
    #[arg(long, default_value = "6")]
    decimals: String,
    /// Compiled artifact; defaults to `artifact_path` from the config.
    #[arg(long)]
    artifact: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum KeyCommand {
    /// Encrypt and store a hex private key read from stdin.
    Import {
        #[arg(long)]
        name: String,
    },
    List,
    Remove { name: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match DashboardConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    };
    let _log_guard = match logging::init_logging(config.log_filter.as_deref()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("logging disabled: {e:#}");
            None
        }
    };
    info!("Starting tronmint v{VERSION}");

    if let Err(e) = run(cli, config).await {
        error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mut config: DashboardConfig) -> Result<()> {
    if let Some(rpc) = &cli.rpc {
        config.rpc_url = rpc.clone();
    }
    config.validate()?;

    match cli.command {
        Command::Network { rpc_url } => {
            if let Some(url) = rpc_url.as_deref().filter(|url| !validate_url(url)) {
                anyhow::bail!("Not an http(s) URL: {url}");
            }
            show_networks(rpc_url.as_deref().unwrap_or(&config.rpc_url), rpc_url.is_some());
            Ok(())
        }
        Command::Key(command) => run_key_command(&config, command),
        Command::Tx { id, wait } => {
            let (dashboard, listener) = open_dashboard(&config, cli.key.as_deref(), None)?;
            let found = if wait {
                dashboard.confirm_transaction(&id).await?
            } else {
                dashboard.lookup_transaction(&id).await?
            };
            listener.stop().await;
            let tx = found.context("No wallet provider available")?;
            if tx.is_empty() {
                anyhow::bail!("Transaction {id} not found");
            }
            println!("{}", serde_json::to_string_pretty(tx.raw())?);
            Ok(())
        }
        Command::Balance { token } => {
            let (mut dashboard, listener) = open_dashboard(&config, cli.key.as_deref(), None)?;
            dashboard.connect().await?;
            if let Some(token) = token {
                dashboard.set_token(token, None);
                dashboard.refresh_balances().await?;
            }
            listener.stop().await;
            println!("{}", serde_json::to_string_pretty(dashboard.state())?);
            Ok(())
        }
        Command::Deploy(args) => {
            let artifact = setup::load_artifact(&config, args.artifact.as_deref())?;
            let key = require_key(cli.key.as_deref())?;
            let (mut dashboard, listener) = open_dashboard(&config, Some(key), Some(artifact))?;
            dashboard.connect().await?;

            let form = dashboard.form_mut();
            form.name = args.name;
            form.symbol = args.symbol;
            form.decimals = args.decimals;
            let token = dashboard.deploy_from_form().await?;
            listener.stop().await;

            println!("token: {token}");
            print_links(&dashboard);
            Ok(())
        }
        Command::Mint { token, to, amount } => {
            let key = require_key(cli.key.as_deref())?;
            let (mut dashboard, listener) = open_dashboard(&config, Some(key), None)?;
            dashboard.connect().await?;
            dashboard.set_token(token, None);

            let form = dashboard.form_mut();
            form.address = to;
            form.amount = amount;
            let result = dashboard.mint_from_form().await?;
            listener.stop().await;

            println!("txid: {}", result.txid().unwrap_or("unknown"));
            print_links(&dashboard);
            Ok(())
        }
    }
}

/// Build a dashboard over a headless wallet injected into a fresh page,
/// with a listener logging the page's messages.
fn open_dashboard(
    config: &DashboardConfig,
    key: Option<&str>,
    artifact: Option<TokenArtifact>,
) -> Result<(Dashboard, PageMessageListener)> {
    let signer = match key {
        Some(name) => Some(setup::unlock_signer(config, name, &key_password()?)?),
        None => None,
    };
    let wallet: Arc<dyn WalletProvider> = Arc::new(setup::headless_wallet(config, signer)?);
    let page = Arc::new(PageContext::with_provider(wallet));
    let listener = PageMessageListener::spawn(&page);

    // Reading balances and transactions needs only the ABI.
    let artifact = artifact.unwrap_or_else(TokenArtifact::abi_only);
    let dashboard = Dashboard::new(page, artifact, DashboardSettings::from_config(config));
    Ok((dashboard, listener))
}

fn require_key(key: Option<&str>) -> Result<&str> {
    key.context("This command signs a transaction; pass --key <name>")
}

fn key_password() -> Result<String> {
    std::env::var(ENV_KEY_PASSWORD)
        .with_context(|| format!("Set {ENV_KEY_PASSWORD} to unlock the key store"))
}

fn run_key_command(config: &DashboardConfig, command: KeyCommand) -> Result<()> {
    let path = config.keystore_file()?;
    let mut store = if path.exists() {
        KeyStore::load_from_file(&path)?
    } else {
        KeyStore::new()
    };

    match command {
        KeyCommand::Import { name } => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read private key from stdin")?;
            let secret = setup::parse_private_key(&line)?;
            let id = store.add_key(&name, &secret, &key_password()?)?;
            store.save_to_file(&path)?;
            let entry = store.get_key(&id).context("Stored key vanished")?;
            println!("{}  {}", entry.name, entry.address);
        }
        KeyCommand::List => {
            for entry in store.list_keys() {
                println!("{}  {}  {}", entry.name, entry.address, entry.created_at.to_rfc3339());
            }
        }
        KeyCommand::Remove { name } => {
            let id = store
                .find_by_name(&name)
                .map(|entry| entry.id.clone())
                .with_context(|| format!("No key named '{name}'"))?;
            store.remove_key(&id);
            store.save_to_file(&path)?;
            println!("removed {name}");
        }
    }
    Ok(())
}

fn show_networks(rpc_url: &str, single: bool) {
    if single {
        match describe_network(rpc_url) {
            Some(network) => println!("{}  {}", network.name, network.explorer.transaction_url),
            None => println!("unknown network: {rpc_url}"),
        }
        return;
    }
    for (url, network) in known_networks() {
        let marker = if url == rpc_url { "*" } else { " " };
        println!("{marker} {:<8} {url}", network.name);
    }
}

fn print_links(dashboard: &Dashboard) {
    if let Some(link) = dashboard.transaction_link() {
        println!("transaction: {link}");
    }
    if let Some(link) = dashboard.token_link() {
        println!("token page:  {link}");
    }
}
