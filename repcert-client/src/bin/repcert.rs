//! Operator CLI for the ReplicationCertificate contract.
//!
//! Deploys the contract, mints certificates and appends deals through a
//! JSON-RPC endpoint, signing with a key taken from the environment.

use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use repcert_client::infrastructure::{
    query_chain_id, ContractArtifact, DeploymentStore, JsonRpcLedger, LedgerConnection,
    LedgerOptions, TransactionSender,
};
use repcert_client::{
    AddDealsCommand, Address, CertificateClientConfig, CertificateOperationClient, DeployService,
    MintCertificateCommand, NetworkConfig, RepcertConfig,
};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Replication certificate CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "repcert")]
#[command(about = "Replication certificate operator client")]
struct Args {
    /// Configuration file (defaults to ./repcert.toml when present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Network to operate on.
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Give up after this many seconds. The transaction may still land.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy the contract from a compiled artifact.
    Deploy {
        /// Artifact JSON with `contractName` and `bytecode`.
        #[arg(long)]
        artifact: PathBuf,

        /// Deploy even if identical bytecode is already recorded.
        #[arg(long)]
        force: bool,
    },
    /// Mint a replication certificate for a CID.
    MintCertificate {
        /// Contract address (defaults to the recorded deployment).
        #[arg(long)]
        contract: Option<String>,

        /// Recipient of the certificate.
        #[arg(long)]
        to: String,

        /// Content identifier.
        #[arg(long)]
        cid: String,

        /// Storage deal ids.
        #[arg(required = true)]
        deals: Vec<String>,
    },
    /// Add storage deals to an existing certificate.
    AddDeal {
        /// Contract address (defaults to the recorded deployment).
        #[arg(long)]
        contract: Option<String>,

        /// Content identifier.
        #[arg(long)]
        cid: String,

        /// Storage deal ids, added one transaction each.
        #[arg(required = true)]
        deals: Vec<String>,
    },
}

/// Everything needed to sign against one network.
struct Session {
    name: String,
    network: NetworkConfig,
    rpc_url: Url,
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl Session {
    async fn open(config: &RepcertConfig, name: &str) -> Result<Self> {
        let network = config.network(name)?.clone();
        let rpc_url = network.rpc_url()?;
        let signer = network.signer().context("Failed to load signing key")?;

        let chain_id = match network.chain_id {
            Some(id) => id,
            None => query_chain_id(rpc_url.clone())
                .await
                .with_context(|| format!("Failed to query chain id from {rpc_url}"))?,
        };

        tracing::info!("Network: {} (chain {})", name, chain_id);
        tracing::info!("Wallet address: {}", signer.address());

        Ok(Self {
            name: name.to_string(),
            network,
            rpc_url,
            signer,
            chain_id,
        })
    }

    fn store(&self) -> DeploymentStore {
        DeploymentStore::new(&self.network.deployments_dir)
    }

    fn resolve_contract(&self, config: &RepcertConfig, contract: Option<&str>) -> Result<Address> {
        self.store()
            .resolve_address(&self.name, &config.contract_name, contract)
            .context("Failed to resolve contract address")
    }

    fn client(self, contract_address: Address) -> CertificateOperationClient<JsonRpcLedger> {
        let client_config = CertificateClientConfig {
            gas_limit: self.network.gas_limit,
            ..CertificateClientConfig::default()
        };
        let ledger = JsonRpcLedger::new(
            LedgerConnection {
                rpc_url: self.rpc_url,
                signer: self.signer,
                contract_address,
            },
            LedgerOptions {
                chain_id: self.chain_id,
                poll_interval: self.network.poll_interval(),
                schema: client_config.schema,
            },
        );
        CertificateOperationClient::new(ledger, client_config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // .env may set RUST_LOG as well as the key
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = RepcertConfig::load(args.config.as_deref()).context("Failed to load config")?;
    let network = args
        .network
        .clone()
        .unwrap_or_else(|| config.default_network.clone());

    with_timeout(args.timeout, run(args.command, config, network)).await
}

async fn run(command: Command, config: RepcertConfig, network: String) -> Result<()> {
    match command {
        Command::Deploy { artifact, force } => {
            let artifact = ContractArtifact::from_file(&artifact)
                .with_context(|| format!("Failed to read artifact {}", artifact.display()))?;
            let session = Session::open(&config, &network).await?;
            let store = session.store();
            let gas_limit = session.network.gas_limit;
            let sender = TransactionSender::new(
                session.rpc_url,
                session.signer,
                session.chain_id,
                session.network.poll_interval(),
            );

            let service = DeployService::new(sender, store, session.name, gas_limit);
            let outcome = service.deploy(&artifact, force).await?;
            if outcome.reused {
                println!(
                    "{} already deployed at {}",
                    outcome.record.contract_name, outcome.record.address
                );
            } else {
                println!(
                    "{} deployed at {}",
                    outcome.record.contract_name, outcome.record.address
                );
            }
        }
        Command::MintCertificate {
            contract,
            to,
            cid,
            deals,
        } => {
            let command = MintCertificateCommand::new(to, cid, deals);
            command.validate().context("Invalid mint-certificate arguments")?;

            let session = Session::open(&config, &network).await?;
            let contract_address = session.resolve_contract(&config, contract.as_deref())?;
            let client = session.client(contract_address);

            let result = client.mint_certificate(command).await?;
            println!("Complete! Token ID is: {}", result.token_id);
        }
        Command::AddDeal {
            contract,
            cid,
            deals,
        } => {
            let command = AddDealsCommand::new(cid, deals);
            command.validate().context("Invalid add-deal arguments")?;

            let session = Session::open(&config, &network).await?;
            let contract_address = session.resolve_contract(&config, contract.as_deref())?;
            let client = session.client(contract_address);

            let added = client
                .add_deals(command, |result| {
                    println!(
                        "Deal {} added in block {} ({})",
                        result.deal, result.block_number, result.transaction_hash
                    )
                })
                .await;
            match added {
                Ok(added) => println!("Complete! {} deal(s) added", added.len()),
                Err(e) => {
                    let committed = e.added().len();
                    return Err(anyhow::Error::new(e)
                        .context(format!("Stopped after {committed} committed deal(s)")));
                }
            }
        }
    }

    Ok(())
}

async fn with_timeout<F>(seconds: Option<u64>, future: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match seconds {
        Some(seconds) => tokio::time::timeout(Duration::from_secs(seconds), future)
            .await
            .with_context(|| format!("Timed out after {seconds}s"))?,
        None => future.await,
    }
}
