//! graphrica deploys the Publication contract, publishes the first posts and verifies the
//! sources on public networks.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use graphrica_deploy::{
    ArtifactRegistry, ChainClient, DeployConfig, DeployScript, EtherscanVerifier, Network,
    RpcChainClient, SubgraphNetworksHook, TracingReporter, summary_table,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let mut config = DeployConfig::load(&cli.config)?;
    if let Some(artifacts) = cli.artifacts {
        config.artifacts = artifacts;
    }

    let network = Network::resolve(cli.network.as_deref());
    let network_config = config.network(&network)?;

    tracing::debug!(
        %network,
        url = %network_config.url,
        artifacts = %config.artifacts.display(),
        "Configuration resolved"
    );

    let client = RpcChainClient::new(network_config.url.clone(), network_config.signer()?)
        .poll_interval(config.receipt_poll_interval());

    let chain_id = client
        .chain_id()
        .await
        .with_context(|| format!("Failed to reach {network} at {}", network_config.url))?;
    if let Some(expected) = network_config.chain_id {
        if expected != chain_id {
            anyhow::bail!(
                "Node at {} reports chain ID {chain_id}, but {network} expects {expected}",
                network_config.url
            );
        }
    }

    let registry = ArtifactRegistry::scan(&config.artifacts)?;
    let verifier = EtherscanVerifier::new(network_config.explorer.clone(), Some(chain_id))?;
    let indexer = SubgraphNetworksHook::new(&config.subgraph_dir, network.clone());
    let reporter = TracingReporter;

    let outcome = DeployScript {
        network: &network,
        client: &client,
        registry: &registry,
        verifier: &verifier,
        indexer: &indexer,
        reporter: &reporter,
        publication: &config.publication,
    }
    .run()
    .await?;

    println!("{}", summary_table(&outcome.records, &outcome.verifications));

    Ok(())
}
