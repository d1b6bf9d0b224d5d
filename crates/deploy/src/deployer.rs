//! Contract deployment.

use std::collections::BTreeMap;

use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    ArtifactRegistry, ChainClient, ContractArtifact, DeployEvent, DeployReporter, IndexerHook,
    TxOverrides, TxRequest,
};

/// Per-deployment knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployOptions {
    /// Inform the indexing service about the new contract once it is mined.
    #[serde(default)]
    pub run_indexer_init: bool,
    /// Fields pinned on the creation transaction.
    #[serde(default)]
    pub overrides: TxOverrides,
    /// Library addresses, keyed by `Library` or `path/To.sol:Library`.
    #[serde(default)]
    pub libraries: BTreeMap<String, Address>,
}

/// A live contract: where it is and how to talk to it.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    pub address: Address,
    pub artifact: ContractArtifact,
}

impl ContractHandle {
    /// A transaction calling the contract with the given calldata.
    pub fn transact(&self, calldata: Bytes) -> TxRequest {
        TxRequest::call(self.address, calldata)
    }
}

/// A confirmed deployment.
#[derive(Debug, Clone)]
pub struct DeploymentRecord {
    pub name: String,
    pub address: Address,
    /// The arguments exactly as given to [`ContractDeployer::deploy`].
    pub constructor_args: Vec<String>,
    /// The ABI encoding of `constructor_args`.
    pub encoded_args: Bytes,
    pub tx_hash: B256,
    pub block_number: u64,
    pub handle: ContractHandle,
}

/// Deploys contracts from a registry of compiled artifacts.
pub struct ContractDeployer<'a, C, I, R> {
    pub client: &'a C,
    pub registry: &'a ArtifactRegistry,
    pub indexer: &'a I,
    pub reporter: &'a R,
}

impl<C, I, R> ContractDeployer<'_, C, I, R>
where
    C: ChainClient,
    I: IndexerHook,
    R: DeployReporter,
{
    /// Deploy `name` with the given constructor arguments and wait for the creation receipt.
    ///
    /// The artifact is resolved, linked and the arguments encoded before anything is sent, so
    /// a bad name or bad arguments never cost a transaction.
    pub async fn deploy(
        &self,
        name: &str,
        constructor_args: &[String],
        options: &DeployOptions,
    ) -> Result<DeploymentRecord> {
        self.reporter.report(DeployEvent::Deploying {
            name: name.to_string(),
        });

        let artifact = self.registry.resolve(name)?;
        let code = artifact
            .link(&options.libraries)
            .with_context(|| format!("Failed to link {name}"))?;
        let encoded_args = artifact
            .encode_constructor_args(constructor_args)
            .with_context(|| format!("Invalid constructor arguments for {name}"))?;

        let mut init_code = code.to_vec();
        init_code.extend_from_slice(&encoded_args);

        let tx_hash = self
            .client
            .send_transaction(TxRequest::create(init_code.into(), options.overrides.clone()))
            .await
            .with_context(|| format!("Failed to submit creation transaction for {name}"))?;

        self.reporter.report(DeployEvent::Submitted {
            name: name.to_string(),
            tx_hash,
        });

        let receipt = self
            .client
            .wait_for_receipt(tx_hash)
            .await
            .with_context(|| format!("Failed to confirm deployment of {name}"))?;

        if !receipt.succeeded() {
            anyhow::bail!("Deployment of {name} reverted (transaction {tx_hash})");
        }
        let address = receipt.contract_address.with_context(|| {
            format!("Receipt of {tx_hash} has no contract address for {name}")
        })?;
        let block_number = receipt.block();

        self.reporter.report(DeployEvent::Deployed {
            name: name.to_string(),
            address,
            block_number,
        });

        if options.run_indexer_init {
            self.indexer
                .init_contract(&artifact, address, block_number)
                .await
                .with_context(|| format!("Failed to initialize indexing for {name}"))?;
            self.reporter.report(DeployEvent::IndexerInitialized {
                name: name.to_string(),
                address,
            });
        }

        Ok(DeploymentRecord {
            name: name.to_string(),
            address,
            constructor_args: constructor_args.to_vec(),
            encoded_args,
            tx_hash,
            block_number,
            handle: ContractHandle { address, artifact },
        })
    }
}
