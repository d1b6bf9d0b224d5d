//! Indexing service initialization.

use std::{
    future::Future,
    path::{Path, PathBuf},
};

use alloy_core::primitives::Address;
use anyhow::Result;
use serde_json::{Map, Value, json};

use crate::{ContractArtifact, Network, fs::FsHandler};

/// Name of the subgraph network file read by the graph CLI.
pub const NETWORKS_FILENAME: &str = "networks.json";

/// Directory of the subgraph holding the contract ABIs.
pub const ABIS_DIRNAME: &str = "abis";

/// Informs an indexing service that a contract was deployed.
pub trait IndexerHook: Send + Sync {
    /// Start tracking the contract built from `artifact` at `address` from `start_block`.
    fn init_contract(
        &self,
        artifact: &ContractArtifact,
        address: Address,
        start_block: u64,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Records deployments in the subgraph's `networks.json`:
///
/// ```json
/// { "localhost": { "Publication": { "address": "0x...", "startBlock": 1 } } }
/// ```
///
/// Entries for other networks and other contracts are kept. The contract ABI is written to
/// `abis/<Name>.json` next to it, where the subgraph manifest expects it.
#[derive(Debug, Clone)]
pub struct SubgraphNetworksHook {
    pub subgraph_dir: PathBuf,
    pub network: Network,
}

impl SubgraphNetworksHook {
    /// Hook writing into the given subgraph directory.
    pub fn new(subgraph_dir: &Path, network: Network) -> Self {
        Self {
            subgraph_dir: subgraph_dir.to_path_buf(),
            network,
        }
    }

    pub fn networks_file(&self) -> PathBuf {
        self.subgraph_dir.join(NETWORKS_FILENAME)
    }

    pub fn abi_file(&self, name: &str) -> PathBuf {
        self.subgraph_dir.join(ABIS_DIRNAME).join(format!("{name}.json"))
    }

    fn update(
        &self,
        artifact: &ContractArtifact,
        address: Address,
        start_block: u64,
    ) -> Result<()> {
        let name = artifact.contract_name.as_str();
        let networks_file = self.networks_file();

        let mut networks: Map<String, Value> = if networks_file.exists() {
            FsHandler::read_json(&networks_file)?
        } else {
            Map::new()
        };

        let contracts = networks
            .entry(self.network.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(contracts) = contracts.as_object_mut() else {
            anyhow::bail!(
                "Entry {} in {} is not an object",
                self.network,
                networks_file.display()
            );
        };
        contracts.insert(
            name.to_string(),
            json!({
                "address": address.to_checksum(None),
                "startBlock": start_block,
            }),
        );

        FsHandler::write_json(&networks_file, &networks)?;
        FsHandler::write_json(&self.abi_file(name), &artifact.abi)?;

        tracing::debug!(
            path = %self.subgraph_dir.display(),
            network = %self.network,
            contract = name,
            %address,
            start_block,
            "Subgraph networks and ABI updated"
        );

        Ok(())
    }
}

impl IndexerHook for SubgraphNetworksHook {
    async fn init_contract(
        &self,
        artifact: &ContractArtifact,
        address: Address,
        start_block: u64,
    ) -> Result<()> {
        self.update(artifact, address, start_block)
    }
}

#[cfg(test)]
mod tests {
    use alloy_core::json_abi::JsonAbi;
    use tempdir::TempDir;

    use super::*;

    fn publication_artifact() -> ContractArtifact {
        ContractArtifact {
            contract_name: "Publication".to_string(),
            source_name: Some("contracts/Publication.sol".to_string()),
            abi: JsonAbi::parse([
                "function post(string title, string content)",
                "event NewPost(uint256 indexed id, string title)",
            ])
            .unwrap(),
            bytecode: "6080".to_string(),
            link_references: Default::default(),
            path: PathBuf::from("artifacts/contracts/Publication.sol/Publication.json"),
        }
    }

    #[tokio::test]
    async fn test_networks_file_created() {
        let dir = TempDir::new("subgraph").unwrap();
        let hook = SubgraphNetworksHook::new(dir.path(), Network::Localhost);
        let address: Address = "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap();

        hook.init_contract(&publication_artifact(), address, 1)
            .await
            .unwrap();

        let networks: Value = FsHandler::read_json(&hook.networks_file()).unwrap();
        assert_eq!(
            networks,
            json!({
                "localhost": {
                    "Publication": {
                        "address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                        "startBlock": 1
                    }
                }
            })
        );
    }

    #[tokio::test]
    async fn test_networks_file_keeps_other_entries() {
        let dir = TempDir::new("subgraph").unwrap();
        let path = dir.path().join(NETWORKS_FILENAME);
        FsHandler::write_json(
            &path,
            &json!({
                "mainnet": {"Publication": {"address": "0x01", "startBlock": 7}},
                "goerli": {"Other": {"address": "0x02", "startBlock": 3}}
            }),
        )
        .unwrap();

        let hook = SubgraphNetworksHook::new(dir.path(), Network::Public("goerli".to_string()));
        hook.init_contract(&publication_artifact(), Address::ZERO, 12)
            .await
            .unwrap();

        let networks: Value = FsHandler::read_json(&path).unwrap();
        assert_eq!(networks["mainnet"]["Publication"]["startBlock"], 7);
        assert_eq!(networks["goerli"]["Other"]["address"], "0x02");
        assert_eq!(networks["goerli"]["Publication"]["startBlock"], 12);
    }

    #[tokio::test]
    async fn test_abi_written_for_subgraph() {
        let dir = TempDir::new("subgraph").unwrap();
        let hook = SubgraphNetworksHook::new(dir.path(), Network::Localhost);
        let artifact = publication_artifact();

        hook.init_contract(&artifact, Address::ZERO, 1).await.unwrap();

        let abi_file = dir.path().join("abis").join("Publication.json");
        assert_eq!(hook.abi_file("Publication"), abi_file);
        let abi: JsonAbi = FsHandler::read_json(&abi_file).unwrap();
        assert_eq!(abi, artifact.abi);
        assert!(abi.function("post").is_some());
        assert!(abi.event("NewPost").is_some());
    }

    #[tokio::test]
    async fn test_non_object_network_entry_rejected() {
        let dir = TempDir::new("subgraph").unwrap();
        let path = dir.path().join(NETWORKS_FILENAME);
        FsHandler::write_json(&path, &json!({"goerli": 5})).unwrap();

        let hook = SubgraphNetworksHook::new(dir.path(), Network::Public("goerli".to_string()));
        let err = hook
            .init_contract(&publication_artifact(), Address::ZERO, 1)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Entry goerli"), "{err}");
        assert!(!hook.abi_file("Publication").exists());
    }
}
