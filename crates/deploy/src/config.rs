//! Layered configuration.
//!
//! Values come from, in increasing priority: built-in defaults, the TOML configuration file
//! and `GRAPHRICA_*` environment variables (`__` separates nested keys, e.g.
//! `GRAPHRICA_NETWORKS__GOERLI__PRIVATE_KEY`).

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Network, PublicationSetup, TxSigner};

/// The default name for the configuration file.
pub const CONFIG_FILENAME: &str = "Graphrica.toml";

/// Prefix of the environment variables overriding the configuration.
pub const ENV_PREFIX: &str = "GRAPHRICA_";

const LOCAL_RPC_URL: &str = "http://127.0.0.1:8545";

/// Block explorer API used for source verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Etherscan-compatible endpoint, e.g. `https://api.etherscan.io/v2/api`.
    pub api_url: Url,
    pub api_key: String,
}

/// How to reach and sign for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint.
    pub url: Url,
    /// Expected chain ID. Checked against the node when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Hex-encoded deployer key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// BIP-39 phrase the deployer key is derived from (first account).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer: Option<ExplorerConfig>,
}

impl NetworkConfig {
    /// The signer matching the configured credentials.
    ///
    /// A private key wins over a mnemonic. Without either, the node's first unlocked
    /// account signs.
    pub fn signer(&self) -> anyhow::Result<TxSigner> {
        match (&self.private_key, &self.mnemonic) {
            (Some(private_key), _) => TxSigner::from_private_key(private_key),
            (None, Some(mnemonic)) => TxSigner::from_mnemonic(mnemonic, 0),
            (None, None) => Ok(TxSigner::Unlocked),
        }
    }
}

/// Full configuration of a deployment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Directory holding the compiled artifacts.
    pub artifacts: PathBuf,
    /// Subgraph directory whose `networks.json` gets the new addresses.
    pub subgraph_dir: PathBuf,
    pub receipt_poll_interval_ms: u64,
    pub networks: BTreeMap<String, NetworkConfig>,
    pub publication: PublicationSetup,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            artifacts: PathBuf::from("artifacts"),
            subgraph_dir: PathBuf::from("subgraph"),
            receipt_poll_interval_ms: 1000,
            networks: BTreeMap::new(),
            publication: PublicationSetup::default(),
        }
    }
}

impl DeployConfig {
    /// Build the figment for a configuration file. A missing file is not an error.
    ///
    /// `localhost` and `hardhat` point at a local node unless configured otherwise.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Serialized::default("networks.localhost.url", LOCAL_RPC_URL))
            .merge(Serialized::default("networks.hardhat.url", LOCAL_RPC_URL))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load the configuration from defaults, `path` and the environment.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: Self = Self::figment(path)
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        tracing::debug!(
            path = %path.display(),
            networks = ?config.networks.keys().collect::<Vec<_>>(),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Settings of the given network.
    pub fn network(&self, network: &Network) -> anyhow::Result<&NetworkConfig> {
        self.networks.get(network.as_str()).with_context(|| {
            format!(
                "Network {network} is not configured. Add a [networks.{network}] section to {CONFIG_FILENAME}."
            )
        })
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|jail| {
            let config = DeployConfig::load(&jail.directory().join(CONFIG_FILENAME)).unwrap();

            assert_eq!(config.artifacts, PathBuf::from("artifacts"));
            assert_eq!(config.publication, PublicationSetup::default());
            assert_eq!(config.networks.len(), 2);
            let localhost = config.network(&Network::Localhost).unwrap();
            assert_eq!(localhost.url.as_str(), "http://127.0.0.1:8545/");
            assert!(matches!(localhost.signer().unwrap(), TxSigner::Unlocked));
            assert!(config.network(&Network::Public("goerli".into())).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILENAME,
                r#"
                artifacts = "out"
                receipt_poll_interval_ms = 250

                [networks.goerli]
                url = "https://goerli.example.org"
                chain_id = 5

                [networks.goerli.explorer]
                api_url = "https://api-goerli.etherscan.io/api"
                api_key = "from-file"

                [publication]
                poster = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"
                poster_name = "Euclid"
                posts = [{ title = "Hello", content = "World" }]
                "#,
            )?;
            jail.set_env(
                "GRAPHRICA_NETWORKS__GOERLI__PRIVATE_KEY",
                "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            );
            jail.set_env("GRAPHRICA_NETWORKS__GOERLI__EXPLORER__API_KEY", "from-env");

            let config = DeployConfig::load(&jail.directory().join(CONFIG_FILENAME)).unwrap();

            assert_eq!(config.artifacts, PathBuf::from("out"));
            assert_eq!(config.receipt_poll_interval(), Duration::from_millis(250));
            assert!(config.networks.contains_key("localhost"));

            let goerli = config.network(&Network::Public("goerli".into())).unwrap();
            assert_eq!(goerli.chain_id, Some(5));
            assert_eq!(goerli.explorer.as_ref().unwrap().api_key, "from-env");
            assert_eq!(
                goerli.signer().unwrap().local_address(),
                Some("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap())
            );

            assert_eq!(config.publication.poster_name, "Euclid");
            assert_eq!(config.publication.posts.len(), 1);
            Ok(())
        });
    }

    #[test]
    fn test_publication_deploy_options() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILENAME,
                r#"
                [publication.overrides]
                gas_limit = 6000000

                [publication.libraries]
                PostLib = "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0"
                "#,
            )?;
            jail.set_env("GRAPHRICA_PUBLICATION__OVERRIDES__NONCE", "7");

            let config = DeployConfig::load(&jail.directory().join(CONFIG_FILENAME)).unwrap();

            let publication = &config.publication;
            assert_eq!(publication.overrides.gas_limit, Some(6_000_000));
            assert_eq!(publication.overrides.nonce, Some(7));
            assert!(publication.overrides.gas_price.is_none());
            assert_eq!(
                publication.libraries.get("PostLib"),
                Some(&"0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0".parse().unwrap())
            );
            // The first posts keep their defaults.
            assert_eq!(publication.poster_name, "Ptomely");
            assert_eq!(publication.posts.len(), 2);
            Ok(())
        });
    }
}
