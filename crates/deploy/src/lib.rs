//! graphrica-deploy - Deployment library for the Publication contract.
//!
//! This crate deploys a compiled contract to an EVM network over JSON-RPC, runs the
//! post-deployment setup calls, informs the subgraph about the new address and, on public
//! networks, submits the deployment to a block explorer for source verification.

pub mod artifacts;
pub use artifacts::{ArtifactNotFound, ArtifactRegistry, BuildInfo, ContractArtifact};

pub mod chain;
pub use chain::{ChainClient, RpcChainClient, TxOverrides, TxReceipt, TxRequest, TxSigner};

mod config;
pub use config::{CONFIG_FILENAME, DeployConfig, ENV_PREFIX, ExplorerConfig, NetworkConfig};

mod deployer;
pub use deployer::{ContractDeployer, ContractHandle, DeployOptions, DeploymentRecord};

mod fs;

mod indexer;
pub use indexer::{ABIS_DIRNAME, IndexerHook, NETWORKS_FILENAME, SubgraphNetworksHook};

mod network;
pub use network::{NETWORK_ENV_VAR, Network};

pub mod publication;
pub use publication::{PostContent, PostDeployCall, PublicationSetup, initialize_publication};

mod report;
pub use report::{DeployEvent, DeployReporter, RecordingReporter, TracingReporter, summary_table};

mod rpc;

mod script;
pub use script::{DeployScript, PUBLICATION_CONTRACT, ScriptOutcome};

pub mod verify;
pub use verify::{
    EtherscanVerifier, VerificationOutcome, VerificationRequest, Verifier, verify_all,
};
