//! Chain access used by the deployer and the post-deploy initializer.
//!
//! [`ChainClient`] is the seam between the deployment flow and the network: the
//! [`RpcChainClient`] talks to a node through an alloy provider, tests plug in an in-memory chain.

mod client;
mod signer;

pub use client::RpcChainClient;
pub use signer::TxSigner;

use std::future::Future;

use alloy_core::primitives::{Address, B256, Bytes, U256};
use alloy_network::ReceiptResponse;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Transaction fields pinned by the caller instead of being filled by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOverrides {
    /// Gas limit. Estimated by the node when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    /// Legacy gas price in wei. EIP-1559 fees are estimated when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u128>,
    /// Value in wei sent along with the transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Sender nonce. Taken from the transaction count when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
}

/// A transaction to submit. A request without a recipient creates a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Option<Address>,
    pub data: Bytes,
    pub overrides: TxOverrides,
}

impl TxRequest {
    /// A contract-creation transaction carrying the init code.
    pub fn create(init_code: Bytes, overrides: TxOverrides) -> Self {
        Self {
            to: None,
            data: init_code,
            overrides,
        }
    }

    /// A call to an existing contract.
    pub fn call(to: Address, data: Bytes) -> Self {
        Self {
            to: Some(to),
            data,
            overrides: TxOverrides::default(),
        }
    }

    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }
}

/// The parts of a transaction receipt the deployment flow looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub contract_address: Option<Address>,
    /// `false` for a reverted transaction.
    pub status: bool,
}

impl TxReceipt {
    pub fn succeeded(&self) -> bool {
        self.status
    }

    pub fn block(&self) -> u64 {
        self.block_number.unwrap_or_default()
    }
}

impl<R: ReceiptResponse> From<&R> for TxReceipt {
    fn from(receipt: &R) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash(),
            block_number: receipt.block_number(),
            contract_address: receipt.contract_address(),
            status: receipt.status(),
        }
    }
}

/// Access to an EVM chain.
pub trait ChainClient: Send + Sync {
    /// The chain ID reported by the node.
    fn chain_id(&self) -> impl Future<Output = Result<u64>> + Send;

    /// The account transactions are sent from.
    fn sender(&self) -> impl Future<Output = Result<Address>> + Send;

    /// The balance of an account, in wei.
    fn balance(&self, address: Address) -> impl Future<Output = Result<U256>> + Send;

    /// Submit a transaction, returning its hash once the node accepted it.
    fn send_transaction(&self, tx: TxRequest) -> impl Future<Output = Result<B256>> + Send;

    /// Block until the transaction is mined and return its receipt.
    fn wait_for_receipt(&self, tx_hash: B256) -> impl Future<Output = Result<TxReceipt>> + Send;
}
