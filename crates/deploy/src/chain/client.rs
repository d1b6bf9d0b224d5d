//! [`ChainClient`] backed by an alloy provider.

use std::{fmt, time::Duration};

use alloy_core::primitives::{Address, B256, U256};
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use anyhow::Context;
use backon::{ConstantBuilder, Retryable};
use url::Url;

use super::{ChainClient, TxReceipt, TxRequest, signer::TxSigner};

/// Default interval between two `eth_getTransactionReceipt` polls.
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Raised while a transaction is not mined yet.
#[derive(Debug)]
struct ReceiptPending(B256);

impl fmt::Display for ReceiptPending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transaction {} is not mined yet", self.0)
    }
}

impl std::error::Error for ReceiptPending {}

/// A [`ChainClient`] talking to an Ethereum JSON-RPC endpoint.
///
/// Nonce, gas and chain ID are filled by the provider's recommended fillers. With a local
/// signer the provider also signs, otherwise the node's unlocked account does.
pub struct RpcChainClient {
    provider: DynProvider,
    local_address: Option<Address>,
    poll_interval: Duration,
}

impl RpcChainClient {
    pub fn new(url: Url, signer: TxSigner) -> Self {
        let local_address = signer.local_address();
        let provider = match signer {
            TxSigner::Local(signer) => ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(url)
                .erased(),
            TxSigner::Unlocked => ProviderBuilder::new().connect_http(url).erased(),
        };

        Self {
            provider,
            local_address,
            poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
        }
    }

    /// Set the interval between receipt polls.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Translate a [`TxRequest`] into the provider's request type.
    ///
    /// Overridden fields are set, the rest is left to the fillers.
    fn transaction_request(from: Address, tx: TxRequest) -> TransactionRequest {
        let mut request = match tx.to {
            Some(to) => TransactionRequest::default().with_to(to).with_input(tx.data),
            None => TransactionRequest::default().with_deploy_code(tx.data),
        }
        .with_from(from);

        if let Some(gas_limit) = tx.overrides.gas_limit {
            request.set_gas_limit(gas_limit);
        }
        if let Some(gas_price) = tx.overrides.gas_price {
            request.set_gas_price(gas_price);
        }
        if let Some(value) = tx.overrides.value {
            request.set_value(value);
        }
        if let Some(nonce) = tx.overrides.nonce {
            request.set_nonce(nonce);
        }
        request
    }
}

impl ChainClient for RpcChainClient {
    async fn chain_id(&self) -> anyhow::Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .context("Failed to fetch chain ID")
    }

    async fn sender(&self) -> anyhow::Result<Address> {
        if let Some(address) = self.local_address {
            return Ok(address);
        }

        let accounts = self
            .provider
            .get_accounts()
            .await
            .context("Failed to list node accounts")?;

        accounts.first().copied().context(
            "Node has no unlocked account. Configure a private key or mnemonic for this network.",
        )
    }

    async fn balance(&self, address: Address) -> anyhow::Result<U256> {
        self.provider
            .get_balance(address)
            .await
            .with_context(|| format!("Failed to fetch balance of {address}"))
    }

    async fn send_transaction(&self, tx: TxRequest) -> anyhow::Result<B256> {
        let from = self.sender().await?;
        let request = Self::transaction_request(from, tx);

        let pending = self
            .provider
            .send_transaction(request)
            .await
            .context("Failed to send transaction")?;

        tracing::debug!(from = %from, tx_hash = %pending.tx_hash(), "Transaction sent");

        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> anyhow::Result<TxReceipt> {
        let fetch = move || async move {
            match self.provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => Ok(TxReceipt::from(&receipt)),
                Ok(None) => Err(anyhow::Error::new(ReceiptPending(tx_hash))),
                Err(e) => Err(anyhow::Error::from(e)),
            }
        };

        fetch
            .retry(
                ConstantBuilder::default()
                    .with_delay(self.poll_interval)
                    .with_max_times(usize::MAX),
            )
            .when(|e: &anyhow::Error| e.is::<ReceiptPending>())
            .notify(|_, _| {
                tracing::trace!(tx_hash = %tx_hash, "Waiting for transaction receipt...")
            })
            .await
            .with_context(|| format!("Failed to fetch receipt for transaction {tx_hash}"))
    }
}
