//! Deployer credentials.

use std::{fmt, str::FromStr};

use alloy_core::primitives::Address;
use alloy_signer_local::{MnemonicBuilder, PrivateKeySigner, coins_bip39::English};
use anyhow::Context;

/// Who signs the transactions sent by an [`RpcChainClient`](super::RpcChainClient).
#[derive(Clone)]
pub enum TxSigner {
    /// The node signs with its first unlocked account (`eth_sendTransaction`).
    Unlocked,
    /// Transactions are signed by a local wallet and sent with `eth_sendRawTransaction`.
    Local(PrivateKeySigner),
}

impl TxSigner {
    /// Create a local signer from a hex-encoded private key.
    pub fn from_private_key(private_key: &str) -> anyhow::Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key.trim())
            .context("Failed to parse deployer private key")?;
        Ok(Self::Local(signer))
    }

    /// Create a local signer from a BIP-39 mnemonic, using the standard Ethereum derivation
    /// path at `index`.
    pub fn from_mnemonic(phrase: &str, index: u32) -> anyhow::Result<Self> {
        let signer = MnemonicBuilder::<English>::default()
            .phrase(phrase.trim())
            .index(index)
            .context("Invalid mnemonic derivation index")?
            .build()
            .context("Failed to derive deployer key from mnemonic")?;
        Ok(Self::Local(signer))
    }

    /// The address of the local key, if any.
    pub fn local_address(&self) -> Option<Address> {
        match self {
            Self::Unlocked => None,
            Self::Local(signer) => Some(signer.address()),
        }
    }
}

impl fmt::Debug for TxSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.local_address() {
            None => f.write_str("Unlocked"),
            Some(address) => write!(f, "Local({address})"),
        }
    }
}
