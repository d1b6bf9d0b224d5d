//! Post-deployment setup of the `Publication` contract.

use std::collections::BTreeMap;

use alloy_core::primitives::{Address, B256, Bytes, address};
use alloy_sol_types::{SolCall, sol};
use anyhow::{Context, Result};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::{ChainClient, ContractHandle, DeployEvent, DeployReporter, TxOverrides, TxReceipt};

sol! {
    interface IPublication {
        function setPoster(address poster, string name, bool enabled) external;
        function post(string title, string content) external;
    }
}

/// A post published right after deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    pub title: String,
    pub content: String,
}

impl PostContent {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// How `Publication` is deployed, the account allowed to post and the first posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationSetup {
    pub poster: Address,
    pub poster_name: String,
    pub posts: Vec<PostContent>,
    /// Pinned fields of the creation transaction.
    #[serde(default)]
    pub overrides: TxOverrides,
    /// Library addresses linked into the bytecode, by library name.
    #[serde(default)]
    pub libraries: BTreeMap<String, Address>,
}

impl Default for PublicationSetup {
    fn default() -> Self {
        Self {
            poster: address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
            poster_name: "Ptomely".to_string(),
            posts: vec![
                PostContent::new("First Post", "Welcome to the Graph Hack"),
                PostContent::new("Second Post", "Graphrica ❤️ TheGraph"),
            ],
            overrides: TxOverrides::default(),
            libraries: BTreeMap::new(),
        }
    }
}

impl PublicationSetup {
    /// The calls to make, in order: register the poster, then publish every post.
    pub fn calls(&self) -> Vec<PostDeployCall> {
        let mut calls = vec![PostDeployCall::SetPoster {
            poster: self.poster,
            name: self.poster_name.clone(),
            enabled: true,
        }];
        calls.extend(self.posts.iter().map(|post| PostDeployCall::Post {
            title: post.title.clone(),
            content: post.content.clone(),
        }));
        calls
    }
}

/// A write call against the freshly deployed contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostDeployCall {
    SetPoster {
        poster: Address,
        name: String,
        enabled: bool,
    },
    Post {
        title: String,
        content: String,
    },
}

impl PostDeployCall {
    /// Solidity function name.
    pub fn method(&self) -> &'static str {
        match self {
            Self::SetPoster { .. } => "setPoster",
            Self::Post { .. } => "post",
        }
    }

    pub fn calldata(&self) -> Bytes {
        match self {
            Self::SetPoster {
                poster,
                name,
                enabled,
            } => IPublication::setPosterCall {
                poster: *poster,
                name: name.clone(),
                enabled: *enabled,
            }
            .abi_encode(),
            Self::Post { title, content } => IPublication::postCall {
                title: title.clone(),
                content: content.clone(),
            }
            .abi_encode(),
        }
        .into()
    }
}

/// Send the setup calls one after the other, then wait for all of them to be mined.
///
/// Any reverted call fails the whole setup. Nothing is rolled back.
pub async fn initialize_publication<C, R>(
    client: &C,
    reporter: &R,
    handle: &ContractHandle,
    setup: &PublicationSetup,
) -> Result<Vec<TxReceipt>>
where
    C: ChainClient,
    R: DeployReporter,
{
    let calls = setup.calls();
    let mut pending: Vec<(&'static str, B256)> = Vec::with_capacity(calls.len());

    for call in &calls {
        let method = call.method();
        let tx_hash = client
            .send_transaction(handle.transact(call.calldata()))
            .await
            .with_context(|| format!("Failed to send {method} to {}", handle.address))?;

        reporter.report(DeployEvent::PostDeployCallSent {
            method: method.to_string(),
            tx_hash,
        });
        pending.push((method, tx_hash));
    }

    let receipts = try_join_all(
        pending
            .iter()
            .map(|(_, tx_hash)| client.wait_for_receipt(*tx_hash)),
    )
    .await
    .context("Failed to confirm post-deploy calls")?;

    for ((method, tx_hash), receipt) in pending.iter().zip(&receipts) {
        if !receipt.succeeded() {
            anyhow::bail!("Post-deploy call {method} reverted (transaction {tx_hash})");
        }
    }

    reporter.report(DeployEvent::PostDeployConfirmed {
        calls: receipts.len(),
    });

    Ok(receipts)
}
