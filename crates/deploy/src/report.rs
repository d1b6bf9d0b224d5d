//! Progress reporting.
//!
//! The deployment flow never prints directly: it emits [`DeployEvent`]s to a
//! [`DeployReporter`]. The binary uses [`TracingReporter`], tests use [`RecordingReporter`].

use std::sync::{Mutex, MutexGuard};

use alloy_core::primitives::{Address, B256, U256};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};

use crate::{DeploymentRecord, Network, VerificationOutcome};

/// A step of the deployment flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployEvent {
    NetworkResolved {
        network: Network,
    },
    /// Only reported on local networks.
    DeployerAccount {
        address: Address,
        balance: U256,
    },
    Deploying {
        name: String,
    },
    /// The creation transaction was accepted by the node.
    Submitted {
        name: String,
        tx_hash: B256,
    },
    Deployed {
        name: String,
        address: Address,
        block_number: u64,
    },
    IndexerInitialized {
        name: String,
        address: Address,
    },
    PostDeployCallSent {
        method: String,
        tx_hash: B256,
    },
    PostDeployConfirmed {
        calls: usize,
    },
    /// The explorer may not have indexed the deployment yet.
    VerificationWarning,
    VerificationStarted {
        name: String,
    },
    Verified {
        name: String,
    },
    VerificationFailed {
        name: String,
        error: String,
    },
}

/// Observer of the deployment progress.
pub trait DeployReporter: Send + Sync {
    fn report(&self, event: DeployEvent);
}

/// Renders every event as a tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl DeployReporter for TracingReporter {
    fn report(&self, event: DeployEvent) {
        match event {
            DeployEvent::NetworkResolved { network } => {
                tracing::info!(%network, "🚀 Deploying to {network}!");
            }
            DeployEvent::DeployerAccount { address, balance } => {
                tracing::info!(
                    %address,
                    %balance,
                    "Deploying contracts with the account {address}"
                );
            }
            DeployEvent::Deploying { name } => {
                tracing::info!(contract = %name, "🛰  Deploying: {name}");
            }
            DeployEvent::Submitted { name, tx_hash } => {
                tracing::debug!(contract = %name, %tx_hash, "Creation transaction submitted");
            }
            DeployEvent::Deployed {
                name,
                address,
                block_number,
            } => {
                tracing::info!(
                    contract = %name,
                    %address,
                    block_number,
                    "Deployed {name} contract to {address}"
                );
            }
            DeployEvent::IndexerInitialized { name, address } => {
                tracing::info!(contract = %name, %address, "Subgraph network updated");
            }
            DeployEvent::PostDeployCallSent { method, tx_hash } => {
                tracing::info!(%method, %tx_hash, "Post-deploy call sent");
            }
            DeployEvent::PostDeployConfirmed { calls } => {
                tracing::info!(calls, "Post-deploy calls confirmed");
            }
            DeployEvent::VerificationWarning => {
                tracing::warn!(
                    "Beginning explorer verification. The explorer may need a few minutes to \
                     index the new contracts, verification can fail until it has."
                );
            }
            DeployEvent::VerificationStarted { name } => {
                tracing::info!(contract = %name, "🔍 Verifying {name}...");
            }
            DeployEvent::Verified { name } => {
                tracing::info!(contract = %name, "✅ {name} verified!");
            }
            DeployEvent::VerificationFailed { name, error } => {
                tracing::error!(contract = %name, %error, "Verification of {name} failed");
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<DeployEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DeployEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A copy of the events reported so far, in order.
    pub fn events(&self) -> Vec<DeployEvent> {
        self.lock().clone()
    }
}

impl DeployReporter for RecordingReporter {
    fn report(&self, event: DeployEvent) {
        self.lock().push(event);
    }
}

/// Summary of the deployed contracts and, when verification ran, its outcome.
pub fn summary_table(records: &[DeploymentRecord], outcomes: &[VerificationOutcome]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Contract", "Address", "Block", "Transaction", "Verification"]);

    for record in records {
        let verification = outcomes
            .iter()
            .find(|outcome| outcome.name() == record.name)
            .map(|outcome| match outcome {
                VerificationOutcome::Verified { .. } => "verified".to_string(),
                VerificationOutcome::Failed { error, .. } => format!("failed: {error}"),
            })
            .unwrap_or_else(|| "skipped".to_string());

        table.add_row(vec![
            record.name.clone(),
            record.address.to_string(),
            record.block_number.to_string(),
            record.tx_hash.to_string(),
            verification,
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_reporter_keeps_order() {
        let reporter = RecordingReporter::new();
        reporter.report(DeployEvent::Deploying {
            name: "Publication".to_string(),
        });
        reporter.report(DeployEvent::PostDeployConfirmed { calls: 3 });

        assert_eq!(
            reporter.events(),
            vec![
                DeployEvent::Deploying {
                    name: "Publication".to_string()
                },
                DeployEvent::PostDeployConfirmed { calls: 3 },
            ]
        );
    }

    #[test]
    fn test_empty_summary_table() {
        let table = summary_table(&[], &[]);
        let rendered = table.to_string();
        assert!(rendered.contains("Contract"));
        assert!(rendered.contains("Verification"));
    }
}
