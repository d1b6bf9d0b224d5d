//! Block explorer source verification.

mod etherscan;

pub use etherscan::EtherscanVerifier;

use std::{future::Future, path::PathBuf};

use alloy_core::primitives::{Address, Bytes};
use anyhow::Result;
use futures::future::join_all;

use crate::{DeployEvent, DeployReporter, DeploymentRecord};

/// What an explorer needs to verify one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub name: String,
    /// `path/To.sol:Name`, or the bare name when the source file is unknown.
    pub fully_qualified_name: String,
    pub address: Address,
    pub constructor_args: Vec<String>,
    pub encoded_args: Bytes,
    /// Artifact the contract was deployed from.
    pub artifact_path: PathBuf,
}

impl From<&DeploymentRecord> for VerificationRequest {
    fn from(record: &DeploymentRecord) -> Self {
        Self {
            name: record.name.clone(),
            fully_qualified_name: record.handle.artifact.fully_qualified_name(),
            address: record.address,
            constructor_args: record.constructor_args.clone(),
            encoded_args: record.encoded_args.clone(),
            artifact_path: record.handle.artifact.path.clone(),
        }
    }
}

/// Submits deployments for source verification.
pub trait Verifier: Send + Sync {
    fn verify(&self, request: &VerificationRequest) -> impl Future<Output = Result<()>> + Send;
}

/// Result of verifying one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified { name: String },
    Failed { name: String, error: String },
}

impl VerificationOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Verified { name } | Self::Failed { name, .. } => name,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

/// Verify every record concurrently.
///
/// A failure is reported and recorded in the returned outcomes, it never stops the other
/// verifications. Outcomes come back in the order of `records`.
pub async fn verify_all<V, R>(
    verifier: &V,
    reporter: &R,
    records: &[DeploymentRecord],
) -> Vec<VerificationOutcome>
where
    V: Verifier,
    R: DeployReporter,
{
    let attempts = records.iter().map(|record| async move {
        let request = VerificationRequest::from(record);
        reporter.report(DeployEvent::VerificationStarted {
            name: request.name.clone(),
        });

        match verifier.verify(&request).await {
            Ok(()) => {
                reporter.report(DeployEvent::Verified {
                    name: request.name.clone(),
                });
                VerificationOutcome::Verified { name: request.name }
            }
            Err(err) => {
                let error = format!("{err:#}");
                reporter.report(DeployEvent::VerificationFailed {
                    name: request.name.clone(),
                    error: error.clone(),
                });
                VerificationOutcome::Failed {
                    name: request.name,
                    error,
                }
            }
        }
    });

    join_all(attempts).await
}
