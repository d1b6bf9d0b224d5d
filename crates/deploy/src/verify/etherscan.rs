//! Etherscan-compatible verification API.

use std::{fmt, time::Duration};

use anyhow::Context;
use backon::{ConstantBuilder, Retryable};
use serde::Deserialize;

use super::{VerificationRequest, Verifier};
use crate::{BuildInfo, ExplorerConfig, rpc};

const DEFAULT_STATUS_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_MAX_STATUS_POLLS: usize = 24;

/// Raised while the explorer has not processed a submission yet.
#[derive(Debug)]
struct VerificationPending(String);

impl fmt::Display for VerificationPending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "verification still pending: {}", self.0)
    }
}

impl std::error::Error for VerificationPending {}

#[derive(Debug, Clone, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

impl ApiResponse {
    fn result_text(&self) -> String {
        match &self.result {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// What an explorer answer means for the verification.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ApiStatus {
    /// Submission accepted, the payload is the GUID to poll.
    Submitted(String),
    Pending,
    Verified,
    Failed(String),
}

fn classify(response: &ApiResponse) -> ApiStatus {
    let result = response.result_text();
    let lower = result.to_lowercase();

    if lower.contains("already verified") {
        return ApiStatus::Verified;
    }
    if lower.contains("pending in queue") || lower.contains("in progress") {
        return ApiStatus::Pending;
    }
    if lower.starts_with("pass") {
        return ApiStatus::Verified;
    }
    if response.status == "1" {
        return ApiStatus::Submitted(result);
    }

    let reason = if result.is_empty() {
        response.message.clone()
    } else {
        result
    };
    ApiStatus::Failed(reason)
}

/// Verifies contracts through an Etherscan-compatible explorer API.
///
/// Sources and compiler version come from the Hardhat build info of the deployed artifact.
pub struct EtherscanVerifier {
    http: reqwest::Client,
    explorer: Option<ExplorerConfig>,
    chain_id: Option<u64>,
    poll_interval: Duration,
    max_polls: usize,
}

impl EtherscanVerifier {
    /// Without an explorer every verification fails, which is reported but not fatal.
    pub fn new(explorer: Option<ExplorerConfig>, chain_id: Option<u64>) -> anyhow::Result<Self> {
        Ok(Self {
            http: rpc::create_client()?,
            explorer,
            chain_id,
            poll_interval: DEFAULT_STATUS_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_STATUS_POLLS,
        })
    }

    /// Set how often and how many times the verification status is polled.
    pub fn status_polling(mut self, interval: Duration, max_polls: usize) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    fn explorer(&self) -> anyhow::Result<&ExplorerConfig> {
        self.explorer
            .as_ref()
            .context("No block explorer configured for this network")
    }

    fn endpoint(&self, explorer: &ExplorerConfig) -> url::Url {
        let mut url = explorer.api_url.clone();
        if let Some(chain_id) = self.chain_id {
            url.query_pairs_mut()
                .append_pair("chainid", &chain_id.to_string());
        }
        url
    }

    async fn submit(&self, request: &VerificationRequest) -> anyhow::Result<Option<String>> {
        let explorer = self.explorer()?;
        let build_info = BuildInfo::for_artifact(&request.artifact_path)?;
        let source = serde_json::to_string(&build_info.input)
            .context("Failed to serialize compiler input")?;

        let form = [
            ("apikey", explorer.api_key.clone()),
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("contractaddress", request.address.to_checksum(None)),
            ("sourceCode", source),
            ("codeformat", "solidity-standard-json-input".to_string()),
            ("contractname", request.fully_qualified_name.clone()),
            ("compilerversion", build_info.compiler_version()),
            // Misspelled on the explorer side.
            ("constructorArguements", hex::encode(&request.encoded_args)),
        ];

        let response: ApiResponse = self
            .http
            .post(self.endpoint(explorer))
            .form(&form)
            .send()
            .await
            .context("Failed to submit verification request")?
            .json()
            .await
            .context("Failed to parse verification response")?;

        match classify(&response) {
            ApiStatus::Submitted(guid) => Ok(Some(guid)),
            ApiStatus::Verified => Ok(None),
            ApiStatus::Pending => anyhow::bail!("Unexpected pending answer to a submission"),
            ApiStatus::Failed(reason) => anyhow::bail!("Explorer rejected verification: {reason}"),
        }
    }

    async fn check_status(&self, guid: &str) -> anyhow::Result<()> {
        let explorer = self.explorer()?;
        let mut url = self.endpoint(explorer);
        url.query_pairs_mut()
            .append_pair("apikey", &explorer.api_key)
            .append_pair("module", "contract")
            .append_pair("action", "checkverifystatus")
            .append_pair("guid", guid);

        let response: ApiResponse = self
            .http
            .get(url)
            .send()
            .await
            .context("Failed to query verification status")?
            .json()
            .await
            .context("Failed to parse verification status")?;

        match classify(&response) {
            ApiStatus::Verified => Ok(()),
            ApiStatus::Pending | ApiStatus::Submitted(_) => {
                Err(VerificationPending(response.result_text()).into())
            }
            ApiStatus::Failed(reason) => anyhow::bail!("Verification failed: {reason}"),
        }
    }
}

impl Verifier for EtherscanVerifier {
    async fn verify(&self, request: &VerificationRequest) -> anyhow::Result<()> {
        let Some(guid) = self.submit(request).await? else {
            tracing::debug!(contract = %request.name, "Contract was already verified");
            return Ok(());
        };

        tracing::debug!(contract = %request.name, %guid, "Verification submitted");

        let check = || self.check_status(&guid);
        check
            .retry(
                ConstantBuilder::default()
                    .with_delay(self.poll_interval)
                    .with_max_times(self.max_polls),
            )
            .when(|e: &anyhow::Error| e.is::<VerificationPending>())
            .notify(|_, _| {
                tracing::trace!(contract = %request.name, "Waiting for verification result...")
            })
            .await
    }
}
