use std::time::Duration;

use ethers::{types::Address, utils::to_checksum};
use eyre::{bail, eyre, Result};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use augmented_config::network::Network;

/// How many times the async verification status is polled, with linearly
/// increasing sleeps, before giving up.
const STATUS_POLLS: usize = 20;
const STATUS_POLL_BASE: Duration = Duration::from_millis(1500);

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    message: String,
    result: String,
}

/// A request to verify one contract's source against the explorer.
#[derive(Clone, Debug)]
pub struct SourceVerifyRequest {
    pub address: Address,
    pub contract_name: String,
    /// Solidity standard JSON input, from the artifact metadata.
    pub standard_json: String,
    pub compiler_version: String,
    /// Hex-encoded constructor arguments, without the 0x prefix.
    pub constructor_args: Option<String>,
}

/// A thin client for the explorer's contract verification API.
#[derive(Clone, Debug)]
pub struct EtherscanClient {
    http: reqwest::Client,
    api_url: String,
    key: String,
}

impl EtherscanClient {
    pub fn new(network: Network, key: impl Into<String>) -> Result<Self> {
        let api_url = network
            .explorer_api_url()
            .ok_or_else(|| eyre!("no explorer API for network {}", network))?
            .to_string();
        Ok(Self {
            http: reqwest::Client::new(),
            api_url,
            key: key.into(),
        })
    }

    /// Submits a source verification request and polls until the explorer
    /// accepts or rejects it. An already-verified contract is a success.
    pub async fn verify_source(&self, request: &SourceVerifyRequest) -> Result<()> {
        let address = to_checksum(&request.address, None);
        let mut params = vec![
            ("apikey", self.key.clone()),
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("contractaddress", address.clone()),
            ("sourceCode", request.standard_json.clone()),
            ("codeformat", "solidity-standard-json-input".to_string()),
            ("contractname", request.contract_name.clone()),
            ("compilerversion", request.compiler_version.clone()),
        ];
        if let Some(args) = &request.constructor_args {
            params.push(("constructorArguements", args.clone()));
        }

        let response: ApiResponse = self
            .http
            .post(&self.api_url)
            .form(&params)
            .send()
            .await?
            .json()
            .await?;

        let result_lower = response.result.to_lowercase();
        if result_lower.contains("already verified") {
            info!(address = address.as_str(), "already verified");
            return Ok(());
        }
        if response.status != "1" {
            bail!(
                "verification submission for {} rejected: {} ({})",
                address,
                response.message,
                response.result
            );
        }

        // On success the result field carries the receipt guid to poll.
        self.poll_status(&address, &response.result).await
    }

    async fn poll_status(&self, address: &str, guid: &str) -> Result<()> {
        for attempt in 1..=STATUS_POLLS {
            sleep(STATUS_POLL_BASE * attempt as u32).await;
            let response: ApiResponse = self
                .http
                .get(&self.api_url)
                .query(&[
                    ("apikey", self.key.as_str()),
                    ("module", "contract"),
                    ("action", "checkverifystatus"),
                    ("guid", guid),
                ])
                .send()
                .await?
                .json()
                .await?;
            debug!(address, attempt, result = response.result.as_str(), "poll");

            let result_lower = response.result.to_lowercase();
            if result_lower.contains("pending") || result_lower.contains("queue") {
                continue;
            }
            if result_lower.contains("already verified") || result_lower.contains("pass") {
                info!(address, "source verified");
                return Ok(());
            }
            bail!(
                "verification of {} failed: {}",
                address,
                response.result
            );
        }
        warn!(address, "verification still pending after {} polls", STATUS_POLLS);
        bail!("verification of {} did not complete in time", address)
    }

    /// Asks the explorer to detect and link the proxy's implementation via
    /// the documented API.
    pub async fn verify_proxy_api(&self, proxy: Address, implementation: Address) -> Result<()> {
        let proxy = to_checksum(&proxy, None);
        let response: ApiResponse = self
            .http
            .post(&self.api_url)
            .form(&[
                ("apikey", self.key.as_str()),
                ("module", "contract"),
                ("action", "verifyproxycontract"),
                ("address", proxy.as_str()),
                (
                    "expectedimplementation",
                    to_checksum(&implementation, None).as_str(),
                ),
            ])
            .send()
            .await?
            .json()
            .await?;
        if response.status != "1" {
            bail!(
                "proxy verification for {} rejected: {} ({})",
                proxy,
                response.message,
                response.result
            );
        }

        let guid = response.result;
        for attempt in 1..=STATUS_POLLS {
            sleep(STATUS_POLL_BASE * attempt as u32).await;
            let response: ApiResponse = self
                .http
                .get(&self.api_url)
                .query(&[
                    ("apikey", self.key.as_str()),
                    ("module", "contract"),
                    ("action", "checkproxyverification"),
                    ("guid", guid.as_str()),
                ])
                .send()
                .await?
                .json()
                .await?;
            let result_lower = response.result.to_lowercase();
            if result_lower.contains("pending") || result_lower.contains("queue") {
                continue;
            }
            if result_lower.contains("successfully updated") || result_lower.contains("found at") {
                info!(proxy = proxy.as_str(), "proxy verified");
                return Ok(());
            }
            bail!("proxy verification of {} failed: {}", proxy, response.result);
        }
        bail!("proxy verification of {} did not complete in time", proxy)
    }
}
