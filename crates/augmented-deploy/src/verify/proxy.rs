use std::time::Duration;

use async_trait::async_trait;
use ethers::{types::Address, utils::to_checksum};
use eyre::{bail, Result};
use tokio::time::sleep;
use tracing::{info, warn};

use super::etherscan::EtherscanClient;

/// How proxy → implementation links get registered with the explorer. The
/// API path is preferred; the form scraper exists because the API's proxy
/// detection regularly fails for freshly-verified implementations.
#[async_trait]
pub trait ProxyVerificationBackend {
    async fn verify_proxy(&self, proxy: Address, implementation: Address) -> Result<()>;
}

pub struct ApiProxyVerification {
    client: EtherscanClient,
}

impl ApiProxyVerification {
    pub fn new(client: EtherscanClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProxyVerificationBackend for ApiProxyVerification {
    async fn verify_proxy(&self, proxy: Address, implementation: Address) -> Result<()> {
        self.client.verify_proxy_api(proxy, implementation).await
    }
}

/// Drives the explorer's HTML proxy-checker form: fetch the page, lift the
/// ASP.NET view-state fields out of it, and replay them through the verify
/// and save submissions. Best effort; the markup is undocumented.
pub struct FormProxyVerification {
    http: reqwest::Client,
    explorer_url: String,
}

const FORM_ATTEMPTS: usize = 10;
const FORM_BACKOFF_BASE: Duration = Duration::from_secs(2);

/// The hidden fields the form round-trips on every submission.
const VIEW_STATE_FIELDS: &[&str] = &["__VIEWSTATE", "__VIEWSTATEGENERATOR", "__EVENTVALIDATION"];

impl FormProxyVerification {
    pub fn new(explorer_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            explorer_url: explorer_url.into(),
        }
    }

    fn checker_url(&self, proxy: Address) -> String {
        format!(
            "{}/proxyContractChecker?a={}",
            self.explorer_url,
            to_checksum(&proxy, None)
        )
    }

    async fn submit(&self, proxy: Address, button: &str, body_must_contain: &str) -> Result<()> {
        let url = self.checker_url(proxy);
        for attempt in 1..=FORM_ATTEMPTS {
            let page = self.http.get(&url).send().await?.text().await?;
            if is_busy(&page) {
                warn!(attempt, "explorer busy, backing off");
                sleep(FORM_BACKOFF_BASE * attempt as u32).await;
                continue;
            }

            let mut form: Vec<(String, String)> = Vec::new();
            for field in VIEW_STATE_FIELDS {
                match extract_hidden_field(&page, field) {
                    Some(value) => form.push((field.to_string(), value)),
                    None => bail!("proxy checker page is missing the {} field", field),
                }
            }
            form.push((
                "ctl00$ContentPlaceHolder1$txtContractAddress".to_string(),
                to_checksum(&proxy, None),
            ));
            form.push((button.to_string(), "Verify".to_string()));

            let body = self
                .http
                .post(&url)
                .form(&form)
                .send()
                .await?
                .text()
                .await?;
            if is_busy(&body) {
                warn!(attempt, "explorer busy on submit, backing off");
                sleep(FORM_BACKOFF_BASE * attempt as u32).await;
                continue;
            }
            if body.contains(body_must_contain) {
                return Ok(());
            }
            bail!(
                "proxy checker rejected {} (wanted '{}' in the response)",
                to_checksum(&proxy, None),
                body_must_contain
            );
        }
        bail!(
            "explorer stayed busy through {} proxy-checker attempts",
            FORM_ATTEMPTS
        )
    }
}

#[async_trait]
impl ProxyVerificationBackend for FormProxyVerification {
    async fn verify_proxy(&self, proxy: Address, _implementation: Address) -> Result<()> {
        self.submit(
            proxy,
            "ctl00$ContentPlaceHolder1$btnSubmit",
            "implementation contract is found at",
        )
        .await?;
        self.submit(
            proxy,
            "ctl00$ContentPlaceHolder1$btnSave",
            "has been saved",
        )
        .await?;
        info!(proxy = ?proxy, "proxy verified via form fallback");
        Ok(())
    }
}

fn is_busy(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("servers are busy") || lower.contains("maximum rate limit")
}

/// Pulls the value of a hidden `<input>` out of the page markup.
pub fn extract_hidden_field(html: &str, name: &str) -> Option<String> {
    let marker = format!("name=\"{}\"", name);
    let tag_start = html.find(&marker)?;
    let rest = &html[tag_start..];
    let tag_end = rest.find('>')?;
    let tag = &rest[..tag_end];
    let value_start = tag.find("value=\"")? + "value=\"".len();
    let value_end = tag[value_start..].find('"')? + value_start;
    Some(tag[value_start..value_end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <form method="post" action="./proxyContractChecker?a=0x1">
            <input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="dDxTdGF0ZT47bD==" />
            <input type="hidden" name="__VIEWSTATEGENERATOR" id="__VIEWSTATEGENERATOR" value="4D95A09F" />
            <input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="/wEWAgKc08ZqAqzl" />
            <input name="ctl00$ContentPlaceHolder1$txtContractAddress" type="text" value="" />
        </form>
    "#;

    #[test]
    fn test_extract_hidden_fields() {
        assert_eq!(
            extract_hidden_field(PAGE, "__VIEWSTATE").unwrap(),
            "dDxTdGF0ZT47bD=="
        );
        assert_eq!(
            extract_hidden_field(PAGE, "__VIEWSTATEGENERATOR").unwrap(),
            "4D95A09F"
        );
        assert_eq!(
            extract_hidden_field(PAGE, "__EVENTVALIDATION").unwrap(),
            "/wEWAgKc08ZqAqzl"
        );
        assert_eq!(extract_hidden_field(PAGE, "__MISSING"), None);
    }

    #[test]
    fn test_extract_does_not_cross_tags() {
        // The empty text input must not pick up a later tag's value.
        assert_eq!(
            extract_hidden_field(PAGE, "ctl00$ContentPlaceHolder1$txtContractAddress").unwrap(),
            ""
        );
    }

    #[test]
    fn test_busy_detection() {
        assert!(is_busy("<html>Sorry, our servers are busy</html>"));
        assert!(is_busy("Maximum rate limit reached"));
        assert!(!is_busy("<html>ok</html>"));
    }
}
