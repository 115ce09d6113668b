//! Health source client (Cisco DNA Center intent API).
//!
//! DNA Center authenticates with a basic-auth token POST, then takes the
//! bearer token in an `X-Auth-Token` header on every intent call. Bodies
//! are JSON whose shape varies by controller version, so the raw
//! `serde_json::Value` is handed to the normalizer rather than a rigid
//! schema.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::{EngineConfig, EnvConfig};
use crate::error::SourceError;
use crate::mac::MacAddress;

/// Capability set of the wireless/client-health manager.
#[async_trait]
pub trait HealthSource: Send + Sync {
    /// Obtain a bearer token for the intent API.
    async fn authenticate(&self) -> Result<String, SourceError>;

    /// MAC addresses of wireless endpoints associated with an identity.
    /// Empty means the identity has no wireless presence.
    async fn wireless_macs(
        &self,
        token: &str,
        identity: &str,
    ) -> Result<Vec<MacAddress>, SourceError>;

    /// Client health detail for one MAC.
    async fn client_health(&self, token: &str, mac: &MacAddress) -> Result<Value, SourceError>;

    /// Detected issues for one MAC.
    async fn client_issues(&self, token: &str, mac: &MacAddress) -> Result<Value, SourceError>;
}

/// HTTPS implementation against DNA Center.
pub struct DnacClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl DnacClient {
    pub fn new(env: &EnvConfig, engine: &EngineConfig) -> Result<Self, SourceError> {
        // Same self-signed certificate policy as the session source.
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(engine.request_timeout_secs))
            .build()
            .map_err(|e| SourceError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: env.dnac_base_url.clone(),
            username: env.dnac_username.clone(),
            password: env.dnac_password.clone(),
        })
    }

    async fn get_json(&self, request: reqwest::RequestBuilder) -> Result<Value, SourceError> {
        let response = request
            .send()
            .await
            .map_err(SourceError::from_reqwest)?
            .error_for_status()
            .map_err(SourceError::from_reqwest)?;

        response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl HealthSource for DnacClient {
    async fn authenticate(&self) -> Result<String, SourceError> {
        let url = format!("{}/dna/system/api/v1/auth/token", self.base_url);
        debug!(%url, "health source token request");

        let body = self
            .get_json(
                self.http
                    .post(&url)
                    .basic_auth(&self.username, Some(&self.password))
                    .header(reqwest::header::CONTENT_TYPE, "application/json"),
            )
            .await?;

        body.get("Token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SourceError::Decode("token response missing Token field".into()))
    }

    async fn wireless_macs(
        &self,
        token: &str,
        identity: &str,
    ) -> Result<Vec<MacAddress>, SourceError> {
        let url = format!("{}/dna/intent/api/v1/user-enrichment-details", self.base_url);
        debug!(%url, identity, "health source enrichment lookup");

        let body = self
            .get_json(
                self.http
                    .get(&url)
                    .header("X-Auth-Token", token)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .header("entity_type", "network_user_id")
                    .header("entity_value", identity),
            )
            .await?;

        Ok(extract_wireless_macs(&body))
    }

    async fn client_health(&self, token: &str, mac: &MacAddress) -> Result<Value, SourceError> {
        let url = format!("{}/dna/intent/api/v1/client-detail", self.base_url);
        debug!(%url, %mac, "health source client detail");

        self.get_json(
            self.http
                .get(&url)
                .query(&[("macAddress", mac.as_str())])
                .header("X-Auth-Token", token)
                .header(reqwest::header::ACCEPT, "application/json"),
        )
        .await
    }

    async fn client_issues(&self, token: &str, mac: &MacAddress) -> Result<Value, SourceError> {
        let url = format!("{}/dna/intent/api/v1/issues", self.base_url);
        debug!(%url, %mac, "health source issue list");

        self.get_json(
            self.http
                .get(&url)
                .query(&[("macAddress", mac.as_str())])
                .header("X-Auth-Token", token)
                .header(reqwest::header::ACCEPT, "application/json"),
        )
        .await
    }
}

/// Pull the wireless host MAC(s) out of an enrichment response.
///
/// The payload is an array of enrichment entries; only entries with a
/// valid `userDetails.hostMac` survive.
pub fn extract_wireless_macs(body: &Value) -> Vec<MacAddress> {
    let mut macs = Vec::new();

    if let Some(entries) = body.as_array() {
        for entry in entries {
            let host_mac = entry
                .get("userDetails")
                .and_then(|d| d.get("hostMac"))
                .and_then(Value::as_str);

            if let Some(mac) = host_mac.and_then(MacAddress::parse) {
                if !macs.contains(&mac) {
                    macs.push(mac);
                }
            }
        }
    }

    macs
}
