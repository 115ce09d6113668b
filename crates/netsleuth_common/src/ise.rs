//! Session source client (Cisco ISE monitoring API).
//!
//! ISE answers over HTTPS with self-signed certificates and XML bodies.
//! The trait carries the two capabilities the engine needs: the active
//! session list (discovery) and per-MAC auth-status history (detail wave).
//! Production code uses [`IseClient`]; tests drive the engine with a fake
//! implementation and never touch the network.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::{EngineConfig, EnvConfig};
use crate::error::SourceError;
use crate::mac::MacAddress;

/// Active session list, `GET .../Session/ActiveList`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActiveList {
    #[serde(rename = "activeSession", default)]
    pub sessions: Vec<ActiveSession>,
}

/// One entry of the active session list. Only the correlation keys are
/// read; everything else in the payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActiveSession {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub calling_station_id: Option<String>,
}

/// Auth-status history for one MAC, `GET .../AuthStatus/MACAddress/...`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthStatusOutputList {
    #[serde(rename = "authStatusList", default)]
    pub auth_status_list: Option<AuthStatusList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthStatusList {
    #[serde(rename = "authStatusElements", default)]
    pub elements: Vec<AuthStatusElement>,
}

/// One authentication event. ISE omits fields freely depending on the
/// outcome and protocol, so every field defaults to absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthStatusElement {
    #[serde(default)]
    pub acs_timestamp: Option<String>,
    #[serde(default)]
    pub authentication_method: Option<String>,
    #[serde(default)]
    pub posture_status: Option<String>,
    #[serde(default)]
    pub identity_group: Option<String>,
    #[serde(default)]
    pub nac_policy_compliance: Option<String>,
    #[serde(default)]
    pub other_attr_string: Option<String>,
    #[serde(default)]
    pub failed: Option<Failed>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

/// `<failed ...>true</failed>` carries attributes, so the flag itself is
/// the element text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Failed {
    #[serde(rename = "$text", default)]
    pub text: Option<String>,
}

impl AuthStatusElement {
    /// Whether this record represents a failed authentication.
    pub fn is_failed(&self) -> bool {
        self.failed
            .as_ref()
            .and_then(|f| f.text.as_deref())
            .map(|t| t == "true")
            .unwrap_or(false)
    }
}

/// Capability set of the authentication/session manager.
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// All currently active sessions. The single fatal call: without it no
    /// MAC can be discovered.
    async fn active_sessions(&self) -> Result<ActiveList, SourceError>;

    /// Auth-status history for one MAC over the configured lookback window.
    async fn auth_status(&self, mac: &MacAddress) -> Result<AuthStatusOutputList, SourceError>;
}

/// HTTPS implementation against the ISE monitoring node.
pub struct IseClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    lookback_secs: u64,
}

impl IseClient {
    pub fn new(env: &EnvConfig, engine: &EngineConfig) -> Result<Self, SourceError> {
        // ISE monitoring nodes ship self-signed certificates; validation is
        // disabled by policy, matching the upstream deployment guide.
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(engine.request_timeout_secs))
            .build()
            .map_err(|e| SourceError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: format!("{}/admin/API/mnt", env.ise_base_url),
            username: env.ise_username.clone(),
            password: env.ise_password.clone(),
            lookback_secs: engine.lookback_secs,
        })
    }

    async fn get_xml(&self, url: &str) -> Result<String, SourceError> {
        debug!(%url, "session source query");

        let response = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/xml")
            .send()
            .await
            .map_err(SourceError::from_reqwest)?
            .error_for_status()
            .map_err(SourceError::from_reqwest)?;

        response
            .text()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SessionSource for IseClient {
    async fn active_sessions(&self) -> Result<ActiveList, SourceError> {
        let url = format!("{}/Session/ActiveList", self.base_url);
        let body = self.get_xml(&url).await?;
        quick_xml::de::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }

    async fn auth_status(&self, mac: &MacAddress) -> Result<AuthStatusOutputList, SourceError> {
        let url = format!(
            "{}/AuthStatus/MACAddress/{}/{}/0/All",
            self.base_url, mac, self.lookback_secs
        );
        let body = self.get_xml(&url).await?;
        quick_xml::de::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_list_parses_sessions() {
        let xml = r#"
            <activeList noOfActiveSession="2">
                <activeSession>
                    <user_name>jdoe</user_name>
                    <calling_station_id>00:11:22:33:44:55</calling_station_id>
                </activeSession>
                <activeSession>
                    <user_name>asmith</user_name>
                    <calling_station_id>10.20.30.40</calling_station_id>
                </activeSession>
            </activeList>"#;

        let list: ActiveList = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(list.sessions.len(), 2);
        assert_eq!(list.sessions[0].user_name.as_deref(), Some("jdoe"));
        assert_eq!(
            list.sessions[1].calling_station_id.as_deref(),
            Some("10.20.30.40")
        );
    }

    #[test]
    fn test_active_list_tolerates_empty_list() {
        let xml = r#"<activeList noOfActiveSession="0"></activeList>"#;
        let list: ActiveList = quick_xml::de::from_str(xml).unwrap();
        assert!(list.sessions.is_empty());
    }

    #[test]
    fn test_auth_status_parses_failed_flag_text() {
        let xml = r#"
            <authStatusOutputList>
                <authStatusList key="00:11:22:33:44:55">
                    <authStatusElements>
                        <acs_timestamp>2024-03-01T09:15:42.123</acs_timestamp>
                        <failed failure="true">true</failed>
                        <failure_reason>11007 Could not locate supplicant</failure_reason>
                    </authStatusElements>
                </authStatusList>
            </authStatusOutputList>"#;

        let out: AuthStatusOutputList = quick_xml::de::from_str(xml).unwrap();
        let elements = &out.auth_status_list.as_ref().unwrap().elements;
        assert_eq!(elements.len(), 1);
        assert!(elements[0].is_failed());
        assert_eq!(
            elements[0].failure_reason.as_deref(),
            Some("11007 Could not locate supplicant")
        );
        // Fields missing from the payload come back absent, not as errors.
        assert!(elements[0].posture_status.is_none());
        assert!(elements[0].other_attr_string.is_none());
    }

    #[test]
    fn test_auth_status_tolerates_missing_list() {
        let xml = r#"<authStatusOutputList></authStatusOutputList>"#;
        let out: AuthStatusOutputList = quick_xml::de::from_str(xml).unwrap();
        assert!(out.auth_status_list.is_none());
    }
}
