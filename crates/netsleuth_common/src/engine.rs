//! Correlation orchestrator.
//!
//! Drives the end-to-end flow as a sequence of barrier-synchronized waves:
//!
//! 1. active-session list + health-source token (joined)
//! 2. identity MAC extraction + wireless enrichment lookup (joined)
//! 3. per-MAC auth-status detail, bounded fan-out
//! 4. per-MAC client health (only when a wireless MAC was resolved)
//! 5. per-MAC issue detail (second wireless wave)
//!
//! Results are attached to their originating MAC by index, so completion
//! order never shows in the report. Only the wave-1 session query is fatal;
//! every other failure degrades to empty data with a warning.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::dnac::HealthSource;
use crate::error::EngineError;
use crate::ise::{ActiveList, SessionSource};
use crate::mac::MacAddress;
use crate::model::{DiagnosticReport, OrderedMap, SessionRecord, WirelessEntry};
use crate::normalize;
use crate::store::FailureStore;

/// MAC addresses tied to an identity in the active-session list, in
/// first-seen order, deduplicated, invalid station ids dropped.
pub fn macs_for_identity(active: &ActiveList, identity: &str) -> Vec<MacAddress> {
    let mut macs = Vec::new();

    for session in &active.sessions {
        if session.user_name.as_deref() != Some(identity) {
            continue;
        }
        let Some(station_id) = &session.calling_station_id else {
            continue;
        };
        match MacAddress::parse(station_id) {
            Some(mac) => {
                if !macs.contains(&mac) {
                    macs.push(mac);
                }
            }
            None => {
                debug!(%station_id, "calling_station_id is not a MAC, skipped");
            }
        }
    }

    macs
}

pub struct Correlator<S, H> {
    session_source: Arc<S>,
    health_source: Arc<H>,
    store: Arc<FailureStore>,
    config: EngineConfig,
}

impl<S, H> Correlator<S, H>
where
    S: SessionSource + 'static,
    H: HealthSource + 'static,
{
    pub fn new(
        session_source: Arc<S>,
        health_source: Arc<H>,
        store: Arc<FailureStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            session_source,
            health_source,
            store,
            config,
        }
    }

    /// Run the full correlation for one identity.
    pub async fn run_diagnostic(&self, identity: &str) -> Result<DiagnosticReport, EngineError> {
        let started = Instant::now();

        // Wave 1: both discovery calls at once. The session list is the
        // single fatal dependency; a missing token just disables the
        // wireless waves.
        let (active, token) = tokio::join!(
            self.session_source.active_sessions(),
            self.health_source.authenticate(),
        );

        let active = active.map_err(EngineError::Discovery)?;
        let token = match token {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, "health source authentication failed, wireless enrichment disabled");
                None
            }
        };

        // Wave 2: MAC extraction and the enrichment lookup are independent
        // of each other.
        let enrichment = async {
            let Some(token) = &token else {
                return Vec::new();
            };
            match self.health_source.wireless_macs(token, identity).await {
                Ok(macs) => macs,
                Err(e) => {
                    warn!(error = %e, "identity enrichment lookup degraded");
                    Vec::new()
                }
            }
        };
        let (macs, wireless_macs) =
            tokio::join!(async { macs_for_identity(&active, identity) }, enrichment);

        debug!(
            identity,
            macs = macs.len(),
            wireless = wireless_macs.len(),
            "correlation keys resolved"
        );

        // Wave 3: per-MAC session detail.
        let details: Vec<OrderedMap<SessionRecord>> = self
            .fan_out(&macs, |mac| {
                let session_source = Arc::clone(&self.session_source);
                let store = Arc::clone(&self.store);
                async move {
                    match session_source.auth_status(&mac).await {
                        Ok(raw) => normalize::session_map(&raw, &store),
                        Err(e) => {
                            warn!(%mac, error = %e, "auth status query degraded");
                            OrderedMap::new()
                        }
                    }
                }
            })
            .await;

        let mut ise_information = OrderedMap::new();
        for (mac, sessions) in macs.iter().zip(details) {
            ise_information.insert(mac.to_string(), sessions);
        }

        // Waves 4 and 5: only when the identity has a wireless endpoint.
        let dnac_information = match token {
            Some(token) if !wireless_macs.is_empty() => {
                Some(self.wireless_waves(&token, &wireless_macs).await)
            }
            _ => None,
        };

        info!(
            identity,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "diagnostic complete"
        );

        Ok(DiagnosticReport {
            ise_information,
            dnac_information,
        })
    }

    /// Client-health wave, then issue wave, each a full barrier.
    async fn wireless_waves(
        &self,
        token: &str,
        macs: &[MacAddress],
    ) -> OrderedMap<WirelessEntry> {
        let health = self
            .fan_out(macs, |mac| {
                let health_source = Arc::clone(&self.health_source);
                let token = token.to_string();
                async move {
                    match health_source.client_health(&token, &mac).await {
                        Ok(raw) => normalize::health_record(&raw),
                        Err(e) => {
                            warn!(%mac, error = %e, "client health query degraded");
                            None
                        }
                    }
                }
            })
            .await;

        let issues = self
            .fan_out(macs, |mac| {
                let health_source = Arc::clone(&self.health_source);
                let token = token.to_string();
                async move {
                    match health_source.client_issues(&token, &mac).await {
                        Ok(raw) => normalize::issue_record(&raw),
                        Err(e) => {
                            warn!(%mac, error = %e, "client issue query degraded");
                            None
                        }
                    }
                }
            })
            .await;

        let mut entries = OrderedMap::new();
        for ((mac, health), issues) in macs.iter().zip(health).zip(issues) {
            entries.insert(mac.to_string(), WirelessEntry { health, issues });
        }
        entries
    }

    /// One bounded fan-out wave. Spawns a task per MAC, caps in-flight work
    /// with a semaphore, and slots each result back by originating index.
    /// `join_next` drains every task before returning: a hard barrier.
    async fn fan_out<T, F, Fut>(&self, macs: &[MacAddress], make_task: F) -> Vec<T>
    where
        T: Default + Send + 'static,
        F: Fn(MacAddress) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let limit = self.config.max_in_flight.max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut join_set = JoinSet::new();

        for (index, mac) in macs.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let task = make_task(mac);
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (index, task.await)
            });
        }

        let mut results: Vec<T> = std::iter::repeat_with(T::default)
            .take(macs.len())
            .collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, value)) => results[index] = value,
                Err(e) => warn!(error = %e, "fan-out task failed to join"),
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ise::ActiveSession;

    fn session(user: &str, station: &str) -> ActiveSession {
        ActiveSession {
            user_name: Some(user.to_string()),
            calling_station_id: Some(station.to_string()),
        }
    }

    #[test]
    fn test_macs_for_identity_filters_and_dedupes() {
        let active = ActiveList {
            sessions: vec![
                session("jdoe", "00:11:22:33:44:55"),
                session("jdoe", "10.20.30.40"),
                session("asmith", "AA:BB:CC:DD:EE:FF"),
                session("jdoe", "00:11:22:33:44:55"),
                session("jdoe", "66-77-88-99-aa-bb"),
            ],
        };

        let macs = macs_for_identity(&active, "jdoe");
        let rendered: Vec<&str> = macs.iter().map(|m| m.as_str()).collect();
        assert_eq!(rendered, vec!["00:11:22:33:44:55", "66:77:88:99:AA:BB"]);
    }

    #[test]
    fn test_macs_for_identity_no_match_is_empty() {
        let active = ActiveList {
            sessions: vec![session("asmith", "00:11:22:33:44:55")],
        };
        assert!(macs_for_identity(&active, "jdoe").is_empty());
    }

    #[test]
    fn test_macs_for_identity_tolerates_missing_fields() {
        let active = ActiveList {
            sessions: vec![ActiveSession {
                user_name: Some("jdoe".to_string()),
                calling_station_id: None,
            }],
        };
        assert!(macs_for_identity(&active, "jdoe").is_empty());
    }
}
