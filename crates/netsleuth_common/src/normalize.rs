//! Payload normalization.
//!
//! Converts raw session-source XML records and health-source JSON bodies
//! into the uniform domain records. The rule throughout: a missing or
//! oddly-shaped field becomes an absent value, never an error. Only the
//! engine decides what is fatal.

use std::sync::OnceLock;

use chrono::{Local, TimeZone};
use regex::Regex;
use serde_json::Value;

use crate::ise::AuthStatusOutputList;
use crate::model::{
    HealthRecord, IssueEntry, IssueRecord, OrderedMap, SessionRecord,
};
use crate::store::FailureStore;

/// Label carrying the authorization policy inside the composite attribute
/// string.
const ATTR_AUTHORIZATION_POLICY: &str = "AuthorizationPolicyMatchedRule";

/// Label carrying the policy-set name inside the composite attribute string.
const ATTR_POLICY_SET: &str = "ISEPolicySetName";

/// Entry delimiter of the composite attribute string.
const ATTR_DELIMITER: &str = ":!:";

fn failure_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Failure ids are 5-6 digits at the start of the reason text.
    PATTERN.get_or_init(|| Regex::new(r"^(\d{5,6})").expect("static pattern"))
}

/// Extract the leading failure id from a free-text failure reason.
pub fn extract_failure_id(reason: &str) -> Option<i64> {
    failure_id_pattern()
        .captures(reason)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Split the composite `other_attr_string` blob into label/value pairs.
///
/// Entries are separated by `:!:`; each entry is `label=value`. Entries
/// without a `=` are dropped.
pub fn attr_pairs(blob: &str) -> Vec<(String, String)> {
    blob.split(ATTR_DELIMITER)
        .filter_map(|entry| {
            entry
                .split_once('=')
                .map(|(label, value)| (label.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn attr_value(pairs: &[(String, String)], label: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(l, _)| l == label)
        .map(|(_, v)| v.clone())
}

/// Session key for one auth-status record.
///
/// Derived from the last four characters of the timestamp when present.
/// Timestamp-less records get `f{index:03}` instead of the original random
/// four characters: unique within a run, and never colliding with a
/// timestamp-derived key (timestamps carry no lowercase `f`).
pub fn session_key(timestamp: Option<&str>, index: usize) -> String {
    match timestamp {
        Some(ts) if !ts.is_empty() => {
            let chars: Vec<char> = ts.chars().collect();
            let start = chars.len().saturating_sub(4);
            chars[start..].iter().collect()
        }
        _ => format!("f{index:03}"),
    }
}

/// Rewrite the ISO-like `T` separator for display.
pub fn display_timestamp(ts: &str) -> String {
    ts.replace('T', "  ")
}

/// Convert an epoch-millisecond value to a local timestamp string.
pub fn epoch_ms_to_local(ms: i64) -> Option<String> {
    Local
        .timestamp_opt(ms / 1000, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Normalize one MAC's auth-status history into an ordered session map.
pub fn session_map(raw: &AuthStatusOutputList, store: &FailureStore) -> OrderedMap<SessionRecord> {
    let mut sessions = OrderedMap::new();

    let elements = match &raw.auth_status_list {
        Some(list) => &list.elements,
        None => return sessions,
    };

    for (index, element) in elements.iter().enumerate() {
        let mut failures = Vec::new();
        if element.is_failed() {
            if let Some(reason) = &element.failure_reason {
                if let Some(id) = extract_failure_id(reason) {
                    if let Some(detail) = store.lookup(id) {
                        failures.push(detail.clone());
                    }
                }
            }
        }

        let (authorisation_policy, authentication_policy) = match &element.other_attr_string {
            Some(blob) => {
                let pairs = attr_pairs(blob);
                (
                    attr_value(&pairs, ATTR_AUTHORIZATION_POLICY),
                    attr_value(&pairs, ATTR_POLICY_SET),
                )
            }
            None => (None, None),
        };

        let key = session_key(element.acs_timestamp.as_deref(), index);
        let record = SessionRecord {
            timestamp: element.acs_timestamp.as_deref().map(display_timestamp),
            authentication_method: element.authentication_method.clone(),
            posture_status: element.posture_status.clone(),
            failures,
            identity_group: element.identity_group.clone(),
            authorisation_policy,
            authentication_policy,
            nac_compliance: element.nac_policy_compliance.clone(),
        };

        sessions.insert(key, record);
    }

    sessions
}

fn field_str(value: &Value, key: &str) -> Option<String> {
    match value.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn field_i64(value: &Value, key: &str) -> Option<i64> {
    value.get(key).and_then(Value::as_i64)
}

/// Normalize a client-detail body into a [`HealthRecord`].
///
/// Returns `None` when the body carries no `detail` section at all (the
/// degraded-call shape), so the assembler can render "No data found".
pub fn health_record(raw: &Value) -> Option<HealthRecord> {
    let detail = raw.get("detail")?;
    if detail.as_object().map(|o| o.is_empty()).unwrap_or(true) {
        return None;
    }

    Some(HealthRecord {
        id: field_str(detail, "id"),
        connection_status: field_str(detail, "connectionStatus"),
        host_type: field_str(detail, "hostType"),
        user_id: field_str(detail, "userId"),
        identifier: field_str(detail, "identifier"),
        host_name: field_str(detail, "hostName"),
        host_os: field_str(detail, "hostOs"),
        host_version: field_str(detail, "hostVersion"),
        sub_type: field_str(detail, "subType"),
        firmware_version: field_str(detail, "firmwareVersion"),
        device_vendor: field_str(detail, "deviceVendor"),
        last_updated: field_i64(detail, "lastUpdated").and_then(epoch_ms_to_local),
        health_score: detail.get("healthScore").cloned(),
        host_mac: field_str(detail, "hostMac"),
        host_ipv4: field_str(detail, "hostIpV4"),
        auth_type: field_str(detail, "authType"),
        ssid: field_str(detail, "ssid"),
        location: field_str(detail, "location"),
        client_connection: field_str(detail, "clientConnection"),
        issue_count: field_i64(detail, "issueCount"),
        auth_done_time: field_i64(detail, "authDoneTime"),
        onboarding_time: field_i64(detail, "onboardingTime").and_then(epoch_ms_to_local),
        connection_info: detail.get("connectionInfo").cloned(),
    })
}

/// Normalize an issue-list body into an [`IssueRecord`].
///
/// Returns `None` for an empty/degraded body.
pub fn issue_record(raw: &Value) -> Option<IssueRecord> {
    if raw.as_object().map(|o| o.is_empty()).unwrap_or(true) {
        return None;
    }

    let response = raw
        .get("response")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(issue_entry).collect())
        .unwrap_or_default();

    Some(IssueRecord {
        version: field_str(raw, "version"),
        total_count: field_i64(raw, "totalCount"),
        response,
    })
}

fn issue_entry(raw: &Value) -> IssueEntry {
    IssueEntry {
        name: field_str(raw, "name"),
        issue_id: field_str(raw, "issueId"),
        device_id: field_str(raw, "deviceId"),
        client_mac: field_str(raw, "clientMac"),
        status: field_str(raw, "status"),
        priority: field_str(raw, "priority"),
        category: field_str(raw, "category").or_else(|| field_str(raw, "issue_category")),
        summary: field_str(raw, "summary"),
        occurrence_count: field_i64(raw, "issue_occurence_count"),
        last_occurred: field_i64(raw, "last_occurence_time").and_then(epoch_ms_to_local),
    }
}
