//! Domain records shared by the normalizer, engine, and report assembler.
//!
//! Field optionality mirrors what the upstream systems actually send: both
//! ISE and DNA Center omit or reshape fields record-to-record, so every
//! per-record field is an `Option` that serializes as JSON `null` rather
//! than an error path.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A map that preserves insertion order in iteration and serialization.
///
/// The report contract requires MAC entries in discovery order and session
/// entries in normalizer order; `HashMap`/`BTreeMap` give neither. Backed by
/// a `Vec` of pairs, which is fine at the cardinality in play (a handful of
/// MACs per identity, tens of sessions per MAC).
#[derive(Debug, Clone)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a key, replacing the value in place if the key already exists.
    pub fn insert(&mut self, key: String, value: V) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Resolved failure catalog entry for an extracted failure id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    pub code: String,
    pub cause: String,
    pub resolution: String,
}

/// One authentication event for a MAC, as reported by the session source.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub timestamp: Option<String>,
    pub authentication_method: Option<String>,
    pub posture_status: Option<String>,
    pub failures: Vec<FailureDetail>,
    pub identity_group: Option<String>,
    pub authorisation_policy: Option<String>,
    pub authentication_policy: Option<String>,
    pub nac_compliance: Option<String>,
}

/// Per-MAC wireless client detail from the health source.
///
/// Every field is individually optional; DNA Center omits whole sections
/// depending on client state and software version.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthRecord {
    pub id: Option<String>,
    pub connection_status: Option<String>,
    pub host_type: Option<String>,
    pub user_id: Option<String>,
    pub identifier: Option<String>,
    pub host_name: Option<String>,
    pub host_os: Option<String>,
    pub host_version: Option<String>,
    pub sub_type: Option<String>,
    pub firmware_version: Option<String>,
    pub device_vendor: Option<String>,
    pub last_updated: Option<String>,
    pub health_score: Option<serde_json::Value>,
    pub host_mac: Option<String>,
    pub host_ipv4: Option<String>,
    pub auth_type: Option<String>,
    pub ssid: Option<String>,
    pub location: Option<String>,
    pub client_connection: Option<String>,
    pub issue_count: Option<i64>,
    pub auth_done_time: Option<i64>,
    pub onboarding_time: Option<String>,
    pub connection_info: Option<serde_json::Value>,
}

/// One detected issue from the health source's issue list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IssueEntry {
    pub name: Option<String>,
    pub issue_id: Option<String>,
    pub device_id: Option<String>,
    pub client_mac: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub occurrence_count: Option<i64>,
    pub last_occurred: Option<String>,
}

/// Per-MAC issue listing from the health source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IssueRecord {
    pub version: Option<String>,
    pub total_count: Option<i64>,
    pub response: Vec<IssueEntry>,
}

/// Combined wireless view for one MAC. `None` means the corresponding call
/// degraded; the rendering shows it as "No data found".
#[derive(Debug, Clone, Default, Serialize)]
pub struct WirelessEntry {
    pub health: Option<HealthRecord>,
    pub issues: Option<IssueRecord>,
}

/// The assembled diagnostic report for one identity.
///
/// `dnac_information` is omitted from the serialized payload entirely when
/// the identity resolved to no wireless endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub ise_information: OrderedMap<OrderedMap<SessionRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnac_information: Option<OrderedMap<WirelessEntry>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_map_preserves_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("zz".to_string(), 1);
        map.insert("aa".to_string(), 2);
        map.insert("mm".to_string(), 3);

        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["zz", "aa", "mm"]);
    }

    #[test]
    fn test_ordered_map_insert_replaces_in_place() {
        let mut map = OrderedMap::new();
        map.insert("a".to_string(), 1);
        map.insert("b".to_string(), 2);
        map.insert("a".to_string(), 9);

        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&9));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_ordered_map_serializes_as_json_object_in_order() {
        let mut map = OrderedMap::new();
        map.insert("second".to_string(), 2);
        map.insert("first".to_string(), 1);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"second":2,"first":1}"#);
    }

    #[test]
    fn test_report_omits_dnac_key_when_absent() {
        let report = DiagnosticReport {
            ise_information: OrderedMap::new(),
            dnac_information: None,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("dnac_information"));
        assert!(json.contains("ise_information"));
    }
}
