//! Canonical hardware addresses.
//!
//! ISE reports a `calling_station_id` per session, which is *usually* a MAC
//! address but can be an IP, a username, or free text depending on the NAS.
//! Everything that feeds a downstream per-MAC query goes through
//! [`MacAddress::parse`] first; anything that does not look like a MAC is
//! dropped at extraction time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A validated MAC address, canonicalized to uppercase colon-separated form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    /// Parse a MAC address in colon, dash, dot-grouped, or bare hex form.
    ///
    /// Accepted inputs: `00:11:22:33:44:55`, `00-11-22-33-44-55`,
    /// `0011.2233.4455`, `001122334455`. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let stripped: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.'))
            .collect();

        if stripped.len() != 12 || !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let upper = stripped.to_ascii_uppercase();
        let canonical = upper
            .as_bytes()
            .chunks(2)
            .map(|pair| std::str::from_utf8(pair).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(":");

        Some(MacAddress(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MacAddress::parse(s).ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_colon_form() {
        let mac = MacAddress::parse("00:11:22:33:44:55").unwrap();
        assert_eq!(mac.as_str(), "00:11:22:33:44:55");
    }

    #[test]
    fn test_parse_canonicalizes_case_and_separators() {
        for raw in ["aa-bb-cc-dd-ee-ff", "aabb.ccdd.eeff", "aabbccddeeff"] {
            let mac = MacAddress::parse(raw).unwrap();
            assert_eq!(mac.as_str(), "AA:BB:CC:DD:EE:FF", "input {raw}");
        }
    }

    #[test]
    fn test_rejects_non_mac_station_ids() {
        // calling_station_id values seen in the wild that are not MACs
        for raw in [
            "10.20.30.40",
            "host/jdoe-laptop",
            "00:11:22:33:44",
            "00:11:22:33:44:55:66",
            "gg:hh:ii:jj:kk:ll",
            "",
        ] {
            assert!(MacAddress::parse(raw).is_none(), "input {raw:?}");
        }
    }
}
