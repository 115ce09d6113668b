//! Human-readable rendering of the diagnostic report.
//!
//! One block per MAC in discovery order, sessions in normalizer order,
//! "No data found" for anything that degraded to empty. The JSON side of
//! the report is plain serde serialization of [`DiagnosticReport`].

use std::fmt::Write;

use owo_colors::OwoColorize;

use crate::model::{DiagnosticReport, HealthRecord, IssueRecord, SessionRecord};

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("null")
}

fn opt_i64(value: &Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "null".to_string())
}

/// Render the full report as console text.
pub fn render_text(report: &DiagnosticReport) -> String {
    let mut out = String::new();

    for (mac, sessions) in report.ise_information.iter() {
        let _ = writeln!(out, "{}", mac.bold());
        let _ = writeln!(out, "{}", "=".repeat(20));
        let _ = writeln!(out);

        if sessions.is_empty() {
            let _ = writeln!(out, "No data found");
            let _ = writeln!(out);
            continue;
        }

        for (_, record) in sessions.iter() {
            render_session(&mut out, record);
        }
    }

    if let Some(wireless) = &report.dnac_information {
        let _ = writeln!(out, "{}", "INFO GATHERED ON DNAC:".bold());
        for (mac, entry) in wireless.iter() {
            let _ = writeln!(out, "{}", mac.bold());
            let _ = writeln!(out, "{}", "=".repeat(20));
            let _ = writeln!(out);

            match &entry.health {
                Some(health) => render_health(&mut out, health),
                None => {
                    let _ = writeln!(out, "No data found");
                    let _ = writeln!(out);
                }
            }
        }

        let _ = writeln!(out, "{}", "Issues found on DNAC:".bold());
        for (mac, entry) in wireless.iter() {
            let _ = writeln!(out, "{}", mac.bold());
            let _ = writeln!(out, "{}", "=".repeat(20));
            let _ = writeln!(out);

            match &entry.issues {
                Some(issues) => render_issues(&mut out, issues),
                None => {
                    let _ = writeln!(out, "No data found");
                    let _ = writeln!(out);
                }
            }
        }
    }

    out
}

fn render_session(out: &mut String, record: &SessionRecord) {
    let _ = writeln!(out, "Time: {}", opt(&record.timestamp));
    let _ = writeln!(out, "Authentication Method: {}", opt(&record.authentication_method));
    let _ = writeln!(out, "Posture Status: {}", opt(&record.posture_status));
    let _ = writeln!(out, "Identity Group: {}", opt(&record.identity_group));
    let _ = writeln!(out, "Authorisation Policy: {}", opt(&record.authorisation_policy));
    let _ = writeln!(out, "Authentication Policy: {}", opt(&record.authentication_policy));
    let _ = writeln!(out, "NAC Compliance: {}", opt(&record.nac_compliance));

    if record.failures.is_empty() {
        let _ = writeln!(out, "No failures found");
    } else {
        for failure in &record.failures {
            let _ = writeln!(out, "Failure code: {}", failure.code);
            let _ = writeln!(out, "Cause: {}", failure.cause);
            let _ = writeln!(out, "Resolution: {}", failure.resolution);
        }
    }
    let _ = writeln!(out);
}

fn render_health(out: &mut String, health: &HealthRecord) {
    let _ = writeln!(out, "Identifier on DNA: {}", opt(&health.id));
    let _ = writeln!(out, "Connection Status: {}", opt(&health.connection_status));
    let _ = writeln!(out, "Host Type: {}", opt(&health.host_type));
    let _ = writeln!(out, "User ID: {}", opt(&health.user_id));
    let _ = writeln!(out, "Identifier: {}", opt(&health.identifier));
    let _ = writeln!(out, "Device Hostname: {}", opt(&health.host_name));
    let _ = writeln!(out, "Host OS: {}, Version: {}", opt(&health.host_os), opt(&health.host_version));
    let _ = writeln!(
        out,
        "Host SubType: {}, Firmware Version: {}",
        opt(&health.sub_type),
        opt(&health.firmware_version)
    );
    let _ = writeln!(out, "Device Vendor: {}", opt(&health.device_vendor));
    let _ = writeln!(out, "Last Updated: {}", opt(&health.last_updated));

    if let Some(scores) = health.health_score.as_ref().and_then(|v| v.as_array()) {
        let _ = writeln!(out, "Health Info:");
        for score in scores {
            if let Some(fields) = score.as_object() {
                for (key, value) in fields {
                    let _ = writeln!(out, "  {key}: {value}");
                }
            }
        }
    }

    let _ = writeln!(out, "Host MAC Address: {}", opt(&health.host_mac));
    let _ = writeln!(out, "Host IPv4 Address: {}", opt(&health.host_ipv4));
    let _ = writeln!(out, "Authentication Type: {}", opt(&health.auth_type));
    let _ = writeln!(out, "SSID: {}", opt(&health.ssid));
    let _ = writeln!(out, "Region: {}", opt(&health.location));
    let _ = writeln!(out, "Client Connected Device: {}", opt(&health.client_connection));
    let _ = writeln!(out, "Detected Issues: {}", opt_i64(&health.issue_count));
    let _ = writeln!(out, "Authentication Done Time: {}", opt_i64(&health.auth_done_time));
    let _ = writeln!(out, "Onboarding Time: {}", opt(&health.onboarding_time));
    let _ = writeln!(out);
}

fn render_issues(out: &mut String, issues: &IssueRecord) {
    let _ = writeln!(out, "Version: {}", opt(&issues.version));
    let _ = writeln!(out, "Total Count: {}", opt_i64(&issues.total_count));
    let _ = writeln!(out, "Details:");

    for entry in &issues.response {
        let _ = writeln!(out, "  Issue: {}", opt(&entry.name));
        let _ = writeln!(out, "  Status: {}, Priority: {}", opt(&entry.status), opt(&entry.priority));
        let _ = writeln!(out, "  Summary: {}", opt(&entry.summary));
        let _ = writeln!(out, "  Occurrences: {}", opt_i64(&entry.occurrence_count));
        let _ = writeln!(out, "  Last Occurred: {}", opt(&entry.last_occurred));
        let _ = writeln!(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FailureDetail, OrderedMap, WirelessEntry};

    fn bare_session() -> SessionRecord {
        SessionRecord {
            timestamp: Some("2024-03-01  09:15:42.123".to_string()),
            authentication_method: Some("dot1x".to_string()),
            posture_status: None,
            failures: vec![],
            identity_group: None,
            authorisation_policy: None,
            authentication_policy: None,
            nac_compliance: None,
        }
    }

    #[test]
    fn test_render_empty_mac_block() {
        let mut ise_information = OrderedMap::new();
        ise_information.insert("00:11:22:33:44:55".to_string(), OrderedMap::new());
        let report = DiagnosticReport {
            ise_information,
            dnac_information: None,
        };

        let text = render_text(&report);
        assert!(text.contains("00:11:22:33:44:55"));
        assert!(text.contains("No data found"));
        assert!(!text.contains("INFO GATHERED ON DNAC"));
    }

    #[test]
    fn test_render_failure_triple() {
        let mut sessions = OrderedMap::new();
        let mut record = bare_session();
        record.failures.push(FailureDetail {
            code: "EAP_TIMEOUT".to_string(),
            cause: "supplicant unresponsive".to_string(),
            resolution: "check NIC driver".to_string(),
        });
        sessions.insert(".123".to_string(), record);

        let mut ise_information = OrderedMap::new();
        ise_information.insert("00:11:22:33:44:55".to_string(), sessions);
        let report = DiagnosticReport {
            ise_information,
            dnac_information: None,
        };

        let text = render_text(&report);
        assert!(text.contains("Failure code: EAP_TIMEOUT"));
        assert!(text.contains("Cause: supplicant unresponsive"));
        assert!(text.contains("Resolution: check NIC driver"));
        assert!(text.contains("Time: 2024-03-01  09:15:42.123"));
    }

    #[test]
    fn test_render_null_sentinels_for_missing_fields() {
        let mut sessions = OrderedMap::new();
        sessions.insert(".123".to_string(), bare_session());

        let mut ise_information = OrderedMap::new();
        ise_information.insert("00:11:22:33:44:55".to_string(), sessions);
        let report = DiagnosticReport {
            ise_information,
            dnac_information: None,
        };

        let text = render_text(&report);
        assert!(text.contains("Posture Status: null"));
        assert!(text.contains("No failures found"));
    }

    #[test]
    fn test_render_degraded_wireless_entry() {
        let mut wireless = OrderedMap::new();
        wireless.insert("AA:BB:CC:DD:EE:FF".to_string(), WirelessEntry::default());

        let report = DiagnosticReport {
            ise_information: OrderedMap::new(),
            dnac_information: Some(wireless),
        };

        let text = render_text(&report);
        assert!(text.contains("INFO GATHERED ON DNAC:"));
        assert!(text.contains("Issues found on DNAC:"));
        // Both the health and issue block degrade independently.
        assert_eq!(text.matches("No data found").count(), 2);
    }
}
