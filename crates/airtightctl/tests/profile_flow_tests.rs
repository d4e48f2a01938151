//! Profile file -> analysis, the path `analyze --profile` takes

use airtight_common::{Analysis, DecisionPolicy, RemediationId, TelemetrySample, Vendor};
use airtightctl::commands::{load_profile, RunRecord};
use airtightctl::profiler::parse_lspci;
use chrono::Utc;
use std::fs;
use tempfile::TempDir;

fn quiet_window_with_xruns() -> Vec<TelemetrySample> {
    [(18.0, 0), (22.0, 1), (19.5, 0), (25.0, 2), (21.0, 0)]
        .into_iter()
        .map(|(cpu, xruns)| TelemetrySample::new(Utc::now(), cpu, 35.0, xruns, 85.0))
        .collect()
}

#[test]
fn test_profile_file_drives_the_plan() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("laptop.json");
    fs::write(
        &path,
        r#"{
            "vendor_name": "Realtek",
            "init_system": "Systemd",
            "audio_server": "PipeWire",
            "missing_dependencies": []
        }"#,
    )
    .unwrap();

    let profile = load_profile(&path).unwrap();
    let analysis =
        Analysis::from_window(profile, quiet_window_with_xruns(), &DecisionPolicy::default());

    assert_eq!(
        analysis.plan.as_slice(),
        &[
            RemediationId::FixBluetoothCoexistence,
            RemediationId::DisableAudioPowerSave
        ]
    );
}

#[test]
fn test_unrecognised_vendor_in_file_is_unknown() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("desktop.json");
    fs::write(&path, r#"{"vendor_name": "Generic/Not Found"}"#).unwrap();

    let profile = load_profile(&path).unwrap();
    assert_eq!(profile.vendor_name, Vendor::Unknown);

    let analysis =
        Analysis::from_window(profile, quiet_window_with_xruns(), &DecisionPolicy::default());
    assert!(!analysis.plan.contains(RemediationId::FixBluetoothCoexistence));
}

#[test]
fn test_run_record_json_shape() {
    let (vendor, _) = parse_lspci(
        "3a:00.0 Network controller [0280]: Intel Corporation Wi-Fi 6 AX201 [8086:a0f0] (rev 20)\n",
    );
    assert_eq!(vendor, Vendor::Intel);

    let record = RunRecord {
        analysis: Analysis::from_window(
            airtight_common::SystemProfile {
                vendor_name: vendor,
                ..Default::default()
            },
            vec![],
            &DecisionPolicy::default(),
        ),
        report: None,
    };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["analysis"]["plan"], serde_json::json!([]));
    assert_eq!(value["analysis"]["profile"]["vendor_name"], "Intel");
    assert!(value["report"].is_null());
}
