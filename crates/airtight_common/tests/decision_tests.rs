//! Decision engine properties over a grid of windows and profiles

use airtight_common::{
    evaluate, Analysis, DecisionPolicy, HealthStatus, Plan, RemediationId, SystemProfile,
    TelemetrySample, TelemetrySummary, Vendor, PRIORITY_ORDER,
};
use chrono::Utc;

fn summary(underruns: u64, peak_cpu: f32) -> TelemetrySummary {
    TelemetrySummary {
        total_underruns: underruns,
        peak_cpu,
        status: if peak_cpu > 80.0 {
            HealthStatus::HighCpu
        } else {
            HealthStatus::Stable
        },
    }
}

fn profile(vendor: Vendor, audio_server: &str) -> SystemProfile {
    SystemProfile {
        vendor_name: vendor,
        audio_server: audio_server.to_string(),
        ..Default::default()
    }
}

fn grid() -> Vec<(SystemProfile, TelemetrySummary)> {
    let vendors = [
        Vendor::Realtek,
        Vendor::Intel,
        Vendor::MediaTek,
        Vendor::Qualcomm,
        Vendor::Broadcom,
        Vendor::Unknown,
    ];
    let servers = ["PipeWire", "PulseAudio", "ALSA", "Unknown"];
    let cpus = [0.0, 12.5, 59.9, 60.0, 75.0, 80.0, 80.1, 100.0];
    let underruns = [0, 1, 7, 1000];

    let mut cases = Vec::new();
    for vendor in vendors {
        for server in servers {
            for cpu in cpus {
                for xruns in underruns {
                    cases.push((profile(vendor, server), summary(xruns, cpu)));
                }
            }
        }
    }
    cases
}

#[test]
fn test_plan_is_ordered_subsequence_of_priority_order() {
    for (profile, summary) in grid() {
        let plan = evaluate(&profile, &summary);
        let mut expected = PRIORITY_ORDER.iter();
        for id in plan.iter() {
            assert!(
                expected.any(|p| *p == id),
                "{:?} out of order for {:?} / {:?}",
                id,
                profile,
                summary
            );
        }
        assert!(plan.len() <= 3);
    }
}

#[test]
fn test_evaluation_is_deterministic() {
    for (profile, summary) in grid() {
        assert_eq!(evaluate(&profile, &summary), evaluate(&profile, &summary));
    }
}

#[test]
fn test_no_underruns_never_touches_audio_path() {
    for (profile, summary) in grid() {
        if summary.total_underruns > 0 {
            continue;
        }
        let plan = evaluate(&profile, &summary);
        assert!(!plan.contains(RemediationId::FixBluetoothCoexistence));
        assert!(!plan.contains(RemediationId::DisableAudioPowerSave));
    }
}

#[test]
fn test_boost_tracks_cpu_threshold() {
    for (profile, summary) in grid() {
        let plan = evaluate(&profile, &summary);
        assert_eq!(
            plan.contains(RemediationId::BoostScheduler),
            summary.peak_cpu > 80.0
        );
    }
}

#[test]
fn test_overloaded_bluetooth_laptop() {
    // Under-runs and a busy CPU: scheduler first, coexistence ruled out by load
    let plan = evaluate(&profile(Vendor::Intel, "PipeWire"), &summary(12, 92.0));
    assert_eq!(
        plan.as_slice(),
        &[
            RemediationId::BoostScheduler,
            RemediationId::DisableAudioPowerSave
        ]
    );
    assert_eq!(plan.first(), Some(RemediationId::BoostScheduler));
}

#[test]
fn test_custom_policy_widens_audio_servers() {
    let policy = DecisionPolicy {
        power_save_audio_servers: vec!["pipewire".to_string(), "pulse".to_string()],
        ..Default::default()
    };
    let pulse = profile(Vendor::MediaTek, "PulseAudio");
    let quiet = summary(3, 20.0);

    assert!(evaluate(&pulse, &quiet).is_empty());
    assert_eq!(
        policy.evaluate(&pulse, &quiet).as_slice(),
        &[RemediationId::DisableAudioPowerSave]
    );
}

#[test]
fn test_plan_json_is_normalized() {
    let plan: Plan =
        serde_json::from_str(r#"["disable_audio_power_save","boost_scheduler","boost_scheduler"]"#)
            .unwrap();
    assert_eq!(
        plan.as_slice(),
        &[
            RemediationId::BoostScheduler,
            RemediationId::DisableAudioPowerSave
        ]
    );
}

#[test]
fn test_analysis_from_sampled_window() {
    let samples: Vec<TelemetrySample> = [(40.0, 0), (55.0, 4), (35.0, 0)]
        .into_iter()
        .map(|(cpu, xruns)| TelemetrySample::new(Utc::now(), cpu, 40.0, xruns, 85.0))
        .collect();
    let analysis = Analysis::from_window(
        profile(Vendor::Broadcom, "PipeWire"),
        samples,
        &DecisionPolicy::default(),
    );

    assert_eq!(analysis.summary.total_underruns, 4);
    assert_eq!(analysis.summary.status, HealthStatus::Stable);
    assert_eq!(
        analysis.plan.as_slice(),
        &[
            RemediationId::FixBluetoothCoexistence,
            RemediationId::DisableAudioPowerSave
        ]
    );
    assert!(analysis
        .verdicts
        .iter()
        .filter(|v| v.fired)
        .all(|v| analysis.plan.contains(v.remediation)));

    let json = serde_json::to_string(&analysis).unwrap();
    assert!(json.contains("\"plan\":[\"fix_bluetooth_coexistence\",\"disable_audio_power_save\"]"));
}
