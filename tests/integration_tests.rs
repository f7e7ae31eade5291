use anyhow::Result;
use approx::assert_relative_eq;
use pit_lane_assist::domain::model::OutputFormat;
use pit_lane_assist::{
    ConstantInput, ControlProfile, LocalStorage, RunSummary, SimulationEngine, SimulationSettings,
};
use std::fs;
use tempfile::TempDir;

fn settings(profile: ControlProfile, duration_secs: f64) -> SimulationSettings {
    SimulationSettings {
        duration_secs: Some(duration_secs),
        ..SimulationSettings::for_profile(profile)
    }
}

#[tokio::test]
async fn test_end_to_end_run_writes_all_outputs() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().join("run");
    let storage = LocalStorage::new(output_path.to_string_lossy().into_owned());

    let mut engine = SimulationEngine::new(settings(ControlProfile::Vss, 30.0), storage);
    let report = engine.run(&mut ConstantInput::new(80.0, 0.0)).await?;

    assert_eq!(report.summary.ticks, 300);
    assert_eq!(report.outputs.len(), 3);

    let csv = fs::read_to_string(output_path.join("trace.csv"))?;
    assert_eq!(csv.lines().count(), 301);
    assert!(csv.starts_with("time_s,setpoint_kmh,speed_kmh"));

    let summary: RunSummary =
        serde_json::from_str(&fs::read_to_string(output_path.join("summary.json"))?)?;
    assert_eq!(summary.ticks, report.summary.ticks);
    assert_eq!(summary.profile, ControlProfile::Vss);
    assert_relative_eq!(summary.final_speed_kmh, 80.0, epsilon = 0.05);
    assert!(summary.in_band_ratio > 0.9);
    assert!(summary.settling_time_s.is_some());

    let svg = fs::read_to_string(output_path.join("dashboard.svg"))?;
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Pit Lane Assistance"));

    Ok(())
}

#[tokio::test]
async fn test_every_profile_reaches_the_band() -> Result<()> {
    for profile in [
        ControlProfile::Vss,
        ControlProfile::Adaptive,
        ControlProfile::Classic,
    ] {
        let temp_dir = TempDir::new()?;
        let storage = LocalStorage::new(temp_dir.path().to_string_lossy().into_owned());
        let run_settings = SimulationSettings {
            output_formats: vec![OutputFormat::Json],
            ..settings(profile, 30.0)
        };

        let mut engine = SimulationEngine::new(run_settings, storage);
        let report = engine.run(&mut ConstantInput::new(80.0, 0.0)).await?;

        assert!(engine.system().in_band(), "{} ended out of band", profile);
        assert_relative_eq!(report.summary.final_speed_kmh, 80.0, epsilon = 0.1);
        assert_eq!(report.summary.profile, profile);
    }
    Ok(())
}

#[tokio::test]
async fn test_selected_formats_only() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path().to_string_lossy().into_owned());
    let run_settings = SimulationSettings {
        output_formats: vec![OutputFormat::Svg],
        ..settings(ControlProfile::Adaptive, 2.0)
    };

    let mut engine = SimulationEngine::new(run_settings, storage);
    let report = engine.run(&mut ConstantInput::new(75.0, 100.0)).await?;

    assert_eq!(report.outputs.len(), 1);
    assert!(report.outputs[0].ends_with("dashboard.svg"));
    assert!(!temp_dir.path().join("trace.csv").exists());
    assert!(!temp_dir.path().join("summary.json").exists());
    Ok(())
}
