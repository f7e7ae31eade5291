use anyhow::Result;
use approx::assert_relative_eq;
use pit_lane_assist::app::inputs::live::read_commands;
use pit_lane_assist::core::ConfigProvider;
use pit_lane_assist::utils::validation::Validate;
use pit_lane_assist::{
    ControlPanel, ControlProfile, LiveInput, LocalStorage, ScheduledInput, SimulationEngine,
    TomlConfig,
};
use std::fs;
use std::io::Write;
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};
use tokio::sync::Mutex;

fn scenario(output_dir: &str) -> String {
    format!(
        r#"
[simulation]
name = "disturbance rejection"
profile = "classic"
duration_secs = 60.0

[[schedule]]
at_s = 10.0
disturbance_rpm = 300

[output]
path = "{}"
formats = ["csv", "json"]
"#,
        output_dir
    )
}

#[tokio::test]
async fn test_scheduled_disturbance_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut file = NamedTempFile::new()?;
    file.write_all(scenario(&temp_dir.path().to_string_lossy()).as_bytes())?;

    let config = TomlConfig::from_file(file.path())?;
    config.validate()?;
    let settings = config.settings()?;
    assert_eq!(settings.profile, ControlProfile::Classic);

    let storage = LocalStorage::new(config.output_path().to_string());
    let mut input = ScheduledInput::new(
        settings.profile,
        settings.setpoint_kmh,
        settings.disturbance_rpm,
        settings.schedule.clone(),
    );
    let mut engine = SimulationEngine::new(settings, storage);
    let report = engine.run(&mut input).await?;

    assert_eq!(input.pending(), 0);
    assert_eq!(report.summary.ticks, 600);
    assert!(engine.system().in_band());
    assert_relative_eq!(report.summary.final_speed_kmh, 80.0, epsilon = 0.05);

    // the step knocks the car out of the band, the loop pulls it back in
    let settled = report.summary.settling_time_s.expect("run should end in band");
    assert!(settled > 10.0 && settled < 20.0, "settled at {}", settled);
    assert!(report.summary.in_band_ratio < 1.0);

    // the plant compensates by holding commanded RPM below nominal
    let plant = engine.system().plant();
    assert!(plant.rpm_ctrl() < plant.rpm_real());

    let csv = fs::read_to_string(temp_dir.path().join("trace.csv"))?;
    assert_eq!(csv.lines().count(), 601);
    assert!(!temp_dir.path().join("dashboard.svg").exists());
    Ok(())
}

#[tokio::test]
async fn test_live_panel_commands_drive_the_loop() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path().to_string_lossy().into_owned());

    let panel = Arc::new(Mutex::new(ControlPanel::new(ControlProfile::Adaptive, 80.0, 0.0)));
    let script: &[u8] = b"speed 70\ndist 100\n";
    read_commands(script, Arc::clone(&panel)).await?;

    let settings = pit_lane_assist::SimulationSettings {
        duration_secs: Some(20.0),
        output_formats: Vec::new(),
        ..pit_lane_assist::SimulationSettings::for_profile(ControlProfile::Adaptive)
    };
    let mut engine = SimulationEngine::new(settings, storage);
    let report = engine.run(&mut LiveInput::new(Arc::clone(&panel))).await?;

    assert_eq!(report.summary.final_setpoint_kmh, 70.0);
    assert!(engine.system().in_band());

    panel.lock().await.request_quit();
    let report = engine.run(&mut LiveInput::new(panel)).await?;
    assert_eq!(report.summary.ticks, 0);
    Ok(())
}
