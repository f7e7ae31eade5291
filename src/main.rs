use clap::Parser;
use pit_lane_assist::app::inputs::live::{spawn_stdin_reader, SharedPanel};
use pit_lane_assist::core::ConfigProvider;
use pit_lane_assist::domain::model::TargetBand;
use pit_lane_assist::utils::{logger, validation::Validate};
use pit_lane_assist::{
    CliConfig, ConstantInput, ControlPanel, LiveInput, LocalStorage, RunReport, SimError,
    SimulationEngine, SimulationSettings,
};
use std::sync::Arc;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting pit-lane-assist CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }
    let settings = config.settings()?;

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    print_header(&settings);

    let storage = LocalStorage::new(config.output_path.clone());
    let mut engine =
        SimulationEngine::new_with_monitoring(settings.clone(), storage, config.monitor);

    let result = if settings.live {
        let panel: SharedPanel = Arc::new(Mutex::new(ControlPanel::new(
            settings.profile,
            settings.setpoint_kmh,
            settings.disturbance_rpm,
        )));
        let reader = spawn_stdin_reader(Arc::clone(&panel));

        let ctrl_c_panel = Arc::clone(&panel);
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("⏹ Ctrl-C received, stopping");
                ctrl_c_panel.lock().await.request_quit();
            }
        });

        let mut input = LiveInput::new(panel);
        let result = engine.run(&mut input).await;
        reader.abort();
        ctrl_c.abort();
        result
    } else {
        let mut input = ConstantInput::new(settings.setpoint_kmh, settings.disturbance_rpm);
        engine.run(&mut input).await
    };

    match result {
        Ok(report) => print_report(&report),
        Err(e) => fail(e),
    }

    if settings.live {
        // a blocked stdin read would otherwise hold the runtime open until Enter
        std::process::exit(0);
    }

    Ok(())
}

fn print_header(settings: &SimulationSettings) {
    let (band_min, band_max) = TargetBand::default().bounds(settings.setpoint_kmh);
    println!("🏁 Pit Lane Assistance ({} profile)", settings.profile);
    println!(
        "  Setpoint: {:.0} km/h | Band: [{:.0}-{:.0}] km/h | Gains: Kp={} Ki={} Kd={}",
        settings.setpoint_kmh,
        band_min,
        band_max,
        settings.gains.kp,
        settings.gains.ki,
        settings.gains.kd
    );
    match settings.duration_secs {
        Some(secs) => println!("  Duration: {}s at dt={}s", secs, settings.dt),
        None => println!("  Duration: until 'quit' or Ctrl-C, dt={}s", settings.dt),
    }
    if settings.live {
        println!("  Commands: 'speed <kmh>' | 'dist <rpm>' | 'quit'");
    }
    println!();
}

fn print_report(report: &RunReport) {
    let summary = &report.summary;
    tracing::info!("✅ Simulation completed successfully!");
    println!("✅ Simulation completed successfully!");
    println!(
        "  Ticks: {} ({:.1}s simulated) | Final speed: {:.2} km/h (setpoint {:.0})",
        summary.ticks, summary.simulated_secs, summary.final_speed_kmh, summary.final_setpoint_kmh
    );
    println!(
        "  In band: {:.1}% | Max |error|: {:.2} km/h | IAE: {:.2}",
        summary.in_band_ratio * 100.0,
        summary.max_abs_error_kmh,
        summary.iae_kmh_s
    );
    println!(
        "  VSS: θi {:.3}V | θ₀ {:.3}V | eV {:.3}V | θ₀c {:.3}V",
        report.final_state.setpoint_volts,
        report.final_state.speed_volts,
        report.final_state.error_volts,
        report.final_state.control_volts
    );
    match summary.settling_time_s {
        Some(t) => println!("  Settled into the band at t={:.1}s", t),
        None => println!("  ⚠️ Run ended outside the band"),
    }
    for path in &report.outputs {
        println!("📁 Output saved to: {}", path);
    }
}

fn fail(e: SimError) -> ! {
    tracing::error!(
        "❌ Simulation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    std::process::exit(e.exit_code().max(1));
}
