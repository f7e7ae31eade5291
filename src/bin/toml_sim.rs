use clap::Parser;
use pit_lane_assist::core::ConfigProvider;
use pit_lane_assist::utils::{logger, validation::Validate};
use pit_lane_assist::{LocalStorage, ScheduledInput, SimulationEngine, SimulationSettings, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-sim")]
#[command(about = "Pit lane speed control simulator driven by a TOML scenario")]
struct Args {
    /// Path to TOML scenario file
    #[arg(short, long, default_value = "scenario.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Emit JSON log lines instead of the compact format
    #[arg(long)]
    json_logs: bool,

    /// Dry run - show the scenario without simulating it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML scenario simulator");
    tracing::info!("📁 Loading scenario from: {}", args.config);

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load scenario file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    tracing::info!("✅ Scenario loaded and validated successfully");

    let settings = config.settings()?;
    display_config_summary(&config, &settings, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No simulation will run");
        perform_dry_run(&settings);
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let mut input = ScheduledInput::new(
        settings.profile,
        settings.setpoint_kmh,
        settings.disturbance_rpm,
        settings.schedule.clone(),
    );
    let mut engine = SimulationEngine::new_with_monitoring(settings, storage, monitor_enabled);

    match engine.run(&mut input).await {
        Ok(report) => {
            let summary = &report.summary;
            tracing::info!("✅ Scenario '{}' completed successfully!", config.name());
            println!("✅ Scenario '{}' completed successfully!", config.name());
            println!(
                "  Final speed: {:.2} km/h (setpoint {:.0}) | In band: {:.1}%",
                summary.final_speed_kmh,
                summary.final_setpoint_kmh,
                summary.in_band_ratio * 100.0
            );
            if input.pending() > 0 {
                println!(
                    "  ⚠️ {} scheduled change(s) fell after the end of the run",
                    input.pending()
                );
            }
            for path in &report.outputs {
                println!("📁 Output saved to: {}", path);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Simulation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, settings: &SimulationSettings, args: &Args) {
    println!("📋 Scenario Summary:");
    println!("  Scenario: {}", config.name());
    println!("  Profile: {}", settings.profile);
    println!("  Output: {}", config.output_path());
    let formats: Vec<String> = settings
        .output_formats
        .iter()
        .map(|f| f.to_string())
        .collect();
    println!("  Formats: {}", formats.join(", "));

    if let Some(limit) = settings.trace_limit {
        println!("  Trace Limit: {} rows", limit);
    }
    if let Some(level) = config.monitoring.as_ref().and_then(|m| m.log_level.as_deref()) {
        println!("  Monitoring Log Level: {}", level);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(settings: &SimulationSettings) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("⚙️ Loop:");
    println!(
        "  Ticks: {} x {}s",
        settings.max_ticks().unwrap_or_default(),
        settings.dt
    );
    println!(
        "  Gains: Kp={} Ki={} Kd={}",
        settings.gains.kp, settings.gains.ki, settings.gains.kd
    );
    println!(
        "  Start: setpoint {:.0} km/h, disturbance {:.0} RPM",
        settings.setpoint_kmh, settings.disturbance_rpm
    );
    if settings.realtime {
        println!("  Paced at {}x wall-clock speed", settings.time_scale);
    }

    if !settings.schedule.is_empty() {
        println!();
        println!("🎚 Schedule:");
        for change in &settings.schedule {
            let mut moves = Vec::new();
            if let Some(sp) = change.setpoint_kmh {
                moves.push(format!("setpoint -> {:.0} km/h", sp));
            }
            if let Some(dist) = change.disturbance_rpm {
                moves.push(format!("disturbance -> {:.0} RPM", dist));
            }
            println!("  t={:>6.1}s  {}", change.at_s, moves.join(", "));
        }
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for tick-level detail during an actual run.");
}
