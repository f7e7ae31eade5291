use crate::config::settings::SimulationSettings;
use crate::core::system::{format_tick_line, Snapshot, SpeedControlSystem};
use crate::domain::model::{OutputFormat, Sample};
use crate::domain::ports::{InputSource, Storage};
use crate::report::{render_dashboard, summary_to_json, trace_to_csv, RunSummary, SummaryBuilder};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::collections::VecDeque;
use tokio::time::{interval, MissedTickBehavior};

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    pub final_state: Snapshot,
    /// Full paths of the written output files.
    pub outputs: Vec<String>,
}

pub struct SimulationEngine<S: Storage> {
    settings: SimulationSettings,
    storage: S,
    system: SpeedControlSystem,
    monitor: SystemMonitor,
}

impl<S: Storage> SimulationEngine<S> {
    pub fn new(settings: SimulationSettings, storage: S) -> Self {
        Self::new_with_monitoring(settings, storage, false)
    }

    pub fn new_with_monitoring(settings: SimulationSettings, storage: S, monitor: bool) -> Self {
        let system = SpeedControlSystem::new(&settings);
        Self {
            settings,
            storage,
            system,
            monitor: SystemMonitor::new(monitor),
        }
    }

    pub fn system(&self) -> &SpeedControlSystem {
        &self.system
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub async fn run<I: InputSource>(&mut self, input: &mut I) -> Result<RunReport> {
        tracing::info!(
            "🚀 Starting simulation: profile={}, controller={}, dt={}s",
            self.settings.profile,
            self.system.controller_name(),
            self.settings.dt
        );
        self.monitor.log_stats("start", 0);

        let max_ticks = self.settings.max_ticks();
        let trace_limit = self.settings.trace_limit;
        let log_every = self.settings.log_every.max(1);

        let mut pacer = if self.settings.realtime {
            let mut pacer = interval(self.settings.pacing_period()?);
            pacer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(pacer)
        } else {
            None
        };

        let mut summary = SummaryBuilder::new(
            self.settings.profile,
            self.system.controller_name(),
            self.settings.dt,
        );
        let mut trace: VecDeque<Sample> = VecDeque::new();
        let mut tick: u64 = 0;

        loop {
            if max_ticks.is_some_and(|max| tick >= max) {
                break;
            }
            if let Some(pacer) = pacer.as_mut() {
                pacer.tick().await;
            }

            let Some(tick_input) = input.next_input(tick, self.system.elapsed()).await? else {
                tracing::info!("⏹ Input source stopped after {} ticks", tick);
                break;
            };

            let sample = self.system.update(tick_input);
            summary.observe(&sample);

            trace.push_back(sample);
            if let Some(limit) = trace_limit {
                while trace.len() > limit {
                    trace.pop_front();
                }
            }

            tick += 1;
            if tick % log_every == 0 {
                tracing::info!("{}", format_tick_line(&sample, self.system.band()));
            }
            if self.monitor.is_enabled() && tick % log_every.saturating_mul(100) == 0 {
                self.monitor.log_stats("running", tick);
            }
        }

        let summary = summary.finish();
        tracing::info!(
            "✅ Simulation finished: {} ticks, final speed {:.2} km/h, in band {:.1}% of the run",
            summary.ticks,
            summary.final_speed_kmh,
            summary.in_band_ratio * 100.0
        );

        let outputs = self.write_outputs(&summary, &trace).await?;
        self.monitor.log_final_stats(summary.ticks);

        Ok(RunReport {
            summary,
            final_state: self.system.snapshot(),
            outputs,
        })
    }

    async fn write_outputs(
        &self,
        summary: &RunSummary,
        trace: &VecDeque<Sample>,
    ) -> Result<Vec<String>> {
        let mut outputs = Vec::with_capacity(self.settings.output_formats.len());

        for format in &self.settings.output_formats {
            let content = match format {
                OutputFormat::Csv => trace_to_csv(trace)?,
                OutputFormat::Json => summary_to_json(summary)?,
                OutputFormat::Svg => render_dashboard(&self.system)?,
            };
            let path = self
                .storage
                .write_file(format.file_name(), content.as_bytes())
                .await?;
            tracing::debug!("💾 Wrote {} ({} bytes)", path, content.len());
            outputs.push(path);
        }

        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::inputs::{ConstantInput, ScheduledInput};
    use crate::core::profile::ControlProfile;
    use crate::domain::model::{ScheduledChange, TickInput};
    use crate::utils::error::SimError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<String> {
            let files = self.files.lock().await;
            files
                .get(path)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(path.to_string())
        }
    }

    /// Stops after a fixed number of ticks.
    struct CountdownInput {
        remaining: u64,
    }

    #[async_trait]
    impl InputSource for CountdownInput {
        async fn next_input(&mut self, _tick: u64, _time_s: f64) -> Result<Option<TickInput>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(TickInput::default()))
        }
    }

    fn settings(duration_secs: f64) -> SimulationSettings {
        SimulationSettings {
            duration_secs: Some(duration_secs),
            ..SimulationSettings::default()
        }
    }

    #[tokio::test]
    async fn test_run_stops_at_duration_and_writes_outputs() {
        let storage = MockStorage::new();
        let mut engine = SimulationEngine::new(settings(3.0), storage.clone());
        let mut input = ConstantInput::new(80.0, 0.0);

        let report = engine.run(&mut input).await.unwrap();

        assert_eq!(report.summary.ticks, 30);
        assert_eq!(
            report.outputs,
            vec!["trace.csv", "summary.json", "dashboard.svg"]
        );

        let csv = storage.get_file("trace.csv").await.unwrap();
        assert_eq!(csv.lines().count(), 31);

        let json = storage.get_file("summary.json").await.unwrap();
        let summary: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(summary.ticks, 30);
        assert_eq!(summary.profile, ControlProfile::Vss);

        let svg = storage.get_file("dashboard.svg").await.unwrap();
        assert!(svg.contains("<svg"));
    }

    #[tokio::test]
    async fn test_run_ends_when_input_stops() {
        let storage = MockStorage::new();
        let live_like = SimulationSettings {
            duration_secs: None,
            live: true,
            output_formats: vec![OutputFormat::Json],
            ..SimulationSettings::default()
        };
        let mut engine = SimulationEngine::new(live_like, storage.clone());
        let mut input = CountdownInput { remaining: 12 };

        let report = engine.run(&mut input).await.unwrap();
        assert_eq!(report.summary.ticks, 12);
        assert_eq!(report.outputs, vec!["summary.json"]);
        assert!(storage.get_file("trace.csv").await.is_none());
    }

    #[tokio::test]
    async fn test_trace_limit_keeps_newest_rows_but_summary_covers_run() {
        let storage = MockStorage::new();
        let limited = SimulationSettings {
            trace_limit: Some(10),
            output_formats: vec![OutputFormat::Csv],
            ..settings(5.0)
        };
        let mut engine = SimulationEngine::new(limited, storage.clone());
        let report = engine.run(&mut ConstantInput::new(80.0, 0.0)).await.unwrap();

        assert_eq!(report.summary.ticks, 50);
        let csv = storage.get_file("trace.csv").await.unwrap();
        assert_eq!(csv.lines().count(), 11);
        // the last row is the last tick: t = 0.4 + 50 * 0.1
        let last = csv.lines().last().unwrap();
        let time: f64 = last.split(',').next().unwrap().parse().unwrap();
        assert!((time - 5.4).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_scheduled_setpoint_step() {
        let storage = MockStorage::new();
        let mut engine = SimulationEngine::new(settings(40.0), storage);
        let mut input = ScheduledInput::new(
            ControlProfile::Vss,
            80.0,
            0.0,
            vec![ScheduledChange {
                at_s: 20.0,
                setpoint_kmh: Some(70.0),
                disturbance_rpm: None,
            }],
        );

        let report = engine.run(&mut input).await.unwrap();
        assert_eq!(report.summary.final_setpoint_kmh, 70.0);
        assert!(engine.system().in_band());
    }

    #[tokio::test]
    async fn test_realtime_pacing_runs_on_interval() {
        let storage = MockStorage::new();
        let paced = SimulationSettings {
            realtime: true,
            time_scale: 10.0,
            output_formats: Vec::new(),
            ..settings(1.0)
        };
        let mut engine = SimulationEngine::new(paced, storage);
        let started = std::time::Instant::now();

        let report = engine.run(&mut ConstantInput::new(80.0, 0.0)).await.unwrap();

        assert_eq!(report.summary.ticks, 10);
        assert!(report.outputs.is_empty());
        // first interval tick fires immediately, the remaining nine wait 10 ms each
        assert!(started.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn test_unpaceable_time_scale_is_an_error() {
        let unpaceable = SimulationSettings {
            realtime: true,
            time_scale: 1e12,
            ..settings(1.0)
        };
        let mut engine = SimulationEngine::new(unpaceable, MockStorage::new());

        let err = engine
            .run(&mut ConstantInput::new(80.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidConfigValueError { .. }));
    }

    #[tokio::test]
    async fn test_monitoring_with_huge_log_interval() {
        let quiet = SimulationSettings {
            log_every: u64::MAX,
            output_formats: Vec::new(),
            ..settings(1.0)
        };
        let mut engine = SimulationEngine::new_with_monitoring(quiet, MockStorage::new(), true);

        let report = engine.run(&mut ConstantInput::new(80.0, 0.0)).await.unwrap();
        assert_eq!(report.summary.ticks, 10);
    }
}
