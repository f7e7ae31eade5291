use crate::app::inputs::slider::Slider;
use crate::core::profile::ControlProfile;
use crate::domain::model::TickInput;
use crate::domain::ports::InputSource;
use crate::utils::error::{Result, SimError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelCommand {
    Setpoint(f64),
    Disturbance(f64),
    Quit,
}

pub fn parse_command(line: &str) -> Result<PanelCommand> {
    let mut parts = line.split_whitespace();
    let verb = parts
        .next()
        .ok_or_else(|| SimError::InputError {
            message: "empty command".to_string(),
        })?
        .to_ascii_lowercase();

    let value = |name: &str, raw: Option<&str>| -> Result<f64> {
        let raw = raw.ok_or_else(|| SimError::InputError {
            message: format!("'{}' needs a numeric value", name),
        })?;
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| SimError::InputError {
                message: format!("'{}' is not a number", raw),
            })
    };

    let command = match verb.as_str() {
        "speed" | "s" | "setpoint" => PanelCommand::Setpoint(value(&verb, parts.next())?),
        "dist" | "p" | "disturbance" => PanelCommand::Disturbance(value(&verb, parts.next())?),
        "quit" | "q" | "exit" => PanelCommand::Quit,
        other => {
            return Err(SimError::InputError {
                message: format!("unknown command '{}'", other),
            })
        }
    };

    if parts.next().is_some() {
        return Err(SimError::InputError {
            message: format!("too many arguments in '{}'", line.trim()),
        });
    }
    Ok(command)
}

/// The two sliders plus a stop flag, shared between the reader task and
/// the engine.
#[derive(Debug, Clone)]
pub struct ControlPanel {
    setpoint: Slider,
    disturbance: Slider,
    quit: bool,
}

impl ControlPanel {
    pub fn new(profile: ControlProfile, setpoint_kmh: f64, disturbance_rpm: f64) -> Self {
        let mut setpoint = profile.setpoint_slider();
        setpoint.set(setpoint_kmh);
        let mut disturbance = profile.disturbance_slider();
        disturbance.set(disturbance_rpm);
        Self {
            setpoint,
            disturbance,
            quit: false,
        }
    }

    pub fn apply(&mut self, command: PanelCommand) {
        match command {
            PanelCommand::Setpoint(v) => {
                let applied = self.setpoint.set(v);
                tracing::info!("🎚 setpoint -> {:.0} km/h", applied);
            }
            PanelCommand::Disturbance(v) => {
                let applied = self.disturbance.set(v);
                tracing::info!("🎚 disturbance -> {:.0} RPM", applied);
            }
            PanelCommand::Quit => self.quit = true,
        }
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint.value()
    }

    pub fn disturbance(&self) -> f64 {
        self.disturbance.value()
    }
}

pub type SharedPanel = Arc<Mutex<ControlPanel>>;

/// Feeds the engine from a shared control panel.
pub struct LiveInput {
    panel: SharedPanel,
}

impl LiveInput {
    pub fn new(panel: SharedPanel) -> Self {
        Self { panel }
    }

    pub fn panel(&self) -> SharedPanel {
        Arc::clone(&self.panel)
    }
}

#[async_trait]
impl InputSource for LiveInput {
    async fn next_input(&mut self, _tick: u64, _time_s: f64) -> Result<Option<TickInput>> {
        let panel = self.panel.lock().await;
        if panel.quit_requested() {
            return Ok(None);
        }
        Ok(Some(TickInput {
            setpoint_kmh: Some(panel.setpoint()),
            disturbance_rpm: panel.disturbance(),
        }))
    }
}

/// Reads commands line by line until quit or end of input.
pub async fn read_commands<R>(reader: R, panel: SharedPanel) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(command) => {
                let mut panel = panel.lock().await;
                panel.apply(command);
                if panel.quit_requested() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!("⚠️ {} ({})", e, e.recovery_suggestion());
            }
        }
    }
    Ok(())
}

pub fn spawn_stdin_reader(panel: SharedPanel) -> JoinHandle<Result<()>> {
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        read_commands(stdin, panel).await
    })
}
