use crate::core::system::SpeedControlSystem;
use crate::domain::model::Sample;
use crate::utils::error::{Result, SimError};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

pub const DASHBOARD_SIZE: (u32, u32) = (1400, 1000);
const WINDOW_SECS: f64 = 15.0;
const LOOKAHEAD_SECS: f64 = 1.0;

struct Series<'a> {
    label: &'a str,
    color: RGBColor,
    points: Vec<(f64, f64)>,
}

#[derive(Default)]
struct Panel<'a> {
    title: &'a str,
    y_desc: &'a str,
    y_range: Range<f64>,
    series: Vec<Series<'a>>,
    guides: Vec<(f64, RGBColor)>,
    band: Option<(f64, f64)>,
    status: Option<String>,
}

fn plot_error<E: std::fmt::Display>(e: E) -> SimError {
    SimError::PlotError {
        message: e.to_string(),
    }
}

/// Time axis: the last 15 s plus a second of headroom.
pub fn time_window(latest_s: f64) -> Range<f64> {
    (latest_s - WINDOW_SECS).max(0.0)..(latest_s + LOOKAHEAD_SECS)
}

/// Speed axis for the input/output panel, kept inside the sensor range.
pub fn speed_window(setpoint_kmh: f64, sensor_min: f64, sensor_max: f64) -> Range<f64> {
    (setpoint_kmh - 10.0).max(sensor_min)..(setpoint_kmh + 10.0).min(sensor_max)
}

/// Widens `base` so every value fits, with a little padding.
fn fit_range(base: Range<f64>, series: &[Series<'_>]) -> Range<f64> {
    let (mut lo, mut hi) = (base.start, base.end);
    for (_, y) in series.iter().flat_map(|s| s.points.iter()) {
        lo = lo.min(*y);
        hi = hi.max(*y);
    }
    if lo < base.start || hi > base.end {
        let pad = (hi - lo).abs().max(1e-3) * 0.05;
        lo -= pad;
        hi += pad;
    }
    lo..hi
}

fn windowed<F>(system: &SpeedControlSystem, x: &Range<f64>, field: F) -> Vec<(f64, f64)>
where
    F: Fn(&Sample) -> f64,
{
    system
        .history()
        .series(field)
        .into_iter()
        .filter(|(t, _)| *t >= x.start)
        .collect()
}

/// Renders the six-panel dashboard of the current history window as SVG.
pub fn render_dashboard(system: &SpeedControlSystem) -> Result<String> {
    let latest = system.history().latest().map(|s| s.time_s).unwrap_or(0.0);
    let x = time_window(latest);
    let vss = system.vss();
    let setpoint = system.setpoint();
    let band = system.band();
    let disturbance_slider = system.profile().disturbance_slider();

    let in_band_text = if system.in_band() { "IN BAND" } else { "OUT OF BAND" };
    let status = format!(
        "t = {:.1}s | θ₀ = {:.1} km/h | band [{:.0}-{:.0}] {}",
        latest,
        system.speed(),
        band.0,
        band.1,
        in_band_text
    );

    let io_series = vec![
        Series {
            label: "θi setpoint",
            color: RED,
            points: windowed(system, &x, |s| s.setpoint_kmh),
        },
        Series {
            label: "θ₀ speed",
            color: BLUE,
            points: windowed(system, &x, |s| s.speed_kmh),
        },
    ];
    let speed_range = speed_window(setpoint, vss.speed_min_kmh, vss.speed_max_kmh);

    let error_series = vec![Series {
        label: "eV",
        color: MAGENTA,
        points: windowed(system, &x, |s| s.error_volts),
    }];
    let control_series = vec![Series {
        label: "θ₀c",
        color: GREEN,
        points: windowed(system, &x, |s| s.control_volts),
    }];
    let disturbance_series = vec![
        Series {
            label: "p requested",
            color: RGBColor(255, 140, 0),
            points: windowed(system, &x, |s| s.disturbance_rpm),
        },
        Series {
            label: "p applied",
            color: RGBColor(139, 69, 19),
            points: windowed(system, &x, |s| s.attenuated_disturbance_rpm),
        },
    ];
    let feedback_series = vec![Series {
        label: "f",
        color: CYAN,
        points: windowed(system, &x, |s| s.feedback_kmh),
    }];
    let pid_series = vec![
        Series {
            label: "P",
            color: RED,
            points: windowed(system, &x, |s| s.proportional),
        },
        Series {
            label: "I",
            color: GREEN,
            points: windowed(system, &x, |s| s.integral),
        },
        Series {
            label: "D",
            color: BLUE,
            points: windowed(system, &x, |s| s.derivative),
        },
    ];

    let disturbance_margin = (disturbance_slider.max() - disturbance_slider.min()) * 0.1;
    let panels = vec![
        Panel {
            title: "Input / Output",
            y_desc: "km/h",
            y_range: fit_range(speed_range.clone(), &io_series),
            series: io_series,
            guides: Vec::new(),
            band: Some(band),
            status: Some(status),
        },
        Panel {
            title: "Disturbance p",
            y_desc: "RPM",
            y_range: fit_range(
                (disturbance_slider.min() - disturbance_margin)
                    ..(disturbance_slider.max() + disturbance_margin),
                &disturbance_series,
            ),
            series: disturbance_series,
            guides: vec![
                (disturbance_slider.min(), RED),
                (0.0, BLACK),
                (disturbance_slider.max(), RED),
            ],
            ..Default::default()
        },
        Panel {
            title: "Error eV",
            y_desc: "V",
            y_range: fit_range(-0.5..0.5, &error_series),
            series: error_series,
            guides: vec![(0.0, BLACK)],
            ..Default::default()
        },
        Panel {
            title: "Feedback f",
            y_desc: "km/h",
            y_range: fit_range(speed_range, &feedback_series),
            series: feedback_series,
            band: Some(band),
            ..Default::default()
        },
        Panel {
            title: "Control θ₀c",
            y_desc: "V",
            y_range: fit_range(vss.volts_min..vss.volts_max, &control_series),
            series: control_series,
            guides: vec![(vss.neutral_volts, BLACK)],
            ..Default::default()
        },
        Panel {
            title: "PID contributions",
            y_desc: "signal",
            y_range: fit_range(-10.0..10.0, &pid_series),
            series: pid_series,
            guides: vec![(0.0, BLACK)],
            ..Default::default()
        },
    ];

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, DASHBOARD_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;
        let title = format!(
            "Pit Lane Assistance ({} profile, {})",
            system.profile(),
            system.controller_name()
        );
        let root = root
            .titled(&title, ("sans-serif", 24))
            .map_err(plot_error)?;

        for (area, panel) in root.split_evenly((3, 2)).iter().zip(panels.iter()) {
            draw_panel(area, &x, panel)?;
        }
        root.present().map_err(plot_error)?;
    }
    Ok(svg)
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    x: &Range<f64>,
    panel: &Panel<'_>,
) -> Result<()> {
    let y = panel.y_range.clone();
    let mut chart = ChartBuilder::on(area)
        .caption(panel.title, ("sans-serif", 16))
        .margin(8)
        .x_label_area_size(28)
        .y_label_area_size(48)
        .build_cartesian_2d(x.clone(), y.clone())
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("t (s)")
        .y_desc(panel.y_desc)
        .draw()
        .map_err(plot_error)?;

    if let Some((lo, hi)) = panel.band {
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x.start, lo.max(y.start)), (x.end, hi.min(y.end))],
                GREEN.mix(0.15).filled(),
            )))
            .map_err(plot_error)?;
    }

    for (level, color) in &panel.guides {
        chart
            .draw_series(LineSeries::new(
                vec![(x.start, *level), (x.end, *level)],
                color.mix(0.5).stroke_width(1),
            ))
            .map_err(plot_error)?;
    }

    for series in &panel.series {
        let color = series.color;
        chart
            .draw_series(LineSeries::new(
                series.points.iter().copied(),
                color.stroke_width(2),
            ))
            .map_err(plot_error)?
            .label(series.label)
            .legend(move |(lx, ly)| {
                PathElement::new(vec![(lx, ly), (lx + 16, ly)], color.stroke_width(2))
            });
    }

    if let Some(status) = &panel.status {
        let anchor = (x.start + 0.2, y.end - (y.end - y.start) * 0.08);
        chart
            .draw_series(std::iter::once(Text::new(
                status.clone(),
                anchor,
                ("sans-serif", 13).into_font(),
            )))
            .map_err(plot_error)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8).filled())
        .border_style(BLACK.stroke_width(1))
        .draw()
        .map_err(plot_error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::SimulationSettings;
    use crate::domain::model::TickInput;

    #[test]
    fn test_time_window() {
        assert_eq!(time_window(3.0), 0.0..4.0);
        assert_eq!(time_window(40.0), 25.0..41.0);
    }

    #[test]
    fn test_speed_window_stays_in_sensor_range() {
        assert_eq!(speed_window(80.0, 50.0, 100.0), 70.0..90.0);
        assert_eq!(speed_window(95.0, 50.0, 100.0), 85.0..100.0);
        assert_eq!(speed_window(55.0, 50.0, 100.0), 50.0..65.0);
    }

    #[test]
    fn test_render_dashboard_produces_svg() {
        let mut system = SpeedControlSystem::new(&SimulationSettings::default());
        for _ in 0..50 {
            system.update(TickInput::default());
        }
        let svg = render_dashboard(&system).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Input / Output"));
        assert!(svg.contains("PID contributions"));
    }
}
